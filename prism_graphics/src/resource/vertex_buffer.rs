/// Vertex buffers
///
/// A vertex buffer is a set of attribute streams (positions plus optional
/// normals, colours, tangents and texture coordinates). Each present stream
/// lives in its own native buffer. The CPU copy of every stream is retained
/// so the buffer can be recreated after a device rebuild, and so dynamic
/// buffers can be updated in place.

use bitflags::bitflags;
use glam::Vec3;

use crate::backend::{BufferKind, NativeBackend, NativeHandle};
use crate::error::Result;
use crate::gfx_bail;
use crate::shader::VertexInputs;

bitflags! {
    /// Usage flags for vertex and index buffers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferFlags: u32 {
        /// Contents may be replaced after creation
        const DYNAMIC = 1 << 0;
    }
}

// ===== VERTEX DATA =====

/// Texture coordinate stream with 1 to 4 floats per vertex
#[derive(Debug, Clone, PartialEq)]
pub struct TexCoordArray {
    pub width: u32,
    pub data: Vec<f32>,
}

impl TexCoordArray {
    pub fn new(width: u32, data: Vec<f32>) -> Self {
        Self { width, data }
    }

    /// Number of vertices covered by the stream
    pub fn vertex_count(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.data.len() / self.width as usize
        }
    }
}

/// CPU-side vertex streams
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VertexData {
    pub points: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    /// Packed RGBA8 colours
    pub colors: Option<Vec<u32>>,
    pub tangents: Option<Vec<Vec3>>,
    pub tex_coords: Vec<TexCoordArray>,
}

impl VertexData {
    /// Position-only vertex data
    pub fn from_points(points: Vec<Vec3>) -> Self {
        Self { points, ..Default::default() }
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// True if `other` has the same streams, widths and vertex count
    pub fn same_layout(&self, other: &VertexData) -> bool {
        self.points.len() == other.points.len()
            && self.normals.is_some() == other.normals.is_some()
            && self.colors.is_some() == other.colors.is_some()
            && self.tangents.is_some() == other.tangents.is_some()
            && self.tex_coords.len() == other.tex_coords.len()
            && self
                .tex_coords
                .iter()
                .zip(&other.tex_coords)
                .all(|(a, b)| a.width == b.width)
    }

    /// Check stream lengths and texture coordinate widths
    pub fn validate(&self) -> Result<()> {
        let count = self.points.len();
        if count == 0 {
            gfx_bail!("prism::VertexBuffer", Configuration, "vertex data has no points");
        }
        if let Some(normals) = &self.normals {
            if normals.len() != count {
                gfx_bail!("prism::VertexBuffer", Configuration,
                    "normal stream has {} elements, expected {}", normals.len(), count);
            }
        }
        if let Some(colors) = &self.colors {
            if colors.len() != count {
                gfx_bail!("prism::VertexBuffer", Configuration,
                    "color stream has {} elements, expected {}", colors.len(), count);
            }
        }
        if let Some(tangents) = &self.tangents {
            if tangents.len() != count {
                gfx_bail!("prism::VertexBuffer", Configuration,
                    "tangent stream has {} elements, expected {}", tangents.len(), count);
            }
        }
        for (unit, uv) in self.tex_coords.iter().enumerate() {
            if !(1..=4).contains(&uv.width) {
                gfx_bail!("prism::VertexBuffer", Configuration,
                    "texture unit {} has width {} (must be 1..=4)", unit, uv.width);
            }
            if uv.data.len() != count * uv.width as usize {
                gfx_bail!("prism::VertexBuffer", Configuration,
                    "texture unit {} has {} floats, expected {}",
                    unit, uv.data.len(), count * uv.width as usize);
            }
        }
        Ok(())
    }

    /// Byte image of every present stream, in stream order
    fn stream_bytes(&self) -> Vec<&[u8]> {
        let mut streams: Vec<&[u8]> = vec![bytemuck::cast_slice(&self.points)];
        if let Some(normals) = &self.normals {
            streams.push(bytemuck::cast_slice(normals));
        }
        if let Some(colors) = &self.colors {
            streams.push(bytemuck::cast_slice(colors));
        }
        if let Some(tangents) = &self.tangents {
            streams.push(bytemuck::cast_slice(tangents));
        }
        for uv in &self.tex_coords {
            streams.push(bytemuck::cast_slice(&uv.data));
        }
        streams
    }
}

// ===== NATIVE STREAMS =====

/// Native buffer per present stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexStreams {
    pub points: Option<NativeHandle>,
    pub normals: Option<NativeHandle>,
    pub colors: Option<NativeHandle>,
    pub tangents: Option<NativeHandle>,
    pub tex_coords: Vec<NativeHandle>,
}

impl VertexStreams {
    /// Every handle, in stream order
    pub fn all(&self) -> Vec<NativeHandle> {
        let mut handles: Vec<NativeHandle> = [self.points, self.normals, self.colors, self.tangents]
            .into_iter()
            .flatten()
            .collect();
        handles.extend(self.tex_coords.iter().copied());
        handles
    }
}

// ===== VERTEX BUFFER =====

/// Vertex buffer resource
#[derive(Debug)]
pub struct VertexBuffer {
    data: VertexData,
    flags: BufferFlags,
    streams: VertexStreams,
}

impl VertexBuffer {
    /// Validate `data` and create one native buffer per stream
    pub fn new(backend: &mut dyn NativeBackend, data: VertexData, flags: BufferFlags) -> Result<Self> {
        data.validate()?;
        let mut buffer = Self {
            data,
            flags,
            streams: VertexStreams::default(),
        };
        buffer.build(backend)?;
        Ok(buffer)
    }

    pub fn data(&self) -> &VertexData {
        &self.data
    }

    pub fn flags(&self) -> BufferFlags {
        self.flags
    }

    pub fn is_dynamic(&self) -> bool {
        self.flags.contains(BufferFlags::DYNAMIC)
    }

    pub fn vertex_count(&self) -> usize {
        self.data.vertex_count()
    }

    pub fn streams(&self) -> &VertexStreams {
        &self.streams
    }

    /// Replace the contents of a dynamic buffer with data of the same layout
    pub fn update(&mut self, backend: &mut dyn NativeBackend, data: VertexData) -> Result<()> {
        if !self.is_dynamic() {
            gfx_bail!("prism::VertexBuffer", Configuration, "cannot update a static vertex buffer");
        }
        data.validate()?;
        if !self.data.same_layout(&data) {
            gfx_bail!("prism::VertexBuffer", Configuration,
                "update does not match the buffer's stream layout");
        }

        let handles = self.streams.all();
        for (handle, bytes) in handles.iter().zip(data.stream_bytes()) {
            backend.update_buffer(*handle, bytes)?;
        }
        self.data = data;
        Ok(())
    }

    /// Native streams in the order a vertex shader with `inputs` consumes them
    pub fn streams_for(&self, inputs: &VertexInputs) -> Result<Vec<NativeHandle>> {
        let mut handles = Vec::new();
        match self.streams.points {
            Some(points) => handles.push(points),
            None => gfx_bail!("prism::VertexBuffer", Configuration, "vertex buffer has no native streams"),
        }
        if inputs.normals {
            match self.streams.normals {
                Some(normals) => handles.push(normals),
                None => gfx_bail!("prism::VertexBuffer", Configuration,
                    "vertex shader expects normals, buffer has none"),
            }
        }
        if inputs.colors {
            match self.streams.colors {
                Some(colors) => handles.push(colors),
                None => gfx_bail!("prism::VertexBuffer", Configuration,
                    "vertex shader expects colors, buffer has none"),
            }
        }
        if inputs.tangents {
            match self.streams.tangents {
                Some(tangents) => handles.push(tangents),
                None => gfx_bail!("prism::VertexBuffer", Configuration,
                    "vertex shader expects tangents, buffer has none"),
            }
        }
        let units = inputs.tex_units as usize;
        if units > self.streams.tex_coords.len() {
            gfx_bail!("prism::VertexBuffer", Configuration,
                "vertex shader expects {} texture units, buffer has {}",
                units, self.streams.tex_coords.len());
        }
        handles.extend(self.streams.tex_coords[..units].iter().copied());
        Ok(handles)
    }

    pub fn release(&mut self, backend: &mut dyn NativeBackend) {
        for handle in self.streams.all() {
            backend.release(handle);
        }
        self.streams = VertexStreams::default();
    }

    pub fn rebuild(&mut self, backend: &mut dyn NativeBackend) -> Result<()> {
        self.build(backend)
    }

    fn build(&mut self, backend: &mut dyn NativeBackend) -> Result<()> {
        let dynamic = self.is_dynamic();
        let mut created = Vec::new();
        for bytes in self.data.stream_bytes() {
            match backend.create_buffer(BufferKind::Vertex, bytes, dynamic) {
                Ok(handle) => created.push(handle),
                Err(err) => {
                    for handle in created {
                        backend.release(handle);
                    }
                    return Err(err);
                }
            }
        }

        let mut handles = created.into_iter();
        let mut streams = VertexStreams {
            points: handles.next(),
            ..Default::default()
        };
        if self.data.normals.is_some() {
            streams.normals = handles.next();
        }
        if self.data.colors.is_some() {
            streams.colors = handles.next();
        }
        if self.data.tangents.is_some() {
            streams.tangents = handles.next();
        }
        streams.tex_coords = handles.collect();
        self.streams = streams;
        Ok(())
    }
}

#[cfg(test)]
#[path = "vertex_buffer_tests.rs"]
mod tests;
