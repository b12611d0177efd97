/// 2D geometry helpers
///
/// Small indexed meshes for overlays and outlines: circle fans, thick lines,
/// rectangles and rectangle outlines. Points lie in the z = 0 plane and
/// indices are 16-bit.

use glam::{Vec2, Vec3};

use crate::device::Device;
use crate::error::Result;
use crate::gfx_bail;
use crate::resource::{BufferFlags, IndexBufferHandle, IndexType, VertexBufferHandle, VertexData};

// ===== MESH DATA =====

/// CPU-side points and triangle-list indices
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryData {
    pub points: Vec<Vec3>,
    pub indices: Vec<u16>,
}

/// Offsets of a thick edge from `a` to `b`: `normal` across, `along` in line direction
struct EdgeOffsets {
    normal: Vec2,
    along: Vec2,
}

impl EdgeOffsets {
    fn new(a: Vec2, b: Vec2, half_width: f32) -> Self {
        let angle = (b.y - a.y).atan2(b.x - a.x);
        let wx = half_width * angle.sin();
        let wy = half_width * angle.cos();
        Self {
            normal: Vec2::new(wx, -wy),
            along: Vec2::new(wy, wx),
        }
    }
}

fn point(p: Vec2) -> Vec3 {
    p.extend(0.0)
}

impl GeometryData {
    /// Triangle fan around `origin`, `theta_size` radians starting at `theta_start`
    pub fn circle(origin: Vec2, radius: f32, segments: u16, theta_start: f32, theta_size: f32) -> Result<Self> {
        if segments == 0 || segments > u16::MAX - 2 {
            gfx_bail!("prism::Geometry", Configuration, "circle needs 1..={} segments (got {})", u16::MAX - 2, segments);
        }
        let mut points = Vec::with_capacity(segments as usize + 2);
        points.push(point(origin));
        for s in 0..=segments {
            let theta = theta_start + s as f32 / segments as f32 * theta_size;
            points.push(point(origin + radius * Vec2::new(theta.cos(), theta.sin())));
        }
        let indices = (0..segments).flat_map(|i| [0, i + 1, i + 2]).collect();
        Ok(Self { points, indices })
    }

    /// Quad of width `width` from `start` to `end`
    pub fn line(start: Vec2, end: Vec2, width: f32) -> Self {
        let edge = EdgeOffsets::new(start, end, width * 0.5);
        Self {
            points: vec![
                point(start + edge.normal - edge.along),
                point(end + edge.normal + edge.along),
                point(end - edge.normal + edge.along),
                point(start - edge.normal - edge.along),
            ],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// Filled quad from its four corners
    pub fn rect(top_left: Vec2, top_right: Vec2, bottom_left: Vec2, bottom_right: Vec2) -> Self {
        Self {
            points: vec![point(top_left), point(top_right), point(bottom_right), point(bottom_left)],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// Outline of a quad drawn with lines of width `width`
    pub fn rect_line(top_left: Vec2, top_right: Vec2, bottom_left: Vec2, bottom_right: Vec2, width: f32) -> Self {
        let half = width * 0.5;
        let top = EdgeOffsets::new(top_left, top_right, half);
        let right = EdgeOffsets::new(top_right, bottom_right, half);
        let bottom = EdgeOffsets::new(bottom_left, bottom_right, half);
        let left = EdgeOffsets::new(top_left, bottom_left, half);

        let corners = [
            top_left + top.normal - top.along,
            top_right + top.normal + top.along,
            top_right - top.normal + top.along,
            top_left - top.normal - top.along,
            bottom_right + right.normal - right.along,
            bottom_right - right.normal + right.along,
            top_right - right.normal - right.along,
            bottom_left + bottom.normal - bottom.along,
            bottom_right - bottom.normal + bottom.along,
            bottom_left - bottom.normal + bottom.along,
            bottom_left - left.normal + left.along,
            top_left + left.normal + left.along,
        ];
        Self {
            points: corners.into_iter().map(point).collect(),
            indices: vec![
                0, 1, 2, 2, 3, 0,
                1, 4, 5, 5, 6, 1,
                7, 4, 8, 8, 9, 7,
                3, 10, 9, 9, 11, 3,
            ],
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

// ===== DEVICE GEOMETRY =====

/// Vertex and index buffer pair living on a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub vertex: VertexBufferHandle,
    pub index: IndexBufferHandle,
}

impl Geometry {
    /// Upload `data` as a static vertex buffer and 16-bit index buffer
    pub fn create(device: &mut Device, data: &GeometryData) -> Result<Self> {
        let vertex = device.create_vertex_buffer(VertexData::from_points(data.points.clone()), BufferFlags::empty())?;
        let index = match device.create_index_buffer(
            IndexType::U16,
            bytemuck::cast_slice(&data.indices).to_vec(),
            BufferFlags::empty(),
        ) {
            Ok(index) => index,
            Err(err) => {
                device.destroy(vertex)?;
                return Err(err);
            }
        };
        Ok(Self { vertex, index })
    }

    pub fn circle(
        device: &mut Device,
        origin: Vec2,
        radius: f32,
        segments: u16,
        theta_start: f32,
        theta_size: f32,
    ) -> Result<Self> {
        Self::create(device, &GeometryData::circle(origin, radius, segments, theta_start, theta_size)?)
    }

    pub fn line(device: &mut Device, start: Vec2, end: Vec2, width: f32) -> Result<Self> {
        Self::create(device, &GeometryData::line(start, end, width))
    }

    pub fn rect(
        device: &mut Device,
        top_left: Vec2,
        top_right: Vec2,
        bottom_left: Vec2,
        bottom_right: Vec2,
    ) -> Result<Self> {
        Self::create(device, &GeometryData::rect(top_left, top_right, bottom_left, bottom_right))
    }

    pub fn rect_line(
        device: &mut Device,
        top_left: Vec2,
        top_right: Vec2,
        bottom_left: Vec2,
        bottom_right: Vec2,
        width: f32,
    ) -> Result<Self> {
        Self::create(device, &GeometryData::rect_line(top_left, top_right, bottom_left, bottom_right, width))
    }
}

impl Device {
    /// Bind both buffers of `geometry` for the next draw
    pub fn load_geometry(&mut self, geometry: &Geometry) -> Result<()> {
        self.set_vertex_buffer(Some(geometry.vertex))?;
        self.set_index_buffer(Some(geometry.index))
    }

    /// Destroy both buffers of `geometry`
    pub fn destroy_geometry(&mut self, geometry: Geometry) -> Result<()> {
        let vertex = self.destroy(geometry.vertex);
        let index = self.destroy(geometry.index);
        vertex.and(index)
    }
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
