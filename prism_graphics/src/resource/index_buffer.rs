/// Index buffers

use crate::backend::{BufferKind, NativeBackend, NativeHandle};
use crate::error::Result;
use crate::gfx_bail;
use crate::resource::BufferFlags;

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices
    U32,
}

impl IndexType {
    /// Size in bytes of one index
    pub fn size_bytes(&self) -> usize {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Index buffer resource, retaining its raw index bytes
#[derive(Debug)]
pub struct IndexBuffer {
    index_type: IndexType,
    data: Vec<u8>,
    flags: BufferFlags,
    handle: Option<NativeHandle>,
}

impl IndexBuffer {
    pub fn new(
        backend: &mut dyn NativeBackend,
        index_type: IndexType,
        data: Vec<u8>,
        flags: BufferFlags,
    ) -> Result<Self> {
        Self::validate(index_type, &data)?;
        let mut buffer = Self { index_type, data, flags, handle: None };
        buffer.rebuild(backend)?;
        Ok(buffer)
    }

    /// 16-bit index buffer from a slice of indices
    pub fn from_u16(backend: &mut dyn NativeBackend, indices: &[u16], flags: BufferFlags) -> Result<Self> {
        Self::new(backend, IndexType::U16, bytemuck::cast_slice(indices).to_vec(), flags)
    }

    /// 32-bit index buffer from a slice of indices
    pub fn from_u32(backend: &mut dyn NativeBackend, indices: &[u32], flags: BufferFlags) -> Result<Self> {
        Self::new(backend, IndexType::U32, bytemuck::cast_slice(indices).to_vec(), flags)
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Number of indices
    pub fn count(&self) -> usize {
        self.data.len() / self.index_type.size_bytes()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_dynamic(&self) -> bool {
        self.flags.contains(BufferFlags::DYNAMIC)
    }

    pub fn handle(&self) -> Option<NativeHandle> {
        self.handle
    }

    /// Replace the indices of a dynamic buffer (same byte length)
    pub fn update(&mut self, backend: &mut dyn NativeBackend, data: Vec<u8>) -> Result<()> {
        if !self.is_dynamic() {
            gfx_bail!("prism::IndexBuffer", Configuration, "cannot update a static index buffer");
        }
        if data.len() != self.data.len() {
            gfx_bail!("prism::IndexBuffer", Configuration,
                "update has {} bytes, buffer holds {}", data.len(), self.data.len());
        }
        let Some(handle) = self.handle else {
            gfx_bail!("prism::IndexBuffer", InvalidResource, "index buffer has no native buffer");
        };
        backend.update_buffer(handle, &data)?;
        self.data = data;
        Ok(())
    }

    pub fn release(&mut self, backend: &mut dyn NativeBackend) {
        if let Some(handle) = self.handle.take() {
            backend.release(handle);
        }
    }

    pub fn rebuild(&mut self, backend: &mut dyn NativeBackend) -> Result<()> {
        let handle = backend.create_buffer(BufferKind::Index, &self.data, self.is_dynamic())?;
        self.handle = Some(handle);
        Ok(())
    }

    fn validate(index_type: IndexType, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            gfx_bail!("prism::IndexBuffer", Configuration, "index buffer has no indices");
        }
        if data.len() % index_type.size_bytes() != 0 {
            gfx_bail!("prism::IndexBuffer", Configuration,
                "{} bytes is not a multiple of the {:?} index size", data.len(), index_type);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "index_buffer_tests.rs"]
mod tests;
