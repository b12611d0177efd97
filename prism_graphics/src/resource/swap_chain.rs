/// Swap chains
///
/// A swap chain wraps a window-system surface it does not own. Its
/// presentable surface and optional depth-stencil buffer are recreated on
/// device rebuild and on resize.

use crate::backend::{NativeBackend, NativeHandle};
use crate::error::Result;
use crate::gfx_bail;
use crate::resource::{ColorFormat, ZStencilFormat};

/// Opaque id of a window-system surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Swap chain creation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapChainDesc {
    pub surface: SurfaceId,
    pub width: u32,
    pub height: u32,
    pub format: ColorFormat,
    /// Depth-stencil buffer created alongside the swap chain
    pub zstencil_format: Option<ZStencilFormat>,
    /// Number of back buffers
    pub buffers: u32,
}

impl SwapChainDesc {
    pub fn new(surface: SurfaceId, width: u32, height: u32) -> Self {
        Self {
            surface,
            width,
            height,
            format: ColorFormat::BGRA,
            zstencil_format: None,
            buffers: 2,
        }
    }
}

/// Swap chain resource
#[derive(Debug)]
pub struct SwapChain {
    desc: SwapChainDesc,
    surface: Option<NativeHandle>,
    zstencil: Option<NativeHandle>,
}

impl SwapChain {
    pub fn new(backend: &mut dyn NativeBackend, desc: SwapChainDesc) -> Result<Self> {
        Self::validate(backend, &desc)?;
        let mut swap_chain = Self { desc, surface: None, zstencil: None };
        swap_chain.rebuild(backend)?;
        Ok(swap_chain)
    }

    pub fn desc(&self) -> &SwapChainDesc {
        &self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    /// Presentable surface
    pub fn surface_handle(&self) -> Option<NativeHandle> {
        self.surface
    }

    pub fn zstencil_handle(&self) -> Option<NativeHandle> {
        self.zstencil
    }

    /// Release, then rebuild at the new size
    pub fn resize(&mut self, backend: &mut dyn NativeBackend, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            gfx_bail!("prism::SwapChain", Configuration, "invalid swap chain size {}x{}", width, height);
        }
        self.release(backend);
        self.desc.width = width;
        self.desc.height = height;
        self.rebuild(backend)
    }

    pub fn release(&mut self, backend: &mut dyn NativeBackend) {
        if let Some(handle) = self.zstencil.take() {
            backend.release(handle);
        }
        if let Some(handle) = self.surface.take() {
            backend.release(handle);
        }
    }

    pub fn rebuild(&mut self, backend: &mut dyn NativeBackend) -> Result<()> {
        let surface = backend.create_swap_chain(&self.desc)?;
        self.surface = Some(surface);
        if let Some(format) = self.desc.zstencil_format {
            match backend.create_zstencil(self.desc.width, self.desc.height, format) {
                Ok(handle) => self.zstencil = Some(handle),
                Err(err) => {
                    self.release(backend);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn validate(backend: &dyn NativeBackend, desc: &SwapChainDesc) -> Result<()> {
        if desc.width == 0 || desc.height == 0 {
            gfx_bail!("prism::SwapChain", Configuration,
                "invalid swap chain size {}x{}", desc.width, desc.height);
        }
        if desc.buffers == 0 {
            gfx_bail!("prism::SwapChain", Configuration, "swap chain needs at least one buffer");
        }
        if desc.format.is_compressed() || !backend.supports_color_format(desc.format) {
            gfx_bail!("prism::SwapChain", Configuration,
                "format {:?} cannot back a swap chain", desc.format);
        }
        if let Some(format) = desc.zstencil_format {
            if !backend.supports_zstencil_format(format) {
                gfx_bail!("prism::SwapChain", Configuration,
                    "depth-stencil format {:?} is not supported", format);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "swap_chain_tests.rs"]
mod tests;
