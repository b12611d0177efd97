/// 2D textures, depth-stencil buffers and staging surfaces
///
/// Textures keep the per-level bytes they were created with; a rebuild
/// uploads them again. Render targets cannot take initial data, so their
/// contents are undefined after a rebuild.

use bitflags::bitflags;

use crate::backend::{NativeBackend, NativeHandle, NativeTextureDesc};
use crate::error::Result;
use crate::gfx_bail;
use crate::resource::format::{full_mip_chain, mip_dimensions};
use crate::resource::{ColorFormat, ZStencilFormat};

bitflags! {
    /// Texture usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureFlags: u32 {
        /// Level 0 may be replaced after creation
        const DYNAMIC = 1 << 0;
        /// Usable as a colour render target
        const RENDER_TARGET = 1 << 1;
        /// Lower mip levels are generated by the backend
        const BUILD_MIPMAPS = 1 << 2;
    }
}

// ===== TEXTURE 2D =====

/// Texture creation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: ColorFormat,
    /// Mip levels, 0 for the full chain
    pub levels: u32,
    pub flags: TextureFlags,
}

impl TextureDesc {
    /// Single-level texture
    pub fn new(width: u32, height: u32, format: ColorFormat) -> Self {
        Self {
            width,
            height,
            format,
            levels: 1,
            flags: TextureFlags::empty(),
        }
    }

    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_flags(mut self, flags: TextureFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Mip count with 0 resolved to the full chain
    pub fn resolved_levels(&self) -> u32 {
        if self.levels == 0 {
            full_mip_chain(self.width, self.height)
        } else {
            self.levels
        }
    }
}

/// 2D colour texture resource
#[derive(Debug)]
pub struct Texture2D {
    desc: NativeTextureDesc,
    data: Vec<Vec<u8>>,
    handle: Option<NativeHandle>,
}

impl Texture2D {
    /// Validate `desc` and `data` (one byte vector per level, or empty)
    pub fn new(backend: &mut dyn NativeBackend, desc: TextureDesc, data: Vec<Vec<u8>>) -> Result<Self> {
        let native = Self::validate(backend, &desc, &data)?;
        let mut texture = Self { desc: native, data, handle: None };
        texture.rebuild(backend)?;
        Ok(texture)
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn format(&self) -> ColorFormat {
        self.desc.format
    }

    /// Resolved mip count
    pub fn levels(&self) -> u32 {
        self.desc.levels
    }

    pub fn flags(&self) -> TextureFlags {
        self.desc.flags
    }

    pub fn is_render_target(&self) -> bool {
        self.desc.flags.contains(TextureFlags::RENDER_TARGET)
    }

    pub fn is_dynamic(&self) -> bool {
        self.desc.flags.contains(TextureFlags::DYNAMIC)
    }

    /// Retained per-level data
    pub fn data(&self) -> &[Vec<u8>] {
        &self.data
    }

    pub fn handle(&self) -> Option<NativeHandle> {
        self.handle
    }

    /// Replace level 0 of a dynamic texture
    pub fn set_image(&mut self, backend: &mut dyn NativeBackend, bytes: Vec<u8>) -> Result<()> {
        if !self.is_dynamic() {
            gfx_bail!("prism::Texture2D", Configuration, "cannot update a static texture");
        }
        let expected = self.desc.format.level_size(self.desc.width, self.desc.height);
        if bytes.len() != expected {
            gfx_bail!("prism::Texture2D", Configuration,
                "image has {} bytes, level 0 needs {}", bytes.len(), expected);
        }
        let Some(handle) = self.handle else {
            gfx_bail!("prism::Texture2D", InvalidResource, "texture has no native object");
        };
        backend.update_texture(handle, 0, &bytes)?;
        match self.data.first_mut() {
            Some(level0) => *level0 = bytes,
            None => self.data.push(bytes),
        }
        Ok(())
    }

    pub fn release(&mut self, backend: &mut dyn NativeBackend) {
        if let Some(handle) = self.handle.take() {
            backend.release(handle);
        }
    }

    pub fn rebuild(&mut self, backend: &mut dyn NativeBackend) -> Result<()> {
        let handle = backend.create_texture(&self.desc, &self.data)?;
        self.handle = Some(handle);
        Ok(())
    }

    fn validate(
        backend: &dyn NativeBackend,
        desc: &TextureDesc,
        data: &[Vec<u8>],
    ) -> Result<NativeTextureDesc> {
        if desc.width == 0 || desc.height == 0 {
            gfx_bail!("prism::Texture2D", Configuration,
                "invalid texture size {}x{}", desc.width, desc.height);
        }
        if !backend.supports_color_format(desc.format) {
            gfx_bail!("prism::Texture2D", Configuration,
                "format {:?} is not supported by the {} backend", desc.format, backend.name());
        }
        let levels = desc.resolved_levels();
        if levels > full_mip_chain(desc.width, desc.height) {
            gfx_bail!("prism::Texture2D", Configuration,
                "{} mip levels requested, a {}x{} texture has at most {}",
                levels, desc.width, desc.height, full_mip_chain(desc.width, desc.height));
        }
        if desc.flags.contains(TextureFlags::RENDER_TARGET) {
            if desc.format.is_compressed() {
                gfx_bail!("prism::Texture2D", Configuration,
                    "compressed format {:?} cannot be a render target", desc.format);
            }
            if !data.is_empty() {
                gfx_bail!("prism::Texture2D", Configuration, "render targets cannot take initial data");
            }
        }

        if !data.is_empty() {
            // Backend-generated mips only need level 0
            let expected_levels = if desc.flags.contains(TextureFlags::BUILD_MIPMAPS) {
                1..=levels as usize
            } else {
                levels as usize..=levels as usize
            };
            if !expected_levels.contains(&data.len()) {
                gfx_bail!("prism::Texture2D", Configuration,
                    "{} data levels given for a {}-level texture", data.len(), levels);
            }
            for (level, bytes) in data.iter().enumerate() {
                let (w, h) = mip_dimensions(desc.width, desc.height, level as u32);
                let expected = desc.format.level_size(w, h);
                if bytes.len() != expected {
                    gfx_bail!("prism::Texture2D", Configuration,
                        "level {} has {} bytes, expected {}", level, bytes.len(), expected);
                }
            }
        }

        Ok(NativeTextureDesc {
            width: desc.width,
            height: desc.height,
            levels,
            format: desc.format,
            flags: desc.flags,
        })
    }
}

// ===== DEPTH-STENCIL BUFFER =====

/// Depth-stencil buffer resource
#[derive(Debug)]
pub struct DepthStencilBuffer {
    width: u32,
    height: u32,
    format: ZStencilFormat,
    handle: Option<NativeHandle>,
}

impl DepthStencilBuffer {
    pub fn new(backend: &mut dyn NativeBackend, width: u32, height: u32, format: ZStencilFormat) -> Result<Self> {
        if width == 0 || height == 0 {
            gfx_bail!("prism::DepthStencilBuffer", Configuration,
                "invalid depth-stencil size {}x{}", width, height);
        }
        if !backend.supports_zstencil_format(format) {
            gfx_bail!("prism::DepthStencilBuffer", Configuration,
                "format {:?} is not supported by the {} backend", format, backend.name());
        }
        let mut buffer = Self { width, height, format, handle: None };
        buffer.rebuild(backend)?;
        Ok(buffer)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ZStencilFormat {
        self.format
    }

    pub fn handle(&self) -> Option<NativeHandle> {
        self.handle
    }

    pub fn release(&mut self, backend: &mut dyn NativeBackend) {
        if let Some(handle) = self.handle.take() {
            backend.release(handle);
        }
    }

    pub fn rebuild(&mut self, backend: &mut dyn NativeBackend) -> Result<()> {
        self.handle = Some(backend.create_zstencil(self.width, self.height, self.format)?);
        Ok(())
    }
}

// ===== STAGING SURFACE =====

/// CPU-readable copy target for texture readback
#[derive(Debug)]
pub struct StagingSurface {
    width: u32,
    height: u32,
    format: ColorFormat,
    handle: Option<NativeHandle>,
}

impl StagingSurface {
    pub fn new(backend: &mut dyn NativeBackend, width: u32, height: u32, format: ColorFormat) -> Result<Self> {
        if width == 0 || height == 0 {
            gfx_bail!("prism::StagingSurface", Configuration,
                "invalid staging surface size {}x{}", width, height);
        }
        if format.is_compressed() || !backend.supports_color_format(format) {
            gfx_bail!("prism::StagingSurface", Configuration,
                "format {:?} cannot back a staging surface", format);
        }
        let mut surface = Self { width, height, format, handle: None };
        surface.rebuild(backend)?;
        Ok(surface)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn handle(&self) -> Option<NativeHandle> {
        self.handle
    }

    /// True if `texture` can be copied into this surface
    pub fn matches(&self, texture: &Texture2D) -> bool {
        texture.width() == self.width && texture.height() == self.height && texture.format() == self.format
    }

    pub fn release(&mut self, backend: &mut dyn NativeBackend) {
        if let Some(handle) = self.handle.take() {
            backend.release(handle);
        }
    }

    pub fn rebuild(&mut self, backend: &mut dyn NativeBackend) -> Result<()> {
        self.handle = Some(backend.create_staging_surface(self.width, self.height, self.format)?);
        Ok(())
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
