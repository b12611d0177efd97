/// Sampler states

use crate::backend::{NativeBackend, NativeHandle};
use crate::error::Result;
use crate::gfx_bail;

/// Texture filtering mode (minification / magnification / mip)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFilter {
    Point,
    Linear,
    Anisotropic,
    MinMagPointMipLinear,
    MinPointMagLinearMipPoint,
    MinPointMagMipLinear,
    MinLinearMagMipPoint,
    MinLinearMagPointMipLinear,
    MinMagLinearMipPoint,
}

/// Texture coordinate addressing outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Clamp,
    Wrap,
    Mirror,
    Border,
    MirrorOnce,
}

/// Sampler description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerInfo {
    pub filter: SampleFilter,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    /// Used by [`SampleFilter::Anisotropic`], 1..=16
    pub max_anisotropy: u32,
    /// Packed RGBA8 colour used with [`AddressMode::Border`]
    pub border_color: u32,
}

impl Default for SamplerInfo {
    fn default() -> Self {
        Self {
            filter: SampleFilter::Linear,
            address_u: AddressMode::Clamp,
            address_v: AddressMode::Clamp,
            address_w: AddressMode::Clamp,
            max_anisotropy: 1,
            border_color: 0,
        }
    }
}

impl SamplerInfo {
    pub fn validate(&self) -> Result<()> {
        if !(1..=16).contains(&self.max_anisotropy) {
            gfx_bail!("prism::SamplerState", Configuration,
                "max_anisotropy {} out of range 1..=16", self.max_anisotropy);
        }
        Ok(())
    }
}

/// Sampler state resource
#[derive(Debug)]
pub struct SamplerState {
    info: SamplerInfo,
    handle: Option<NativeHandle>,
}

impl SamplerState {
    pub fn new(backend: &mut dyn NativeBackend, info: SamplerInfo) -> Result<Self> {
        info.validate()?;
        let mut sampler = Self { info, handle: None };
        sampler.rebuild(backend)?;
        Ok(sampler)
    }

    pub fn info(&self) -> &SamplerInfo {
        &self.info
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
        self.handle = Some(backend.create_sampler(&self.info)?);
        Ok(())
    }
}
