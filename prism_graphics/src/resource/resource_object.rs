/// Resource objects - the tagged set of GPU-owned resource kinds
///
/// Every live resource is one [`ResourceObject`] in its device's
/// [`Registry`](super::Registry). The object carries the owning device, a
/// creation serial (registry walk order) and the [`GraphicsResource`] variant
/// holding the native handles plus the CPU-side description needed to
/// recreate them.

use std::fmt;
use slotmap::new_key_type;

use crate::backend::NativeBackend;
use crate::error::Result;
use crate::graphics::DeviceId;
use crate::resource::{
    VertexBuffer, IndexBuffer, Texture2D, DepthStencilBuffer, StagingSurface,
    SamplerState, SwapChain,
};
use crate::shader::Shader;

new_key_type! {
    /// Stable arena index of a registry entry
    pub struct ResourceKey;
}

// ===== RESOURCE TYPE =====

/// Type tag of a resource object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    VertexBuffer,
    IndexBuffer,
    Texture2D,
    DepthStencilBuffer,
    StagingSurface,
    SamplerState,
    VertexShader,
    PixelShader,
    SwapChain,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::VertexBuffer => "vertex buffer",
            ResourceType::IndexBuffer => "index buffer",
            ResourceType::Texture2D => "texture",
            ResourceType::DepthStencilBuffer => "depth-stencil buffer",
            ResourceType::StagingSurface => "staging surface",
            ResourceType::SamplerState => "sampler state",
            ResourceType::VertexShader => "vertex shader",
            ResourceType::PixelShader => "pixel shader",
            ResourceType::SwapChain => "swap chain",
        };
        write!(f, "{}", name)
    }
}

// ===== GRAPHICS RESOURCE =====

/// One resource variant
#[derive(Debug)]
pub enum GraphicsResource {
    VertexBuffer(VertexBuffer),
    IndexBuffer(IndexBuffer),
    Texture2D(Texture2D),
    DepthStencilBuffer(DepthStencilBuffer),
    StagingSurface(StagingSurface),
    SamplerState(SamplerState),
    VertexShader(Shader),
    PixelShader(Shader),
    SwapChain(SwapChain),
}

impl GraphicsResource {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            GraphicsResource::VertexBuffer(_) => ResourceType::VertexBuffer,
            GraphicsResource::IndexBuffer(_) => ResourceType::IndexBuffer,
            GraphicsResource::Texture2D(_) => ResourceType::Texture2D,
            GraphicsResource::DepthStencilBuffer(_) => ResourceType::DepthStencilBuffer,
            GraphicsResource::StagingSurface(_) => ResourceType::StagingSurface,
            GraphicsResource::SamplerState(_) => ResourceType::SamplerState,
            GraphicsResource::VertexShader(_) => ResourceType::VertexShader,
            GraphicsResource::PixelShader(_) => ResourceType::PixelShader,
            GraphicsResource::SwapChain(_) => ResourceType::SwapChain,
        }
    }

    /// Free every native handle, keeping the CPU-side description
    pub fn release(&mut self, backend: &mut dyn NativeBackend) {
        match self {
            GraphicsResource::VertexBuffer(vb) => vb.release(backend),
            GraphicsResource::IndexBuffer(ib) => ib.release(backend),
            GraphicsResource::Texture2D(tex) => tex.release(backend),
            GraphicsResource::DepthStencilBuffer(zs) => zs.release(backend),
            GraphicsResource::StagingSurface(staging) => staging.release(backend),
            GraphicsResource::SamplerState(sampler) => sampler.release(backend),
            GraphicsResource::VertexShader(shader)
            | GraphicsResource::PixelShader(shader) => shader.release(backend),
            GraphicsResource::SwapChain(sc) => sc.release(backend),
        }
    }

    /// Recreate the native handles from the retained description
    ///
    /// Must follow a [`release`](Self::release).
    pub fn rebuild(&mut self, backend: &mut dyn NativeBackend) -> Result<()> {
        match self {
            GraphicsResource::VertexBuffer(vb) => vb.rebuild(backend),
            GraphicsResource::IndexBuffer(ib) => ib.rebuild(backend),
            GraphicsResource::Texture2D(tex) => tex.rebuild(backend),
            GraphicsResource::DepthStencilBuffer(zs) => zs.rebuild(backend),
            GraphicsResource::StagingSurface(staging) => staging.rebuild(backend),
            GraphicsResource::SamplerState(sampler) => sampler.rebuild(backend),
            GraphicsResource::VertexShader(shader)
            | GraphicsResource::PixelShader(shader) => shader.rebuild(backend),
            GraphicsResource::SwapChain(sc) => sc.rebuild(backend),
        }
    }
}

// ===== RESOURCE OBJECT =====

/// Registry entry
#[derive(Debug)]
pub struct ResourceObject {
    device: DeviceId,
    serial: u64,
    resource: GraphicsResource,
}

impl ResourceObject {
    pub(crate) fn new(device: DeviceId, serial: u64, resource: GraphicsResource) -> Self {
        Self { device, serial, resource }
    }

    /// Owning device
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Creation serial, strictly increasing per device
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource.resource_type()
    }

    pub fn resource(&self) -> &GraphicsResource {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut GraphicsResource {
        &mut self.resource
    }

    pub(crate) fn into_resource(self) -> GraphicsResource {
        self.resource
    }
}

// ===== TYPED HANDLES =====

/// Typed, copyable, non-owning reference to a registry entry
pub trait ResourceHandle: Copy + fmt::Debug {
    /// Variant payload this handle resolves to
    type Target;

    const TYPE: ResourceType;

    fn from_parts(device: DeviceId, key: ResourceKey) -> Self;

    fn device(&self) -> DeviceId;

    fn key(&self) -> ResourceKey;

    fn project(resource: &GraphicsResource) -> Option<&Self::Target>;

    fn project_mut(resource: &mut GraphicsResource) -> Option<&mut Self::Target>;
}

macro_rules! resource_handle {
    ($(#[$meta:meta])* $name:ident => $variant:ident($target:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            device: DeviceId,
            key: ResourceKey,
        }

        impl ResourceHandle for $name {
            type Target = $target;

            const TYPE: ResourceType = ResourceType::$variant;

            fn from_parts(device: DeviceId, key: ResourceKey) -> Self {
                Self { device, key }
            }

            fn device(&self) -> DeviceId {
                self.device
            }

            fn key(&self) -> ResourceKey {
                self.key
            }

            fn project(resource: &GraphicsResource) -> Option<&Self::Target> {
                match resource {
                    GraphicsResource::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn project_mut(resource: &mut GraphicsResource) -> Option<&mut Self::Target> {
                match resource {
                    GraphicsResource::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

resource_handle!(
    /// Handle to a [`VertexBuffer`]
    VertexBufferHandle => VertexBuffer(VertexBuffer)
);
resource_handle!(
    /// Handle to an [`IndexBuffer`]
    IndexBufferHandle => IndexBuffer(IndexBuffer)
);
resource_handle!(
    /// Handle to a [`Texture2D`]
    TextureHandle => Texture2D(Texture2D)
);
resource_handle!(
    /// Handle to a [`DepthStencilBuffer`]
    ZStencilHandle => DepthStencilBuffer(DepthStencilBuffer)
);
resource_handle!(
    /// Handle to a [`StagingSurface`]
    StagingSurfaceHandle => StagingSurface(StagingSurface)
);
resource_handle!(
    /// Handle to a [`SamplerState`]
    SamplerHandle => SamplerState(SamplerState)
);
resource_handle!(
    /// Handle to a vertex [`Shader`]
    VertexShaderHandle => VertexShader(Shader)
);
resource_handle!(
    /// Handle to a pixel [`Shader`]
    PixelShaderHandle => PixelShader(Shader)
);
resource_handle!(
    /// Handle to a [`SwapChain`]
    SwapChainHandle => SwapChain(SwapChain)
);
