//! Resource module - GPU-owned resource kinds and their registry
//!
//! Every resource keeps the CPU-side description it was created from and
//! implements a `release` / `rebuild` pair driven by the owning device.

pub mod format;
mod resource_object;
mod registry;
mod vertex_buffer;
mod index_buffer;
mod texture;
mod sampler;
mod swap_chain;

pub use format::{ColorFormat, ZStencilFormat};
pub use resource_object::{
    ResourceKey, ResourceType, GraphicsResource, ResourceObject, ResourceHandle,
    VertexBufferHandle, IndexBufferHandle, TextureHandle, ZStencilHandle,
    StagingSurfaceHandle, SamplerHandle, VertexShaderHandle, PixelShaderHandle,
    SwapChainHandle,
};
pub use registry::Registry;
pub use vertex_buffer::{BufferFlags, TexCoordArray, VertexData, VertexStreams, VertexBuffer};
pub use index_buffer::{IndexType, IndexBuffer};
pub use texture::{TextureFlags, TextureDesc, Texture2D, DepthStencilBuffer, StagingSurface};
pub use sampler::{SampleFilter, AddressMode, SamplerInfo, SamplerState};
pub use swap_chain::{SurfaceId, SwapChainDesc, SwapChain};
