/// NativeBackend trait - the platform graphics API behind a Device
///
/// A backend compiles and executes GPU work on behalf of the device core.
/// Every object it creates is identified by an opaque [`NativeHandle`]; the
/// core never looks inside a handle and never reuses one across a device
/// rebuild.

use std::fmt;
use bitflags::bitflags;

use crate::error::Result;
use crate::resource::{ColorFormat, ZStencilFormat, IndexType, SamplerInfo, SwapChainDesc, TextureFlags};
use crate::state::{BlendState, RasterState, DepthStencilState};

// ============================================================================
// Common types
// ============================================================================

/// Opaque id of a backend object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub u64);

impl NativeHandle {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a native buffer is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// One vertex attribute stream
    Vertex,
    Index,
    /// Shader constant buffer
    Constant,
}

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

/// Primitive topology for draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

/// Integer rectangle (viewport, scissor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

bitflags! {
    /// Buffers affected by a clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Creation parameters of a native 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeTextureDesc {
    pub width: u32,
    pub height: u32,
    /// Resolved mip count (never 0)
    pub levels: u32,
    pub format: ColorFormat,
    pub flags: TextureFlags,
}

// ============================================================================
// NativeBackend trait
// ============================================================================

/// Platform graphics API used by a [`Device`](crate::prism::Device)
///
/// All calls come from the device's render thread. A call returning
/// [`Error::DeviceLost`](crate::prism::Error::DeviceLost) moves the owning
/// device to the `Lost` state.
pub trait NativeBackend: Send {
    /// Backend name for logs
    fn name(&self) -> &str;

    // ===== DEVICE LIFECYCLE =====

    /// Create the native device on adapter `adapter_index`
    fn create_device(&mut self, adapter_index: u32) -> Result<()>;

    /// Destroy the native device; every handle it issued becomes invalid
    fn destroy_device(&mut self);

    fn supports_color_format(&self, format: ColorFormat) -> bool;

    fn supports_zstencil_format(&self, format: ZStencilFormat) -> bool;

    // ===== CREATION =====

    /// Create a buffer initialised with `data`
    fn create_buffer(&mut self, kind: BufferKind, data: &[u8], dynamic: bool) -> Result<NativeHandle>;

    /// Create a texture; `levels` holds initial data per mip level, or is empty
    fn create_texture(&mut self, desc: &NativeTextureDesc, levels: &[Vec<u8>]) -> Result<NativeHandle>;

    fn create_zstencil(&mut self, width: u32, height: u32, format: ZStencilFormat) -> Result<NativeHandle>;

    /// Create a CPU-readable surface
    fn create_staging_surface(&mut self, width: u32, height: u32, format: ColorFormat) -> Result<NativeHandle>;

    fn create_sampler(&mut self, info: &SamplerInfo) -> Result<NativeHandle>;

    /// Compile shader source for `stage`
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<NativeHandle>;

    /// Create the presentable surface of a swap chain
    fn create_swap_chain(&mut self, desc: &SwapChainDesc) -> Result<NativeHandle>;

    fn compile_blend_state(&mut self, state: &BlendState) -> Result<NativeHandle>;

    fn compile_raster_state(&mut self, state: &RasterState) -> Result<NativeHandle>;

    fn compile_depth_stencil_state(&mut self, state: &DepthStencilState) -> Result<NativeHandle>;

    /// Free a backend object. Unknown handles are ignored.
    fn release(&mut self, handle: NativeHandle);

    // ===== UPDATES =====

    /// Replace the whole contents of a buffer
    fn update_buffer(&mut self, buffer: NativeHandle, data: &[u8]) -> Result<()>;

    /// Replace one mip level of a texture
    fn update_texture(&mut self, texture: NativeHandle, level: u32, data: &[u8]) -> Result<()>;

    fn copy_texture_to_staging(&mut self, texture: NativeHandle, staging: NativeHandle) -> Result<()>;

    /// Read back the bytes of a staging surface
    fn map_staging_surface(&mut self, staging: NativeHandle) -> Result<Vec<u8>>;

    // ===== BINDING =====

    fn bind_render_target(&mut self, color: Option<NativeHandle>, zstencil: Option<NativeHandle>) -> Result<()>;

    fn bind_texture(&mut self, slot: usize, texture: Option<NativeHandle>) -> Result<()>;

    fn bind_sampler(&mut self, slot: usize, sampler: Option<NativeHandle>) -> Result<()>;

    /// Bind vertex streams in shader input order
    fn bind_vertex_buffers(&mut self, buffers: &[NativeHandle]) -> Result<()>;

    fn bind_index_buffer(&mut self, buffer: Option<(NativeHandle, IndexType)>) -> Result<()>;

    fn bind_shader(&mut self, stage: ShaderStage, shader: Option<NativeHandle>) -> Result<()>;

    fn bind_constant_buffer(&mut self, stage: ShaderStage, buffer: Option<NativeHandle>) -> Result<()>;

    fn bind_blend_state(&mut self, state: NativeHandle) -> Result<()>;

    fn bind_raster_state(&mut self, state: NativeHandle) -> Result<()>;

    fn bind_depth_stencil_state(&mut self, state: NativeHandle) -> Result<()>;

    fn set_viewport(&mut self, viewport: Rect) -> Result<()>;

    // ===== COMMANDS =====

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4], depth: f32, stencil: u8) -> Result<()>;

    fn draw(&mut self, topology: PrimitiveTopology, start_vertex: u32, vertex_count: u32) -> Result<()>;

    fn draw_indexed(&mut self, topology: PrimitiveTopology, start_index: u32, index_count: u32) -> Result<()>;

    fn present(&mut self, swap_chain: NativeHandle) -> Result<()>;
}
