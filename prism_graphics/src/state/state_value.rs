/// Fixed-function pipeline state values
///
/// Plain copyable descriptions of blend, raster and depth-stencil state.
/// They never reference a backend; a [`CompiledStateCache`](super::CompiledStateCache)
/// turns each distinct value into one native state object.

use std::fmt;
use bitflags::bitflags;
use crate::backend::{NativeBackend, NativeHandle};
use crate::error::Result;

// ===== STATE KIND =====

/// The three cached state families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Blend,
    Raster,
    DepthStencil,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::Blend => write!(f, "blend"),
            StateKind::Raster => write!(f, "raster"),
            StateKind::DepthStencil => write!(f, "depth-stencil"),
        }
    }
}

/// A state value that can be compiled into and bound as a native state object
pub trait StateValue: Copy + PartialEq + fmt::Debug {
    /// Family this value belongs to
    const KIND: StateKind;

    /// Compile a native state object for this value
    fn compile(&self, backend: &mut dyn NativeBackend) -> Result<NativeHandle>;

    /// Bind a native state object previously compiled from a value of this type
    fn bind(handle: NativeHandle, backend: &mut dyn NativeBackend) -> Result<()>;
}

// ===== BLEND STATE =====

/// Blend factor for colour and alpha blending equations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturate,
}

/// Blend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    /// src * srcFactor + dst * dstFactor
    Add,
    /// src * srcFactor - dst * dstFactor
    Subtract,
    /// dst * dstFactor - src * srcFactor
    ReverseSubtract,
    Min,
    Max,
}

bitflags! {
    /// Colour channels written by the output merger
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWriteMask: u8 {
        const RED = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE = 1 << 2;
        const ALPHA = 1 << 3;
    }
}

/// Colour blending state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// Enable blending
    pub enabled: bool,
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub op: BlendOp,
    pub write_mask: ColorWriteMask,
}

impl Default for BlendState {
    /// Straight alpha blending, alpha channel accumulates additively
    fn default() -> Self {
        Self {
            enabled: true,
            src_color: BlendFactor::SrcAlpha,
            dst_color: BlendFactor::OneMinusSrcAlpha,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::One,
            op: BlendOp::Add,
            write_mask: ColorWriteMask::all(),
        }
    }
}

impl StateValue for BlendState {
    const KIND: StateKind = StateKind::Blend;

    fn compile(&self, backend: &mut dyn NativeBackend) -> Result<NativeHandle> {
        backend.compile_blend_state(self)
    }

    fn bind(handle: NativeHandle, backend: &mut dyn NativeBackend) -> Result<()> {
        backend.bind_blend_state(handle)
    }
}

// ===== RASTER STATE =====

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// Rasterizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterState {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    /// Clip to the scissor rectangle
    pub scissor_enabled: bool,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            scissor_enabled: false,
        }
    }
}

impl StateValue for RasterState {
    const KIND: StateKind = StateKind::Raster;

    fn compile(&self, backend: &mut dyn NativeBackend) -> Result<NativeHandle> {
        backend.compile_raster_state(self)
    }

    fn bind(handle: NativeHandle, backend: &mut dyn NativeBackend) -> Result<()> {
        backend.bind_raster_state(handle)
    }
}

// ===== DEPTH-STENCIL STATE =====

/// Comparison function for depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Stencil buffer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Increment,
    Decrement,
    Invert,
}

/// Stencil test configuration for one face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilSide {
    pub func: CompareOp,
    /// Stencil test failed
    pub fail: StencilOp,
    /// Stencil passed, depth failed
    pub depth_fail: StencilOp,
    /// Both tests passed
    pub pass: StencilOp,
}

impl Default for StencilSide {
    fn default() -> Self {
        Self {
            func: CompareOp::Always,
            fail: StencilOp::Keep,
            depth_fail: StencilOp::Keep,
            pass: StencilOp::Keep,
        }
    }
}

/// Depth and stencil testing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    pub depth_enabled: bool,
    pub depth_write_enabled: bool,
    pub depth_func: CompareOp,
    pub stencil_enabled: bool,
    pub stencil_write_enabled: bool,
    pub front: StencilSide,
    pub back: StencilSide,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_enabled: true,
            depth_write_enabled: true,
            depth_func: CompareOp::Less,
            stencil_enabled: false,
            stencil_write_enabled: true,
            front: StencilSide::default(),
            back: StencilSide::default(),
        }
    }
}

impl StateValue for DepthStencilState {
    const KIND: StateKind = StateKind::DepthStencil;

    fn compile(&self, backend: &mut dyn NativeBackend) -> Result<NativeHandle> {
        backend.compile_depth_stencil_state(self)
    }

    fn bind(handle: NativeHandle, backend: &mut dyn NativeBackend) -> Result<()> {
        backend.bind_depth_stencil_state(handle)
    }
}
