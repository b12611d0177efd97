//! Fixed-function pipeline state
//!
//! Value types for blend, raster and depth-stencil state, and the cache that
//! compiles each distinct value into a native state object exactly once.

mod state_value;
mod state_cache;

pub use state_value::{
    StateKind, StateValue,
    BlendFactor, BlendOp, ColorWriteMask, BlendState,
    CullMode, FrontFace, RasterState,
    CompareOp, StencilOp, StencilSide, DepthStencilState,
};
pub use state_cache::{CompiledStateCache, CachedState};
