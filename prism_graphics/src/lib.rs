/*!
# Prism Graphics

Cross-backend GPU device core.

A [`Device`](prism::Device) creates and owns every GPU resource, tracks the
current bindings, compiles each distinct fixed-function state exactly once
and uploads shader constants only when they changed. When the native device
is lost, [`Device::rebuild`](prism::Device::rebuild) recreates every object
from the description it was created with.

## Architecture

- **NativeBackend**: trait implemented by each platform API (a recording
  `MockBackend` ships with the crate)
- **Registry**: arena of live resources addressed by typed handles
- **CompiledStateCache**: blend / raster / depth-stencil value to native object
- **Shader**: parameters, constant-buffer layout and dirty upload
- **Device**: factory, bindings, draw path and rebuild protocol
*/

// Internal modules
mod error;
mod graphics;
pub mod log;
pub mod backend;
pub mod state;
pub mod resource;
pub mod shader;
pub mod device;
pub mod geometry;

// Main prism namespace module
pub mod prism {
    // Error types
    pub use crate::error::{Error, Result};

    // Process-wide facade
    pub use crate::graphics::{Graphics, DeviceId};

    // Device
    pub use crate::device::{
        Device, DeviceConfig, DeviceState, DeviceStats, SamplerBinding, StateDirty,
        VERTEX_TEXTURE_SLOT_BASE,
    };

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Native backend sub-module
    pub mod backend {
        pub use crate::backend::*;
    }

    // Fixed-function state sub-module
    pub mod state {
        pub use crate::state::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Shader sub-module
    pub mod shader {
        pub use crate::shader::*;
    }

    // Geometry sub-module
    pub mod geometry {
        pub use crate::geometry::*;
    }
}

// Re-export math library at crate root
pub use glam;
