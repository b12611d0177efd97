//! Error types for Prism graphics
//!
//! Every fallible operation of the device core returns [`Result`]. Errors are
//! logged once where they are raised (see [`gfx_err!`](crate::gfx_err) and
//! [`gfx_bail!`](crate::gfx_bail)) and then propagated to the caller untouched.

use std::fmt;

/// Result type for Prism graphics operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prism graphics errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Unsupported or invalid creation parameters (format, dimensions, flags)
    Configuration(String),

    /// A shader parameter name does not match any declared parameter
    NotFound(String),

    /// A shader parameter value does not have the declared byte size
    SizeMismatch {
        /// Parameter name
        name: String,
        /// Declared size in bytes
        expected: usize,
        /// Size of the value that was passed in
        actual: usize,
    },

    /// A native backend call failed
    NativeBackend(String),

    /// The device was lost; only a full rebuild can recover it
    DeviceLost,

    /// Stale handle, or a handle of the wrong resource kind
    InvalidResource(String),
}

impl Error {
    /// True for errors that leave the device in the `Lost` state
    pub fn is_device_lost(&self) -> bool {
        matches!(self, Error::DeviceLost)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::SizeMismatch { name, expected, actual } => write!(
                f,
                "Size mismatch for '{}': expected {} bytes, got {}",
                name, expected, actual
            ),
            Error::NativeBackend(msg) => write!(f, "Native backend error: {}", msg),
            Error::DeviceLost => write!(f, "Device lost"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR entry and build the matching [`Error`] variant
///
/// Only the single-message variants can be built this way
/// (`Configuration`, `NotFound`, `NativeBackend`, `InvalidResource`).
///
/// # Example
///
/// ```no_run
/// # use prism_graphics::gfx_err;
/// let err = gfx_err!("prism::Device", Configuration, "texture width must be > 0");
/// ```
#[macro_export]
macro_rules! gfx_err {
    ($source:expr, $kind:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::gfx_error!($source, "{}", message);
        $crate::prism::Error::$kind(message)
    }};
}

/// Log an ERROR entry and return early with the matching [`Error`] variant
///
/// # Example
///
/// ```no_run
/// # use prism_graphics::gfx_bail;
/// fn check(width: u32) -> prism_graphics::prism::Result<()> {
///     if width == 0 {
///         gfx_bail!("prism::Device", Configuration, "texture width must be > 0");
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! gfx_bail {
    ($source:expr, $kind:ident, $($arg:tt)*) => {
        return Err($crate::gfx_err!($source, $kind, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
