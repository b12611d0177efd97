/// Prism graphics - process-wide services
///
/// Devices are fully independent of each other; the only state shared
/// between them is the logger slot and the device id counter kept here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Next device id handed out by [`Graphics::next_device_id`]
static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

fn logger_slot() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())))
}

/// Identity of one [`Device`](crate::prism::Device) instance
///
/// Every resource handle remembers the device that created it so a handle
/// passed to the wrong device is rejected instead of aliasing a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(u64);

impl DeviceId {
    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

// ===== PUBLIC API =====

/// Process-wide entry points (logger configuration)
///
/// # Example
///
/// ```no_run
/// use prism_graphics::prism::{Graphics, log::{Logger, LogEntry}};
///
/// struct FileLogger;
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
///
/// Graphics::set_logger(FileLogger);
/// ```
pub struct Graphics;

impl Graphics {
    /// Replace the active logger
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_slot().write() {
            *lock = Box::new(logger);
        }
    }

    /// Restore the default console logger
    pub fn reset_logger() {
        if let Ok(mut lock) = logger_slot().write() {
            *lock = Box::new(DefaultLogger::new());
        }
    }

    /// Log without file:line information
    ///
    /// Used by `gfx_trace!` .. `gfx_warn!`.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger_slot().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log with file:line information
    ///
    /// Used by `gfx_error!` and therefore by every error raised in the crate.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger_slot().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }

    /// Allocate a fresh device id (never reused within the process)
    pub(crate) fn next_device_id() -> DeviceId {
        DeviceId(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
#[path = "graphics_tests.rs"]
mod tests;
