/// Backend module - native graphics API abstraction

pub mod native_backend;
pub mod mock_backend;

pub use native_backend::*;
pub use mock_backend::{MockBackend, MockBackendConfig, MockCall, MockRecorder};
