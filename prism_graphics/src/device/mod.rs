//! Device module - resource factory, bindings, draw path and rebuild protocol

mod device;
mod device_bindings;
mod device_rebuild;
mod transform;

pub use device::{Device, DeviceConfig, DeviceState, DeviceStats};
pub use device_bindings::{SamplerBinding, StateDirty, VERTEX_TEXTURE_SLOT_BASE};

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
