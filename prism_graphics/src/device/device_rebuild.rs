/// Device-loss recovery
///
/// `Active -> Lost -> Rebuilding -> Active`. A rebuild releases every native
/// object, recreates the native device, recompiles the cached states and
/// rebuilds every registry object oldest first. Any failure leaves the
/// device `Lost`; calling [`Device::rebuild`] again retries from scratch.

use crate::error::Result;
use crate::resource::ResourceKey;
use super::device::{Device, DeviceState};
use super::device_bindings::StateDirty;

impl Device {
    /// Record that the native device is gone
    ///
    /// Native handles are left as they are until [`rebuild`](Self::rebuild).
    pub fn notify_device_lost(&mut self) {
        if self.state == DeviceState::Active {
            crate::gfx_warn!("prism::Device", "'{}' notified of device loss", self.config.label);
            self.state = DeviceState::Lost;
        }
    }

    pub fn is_lost(&self) -> bool {
        self.state == DeviceState::Lost
    }

    /// Recreate the native device and every object on it
    pub fn rebuild(&mut self) -> Result<()> {
        let keys = self.registry.keys_in_creation_order();
        crate::gfx_info!("prism::Device", "rebuilding '{}' ({} objects)", self.config.label, keys.len());
        self.state = DeviceState::Rebuilding;

        let backend = self.backend.as_mut();
        for key in &keys {
            if let Some(object) = self.registry.object_mut(*key) {
                object.resource_mut().release(backend);
            }
        }
        self.blend_cache.release_all(backend);
        self.raster_cache.release_all(backend);
        self.depth_stencil_cache.release_all(backend);
        backend.destroy_device();

        if let Err(err) = self.recreate(&keys) {
            self.state = DeviceState::Lost;
            crate::gfx_error!("prism::Device", "rebuild of '{}' failed: {}", self.config.label, err);
            return Err(err);
        }

        self.bindings.mark_all_dirty();
        self.state_dirty = StateDirty::all();
        self.stats.rebuilds += 1;
        self.state = DeviceState::Active;
        crate::gfx_info!("prism::Device", "'{}' rebuilt", self.config.label);
        Ok(())
    }

    fn recreate(&mut self, keys: &[ResourceKey]) -> Result<()> {
        let backend = self.backend.as_mut();
        backend.create_device(self.config.adapter_index)?;

        self.blend_cache.recompile_all(backend)?;
        self.raster_cache.recompile_all(backend)?;
        self.depth_stencil_cache.recompile_all(backend)?;

        for key in keys {
            if let Some(object) = self.registry.object_mut(*key) {
                object.resource_mut().rebuild(backend)?;
            }
        }
        Ok(())
    }
}
