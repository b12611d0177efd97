/// Registry of live resource objects
///
/// Arena of [`ResourceObject`]s indexed by stable [`ResourceKey`]s. Insert
/// and remove are O(1); a removed key is invalidated by the arena's version
/// counter, so a stale handle can never reach a newer object that reuses the
/// slot. Walks visit objects in creation order (oldest first).

use slotmap::SlotMap;

use crate::error::Result;
use crate::graphics::DeviceId;
use crate::resource::{GraphicsResource, ResourceHandle, ResourceKey, ResourceObject};

#[derive(Debug)]
pub struct Registry {
    device: DeviceId,
    objects: SlotMap<ResourceKey, ResourceObject>,
    next_serial: u64,
}

impl Registry {
    pub fn new(device: DeviceId) -> Self {
        Self {
            device,
            objects: SlotMap::with_key(),
            next_serial: 0,
        }
    }

    /// Device owning every object of this registry
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Link a new object and return its typed handle
    pub fn insert<H: ResourceHandle>(&mut self, resource: GraphicsResource) -> H {
        debug_assert_eq!(resource.resource_type(), H::TYPE);
        let serial = self.next_serial;
        self.next_serial += 1;
        let key = self.objects.insert(ResourceObject::new(self.device, serial, resource));
        crate::gfx_trace!("prism::Registry", "linked {} (serial {})", H::TYPE, serial);
        H::from_parts(self.device, key)
    }

    /// Resolve a handle to its resource
    pub fn get<H: ResourceHandle>(&self, handle: H) -> Result<&H::Target> {
        self.check_device(handle)?;
        match self.objects.get(handle.key()).map(|object| H::project(object.resource())) {
            Some(Some(target)) => Ok(target),
            Some(None) => Err(Self::wrong_type::<H>()),
            None => Err(Self::stale::<H>()),
        }
    }

    /// Resolve a handle to its resource, mutably
    pub fn get_mut<H: ResourceHandle>(&mut self, handle: H) -> Result<&mut H::Target> {
        self.check_device(handle)?;
        match self.objects.get_mut(handle.key()).map(|object| H::project_mut(object.resource_mut())) {
            Some(Some(target)) => Ok(target),
            Some(None) => Err(Self::wrong_type::<H>()),
            None => Err(Self::stale::<H>()),
        }
    }

    /// True if `handle` refers to a live object of this registry
    pub fn contains<H: ResourceHandle>(&self, handle: H) -> bool {
        handle.device() == self.device
            && self
                .objects
                .get(handle.key())
                .is_some_and(|object| H::project(object.resource()).is_some())
    }

    /// Unlink an object, returning its resource for release
    pub fn remove<H: ResourceHandle>(&mut self, handle: H) -> Result<GraphicsResource> {
        self.get(handle)?;
        match self.objects.remove(handle.key()) {
            Some(object) => {
                crate::gfx_trace!("prism::Registry", "unlinked {} (serial {})", H::TYPE, object.serial());
                Ok(object.into_resource())
            }
            None => Err(Self::stale::<H>()),
        }
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Keys of every live object, oldest first
    pub fn keys_in_creation_order(&self) -> Vec<ResourceKey> {
        let mut entries: Vec<(u64, ResourceKey)> = self
            .objects
            .iter()
            .map(|(key, object)| (object.serial(), key))
            .collect();
        entries.sort_unstable_by_key(|(serial, _)| *serial);
        entries.into_iter().map(|(_, key)| key).collect()
    }

    /// Every live object, oldest first
    pub fn walk(&self) -> Vec<&ResourceObject> {
        self.keys_in_creation_order()
            .into_iter()
            .filter_map(|key| self.objects.get(key))
            .collect()
    }

    pub(crate) fn object_mut(&mut self, key: ResourceKey) -> Option<&mut ResourceObject> {
        self.objects.get_mut(key)
    }

    /// Every live object in arena order
    pub(crate) fn objects_mut(&mut self) -> impl Iterator<Item = &mut ResourceObject> {
        self.objects.values_mut()
    }

    fn check_device<H: ResourceHandle>(&self, handle: H) -> Result<()> {
        if handle.device() != self.device {
            return Err(crate::gfx_err!(
                "prism::Registry",
                InvalidResource,
                "{} handle belongs to device {} (this is device {})",
                H::TYPE,
                handle.device().as_u64(),
                self.device.as_u64()
            ));
        }
        Ok(())
    }

    fn stale<H: ResourceHandle>() -> crate::error::Error {
        crate::gfx_err!("prism::Registry", InvalidResource, "stale {} handle", H::TYPE)
    }

    fn wrong_type<H: ResourceHandle>() -> crate::error::Error {
        crate::gfx_err!("prism::Registry", InvalidResource, "handle does not refer to a {}", H::TYPE)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
