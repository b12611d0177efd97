/// Compiled state cache
///
/// Maps each distinct [`StateValue`] to one native state object. Lookups are
/// a linear scan: a process only ever uses a handful of pipeline
/// configurations, so the cache never evicts.

use crate::backend::{NativeBackend, NativeHandle};
use crate::error::Result;
use crate::state::StateValue;

/// One cache entry
///
/// `handle` is `None` between a release and the following recompilation.
#[derive(Debug, Clone, Copy)]
pub struct CachedState<V: StateValue> {
    pub value: V,
    pub handle: Option<NativeHandle>,
}

/// Cache of compiled native state objects for one state family
#[derive(Debug)]
pub struct CompiledStateCache<V: StateValue> {
    entries: Vec<CachedState<V>>,
    compilations: u64,
}

impl<V: StateValue> CompiledStateCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            compilations: 0,
        }
    }

    /// Return the native object for `value`, compiling it on a miss
    pub fn resolve(&mut self, value: &V, backend: &mut dyn NativeBackend) -> Result<NativeHandle> {
        if let Some(index) = self.entries.iter().position(|entry| entry.value == *value) {
            if let Some(handle) = self.entries[index].handle {
                return Ok(handle);
            }
            let handle = self.compile(value, backend)?;
            self.entries[index].handle = Some(handle);
            return Ok(handle);
        }

        let handle = self.compile(value, backend)?;
        self.entries.push(CachedState { value: *value, handle: Some(handle) });
        Ok(handle)
    }

    /// Cached handle for `value` without compiling
    pub fn lookup(&self, value: &V) -> Option<NativeHandle> {
        self.entries
            .iter()
            .find(|entry| entry.value == *value)
            .and_then(|entry| entry.handle)
    }

    /// Release every native object, keeping the values
    pub fn release_all(&mut self, backend: &mut dyn NativeBackend) {
        for entry in &mut self.entries {
            if let Some(handle) = entry.handle.take() {
                backend.release(handle);
            }
        }
    }

    /// Compile every cached value again against the current native device
    ///
    /// Stops at the first failure; entries after it stay released.
    pub fn recompile_all(&mut self, backend: &mut dyn NativeBackend) -> Result<()> {
        for index in 0..self.entries.len() {
            let value = self.entries[index].value;
            let handle = self.compile(&value, backend)?;
            self.entries[index].handle = Some(handle);
        }
        Ok(())
    }

    /// Release every native object and forget all values
    pub fn clear(&mut self, backend: &mut dyn NativeBackend) {
        self.release_all(backend);
        self.entries.clear();
    }

    /// Number of distinct values cached
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total native compilations performed by this cache
    pub fn compilations(&self) -> u64 {
        self.compilations
    }

    pub fn entries(&self) -> &[CachedState<V>] {
        &self.entries
    }

    fn compile(&mut self, value: &V, backend: &mut dyn NativeBackend) -> Result<NativeHandle> {
        crate::gfx_debug!("prism::StateCache", "compiling {} state {:?}", V::KIND, value);
        let handle = value.compile(backend)?;
        self.compilations += 1;
        Ok(handle)
    }
}

impl<V: StateValue> Default for CompiledStateCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "state_cache_tests.rs"]
mod tests;
