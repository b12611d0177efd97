/// Current bindings and the draw path
///
/// Bindings hold non-owning handles. Every setter only records the new value
/// and a dirty bit; nothing reaches the backend until [`Device::draw`],
/// [`Device::clear`] or [`Device::present`] flushes what changed.

use bitflags::bitflags;

use crate::backend::{ClearFlags, PrimitiveTopology, Rect, ShaderStage};
use crate::error::Result;
use crate::gfx_bail;
use crate::resource::{
    ResourceHandle, ResourceKey, TextureHandle, ZStencilHandle, SamplerHandle,
    VertexBufferHandle, IndexBufferHandle, VertexShaderHandle, PixelShaderHandle,
    SwapChainHandle,
};
use crate::shader::MAX_TEXTURES;
use crate::state::{StateValue, BlendState, RasterState, DepthStencilState};
use super::device::Device;

/// First backend slot used by vertex-stage texture parameters
pub const VERTEX_TEXTURE_SLOT_BASE: usize = MAX_TEXTURES;

bitflags! {
    /// Fixed-function state families changed since the last draw
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StateDirty: u8 {
        const BLEND = 1 << 0;
        const RASTER = 1 << 1;
        const DEPTH_STENCIL = 1 << 2;
    }
}

bitflags! {
    /// Non-slot bindings changed since the last flush
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct BindingDirty: u16 {
        const RENDER_TARGET = 1 << 0;
        const VERTEX_BUFFER = 1 << 1;
        const INDEX_BUFFER = 1 << 2;
        const VERTEX_SHADER = 1 << 3;
        const PIXEL_SHADER = 1 << 4;
        const VIEWPORT = 1 << 5;
        const VIEW_PROJ = 1 << 6;
        const WORLD = 1 << 7;
    }
}

/// What a sampler slot refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerBinding {
    /// Standalone sampler state
    State(SamplerHandle),
    /// The n-th sampler declared by a pixel shader
    Shader(PixelShaderHandle, usize),
}

impl SamplerBinding {
    fn refers_to(&self, key: ResourceKey) -> bool {
        match self {
            SamplerBinding::State(sampler) => sampler.key() == key,
            SamplerBinding::Shader(shader, _) => shader.key() == key,
        }
    }
}

// ===== DEVICE BINDINGS =====

#[derive(Debug)]
pub(crate) struct DeviceBindings {
    pub(crate) render_target: Option<TextureHandle>,
    pub(crate) zstencil: Option<ZStencilHandle>,
    pub(crate) textures: Vec<Option<TextureHandle>>,
    pub(crate) samplers: Vec<Option<SamplerBinding>>,
    /// One bit per slot
    pub(crate) dirty_textures: u32,
    pub(crate) dirty_samplers: u32,
    /// Vertex-stage textures and samplers as last sent, per parameter index
    pub(crate) vertex_textures: [Option<TextureHandle>; MAX_TEXTURES],
    pub(crate) vertex_samplers: [Option<(VertexShaderHandle, usize)>; MAX_TEXTURES],
    pub(crate) vertex_buffer: Option<VertexBufferHandle>,
    pub(crate) index_buffer: Option<IndexBufferHandle>,
    pub(crate) vertex_shader: Option<VertexShaderHandle>,
    pub(crate) pixel_shader: Option<PixelShaderHandle>,
    pub(crate) swap_chain: Option<SwapChainHandle>,
    pub(crate) dirty: BindingDirty,
}

impl DeviceBindings {
    pub(crate) fn new(slots: usize) -> Self {
        Self {
            render_target: None,
            zstencil: None,
            textures: vec![None; slots],
            samplers: vec![None; slots],
            dirty_textures: 0,
            dirty_samplers: 0,
            vertex_textures: [None; MAX_TEXTURES],
            vertex_samplers: [None; MAX_TEXTURES],
            vertex_buffer: None,
            index_buffer: None,
            vertex_shader: None,
            pixel_shader: None,
            swap_chain: None,
            dirty: BindingDirty::RENDER_TARGET | BindingDirty::VIEW_PROJ,
        }
    }

    fn slot_mask(&self) -> u32 {
        (1u32 << self.textures.len()) - 1
    }

    pub(crate) fn set_texture_slot(&mut self, slot: usize, texture: Option<TextureHandle>) {
        if self.textures[slot] != texture {
            self.textures[slot] = texture;
            self.dirty_textures |= 1 << slot;
        }
    }

    pub(crate) fn set_sampler_slot(&mut self, slot: usize, sampler: Option<SamplerBinding>) {
        if self.samplers[slot] != sampler {
            self.samplers[slot] = sampler;
            self.dirty_samplers |= 1 << slot;
        }
    }

    pub(crate) fn mark_render_target_dirty(&mut self) {
        self.dirty |= BindingDirty::RENDER_TARGET;
    }

    /// Force every binding to be sent again on the next flush
    ///
    /// Only valid against a fresh native device, which has nothing bound.
    pub(crate) fn mark_all_dirty(&mut self) {
        self.dirty = BindingDirty::all();
        self.dirty_textures = self.slot_mask();
        self.dirty_samplers = self.slot_mask();
        self.vertex_textures = [None; MAX_TEXTURES];
        self.vertex_samplers = [None; MAX_TEXTURES];
    }

    /// Drop every binding that refers to `key`
    pub(crate) fn forget(&mut self, key: ResourceKey) {
        if self.render_target.is_some_and(|h| h.key() == key) {
            self.render_target = None;
            self.dirty |= BindingDirty::RENDER_TARGET;
        }
        if self.zstencil.is_some_and(|h| h.key() == key) {
            self.zstencil = None;
            self.dirty |= BindingDirty::RENDER_TARGET;
        }
        if self.swap_chain.is_some_and(|h| h.key() == key) {
            self.swap_chain = None;
            self.dirty |= BindingDirty::RENDER_TARGET;
        }
        for slot in 0..self.textures.len() {
            if self.textures[slot].is_some_and(|h| h.key() == key) {
                self.set_texture_slot(slot, None);
            }
            if self.samplers[slot].is_some_and(|s| s.refers_to(key)) {
                self.set_sampler_slot(slot, None);
            }
        }
        if self.vertex_buffer.is_some_and(|h| h.key() == key) {
            self.vertex_buffer = None;
            self.dirty |= BindingDirty::VERTEX_BUFFER;
        }
        if self.index_buffer.is_some_and(|h| h.key() == key) {
            self.index_buffer = None;
            self.dirty |= BindingDirty::INDEX_BUFFER;
        }
        if self.vertex_shader.is_some_and(|h| h.key() == key) {
            self.vertex_shader = None;
            self.dirty |= BindingDirty::VERTEX_SHADER;
        }
        if self.pixel_shader.is_some_and(|h| h.key() == key) {
            self.pixel_shader = None;
            self.dirty |= BindingDirty::PIXEL_SHADER;
        }
    }
}

// ===== BINDING API =====

impl Device {
    /// Draw into `texture` (a render target) or, with `None`, into the loaded swap chain
    pub fn set_render_target(
        &mut self,
        texture: Option<TextureHandle>,
        zstencil: Option<ZStencilHandle>,
    ) -> Result<()> {
        if let Some(texture) = texture {
            if !self.registry.get(texture)?.is_render_target() {
                gfx_bail!("prism::Device", Configuration, "texture was not created as a render target");
            }
        }
        if let Some(zstencil) = zstencil {
            self.registry.get(zstencil)?;
        }
        if self.bindings.render_target != texture || self.bindings.zstencil != zstencil {
            self.bindings.render_target = texture;
            self.bindings.zstencil = zstencil;
            self.bindings.mark_render_target_dirty();
        }
        Ok(())
    }

    pub fn render_target(&self) -> Option<TextureHandle> {
        self.bindings.render_target
    }

    /// Bind a texture to a slot in `0..texture_slots`
    pub fn set_texture(&mut self, slot: usize, texture: Option<TextureHandle>) -> Result<()> {
        self.check_slot(slot)?;
        if let Some(texture) = texture {
            self.registry.get(texture)?;
        }
        self.bindings.set_texture_slot(slot, texture);
        Ok(())
    }

    pub fn texture(&self, slot: usize) -> Option<TextureHandle> {
        self.bindings.textures.get(slot).copied().flatten()
    }

    /// Bind a standalone sampler state to a slot in `0..texture_slots`
    pub fn set_sampler(&mut self, slot: usize, sampler: Option<SamplerHandle>) -> Result<()> {
        self.check_slot(slot)?;
        if let Some(sampler) = sampler {
            self.registry.get(sampler)?;
        }
        self.bindings.set_sampler_slot(slot, sampler.map(SamplerBinding::State));
        Ok(())
    }

    pub fn sampler(&self, slot: usize) -> Option<SamplerBinding> {
        self.bindings.samplers.get(slot).copied().flatten()
    }

    pub fn set_vertex_buffer(&mut self, buffer: Option<VertexBufferHandle>) -> Result<()> {
        if let Some(buffer) = buffer {
            self.registry.get(buffer)?;
        }
        if self.bindings.vertex_buffer != buffer {
            self.bindings.vertex_buffer = buffer;
            self.bindings.dirty |= BindingDirty::VERTEX_BUFFER;
        }
        Ok(())
    }

    pub fn set_index_buffer(&mut self, buffer: Option<IndexBufferHandle>) -> Result<()> {
        if let Some(buffer) = buffer {
            self.registry.get(buffer)?;
        }
        if self.bindings.index_buffer != buffer {
            self.bindings.index_buffer = buffer;
            self.bindings.dirty |= BindingDirty::INDEX_BUFFER;
        }
        Ok(())
    }

    pub fn set_vertex_shader(&mut self, shader: Option<VertexShaderHandle>) -> Result<()> {
        if let Some(shader) = shader {
            self.registry.get(shader)?;
        }
        if self.bindings.vertex_shader != shader {
            self.bindings.vertex_shader = shader;
            self.bindings.dirty |= BindingDirty::VERTEX_SHADER;
        }
        Ok(())
    }

    /// Bind a pixel shader; its declared samplers take slots `0..n`
    pub fn set_pixel_shader(&mut self, shader: Option<PixelShaderHandle>) -> Result<()> {
        if self.bindings.pixel_shader == shader {
            return Ok(());
        }
        let sampler_count = match shader {
            Some(handle) => self.registry.get(handle)?.sampler_count(),
            None => 0,
        };
        if sampler_count > self.bindings.samplers.len() {
            gfx_bail!("prism::Device", Configuration,
                "pixel shader declares {} samplers, device has {} slots",
                sampler_count, self.bindings.samplers.len());
        }

        if let Some(previous) = self.bindings.pixel_shader {
            for slot in 0..self.bindings.samplers.len() {
                if matches!(self.bindings.samplers[slot], Some(SamplerBinding::Shader(owner, _)) if owner == previous) {
                    self.bindings.set_sampler_slot(slot, None);
                }
            }
        }
        if let Some(shader) = shader {
            for index in 0..sampler_count {
                self.bindings.set_sampler_slot(index, Some(SamplerBinding::Shader(shader, index)));
            }
        }
        self.bindings.pixel_shader = shader;
        self.bindings.dirty |= BindingDirty::PIXEL_SHADER;
        Ok(())
    }

    pub fn vertex_shader(&self) -> Option<VertexShaderHandle> {
        self.bindings.vertex_shader
    }

    pub fn pixel_shader(&self) -> Option<PixelShaderHandle> {
        self.bindings.pixel_shader
    }

    /// Make `swap_chain` the default render target and the target of [`present`](Self::present)
    pub fn load_swap_chain(&mut self, swap_chain: Option<SwapChainHandle>) -> Result<()> {
        if let Some(swap_chain) = swap_chain {
            self.registry.get(swap_chain)?;
        }
        if self.bindings.swap_chain != swap_chain {
            self.bindings.swap_chain = swap_chain;
            self.bindings.mark_render_target_dirty();
        }
        Ok(())
    }

    pub fn swap_chain(&self) -> Option<SwapChainHandle> {
        self.bindings.swap_chain
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.bindings.dirty |= BindingDirty::VIEWPORT;
        }
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    // ===== FIXED-FUNCTION STATE =====

    pub fn set_blend_state(&mut self, state: BlendState) {
        if self.blend_state != state {
            self.blend_state = state;
            self.state_dirty |= StateDirty::BLEND;
        }
    }

    pub fn set_raster_state(&mut self, state: RasterState) {
        if self.raster_state != state {
            self.raster_state = state;
            self.state_dirty |= StateDirty::RASTER;
        }
    }

    pub fn set_depth_stencil_state(&mut self, state: DepthStencilState) {
        if self.depth_stencil_state != state {
            self.depth_stencil_state = state;
            self.state_dirty |= StateDirty::DEPTH_STENCIL;
        }
    }

    pub fn blend_state(&self) -> &BlendState {
        &self.blend_state
    }

    pub fn raster_state(&self) -> &RasterState {
        &self.raster_state
    }

    pub fn depth_stencil_state(&self) -> &DepthStencilState {
        &self.depth_stencil_state
    }

    /// State families that will be resolved on the next draw
    pub fn dirty_states(&self) -> StateDirty {
        self.state_dirty
    }

    // ===== COMMANDS =====

    /// Flush every changed binding and issue a draw
    ///
    /// Uses the bound index buffer when there is one. A `count` of 0 draws
    /// every vertex (or every index).
    pub fn draw(&mut self, topology: PrimitiveTopology, start: u32, count: u32) -> Result<()> {
        self.ensure_active()?;
        let result = self.flush_and_draw(topology, start, count);
        self.observe(result)
    }

    /// Clear the current render target
    pub fn clear(&mut self, flags: ClearFlags, color: [f32; 4], depth: f32, stencil: u8) -> Result<()> {
        self.ensure_active()?;
        let result = self.flush_target().and_then(|_| self.backend.clear(flags, color, depth, stencil));
        self.observe(result)
    }

    /// Present the loaded swap chain
    pub fn present(&mut self) -> Result<()> {
        self.ensure_active()?;
        let Some(swap_chain) = self.bindings.swap_chain else {
            gfx_bail!("prism::Device", Configuration, "present() without a loaded swap chain");
        };
        let Some(surface) = self.registry.get(swap_chain)?.surface_handle() else {
            gfx_bail!("prism::Device", InvalidResource, "swap chain has no native surface");
        };
        let result = self.backend.present(surface);
        self.observe(result)
    }

    // ===== FLUSH =====

    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot >= self.bindings.textures.len() {
            gfx_bail!("prism::Device", Configuration,
                "slot {} out of range (device has {} slots)", slot, self.bindings.textures.len());
        }
        Ok(())
    }

    fn flush_and_draw(&mut self, topology: PrimitiveTopology, start: u32, count: u32) -> Result<()> {
        let bindings = &self.bindings;
        let (Some(vs), Some(ps), Some(vb)) = (bindings.vertex_shader, bindings.pixel_shader, bindings.vertex_buffer)
        else {
            gfx_bail!("prism::Device", Configuration,
                "draw needs a vertex shader, a pixel shader and a vertex buffer");
        };

        self.flush_target()?;
        self.flush_shaders(vs, ps)?;
        self.flush_slots()?;
        self.flush_streams(vs, vb)?;
        self.flush_states()?;
        self.bindings.dirty = BindingDirty::empty();

        match self.bindings.index_buffer {
            Some(ib) => {
                let count = if count == 0 { self.registry.get(ib)?.count() as u32 } else { count };
                self.backend.draw_indexed(topology, start, count)?;
            }
            None => {
                let count = if count == 0 { self.registry.get(vb)?.vertex_count() as u32 } else { count };
                self.backend.draw(topology, start, count)?;
            }
        }
        self.stats.draw_calls += 1;
        Ok(())
    }

    /// Render target and viewport
    fn flush_target(&mut self) -> Result<()> {
        let registry = &self.registry;
        if self.bindings.dirty.contains(BindingDirty::RENDER_TARGET) {
            let zstencil = match self.bindings.zstencil {
                Some(zstencil) => registry.get(zstencil)?.handle(),
                None => None,
            };
            let (color, zstencil) = match (self.bindings.render_target, self.bindings.swap_chain) {
                (Some(texture), _) => (registry.get(texture)?.handle(), zstencil),
                (None, Some(swap_chain)) => {
                    let swap_chain = registry.get(swap_chain)?;
                    (swap_chain.surface_handle(), zstencil.or(swap_chain.zstencil_handle()))
                }
                (None, None) => (None, zstencil),
            };
            self.backend.bind_render_target(color, zstencil)?;
            self.bindings.dirty.remove(BindingDirty::RENDER_TARGET);
        }
        if self.bindings.dirty.contains(BindingDirty::VIEWPORT) {
            self.backend.set_viewport(self.viewport)?;
            self.bindings.dirty.remove(BindingDirty::VIEWPORT);
        }
        Ok(())
    }

    /// Shaders, constant buffers and texture parameters
    fn flush_shaders(&mut self, vs: VertexShaderHandle, ps: PixelShaderHandle) -> Result<()> {
        let dirty = self.bindings.dirty;
        let backend = self.backend.as_mut();

        let vertex = self.registry.get_mut(vs)?;
        if dirty.intersects(BindingDirty::VIEW_PROJ | BindingDirty::VERTEX_SHADER) {
            vertex.set_view_proj(&self.transforms.view_proj())?;
        }
        if dirty.intersects(BindingDirty::WORLD | BindingDirty::VERTEX_SHADER) {
            vertex.set_world(&self.transforms.world())?;
        }
        let vs_upload = vertex.upload_params(backend)?;
        if dirty.contains(BindingDirty::VERTEX_SHADER) {
            backend.bind_shader(ShaderStage::Vertex, vertex.handle())?;
            backend.bind_constant_buffer(ShaderStage::Vertex, vertex.constant_buffer())?;
        }

        let pixel = self.registry.get_mut(ps)?;
        let ps_upload = pixel.upload_params(backend)?;
        if dirty.contains(BindingDirty::PIXEL_SHADER) {
            backend.bind_shader(ShaderStage::Pixel, pixel.handle())?;
            backend.bind_constant_buffer(ShaderStage::Pixel, pixel.constant_buffer())?;
        }
        let pixel_textures = pixel.texture_bindings();

        self.stats.constant_uploads += vs_upload.uploaded as u64 + ps_upload.uploaded as u64;

        // slots paired with texture parameters always follow the bound shader
        for (slot, texture) in pixel_textures {
            if slot < self.bindings.textures.len() {
                self.bindings.set_texture_slot(slot, texture);
                self.bindings.set_sampler_slot(slot, Some(SamplerBinding::Shader(ps, slot)));
            }
        }
        self.flush_vertex_slots(vs)
    }

    /// Vertex-stage textures and their samplers at `VERTEX_TEXTURE_SLOT_BASE + i`
    fn flush_vertex_slots(&mut self, vs: VertexShaderHandle) -> Result<()> {
        let shader = self.registry.get(vs)?;
        let sampler_count = shader.sampler_count();
        let mut textures = [None; MAX_TEXTURES];
        for (index, texture) in shader.texture_bindings() {
            if let Some(entry) = textures.get_mut(index) {
                *entry = texture;
            }
        }

        for (index, texture) in textures.into_iter().enumerate() {
            let slot = VERTEX_TEXTURE_SLOT_BASE + index;
            if self.bindings.vertex_textures[index] != texture {
                let native = match texture {
                    Some(texture) => self.registry.get(texture)?.handle(),
                    None => None,
                };
                self.backend.bind_texture(slot, native)?;
                self.bindings.vertex_textures[index] = texture;
            }
            let sampler = (index < sampler_count).then_some((vs, index));
            if self.bindings.vertex_samplers[index] != sampler {
                let native = match sampler {
                    Some((shader, index)) => self.registry.get(shader)?.sampler_handle(index),
                    None => None,
                };
                self.backend.bind_sampler(slot, native)?;
                self.bindings.vertex_samplers[index] = sampler;
            }
        }
        Ok(())
    }

    /// Dirty texture and sampler slots
    fn flush_slots(&mut self) -> Result<()> {
        for slot in 0..self.bindings.textures.len() {
            let bit = 1u32 << slot;
            if self.bindings.dirty_textures & bit != 0 {
                let native = match self.bindings.textures[slot] {
                    Some(texture) => self.registry.get(texture)?.handle(),
                    None => None,
                };
                self.backend.bind_texture(slot, native)?;
                self.bindings.dirty_textures &= !bit;
            }
            if self.bindings.dirty_samplers & bit != 0 {
                let native = match self.bindings.samplers[slot] {
                    Some(SamplerBinding::State(sampler)) => self.registry.get(sampler)?.handle(),
                    Some(SamplerBinding::Shader(shader, index)) => self.registry.get(shader)?.sampler_handle(index),
                    None => None,
                };
                self.backend.bind_sampler(slot, native)?;
                self.bindings.dirty_samplers &= !bit;
            }
        }
        Ok(())
    }

    /// Vertex streams in vertex shader order, then the index buffer
    fn flush_streams(&mut self, vs: VertexShaderHandle, vb: VertexBufferHandle) -> Result<()> {
        let dirty = self.bindings.dirty;
        if dirty.intersects(BindingDirty::VERTEX_BUFFER | BindingDirty::VERTEX_SHADER) {
            let inputs = *self.registry.get(vs)?.inputs();
            let streams = self.registry.get(vb)?.streams_for(&inputs)?;
            self.backend.bind_vertex_buffers(&streams)?;
        }
        if dirty.contains(BindingDirty::INDEX_BUFFER) {
            let native = match self.bindings.index_buffer {
                Some(ib) => {
                    let buffer = self.registry.get(ib)?;
                    buffer.handle().map(|handle| (handle, buffer.index_type()))
                }
                None => None,
            };
            self.backend.bind_index_buffer(native)?;
        }
        Ok(())
    }

    /// Resolve changed state families through their caches
    fn flush_states(&mut self) -> Result<()> {
        let backend = self.backend.as_mut();
        if self.state_dirty.contains(StateDirty::BLEND) {
            let handle = self.blend_cache.resolve(&self.blend_state, backend)?;
            BlendState::bind(handle, backend)?;
            self.state_dirty.remove(StateDirty::BLEND);
        }
        if self.state_dirty.contains(StateDirty::RASTER) {
            let handle = self.raster_cache.resolve(&self.raster_state, backend)?;
            RasterState::bind(handle, backend)?;
            self.state_dirty.remove(StateDirty::RASTER);
        }
        if self.state_dirty.contains(StateDirty::DEPTH_STENCIL) {
            let handle = self.depth_stencil_cache.resolve(&self.depth_stencil_state, backend)?;
            DepthStencilState::bind(handle, backend)?;
            self.state_dirty.remove(StateDirty::DEPTH_STENCIL);
        }
        Ok(())
    }
}
