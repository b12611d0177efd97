/// Device - resource factory, registry owner and draw-state tracker
///
/// A device owns one native backend, the registry of every live resource,
/// the three compiled-state caches and the current bindings. All calls for
/// one device must come from a single thread; separate devices share
/// nothing but the process-wide logger.

use crate::backend::{NativeBackend, ShaderStage};
use crate::error::{Error, Result};
use crate::gfx_bail;
use crate::graphics::{DeviceId, Graphics};
use crate::resource::{
    GraphicsResource, Registry, ResourceHandle, ResourceKey,
    VertexBuffer, VertexData, VertexBufferHandle, BufferFlags,
    IndexBuffer, IndexBufferHandle, IndexType,
    Texture2D, TextureDesc, TextureHandle,
    DepthStencilBuffer, ZStencilHandle, ZStencilFormat,
    StagingSurface, StagingSurfaceHandle, ColorFormat,
    SamplerState, SamplerInfo, SamplerHandle,
    SwapChain, SwapChainDesc, SwapChainHandle,
    VertexShaderHandle, PixelShaderHandle,
};
use crate::shader::{Shader, ShaderDesc, MAX_TEXTURES};
use crate::state::{CompiledStateCache, BlendState, RasterState, DepthStencilState};
use super::device_bindings::{DeviceBindings, StateDirty};
use super::transform::TransformStack;
use crate::backend::Rect;

// ===== CONFIGURATION =====

/// Device configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Adapter the native device is created on
    pub adapter_index: u32,
    /// Name used in logs
    pub label: String,
    /// Texture / sampler slots, 1..=MAX_TEXTURES
    pub texture_slots: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adapter_index: 0,
            label: "Prism Device".to_string(),
            texture_slots: MAX_TEXTURES,
        }
    }
}

// ===== STATE / STATS =====

/// Device lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Accepting creations and draws
    Active,
    /// Native device gone; only a rebuild recovers
    Lost,
    /// Rebuild in progress
    Rebuilding,
}

/// Counters since device creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub draw_calls: u64,
    /// Native fixed-function state compilations (all three caches)
    pub state_compilations: u64,
    /// Native constant-buffer uploads
    pub constant_uploads: u64,
    /// Successful rebuilds
    pub rebuilds: u64,
}

// ===== DEVICE =====

/// Graphics device
pub struct Device {
    pub(super) id: DeviceId,
    pub(super) config: DeviceConfig,
    pub(super) backend: Box<dyn NativeBackend>,
    pub(super) state: DeviceState,
    pub(super) registry: Registry,
    pub(super) blend_cache: CompiledStateCache<BlendState>,
    pub(super) raster_cache: CompiledStateCache<RasterState>,
    pub(super) depth_stencil_cache: CompiledStateCache<DepthStencilState>,
    pub(super) blend_state: BlendState,
    pub(super) raster_state: RasterState,
    pub(super) depth_stencil_state: DepthStencilState,
    pub(super) state_dirty: StateDirty,
    pub(super) bindings: DeviceBindings,
    pub(super) transforms: TransformStack,
    pub(super) viewport: Rect,
    pub(super) stats: DeviceStats,
}

impl Device {
    /// Create the native device and an empty registry
    ///
    /// # Example
    ///
    /// ```no_run
    /// use prism_graphics::prism::{Device, DeviceConfig, backend::MockBackend};
    ///
    /// let device = Device::new(Box::new(MockBackend::new()), DeviceConfig::default())?;
    /// # Ok::<(), prism_graphics::prism::Error>(())
    /// ```
    pub fn new(mut backend: Box<dyn NativeBackend>, config: DeviceConfig) -> Result<Self> {
        if config.texture_slots == 0 || config.texture_slots > MAX_TEXTURES {
            gfx_bail!("prism::Device", Configuration,
                "texture_slots must be in 1..={} (got {})", MAX_TEXTURES, config.texture_slots);
        }
        backend.create_device(config.adapter_index)?;

        let id = Graphics::next_device_id();
        crate::gfx_info!("prism::Device", "'{}' created on adapter {} ({} backend)",
            config.label, config.adapter_index, backend.name());

        Ok(Self {
            id,
            bindings: DeviceBindings::new(config.texture_slots),
            config,
            backend,
            state: DeviceState::Active,
            registry: Registry::new(id),
            blend_cache: CompiledStateCache::new(),
            raster_cache: CompiledStateCache::new(),
            depth_stencil_cache: CompiledStateCache::new(),
            blend_state: BlendState::default(),
            raster_state: RasterState::default(),
            depth_stencil_state: DepthStencilState::default(),
            state_dirty: StateDirty::all(),
            transforms: TransformStack::new(),
            viewport: Rect::default(),
            stats: DeviceStats::default(),
        })
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Counters, with state compilations summed over the three caches
    pub fn stats(&self) -> DeviceStats {
        DeviceStats {
            state_compilations: self.blend_cache.compilations()
                + self.raster_cache.compilations()
                + self.depth_stencil_cache.compilations(),
            ..self.stats
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn blend_cache(&self) -> &CompiledStateCache<BlendState> {
        &self.blend_cache
    }

    pub fn raster_cache(&self) -> &CompiledStateCache<RasterState> {
        &self.raster_cache
    }

    pub fn depth_stencil_cache(&self) -> &CompiledStateCache<DepthStencilState> {
        &self.depth_stencil_cache
    }

    /// Resolve a handle to its resource
    pub fn get<H: ResourceHandle>(&self, handle: H) -> Result<&H::Target> {
        self.registry.get(handle)
    }

    // ===== CREATION =====

    pub fn create_vertex_buffer(&mut self, data: VertexData, flags: BufferFlags) -> Result<VertexBufferHandle> {
        self.ensure_active()?;
        let result = VertexBuffer::new(self.backend.as_mut(), data, flags).map(GraphicsResource::VertexBuffer);
        self.link(result)
    }

    pub fn create_index_buffer(
        &mut self,
        index_type: IndexType,
        data: Vec<u8>,
        flags: BufferFlags,
    ) -> Result<IndexBufferHandle> {
        self.ensure_active()?;
        let result = IndexBuffer::new(self.backend.as_mut(), index_type, data, flags)
            .map(GraphicsResource::IndexBuffer);
        self.link(result)
    }

    /// Create a texture; `data` holds one byte vector per mip level, or nothing
    pub fn create_texture(&mut self, desc: TextureDesc, data: Vec<Vec<u8>>) -> Result<TextureHandle> {
        self.ensure_active()?;
        let result = Texture2D::new(self.backend.as_mut(), desc, data).map(GraphicsResource::Texture2D);
        self.link(result)
    }

    pub fn create_zstencil(&mut self, width: u32, height: u32, format: ZStencilFormat) -> Result<ZStencilHandle> {
        self.ensure_active()?;
        let result = DepthStencilBuffer::new(self.backend.as_mut(), width, height, format)
            .map(GraphicsResource::DepthStencilBuffer);
        self.link(result)
    }

    pub fn create_staging_surface(
        &mut self,
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> Result<StagingSurfaceHandle> {
        self.ensure_active()?;
        let result = StagingSurface::new(self.backend.as_mut(), width, height, format)
            .map(GraphicsResource::StagingSurface);
        self.link(result)
    }

    pub fn create_sampler_state(&mut self, info: SamplerInfo) -> Result<SamplerHandle> {
        self.ensure_active()?;
        let result = SamplerState::new(self.backend.as_mut(), info).map(GraphicsResource::SamplerState);
        self.link(result)
    }

    pub fn create_vertex_shader(&mut self, desc: ShaderDesc) -> Result<VertexShaderHandle> {
        self.ensure_active()?;
        let result = Shader::new(self.backend.as_mut(), ShaderStage::Vertex, desc)
            .map(GraphicsResource::VertexShader);
        self.link(result)
    }

    pub fn create_pixel_shader(&mut self, desc: ShaderDesc) -> Result<PixelShaderHandle> {
        self.ensure_active()?;
        let result = Shader::new(self.backend.as_mut(), ShaderStage::Pixel, desc)
            .map(GraphicsResource::PixelShader);
        self.link(result)
    }

    pub fn create_swap_chain(&mut self, desc: SwapChainDesc) -> Result<SwapChainHandle> {
        self.ensure_active()?;
        let result = SwapChain::new(self.backend.as_mut(), desc).map(GraphicsResource::SwapChain);
        self.link(result)
    }

    // ===== DESTRUCTION =====

    /// Unlink, unbind, then release the native handles of a resource
    pub fn destroy<H: ResourceHandle>(&mut self, handle: H) -> Result<()> {
        let mut resource = self.registry.remove(handle)?;
        self.forget(handle.key());
        resource.release(self.backend.as_mut());
        crate::gfx_trace!("prism::Device", "destroyed {}", H::TYPE);
        Ok(())
    }

    /// Clear every binding and shader texture parameter referring to `key`
    fn forget(&mut self, key: ResourceKey) {
        self.bindings.forget(key);
        for object in self.registry.objects_mut() {
            if let GraphicsResource::VertexShader(shader) | GraphicsResource::PixelShader(shader) =
                object.resource_mut()
            {
                shader.forget_texture(key);
            }
        }
    }

    // ===== UPDATES =====

    /// Replace the streams of a dynamic vertex buffer
    pub fn update_vertex_buffer(&mut self, handle: VertexBufferHandle, data: VertexData) -> Result<()> {
        self.ensure_active()?;
        let result = match self.registry.get_mut(handle) {
            Ok(buffer) => buffer.update(self.backend.as_mut(), data),
            Err(err) => Err(err),
        };
        self.observe(result)
    }

    /// Replace the indices of a dynamic index buffer
    pub fn update_index_buffer(&mut self, handle: IndexBufferHandle, data: Vec<u8>) -> Result<()> {
        self.ensure_active()?;
        let result = match self.registry.get_mut(handle) {
            Ok(buffer) => buffer.update(self.backend.as_mut(), data),
            Err(err) => Err(err),
        };
        self.observe(result)
    }

    /// Replace level 0 of a dynamic texture
    pub fn set_texture_image(&mut self, handle: TextureHandle, bytes: Vec<u8>) -> Result<()> {
        self.ensure_active()?;
        let result = match self.registry.get_mut(handle) {
            Ok(texture) => texture.set_image(self.backend.as_mut(), bytes),
            Err(err) => Err(err),
        };
        self.observe(result)
    }

    /// Copy a texture into a staging surface of identical size and format
    pub fn stage_texture(&mut self, staging: StagingSurfaceHandle, texture: TextureHandle) -> Result<()> {
        self.ensure_active()?;
        let surface = self.registry.get(staging)?;
        let source = self.registry.get(texture)?;
        if !surface.matches(source) {
            gfx_bail!("prism::Device", Configuration,
                "staging surface {}x{} {:?} cannot receive texture {}x{} {:?}",
                surface.width(), surface.height(), surface.format(),
                source.width(), source.height(), source.format());
        }
        let (Some(dst), Some(src)) = (surface.handle(), source.handle()) else {
            gfx_bail!("prism::Device", InvalidResource, "staging copy between released objects");
        };
        let result = self.backend.copy_texture_to_staging(src, dst);
        self.observe(result)
    }

    /// Read back the bytes of a staging surface
    pub fn map_staging_surface(&mut self, staging: StagingSurfaceHandle) -> Result<Vec<u8>> {
        self.ensure_active()?;
        let Some(handle) = self.registry.get(staging)?.handle() else {
            gfx_bail!("prism::Device", InvalidResource, "staging surface has no native object");
        };
        let result = self.backend.map_staging_surface(handle);
        self.observe(result)
    }

    /// Release and rebuild a swap chain at a new size
    pub fn resize_swap_chain(&mut self, handle: SwapChainHandle, width: u32, height: u32) -> Result<()> {
        self.ensure_active()?;
        let result = match self.registry.get_mut(handle) {
            Ok(swap_chain) => swap_chain.resize(self.backend.as_mut(), width, height),
            Err(err) => Err(err),
        };
        self.observe(result)?;
        if self.bindings.swap_chain == Some(handle) {
            self.bindings.mark_render_target_dirty();
        }
        Ok(())
    }

    // ===== SHADER PARAMETERS =====

    /// Copy `bytes` into a vertex shader parameter
    pub fn set_vertex_shader_param(&mut self, shader: VertexShaderHandle, name: &str, bytes: &[u8]) -> Result<()> {
        self.registry.get_mut(shader)?.set_param(name, bytes)
    }

    /// Copy `bytes` into a pixel shader parameter
    pub fn set_shader_param(&mut self, shader: PixelShaderHandle, name: &str, bytes: &[u8]) -> Result<()> {
        self.registry.get_mut(shader)?.set_param(name, bytes)
    }

    /// Restore the declared default of a pixel shader parameter
    pub fn set_shader_param_default(&mut self, shader: PixelShaderHandle, name: &str) -> Result<()> {
        self.registry.get_mut(shader)?.set_param_default(name)
    }

    /// Restore the declared default of a vertex shader parameter
    pub fn set_vertex_shader_param_default(&mut self, shader: VertexShaderHandle, name: &str) -> Result<()> {
        self.registry.get_mut(shader)?.set_param_default(name)
    }

    /// Bind a texture to a pixel shader texture parameter
    ///
    /// The texture reaches its slot, together with the paired sampler, at the
    /// next draw.
    pub fn set_shader_texture(
        &mut self,
        shader: PixelShaderHandle,
        name: &str,
        texture: Option<TextureHandle>,
    ) -> Result<()> {
        if let Some(texture) = texture {
            self.registry.get(texture)?;
        }
        self.registry.get_mut(shader)?.set_texture(name, texture)
    }

    /// Bind a texture to a vertex shader texture parameter
    pub fn set_vertex_shader_texture(
        &mut self,
        shader: VertexShaderHandle,
        name: &str,
        texture: Option<TextureHandle>,
    ) -> Result<()> {
        if let Some(texture) = texture {
            self.registry.get(texture)?;
        }
        self.registry.get_mut(shader)?.set_texture(name, texture)
    }

    // ===== INTERNAL HELPERS =====

    /// Fail with `DeviceLost` unless the device is active
    pub(super) fn ensure_active(&self) -> Result<()> {
        if self.state != DeviceState::Active {
            crate::gfx_error!("prism::Device", "'{}' is {:?}, call rebuild() first", self.config.label, self.state);
            return Err(Error::DeviceLost);
        }
        Ok(())
    }

    /// Move to `Lost` when a backend call reports device loss
    pub(super) fn observe<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(Error::DeviceLost) = &result {
            if self.state == DeviceState::Active {
                crate::gfx_warn!("prism::Device", "'{}' lost its native device", self.config.label);
                self.state = DeviceState::Lost;
            }
        }
        result
    }

    fn link<H: ResourceHandle>(&mut self, result: Result<GraphicsResource>) -> Result<H> {
        let resource = self.observe(result)?;
        let handle = self.registry.insert::<H>(resource);
        crate::gfx_trace!("prism::Device", "created {} ({} live)", H::TYPE, self.registry.len());
        Ok(handle)
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        for key in self.registry.keys_in_creation_order() {
            if let Some(object) = self.registry.object_mut(key) {
                object.resource_mut().release(self.backend.as_mut());
            }
        }
        self.blend_cache.clear(self.backend.as_mut());
        self.raster_cache.clear(self.backend.as_mut());
        self.depth_stencil_cache.clear(self.backend.as_mut());
        self.backend.destroy_device();
        crate::gfx_info!("prism::Device", "'{}' destroyed", self.config.label);
    }
}
