/// Mock native backend (no GPU required)
///
/// Hands out opaque handles, keeps what every upload wrote, and records each
/// call as a [`MockCall`]. The [`MockRecorder`] is shared with the backend so
/// tests can inspect it after the backend has been moved into a device.

use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::backend::{
    NativeBackend, NativeHandle, NativeTextureDesc,
    BufferKind, ShaderStage, PrimitiveTopology, Rect, ClearFlags,
};
use crate::error::{Error, Result};
use crate::resource::{ColorFormat, ZStencilFormat, IndexType, SamplerInfo, SwapChainDesc};
use crate::state::{BlendState, RasterState, DepthStencilState};

// ============================================================================
// Recorded calls
// ============================================================================

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    CreateDevice { adapter: u32, generation: u64 },
    DestroyDevice,
    CreateBuffer { handle: NativeHandle, kind: BufferKind, size: usize, dynamic: bool },
    UpdateBuffer { handle: NativeHandle, size: usize },
    CreateTexture { handle: NativeHandle, desc: NativeTextureDesc },
    UpdateTexture { handle: NativeHandle, level: u32, size: usize },
    CreateZStencil { handle: NativeHandle, width: u32, height: u32, format: ZStencilFormat },
    CreateStagingSurface { handle: NativeHandle, width: u32, height: u32, format: ColorFormat },
    CopyTextureToStaging { texture: NativeHandle, staging: NativeHandle },
    MapStagingSurface { handle: NativeHandle },
    CreateSampler { handle: NativeHandle, info: SamplerInfo },
    CompileShader { handle: NativeHandle, stage: ShaderStage },
    CreateSwapChain { handle: NativeHandle, width: u32, height: u32 },
    CompileBlendState { handle: NativeHandle, state: BlendState },
    CompileRasterState { handle: NativeHandle, state: RasterState },
    CompileDepthStencilState { handle: NativeHandle, state: DepthStencilState },
    Release { handle: NativeHandle },
    BindRenderTarget { color: Option<NativeHandle>, zstencil: Option<NativeHandle> },
    BindTexture { slot: usize, texture: Option<NativeHandle> },
    BindSampler { slot: usize, sampler: Option<NativeHandle> },
    BindVertexBuffers { buffers: Vec<NativeHandle> },
    BindIndexBuffer { buffer: Option<(NativeHandle, IndexType)> },
    BindShader { stage: ShaderStage, shader: Option<NativeHandle> },
    BindConstantBuffer { stage: ShaderStage, buffer: Option<NativeHandle> },
    BindBlendState { handle: NativeHandle },
    BindRasterState { handle: NativeHandle },
    BindDepthStencilState { handle: NativeHandle },
    SetViewport { viewport: Rect },
    Clear { flags: ClearFlags, color: [f32; 4], depth: f32, stencil: u8 },
    Draw { topology: PrimitiveTopology, start: u32, count: u32 },
    DrawIndexed { topology: PrimitiveTopology, start: u32, count: u32 },
    Present { swap_chain: NativeHandle },
}

impl MockCall {
    /// True for calls that create or compile a native object
    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            MockCall::CreateBuffer { .. }
                | MockCall::CreateTexture { .. }
                | MockCall::CreateZStencil { .. }
                | MockCall::CreateStagingSurface { .. }
                | MockCall::CreateSampler { .. }
                | MockCall::CompileShader { .. }
                | MockCall::CreateSwapChain { .. }
                | MockCall::CompileBlendState { .. }
                | MockCall::CompileRasterState { .. }
                | MockCall::CompileDepthStencilState { .. }
        )
    }

    /// True for fixed-function state compilations
    pub fn is_state_compilation(&self) -> bool {
        matches!(
            self,
            MockCall::CompileBlendState { .. }
                | MockCall::CompileRasterState { .. }
                | MockCall::CompileDepthStencilState { .. }
        )
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Mock backend configuration
#[derive(Debug, Clone, Default)]
pub struct MockBackendConfig {
    /// Colour formats reported as unsupported
    pub unsupported_color_formats: Vec<ColorFormat>,
    /// Depth-stencil formats reported as unsupported
    pub unsupported_zstencil_formats: Vec<ZStencilFormat>,
    /// Fail the Nth native creation (1-based, counted over the backend's lifetime)
    pub fail_creation_at: Option<usize>,
}

// ============================================================================
// Shared recorder
// ============================================================================

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<MockCall>,
    contents: FxHashMap<NativeHandle, Vec<u8>>,
    live: FxHashSet<NativeHandle>,
    next_handle: u64,
    creations: usize,
    fail_creation_at: Option<usize>,
    fail_next_update: bool,
    generation: u64,
    device_alive: bool,
    device_lost: bool,
}

/// Shared view of everything a [`MockBackend`] did
#[derive(Debug, Clone, Default)]
pub struct MockRecorder {
    state: Arc<Mutex<MockState>>,
}

impl MockRecorder {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every call recorded so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls matching `predicate`
    pub fn count<F: Fn(&MockCall) -> bool>(&self, predicate: F) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Last bytes written to a buffer, texture (level 0) or staging surface
    pub fn contents(&self, handle: NativeHandle) -> Option<Vec<u8>> {
        self.lock().contents.get(&handle).cloned()
    }

    pub fn is_live(&self, handle: NativeHandle) -> bool {
        self.lock().live.contains(&handle)
    }

    /// Number of live native objects on the current device
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    /// Native creations performed so far (successful or injected failures)
    pub fn creation_count(&self) -> usize {
        self.lock().creations
    }

    /// Fail the Nth native creation (1-based, same count as [`creation_count`](Self::creation_count))
    pub fn set_fail_creation_at(&self, nth: Option<usize>) {
        self.lock().fail_creation_at = nth;
    }

    /// Make the next `update_buffer` call fail with `NativeBackend`
    pub fn fail_next_buffer_update(&self) {
        self.lock().fail_next_update = true;
    }

    /// Simulate an adapter removal: every later call fails with `DeviceLost`
    /// until the next `create_device`
    pub fn lose_device(&self) {
        self.lock().device_lost = true;
    }

    /// Number of native devices created so far
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }
}

// ============================================================================
// Mock backend
// ============================================================================

/// Native backend that records instead of rendering
pub struct MockBackend {
    config: MockBackendConfig,
    recorder: MockRecorder,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_config(MockBackendConfig::default())
    }

    pub fn with_config(config: MockBackendConfig) -> Self {
        let recorder = MockRecorder::default();
        recorder.set_fail_creation_at(config.fail_creation_at);
        Self { config, recorder }
    }

    /// Recorder shared with this backend
    pub fn recorder(&self) -> MockRecorder {
        self.recorder.clone()
    }

    fn check_device(state: &MockState) -> Result<()> {
        if state.device_lost {
            return Err(Error::DeviceLost);
        }
        if !state.device_alive {
            return Err(Error::NativeBackend("no native device".to_string()));
        }
        Ok(())
    }

    fn check_live(state: &MockState, handle: NativeHandle) -> Result<()> {
        if !state.live.contains(&handle) {
            return Err(Error::NativeBackend(format!("stale handle {}", handle)));
        }
        Ok(())
    }

    /// Allocate a handle, honouring injected failures
    fn allocate(state: &mut MockState, what: &str) -> Result<NativeHandle> {
        Self::check_device(state)?;
        state.creations += 1;
        if state.fail_creation_at == Some(state.creations) {
            return Err(Error::NativeBackend(format!(
                "injected failure creating {} (creation #{})",
                what, state.creations
            )));
        }
        state.next_handle += 1;
        let handle = NativeHandle(state.next_handle);
        state.live.insert(handle);
        Ok(handle)
    }

    /// Validate, then record a binding or command call
    fn command(&self, handles: &[NativeHandle], call: MockCall) -> Result<()> {
        let mut state = self.recorder.lock();
        Self::check_device(&state)?;
        for handle in handles {
            Self::check_live(&state, *handle)?;
        }
        state.calls.push(call);
        Ok(())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn create_device(&mut self, adapter_index: u32) -> Result<()> {
        let mut state = self.recorder.lock();
        state.generation += 1;
        state.device_alive = true;
        state.device_lost = false;
        state.live.clear();
        let generation = state.generation;
        state.calls.push(MockCall::CreateDevice { adapter: adapter_index, generation });
        Ok(())
    }

    fn destroy_device(&mut self) {
        let mut state = self.recorder.lock();
        state.device_alive = false;
        state.live.clear();
        state.calls.push(MockCall::DestroyDevice);
    }

    fn supports_color_format(&self, format: ColorFormat) -> bool {
        !self.config.unsupported_color_formats.contains(&format)
    }

    fn supports_zstencil_format(&self, format: ZStencilFormat) -> bool {
        !self.config.unsupported_zstencil_formats.contains(&format)
    }

    fn create_buffer(&mut self, kind: BufferKind, data: &[u8], dynamic: bool) -> Result<NativeHandle> {
        let mut state = self.recorder.lock();
        let handle = Self::allocate(&mut state, "buffer")?;
        state.contents.insert(handle, data.to_vec());
        state.calls.push(MockCall::CreateBuffer { handle, kind, size: data.len(), dynamic });
        Ok(handle)
    }

    fn create_texture(&mut self, desc: &NativeTextureDesc, levels: &[Vec<u8>]) -> Result<NativeHandle> {
        let mut state = self.recorder.lock();
        let handle = Self::allocate(&mut state, "texture")?;
        let level0 = match levels.first() {
            Some(data) => data.clone(),
            None => vec![0; desc.format.level_size(desc.width, desc.height)],
        };
        state.contents.insert(handle, level0);
        state.calls.push(MockCall::CreateTexture { handle, desc: *desc });
        Ok(handle)
    }

    fn create_zstencil(&mut self, width: u32, height: u32, format: ZStencilFormat) -> Result<NativeHandle> {
        let mut state = self.recorder.lock();
        let handle = Self::allocate(&mut state, "zstencil")?;
        state.calls.push(MockCall::CreateZStencil { handle, width, height, format });
        Ok(handle)
    }

    fn create_staging_surface(&mut self, width: u32, height: u32, format: ColorFormat) -> Result<NativeHandle> {
        let mut state = self.recorder.lock();
        let handle = Self::allocate(&mut state, "staging surface")?;
        state.contents.insert(handle, vec![0; format.level_size(width, height)]);
        state.calls.push(MockCall::CreateStagingSurface { handle, width, height, format });
        Ok(handle)
    }

    fn create_sampler(&mut self, info: &SamplerInfo) -> Result<NativeHandle> {
        let mut state = self.recorder.lock();
        let handle = Self::allocate(&mut state, "sampler")?;
        state.calls.push(MockCall::CreateSampler { handle, info: *info });
        Ok(handle)
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<NativeHandle> {
        let mut state = self.recorder.lock();
        if source.trim().is_empty() {
            Self::check_device(&state)?;
            return Err(Error::NativeBackend("empty shader source".to_string()));
        }
        let handle = Self::allocate(&mut state, "shader")?;
        state.calls.push(MockCall::CompileShader { handle, stage });
        Ok(handle)
    }

    fn create_swap_chain(&mut self, desc: &SwapChainDesc) -> Result<NativeHandle> {
        let mut state = self.recorder.lock();
        let handle = Self::allocate(&mut state, "swap chain")?;
        state.calls.push(MockCall::CreateSwapChain { handle, width: desc.width, height: desc.height });
        Ok(handle)
    }

    fn compile_blend_state(&mut self, blend: &BlendState) -> Result<NativeHandle> {
        let mut state = self.recorder.lock();
        let handle = Self::allocate(&mut state, "blend state")?;
        state.calls.push(MockCall::CompileBlendState { handle, state: *blend });
        Ok(handle)
    }

    fn compile_raster_state(&mut self, raster: &RasterState) -> Result<NativeHandle> {
        let mut state = self.recorder.lock();
        let handle = Self::allocate(&mut state, "raster state")?;
        state.calls.push(MockCall::CompileRasterState { handle, state: *raster });
        Ok(handle)
    }

    fn compile_depth_stencil_state(&mut self, depth_stencil: &DepthStencilState) -> Result<NativeHandle> {
        let mut state = self.recorder.lock();
        let handle = Self::allocate(&mut state, "depth-stencil state")?;
        state.calls.push(MockCall::CompileDepthStencilState { handle, state: *depth_stencil });
        Ok(handle)
    }

    fn release(&mut self, handle: NativeHandle) {
        let mut state = self.recorder.lock();
        state.live.remove(&handle);
        state.contents.remove(&handle);
        state.calls.push(MockCall::Release { handle });
    }

    fn update_buffer(&mut self, buffer: NativeHandle, data: &[u8]) -> Result<()> {
        let mut state = self.recorder.lock();
        Self::check_device(&state)?;
        Self::check_live(&state, buffer)?;
        if std::mem::take(&mut state.fail_next_update) {
            return Err(Error::NativeBackend(format!("injected failure updating buffer {}", buffer)));
        }
        state.contents.insert(buffer, data.to_vec());
        state.calls.push(MockCall::UpdateBuffer { handle: buffer, size: data.len() });
        Ok(())
    }

    fn update_texture(&mut self, texture: NativeHandle, level: u32, data: &[u8]) -> Result<()> {
        let mut state = self.recorder.lock();
        Self::check_device(&state)?;
        Self::check_live(&state, texture)?;
        if level == 0 {
            state.contents.insert(texture, data.to_vec());
        }
        state.calls.push(MockCall::UpdateTexture { handle: texture, level, size: data.len() });
        Ok(())
    }

    fn copy_texture_to_staging(&mut self, texture: NativeHandle, staging: NativeHandle) -> Result<()> {
        let mut state = self.recorder.lock();
        Self::check_device(&state)?;
        Self::check_live(&state, texture)?;
        Self::check_live(&state, staging)?;
        let bytes = state.contents.get(&texture).cloned().unwrap_or_default();
        state.contents.insert(staging, bytes);
        state.calls.push(MockCall::CopyTextureToStaging { texture, staging });
        Ok(())
    }

    fn map_staging_surface(&mut self, staging: NativeHandle) -> Result<Vec<u8>> {
        let mut state = self.recorder.lock();
        Self::check_device(&state)?;
        Self::check_live(&state, staging)?;
        state.calls.push(MockCall::MapStagingSurface { handle: staging });
        Ok(state.contents.get(&staging).cloned().unwrap_or_default())
    }

    fn bind_render_target(&mut self, color: Option<NativeHandle>, zstencil: Option<NativeHandle>) -> Result<()> {
        let handles: Vec<NativeHandle> = color.into_iter().chain(zstencil).collect();
        self.command(&handles, MockCall::BindRenderTarget { color, zstencil })
    }

    fn bind_texture(&mut self, slot: usize, texture: Option<NativeHandle>) -> Result<()> {
        let handles: Vec<NativeHandle> = texture.into_iter().collect();
        self.command(&handles, MockCall::BindTexture { slot, texture })
    }

    fn bind_sampler(&mut self, slot: usize, sampler: Option<NativeHandle>) -> Result<()> {
        let handles: Vec<NativeHandle> = sampler.into_iter().collect();
        self.command(&handles, MockCall::BindSampler { slot, sampler })
    }

    fn bind_vertex_buffers(&mut self, buffers: &[NativeHandle]) -> Result<()> {
        self.command(buffers, MockCall::BindVertexBuffers { buffers: buffers.to_vec() })
    }

    fn bind_index_buffer(&mut self, buffer: Option<(NativeHandle, IndexType)>) -> Result<()> {
        let handles: Vec<NativeHandle> = buffer.map(|(handle, _)| handle).into_iter().collect();
        self.command(&handles, MockCall::BindIndexBuffer { buffer })
    }

    fn bind_shader(&mut self, stage: ShaderStage, shader: Option<NativeHandle>) -> Result<()> {
        let handles: Vec<NativeHandle> = shader.into_iter().collect();
        self.command(&handles, MockCall::BindShader { stage, shader })
    }

    fn bind_constant_buffer(&mut self, stage: ShaderStage, buffer: Option<NativeHandle>) -> Result<()> {
        let handles: Vec<NativeHandle> = buffer.into_iter().collect();
        self.command(&handles, MockCall::BindConstantBuffer { stage, buffer })
    }

    fn bind_blend_state(&mut self, handle: NativeHandle) -> Result<()> {
        self.command(&[handle], MockCall::BindBlendState { handle })
    }

    fn bind_raster_state(&mut self, handle: NativeHandle) -> Result<()> {
        self.command(&[handle], MockCall::BindRasterState { handle })
    }

    fn bind_depth_stencil_state(&mut self, handle: NativeHandle) -> Result<()> {
        self.command(&[handle], MockCall::BindDepthStencilState { handle })
    }

    fn set_viewport(&mut self, viewport: Rect) -> Result<()> {
        self.command(&[], MockCall::SetViewport { viewport })
    }

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4], depth: f32, stencil: u8) -> Result<()> {
        self.command(&[], MockCall::Clear { flags, color, depth, stencil })
    }

    fn draw(&mut self, topology: PrimitiveTopology, start_vertex: u32, vertex_count: u32) -> Result<()> {
        self.command(&[], MockCall::Draw { topology, start: start_vertex, count: vertex_count })
    }

    fn draw_indexed(&mut self, topology: PrimitiveTopology, start_index: u32, index_count: u32) -> Result<()> {
        self.command(&[], MockCall::DrawIndexed { topology, start: start_index, count: index_count })
    }

    fn present(&mut self, swap_chain: NativeHandle) -> Result<()> {
        self.command(&[swap_chain], MockCall::Present { swap_chain })
    }
}

#[cfg(test)]
#[path = "mock_backend_tests.rs"]
mod tests;
