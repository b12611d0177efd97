/// Vertex and pixel shaders
///
/// A shader owns its parameter list, the CPU image of its constant buffer
/// and the sampler states it declares. Parameter writes
/// only touch CPU memory; [`Shader::upload_params`] flushes every changed
/// parameter to the native constant buffer in a single transfer.

use glam::Mat4;

use crate::backend::{BufferKind, NativeBackend, NativeHandle, ShaderStage};
use crate::error::Result;
use crate::gfx_bail;
use crate::resource::{ResourceHandle, ResourceKey, SamplerInfo, TextureHandle};
use crate::shader::{layout_params, SamplerDecl, ShaderParam, ShaderParamDecl, ShaderParamType};

/// Texture slots available to one shader stage
pub const MAX_TEXTURES: usize = 8;

/// Name of the view-projection matrix parameter of vertex shaders
pub const VIEW_PROJ_PARAM: &str = "ViewProj";

/// Name of the world matrix parameter of vertex shaders
pub const WORLD_PARAM: &str = "World";

// ===== DESCRIPTORS =====

/// Vertex streams consumed by a vertex shader (positions are always consumed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexInputs {
    pub normals: bool,
    pub colors: bool,
    pub tangents: bool,
    /// Texture coordinate streams
    pub tex_units: u32,
}

impl VertexInputs {
    /// Number of vertex streams expected at draw time
    pub fn stream_count(&self) -> usize {
        1 + self.normals as usize + self.colors as usize + self.tangents as usize + self.tex_units as usize
    }
}

/// Shader creation parameters
///
/// `params`, `samplers` and `inputs` describe what the source exposes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderDesc {
    pub source: String,
    pub params: Vec<ShaderParamDecl>,
    pub samplers: Vec<SamplerDecl>,
    pub inputs: VertexInputs,
}

impl ShaderDesc {
    pub fn new(source: &str) -> Self {
        Self { source: source.to_string(), ..Default::default() }
    }

    pub fn with_param(mut self, param: ShaderParamDecl) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_sampler(mut self, sampler: SamplerDecl) -> Self {
        self.samplers.push(sampler);
        self
    }

    pub fn with_inputs(mut self, inputs: VertexInputs) -> Self {
        self.inputs = inputs;
        self
    }
}

/// Sampler state owned by a shader
#[derive(Debug)]
struct ShaderSampler {
    name: String,
    info: SamplerInfo,
    handle: Option<NativeHandle>,
}

/// Result of [`Shader::upload_params`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamUpload {
    /// True if the constant buffer was sent to the backend
    pub uploaded: bool,
}

// ===== SHADER =====

/// Compiled shader with its parameters
#[derive(Debug)]
pub struct Shader {
    stage: ShaderStage,
    source: String,
    params: Vec<ShaderParam>,
    samplers: Vec<ShaderSampler>,
    inputs: VertexInputs,
    constant_data: Vec<u8>,
    /// `constant_data` differs from the native buffer
    pending_upload: bool,
    handle: Option<NativeHandle>,
    constants: Option<NativeHandle>,
    view_proj: Option<usize>,
    world: Option<usize>,
}

impl Shader {
    /// Lay out the parameters, then compile and create the native objects
    pub fn new(backend: &mut dyn NativeBackend, stage: ShaderStage, desc: ShaderDesc) -> Result<Self> {
        let (params, constant_size) = layout_params(&desc.params)?;

        let texture_count = params.iter().filter(|p| p.param_type().is_texture()).count();
        if texture_count > MAX_TEXTURES {
            gfx_bail!("prism::Shader", Configuration,
                "{} texture parameters declared, at most {} are supported", texture_count, MAX_TEXTURES);
        }
        match stage {
            ShaderStage::Pixel => {
                if desc.samplers.len() != texture_count {
                    gfx_bail!("prism::Shader", Configuration,
                        "pixel shader declares {} texture parameters but {} samplers",
                        texture_count, desc.samplers.len());
                }
                if desc.inputs != VertexInputs::default() {
                    gfx_bail!("prism::Shader", Configuration, "pixel shaders do not consume vertex streams");
                }
            }
            ShaderStage::Vertex => {
                if !desc.samplers.is_empty() && desc.samplers.len() != texture_count {
                    gfx_bail!("prism::Shader", Configuration,
                        "vertex shader declares {} texture parameters but {} samplers",
                        texture_count, desc.samplers.len());
                }
            }
        }
        for sampler in &desc.samplers {
            sampler.info.validate()?;
        }

        let mut view_proj = None;
        let mut world = None;
        if stage == ShaderStage::Vertex {
            for (index, param) in params.iter().enumerate() {
                let slot = match param.name() {
                    VIEW_PROJ_PARAM => &mut view_proj,
                    WORLD_PARAM => &mut world,
                    _ => continue,
                };
                if param.param_type() != ShaderParamType::Mat4 || param.array_count() > 1 {
                    gfx_bail!("prism::Shader", Configuration, "'{}' must be a float4x4", param.name());
                }
                *slot = Some(index);
            }
        }

        let mut shader = Self {
            stage,
            source: desc.source,
            params,
            samplers: desc
                .samplers
                .into_iter()
                .map(|decl| ShaderSampler { name: decl.name, info: decl.info, handle: None })
                .collect(),
            inputs: desc.inputs,
            constant_data: vec![0; constant_size],
            pending_upload: false,
            handle: None,
            constants: None,
            view_proj,
            world,
        };
        shader.rebuild(backend)?;
        crate::gfx_trace!("prism::Shader", "compiled {:?} shader ({} params, {} constant bytes)",
            stage, shader.params.len(), constant_size);
        Ok(shader)
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn params(&self) -> &[ShaderParam] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ShaderParam> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn inputs(&self) -> &VertexInputs {
        &self.inputs
    }

    /// CPU image of the constant buffer
    ///
    /// Matches the native buffer unless [`needs_upload`](Self::needs_upload).
    pub fn constant_data(&self) -> &[u8] {
        &self.constant_data
    }

    /// True when written constants have not reached the native buffer yet
    pub fn needs_upload(&self) -> bool {
        self.pending_upload || self.params.iter().any(|p| p.changed && p.texture_slot().is_none())
    }

    pub fn constant_size(&self) -> usize {
        self.constant_data.len()
    }

    pub fn handle(&self) -> Option<NativeHandle> {
        self.handle
    }

    pub fn constant_buffer(&self) -> Option<NativeHandle> {
        self.constants
    }

    pub fn sampler_count(&self) -> usize {
        self.samplers.len()
    }

    /// Native sampler paired with texture slot `index`
    pub fn sampler_handle(&self, index: usize) -> Option<NativeHandle> {
        self.samplers.get(index).and_then(|s| s.handle)
    }

    pub fn sampler_name(&self, index: usize) -> Option<&str> {
        self.samplers.get(index).map(|s| s.name.as_str())
    }

    /// Copy `bytes` into parameter `name` and mark it changed
    pub fn set_param(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.param_mut(name)?.set_value(bytes)
    }

    /// Restore the declared default of parameter `name`
    pub fn set_param_default(&mut self, name: &str) -> Result<()> {
        self.param_mut(name)?.reset_to_default();
        Ok(())
    }

    /// Bind `texture` to texture parameter `name`
    pub fn set_texture(&mut self, name: &str, texture: Option<TextureHandle>) -> Result<()> {
        self.param_mut(name)?.set_texture(texture)
    }

    /// Every texture parameter as (slot, texture), in declaration order
    pub fn texture_bindings(&self) -> Vec<(usize, Option<TextureHandle>)> {
        self.params
            .iter()
            .filter_map(|p| p.texture_slot().map(|slot| (slot, p.texture())))
            .collect()
    }

    /// Unbind every texture parameter pointing at a destroyed texture
    pub(crate) fn forget_texture(&mut self, key: ResourceKey) {
        for param in &mut self.params {
            if param.texture().is_some_and(|t| t.key() == key) {
                param.texture = None;
            }
        }
    }

    /// Write the view-projection matrix if the shader declares one
    pub fn set_view_proj(&mut self, matrix: &Mat4) -> Result<()> {
        if let Some(index) = self.view_proj {
            self.params[index].set_value(bytemuck::bytes_of(matrix))?;
        }
        Ok(())
    }

    /// Write the world matrix if the shader declares one
    pub fn set_world(&mut self, matrix: &Mat4) -> Result<()> {
        if let Some(index) = self.world {
            self.params[index].set_value(bytemuck::bytes_of(matrix))?;
        }
        Ok(())
    }

    /// Copy changed parameters into the constant image and upload it once
    ///
    /// Nothing is sent to the backend when no constant changed. A failed
    /// transfer stays pending and is retried by the next call.
    pub fn upload_params(&mut self, backend: &mut dyn NativeBackend) -> Result<ParamUpload> {
        let mut upload = ParamUpload::default();

        for param in self.params.iter_mut().filter(|p| p.changed) {
            param.changed = false;
            if param.texture_slot().is_some() {
                continue;
            }
            let offset = param.offset();
            self.constant_data[offset..offset + param.size()].copy_from_slice(param.value());
            self.pending_upload = true;
        }

        if self.pending_upload {
            if let Some(constants) = self.constants {
                backend.update_buffer(constants, &self.constant_data)?;
                upload.uploaded = true;
            }
            self.pending_upload = false;
        }
        Ok(upload)
    }

    pub fn release(&mut self, backend: &mut dyn NativeBackend) {
        for sampler in &mut self.samplers {
            if let Some(handle) = sampler.handle.take() {
                backend.release(handle);
            }
        }
        if let Some(handle) = self.constants.take() {
            backend.release(handle);
        }
        if let Some(handle) = self.handle.take() {
            backend.release(handle);
        }
    }

    /// Recompile the source and recreate the constant buffer and samplers
    pub fn rebuild(&mut self, backend: &mut dyn NativeBackend) -> Result<()> {
        if let Err(err) = self.build(backend) {
            self.release(backend);
            return Err(err);
        }
        Ok(())
    }

    fn build(&mut self, backend: &mut dyn NativeBackend) -> Result<()> {
        self.handle = Some(backend.compile_shader(self.stage, &self.source)?);
        if !self.constant_data.is_empty() {
            self.constants = Some(backend.create_buffer(BufferKind::Constant, &self.constant_data, true)?);
        }
        self.pending_upload = false;
        for sampler in &mut self.samplers {
            sampler.handle = Some(backend.create_sampler(&sampler.info)?);
        }
        Ok(())
    }

    fn param_mut(&mut self, name: &str) -> Result<&mut ShaderParam> {
        match self.params.iter_mut().find(|p| p.name() == name) {
            Some(param) => Ok(param),
            None => Err(crate::gfx_err!("prism::Shader", NotFound, "shader parameter '{}'", name)),
        }
    }
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
