/// Shader parameters and constant-buffer layout
///
/// Parameters are packed into the constant buffer in declaration order
/// using 16-byte registers:
/// - a parameter never straddles a register boundary
/// - parameters of 16 bytes or more, and arrays, start on a register
/// - the total size is rounded up to a whole register
///
/// Texture parameters take no constant space.

use crate::error::{Error, Result};
use crate::gfx_bail;
use crate::resource::{SamplerInfo, TextureHandle};

/// Size of one constant register in bytes
pub const REGISTER_SIZE: usize = 16;

// ===== PARAMETER TYPE =====

/// Semantic type of a shader parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderParamType {
    Bool,
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Int2,
    Int3,
    Int4,
    Mat4,
    Texture,
}

impl ShaderParamType {
    /// Size of one element in bytes
    pub fn size_bytes(&self) -> usize {
        match self {
            ShaderParamType::Bool | ShaderParamType::Float | ShaderParamType::Int => 4,
            ShaderParamType::Vec2 | ShaderParamType::Int2 => 8,
            ShaderParamType::Vec3 | ShaderParamType::Int3 => 12,
            ShaderParamType::Vec4 | ShaderParamType::Int4 => 16,
            ShaderParamType::Mat4 => 64,
            ShaderParamType::Texture => 0,
        }
    }

    pub fn is_texture(&self) -> bool {
        matches!(self, ShaderParamType::Texture)
    }
}

// ===== DECLARATIONS =====

/// Parameter declared by a shader source
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderParamDecl {
    pub name: String,
    pub param_type: ShaderParamType,
    /// Array length, 0 or 1 for a scalar
    pub array_count: u32,
    /// Default value; zeroes when absent
    pub default: Option<Vec<u8>>,
}

impl ShaderParamDecl {
    pub fn new(name: &str, param_type: ShaderParamType) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            array_count: 0,
            default: None,
        }
    }

    pub fn with_array(mut self, count: u32) -> Self {
        self.array_count = count;
        self
    }

    pub fn with_default(mut self, bytes: Vec<u8>) -> Self {
        self.default = Some(bytes);
        self
    }

    /// Byte size of the whole parameter
    pub fn size_bytes(&self) -> usize {
        self.param_type.size_bytes() * self.array_count.max(1) as usize
    }
}

/// Sampler declared by a pixel shader
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDecl {
    pub name: String,
    pub info: SamplerInfo,
}

impl SamplerDecl {
    pub fn new(name: &str, info: SamplerInfo) -> Self {
        Self { name: name.to_string(), info }
    }
}

// ===== PARAMETER =====

/// One shader-visible variable
#[derive(Debug, Clone)]
pub struct ShaderParam {
    name: String,
    param_type: ShaderParamType,
    array_count: u32,
    offset: usize,
    size: usize,
    value: Vec<u8>,
    default: Vec<u8>,
    pub(crate) changed: bool,
    /// Texture slot (texture parameters only)
    texture_slot: Option<usize>,
    pub(crate) texture: Option<TextureHandle>,
}

impl ShaderParam {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> ShaderParamType {
        self.param_type
    }

    pub fn array_count(&self) -> u32 {
        self.array_count
    }

    /// Byte offset into the constant buffer
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Current value bytes
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn default_value(&self) -> &[u8] {
        &self.default
    }

    /// Set since the last upload
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Slot the bound texture goes to (texture parameters only)
    pub fn texture_slot(&self) -> Option<usize> {
        self.texture_slot
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub(crate) fn set_value(&mut self, bytes: &[u8]) -> Result<()> {
        if self.param_type.is_texture() {
            gfx_bail!("prism::Shader", Configuration,
                "'{}' is a texture parameter, bind it with set_shader_texture", self.name);
        }
        if bytes.len() != self.size {
            crate::gfx_error!("prism::Shader",
                "size mismatch for '{}': expected {} bytes, got {}", self.name, self.size, bytes.len());
            return Err(Error::SizeMismatch {
                name: self.name.clone(),
                expected: self.size,
                actual: bytes.len(),
            });
        }
        self.value.copy_from_slice(bytes);
        self.changed = true;
        Ok(())
    }

    pub(crate) fn reset_to_default(&mut self) {
        if self.param_type.is_texture() {
            self.texture = None;
        } else {
            self.value.copy_from_slice(&self.default);
        }
        self.changed = true;
    }

    pub(crate) fn set_texture(&mut self, texture: Option<TextureHandle>) -> Result<()> {
        if !self.param_type.is_texture() {
            gfx_bail!("prism::Shader", Configuration, "'{}' is not a texture parameter", self.name);
        }
        self.texture = texture;
        self.changed = true;
        Ok(())
    }
}

// ===== LAYOUT =====

fn align_to_register(offset: usize) -> usize {
    offset.div_ceil(REGISTER_SIZE) * REGISTER_SIZE
}

/// Build the parameter list and constant-buffer size for `decls`
pub fn layout_params(decls: &[ShaderParamDecl]) -> Result<(Vec<ShaderParam>, usize)> {
    let mut params: Vec<ShaderParam> = Vec::with_capacity(decls.len());
    let mut offset = 0;
    let mut texture_count = 0;

    for decl in decls {
        if decl.name.is_empty() {
            gfx_bail!("prism::Shader", Configuration, "shader parameter without a name");
        }
        if params.iter().any(|p| p.name == decl.name) {
            gfx_bail!("prism::Shader", Configuration, "duplicate shader parameter '{}'", decl.name);
        }

        if decl.param_type.is_texture() {
            if decl.array_count > 1 {
                gfx_bail!("prism::Shader", Configuration, "texture parameter '{}' cannot be an array", decl.name);
            }
            params.push(ShaderParam {
                name: decl.name.clone(),
                param_type: decl.param_type,
                array_count: 0,
                offset: 0,
                size: 0,
                value: Vec::new(),
                default: Vec::new(),
                changed: false,
                texture_slot: Some(texture_count),
                texture: None,
            });
            texture_count += 1;
            continue;
        }

        let size = decl.size_bytes();
        let default = match &decl.default {
            Some(bytes) if bytes.len() != size => {
                crate::gfx_error!("prism::Shader",
                    "default of '{}' has {} bytes, expected {}", decl.name, bytes.len(), size);
                return Err(Error::SizeMismatch {
                    name: decl.name.clone(),
                    expected: size,
                    actual: bytes.len(),
                });
            }
            Some(bytes) => bytes.clone(),
            None => vec![0; size],
        };

        let crosses_register = (offset % REGISTER_SIZE) + size > REGISTER_SIZE;
        if decl.array_count > 1 || size >= REGISTER_SIZE || crosses_register {
            offset = align_to_register(offset);
        }

        params.push(ShaderParam {
            name: decl.name.clone(),
            param_type: decl.param_type,
            array_count: decl.array_count,
            offset,
            size,
            value: default.clone(),
            default,
            // Defaults reach the constant buffer on the first upload
            changed: true,
            texture_slot: None,
            texture: None,
        });
        offset += size;
    }

    Ok((params, align_to_register(offset)))
}
