//! Shader module - shader objects and dirty-tracked parameter binding

mod shader_param;
mod shader;

pub use shader_param::{
    REGISTER_SIZE, ShaderParamType, ShaderParamDecl, SamplerDecl, ShaderParam, layout_params,
};
pub use shader::{
    MAX_TEXTURES, VIEW_PROJ_PARAM, WORLD_PARAM,
    VertexInputs, ShaderDesc, ParamUpload, Shader,
};
