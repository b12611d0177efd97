#![allow(dead_code)]
//! Mock test utilities - devices backed by the recording mock backend
//!
//! Every helper returns the device together with the backend's recorder so a
//! test can inspect native calls after the backend has moved into the device.

use prism_graphics::glam::Vec3;
use prism_graphics::prism::backend::{MockBackend, MockBackendConfig, MockCall, MockRecorder};
use prism_graphics::prism::resource::{
    BufferFlags, PixelShaderHandle, SamplerInfo, VertexBufferHandle, VertexData, VertexShaderHandle,
};
use prism_graphics::prism::shader::{
    SamplerDecl, ShaderDesc, ShaderParamDecl, ShaderParamType, VIEW_PROJ_PARAM,
};
use prism_graphics::prism::{Device, DeviceConfig};

/// Device on a default mock backend
pub fn mock_device() -> (Device, MockRecorder) {
    mock_device_with(MockBackendConfig::default())
}

/// Device on a configured mock backend
pub fn mock_device_with(config: MockBackendConfig) -> (Device, MockRecorder) {
    let backend = MockBackend::with_config(config);
    let recorder = backend.recorder();
    let device = Device::new(Box::new(backend), DeviceConfig::default()).expect("mock device");
    (device, recorder)
}

/// Position-only triangle
pub fn triangle(device: &mut Device, flags: BufferFlags) -> VertexBufferHandle {
    let data = VertexData::from_points(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
    device.create_vertex_buffer(data, flags).expect("vertex buffer")
}

/// Vertex shader with a `ViewProj` matrix
pub fn basic_vertex_shader(device: &mut Device) -> VertexShaderHandle {
    let desc = ShaderDesc::new("float4 main(float3 pos : POSITION) : SV_POSITION")
        .with_param(ShaderParamDecl::new(VIEW_PROJ_PARAM, ShaderParamType::Mat4));
    device.create_vertex_shader(desc).expect("vertex shader")
}

/// Pixel shader sampling one texture parameter named `tex`
pub fn textured_pixel_shader(device: &mut Device) -> PixelShaderHandle {
    let desc = ShaderDesc::new("float4 main(float2 uv : TEXCOORD0) : SV_TARGET")
        .with_param(ShaderParamDecl::new("tex", ShaderParamType::Texture))
        .with_sampler(SamplerDecl::new("texSampler", SamplerInfo::default()));
    device.create_pixel_shader(desc).expect("pixel shader")
}

/// Number of recorded calls matching `predicate`
pub fn count_calls(recorder: &MockRecorder, predicate: impl Fn(&MockCall) -> bool) -> usize {
    recorder.calls().iter().filter(|call| predicate(call)).count()
}
