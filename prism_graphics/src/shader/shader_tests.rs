/// Unit tests for Shader and constant-buffer layout

use glam::Mat4;

use crate::backend::{MockBackend, MockCall, MockRecorder, NativeBackend, ShaderStage};
use crate::error::Error;
use crate::resource::{ResourceHandle, ResourceKey, SamplerInfo, TextureHandle};
use crate::shader::*;

fn setup() -> (MockBackend, MockRecorder) {
    let mut backend = MockBackend::new();
    let recorder = backend.recorder();
    backend.create_device(0).unwrap();
    (backend, recorder)
}

fn float_bytes(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

fn upload_count(recorder: &MockRecorder) -> usize {
    recorder.count(|call| matches!(call, MockCall::UpdateBuffer { .. }))
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_layout_packs_small_params_into_one_register() {
    let decls = vec![
        ShaderParamDecl::new("a", ShaderParamType::Float),
        ShaderParamDecl::new("b", ShaderParamType::Vec2),
        ShaderParamDecl::new("c", ShaderParamType::Float),
    ];
    let (params, size) = layout_params(&decls).unwrap();
    let offsets: Vec<usize> = params.iter().map(|p| p.offset()).collect();
    assert_eq!(offsets, vec![0, 4, 12]);
    assert_eq!(size, 16);
}

#[test]
fn test_layout_never_straddles_a_register() {
    let decls = vec![
        ShaderParamDecl::new("a", ShaderParamType::Vec2),
        ShaderParamDecl::new("b", ShaderParamType::Vec3),
        ShaderParamDecl::new("c", ShaderParamType::Float),
    ];
    let (params, size) = layout_params(&decls).unwrap();
    let offsets: Vec<usize> = params.iter().map(|p| p.offset()).collect();
    // vec3 at 8 would end at 20, so it moves to 16; the float fits behind it
    assert_eq!(offsets, vec![0, 16, 28]);
    assert_eq!(size, 32);
}

#[test]
fn test_layout_aligns_matrices_and_arrays() {
    let decls = vec![
        ShaderParamDecl::new("f", ShaderParamType::Float),
        ShaderParamDecl::new("m", ShaderParamType::Mat4),
        ShaderParamDecl::new("g", ShaderParamType::Float),
        ShaderParamDecl::new("arr", ShaderParamType::Float).with_array(3),
    ];
    let (params, size) = layout_params(&decls).unwrap();
    assert_eq!(params[1].offset(), 16);
    assert_eq!(params[2].offset(), 80);
    assert_eq!(params[3].offset(), 96);
    assert_eq!(params[3].size(), 12);
    assert_eq!(size, 112);
}

#[test]
fn test_layout_texture_params_take_no_space() {
    let decls = vec![
        ShaderParamDecl::new("tex", ShaderParamType::Texture),
        ShaderParamDecl::new("color", ShaderParamType::Vec4),
        ShaderParamDecl::new("mask", ShaderParamType::Texture),
    ];
    let (params, size) = layout_params(&decls).unwrap();
    assert_eq!(size, 16);
    assert_eq!(params[0].texture_slot(), Some(0));
    assert_eq!(params[2].texture_slot(), Some(1));
    assert_eq!(params[1].offset(), 0);
}

#[test]
fn test_layout_rejects_duplicates_and_bad_defaults() {
    let duplicate = vec![
        ShaderParamDecl::new("a", ShaderParamType::Float),
        ShaderParamDecl::new("a", ShaderParamType::Int),
    ];
    assert!(matches!(layout_params(&duplicate), Err(Error::Configuration(_))));

    let bad_default = vec![ShaderParamDecl::new("a", ShaderParamType::Vec2).with_default(vec![0; 4])];
    assert!(matches!(
        layout_params(&bad_default),
        Err(Error::SizeMismatch { expected: 8, actual: 4, .. })
    ));
}

// ============================================================================
// Set / upload
// ============================================================================

fn color_shader(backend: &mut MockBackend) -> Shader {
    let desc = ShaderDesc::new("float4 main() : TARGET")
        .with_param(ShaderParamDecl::new("color", ShaderParamType::Vec4))
        .with_param(ShaderParamDecl::new("alpha", ShaderParamType::Float).with_default(float_bytes(&[1.0])));
    Shader::new(backend, ShaderStage::Pixel, desc).unwrap()
}

#[test]
fn test_first_upload_writes_defaults() {
    let (mut backend, recorder) = setup();
    let mut shader = color_shader(&mut backend);

    let upload = shader.upload_params(&mut backend).unwrap();

    assert!(upload.uploaded);
    assert_eq!(&shader.constant_data()[16..20], float_bytes(&[1.0]).as_slice());
    assert_eq!(upload_count(&recorder), 1);
}

#[test]
fn test_set_param_then_upload_places_bytes_at_offset() {
    let (mut backend, recorder) = setup();
    let mut shader = color_shader(&mut backend);
    shader.upload_params(&mut backend).unwrap();

    let color = float_bytes(&[0.25, 0.5, 0.75, 1.0]);
    shader.set_param("color", &color).unwrap();
    assert!(shader.param("color").unwrap().is_changed());

    shader.upload_params(&mut backend).unwrap();

    assert!(!shader.param("color").unwrap().is_changed());
    let constants = shader.constant_buffer().unwrap();
    let uploaded = recorder.contents(constants).unwrap();
    assert_eq!(&uploaded[0..16], color.as_slice());
}

#[test]
fn test_second_upload_without_changes_skips_native_upload() {
    let (mut backend, recorder) = setup();
    let mut shader = color_shader(&mut backend);
    shader.upload_params(&mut backend).unwrap();
    let before = upload_count(&recorder);

    let upload = shader.upload_params(&mut backend).unwrap();

    assert!(!upload.uploaded);
    assert_eq!(upload_count(&recorder), before);
}

#[test]
fn test_many_changes_one_transfer() {
    let (mut backend, recorder) = setup();
    let mut shader = color_shader(&mut backend);
    shader.upload_params(&mut backend).unwrap();
    let before = upload_count(&recorder);

    shader.set_param("color", &float_bytes(&[1.0; 4])).unwrap();
    shader.set_param("alpha", &float_bytes(&[0.5])).unwrap();
    shader.upload_params(&mut backend).unwrap();

    assert_eq!(upload_count(&recorder), before + 1);
}

#[test]
fn test_failed_transfer_is_retried_by_next_upload() {
    let (mut backend, recorder) = setup();
    let mut shader = color_shader(&mut backend);
    shader.upload_params(&mut backend).unwrap();
    let color = float_bytes(&[0.0, 1.0, 0.0, 1.0]);

    shader.set_param("color", &color).unwrap();
    recorder.fail_next_buffer_update();
    assert!(matches!(shader.upload_params(&mut backend), Err(Error::NativeBackend(_))));
    assert!(shader.needs_upload());

    let upload = shader.upload_params(&mut backend).unwrap();

    assert!(upload.uploaded);
    assert!(!shader.needs_upload());
    let uploaded = recorder.contents(shader.constant_buffer().unwrap()).unwrap();
    assert_eq!(&uploaded[0..16], color.as_slice());
}

#[test]
fn test_set_param_errors() {
    let (mut backend, _recorder) = setup();
    let mut shader = color_shader(&mut backend);

    assert!(matches!(shader.set_param("missing", &[0; 4]), Err(Error::NotFound(_))));
    assert_eq!(
        shader.set_param("color", &[0; 12]),
        Err(Error::SizeMismatch { name: "color".to_string(), expected: 16, actual: 12 })
    );
}

#[test]
fn test_set_param_default_restores_declared_value() {
    let (mut backend, _recorder) = setup();
    let mut shader = color_shader(&mut backend);
    shader.set_param("alpha", &float_bytes(&[0.1])).unwrap();
    shader.upload_params(&mut backend).unwrap();

    shader.set_param_default("alpha").unwrap();
    shader.upload_params(&mut backend).unwrap();

    assert_eq!(&shader.constant_data()[16..20], float_bytes(&[1.0]).as_slice());
}

// ============================================================================
// Textures and samplers
// ============================================================================

#[test]
fn test_pixel_shader_sampler_count_must_match_textures() {
    let (mut backend, _recorder) = setup();
    let desc = ShaderDesc::new("ps")
        .with_param(ShaderParamDecl::new("tex", ShaderParamType::Texture));
    let result = Shader::new(&mut backend, ShaderStage::Pixel, desc);
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[test]
fn test_vertex_shader_textures_without_samplers() {
    let (mut backend, _recorder) = setup();
    let desc = ShaderDesc::new("vs")
        .with_param(ShaderParamDecl::new("heightmap", ShaderParamType::Texture));
    let shader = Shader::new(&mut backend, ShaderStage::Vertex, desc).unwrap();
    assert_eq!(shader.sampler_count(), 0);
    assert_eq!(shader.constant_buffer(), None);
}

#[test]
fn test_texture_param_pairs_with_sampler_in_declaration_order() {
    let (mut backend, _recorder) = setup();
    let desc = ShaderDesc::new("ps")
        .with_param(ShaderParamDecl::new("tex", ShaderParamType::Texture))
        .with_param(ShaderParamDecl::new("mask", ShaderParamType::Texture))
        .with_sampler(SamplerDecl::new("texSampler", SamplerInfo::default()))
        .with_sampler(SamplerDecl::new("maskSampler", SamplerInfo::default()));
    let shader = Shader::new(&mut backend, ShaderStage::Pixel, desc).unwrap();

    assert_eq!(shader.param("mask").unwrap().texture_slot(), Some(1));
    assert_eq!(shader.sampler_name(1), Some("maskSampler"));
    assert!(shader.sampler_handle(1).is_some());
}

#[test]
fn test_texture_params_reject_set_param() {
    let (mut backend, _recorder) = setup();
    let desc = ShaderDesc::new("ps")
        .with_param(ShaderParamDecl::new("tex", ShaderParamType::Texture))
        .with_sampler(SamplerDecl::new("s", SamplerInfo::default()));
    let mut shader = Shader::new(&mut backend, ShaderStage::Pixel, desc).unwrap();

    assert!(matches!(shader.set_param("tex", &[]), Err(Error::Configuration(_))));
    assert_eq!(shader.texture_bindings(), vec![(0, None)]);
}

#[test]
fn test_texture_bindings_persist_across_uploads() {
    let (mut backend, _recorder) = setup();
    let desc = ShaderDesc::new("ps")
        .with_param(ShaderParamDecl::new("color", ShaderParamType::Vec4))
        .with_param(ShaderParamDecl::new("tex", ShaderParamType::Texture))
        .with_param(ShaderParamDecl::new("mask", ShaderParamType::Texture))
        .with_sampler(SamplerDecl::new("texSampler", SamplerInfo::default()))
        .with_sampler(SamplerDecl::new("maskSampler", SamplerInfo::default()));
    let mut shader = Shader::new(&mut backend, ShaderStage::Pixel, desc).unwrap();
    let texture = TextureHandle::from_parts(crate::graphics::Graphics::next_device_id(), ResourceKey::default());

    shader.set_texture("mask", Some(texture)).unwrap();
    shader.upload_params(&mut backend).unwrap();
    shader.upload_params(&mut backend).unwrap();

    assert_eq!(shader.texture_bindings(), vec![(0, None), (1, Some(texture))]);
}

// ============================================================================
// View-projection / lifecycle
// ============================================================================

#[test]
fn test_view_proj_must_be_a_matrix() {
    let (mut backend, _recorder) = setup();
    let desc = ShaderDesc::new("vs").with_param(ShaderParamDecl::new(VIEW_PROJ_PARAM, ShaderParamType::Vec4));
    assert!(matches!(Shader::new(&mut backend, ShaderStage::Vertex, desc), Err(Error::Configuration(_))));
}

#[test]
fn test_set_view_proj_writes_matrix() {
    let (mut backend, _recorder) = setup();
    let desc = ShaderDesc::new("vs").with_param(ShaderParamDecl::new(VIEW_PROJ_PARAM, ShaderParamType::Mat4));
    let mut shader = Shader::new(&mut backend, ShaderStage::Vertex, desc).unwrap();
    let matrix = Mat4::from_scale(glam::Vec3::splat(2.0));

    shader.set_view_proj(&matrix).unwrap();
    shader.upload_params(&mut backend).unwrap();

    assert_eq!(shader.constant_data(), bytemuck::bytes_of(&matrix));
}

#[test]
fn test_release_and_rebuild_recreate_all_handles() {
    let (mut backend, recorder) = setup();
    let desc = ShaderDesc::new("ps")
        .with_param(ShaderParamDecl::new("color", ShaderParamType::Vec4))
        .with_param(ShaderParamDecl::new("tex", ShaderParamType::Texture))
        .with_sampler(SamplerDecl::new("s", SamplerInfo::default()));
    let mut shader = Shader::new(&mut backend, ShaderStage::Pixel, desc).unwrap();
    let old = shader.handle().unwrap();

    shader.release(&mut backend);
    assert_eq!(recorder.live_count(), 0);

    shader.rebuild(&mut backend).unwrap();
    assert_ne!(shader.handle().unwrap(), old);
    assert_eq!(recorder.live_count(), 3);
}

#[test]
fn test_failed_build_releases_partial_objects() {
    let (mut backend, recorder) = setup();
    // shader compile succeeds, constant buffer creation fails
    recorder.set_fail_creation_at(Some(recorder.creation_count() + 2));
    let result = Shader::new(&mut backend, ShaderStage::Pixel, ShaderDesc::new("ps")
        .with_param(ShaderParamDecl::new("color", ShaderParamType::Vec4)));

    assert!(matches!(result, Err(Error::NativeBackend(_))));
    assert_eq!(recorder.live_count(), 0);
}
