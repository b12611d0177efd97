/// Unit tests for MockBackend and MockRecorder

use crate::backend::*;
use crate::error::Error;
use crate::resource::{ColorFormat, TextureFlags};
use crate::state::BlendState;

fn backend_with_device() -> (MockBackend, MockRecorder) {
    let mut backend = MockBackend::new();
    let recorder = backend.recorder();
    backend.create_device(0).unwrap();
    (backend, recorder)
}

fn rgba_desc(width: u32, height: u32) -> NativeTextureDesc {
    NativeTextureDesc {
        width,
        height,
        levels: 1,
        format: ColorFormat::RGBA,
        flags: TextureFlags::empty(),
    }
}

// ============================================================================
// Device lifecycle
// ============================================================================

#[test]
fn test_creation_requires_device() {
    let mut backend = MockBackend::new();
    let result = backend.create_buffer(BufferKind::Vertex, &[0; 12], false);
    assert!(matches!(result, Err(Error::NativeBackend(_))));
}

#[test]
fn test_create_device_bumps_generation() {
    let (mut backend, recorder) = backend_with_device();
    assert_eq!(recorder.generation(), 1);
    backend.destroy_device();
    backend.create_device(1).unwrap();
    assert_eq!(recorder.generation(), 2);
    assert!(recorder.calls().contains(&MockCall::CreateDevice { adapter: 1, generation: 2 }));
}

#[test]
fn test_destroy_device_invalidates_handles() {
    let (mut backend, recorder) = backend_with_device();
    let buffer = backend.create_buffer(BufferKind::Vertex, &[1, 2, 3], false).unwrap();
    assert!(recorder.is_live(buffer));

    backend.destroy_device();
    backend.create_device(0).unwrap();

    assert!(!recorder.is_live(buffer));
    assert!(matches!(backend.update_buffer(buffer, &[4]), Err(Error::NativeBackend(_))));
}

#[test]
fn test_handles_are_never_reused() {
    let (mut backend, _recorder) = backend_with_device();
    let a = backend.create_buffer(BufferKind::Index, &[0; 4], false).unwrap();
    backend.release(a);
    let b = backend.create_buffer(BufferKind::Index, &[0; 4], false).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_lose_device_fails_calls_until_recreated() {
    let (mut backend, recorder) = backend_with_device();
    recorder.lose_device();

    assert_eq!(backend.draw(PrimitiveTopology::Triangles, 0, 3), Err(Error::DeviceLost));
    assert_eq!(backend.compile_blend_state(&BlendState::default()), Err(Error::DeviceLost));

    backend.destroy_device();
    backend.create_device(0).unwrap();
    assert!(backend.draw(PrimitiveTopology::Triangles, 0, 3).is_ok());
}

// ============================================================================
// Contents
// ============================================================================

#[test]
fn test_buffer_contents_follow_updates() {
    let (mut backend, recorder) = backend_with_device();
    let buffer = backend.create_buffer(BufferKind::Constant, &[0; 16], true).unwrap();
    assert_eq!(recorder.contents(buffer), Some(vec![0; 16]));

    backend.update_buffer(buffer, &[7; 16]).unwrap();
    assert_eq!(recorder.contents(buffer), Some(vec![7; 16]));
}

#[test]
fn test_texture_without_data_is_zeroed() {
    let (mut backend, recorder) = backend_with_device();
    let texture = backend.create_texture(&rgba_desc(4, 2), &[]).unwrap();
    assert_eq!(recorder.contents(texture), Some(vec![0; 32]));
}

#[test]
fn test_staging_copy_and_map() {
    let (mut backend, _recorder) = backend_with_device();
    let data: Vec<u8> = (0..16).collect();
    let texture = backend.create_texture(&rgba_desc(2, 2), &[data.clone()]).unwrap();
    let staging = backend.create_staging_surface(2, 2, ColorFormat::RGBA).unwrap();

    assert_eq!(backend.map_staging_surface(staging).unwrap(), vec![0; 16]);
    backend.copy_texture_to_staging(texture, staging).unwrap();
    assert_eq!(backend.map_staging_surface(staging).unwrap(), data);
}

// ============================================================================
// Fault injection and recording
// ============================================================================

#[test]
fn test_fail_creation_at_fails_exactly_once() {
    let (mut backend, recorder) = backend_with_device();
    recorder.set_fail_creation_at(Some(2));

    assert!(backend.create_sampler(&Default::default()).is_ok());
    assert!(matches!(backend.create_sampler(&Default::default()), Err(Error::NativeBackend(_))));
    assert!(backend.create_sampler(&Default::default()).is_ok());
    assert_eq!(recorder.creation_count(), 3);
}

#[test]
fn test_fail_next_buffer_update_fails_once_and_keeps_old_contents() {
    let (mut backend, recorder) = backend_with_device();
    let buffer = backend.create_buffer(BufferKind::Constant, &[1; 16], true).unwrap();
    recorder.fail_next_buffer_update();

    assert!(matches!(backend.update_buffer(buffer, &[2; 16]), Err(Error::NativeBackend(_))));
    assert_eq!(recorder.contents(buffer).unwrap(), vec![1; 16]);
    backend.update_buffer(buffer, &[3; 16]).unwrap();
    assert_eq!(recorder.contents(buffer).unwrap(), vec![3; 16]);
}

#[test]
fn test_config_fail_creation_at() {
    let mut backend = MockBackend::with_config(MockBackendConfig {
        fail_creation_at: Some(1),
        ..Default::default()
    });
    backend.create_device(0).unwrap();
    assert!(backend.compile_shader(ShaderStage::Vertex, "main").is_err());
}

#[test]
fn test_unsupported_formats() {
    let backend = MockBackend::with_config(MockBackendConfig {
        unsupported_color_formats: vec![ColorFormat::DXT1],
        ..Default::default()
    });
    assert!(!backend.supports_color_format(ColorFormat::DXT1));
    assert!(backend.supports_color_format(ColorFormat::RGBA));
}

#[test]
fn test_count_and_clear_calls() {
    let (mut backend, recorder) = backend_with_device();
    backend.draw(PrimitiveTopology::Points, 0, 1).unwrap();
    backend.draw(PrimitiveTopology::Points, 0, 2).unwrap();

    assert_eq!(recorder.count(|call| matches!(call, MockCall::Draw { .. })), 2);
    recorder.clear_calls();
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_bind_stale_handle_fails() {
    let (mut backend, _recorder) = backend_with_device();
    let texture = backend.create_texture(&rgba_desc(1, 1), &[]).unwrap();
    backend.release(texture);
    assert!(backend.bind_texture(0, Some(texture)).is_err());
    assert!(backend.bind_texture(0, None).is_ok());
}

#[test]
fn test_is_creation_classification() {
    let (mut backend, recorder) = backend_with_device();
    backend.compile_blend_state(&BlendState::default()).unwrap();
    backend.set_viewport(Rect::new(0, 0, 8, 8)).unwrap();

    let calls = recorder.calls();
    assert_eq!(calls.iter().filter(|c| c.is_creation()).count(), 1);
    assert_eq!(calls.iter().filter(|c| c.is_state_compilation()).count(), 1);
}
