use glam::{Mat4, Vec3, Vec4};

use crate::backend::MockBackend;
use crate::device::{Device, DeviceConfig};
use crate::error::Error;

fn device() -> Device {
    Device::new(Box::new(MockBackend::new()), DeviceConfig::default()).unwrap()
}

fn assert_close(a: Vec4, b: Vec4) {
    assert!((a - b).abs().max_element() < 1e-5, "{a:?} != {b:?}");
}

#[test]
fn test_view_proj_is_projection_times_view() {
    let mut device = device();
    let projection = Mat4::from_scale(Vec3::splat(0.5));
    let view = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    device.set_projection(projection);
    device.set_view(view);
    assert_eq!(device.view_proj(), projection * view);
}

#[test]
fn test_ortho_maps_screen_corners() {
    let mut device = device();
    device.ortho(0.0, 640.0, 0.0, 480.0, -100.0, 100.0).unwrap();
    let top_left = device.projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
    let bottom_right = device.projection() * Vec4::new(640.0, 480.0, 0.0, 1.0);
    assert_close(top_left, Vec4::new(-1.0, 1.0, 0.5, 1.0));
    assert_close(bottom_right, Vec4::new(1.0, -1.0, 0.5, 1.0));
}

#[test]
fn test_frustum_maps_near_and_far_planes() {
    let mut device = device();
    device.frustum(-1.0, 1.0, 1.0, -1.0, 1.0, 10.0).unwrap();
    let near = device.projection() * Vec4::new(1.0, 1.0, -1.0, 1.0);
    let far = device.projection() * Vec4::new(0.0, 0.0, -10.0, 1.0);
    assert_close(near / near.w, Vec4::new(1.0, 1.0, 0.0, 1.0));
    assert_close(far / far.w, Vec4::new(0.0, 0.0, 1.0, 1.0));
}

#[test]
fn test_degenerate_projections_rejected() {
    let mut device = device();
    assert!(matches!(device.ortho(0.0, 0.0, 0.0, 1.0, 0.0, 1.0), Err(Error::Configuration(_))));
    assert!(matches!(device.frustum(-1.0, 1.0, 1.0, -1.0, 0.0, 10.0), Err(Error::Configuration(_))));
    assert_eq!(device.projection(), Mat4::IDENTITY);
}

#[test]
fn test_push_pop_projection() {
    let mut device = device();
    let saved = Mat4::from_scale(Vec3::splat(2.0));
    device.set_projection(saved);
    device.push_projection();
    device.set_projection(Mat4::IDENTITY);
    assert_eq!(device.projection_depth(), 1);

    device.pop_projection();
    assert_eq!(device.projection(), saved);

    // empty stack: no-op
    device.pop_projection();
    assert_eq!(device.projection(), saved);
    assert_eq!(device.projection_depth(), 0);
}

#[test]
fn test_world_defaults_to_identity() {
    let mut device = device();
    assert_eq!(device.world(), Mat4::IDENTITY);

    let world = Mat4::from_scale(Vec3::splat(3.0));
    device.set_world(world);
    assert_eq!(device.world(), world);
    // the projection stack does not carry the world matrix
    device.push_projection();
    device.pop_projection();
    assert_eq!(device.world(), world);
}
