/// Unit tests for vertex_buffer.rs

use glam::Vec3;

use crate::backend::{BufferKind, MockBackend, MockCall, MockRecorder, NativeBackend};
use crate::error::Error;
use crate::resource::{BufferFlags, TexCoordArray, VertexBuffer, VertexData};
use crate::shader::VertexInputs;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn setup() -> (MockBackend, MockRecorder) {
    let mut backend = MockBackend::new();
    let recorder = backend.recorder();
    backend.create_device(0).unwrap();
    (backend, recorder)
}

fn full_data() -> VertexData {
    VertexData {
        points: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        normals: Some(vec![Vec3::Z; 3]),
        colors: Some(vec![0xffff_ffff; 3]),
        tangents: None,
        tex_coords: vec![
            TexCoordArray::new(2, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
            TexCoordArray::new(1, vec![0.0, 0.5, 1.0]),
        ],
    }
}

fn vertex_buffers_created(recorder: &MockRecorder) -> usize {
    recorder.count(|c| matches!(c, MockCall::CreateBuffer { kind: BufferKind::Vertex, .. }))
}

// ============================================================================
// VALIDATION
// ============================================================================

#[test]
fn test_empty_points_rejected() {
    assert!(matches!(VertexData::default().validate(), Err(Error::Configuration(_))));
}

#[test]
fn test_stream_length_mismatch_rejected() {
    let mut data = full_data();
    data.normals = Some(vec![Vec3::Z; 2]);
    assert!(matches!(data.validate(), Err(Error::Configuration(_))));
}

#[test]
fn test_tex_coord_width_out_of_range_rejected() {
    let mut data = full_data();
    data.tex_coords = vec![TexCoordArray::new(5, vec![0.0; 15])];
    assert!(matches!(data.validate(), Err(Error::Configuration(_))));
}

// ============================================================================
// STREAMS
// ============================================================================

#[test]
fn test_one_native_buffer_per_stream() {
    let (mut backend, recorder) = setup();
    let vb = VertexBuffer::new(&mut backend, full_data(), BufferFlags::empty()).unwrap();

    assert_eq!(vertex_buffers_created(&recorder), 5);
    assert_eq!(vb.streams().all().len(), 5);
    assert_eq!(vb.streams().tangents, None);
    assert_eq!(vb.vertex_count(), 3);
}

#[test]
fn test_streams_follow_shader_order() {
    let (mut backend, _recorder) = setup();
    let vb = VertexBuffer::new(&mut backend, full_data(), BufferFlags::empty()).unwrap();
    let streams = vb.streams().clone();

    let inputs = VertexInputs { colors: true, tex_units: 1, ..Default::default() };
    let bound = vb.streams_for(&inputs).unwrap();

    assert_eq!(bound, vec![streams.points.unwrap(), streams.colors.unwrap(), streams.tex_coords[0]]);
}

#[test]
fn test_missing_stream_for_shader_rejected() {
    let (mut backend, _recorder) = setup();
    let vb = VertexBuffer::new(&mut backend, full_data(), BufferFlags::empty()).unwrap();

    let tangents = VertexInputs { tangents: true, ..Default::default() };
    assert!(matches!(vb.streams_for(&tangents), Err(Error::Configuration(_))));
    let three_units = VertexInputs { tex_units: 3, ..Default::default() };
    assert!(matches!(vb.streams_for(&three_units), Err(Error::Configuration(_))));
}

// ============================================================================
// UPDATE / REBUILD
// ============================================================================

#[test]
fn test_update_requires_same_layout() {
    let (mut backend, _recorder) = setup();
    let mut vb = VertexBuffer::new(&mut backend, full_data(), BufferFlags::DYNAMIC).unwrap();
    let points_only = VertexData::from_points(vec![Vec3::ONE; 3]);
    assert!(matches!(vb.update(&mut backend, points_only), Err(Error::Configuration(_))));
}

#[test]
fn test_update_reuploads_every_stream() {
    let (mut backend, recorder) = setup();
    let mut vb = VertexBuffer::new(&mut backend, full_data(), BufferFlags::DYNAMIC).unwrap();
    let mut moved = full_data();
    moved.points[0] = Vec3::ONE;

    vb.update(&mut backend, moved.clone()).unwrap();

    assert_eq!(recorder.count(|c| matches!(c, MockCall::UpdateBuffer { .. })), 5);
    assert_eq!(vb.data(), &moved);
}

#[test]
fn test_rebuild_reuploads_retained_copy() {
    let (mut backend, recorder) = setup();
    let data = full_data();
    let mut vb = VertexBuffer::new(&mut backend, data.clone(), BufferFlags::DYNAMIC).unwrap();

    vb.release(&mut backend);
    assert_eq!(recorder.live_count(), 0);
    vb.rebuild(&mut backend).unwrap();

    let points = vb.streams().points.unwrap();
    assert_eq!(recorder.contents(points).unwrap(), bytemuck::cast_slice::<Vec3, u8>(&data.points));
    assert_eq!(vb.data(), &data);
}

#[test]
fn test_failed_build_releases_created_streams() {
    let (mut backend, recorder) = setup();
    recorder.set_fail_creation_at(Some(3));

    let result = VertexBuffer::new(&mut backend, full_data(), BufferFlags::empty());

    assert!(matches!(result, Err(Error::NativeBackend(_))));
    assert_eq!(recorder.live_count(), 0);
}
