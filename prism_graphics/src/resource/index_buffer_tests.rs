use crate::backend::{BufferKind, MockBackend, MockCall, MockRecorder, NativeBackend};
use crate::error::Error;
use crate::resource::{BufferFlags, IndexBuffer, IndexType};

fn setup() -> (MockBackend, MockRecorder) {
    let mut backend = MockBackend::new();
    let recorder = backend.recorder();
    backend.create_device(0).unwrap();
    (backend, recorder)
}

#[test]
fn test_from_u16_counts_indices() {
    let (mut backend, recorder) = setup();
    let ib = IndexBuffer::from_u16(&mut backend, &[0, 1, 2, 2, 3, 0], BufferFlags::empty()).unwrap();

    assert_eq!(ib.count(), 6);
    assert_eq!(ib.index_type(), IndexType::U16);
    assert_eq!(recorder.count(|c| matches!(c, MockCall::CreateBuffer { kind: BufferKind::Index, size: 12, .. })), 1);
}

#[test]
fn test_from_u32_counts_indices() {
    let (mut backend, _recorder) = setup();
    let ib = IndexBuffer::from_u32(&mut backend, &[0, 70_000, 1], BufferFlags::empty()).unwrap();
    assert_eq!(ib.count(), 3);
    assert_eq!(ib.data().len(), 12);
}

#[test]
fn test_invalid_index_data_rejected() {
    let (mut backend, _recorder) = setup();
    assert!(matches!(
        IndexBuffer::new(&mut backend, IndexType::U16, Vec::new(), BufferFlags::empty()),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        IndexBuffer::new(&mut backend, IndexType::U32, vec![0; 6], BufferFlags::empty()),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_update_dynamic_index_buffer() {
    let (mut backend, recorder) = setup();
    let mut ib = IndexBuffer::from_u16(&mut backend, &[0, 1, 2], BufferFlags::DYNAMIC).unwrap();
    let replacement: Vec<u8> = bytemuck::cast_slice(&[2u16, 1, 0]).to_vec();

    ib.update(&mut backend, replacement.clone()).unwrap();

    assert_eq!(ib.data(), replacement.as_slice());
    assert_eq!(recorder.contents(ib.handle().unwrap()).unwrap(), replacement);
    assert!(matches!(ib.update(&mut backend, vec![0; 4]), Err(Error::Configuration(_))));
}

#[test]
fn test_update_static_index_buffer_rejected() {
    let (mut backend, _recorder) = setup();
    let mut ib = IndexBuffer::from_u16(&mut backend, &[0, 1, 2], BufferFlags::empty()).unwrap();
    assert!(matches!(ib.update(&mut backend, vec![0; 6]), Err(Error::Configuration(_))));
}
