use std::fs::OpenOptions;
use std::io::{Cursor, Seek, SeekFrom, Write};

use xciso::{detect_layout, CisoError, ContainerDescriptor, ImageLayout};

const SIGNATURE: &[u8; 20] = b"MICROSOFT*XBOX*MEDIA";

fn with_signature_at(len: usize, at: usize) -> Cursor<Vec<u8>> {
    let mut data = vec![0u8; len];
    data[at..at + 20].copy_from_slice(SIGNATURE);
    Cursor::new(data)
}

#[test]
fn raw_xdvdfs_has_origin_zero() {
    let mut src = with_signature_at(0x12000, 0x10000);
    let layout = detect_layout(&mut src).unwrap();
    assert_eq!(layout, ImageLayout::Xdvdfs);
    assert_eq!(layout.origin_offset(), 0);
}

#[test]
fn signature_exactly_at_end_of_source() {
    let mut src = with_signature_at(0x10014, 0x10000);
    assert_eq!(detect_layout(&mut src).unwrap(), ImageLayout::Xdvdfs);
}

#[test]
fn redump_image_is_detected_at_fixed_offset() {
    let mut file = tempfile::tempfile().unwrap();
    file.set_len(0x1831_0000 + 0x800).unwrap();
    file.seek(SeekFrom::Start(0x1831_0000)).unwrap();
    file.write_all(SIGNATURE).unwrap();

    let layout = detect_layout(&mut file).unwrap();
    assert_eq!(layout, ImageLayout::Redump);
    assert_eq!(layout.origin_offset(), 0x1830_0000);

    let descriptor = ContainerDescriptor::from_source(layout, &mut file).unwrap();
    assert_eq!(descriptor.total_bytes, 0x1_0800);
    assert_eq!(descriptor.total_blocks, 0x21);
}

#[test]
fn redump_probe_wins_over_raw_probe() {
    let path = tempfile::NamedTempFile::new().unwrap();
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path.path())
        .unwrap();
    file.set_len(0x1831_0000 + 20).unwrap();
    file.seek(SeekFrom::Start(0x1_0000)).unwrap();
    file.write_all(SIGNATURE).unwrap();
    file.seek(SeekFrom::Start(0x1831_0000)).unwrap();
    file.write_all(SIGNATURE).unwrap();
    assert_eq!(detect_layout(&mut file).unwrap(), ImageLayout::Redump);
}

#[test]
fn missing_signature_fails() {
    let mut src = Cursor::new(vec![0u8; 0x20000]);
    let err = detect_layout(&mut src).unwrap_err();
    assert!(matches!(err, CisoError::LayoutDetection(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn wrong_offset_fails() {
    let mut src = with_signature_at(0x20000, 0x8000);
    assert!(matches!(
        detect_layout(&mut src),
        Err(CisoError::LayoutDetection(_))
    ));
}

#[test]
fn source_shorter_than_probe_fails() {
    for len in [0usize, 20, 0x1_0000, 0x1_0013] {
        let mut src = Cursor::new(vec![0u8; len]);
        assert!(
            matches!(detect_layout(&mut src), Err(CisoError::LayoutDetection(_))),
            "len {len}"
        );
    }
}

#[test]
fn partial_signature_fails() {
    let mut data = vec![0u8; 0x12000];
    data[0x10000..0x10014].copy_from_slice(b"MICROSOFT*XBOX*MEDIx");
    assert!(detect_layout(&mut Cursor::new(data)).is_err());
}
