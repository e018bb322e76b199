use rawdisk::{BlockRead, DeviceError, StorageDevice};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn temp_file_with(len: usize) -> (NamedTempFile, Vec<u8>) {
    let mut temp = NamedTempFile::new().unwrap();
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    temp.write_all(&data).unwrap();
    temp.flush().unwrap();
    (temp, data)
}

#[test]
fn open_reports_file_length() {
    let (temp, _) = temp_file_with(4096);

    let mut device = StorageDevice::new();
    device.open(temp.path()).unwrap();

    assert!(device.is_open());
    assert_eq!(device.size(), 4096);
    assert_eq!(device.path(), Some(temp.path()));
}

#[test]
fn read_returns_exact_range() {
    let (temp, data) = temp_file_with(4096);
    let device = StorageDevice::open_path(temp.path()).unwrap();

    let mut buf = vec![0u8; 512];
    device.read_at(256, &mut buf).unwrap();
    assert_eq!(buf, data[256..768]);
}

#[test]
fn rereading_a_range_is_idempotent() {
    let (temp, _) = temp_file_with(8192);
    let device = StorageDevice::open_path(temp.path()).unwrap();

    let mut first = vec![0u8; 1024];
    let mut second = vec![0u8; 1024];
    device.read_at(3000, &mut first).unwrap();
    device.read_at(3000, &mut second).unwrap();
    assert_eq!(first, second);
}

#[test]
fn split_reads_concatenate_to_one_read() {
    let (temp, _) = temp_file_with(4096);
    let device = StorageDevice::open_path(temp.path()).unwrap();

    let mut first = vec![0u8; 512];
    let mut second = vec![0u8; 512];
    device.read_at(0, &mut first).unwrap();
    device.read_at(512, &mut second).unwrap();

    let mut combined = vec![0u8; 1024];
    device.read_at(0, &mut combined).unwrap();

    first.extend_from_slice(&second);
    assert_eq!(first, combined);
}

#[test]
fn read_past_end_is_out_of_bounds() {
    let (temp, _) = temp_file_with(1024);
    let device = StorageDevice::open_path(temp.path()).unwrap();

    let mut buf = vec![0u8; 512];
    let err = device.read_at(768, &mut buf).unwrap_err();
    match err {
        DeviceError::OutOfBounds {
            offset,
            length,
            size,
        } => {
            assert_eq!(offset, 768);
            assert_eq!(length, 512);
            assert_eq!(size, 1024);
        }
        other => panic!("expected out-of-bounds, got {other:?}"),
    }
}

#[test]
fn zero_length_read_at_end_succeeds() {
    let (temp, _) = temp_file_with(1024);
    let device = StorageDevice::open_path(temp.path()).unwrap();

    let mut buf: [u8; 0] = [];
    device.read_at(1024, &mut buf).unwrap();
}

#[test]
fn open_missing_path_leaves_device_unopened() {
    let mut device = StorageDevice::new();
    let err = device.open("/nonexistent/rawdisk-test-device").unwrap_err();

    assert!(matches!(err, DeviceError::NotFound(_)));
    assert!(!device.is_open());
    assert_eq!(device.size(), 0);
    assert_eq!(device.path(), None);
}

#[test]
fn open_directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let mut device = StorageDevice::new();
    let err = device.open(dir.path()).unwrap_err();

    assert!(matches!(err, DeviceError::UnsupportedTarget(_)));
    assert!(!device.is_open());
    assert_eq!(device.size(), 0);
}

#[cfg(unix)]
#[test]
fn char_devices_are_rejected() {
    let mut device = StorageDevice::new();
    let err = device.open("/dev/null").unwrap_err();
    assert!(matches!(err, DeviceError::UnsupportedTarget(_)));
    assert!(!device.is_open());
}

#[test]
fn close_is_idempotent() {
    let (temp, _) = temp_file_with(128);
    let mut device = StorageDevice::open_path(temp.path()).unwrap();

    device.close();
    assert!(!device.is_open());
    assert_eq!(device.size(), 0);

    device.close();
    assert!(!device.is_open());

    let mut never_opened = StorageDevice::new();
    never_opened.close();
    assert!(!never_opened.is_open());
}

#[test]
fn read_on_unopened_device_fails_fast() {
    let device = StorageDevice::new();
    let mut buf = [0u8; 16];
    assert!(matches!(
        device.read_at(0, &mut buf),
        Err(DeviceError::NotOpen)
    ));
}

#[test]
fn reopen_swaps_targets() {
    let (first, _) = temp_file_with(1000);
    let (second, _) = temp_file_with(2000);

    let mut device = StorageDevice::open_path(first.path()).unwrap();
    assert_eq!(device.size(), 1000);

    device.open(second.path()).unwrap();
    assert_eq!(device.size(), 2000);
    assert_eq!(device.path(), Some(second.path()));
}

#[test]
fn failed_reopen_releases_previous_target() {
    let (temp, _) = temp_file_with(1000);

    let mut device = StorageDevice::open_path(temp.path()).unwrap();
    let err = device.open("/nonexistent/rawdisk-test-device").unwrap_err();

    assert!(matches!(err, DeviceError::NotFound(_)));
    assert!(!device.is_open());
    assert_eq!(device.size(), 0);
}

#[test]
fn concurrent_disjoint_reads_do_not_interleave() {
    const CHUNK: usize = 8192;
    let (temp, data) = temp_file_with(8 * CHUNK);
    let device = Arc::new(StorageDevice::open_path(temp.path()).unwrap());

    let mut handles = Vec::new();
    for chunk in 0..8 {
        let device = Arc::clone(&device);
        let expected = data[chunk * CHUNK..(chunk + 1) * CHUNK].to_vec();
        handles.push(std::thread::spawn(move || {
            let mut buf = vec![0u8; CHUNK];
            for _ in 0..16 {
                device.read_at((chunk * CHUNK) as u64, &mut buf).unwrap();
                assert_eq!(buf, expected);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn truncated_target_reports_short_read() {
    let (temp, _) = temp_file_with(4096);
    let device = StorageDevice::open_path(temp.path()).unwrap();

    // Shrink the file underneath the open handle; the device still believes
    // it is 4096 bytes, so an in-bounds read past the new end comes up empty.
    temp.as_file().set_len(1024).unwrap();

    let mut buf = vec![0u8; 512];
    let err = device.read_at(2048, &mut buf).unwrap_err();
    match err {
        DeviceError::ShortRead {
            offset,
            expected,
            actual,
        } => {
            assert_eq!(offset, 2048);
            assert_eq!(expected, 512);
            assert_eq!(actual, 0);
        }
        other => panic!("expected short read, got {other:?}"),
    }
}

#[test]
fn block_read_trait_object_serves_reads() {
    let (temp, data) = temp_file_with(2048);
    let device = StorageDevice::open_path(temp.path()).unwrap();

    let source: &dyn BlockRead = &device;
    assert_eq!(source.size(), 2048);

    let mut buf = vec![0u8; 64];
    source.read_at(128, &mut buf).unwrap();
    assert_eq!(buf, data[128..192]);
}
