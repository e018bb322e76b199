use rawdisk::discover;

#[test]
fn discover_returns_sorted_usable_entries() {
    let devices = discover();

    for pair in devices.windows(2) {
        assert!(pair[0].name <= pair[1].name, "entries must be sorted");
    }

    for device in &devices {
        assert!(device.size > 0);
        assert!(device.path.starts_with("/dev/"));
        assert!(!device.name.starts_with("loop"));
        assert!(!device.name.starts_with("dm-"));
        assert!(!device.human_size().is_empty());
    }
}
