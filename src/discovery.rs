//! Enumeration of block devices attached to the host.
//!
//! Discovery is best-effort: entries that cannot be read are skipped, and
//! platforms without a browsable device registry yield an empty list.

use std::fmt;

/// Media kind of a discovered device, derived from sysfs hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Hdd,
    Ssd,
    Nvme,
    SdMmc,
    Removable,
    Unknown,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Hdd => write!(f, "HDD"),
            MediaKind::Ssd => write!(f, "SSD"),
            MediaKind::Nvme => write!(f, "NVMe"),
            MediaKind::SdMmc => write!(f, "SD/MMC"),
            MediaKind::Removable => write!(f, "Removable"),
            MediaKind::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A block device found on the host.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub name: String,
    pub path: String,
    pub kind: MediaKind,
    pub size: u64,
}

impl DiscoveredDevice {
    /// Size formatted for display, e.g. `256.00 GB`.
    pub fn human_size(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;
        const TB: u64 = GB * 1024;

        if self.size >= TB {
            format!("{:.2} TB", self.size as f64 / TB as f64)
        } else if self.size >= GB {
            format!("{:.2} GB", self.size as f64 / GB as f64)
        } else if self.size >= MB {
            format!("{:.2} MB", self.size as f64 / MB as f64)
        } else if self.size >= KB {
            format!("{:.2} KB", self.size as f64 / KB as f64)
        } else {
            format!("{} B", self.size)
        }
    }
}

/// Lists the block devices attached to the host, sorted by name.
///
/// Virtual devices (loop, ram, device-mapper, zram, nbd) and zero-sized
/// entries are filtered out.
pub fn discover() -> Vec<DiscoveredDevice> {
    #[cfg(target_os = "linux")]
    return discover_linux();

    #[cfg(not(target_os = "linux"))]
    return Vec::new();
}

#[cfg(target_os = "linux")]
fn discover_linux() -> Vec<DiscoveredDevice> {
    use std::fs;
    use std::path::Path;

    let Ok(entries) = fs::read_dir(Path::new("/sys/block")) else {
        return Vec::new();
    };

    let mut devices = Vec::new();

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();

        if is_virtual(&name) {
            continue;
        }

        let Some(size) = read_sysfs_size(&entry.path()) else {
            continue;
        };
        if size == 0 {
            continue;
        }

        let kind = detect_media_kind(&name, &entry.path());

        devices.push(DiscoveredDevice {
            path: format!("/dev/{}", name),
            name,
            kind,
            size,
        });
    }

    devices.sort_by(|a, b| a.name.cmp(&b.name));
    devices
}

#[cfg(target_os = "linux")]
fn is_virtual(name: &str) -> bool {
    name.starts_with("loop")
        || name.starts_with("ram")
        || name.starts_with("dm-")
        || name.starts_with("zram")
        || name.starts_with("nbd")
}

// /sys/block/<dev>/size counts 512-byte sectors regardless of the logical
// block size.
#[cfg(target_os = "linux")]
fn read_sysfs_size(sys_path: &std::path::Path) -> Option<u64> {
    let raw = std::fs::read_to_string(sys_path.join("size")).ok()?;
    let sectors: u64 = raw.trim().parse().ok()?;
    Some(sectors * 512)
}

#[cfg(target_os = "linux")]
fn detect_media_kind(name: &str, sys_path: &std::path::Path) -> MediaKind {
    if name.starts_with("nvme") {
        return MediaKind::Nvme;
    }
    if name.starts_with("mmcblk") {
        return MediaKind::SdMmc;
    }

    if let Ok(removable) = std::fs::read_to_string(sys_path.join("removable")) {
        if removable.trim() == "1" {
            return MediaKind::Removable;
        }
    }

    if let Ok(rotational) = std::fs::read_to_string(sys_path.join("queue/rotational")) {
        match rotational.trim() {
            "1" => return MediaKind::Hdd,
            "0" => return MediaKind::Ssd,
            _ => {}
        }
    }

    MediaKind::Unknown
}
