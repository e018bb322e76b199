//! Storage device access.
//!
//! [`StorageDevice`] unifies a regular file (disk image) and a raw block
//! device behind one read-only interface: a total byte size and positioned
//! reads at arbitrary offsets. Higher-level readers consume it through the
//! [`BlockRead`] trait.

use crate::error::{DeviceError, Result};
use crate::geometry;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A source of raw bytes addressed by absolute offset.
///
/// This is the seam between the storage layer and whatever interprets the
/// bytes (a filesystem parser, a partition-table decoder, a carver). The
/// source defines no format of its own.
pub trait BlockRead: Send + Sync {
    /// Reads exactly `buf.len()` bytes starting at byte `offset`.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Total addressable size in bytes.
    fn size(&self) -> u64;
}

/// A read-only handle to a regular file or raw block device.
///
/// The device starts unopened; [`open`](StorageDevice::open) acquires the OS
/// handle and determines the total size, [`close`](StorageDevice::close)
/// releases it. Dropping an open device releases the handle as well.
///
/// Reads are positioned (`pread`-family), so no shared cursor exists and
/// concurrent [`read_at`](StorageDevice::read_at) calls on the same opened
/// device are safe. `open`/`close` take `&mut self`; lifecycle changes are
/// serialized by the borrow checker.
pub struct StorageDevice {
    file: Option<File>,
    path: Option<PathBuf>,
    size: u64,
}

impl StorageDevice {
    /// Creates a device in the unopened state.
    pub fn new() -> Self {
        Self {
            file: None,
            path: None,
            size: 0,
        }
    }

    /// Opens `path` directly, returning the opened device.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut device = Self::new();
        device.open(path)?;
        Ok(device)
    }

    /// Opens `path` read-only and determines its total size.
    ///
    /// A regular file reports its metadata length; a block device reports
    /// the size computed from the platform geometry query. Anything else
    /// (directory, socket, fifo, character device) is rejected. A device
    /// that is already open is closed first, and on failure the instance is
    /// left unopened with no handle retained.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.close();

        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => DeviceError::NotFound(path.display().to_string()),
                io::ErrorKind::PermissionDenied => {
                    DeviceError::PermissionDenied(path.display().to_string())
                }
                _ => DeviceError::Io(e),
            })?;

        let size = classify_and_size(&file, path)?;
        advise_random_access(&file);

        debug!("device {} opened, size is {} bytes", path.display(), size);

        self.file = Some(file);
        self.path = Some(path.to_path_buf());
        self.size = size;
        Ok(())
    }

    /// Releases the OS handle and returns to the unopened state.
    ///
    /// Idempotent: closing a device that is not open is a no-op.
    pub fn close(&mut self) {
        self.file = None;
        self.path = None;
        self.size = 0;
    }

    /// Reads exactly `buf.len()` bytes starting at byte `offset`.
    ///
    /// All-or-nothing: the call succeeds only if every requested byte was
    /// transferred. A request past the end of the device fails with
    /// [`DeviceError::OutOfBounds`]; a device that delivers fewer bytes than
    /// its reported size (e.g. truncated underneath the handle) fails with
    /// [`DeviceError::ShortRead`] carrying the transferred count. On failure
    /// the contents of `buf` are unspecified.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let file = self.file.as_ref().ok_or(DeviceError::NotOpen)?;

        let length = buf.len();
        match offset.checked_add(length as u64) {
            Some(end) if end <= self.size => {}
            _ => {
                return Err(DeviceError::OutOfBounds {
                    offset,
                    length,
                    size: self.size,
                });
            }
        }

        let mut filled = 0;
        while filled < length {
            match positioned_read(file, offset + filled as u64, &mut buf[filled..]) {
                Ok(0) => {
                    return Err(DeviceError::ShortRead {
                        offset,
                        expected: length,
                        actual: filled,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(DeviceError::Io(e)),
            }
        }
        Ok(())
    }

    /// Total addressable size in bytes; 0 while unopened.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Path of the currently open target, if any.
    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Default for StorageDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRead for StorageDevice {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        StorageDevice::read_at(self, offset, buf)
    }

    fn size(&self) -> u64 {
        StorageDevice::size(self)
    }
}

#[cfg(unix)]
fn classify_and_size(file: &File, path: &Path) -> Result<u64> {
    use std::os::unix::fs::FileTypeExt;

    let metadata = file.metadata()?;
    let file_type = metadata.file_type();

    if file_type.is_file() {
        Ok(metadata.len())
    } else if file_type.is_block_device() {
        let geom = geometry::query(file).map_err(DeviceError::SizeQuery)?;
        Ok(geom.total_bytes())
    } else {
        Err(DeviceError::UnsupportedTarget(path.display().to_string()))
    }
}

#[cfg(windows)]
fn classify_and_size(file: &File, path: &Path) -> Result<u64> {
    // Raw device paths (\\.\PhysicalDrive0, \\.\C:) carry no meaningful
    // filesystem metadata; everything else must be a regular file.
    if is_device_path(path) {
        let geom = geometry::query(file).map_err(DeviceError::SizeQuery)?;
        return Ok(geom.total_bytes());
    }

    let metadata = file.metadata()?;
    if metadata.is_file() {
        Ok(metadata.len())
    } else {
        Err(DeviceError::UnsupportedTarget(path.display().to_string()))
    }
}

#[cfg(windows)]
fn is_device_path(path: &Path) -> bool {
    path.to_str().is_some_and(|p| p.starts_with("\\\\.\\"))
}

#[cfg(unix)]
fn positioned_read(file: &File, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn positioned_read(file: &File, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(target_os = "linux")]
fn advise_random_access(file: &File) {
    use rustix::fs::{Advice, fadvise};

    let _ = fadvise(file, 0, None, Advice::Random);
}

#[cfg(not(target_os = "linux"))]
fn advise_random_access(_file: &File) {}
