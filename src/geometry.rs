//! Platform-specific block device geometry queries.
//!
//! Exactly one query mechanism is compiled in per target platform; the rest
//! of the crate is platform-agnostic and only sees [`DeviceGeometry`].

use std::fs::File;
use std::io;

/// Geometry of a block device as reported by the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceGeometry {
    /// Logical block size in bytes.
    pub block_size: u32,
    /// Number of addressable blocks.
    pub block_count: u64,
}

impl DeviceGeometry {
    /// Total addressable size in bytes.
    #[inline]
    pub fn total_bytes(&self) -> u64 {
        self.block_count * u64::from(self.block_size)
    }
}

#[cfg(target_os = "linux")]
pub fn query(file: &File) -> io::Result<DeviceGeometry> {
    use std::os::unix::io::AsRawFd;

    const BLKSSZGET: libc::c_ulong = 0x1268;
    const BLKGETSIZE64: libc::c_ulong = 0x80081272;

    let fd = file.as_raw_fd();

    let mut block_size: libc::c_int = 0;
    if unsafe { libc::ioctl(fd, BLKSSZGET, &mut block_size) } == -1 {
        return Err(io::Error::last_os_error());
    }

    let mut bytes: u64 = 0;
    if unsafe { libc::ioctl(fd, BLKGETSIZE64, &mut bytes) } == -1 {
        return Err(io::Error::last_os_error());
    }

    if block_size <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "device reported a zero block size",
        ));
    }

    Ok(DeviceGeometry {
        block_size: block_size as u32,
        block_count: bytes / block_size as u64,
    })
}

#[cfg(target_os = "macos")]
pub fn query(file: &File) -> io::Result<DeviceGeometry> {
    use std::os::unix::io::AsRawFd;

    const DKIOCGETBLOCKSIZE: libc::c_ulong = 0x40046418;
    const DKIOCGETBLOCKCOUNT: libc::c_ulong = 0x40086419;

    let fd = file.as_raw_fd();

    let mut block_size: u32 = 0;
    if unsafe { libc::ioctl(fd, DKIOCGETBLOCKSIZE, &mut block_size) } == -1 {
        return Err(io::Error::last_os_error());
    }

    let mut block_count: u64 = 0;
    if unsafe { libc::ioctl(fd, DKIOCGETBLOCKCOUNT, &mut block_count) } == -1 {
        return Err(io::Error::last_os_error());
    }

    if block_size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "device reported a zero block size",
        ));
    }

    Ok(DeviceGeometry {
        block_size,
        block_count,
    })
}

#[cfg(windows)]
pub fn query(file: &File) -> io::Result<DeviceGeometry> {
    use std::mem;
    use std::os::windows::io::AsRawHandle;
    use windows_sys::Win32::System::IO::DeviceIoControl;
    use windows_sys::Win32::System::Ioctl::{
        DISK_GEOMETRY, GET_LENGTH_INFORMATION, IOCTL_DISK_GET_DRIVE_GEOMETRY,
        IOCTL_DISK_GET_LENGTH_INFO,
    };

    let handle = file.as_raw_handle();
    let mut returned = 0u32;

    let mut length: GET_LENGTH_INFORMATION = unsafe { mem::zeroed() };
    let ok = unsafe {
        DeviceIoControl(
            handle,
            IOCTL_DISK_GET_LENGTH_INFO,
            std::ptr::null(),
            0,
            &mut length as *mut _ as *mut _,
            mem::size_of::<GET_LENGTH_INFORMATION>() as u32,
            &mut returned,
            std::ptr::null_mut(),
        )
    };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }

    let mut geometry: DISK_GEOMETRY = unsafe { mem::zeroed() };
    let ok = unsafe {
        DeviceIoControl(
            handle,
            IOCTL_DISK_GET_DRIVE_GEOMETRY,
            std::ptr::null(),
            0,
            &mut geometry as *mut _ as *mut _,
            mem::size_of::<DISK_GEOMETRY>() as u32,
            &mut returned,
            std::ptr::null_mut(),
        )
    };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }

    let block_size = geometry.BytesPerSector;
    if block_size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "device reported a zero block size",
        ));
    }

    Ok(DeviceGeometry {
        block_size,
        block_count: length.Length as u64 / u64::from(block_size),
    })
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
pub fn query(_file: &File) -> io::Result<DeviceGeometry> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "block device geometry queries are not supported on this platform",
    ))
}
