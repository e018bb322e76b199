use std::io;
use thiserror::Error;

/// Errors that can occur when opening or reading a storage device.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unsupported target: {0} is neither a regular file nor a block device")]
    UnsupportedTarget(String),

    #[error("device is not open")]
    NotOpen,

    #[error("size query failed: {0}")]
    SizeQuery(io::Error),

    #[error("read out of bounds: offset {offset} + length {length} exceeds device size {size}")]
    OutOfBounds {
        offset: u64,
        length: usize,
        size: u64,
    },

    #[error("short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
