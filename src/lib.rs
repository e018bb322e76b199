//! Read-only, block-addressable access to raw disks and disk image files.
//!
//! [`StorageDevice`] opens a regular file or a raw block device behind one
//! interface: a total byte size and positioned reads at arbitrary offsets.
//! Higher layers (filesystem parsers, carvers) consume it through
//! [`BlockRead`].

pub mod device;
pub mod discovery;
mod error;
pub mod geometry;

pub use device::{BlockRead, StorageDevice};
pub use discovery::{DiscoveredDevice, MediaKind, discover};
pub use error::{DeviceError, Result};
pub use geometry::DeviceGeometry;
