//! Byte-addressable storage backing EEPROM contents and RTC NVRAM.

use std::fmt::Debug;
use std::io::{Read, Seek, Write};

pub mod backend;

/// Abstraction over different byte store backends.
///
/// Stores have a fixed size. Reads past the end return no data, and writes
/// are truncated at the end of the store.
#[allow(clippy::len_without_is_empty)]
pub trait ByteStore: Debug + Read + Write + Seek {
    /// Return the length (in bytes) of the underlying medium.
    fn len(&self) -> u64;
}
