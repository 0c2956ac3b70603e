//! The Device Prelude.
//!
//! The purpose of this module is to alleviate imports of common device traits
//! and types by adding a glob import to the top of device modules:

pub use bit_field::BitField;
pub use log::Level::*;

pub use crate::bus::Request;
pub use crate::devices::{Device, Probe};
pub use crate::error::{
    BuildError,
    SlaveException::{self, *},
    SlaveResult,
};
pub use crate::smbus::{Protocol, RegisterDevice};

/// BCD -> binary
pub fn bcd2dec(x: u8) -> u8 {
    (((x >> 4) & 0x0f) * 10) + (x & 0xf)
}

/// binary -> BCD
pub fn dec2bcd(x: u8) -> u8 {
    ((x / 10) << 4) | (x % 10)
}
