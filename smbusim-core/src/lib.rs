//! Software emulation of SMBus / I2C slave peripherals.
//!
//! A [`bus::SlaveBus`] routes master transactions to emulated chips, which
//! sit on top of the abstract hardware in [`hw`]. The [`sim`] module provides
//! in-process implementations of that hardware.

#[macro_use]
extern crate log;
#[macro_use]
extern crate static_assertions;

pub mod block;
pub mod bus;
pub mod devices;
pub mod error;
pub mod hw;
pub mod signal;
pub mod sim;
pub mod smbus;
