//! Interfaces to the hardware the emulated chips sit on top of.
//!
//! Devices only ever talk to hardware through these traits, so the same chip
//! models run against real pins or the [simulated](crate::sim) ones.

use std::fmt::Debug;

mod clock;

pub use clock::{Clock, ClockError, DateTime};

/// Input pull resistor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
}

/// Output driver configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DriveMode {
    PushPull,
    /// Only ever drives low. High is left to an external pull-up.
    OpenDrain,
}

/// A pin claimed for direct level access. Dropping the handle releases the
/// pin.
pub trait DigitalIo: Debug {
    fn switch_to_input(&mut self, pull: Option<Pull>);
    fn switch_to_output(&mut self, value: bool, drive_mode: DriveMode);
    fn set_drive_mode(&mut self, drive_mode: DriveMode);
    /// Current level on the pin.
    fn value(&mut self) -> bool;
    /// Set the output level. Only meaningful when the pin is an output.
    fn set_value(&mut self, value: bool);
}

/// A pin claimed for pulse capture. Each recorded pulse is the width (in
/// microseconds) between two consecutive edges. Dropping the handle releases
/// the pin.
#[allow(clippy::len_without_is_empty)]
pub trait PulseIn: Debug {
    /// Number of queued pulses.
    fn len(&self) -> usize;
    /// Queue capacity.
    fn maxlen(&self) -> usize;
    /// Pop the oldest queued pulse.
    fn popleft(&mut self) -> Option<u16>;
}

/// A physical pin which can be claimed either for level access, or for
/// pulse capture.
///
/// Implementations are not required to support both claims at once; callers
/// must drop one handle before asking for the other.
pub trait PinProvider: Debug {
    fn digital_io(&mut self) -> Box<dyn DigitalIo>;
    fn pulse_in(&mut self, maxlen: usize) -> Box<dyn PulseIn>;
}

/// An analog input. Samples are scaled to the full 16-bit range, regardless
/// of the underlying converter's resolution.
pub trait AnalogIn: Debug {
    fn value(&mut self) -> u16;
}
