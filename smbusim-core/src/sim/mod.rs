//! In-process stand-ins for the hardware behind [`crate::hw`].
//!
//! Every simulated part is a cheaply cloneable handle. One clone is handed to
//! the emulated chip, while the host (a test, or a replay script) keeps
//! another to poke at the other end of the wire.

mod analog;
mod clock;
mod pin;

pub use analog::SimAnalog;
pub use clock::SimClock;
pub use pin::SimPin;
