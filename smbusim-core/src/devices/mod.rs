use crate::bus::Request;
use crate::error::SlaveResult;
use crate::smbus::SmbusSlave;

pub mod prelude;

pub mod ads1015;
pub mod at24;
pub mod ds1307;
pub mod mcp23008;

pub use ads1015::Ads1015;
pub use at24::At24;
pub use ds1307::Ds1307;
pub use mcp23008::Mcp23008;

/// Common trait implemented by all emulated chips.
pub trait Device {
    /// The name of the chip.
    fn kind(&self) -> &'static str;

    /// A descriptive label for a particular instance of the chip (if
    /// applicable).
    fn label(&self) -> Option<&'static str> {
        None
    }

    /// Query what register lives at the given register number.
    fn probe(&self, reg: u8) -> Probe;
}

/// Register description.
#[derive(Debug)]
pub enum Probe {
    /// Named register.
    Register(&'static str),
    /// Nothing lives at this register number.
    Unmapped,
}

impl std::fmt::Display for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Probe::Register(name) => write!(f, "{}", name),
            Probe::Unmapped => write!(f, "<unmapped>"),
        }
    }
}

/// One of the supported chips, ready to sit on a [`SlaveBus`].
///
/// [`SlaveBus`]: crate::bus::SlaveBus
#[derive(Debug)]
pub enum SlaveDevice {
    At24(At24),
    Ds1307(SmbusSlave<Ds1307>),
    Ads1015(SmbusSlave<Ads1015>),
    Mcp23008(SmbusSlave<Mcp23008>),
}

macro_rules! dispatch {
    ($self:ident, $d:ident => $e:expr) => {
        match $self {
            SlaveDevice::At24($d) => $e,
            SlaveDevice::Ds1307($d) => $e,
            SlaveDevice::Ads1015($d) => $e,
            SlaveDevice::Mcp23008($d) => $e,
        }
    };
}

impl SlaveDevice {
    /// Service a single transaction.
    pub fn process(&mut self, req: &mut dyn Request) -> SlaveResult<()> {
        dispatch!(self, d => d.process(req))
    }

    /// Sample inputs for pending events. Only the GPIO expander has any.
    pub fn check_events(&mut self) {
        if let SlaveDevice::Mcp23008(d) = self {
            d.device_mut().check_events()
        }
    }
}

impl Device for SlaveDevice {
    fn kind(&self) -> &'static str {
        match self {
            SlaveDevice::At24(d) => d.kind(),
            SlaveDevice::Ds1307(d) => d.device().kind(),
            SlaveDevice::Ads1015(d) => d.device().kind(),
            SlaveDevice::Mcp23008(d) => d.device().kind(),
        }
    }

    fn label(&self) -> Option<&'static str> {
        match self {
            SlaveDevice::At24(d) => d.label(),
            SlaveDevice::Ds1307(d) => d.device().label(),
            SlaveDevice::Ads1015(d) => d.device().label(),
            SlaveDevice::Mcp23008(d) => d.device().label(),
        }
    }

    fn probe(&self, reg: u8) -> Probe {
        match self {
            SlaveDevice::At24(d) => d.probe(reg),
            SlaveDevice::Ds1307(d) => d.device().probe(reg),
            SlaveDevice::Ads1015(d) => d.device().probe(reg),
            SlaveDevice::Mcp23008(d) => d.device().probe(reg),
        }
    }
}

impl From<At24> for SlaveDevice {
    fn from(d: At24) -> SlaveDevice {
        SlaveDevice::At24(d)
    }
}

impl From<Ds1307> for SlaveDevice {
    fn from(d: Ds1307) -> SlaveDevice {
        SlaveDevice::Ds1307(SmbusSlave::new(d))
    }
}

impl From<Ads1015> for SlaveDevice {
    fn from(d: Ads1015) -> SlaveDevice {
        SlaveDevice::Ads1015(SmbusSlave::new(d))
    }
}

impl From<Mcp23008> for SlaveDevice {
    fn from(d: Mcp23008) -> SlaveDevice {
        SlaveDevice::Mcp23008(SmbusSlave::new(d))
    }
}
