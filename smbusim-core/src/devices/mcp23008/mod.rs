use crate::devices::prelude::*;

use std::convert::TryFrom;

use num_enum::TryFromPrimitive;

use crate::hw::{DigitalIo, DriveMode, PinProvider, Pull};

mod pin;

pub use pin::{PinMode, VirtualPin, DEFAULT_PULSE_CAPACITY};

const NUM_PINS: usize = 8;
const MAX_REG: u8 = 0x0a;

#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Reg {
    IODIR__ = 0x00,
    IPOL___ = 0x01,
    GPINTEN = 0x02,
    DEFVAL_ = 0x03,
    INTCON_ = 0x04,
    IOCON__ = 0x05,
    GPPU___ = 0x06,
    INTF___ = 0x07,
    INTCAP_ = 0x08,
    GPIO___ = 0x09,
    OLAT___ = 0x0a,
}

const_assert_eq!(Reg::OLAT___ as u8, MAX_REG);

/// IOCON bits which can be set at all.
const IOCON_MASK: u8 = 0b0011_1110;
const IOCON_SEQOP: usize = 5;
const IOCON_ODR: usize = 2;
const IOCON_INTPOL: usize = 1;

/// MCP23008 - 8-bit I/O expander.
///
/// Pins configured for interrupt-on-change are sampled with
/// [`Mcp23008::check_events`], which must be called between transactions.
#[derive(Debug)]
pub struct Mcp23008 {
    pins: Vec<VirtualPin>,
    int_pin: Option<Box<dyn DigitalIo>>,
    regs: [u8; MAX_REG as usize + 1],
}

impl Mcp23008 {
    /// Create a new expander. `pins[n]` backs GPn, and any pins past the end of
    /// the list (or set to `None`) aren't connected.
    pub fn new(pins: Vec<Option<Box<dyn PinProvider>>>) -> Result<Mcp23008, BuildError> {
        if pins.is_empty() {
            return Err(BuildError::Empty("pin list"));
        }
        if pins.len() > NUM_PINS {
            return Err(BuildError::TooManyPins(pins.len()));
        }

        let mut providers = pins.into_iter();
        let pins = (0..NUM_PINS)
            .map(|i| VirtualPin::new(i, providers.next().flatten()))
            .collect();

        let mut regs = [0; MAX_REG as usize + 1];
        regs[Reg::IODIR__ as usize] = 0xff;

        Ok(Mcp23008 {
            pins,
            int_pin: None,
            regs,
        })
    }

    /// Attach the (shared) interrupt output line. The line is driven to its
    /// inactive level straight away.
    pub fn with_int_pin(mut self, mut int_pin: Box<dyn DigitalIo>) -> Mcp23008 {
        int_pin.switch_to_output(!self.int_active_level(), self.int_drive_mode());
        self.int_pin = Some(int_pin);
        self
    }

    /// Set the pulse queue capacity of interrupt-on-change pins.
    pub fn with_pulse_capacity(mut self, capacity: usize) -> Mcp23008 {
        for pin in self.pins.iter_mut() {
            pin.set_pulse_capacity(capacity);
        }
        self
    }

    pub fn pin(&self, index: usize) -> Option<&VirtualPin> {
        self.pins.get(index)
    }

    /// Raw register contents (GPIO reads are computed on the fly, and are not
    /// reflected here).
    pub fn reg(&self, reg: Reg) -> u8 {
        self.regs[reg as usize]
    }

    fn int_active_level(&self) -> bool {
        self.regs[Reg::IOCON__ as usize].get_bit(IOCON_INTPOL)
    }

    fn int_drive_mode(&self) -> DriveMode {
        if self.regs[Reg::IOCON__ as usize].get_bit(IOCON_ODR) {
            DriveMode::OpenDrain
        } else {
            DriveMode::PushPull
        }
    }

    /// Drive the interrupt line to match the latched interrupt state.
    fn drive_int_line(&mut self) {
        let active = self.int_active_level();
        let level = if self.regs[Reg::INTF___ as usize] != 0 {
            active
        } else {
            !active
        };
        if let Some(ref mut int_pin) = self.int_pin {
            int_pin.set_value(level);
        }
    }

    fn set_interrupt(&mut self) {
        debug!(
            target: "MCP23008",
            "interrupt: INTF={:#010b} INTCAP={:#010b}",
            self.regs[Reg::INTF___ as usize],
            self.regs[Reg::INTCAP_ as usize]
        );
        self.drive_int_line();
    }

    fn clear_interrupt(&mut self) {
        if self.regs[Reg::INTF___ as usize] != 0 {
            self.regs[Reg::INTF___ as usize] = 0;
            debug!(target: "MCP23008", "interrupt cleared");
            self.drive_int_line();
        }
    }

    /// Sample interrupt-on-change pins for edges seen since the last call.
    ///
    /// The first edge(s) after the interrupt was cleared capture the pin levels
    /// into INTCAP, and assert the interrupt line.
    pub fn check_events(&mut self) {
        let prev = self.regs[Reg::INTF___ as usize];
        let mut pending = 0u8;
        for (i, pin) in self.pins.iter_mut().enumerate() {
            pending.set_bit(i, pin.poll());
        }
        self.regs[Reg::INTF___ as usize] = prev | pending;

        if prev == 0 && pending != 0 {
            let mut val = 0u8;
            for (i, pin) in self.pins.iter_mut().enumerate() {
                val.set_bit(i, pin.value());
            }
            // a pin that bounced back before the poll still has its flag set
            val |= pending;
            self.regs[Reg::INTCAP_ as usize] = val;
            self.set_interrupt();
        }
    }

    /// Reconfigure pins whose IODIR, GPINTEN or GPPU bits changed.
    fn setpinmode(&mut self, changed: u8) {
        let iodir = self.regs[Reg::IODIR__ as usize];
        let gpinten = self.regs[Reg::GPINTEN as usize];
        let gppu = self.regs[Reg::GPPU___ as usize];
        let olat = self.regs[Reg::OLAT___ as usize];

        for (i, pin) in self.pins.iter_mut().enumerate() {
            if !changed.get_bit(i) {
                continue;
            }
            if iodir.get_bit(i) {
                let pull = if gppu.get_bit(i) { Some(Pull::Up) } else { None };
                pin.switch_to_input(pull, gpinten.get_bit(i));
            } else {
                pin.switch_to_output(olat.get_bit(i));
            }
        }
    }

    fn read_gpio(&mut self) -> u8 {
        let iodir = self.regs[Reg::IODIR__ as usize];
        let olat = self.regs[Reg::OLAT___ as usize];

        let mut val = 0u8;
        for (i, pin) in self.pins.iter_mut().enumerate() {
            let level = if iodir.get_bit(i) {
                pin.value()
            } else {
                olat.get_bit(i)
            };
            val.set_bit(i, level);
        }
        val
    }

    fn write_olat(&mut self, val: u8) {
        let iodir = self.regs[Reg::IODIR__ as usize];
        let changed = self.regs[Reg::OLAT___ as usize] ^ val;
        self.regs[Reg::OLAT___ as usize] = val;

        for (i, pin) in self.pins.iter_mut().enumerate() {
            // inputs are never driven
            if changed.get_bit(i) && !iodir.get_bit(i) {
                pin.set_value(val.get_bit(i));
            }
        }
    }

    fn write_iocon(&mut self, val: u8) -> SlaveResult<()> {
        let val = val & IOCON_MASK;
        if val.get_bit(IOCON_SEQOP) {
            // sequential mode is all the Linux driver uses
            return Err(UnsupportedFeature("IOCON.SEQOP"));
        }

        let changed = self.regs[Reg::IOCON__ as usize] ^ val;
        self.regs[Reg::IOCON__ as usize] = val;

        if changed.get_bit(IOCON_ODR) {
            let drive_mode = self.int_drive_mode();
            if let Some(ref mut int_pin) = self.int_pin {
                int_pin.set_drive_mode(drive_mode);
            }
        }
        if changed.get_bit(IOCON_INTPOL) {
            self.drive_int_line();
        }
        Ok(())
    }
}

impl Device for Mcp23008 {
    fn kind(&self) -> &'static str {
        "MCP23008"
    }

    fn probe(&self, reg: u8) -> Probe {
        use Reg::*;
        match Reg::try_from(reg) {
            Ok(reg) => Probe::Register(match reg {
                IODIR__ => "IODIR",
                IPOL___ => "IPOL",
                GPINTEN => "GPINTEN",
                DEFVAL_ => "DEFVAL",
                INTCON_ => "INTCON",
                IOCON__ => "IOCON",
                GPPU___ => "GPPU",
                INTF___ => "INTF",
                INTCAP_ => "INTCAP",
                GPIO___ => "GPIO",
                OLAT___ => "OLAT",
            }),
            Err(_) => Probe::Unmapped,
        }
    }
}

impl RegisterDevice for Mcp23008 {
    fn protocol(&self) -> Protocol {
        Protocol::ByteSeq
    }

    fn max_reg(&self) -> u8 {
        MAX_REG
    }

    fn readreg(&mut self, reg: u8) -> SlaveResult<u16> {
        use Reg::*;
        let reg = Reg::try_from(reg).map_err(|_| UnsupportedRegister {
            reg,
            max_reg: MAX_REG,
        })?;

        let val = match reg {
            GPIO___ => {
                let val = self.read_gpio();
                self.clear_interrupt();
                val
            }
            INTCAP_ => {
                let val = self.regs[INTCAP_ as usize];
                self.clear_interrupt();
                val
            }
            _ => self.regs[reg as usize],
        };
        Ok(val as u16)
    }

    fn writereg(&mut self, reg: u8, val: u16) -> SlaveResult<()> {
        use Reg::*;
        let reg = Reg::try_from(reg).map_err(|_| UnsupportedRegister {
            reg,
            max_reg: MAX_REG,
        })?;
        let val = val as u8;
        let changed = self.regs[reg as usize] ^ val;

        match reg {
            IODIR__ | GPINTEN | GPPU___ => {
                self.regs[reg as usize] = val;
                self.setpinmode(changed);
            }
            IPOL___ => {
                if val != 0 {
                    // not used by the Linux driver
                    return Err(UnsupportedFeature("IPOL"));
                }
            }
            DEFVAL_ | INTCON_ => self.regs[reg as usize] = val,
            IOCON__ => self.write_iocon(val)?,
            INTF___ | INTCAP_ => {
                trace!(target: "MCP23008", "ignoring write to read-only {:?}", reg);
            }
            GPIO___ | OLAT___ => self.write_olat(val),
        }
        Ok(())
    }
}
