//! SMBus register protocol engine.
//!
//! Turns raw bus transactions into register accesses on a [`RegisterDevice`].
//! A write transaction starts with a command byte selecting the register, a
//! restart (in either direction) continues from the current register.

use byteorder::{ByteOrder, LittleEndian};

use crate::bus::Request;
use crate::devices::{Device, Probe};
use crate::error::{SlaveException::*, SlaveResult};

/// Register access style.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Protocol {
    /// One byte per transaction.
    Byte,
    /// One little-endian word per transaction.
    Word,
    /// Non-standard: bytes stream until the master stops, auto-incrementing
    /// the register pointer after each one.
    ByteSeq,
    /// Non-standard: words stream until the master stops, auto-incrementing
    /// the register pointer after each one.
    WordSeq,
}

impl Protocol {
    /// Bytes moved per register access.
    pub fn width(self) -> usize {
        match self {
            Protocol::Byte | Protocol::ByteSeq => 1,
            Protocol::Word | Protocol::WordSeq => 2,
        }
    }

    pub fn is_sequential(self) -> bool {
        match self {
            Protocol::ByteSeq | Protocol::WordSeq => true,
            Protocol::Byte | Protocol::Word => false,
        }
    }
}

/// A device with a register file addressed by SMBus command bytes.
pub trait RegisterDevice: Device {
    fn protocol(&self) -> Protocol;
    /// Highest valid register number.
    fn max_reg(&self) -> u8;
    /// Read a register. Byte protocols use the low byte.
    fn readreg(&mut self, reg: u8) -> SlaveResult<u16>;
    /// Write a register. Byte protocols only ever pass values <= 0xff.
    fn writereg(&mut self, reg: u8, val: u16) -> SlaveResult<()>;
}

/// Drives a [`RegisterDevice`] from bus transactions.
#[derive(Debug)]
pub struct SmbusSlave<D> {
    regnr: u8,
    device: D,
}

impl<D: RegisterDevice> SmbusSlave<D> {
    pub fn new(device: D) -> SmbusSlave<D> {
        SmbusSlave { regnr: 0, device }
    }

    /// Current register pointer.
    pub fn regnr(&self) -> u8 {
        self.regnr
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Select a register. Out of range registers leave the pointer untouched.
    pub fn command(&mut self, command: u8) -> SlaveResult<()> {
        let max_reg = self.device.max_reg();
        if command > max_reg {
            return Err(UnsupportedRegister {
                reg: command,
                max_reg,
            });
        }
        self.regnr = command;
        Ok(())
    }

    fn seq_reg_inc(&mut self) {
        if self.device.protocol().is_sequential() {
            self.regnr = if self.regnr >= self.device.max_reg() {
                0
            } else {
                self.regnr + 1
            };
        }
    }

    fn trace_access(&self, op: &str, val: u16) {
        if log_enabled!(target: "SMBUS", log::Level::Trace) {
            let name = match self.device.probe(self.regnr) {
                Probe::Register(name) => name,
                Probe::Unmapped => "<unmapped>",
            };
            trace!(
                target: "SMBUS",
                "{}: {}({:#04x}:{}) {:#06x}",
                self.device.kind(),
                op,
                self.regnr,
                name,
                val
            );
        }
    }

    /// Master -> device. Returns `false` once the master has nothing left to
    /// send.
    fn recv(&mut self, req: &mut dyn Request) -> SlaveResult<bool> {
        let width = self.device.protocol().width();
        let mut buf = [0; 2];
        let got = req.read(&mut buf[..width], true);
        if got == 0 {
            return Ok(false);
        }
        if got != width {
            // half a word never reaches the register
            return Err(ProtocolFraming {
                expected: width,
                got,
            });
        }

        let val = match width {
            1 => buf[0] as u16,
            _ => LittleEndian::read_u16(&buf),
        };
        self.trace_access("w", val);
        self.device.writereg(self.regnr, val)?;
        self.seq_reg_inc();
        Ok(true)
    }

    /// Device -> master. Returns `false` once the master stops reading.
    fn send(&mut self, req: &mut dyn Request) -> SlaveResult<bool> {
        let protocol = self.device.protocol();
        let width = protocol.width();

        let val = self.device.readreg(self.regnr)?;
        self.trace_access("r", val);
        let mut buf = [0; 2];
        match width {
            1 => buf[0] = val as u8,
            _ => LittleEndian::write_u16(&mut buf, val),
        }

        let sent = req.write(&buf[..width]);
        if sent == 0 && protocol.is_sequential() {
            return Ok(false);
        }
        if sent != width {
            return Err(ProtocolFraming {
                expected: width,
                got: sent,
            });
        }
        self.seq_reg_inc();
        Ok(true)
    }

    /// Service one transaction.
    pub fn process(&mut self, req: &mut dyn Request) -> SlaveResult<()> {
        let protocol = self.device.protocol();

        if !req.is_read() {
            if !req.is_restart() {
                let mut cmd = [0; 1];
                if req.read(&mut cmd, false) == 0 {
                    // address-only write (e.g: a bus scan)
                    return Ok(());
                }
                trace!(target: "SMBUS", "{}: command {:#04x}", self.device.kind(), cmd[0]);
                if let Err(e) = self.command(cmd[0]) {
                    req.ack(false);
                    return Err(e);
                }
                req.ack(true);
            }

            if protocol.is_sequential() {
                while self.recv(req)? {}
            } else {
                // a command-only write just sets up a subsequent read
                self.recv(req)?;
            }
            Ok(())
        } else if req.is_restart() {
            if protocol.is_sequential() {
                while self.send(req)? {}
            } else {
                self.send(req)?;
            }
            Ok(())
        } else {
            Err(Anomaly)
        }
    }
}
