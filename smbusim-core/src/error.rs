use thiserror::Error;

use crate::bus::Request;
use crate::hw::ClockError;

pub type SlaveResult<T> = Result<T, SlaveException>;
pub type FatalSlaveResult<T> = Result<T, FatalSlaveException>;

/// Exception raised while servicing a bus transaction.
///
/// Every variant is transaction-local: the transaction that raised it is
/// abandoned, and the device is left ready for the next one.
#[derive(Debug, Error)]
pub enum SlaveException {
    // -- Framing -- //
    /// The master moved fewer bytes than the current access needs.
    #[error("short transfer ({got} of {expected} bytes)")]
    ProtocolFraming { expected: usize, got: usize },
    /// A read that isn't preceded by a write (i.e: not a restart). Register
    /// devices have no pointer to read from in that case.
    #[error("read without restart")]
    Anomaly,

    // -- Master Access Violations -- //
    /// Command byte selects a register past the end of the register file.
    #[error("register {reg:#04x} out of range (max_reg {max_reg:#04x})")]
    UnsupportedRegister { reg: u8, max_reg: u8 },
    /// Memory address past the end of the backing store.
    #[error("address {addr:#04x} out of range ({size} byte store)")]
    InvalidAddress { addr: u8, size: u64 },
    /// Write that requests a chip feature the emulation doesn't provide.
    #[error("{0} is not implemented")]
    UnsupportedFeature(&'static str),

    // -- Backend Errors -- //
    /// The clock rejected a snapshot (e.g: a year it can't represent).
    #[error(transparent)]
    Clock(#[from] ClockError),
    /// The byte store failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Context around a SlaveException.
#[derive(Debug, Clone)]
pub struct TxnCtx {
    pub address: u8,
    pub is_read: bool,
    pub is_restart: bool,
    pub in_device: &'static str,
}

impl TxnCtx {
    pub fn new(req: &dyn Request, in_device: &'static str) -> TxnCtx {
        TxnCtx {
            address: req.address(),
            is_read: req.is_read(),
            is_restart: req.is_restart(),
            in_device,
        }
    }
}

impl std::fmt::Display for TxnCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dir = match (self.is_read, self.is_restart) {
            (false, false) => "write",
            (false, true) => "restart-write",
            (true, true) => "restart-read",
            (true, false) => "read",
        };
        write!(f, "[addr {:#04x}][{}][{}]", self.address, dir, self.in_device)
    }
}

/// An unrecoverable slave exception. The backing hardware is in an unknown
/// state, and the bus should stop serving requests.
#[derive(Debug, Error)]
#[error("{context} {reason}")]
pub struct FatalSlaveException {
    pub context: TxnCtx,
    pub reason: SlaveException,
}

impl SlaveException {
    /// Log level used when the exception is resolved.
    pub fn severity(&self) -> log::Level {
        use SlaveException::*;
        match self {
            // a master cutting a transfer short is business as usual
            ProtocolFraming { .. } => log::Level::Debug,
            // drivers probe register ranges
            UnsupportedRegister { .. } | InvalidAddress { .. } => log::Level::Info,
            Anomaly | Clock(_) => log::Level::Warn,
            UnsupportedFeature(_) | Io(_) => log::Level::Error,
        }
    }

    /// Handle the exception, potentially returning a FatalSlaveException.
    pub fn resolve(self, target: &'static str, ctx: TxnCtx) -> FatalSlaveResult<()> {
        if let SlaveException::Io(_) = self {
            return Err(FatalSlaveException {
                context: ctx,
                reason: self,
            });
        }

        let level = self.severity();
        if log_enabled!(target: target, level) {
            log!(target: target, level, "{} {}", ctx, self);
        }
        Ok(())
    }
}

/// Errors encountered while assembling devices / the bus.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("too many pins ({0}, max 8)")]
    TooManyPins(usize),
    #[error("backing store too large ({0} bytes, max 256)")]
    StoreTooLarge(u64),
    #[error("{0:#04x} is not a 7-bit i2c address")]
    InvalidAddress(u8),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
