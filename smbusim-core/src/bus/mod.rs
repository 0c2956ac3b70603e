//! Slave-side bus plumbing.

use crate::devices::{Device, SlaveDevice};
use crate::error::{BuildError, FatalSlaveResult, TxnCtx};

mod scripted;

pub use scripted::ScriptedRequest;

/// One master-initiated transaction, from address match through STOP or
/// repeated start.
///
/// Reads and writes are from the slave's point of view: `read` consumes bytes
/// the master sends, `write` hands bytes to a master that is reading.
pub trait Request {
    /// The (7-bit) address the master selected.
    fn address(&self) -> u8;
    /// Master is reading from the slave.
    fn is_read(&self) -> bool;
    /// Transaction was started by a repeated start.
    fn is_restart(&self) -> bool;

    /// Read up to `buf.len()` bytes from the master, returning how many were
    /// read. Comes up short when the master stops sending.
    ///
    /// Received bytes are ACKed, except when `ack` is false, in which case
    /// the decision for the final byte is deferred to [`Request::ack`].
    fn read(&mut self, buf: &mut [u8], ack: bool) -> usize;

    /// Send bytes to the master, returning how many it accepted.
    fn write(&mut self, data: &[u8]) -> usize;

    /// ACK/NAK a byte read with `ack = false`.
    fn ack(&mut self, ack: bool);
}

/// Number of 7-bit addresses.
const NUM_ADDRESSES: usize = 128;

/// Routes transactions to the devices registered at each address.
pub struct SlaveBus {
    devices: Vec<Option<SlaveDevice>>,
}

impl std::fmt::Debug for SlaveBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let addrs = self
            .devices
            .iter()
            .enumerate()
            .filter_map(|(addr, d)| d.as_ref().map(|d| (addr, d.kind())))
            .collect::<Vec<_>>();
        f.debug_struct("SlaveBus").field("devices", &addrs).finish()
    }
}

impl Default for SlaveBus {
    fn default() -> SlaveBus {
        SlaveBus::new()
    }
}

impl SlaveBus {
    pub fn new() -> SlaveBus {
        SlaveBus {
            devices: std::iter::repeat_with(|| None)
                .take(NUM_ADDRESSES)
                .collect(),
        }
    }

    /// Register a new device, placing it at the given address. Returns any
    /// previously registered device at that address.
    pub fn register_device(
        &mut self,
        addr: u8,
        device: impl Into<SlaveDevice>,
    ) -> Result<Option<SlaveDevice>, BuildError> {
        let slot = self
            .devices
            .get_mut(addr as usize)
            .ok_or(BuildError::InvalidAddress(addr))?;
        Ok(std::mem::replace(slot, Some(device.into())))
    }

    pub fn device(&self, addr: u8) -> Option<&SlaveDevice> {
        self.devices.get(addr as usize)?.as_ref()
    }

    pub fn device_mut(&mut self, addr: u8) -> Option<&mut SlaveDevice> {
        self.devices.get_mut(addr as usize)?.as_mut()
    }

    /// Service a single transaction.
    ///
    /// Transaction-local errors are logged and swallowed, leaving the bus ready
    /// for the next transaction. Only backing store failures are returned.
    pub fn process(&mut self, req: &mut dyn Request) -> FatalSlaveResult<()> {
        let addr = req.address();
        let device = match self.device_mut(addr) {
            Some(device) => device,
            None => {
                trace!(target: "BUS", "no device at {:#04x}", addr);
                return Ok(());
            }
        };

        let ctx = TxnCtx::new(&*req, device.label().unwrap_or_else(|| device.kind()));
        match device.process(req) {
            Ok(()) => Ok(()),
            Err(e) => e.resolve(device.kind(), ctx),
        }
    }

    /// Let devices sample their inputs. Must be called between transactions
    /// to keep interrupt state current.
    pub fn poll(&mut self) {
        for device in self.devices.iter_mut().flatten() {
            device.check_events();
        }
    }
}
