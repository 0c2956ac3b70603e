use crate::devices::prelude::*;

use std::io::{Read, Seek, SeekFrom, Write};

use crate::block::ByteStore;

/// Largest store addressable with a single address byte.
const MAX_SIZE: u64 = 256;

/// Default number of data bytes accepted per write transaction.
pub const DEFAULT_PAGE_SIZE: usize = 16;

/// AT24 - serial EEPROM.
///
/// Doesn't use SMBus register framing: the first byte of a write sets the
/// memory address, and every following byte is data. Reads stream bytes out
/// until the master stops.
#[derive(Debug)]
pub struct At24 {
    store: Box<dyn ByteStore>,
    size: u64,
    addr: u8,
    page_size: usize,
}

impl At24 {
    /// Create a new EEPROM backed by `store`. The store must hold between 1 and
    /// 256 bytes.
    pub fn new(store: Box<dyn ByteStore>) -> Result<At24, BuildError> {
        let size = store.len();
        if size == 0 {
            return Err(BuildError::Empty("EEPROM store"));
        }
        if size > MAX_SIZE {
            return Err(BuildError::StoreTooLarge(size));
        }

        Ok(At24 {
            store,
            size,
            addr: 0,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Set the max number of data bytes stored per write transaction.
    pub fn with_page_size(mut self, page_size: usize) -> At24 {
        self.page_size = page_size.max(1);
        self
    }

    /// Memory address set by the last write.
    pub fn addr(&self) -> u8 {
        self.addr
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn store_mut(&mut self) -> &mut dyn ByteStore {
        &mut *self.store
    }

    fn write(&mut self, req: &mut dyn Request) -> SlaveResult<()> {
        let mut addr = [0; 1];
        if req.read(&mut addr, false) == 0 {
            return Ok(());
        }
        let addr = addr[0];

        if addr as u64 >= self.size {
            req.ack(false);
            return Err(InvalidAddress {
                addr,
                size: self.size,
            });
        }
        req.ack(true);
        self.addr = addr;
        trace!(target: "AT24", "addr = {:#04x}", addr);

        let mut data = vec![0; self.page_size];
        let n = req.read(&mut data, true);
        if n == 0 {
            // just setting the address for a subsequent read
            return Ok(());
        }

        let room = (self.size - addr as u64) as usize;
        if n > room {
            debug!(
                target: "AT24",
                "write of {} bytes at {:#04x} truncated to {}",
                n,
                addr,
                room
            );
        }
        let n = n.min(room);

        self.store.seek(SeekFrom::Start(addr as u64))?;
        self.store.write_all(&data[..n])?;
        trace!(target: "AT24", "wrote {} bytes at {:#04x}", n, addr);
        Ok(())
    }

    fn read(&mut self, req: &mut dyn Request) -> SlaveResult<()> {
        let mut byte = [0; 1];
        loop {
            if self.store.read(&mut byte)? == 0 {
                debug!(target: "AT24", "read stopped at end of store");
                return Ok(());
            }
            if req.write(&byte) != 1 {
                return Ok(());
            }
        }
    }

    /// Service a single transaction.
    pub fn process(&mut self, req: &mut dyn Request) -> SlaveResult<()> {
        if !req.is_read() {
            return self.write(req);
        }

        // a plain read continues wherever the last access left off
        if req.is_restart() {
            self.store.seek(SeekFrom::Start(self.addr as u64))?;
        }
        self.read(req)
    }
}

impl Device for At24 {
    fn kind(&self) -> &'static str {
        "AT24"
    }

    fn probe(&self, reg: u8) -> Probe {
        if (reg as u64) < self.size {
            Probe::Register("<data>")
        } else {
            Probe::Unmapped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::block::backend::{Mem, Null};
    use crate::bus::ScriptedRequest;

    fn counting(len: usize) -> At24 {
        let data = (0..len).map(|i| i as u8).collect::<Vec<_>>();
        At24::new(Box::new(Mem::new(data.into_boxed_slice()))).unwrap()
    }

    fn contents(eeprom: &mut At24) -> Vec<u8> {
        let store = eeprom.store_mut();
        store.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = Vec::new();
        store.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn write_then_read() {
        let mut eeprom = counting(32);

        let mut req = ScriptedRequest::write(0x50, &[10, 1, 2, 3]);
        eeprom.process(&mut req).unwrap();
        assert_eq!(req.acked(), Some(true));
        assert_eq!(eeprom.addr(), 10);

        let mut req = ScriptedRequest::read(0x50, 5);
        eeprom.process(&mut req).unwrap();
        assert_eq!(req.sent(), &[1, 2, 3, 13, 14]);
    }

    #[test]
    fn invalid_address() {
        let mut eeprom = counting(32);
        let mut req = ScriptedRequest::write(0x50, &[32, 0xff]);
        assert!(matches!(
            eeprom.process(&mut req),
            Err(InvalidAddress { addr: 32, size: 32 })
        ));
        assert_eq!(req.acked(), Some(false));
        assert_eq!(eeprom.addr(), 0);
        assert_eq!(contents(&mut eeprom)[..2], [0, 1]);
    }

    #[test]
    fn write_truncated_at_end() {
        let mut eeprom = counting(8);
        let mut req = ScriptedRequest::write(0x50, &[6, 0xa, 0xb, 0xc, 0xd]);
        eeprom.process(&mut req).unwrap();
        assert_eq!(contents(&mut eeprom), vec![0, 1, 2, 3, 4, 5, 0xa, 0xb]);
    }

    #[test]
    fn page_size_limits_write() {
        let mut eeprom = counting(32).with_page_size(2);
        let mut req = ScriptedRequest::write(0x50, &[0, 0xa, 0xb, 0xc]);
        eeprom.process(&mut req).unwrap();
        assert_eq!(req.unread(), 1);
        assert_eq!(contents(&mut eeprom)[..3], [0xa, 0xb, 2]);
    }

    #[test]
    fn read_ends_at_end_of_store() {
        let mut eeprom = counting(8);
        let mut req = ScriptedRequest::write(0x50, &[6]);
        eeprom.process(&mut req).unwrap();

        let mut req = ScriptedRequest::read(0x50, 4);
        eeprom.process(&mut req).unwrap();
        assert_eq!(req.sent(), &[6, 7]);
    }

    #[test]
    fn current_address_read() {
        let mut eeprom = counting(16);
        let mut req = ScriptedRequest::write(0x50, &[4]);
        eeprom.process(&mut req).unwrap();

        let mut req = ScriptedRequest::read(0x50, 2);
        eeprom.process(&mut req).unwrap();
        assert_eq!(req.sent(), &[4, 5]);

        let mut req = ScriptedRequest::plain_read(0x50, 2);
        eeprom.process(&mut req).unwrap();
        assert_eq!(req.sent(), &[6, 7]);
    }

    #[test]
    fn store_size_limits() {
        assert!(matches!(
            At24::new(Box::new(Null::new(0))),
            Err(BuildError::Empty(_))
        ));
        assert!(matches!(
            At24::new(Box::new(Null::new(257))),
            Err(BuildError::StoreTooLarge(257))
        ));
        assert!(At24::new(Box::new(Null::new(256))).is_ok());
    }
}
