use std::io::{self, Read, Seek, Write};

use crate::block::ByteStore;

/// Null byte store. Can be configured to report any size, where reads always
/// return zero, and writes are a noop.
#[derive(Debug)]
pub struct Null {
    len: u64,
    offset: u64,
}

impl Null {
    pub fn new(reported_len: u64) -> Null {
        Null {
            len: reported_len,
            offset: 0,
        }
    }
}

impl ByteStore for Null {
    fn len(&self) -> u64 {
        self.len
    }
}

impl Read for Null {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.offset);
        let n = std::cmp::min(remaining, buf.len() as u64) as usize;
        buf[..n].iter_mut().for_each(|b| *b = 0);
        self.offset += n as u64;
        Ok(n)
    }
}

impl Write for Null {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.offset);
        let n = std::cmp::min(remaining, buf.len() as u64) as usize;
        self.offset += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        // noop
        Ok(())
    }
}

impl Seek for Null {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.offset = match pos {
            io::SeekFrom::Start(v) => v,
            io::SeekFrom::End(v) => match self.len as i64 + v {
                o if o >= 0 => o as u64,
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "cannot seek to negative offset",
                    ))
                }
            },
            io::SeekFrom::Current(v) => match self.offset as i64 + v {
                o if o >= 0 => o as u64,
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "cannot seek to negative offset",
                    ))
                }
            },
        };

        Ok(self.offset)
    }
}
