use std::io::{self, Cursor, Read, Seek, Write};

use crate::block::ByteStore;

/// Memory-backed byte store. Contents are lost when the store is dropped.
pub struct Mem {
    data: Cursor<Box<[u8]>>,
}

impl std::fmt::Debug for Mem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mem")
            .field("len", &self.data.get_ref().len())
            .field("data", &"[...]")
            .finish()
    }
}

impl Mem {
    /// Create a memory-backed store from some existing data.
    pub fn new(data: Box<[u8]>) -> Mem {
        Mem {
            data: Cursor::new(data),
        }
    }

    /// Create a store of `len` bytes, all set to `fill`.
    pub fn filled(len: usize, fill: u8) -> Mem {
        Mem::new(vec![fill; len].into_boxed_slice())
    }

    pub fn as_slice(&self) -> &[u8] {
        self.data.get_ref()
    }
}

impl ByteStore for Mem {
    fn len(&self) -> u64 {
        self.data.get_ref().len() as u64
    }
}

impl Read for Mem {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl Write for Mem {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Cursor<Box<[u8]>> doesn't grow, so this truncates at the end
        self.data.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.data.flush()
    }
}

impl Seek for Mem {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.data.seek(pos)
    }
}
