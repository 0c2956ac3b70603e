use std::fs::File;
use std::io::{self, Read, Seek, Write};

use crate::block::ByteStore;

/// Raw, file-backed byte store. No fancy features, just raw 1:1 access to
/// the underlying file's contents.
///
/// The store's size is fixed to the file's size when opened.
#[derive(Debug)]
pub struct Raw {
    len: u64,
    file: File,
}

impl Raw {
    pub fn new(file: File) -> io::Result<Raw> {
        Ok(Raw {
            len: file.metadata()?.len(),
            file,
        })
    }
}

impl ByteStore for Raw {
    fn len(&self) -> u64 {
        self.len
    }
}

impl Read for Raw {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for Raw {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let offset = self.file.seek(io::SeekFrom::Current(0))?;
        let remaining = self.len.saturating_sub(offset);
        let n = std::cmp::min(remaining, buf.len() as u64) as usize;
        self.file.write(&buf[..n])
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for Raw {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}
