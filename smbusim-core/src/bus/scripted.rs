use std::collections::VecDeque;

use crate::bus::Request;

/// How many bytes a reading master clocks out of the slave.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ReadLen {
    Fixed(usize),
    /// SMBus block read: the first byte sent is the count of bytes that
    /// follow it.
    Block,
}

/// An in-memory [`Request`], standing in for a master on the other end of
/// the bus.
///
/// Write transactions carry the bytes the master sends. Read transactions
/// carry the number of bytes the master will clock, and record whatever the
/// slave sent back.
#[derive(Debug)]
pub struct ScriptedRequest {
    address: u8,
    is_read: bool,
    is_restart: bool,

    incoming: VecDeque<u8>,
    read_len: ReadLen,
    sent: Vec<u8>,
    acked: Option<bool>,
}

impl ScriptedRequest {
    fn new(address: u8, is_read: bool, is_restart: bool) -> ScriptedRequest {
        ScriptedRequest {
            address,
            is_read,
            is_restart,
            incoming: VecDeque::new(),
            read_len: ReadLen::Fixed(0),
            sent: Vec::new(),
            acked: None,
        }
    }

    /// Master writes `data` after a START.
    pub fn write(address: u8, data: &[u8]) -> ScriptedRequest {
        let mut req = ScriptedRequest::new(address, false, false);
        req.incoming.extend(data);
        req
    }

    /// Master writes `data` after a repeated START.
    pub fn restart_write(address: u8, data: &[u8]) -> ScriptedRequest {
        let mut req = ScriptedRequest::new(address, false, true);
        req.incoming.extend(data);
        req
    }

    /// Master reads `len` bytes after a repeated START (the usual second half
    /// of a register read).
    pub fn read(address: u8, len: usize) -> ScriptedRequest {
        let mut req = ScriptedRequest::new(address, true, true);
        req.read_len = ReadLen::Fixed(len);
        req
    }

    /// Master reads `len` bytes after a START, with no preceding write.
    pub fn plain_read(address: u8, len: usize) -> ScriptedRequest {
        let mut req = ScriptedRequest::new(address, true, false);
        req.read_len = ReadLen::Fixed(len);
        req
    }

    /// Master performs the read half of an SMBus block read.
    pub fn block_read(address: u8) -> ScriptedRequest {
        let mut req = ScriptedRequest::new(address, true, true);
        req.read_len = ReadLen::Block;
        req
    }

    /// ACK/NAK decision on the command/address byte, if the slave made one.
    pub fn acked(&self) -> Option<bool> {
        self.acked
    }

    /// Bytes the slave sent to the master.
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    pub fn into_sent(self) -> Vec<u8> {
        self.sent
    }

    /// Number of master bytes the slave never consumed.
    pub fn unread(&self) -> usize {
        self.incoming.len()
    }

    fn remaining_reads(&self) -> usize {
        match self.read_len {
            ReadLen::Fixed(len) => len.saturating_sub(self.sent.len()),
            ReadLen::Block => match self.sent.first() {
                None => 1,
                Some(&count) => (count as usize + 1).saturating_sub(self.sent.len()),
            },
        }
    }
}

impl Request for ScriptedRequest {
    fn address(&self) -> u8 {
        self.address
    }

    fn is_read(&self) -> bool {
        self.is_read
    }

    fn is_restart(&self) -> bool {
        self.is_restart
    }

    fn read(&mut self, buf: &mut [u8], _ack: bool) -> usize {
        // a NAKed master gives up on the rest of the transaction
        if self.is_read || self.acked == Some(false) {
            return 0;
        }

        let n = std::cmp::min(buf.len(), self.incoming.len());
        for (b, val) in buf.iter_mut().zip(self.incoming.drain(..n)) {
            *b = val;
        }
        n
    }

    fn write(&mut self, data: &[u8]) -> usize {
        if !self.is_read {
            return 0;
        }

        let mut n = 0;
        for &b in data {
            if self.remaining_reads() == 0 {
                break;
            }
            self.sent.push(b);
            n += 1;
        }
        n
    }

    fn ack(&mut self, ack: bool) {
        self.acked = Some(ack);
    }
}
