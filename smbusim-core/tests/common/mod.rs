//! SMBus host (master) side helpers, modeled after the Linux i2c-dev API.

#![allow(dead_code)]

use byteorder::{ByteOrder, LittleEndian};

use smbusim_core::bus::{ScriptedRequest, SlaveBus};

pub fn transfer(bus: &mut SlaveBus, mut req: ScriptedRequest) -> ScriptedRequest {
    bus.process(&mut req).expect("fatal slave exception");
    req
}

/// Write `data` after a START. Returns true if the slave ACKed the first byte.
pub fn write(bus: &mut SlaveBus, addr: u8, data: &[u8]) -> bool {
    transfer(bus, ScriptedRequest::write(addr, data)).acked() == Some(true)
}

/// Write `data`, then read `len` bytes after a repeated START.
pub fn write_read(bus: &mut SlaveBus, addr: u8, data: &[u8], len: usize) -> Option<Vec<u8>> {
    if !write(bus, addr, data) {
        return None;
    }
    Some(transfer(bus, ScriptedRequest::read(addr, len)).into_sent())
}

pub fn write_byte_data(bus: &mut SlaveBus, addr: u8, cmd: u8, val: u8) -> bool {
    write(bus, addr, &[cmd, val])
}

pub fn read_byte_data(bus: &mut SlaveBus, addr: u8, cmd: u8) -> Option<u8> {
    write_read(bus, addr, &[cmd], 1)?.first().copied()
}

pub fn write_word_data(bus: &mut SlaveBus, addr: u8, cmd: u8, val: u16) -> bool {
    let mut buf = [cmd, 0, 0];
    LittleEndian::write_u16(&mut buf[1..], val);
    write(bus, addr, &buf)
}

pub fn read_word_data(bus: &mut SlaveBus, addr: u8, cmd: u8) -> Option<u16> {
    let data = write_read(bus, addr, &[cmd], 2)?;
    if data.len() != 2 {
        return None;
    }
    Some(LittleEndian::read_u16(&data))
}

/// Big-endian word access, as used by chips which don't follow SMBus byte
/// order (`i2c_smbus_{read,write}_word_swapped`).
pub fn write_word_swapped(bus: &mut SlaveBus, addr: u8, cmd: u8, val: u16) -> bool {
    write_word_data(bus, addr, cmd, val.swap_bytes())
}

pub fn read_word_swapped(bus: &mut SlaveBus, addr: u8, cmd: u8) -> Option<u16> {
    read_word_data(bus, addr, cmd).map(u16::swap_bytes)
}

pub fn write_i2c_block_data(bus: &mut SlaveBus, addr: u8, cmd: u8, data: &[u8]) -> bool {
    let mut buf = vec![cmd];
    buf.extend_from_slice(data);
    write(bus, addr, &buf)
}

pub fn read_i2c_block_data(bus: &mut SlaveBus, addr: u8, cmd: u8, len: usize) -> Vec<u8> {
    write_read(bus, addr, &[cmd], len).unwrap_or_default()
}

/// SMBus block read (`i2c_smbus_read_block_data`). The slave's first byte is
/// the count of bytes that follow it.
pub fn read_block_data(bus: &mut SlaveBus, addr: u8, cmd: u8) -> Option<Vec<u8>> {
    if !write(bus, addr, &[cmd]) {
        return None;
    }
    let sent = transfer(bus, ScriptedRequest::block_read(addr)).into_sent();
    let (_count, data) = sent.split_first()?;
    Some(data.to_vec())
}
