mod common;

use smbusim_core::bus::SlaveBus;
use smbusim_core::devices::Mcp23008;
use smbusim_core::hw::PinProvider;
use smbusim_core::signal::TriggerKind;
use smbusim_core::sim::SimPin;

use common::*;

const ADDR: u8 = 0x20;

const IODIR: u8 = 0x00;
const GPINTEN: u8 = 0x02;
const IOCON: u8 = 0x05;
const GPPU: u8 = 0x06;
const INTF: u8 = 0x07;
const INTCAP: u8 = 0x08;
const GPIO: u8 = 0x09;
const OLAT: u8 = 0x0a;

struct Board {
    bus: SlaveBus,
    pins: Vec<SimPin>,
    int: SimPin,
}

fn setup(n: usize) -> Board {
    setup_with(n, |mcp| mcp)
}

fn setup_with(n: usize, config: impl FnOnce(Mcp23008) -> Mcp23008) -> Board {
    let pins = (0..n).map(|_| SimPin::new()).collect::<Vec<_>>();
    let mut int = SimPin::new();

    let providers = pins
        .iter()
        .map(|p| Some(Box::new(p.clone()) as Box<dyn PinProvider>))
        .collect();
    let mcp = Mcp23008::new(providers)
        .unwrap()
        .with_int_pin(int.digital_io());
    let mcp = config(mcp);

    let mut bus = SlaveBus::new();
    bus.register_device(ADDR, mcp).unwrap();
    Board { bus, pins, int }
}

#[test]
fn register_dump_wraps() {
    let mut b = setup(1);
    let regs = read_i2c_block_data(&mut b.bus, ADDR, IODIR, 12);
    assert_eq!(regs, vec![0xff, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff]);
}

#[test]
fn leds() {
    let mut b = setup(3);
    assert!(write_byte_data(&mut b.bus, ADDR, IODIR, 0b1111_1000));
    assert!(b.pins.iter().all(|p| p.is_output() && !p.level()));

    assert!(write_byte_data(&mut b.bus, ADDR, OLAT, 0b0000_0101));
    let levels = b.pins.iter().map(|p| p.level()).collect::<Vec<_>>();
    assert_eq!(levels, vec![true, false, true]);
    assert_eq!(read_byte_data(&mut b.bus, ADDR, GPIO), Some(0b0000_0101));

    // writing an input bit doesn't drive anything
    assert!(write_byte_data(&mut b.bus, ADDR, GPIO, 0b1000_0010));
    let levels = b.pins.iter().map(|p| p.level()).collect::<Vec<_>>();
    assert_eq!(levels, vec![false, true, false]);
    assert_eq!(read_byte_data(&mut b.bus, ADDR, OLAT), Some(0b1000_0010));
    assert_eq!(read_byte_data(&mut b.bus, ADDR, GPIO), Some(0b0000_0010));
}

#[test]
fn buttons_with_pull_ups() {
    let mut b = setup(2);
    assert!(write_byte_data(&mut b.bus, ADDR, GPPU, 0b0000_0011));
    assert_eq!(read_byte_data(&mut b.bus, ADDR, GPIO), Some(0b0000_0011));

    b.pins[1].drive(false);
    assert_eq!(read_byte_data(&mut b.bus, ADDR, GPIO), Some(0b0000_0001));
}

#[test]
fn interrupt_flow() {
    let mut b = setup(2);
    let int_fired = b.int.watch(TriggerKind::Lo);

    // linux driver probe: sequential mode is kept, INTPOL/ODR left alone
    assert!(write_byte_data(&mut b.bus, ADDR, IOCON, 0));
    assert!(write_byte_data(&mut b.bus, ADDR, GPINTEN, 0b0000_0001));
    assert!(b.pins[0].is_capturing());

    b.bus.poll();
    assert!(!int_fired.check());

    b.pins[0].drive(true);
    b.pins[0].drive(false);
    b.pins[0].drive(true);
    b.bus.poll();
    assert!(int_fired.check_and_clear());
    assert!(!b.int.level());

    // more edges before the host gets around to it don't re-capture
    b.pins[0].drive(false);
    b.bus.poll();
    assert!(!int_fired.check());

    assert_eq!(read_byte_data(&mut b.bus, ADDR, INTF), Some(0b0000_0001));
    assert_eq!(read_byte_data(&mut b.bus, ADDR, INTCAP), Some(0b0000_0001));
    assert!(b.int.level());
    assert_eq!(read_byte_data(&mut b.bus, ADDR, INTF), Some(0));
    assert_eq!(read_byte_data(&mut b.bus, ADDR, GPIO), Some(0));

    b.pins[0].drive(true);
    b.bus.poll();
    assert!(int_fired.check_and_clear());
    assert_eq!(read_byte_data(&mut b.bus, ADDR, GPIO), Some(0b0000_0001));
    assert!(b.int.level());
}

#[test]
fn reading_intf_alone_clears_interrupt() {
    let mut b = setup(1);
    assert!(write_byte_data(&mut b.bus, ADDR, GPINTEN, 0b0000_0001));

    b.pins[0].drive(true);
    b.pins[0].drive(false);
    b.bus.poll();
    assert!(!b.int.level());

    // in sequential mode INTCAP is fetched as the next byte, even though the
    // master stops after INTF
    assert_eq!(read_byte_data(&mut b.bus, ADDR, INTF), Some(0b0000_0001));
    assert!(b.int.level());
    assert_eq!(read_byte_data(&mut b.bus, ADDR, INTF), Some(0));
}

#[test]
fn overflowing_pulse_queue_resenses() {
    let mut b = setup_with(1, |mcp| mcp.with_pulse_capacity(2));
    assert!(write_byte_data(&mut b.bus, ADDR, GPINTEN, 0b0000_0001));
    assert!(b.pins[0].is_capturing());

    // the first edge arms the capture, the other three don't fit in the
    // queue. Parity of what's left would say high.
    for &level in &[true, false, true, false] {
        b.pins[0].drive(level);
    }
    b.bus.poll();
    assert!(!b.int.level());
    assert_eq!(read_byte_data(&mut b.bus, ADDR, GPIO), Some(0));
    assert!(b.int.level());
    assert!(b.pins[0].is_capturing());

    // the re-sensed level is ground truth for the next pulse
    b.pins[0].drive(true);
    b.pins[0].drive(false);
    b.bus.poll();
    assert!(!b.int.level());
    assert_eq!(read_byte_data(&mut b.bus, ADDR, GPIO), Some(0));
}

#[test]
fn active_high_interrupt() {
    let mut b = setup(1);
    assert!(write_byte_data(&mut b.bus, ADDR, IOCON, 0b0000_0010));
    assert!(!b.int.level());
    assert!(write_byte_data(&mut b.bus, ADDR, GPINTEN, 0b0000_0001));
    b.bus.poll();

    b.pins[0].drive(true);
    b.pins[0].drive(false);
    b.bus.poll();
    assert!(b.int.level());
    assert_eq!(read_byte_data(&mut b.bus, ADDR, GPIO), Some(0));
    assert!(!b.int.level());
}

#[test]
fn unsupported_writes_are_local() {
    let mut b = setup(1);
    // still ACKed, the write just doesn't take
    assert!(write_byte_data(&mut b.bus, ADDR, 0x01, 0xff));
    assert_eq!(read_byte_data(&mut b.bus, ADDR, 0x01), Some(0));
    assert!(write_byte_data(&mut b.bus, ADDR, IOCON, 0b0010_0000));
    assert_eq!(read_byte_data(&mut b.bus, ADDR, IOCON), Some(0));
}
