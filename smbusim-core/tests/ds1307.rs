mod common;

use smbusim_core::block::backend::Mem;
use smbusim_core::bus::SlaveBus;
use smbusim_core::devices::{Ds1307, SlaveDevice};
use smbusim_core::hw::DateTime;
use smbusim_core::sim::SimClock;

use common::*;

const ADDR: u8 = 0x68;

fn setup() -> SlaveBus {
    setup_at(DateTime {
        year: 2019,
        month: 12,
        day: 31,
        hour: 23,
        minute: 59,
        second: 30,
        weekday: 1,
    })
}

fn setup_at(t: DateTime) -> SlaveBus {
    let clock = SimClock::fixed(t);
    let rtc = Ds1307::new(Box::new(clock)).with_nvram(Box::new(Mem::filled(56, 0)));

    let mut bus = SlaveBus::new();
    bus.register_device(ADDR, rtc).unwrap();
    bus
}

fn datetime(bus: &mut SlaveBus) -> DateTime {
    match bus.device_mut(ADDR) {
        Some(SlaveDevice::Ds1307(rtc)) => rtc.device_mut().clock_mut().datetime(),
        _ => panic!("no DS1307 on the bus"),
    }
}

#[test]
fn read_time() {
    let mut bus = setup();
    let regs = read_i2c_block_data(&mut bus, ADDR, 0x00, 8);
    assert_eq!(regs, vec![0x30, 0x59, 0x23, 0x01, 0x31, 0x12, 0x19, 0x00]);
}

#[test]
fn set_time() {
    let mut bus = setup();
    assert!(write_i2c_block_data(
        &mut bus,
        ADDR,
        0x00,
        &[0x00, 0x30, 0x10, 0x02, 0x15, 0x06, 0x21]
    ));

    assert_eq!(
        datetime(&mut bus),
        DateTime {
            year: 2021,
            month: 6,
            day: 15,
            hour: 10,
            minute: 30,
            second: 0,
            weekday: 2,
        }
    );
}

#[test]
fn set_time_from_shorter_month() {
    let mut bus = setup_at(DateTime {
        year: 2019,
        month: 2,
        day: 10,
        hour: 8,
        minute: 0,
        second: 0,
        weekday: 6,
    });

    // the date goes through 2019-02-30 before the month catches up
    assert!(write_i2c_block_data(
        &mut bus,
        ADDR,
        0x00,
        &[0x00, 0x30, 0x10, 0x05, 0x30, 0x03, 0x19]
    ));

    let t = datetime(&mut bus);
    assert_eq!((t.year, t.month, t.day), (2019, 3, 30));
    assert_eq!((t.hour, t.minute, t.second), (10, 30, 0));
    assert_eq!(t.weekday, 5);
    assert_eq!(
        read_i2c_block_data(&mut bus, ADDR, 0x00, 7),
        vec![0x00, 0x30, 0x10, 0x05, 0x30, 0x03, 0x19]
    );
}

#[test]
fn date_roundtrip() {
    let mut bus = setup_at(DateTime {
        year: 2019,
        month: 2,
        day: 10,
        hour: 8,
        minute: 0,
        second: 0,
        weekday: 6,
    });
    assert!(write_byte_data(&mut bus, ADDR, 0x04, 0x30));
    assert_eq!(read_byte_data(&mut bus, ADDR, 0x04), Some(0x30));
    assert_eq!(read_byte_data(&mut bus, ADDR, 0x05), Some(0x02));
}

#[test]
fn seconds_roundtrip() {
    let mut bus = setup();
    assert!(write_byte_data(&mut bus, ADDR, 0x00, 0x59));
    assert_eq!(read_byte_data(&mut bus, ADDR, 0x00), Some(0x59));
}

#[test]
fn nvram() {
    let mut bus = setup();
    let data = (0..56).collect::<Vec<u8>>();
    assert!(write_i2c_block_data(&mut bus, ADDR, 0x08, &data));
    assert_eq!(read_i2c_block_data(&mut bus, ADDR, 0x08, 56), data);
    assert_eq!(datetime(&mut bus).second, 30);

    // the pointer wraps from the last NVRAM byte to the seconds register
    assert_eq!(
        read_i2c_block_data(&mut bus, ADDR, 0x3f, 2),
        vec![55, 0x30]
    );
}

#[test]
fn command_range() {
    let mut bus = setup();
    assert!(write_byte_data(&mut bus, ADDR, 0x3f, 0x01));
    assert!(!write_byte_data(&mut bus, ADDR, 0x40, 0x01));
    assert_eq!(read_byte_data(&mut bus, ADDR, 0x40), None);
    assert_eq!(read_byte_data(&mut bus, ADDR, 0x3f), Some(0x01));
}
