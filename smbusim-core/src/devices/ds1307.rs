use crate::devices::prelude::*;

use std::convert::TryFrom;
use std::io::{Read, Seek, SeekFrom, Write};

use chrono::NaiveDate;
use num_enum::TryFromPrimitive;

use crate::block::ByteStore;
use crate::hw::{Clock, DateTime};

const MAX_REG: u8 = 0x3f;

/// First register backed by NVRAM.
const NVRAM_BASE: u8 = 0x08;

#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
enum Reg {
    SECONDS = 0x00,
    MINUTES = 0x01,
    HOURS__ = 0x02,
    DAY____ = 0x03,
    DATE___ = 0x04,
    MONTH__ = 0x05,
    YEAR___ = 0x06,
    CONTROL = 0x07,
}

/// DS1307 - real-time clock with battery-backed NVRAM.
///
/// Time registers are BCD-encoded views of the attached [`Clock`]. The clock
/// is always read and written as a whole snapshot.
///
/// Drivers set the time one register at a time, so the date can pass through
/// days that don't exist (e.g: DATE=30 while still in February). The clock
/// rolls those over, and the calendar fields as written are shadowed until the
/// clock moves on to another day.
#[derive(Debug)]
pub struct Ds1307 {
    clock: Box<dyn Clock>,
    nvram: Option<Box<dyn ByteStore>>,
    written: Option<DateTime>,
}

/// The day `t` lands on once rolled over.
fn calendar_day(t: &DateTime) -> Option<NaiveDate> {
    let midnight = DateTime {
        hour: 0,
        minute: 0,
        second: 0,
        ..*t
    };
    midnight.normalized().map(|t| t.date())
}

impl Ds1307 {
    pub fn new(clock: Box<dyn Clock>) -> Ds1307 {
        Ds1307 {
            clock,
            nvram: None,
            written: None,
        }
    }

    /// Back registers 0x08 and up with `nvram`.
    pub fn with_nvram(mut self, nvram: Box<dyn ByteStore>) -> Ds1307 {
        self.nvram = Some(nvram);
        self
    }

    pub fn clock_mut(&mut self) -> &mut dyn Clock {
        &mut *self.clock
    }

    fn read_nvram(&mut self, addr: u8) -> SlaveResult<u8> {
        let nvram = match self.nvram {
            Some(ref mut nvram) => nvram,
            None => return Ok(0),
        };
        if addr as u64 >= nvram.len() {
            return Ok(0);
        }

        let mut byte = [0; 1];
        nvram.seek(SeekFrom::Start(addr as u64))?;
        nvram.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn write_nvram(&mut self, addr: u8, val: u8) -> SlaveResult<()> {
        let nvram = match self.nvram {
            Some(ref mut nvram) => nvram,
            None => {
                trace!(target: "DS1307", "no NVRAM, dropping write to {:#04x}", addr);
                return Ok(());
            }
        };
        if addr as u64 >= nvram.len() {
            return Err(InvalidAddress {
                addr,
                size: nvram.len(),
            });
        }

        nvram.seek(SeekFrom::Start(addr as u64))?;
        nvram.write_all(&[val])?;
        Ok(())
    }

    /// The clock's snapshot, with the last written calendar fields if the
    /// clock is still on the day they roll over to.
    fn snapshot(&mut self) -> DateTime {
        let mut t = self.clock.datetime();
        match self.written {
            Some(w) if calendar_day(&w) == calendar_day(&t) => {
                t.year = w.year;
                t.month = w.month;
                t.day = w.day;
            }
            Some(_) => self.written = None,
            None => {}
        }
        t
    }

    fn get_time(&mut self, reg: Reg) -> u8 {
        let t = self.snapshot();

        use Reg::*;
        let val = match reg {
            SECONDS => t.second,
            MINUTES => t.minute,
            HOURS__ => t.hour,
            DAY____ => t.weekday,
            DATE___ => t.day,
            MONTH__ => t.month,
            YEAR___ => (t.year % 100) as u8,
            CONTROL => unreachable!("invalid reg passed to get_time"),
        };

        dec2bcd(val)
    }

    fn set_time(&mut self, reg: Reg, val: u8) -> SlaveResult<()> {
        let mut t = self.snapshot();

        use Reg::*;
        match reg {
            // bit 7 is the clock halt flag
            SECONDS => t.second = bcd2dec(val & 0x7f),
            MINUTES => t.minute = bcd2dec(val & 0x7f),
            // 24 hour mode only
            HOURS__ => t.hour = bcd2dec(val & 0x3f),
            DAY____ => t.weekday = bcd2dec(val & 0x07),
            DATE___ => t.day = bcd2dec(val & 0x3f),
            MONTH__ => t.month = bcd2dec(val & 0x1f),
            YEAR___ => t.year = t.year - (t.year % 100) + bcd2dec(val) as u16,
            CONTROL => unreachable!("invalid reg passed to set_time"),
        }

        self.clock.set_datetime(t)?;
        self.written = Some(t);
        Ok(())
    }
}

impl Device for Ds1307 {
    fn kind(&self) -> &'static str {
        "DS1307"
    }

    fn probe(&self, reg: u8) -> Probe {
        use Reg::*;
        match Reg::try_from(reg) {
            Ok(reg) => Probe::Register(match reg {
                SECONDS => "SECONDS",
                MINUTES => "MINUTES",
                HOURS__ => "HOURS",
                DAY____ => "DAY",
                DATE___ => "DATE",
                MONTH__ => "MONTH",
                YEAR___ => "YEAR",
                CONTROL => "CONTROL",
            }),
            Err(_) if reg <= MAX_REG => Probe::Register("<nvram>"),
            Err(_) => Probe::Unmapped,
        }
    }
}

impl RegisterDevice for Ds1307 {
    fn protocol(&self) -> Protocol {
        Protocol::ByteSeq
    }

    fn max_reg(&self) -> u8 {
        MAX_REG
    }

    fn readreg(&mut self, reg: u8) -> SlaveResult<u16> {
        let val = match Reg::try_from(reg) {
            Ok(Reg::CONTROL) => 0,
            Ok(reg) => self.get_time(reg),
            Err(_) => self.read_nvram(reg - NVRAM_BASE)?,
        };
        Ok(val as u16)
    }

    fn writereg(&mut self, reg: u8, val: u16) -> SlaveResult<()> {
        let val = val as u8;
        match Reg::try_from(reg) {
            Ok(Reg::CONTROL) => {
                trace!(target: "DS1307", "ignoring CONTROL write {:#04x}", val);
                Ok(())
            }
            Ok(reg) => self.set_time(reg, val),
            Err(_) => self.write_nvram(reg - NVRAM_BASE, val),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::block::backend::Mem;
    use crate::sim::SimClock;
    use crate::smbus::SmbusSlave;

    fn rtc() -> Ds1307 {
        Ds1307::new(Box::new(SimClock::fixed(DateTime {
            year: 2019,
            month: 12,
            day: 31,
            hour: 23,
            minute: 58,
            second: 7,
            weekday: 1,
        })))
    }

    #[test]
    fn time_registers_are_bcd() {
        let mut rtc = rtc();
        assert_eq!(rtc.readreg(0x00).unwrap(), 0x07);
        assert_eq!(rtc.readreg(0x01).unwrap(), 0x58);
        assert_eq!(rtc.readreg(0x02).unwrap(), 0x23);
        assert_eq!(rtc.readreg(0x03).unwrap(), 0x01);
        assert_eq!(rtc.readreg(0x04).unwrap(), 0x31);
        assert_eq!(rtc.readreg(0x05).unwrap(), 0x12);
        assert_eq!(rtc.readreg(0x06).unwrap(), 0x19);
        assert_eq!(rtc.readreg(0x07).unwrap(), 0);
    }

    #[test]
    fn seconds_roundtrip() {
        let mut rtc = rtc();
        rtc.writereg(0x00, 0x59).unwrap();
        assert_eq!(rtc.readreg(0x00).unwrap(), 0x59);
        // everything else untouched
        assert_eq!(rtc.readreg(0x01).unwrap(), 0x58);
    }

    #[test]
    fn year_keeps_century() {
        let mut rtc = rtc();
        rtc.writereg(0x06, 0x42).unwrap();
        assert_eq!(rtc.clock_mut().datetime().year, 2042);
    }

    #[test]
    fn control_is_noop() {
        let mut rtc = rtc();
        let before = rtc.clock_mut().datetime();
        rtc.writereg(0x07, 0x10).unwrap();
        assert_eq!(rtc.readreg(0x07).unwrap(), 0);
        assert_eq!(rtc.clock_mut().datetime(), before);
    }

    #[test]
    fn nvram_passthrough() {
        let mut rtc = rtc().with_nvram(Box::new(Mem::filled(56, 0)));
        let before = rtc.clock_mut().datetime();

        rtc.writereg(0x08, 0xab).unwrap();
        rtc.writereg(0x3f, 0xcd).unwrap();
        assert_eq!(rtc.readreg(0x08).unwrap(), 0xab);
        assert_eq!(rtc.readreg(0x3f).unwrap(), 0xcd);
        assert_eq!(rtc.clock_mut().datetime(), before);
    }

    #[test]
    fn nvram_absent_or_small() {
        let mut rtc = rtc();
        rtc.writereg(0x10, 0xab).unwrap();
        assert_eq!(rtc.readreg(0x10).unwrap(), 0);

        let mut rtc = rtc.with_nvram(Box::new(Mem::filled(4, 0xee)));
        assert_eq!(rtc.readreg(0x0b).unwrap(), 0xee);
        assert_eq!(rtc.readreg(0x0c).unwrap(), 0);
        assert!(matches!(
            rtc.writereg(0x0c, 1),
            Err(InvalidAddress { addr: 4, size: 4 })
        ));
    }

    #[test]
    fn date_passes_through_missing_days() {
        let mut rtc = rtc();
        // 2019-02-31 rolls over to 2019-03-03
        rtc.writereg(0x05, 0x02).unwrap();
        assert_eq!(rtc.readreg(0x04).unwrap(), 0x31);
        assert_eq!(rtc.readreg(0x05).unwrap(), 0x02);
        let t = rtc.clock_mut().datetime();
        assert_eq!((t.year, t.month, t.day), (2019, 3, 3));
        assert_eq!(t.hour, 23);

        rtc.writereg(0x04, 0x28).unwrap();
        let t = rtc.clock_mut().datetime();
        assert_eq!((t.year, t.month, t.day), (2019, 2, 28));
        assert_eq!(rtc.readreg(0x04).unwrap(), 0x28);
    }

    #[test]
    fn shadow_dropped_once_clock_moves_on() {
        let mut rtc = rtc();
        rtc.writereg(0x05, 0x02).unwrap();

        let mut t = rtc.clock_mut().datetime();
        t.day = 4;
        rtc.clock_mut().set_datetime(t).unwrap();
        assert_eq!(rtc.readreg(0x04).unwrap(), 0x04);
        assert_eq!(rtc.readreg(0x05).unwrap(), 0x03);
    }

    #[test]
    fn sequential_time_read() {
        let mut slave = SmbusSlave::new(rtc());
        let mut req = crate::bus::ScriptedRequest::write(0x68, &[0x00]);
        slave.process(&mut req).unwrap();
        let mut req = crate::bus::ScriptedRequest::read(0x68, 7);
        slave.process(&mut req).unwrap();
        assert_eq!(req.sent(), &[0x07, 0x58, 0x23, 0x01, 0x31, 0x12, 0x19]);
        assert_eq!(slave.regnr(), 0x07);
    }
}
