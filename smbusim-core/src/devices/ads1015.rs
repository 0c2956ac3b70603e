use crate::devices::prelude::*;

use std::convert::TryFrom;

use num_enum::TryFromPrimitive;

use crate::hw::AnalogIn;

#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
enum Reg {
    CONVERSION = 0x00,
    CONFIG____ = 0x01,
    LO_THRESH_ = 0x02,
    HI_THRESH_ = 0x03,
}

const MAX_REG: u8 = Reg::HI_THRESH_ as u8;

/// ADS1015 - 12-bit 4 channel ADC.
///
/// The chip keeps its registers big-endian, while SMBus words go out
/// little-endian, so every register value is byte-swapped on its way to and
/// from the wire.
#[derive(Debug)]
pub struct Ads1015 {
    adcs: Vec<Box<dyn AnalogIn>>,
    index: usize,

    config: u16,
    lo_thresh: u16,
    hi_thresh: u16,
}

impl Ads1015 {
    /// Create a new ADC, where `adcs[n]` is single-ended input channel n.
    pub fn new(adcs: Vec<Box<dyn AnalogIn>>) -> Result<Ads1015, BuildError> {
        if adcs.is_empty() {
            return Err(BuildError::Empty("ADC channel list"));
        }

        Ok(Ads1015 {
            adcs,
            index: 0,
            config: 0x8583,
            lo_thresh: 0x8000,
            hi_thresh: 0x7fff,
        })
    }

    /// Currently selected channel.
    pub fn channel(&self) -> usize {
        self.index
    }

    fn value(&mut self) -> u16 {
        match self.adcs.get_mut(self.index) {
            Some(adc) => adc.value(),
            None => 0,
        }
    }
}

impl Device for Ads1015 {
    fn kind(&self) -> &'static str {
        "ADS1015"
    }

    fn probe(&self, reg: u8) -> Probe {
        use Reg::*;
        match Reg::try_from(reg) {
            Ok(reg) => Probe::Register(match reg {
                CONVERSION => "CONVERSION",
                CONFIG____ => "CONFIG",
                LO_THRESH_ => "LO_THRESH",
                HI_THRESH_ => "HI_THRESH",
            }),
            Err(_) => Probe::Unmapped,
        }
    }
}

impl RegisterDevice for Ads1015 {
    fn protocol(&self) -> Protocol {
        Protocol::WordSeq
    }

    fn max_reg(&self) -> u8 {
        MAX_REG
    }

    fn readreg(&mut self, reg: u8) -> SlaveResult<u16> {
        use Reg::*;
        let reg = Reg::try_from(reg).map_err(|_| UnsupportedRegister {
            reg,
            max_reg: MAX_REG,
        })?;
        let val = match reg {
            // 16-bit sample -> 12-bit two's complement, left justified
            CONVERSION => self.value() >> 1,
            CONFIG____ => self.config,
            LO_THRESH_ => self.lo_thresh,
            HI_THRESH_ => self.hi_thresh,
        };
        Ok(val.swap_bytes())
    }

    fn writereg(&mut self, reg: u8, val: u16) -> SlaveResult<()> {
        use Reg::*;
        let reg = Reg::try_from(reg).map_err(|_| UnsupportedRegister {
            reg,
            max_reg: MAX_REG,
        })?;
        let val = val.swap_bytes();
        match reg {
            CONVERSION => {
                trace!(target: "ADS1015", "ignoring CONVERSION write {:#06x}", val);
            }
            CONFIG____ => {
                let mux = val.get_bits(12..15);
                self.index = if mux.get_bit(2) {
                    mux.get_bits(0..2) as usize
                } else {
                    debug!(target: "ADS1015", "differential MUX {:#05b} not supported", mux);
                    0
                };
                trace!(target: "ADS1015", "channel = {}", self.index);
                self.config = val;
            }
            // the comparator thresholds only hold 12 bits
            LO_THRESH_ => self.lo_thresh = val & !0xf,
            HI_THRESH_ => self.hi_thresh = val | 0xf,
        }
        Ok(())
    }
}
