#[macro_use]
extern crate log;

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::str::FromStr;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error>>;

use structopt::StructOpt;

use smbusim_core::block::backend::Mem;
use smbusim_core::block::ByteStore;
use smbusim_core::bus::{ScriptedRequest, SlaveBus};
use smbusim_core::devices::{Ads1015, At24, Ds1307, Mcp23008, SlaveDevice};
use smbusim_core::hw::{AnalogIn, PinProvider};
use smbusim_core::sim::{SimAnalog, SimClock, SimPin};

mod blockcfg;
mod script;

use crate::blockcfg::BlockCfg;
use crate::script::{parse_u16, parse_u8, Command};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum DeviceKind {
    At24,
    Ds1307,
    Ads1015,
    Mcp23008,
}

impl DeviceKind {
    fn default_address(self) -> u8 {
        match self {
            DeviceKind::At24 => 0x50,
            DeviceKind::Ds1307 => 0x68,
            DeviceKind::Ads1015 => 0x48,
            DeviceKind::Mcp23008 => 0x20,
        }
    }
}

impl FromStr for DeviceKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<DeviceKind, &'static str> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "at24" => DeviceKind::At24,
            "ds1307" => DeviceKind::Ds1307,
            "ads1015" => DeviceKind::Ads1015,
            "mcp23008" => DeviceKind::Mcp23008,
            _ => return Err("expected one of at24, ds1307, ads1015, mcp23008"),
        })
    }
}

#[derive(StructOpt)]
#[structopt(name = "smbusim")]
#[structopt(about = r#"
Replay a script of SMBus transactions against an emulated slave chip.
"#)]
struct Args {
    /// Chip to emulate: at24, ds1307, ads1015 or mcp23008.
    #[structopt(short, long)]
    device: DeviceKind,

    /// 7-bit slave address. Defaults to the chip's usual address.
    #[structopt(short, long, parse(try_from_str = parse_u8))]
    address: Option<u8>,

    /// Byte store for the EEPROM contents (at24) or NVRAM (ds1307).
    ///
    /// Format: `null:len=<size>`, `raw:file=/path/`,
    /// `mem:file=/path/[,truncate=<size>]` or `mem:len=<size>[,fill=<byte>]`
    ///
    /// The EEPROM defaults to 256 erased (0xff) bytes. The RTC runs without
    /// NVRAM unless a store is given.
    #[structopt(long)]
    store: Option<BlockCfg>,

    /// EEPROM write page size.
    #[structopt(long)]
    page_size: Option<usize>,

    /// Raw 16-bit ADC channel values (ads1015).
    #[structopt(
        long,
        use_delimiter = true,
        default_value = "0",
        parse(try_from_str = parse_u16)
    )]
    adc: Vec<u16>,

    /// Number of GPIO pins wired up (mcp23008).
    #[structopt(long, default_value = "8")]
    pins: usize,

    /// Script to replay. Reads stdin if omitted.
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,
}

/// Host side of the simulated board.
struct Board {
    bus: SlaveBus,
    pins: Vec<SimPin>,
    int: SimPin,
}

impl Board {
    fn new(args: &Args, addr: u8) -> DynResult<Board> {
        let pins = (0..args.pins).map(|_| SimPin::new()).collect::<Vec<_>>();
        let mut int = SimPin::new();

        let device: SlaveDevice = match args.device {
            DeviceKind::At24 => {
                let store: Box<dyn ByteStore> = match &args.store {
                    Some(cfg) => cfg.open()?,
                    None => Box::new(Mem::filled(256, 0xff)),
                };
                let mut eeprom = At24::new(store)?;
                if let Some(page_size) = args.page_size {
                    eeprom = eeprom.with_page_size(page_size);
                }
                eeprom.into()
            }
            DeviceKind::Ds1307 => {
                let mut rtc = Ds1307::new(Box::new(SimClock::system()));
                if let Some(cfg) = &args.store {
                    rtc = rtc.with_nvram(cfg.open()?);
                }
                rtc.into()
            }
            DeviceKind::Ads1015 => {
                let adcs = args
                    .adc
                    .iter()
                    .map(|&v| Box::new(SimAnalog::new(v)) as Box<dyn AnalogIn>)
                    .collect();
                Ads1015::new(adcs)?.into()
            }
            DeviceKind::Mcp23008 => {
                let providers = pins
                    .iter()
                    .map(|p| Some(Box::new(p.clone()) as Box<dyn PinProvider>))
                    .collect();
                Mcp23008::new(providers)?
                    .with_int_pin(int.digital_io())
                    .into()
            }
        };

        let mut bus = SlaveBus::new();
        bus.register_device(addr, device)?;

        Ok(Board { bus, pins, int })
    }

    fn pin(&self, pin: usize) -> DynResult<&SimPin> {
        Ok(self
            .pins
            .get(pin)
            .ok_or_else(|| format!("no pin {} (only {} wired up)", pin, self.pins.len()))?)
    }

    fn run(&mut self, command: Command) -> DynResult<()> {
        match command {
            Command::Write {
                addr,
                data,
                restart,
            } => {
                let mut req = if restart {
                    ScriptedRequest::restart_write(addr, &data)
                } else {
                    ScriptedRequest::write(addr, &data)
                };
                self.bus.process(&mut req)?;

                let nak = self.bus.device(addr).is_none() || req.acked() == Some(false);
                let sent = data.len() - req.unread();
                println!(
                    "{} {:#04x}: {} ({}/{} bytes)",
                    if restart { "W" } else { "w" },
                    addr,
                    if nak { "NAK" } else { "ACK" },
                    sent,
                    data.len()
                );
            }
            Command::Read { addr, len, restart } => {
                let mut req = if restart {
                    ScriptedRequest::read(addr, len)
                } else {
                    ScriptedRequest::plain_read(addr, len)
                };
                self.bus.process(&mut req)?;

                if self.bus.device(addr).is_none() {
                    println!("{} {:#04x}: NAK", if restart { "r" } else { "R" }, addr);
                    return Ok(());
                }

                let bytes = req
                    .sent()
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>();
                println!(
                    "{} {:#04x}: ACK [{}]",
                    if restart { "r" } else { "R" },
                    addr,
                    bytes.join(" ")
                );
            }
            Command::Drive { pin, level } => self.pin(pin)?.drive(level),
            Command::Release { pin } => self.pin(pin)?.release(),
            Command::Poll => self.bus.poll(),
            Command::Int => println!("int: {}", self.int.level() as u8),
        }
        Ok(())
    }
}

fn main() -> DynResult<()> {
    pretty_env_logger::formatted_builder()
        .filter(None, log::LevelFilter::Error)
        .filter(Some("smbusim"), log::LevelFilter::Info)
        .filter(Some("BUS"), log::LevelFilter::Info)
        .filter(Some("SMBUS"), log::LevelFilter::Info)
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_default())
        .init();

    let args = Args::from_args();
    let addr = args
        .address
        .unwrap_or_else(|| args.device.default_address());

    let script: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(fs::File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut board = Board::new(&args, addr)?;
    info!("{:?} at {:#04x}", args.device, addr);

    for (lineno, line) in script.lines().enumerate() {
        let line = line?;
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let command = line
            .parse::<Command>()
            .map_err(|e| format!("line {}: {}", lineno + 1, e))?;

        if let Err(e) = board.run(command) {
            error!("Stopping on line {}: {}", lineno + 1, e);
            return Err(e);
        }
    }

    Ok(())
}
