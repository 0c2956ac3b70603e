use std::convert::TryFrom;
use std::str::FromStr;

/// One line of a replay script.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// `w <addr> <bytes..>` / `W <addr> <bytes..>`
    Write {
        addr: u8,
        data: Vec<u8>,
        restart: bool,
    },
    /// `r <addr> <n>` / `R <addr> <n>`
    Read { addr: u8, len: usize, restart: bool },
    /// `drive <pin> <0|1>`
    Drive { pin: usize, level: bool },
    /// `release <pin>`
    Release { pin: usize },
    /// `poll`
    Poll,
    /// `int`
    Int,
}

/// Parse a decimal or `0x`-prefixed hex number.
pub fn parse_num(s: &str) -> Result<u64, &'static str> {
    let res = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    res.map_err(|_| "invalid number")
}

pub fn parse_u8(s: &str) -> Result<u8, &'static str> {
    u8::try_from(parse_num(s)?).map_err(|_| "value doesn't fit in a byte")
}

pub fn parse_u16(s: &str) -> Result<u16, &'static str> {
    u16::try_from(parse_num(s)?).map_err(|_| "value doesn't fit in 16 bits")
}

fn parse_usize(s: &str) -> Result<usize, &'static str> {
    usize::try_from(parse_num(s)?).map_err(|_| "value too large")
}

impl FromStr for Command {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Command, &'static str> {
        let mut args = s.split_whitespace();
        let cmd = args.next().ok_or("empty command")?;

        let mut next = |what: &'static str| args.next().ok_or(what);

        let command = match cmd {
            "w" | "W" => {
                let addr = parse_u8(next("missing address")?)?;
                let mut data = Vec::new();
                while let Ok(b) = next("") {
                    data.push(parse_u8(b)?);
                }
                Command::Write {
                    addr,
                    data,
                    restart: cmd == "W",
                }
            }
            "r" | "R" => Command::Read {
                addr: parse_u8(next("missing address")?)?,
                len: parse_usize(next("missing length")?)?,
                restart: cmd == "r",
            },
            "drive" => Command::Drive {
                pin: parse_usize(next("missing pin")?)?,
                level: match next("missing level")? {
                    "0" => false,
                    "1" => true,
                    _ => return Err("level must be 0 or 1"),
                },
            },
            "release" => Command::Release {
                pin: parse_usize(next("missing pin")?)?,
            },
            "poll" => Command::Poll,
            "int" => Command::Int,
            _ => return Err("unknown command"),
        };

        if args.next().is_some() {
            return Err("trailing arguments");
        }
        Ok(command)
    }
}
