use std::fs;
use std::io::Read;
use std::str::FromStr;

use smbusim_core::block::backend::{Mem, Null, Raw};
use smbusim_core::block::ByteStore;

use crate::script::parse_u8;
use crate::DynResult;

/// Helper struct to parse Byte Store configurations.
#[derive(Debug, PartialEq, Eq)]
pub enum BlockCfg {
    /// `null:len=<len>`
    Null { len: u64 },
    /// `raw:file=/path/`
    Raw { path: String },
    /// `mem:file=/path/[,truncate=<len>]` or `mem:len=<len>[,fill=<byte>]`
    Mem {
        path: Option<String>,
        len: Option<u64>,
        fill: u8,
    },
}

fn parse_capacity(desc: &str) -> Option<u64> {
    use human_size::{Byte, ParsingError, Size, SpecificSize};
    match desc.parse::<Size>() {
        Ok(s) => {
            let bytes: SpecificSize<Byte> = s.into();
            Some(bytes.value() as u64)
        }
        Err(ParsingError::MissingMultiple) => desc.parse::<u64>().ok(),
        Err(_) => None,
    }
}

impl FromStr for BlockCfg {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<BlockCfg, &'static str> {
        let mut s = s.splitn(2, ':');
        let kind = s.next().unwrap_or_default();
        Ok(match kind {
            "null" => {
                let s = s.next().ok_or("missing required options")?.split(',');

                let mut len = None;

                for arg in s {
                    let mut s = arg.split('=');
                    match s.next().unwrap_or_default() {
                        "len" => {
                            len = Some(
                                parse_capacity(s.next().ok_or("missing argument for `len`")?)
                                    .ok_or("could not parse `len`")?,
                            );
                        }
                        _ => return Err("unknown `null` option"),
                    }
                }

                BlockCfg::Null {
                    len: len.ok_or("missing `len` parameter")?,
                }
            }
            "raw" => {
                let s = s.next().ok_or("missing required options")?.split(',');

                let mut file = None;

                for arg in s {
                    let mut s = arg.split('=');
                    match s.next().unwrap_or_default() {
                        "file" => {
                            file = Some(s.next().ok_or("missing argument for `file`")?.into())
                        }
                        _ => return Err("unknown `raw` option"),
                    }
                }

                BlockCfg::Raw {
                    path: file.ok_or("missing `file` parameter")?,
                }
            }
            "mem" => {
                let s = s.next().ok_or("missing required options")?.split(',');

                let mut file = None;
                let mut len = None;
                let mut fill = None;

                for arg in s {
                    let mut s = arg.split('=');
                    match s.next().unwrap_or_default() {
                        "file" => {
                            file = Some(s.next().ok_or("missing argument for `file`")?.into())
                        }
                        // `truncate` reads better next to `file`
                        "len" | "truncate" => {
                            len = Some(
                                parse_capacity(s.next().ok_or("missing argument for `len`")?)
                                    .ok_or("could not parse `len`")?,
                            )
                        }
                        "fill" => {
                            fill = Some(
                                parse_u8(s.next().ok_or("missing argument for `fill`")?)
                                    .map_err(|_| "could not parse `fill`")?,
                            )
                        }
                        _ => return Err("unknown `mem` option"),
                    }
                }

                if file.is_none() && len.is_none() {
                    return Err("`mem` needs either `file` or `len`");
                }
                if file.is_some() && fill.is_some() {
                    return Err("`fill` only applies to `mem:len=`");
                }

                BlockCfg::Mem {
                    path: file,
                    len,
                    fill: fill.unwrap_or(0xff),
                }
            }
            _ => return Err("invalid store kind"),
        })
    }
}

impl BlockCfg {
    /// Open the configured store.
    pub fn open(&self) -> DynResult<Box<dyn ByteStore>> {
        Ok(match self {
            BlockCfg::Null { len } => Box::new(Null::new(*len)),
            BlockCfg::Raw { path } => {
                let file = fs::OpenOptions::new().read(true).write(true).open(path)?;
                Box::new(Raw::new(file)?)
            }
            BlockCfg::Mem {
                path: Some(path),
                len,
                ..
            } => {
                let mut file = fs::File::open(path)?;
                let mut data = Vec::new();
                match len {
                    Some(len) => {
                        data.resize(*len as usize, 0);
                        file.read_exact(&mut data)?;
                    }
                    None => {
                        file.read_to_end(&mut data)?;
                    }
                }
                Box::new(Mem::new(data.into_boxed_slice()))
            }
            BlockCfg::Mem {
                path: None,
                len,
                fill,
            } => Box::new(Mem::filled(len.unwrap_or_default() as usize, *fill)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!(
            "null:len=256".parse::<BlockCfg>(),
            Ok(BlockCfg::Null { len: 256 })
        );
        assert_eq!(
            "raw:file=/tmp/eeprom.bin".parse::<BlockCfg>(),
            Ok(BlockCfg::Raw {
                path: "/tmp/eeprom.bin".into()
            })
        );
        assert_eq!(
            "mem:file=eeprom.bin,truncate=128".parse::<BlockCfg>(),
            Ok(BlockCfg::Mem {
                path: Some("eeprom.bin".into()),
                len: Some(128),
                fill: 0xff,
            })
        );
        assert_eq!(
            "mem:len=56,fill=0".parse::<BlockCfg>(),
            Ok(BlockCfg::Mem {
                path: None,
                len: Some(56),
                fill: 0,
            })
        );
    }

    #[test]
    fn human_sizes() {
        assert_eq!(
            "null:len=1 KiB".parse::<BlockCfg>(),
            Ok(BlockCfg::Null { len: 1024 })
        );
    }

    #[test]
    fn bad_configs() {
        assert!("null".parse::<BlockCfg>().is_err());
        assert!("null:size=12".parse::<BlockCfg>().is_err());
        assert!("mem:fill=0".parse::<BlockCfg>().is_err());
        assert!("mem:file=x,fill=0".parse::<BlockCfg>().is_err());
        assert!("flash:len=12".parse::<BlockCfg>().is_err());
    }

    #[test]
    fn open_mem() {
        let store = "mem:len=16,fill=0xaa".parse::<BlockCfg>().unwrap();
        let mut store = store.open().unwrap();
        assert_eq!(store.len(), 16);
        let mut buf = [0; 2];
        store.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0xaa, 0xaa]);
    }
}
