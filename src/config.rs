//! Command-line configuration for the `cartprobe` binary.

use std::path::PathBuf;

use crate::error::ConfigError;

pub const USAGE: &str = "\
Usage: cartprobe [-v|--verbose] [--no-color] <command>

Commands:
  list                                 Print the mapper registry
  probe <id> [--prg KIB] [--chr KIB]   Run bank diagnostics on a synthesized image
  inspect <file.nes>                   Show the header and register map of a ROM";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Probe {
        mapper: u8,
        prg_kib: Option<usize>,
        chr_kib: Option<usize>,
    },
    Inspect {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub command: Command,
    pub verbose: bool,
    pub color: bool,
}

/// Decimal, or hex with a `$` or `0x` prefix.
fn parse_number<T: TryFrom<u64>>(text: &str) -> Result<T, ConfigError> {
    let parsed = if let Some(hex) = text.strip_prefix('$').or_else(|| text.strip_prefix("0x")) {
        u64::from_str_radix(hex, 16)
    } else {
        text.parse()
    };
    parsed
        .ok()
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| ConfigError::InvalidNumber(text.to_string()))
}

impl Config {
    /// Parse arguments, not including the program name.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, ConfigError> {
        let mut verbose = false;
        let mut color = true;
        let mut positional = Vec::new();
        let mut prg_kib = None;
        let mut chr_kib = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-v" | "--verbose" => verbose = true,
                "--no-color" => color = false,
                "--prg" => {
                    let value = args.next().ok_or(ConfigError::MissingValue("--prg"))?;
                    prg_kib = Some(parse_number(&value)?);
                }
                "--chr" => {
                    let value = args.next().ok_or(ConfigError::MissingValue("--chr"))?;
                    chr_kib = Some(parse_number(&value)?);
                }
                s if s.starts_with('-') && s.len() > 1 => return Err(ConfigError::UnknownOption(s.to_string())),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let command = match positional.next().as_deref() {
            None => return Err(ConfigError::MissingCommand),
            Some("list") => Command::List,
            Some("probe") => {
                let id = positional.next().ok_or(ConfigError::MissingValue("probe"))?;
                Command::Probe { mapper: parse_number(&id)?, prg_kib, chr_kib }
            }
            Some("inspect") => {
                let path = positional.next().ok_or(ConfigError::MissingValue("inspect"))?;
                Command::Inspect { path: PathBuf::from(path) }
            }
            Some(other) => return Err(ConfigError::UnknownCommand(other.to_string())),
        };

        Ok(Self { command, verbose, color })
    }

    /// Default log filter; `RUST_LOG` overrides it.
    pub fn log_spec(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}
