//! Error types for the registry, bank controller, and cartridge loader.
//!
//! Errors are plain values: the diagnostics layer turns a [`MapperError`] into a one-byte
//! result code with [`MapperError::code`] instead of aborting.

use std::io;

use thiserror::Error;

use crate::cartridge::mapper::Mirroring;

/// Optional chip capability that an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Irq,
    Wram,
    WramProtect,
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Feature::Irq => "IRQ counter",
            Feature::Wram => "WRAM control",
            Feature::WramProtect => "WRAM write protect",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapperError {
    #[error("unknown mapper {0}")]
    UnknownMapper(u16),
    #[error("mirroring mode {0:?} is not supported by this board")]
    UnsupportedMode(Mirroring),
    #[error("{0} is not present on this board")]
    NotSupported(Feature),
    #[error("window {window} does not exist (board has {count})")]
    InvalidWindow { window: usize, count: usize },
    #[error("bank {bank} does not fit the register (max {max})")]
    BankOutOfRange { bank: u16, max: u16 },
    #[error("IRQ period {0} is out of range")]
    InvalidIrqPeriod(u32),
    #[error("mapper has not been initialized")]
    NotInitialized,
}

impl MapperError {
    /// Result code as reported by the diagnostics layer. Zero is reserved for success.
    pub fn code(&self) -> u8 {
        match self {
            MapperError::UnknownMapper(_) => 1,
            MapperError::UnsupportedMode(_) => 2,
            MapperError::NotSupported(_) => 3,
            MapperError::InvalidWindow { .. } => 4,
            MapperError::BankOutOfRange { .. } => 5,
            MapperError::InvalidIrqPeriod(_) => 6,
            MapperError::NotInitialized => 7,
        }
    }
}

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
    #[error("not an iNES file")]
    Format,
    #[error("file is truncated: need {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("invalid PRG ROM size {0}")]
    PrgSize(usize),
    #[error("invalid CHR size {0}")]
    ChrSize(usize),
    #[error(transparent)]
    Mapper(#[from] MapperError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing command")]
    MissingCommand,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("`{0}` needs a value")]
    MissingValue(&'static str),
    #[error("`{0}` is not a number")]
    InvalidNumber(String),
}
