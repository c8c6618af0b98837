//! Emulated cartridge boards.
//!
//! These stand in for the hardware the bank controller writes to: each one decodes
//! register writes the way the real chip does and maps PRG/CHR accordingly.
//!
//! - **mapper0**: NROM
//! - **mapper1**: MMC1, 5-bit serial port
//! - **mapper4**: MMC3, select/data pairs and A12 scanline IRQ
//! - **mapper9**: MMC2 and MMC4, tile-fetch CHR latches
//! - **mapper28**: Action 53
//! - **mapper69**: Sunsoft FME-7, command/parameter pairs and CPU cycle IRQ
//! - **discrete**: single-latch boards (UxROM, CNROM, AxROM, BNROM, GNROM, Color Dreams, UNROM 512)

use bitflags::bitflags;

use crate::registry::{Board, MapperDescriptor};

pub mod discrete;
pub mod mapper;
pub mod mapper0;
pub mod mapper1;
pub mod mapper28;
pub mod mapper4;
pub mod mapper69;
pub mod mapper9;

use mapper::Mapper;

/// Nametable mirroring mode for PPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    OneScreenLower,
    OneScreenUpper,
    FourScreen,
}

bitflags! {
    /// Set of mirroring modes a board can switch between.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MirroringSet: u8 {
        const VERTICAL = 0b0001;
        const HORIZONTAL = 0b0010;
        const ONE_SCREEN_LOWER = 0b0100;
        const ONE_SCREEN_UPPER = 0b1000;
    }
}

impl MirroringSet {
    /// Four-screen is wired on the board, never selected, so it has no flag.
    pub fn from_mode(mode: Mirroring) -> Option<Self> {
        match mode {
            Mirroring::Vertical => Some(Self::VERTICAL),
            Mirroring::Horizontal => Some(Self::HORIZONTAL),
            Mirroring::OneScreenLower => Some(Self::ONE_SCREEN_LOWER),
            Mirroring::OneScreenUpper => Some(Self::ONE_SCREEN_UPPER),
            Mirroring::FourScreen => None,
        }
    }

    /// Modes in the set, in a fixed order.
    pub fn modes(self) -> impl Iterator<Item = Mirroring> {
        [
            Mirroring::Vertical,
            Mirroring::Horizontal,
            Mirroring::OneScreenLower,
            Mirroring::OneScreenUpper,
        ]
        .into_iter()
        .filter(move |m| Self::from_mode(*m).is_some_and(|f| self.contains(f)))
    }
}

/// Value seen on an unmapped read: the high byte of the address left on the bus.
pub fn open_bus(addr: u16) -> u8 {
    (addr >> 8) as u8
}

/// Byte `offset` of bank `bank` (of `size` bytes), wrapping banks past the end of `mem`
/// the way missing high address lines do.
pub(crate) fn banked(mem: &[u8], bank: usize, size: usize, offset: usize) -> u8 {
    if mem.is_empty() {
        return 0;
    }
    let count = (mem.len() / size).max(1);
    mem[((bank % count) * size + (offset % size)) % mem.len()]
}

pub(crate) fn banked_mut(mem: &mut [u8], bank: usize, size: usize, offset: usize) -> Option<&mut u8> {
    if mem.is_empty() {
        return None;
    }
    let count = (mem.len() / size).max(1);
    let len = mem.len();
    mem.get_mut(((bank % count) * size + (offset % size)) % len)
}

/// Pattern table memory: CHR ROM, or CHR RAM when the board has no ROM.
pub struct Chr {
    pub data: Vec<u8>,
    pub writable: bool,
}

impl Chr {
    pub fn rom(data: Vec<u8>) -> Self {
        Self { data, writable: false }
    }

    pub fn ram(size: usize) -> Self {
        Self { data: vec![0; size], writable: true }
    }

    pub fn read(&self, bank: usize, size: usize, offset: usize) -> u8 {
        banked(&self.data, bank, size, offset)
    }

    pub fn write(&mut self, bank: usize, size: usize, offset: usize, data: u8) {
        if !self.writable {
            return;
        }
        if let Some(b) = banked_mut(&mut self.data, bank, size, offset) {
            *b = data;
        }
    }
}

/// Build the emulated board for a descriptor. `mirroring` is the header's solder-pad
/// setting, used by boards without mirroring control.
pub fn create(
    desc: &'static MapperDescriptor,
    prg_rom: Vec<u8>,
    chr: Chr,
    mirroring: Mirroring,
) -> Box<dyn Mapper> {
    match desc.board {
        Board::Nrom => Box::new(mapper0::Mapper0::new(prg_rom, chr, mirroring)),
        Board::Mmc1 => Box::new(mapper1::Mapper1::new(prg_rom, chr)),
        Board::Mmc3 => Box::new(mapper4::Mapper4::new(prg_rom, chr)),
        Board::Mmc2 => Box::new(mapper9::Mapper9::mmc2(prg_rom, chr)),
        Board::Mmc4 => Box::new(mapper9::Mapper9::mmc4(prg_rom, chr)),
        Board::Action53 => Box::new(mapper28::Mapper28::new(prg_rom, chr)),
        Board::Fme7 => Box::new(mapper69::Mapper69::new(prg_rom, chr)),
        Board::UxRom
        | Board::CnRom
        | Board::AxRom
        | Board::ColorDreams
        | Board::Unrom512
        | Board::BnRom
        | Board::GnRom => Box::new(discrete::LatchBoard::new(desc, prg_rom, chr, mirroring)),
    }
}
