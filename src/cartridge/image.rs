//! Synthesized test images.
//!
//! Every 8 KiB PRG page starts with its own page number and ends with the identity table
//! at offset $1F00, so a latch write to `$FF00 + value` survives bus conflicts no matter
//! which bank is mapped. Every 1 KiB CHR ROM page starts with its page number.

use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::{Chr, Mirroring};
use crate::error::CartridgeError;
use crate::registry::{Board, MapperDescriptor, WindowSpec};

pub const PRG_PAGE: usize = 0x2000;
pub const CHR_PAGE: usize = 0x400;

/// Offset of the identity table inside each PRG page.
pub const IDENTITY_OFFSET: usize = 0x1F00;

/// Sizes and CHR kind of an image to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSpec {
    pub prg_size: usize,
    pub chr_size: usize,
    pub chr_ram: bool,
}

/// Bytes reachable through a board's first window of the given kind.
fn reachable(windows: &[WindowSpec]) -> Option<usize> {
    windows.first().map(|w| (w.max_bank as usize + 1) * w.size as usize)
}

impl ImageSpec {
    /// Largest image the board's registers can address. Boards that shipped with CHR RAM
    /// get CHR RAM.
    pub fn for_board(desc: &MapperDescriptor) -> Self {
        let prg_size = reachable(desc.prg_windows).unwrap_or(0x8000).max(0x8000);
        let chr_ram = matches!(
            desc.board,
            Board::UxRom | Board::AxRom | Board::BnRom | Board::Action53 | Board::Unrom512
        );
        let chr_size = reachable(desc.chr_windows).unwrap_or(0x2000).max(0x2000);
        Self { prg_size, chr_size, chr_ram }
    }

    pub fn with_prg_kib(mut self, kib: usize) -> Result<Self, CartridgeError> {
        self.prg_size = kib.checked_mul(1024).ok_or(CartridgeError::PrgSize(usize::MAX))?;
        Ok(self)
    }

    pub fn with_chr_kib(mut self, kib: usize) -> Result<Self, CartridgeError> {
        self.chr_size = kib.checked_mul(1024).ok_or(CartridgeError::ChrSize(usize::MAX))?;
        Ok(self)
    }

    /// PRG must be a power of two of at least 16 KiB, like every real board, and no
    /// larger than `desc` can address. The same goes for CHR with an 8 KiB minimum.
    pub fn validate(&self, desc: &MapperDescriptor) -> Result<(), CartridgeError> {
        let limit = Self::for_board(desc);
        if self.prg_size < 0x4000 || !self.prg_size.is_power_of_two() || self.prg_size > limit.prg_size {
            return Err(CartridgeError::PrgSize(self.prg_size));
        }
        if self.chr_size < 0x2000 || !self.chr_size.is_power_of_two() || self.chr_size > limit.chr_size {
            return Err(CartridgeError::ChrSize(self.chr_size));
        }
        Ok(())
    }
}

pub fn tagged_prg(size: usize) -> Vec<u8> {
    let mut prg = vec![0xFF; size];
    for (page, chunk) in prg.chunks_mut(PRG_PAGE).enumerate() {
        chunk[0] = page as u8;
        if let Some(table) = chunk.get_mut(IDENTITY_OFFSET..) {
            for (i, b) in table.iter_mut().enumerate() {
                *b = i as u8;
            }
        }
    }
    prg
}

pub fn tagged_chr(size: usize) -> Vec<u8> {
    let mut chr = vec![0; size];
    for (page, chunk) in chr.chunks_mut(CHR_PAGE).enumerate() {
        chunk[0] = page as u8;
    }
    chr
}

/// Build a tagged cartridge for `desc`. Sizes are checked before anything is allocated. Boards without mirroring control are wired vertical.
pub fn synthesize(desc: &'static MapperDescriptor, spec: &ImageSpec) -> Result<Cartridge, CartridgeError> {
    spec.validate(desc)?;
    let chr = if spec.chr_ram {
        Chr::ram(spec.chr_size)
    } else {
        Chr::rom(tagged_chr(spec.chr_size))
    };
    Ok(Cartridge::from_parts(desc, tagged_prg(spec.prg_size), chr, Mirroring::Vertical))
}
