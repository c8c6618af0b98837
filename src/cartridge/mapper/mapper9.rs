//! Mappers 9 and 10 (MMC2, MMC4): CHR banks chosen by tile-fetch latches.
//!
//! [MMC2](https://www.nesdev.org/wiki/MMC2) / [MMC4](https://www.nesdev.org/wiki/MMC4):
//! $A000 PRG bank, $B000/$C000 CHR $0000 for latch FD/FE, $D000/$E000 CHR $1000 for latch
//! FD/FE, $F000 mirroring. Each half of pattern memory has a latch that the PPU flips by
//! fetching tile $FD or $FE; the switch happens after the fetch completes.

use crate::cartridge::mapper::{Chr, Mirroring, banked, mapper::Mapper, open_bus};
use crate::registry::{Latch, regs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    /// 8 KiB PRG at $8000, three fixed 8 KiB banks above.
    Mmc2,
    /// 16 KiB PRG at $8000, fixed last 16 KiB, 8 KiB WRAM.
    Mmc4,
}

pub struct Mapper9 {
    variant: Variant,
    prg_rom: Vec<u8>,
    chr: Chr,
    wram: Vec<u8>,
    prg_bank: u8,
    /// Indexed by [half][latch]: FD = 0, FE = 1.
    chr_banks: [[u8; 2]; 2],
    latches: [Latch; 2],
    mirroring: Mirroring,
}

impl Mapper9 {
    pub fn mmc2(prg_rom: Vec<u8>, chr: Chr) -> Self {
        Self::new(Variant::Mmc2, prg_rom, chr)
    }

    pub fn mmc4(prg_rom: Vec<u8>, chr: Chr) -> Self {
        Self::new(Variant::Mmc4, prg_rom, chr)
    }

    fn new(variant: Variant, prg_rom: Vec<u8>, chr: Chr) -> Self {
        let wram = match variant {
            Variant::Mmc2 => Vec::new(),
            Variant::Mmc4 => vec![0; 8 * 1024],
        };
        Self {
            variant,
            prg_rom,
            chr,
            wram,
            prg_bank: 0,
            chr_banks: [[0; 2]; 2],
            latches: [Latch::Fe; 2],
            mirroring: Mirroring::Vertical,
        }
    }

    fn chr_bank_at(&self, addr: u16) -> usize {
        let half = (addr >> 12) as usize & 1;
        let latch = match self.latches[half] {
            Latch::Fd => 0,
            Latch::Fe => 1,
        };
        self.chr_banks[half][latch] as usize
    }

    fn prg_read(&self, addr: u16) -> u8 {
        match self.variant {
            Variant::Mmc2 => {
                let count = (self.prg_rom.len() / 0x2000).max(1);
                let bank = match addr {
                    0x8000..=0x9FFF => self.prg_bank as usize,
                    // $A000-$FFFF: last three 8 KiB banks
                    _ => count.saturating_sub(4) + ((addr - 0x8000) >> 13) as usize,
                };
                banked(&self.prg_rom, bank, 0x2000, addr as usize)
            }
            Variant::Mmc4 => {
                let count = (self.prg_rom.len() / 0x4000).max(1);
                let bank = if addr < 0xC000 { self.prg_bank as usize } else { count - 1 };
                banked(&self.prg_rom, bank, 0x4000, addr as usize)
            }
        }
    }
}

impl Mapper for Mapper9 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.chr.read(self.chr_bank_at(addr), 0x1000, addr as usize),
            0x6000..=0x7FFF if !self.wram.is_empty() => self.wram[(addr - 0x6000) as usize],
            0x8000..=0xFFFF => self.prg_read(addr),
            _ => open_bus(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => {
                let bank = self.chr_bank_at(addr);
                self.chr.write(bank, 0x1000, addr as usize, data);
            }
            0x6000..=0x7FFF => {
                if let Some(b) = self.wram.get_mut((addr - 0x6000) as usize) {
                    *b = data;
                }
            }
            0xA000..=0xAFFF => self.prg_bank = data & 0x0F,
            0xB000..=0xBFFF => self.chr_banks[0][0] = data & 0x1F,
            0xC000..=0xCFFF => self.chr_banks[0][1] = data & 0x1F,
            0xD000..=0xDFFF => self.chr_banks[1][0] = data & 0x1F,
            0xE000..=0xEFFF => self.chr_banks[1][1] = data & 0x1F,
            0xF000..=0xFFFF => {
                self.mirroring = if data & 1 == regs::MMC2_MIRROR_H {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                };
            }
            _ => {}
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn on_chr_access(&mut self, addr: u16) {
        let addr = addr & 0x1FFF;
        // MMC2 only decodes the exact low-half addresses; MMC4 decodes the whole tile row.
        let row = addr & 0xFFF8;
        let low = match self.variant {
            Variant::Mmc2 => addr,
            Variant::Mmc4 => row,
        };
        match (low, row) {
            (regs::MMC2_LATCH0_FD, _) => self.latches[0] = Latch::Fd,
            (regs::MMC2_LATCH0_FE, _) => self.latches[0] = Latch::Fe,
            (_, regs::MMC2_LATCH1_FD) => self.latches[1] = Latch::Fd,
            (_, regs::MMC2_LATCH1_FE) => self.latches[1] = Latch::Fe,
            _ => {}
        }
    }
}
