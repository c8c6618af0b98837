//! Mapper 28 (Action 53): multicart board with outer and inner PRG banks.
//!
//! [Action 53](https://www.nesdev.org/wiki/Action_53_mapper): writes to $5000–$5FFF pick a
//! register (bits 7 and 0), writes to $8000–$FFFF go to it. $00 = CHR bank (bits 0–1),
//! $01 = inner PRG bank, $80 = mode (mirroring, PRG bank mode, outer bank size),
//! $81 = outer PRG bank in 32 KiB units.

use log::debug;

use crate::cartridge::mapper::{Chr, Mirroring, banked, mapper::Mapper, open_bus};
use crate::registry::regs;

pub struct Mapper28 {
    prg_rom: Vec<u8>,
    chr: Chr,
    select: u8,
    chr_bank: u8,
    inner: u8,
    mode: u8,
    outer: u8,
}

impl Mapper28 {
    /// Power-on: outer bank $FF and 32 KiB mode, so the last 32 KiB holds the reset vector.
    pub fn new(prg_rom: Vec<u8>, chr: Chr) -> Self {
        Self {
            prg_rom,
            chr,
            select: 0,
            chr_bank: 0,
            inner: 0,
            mode: 0,
            outer: 0xFF,
        }
    }

    /// 16 KiB bank at `addr`: outer bits above the size mask, inner bits below it.
    fn prg_bank_at(&self, addr: u16) -> usize {
        let a14 = ((addr >> 14) & 1) as usize;
        let size = ((self.mode & regs::A53_OUTER_MASK) >> 4) as usize;
        let mask = (2 << size) - 1;
        let inner = self.inner as usize;
        let inner = match self.mode & regs::A53_PRG_MODE_MASK {
            regs::A53_PRG_FIX_FIRST if a14 == 0 => 0,
            regs::A53_PRG_FIX_LAST if a14 == 1 => mask,
            regs::A53_PRG_FIX_FIRST | regs::A53_PRG_FIX_LAST => inner,
            _ => (inner << 1) | a14,
        };
        (((self.outer as usize) << 1) & !mask) | (inner & mask)
    }
}

impl Mapper for Mapper28 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.chr.read(self.chr_bank as usize, 0x2000, addr as usize),
            0x8000..=0xFFFF => banked(&self.prg_rom, self.prg_bank_at(addr), 0x4000, addr as usize),
            _ => open_bus(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => {
                self.chr.write(self.chr_bank as usize, 0x2000, addr as usize, data);
            }
            0x5000..=0x5FFF => self.select = data & 0x81,
            0x8000..=0xFFFF => {
                match self.select {
                    regs::A53_REG_CHR => self.chr_bank = data & 0x03,
                    regs::A53_REG_INNER => self.inner = data & 0x0F,
                    regs::A53_REG_MODE => self.mode = data & 0x3F,
                    _ => self.outer = data,
                }
                // One-screen modes take their screen from bit 4 of CHR/inner writes.
                if self.select & regs::A53_REG_MODE == 0 && self.mode & 0x02 == 0 {
                    let screen = (data & regs::A53_ONE_SCREEN_BIT) >> 4;
                    self.mode = (self.mode & !0x01) | screen;
                }
                debug!("A53 reg ${:02X} <- ${data:02X}", self.select);
            }
            _ => {}
        }
    }

    fn mirroring(&self) -> Mirroring {
        match self.mode & regs::A53_MIRROR_MASK {
            regs::A53_MIRROR_1LOWER => Mirroring::OneScreenLower,
            regs::A53_MIRROR_1UPPER => Mirroring::OneScreenUpper,
            regs::A53_MIRROR_V => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }
}
