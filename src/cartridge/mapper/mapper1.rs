//! Mapper 1 (MMC1): bank switching via 5-bit shift register.
//!
//! [MMC1](https://www.nesdev.org/wiki/MMC1): writes to $8000–$9FFF (control), $A000–$BFFF (CHR0),
//! $C000–$DFFF (CHR1), $E000–$FFFF (PRG bank). Any write with bit 7 set resets the shift register.
//! Otherwise, bit 0 is shifted in (LSB first); after 5 writes, the value is latched to the register
//! selected by address bits 13–14 of the fifth write. Control bits 0–1 = mirroring; bits 2–3 = PRG
//! mode; bit 4 = CHR mode. PRG bit 4 disables WRAM (MMC1B).

use log::debug;

use crate::cartridge::mapper::{Chr, Mirroring, mapper::Mapper, open_bus};
use crate::registry::regs;

/// MMC1 state: 5-bit shift register, control byte, CHR and PRG bank selects, 8 KiB WRAM.
pub struct Mapper1 {
    prg_rom: Vec<u8>,
    chr: Chr,
    wram: Vec<u8>,
    shift_reg: u8,
    shift_count: u8,
    control: u8,
    chr0: u8,
    chr1: u8,
    prg_bank: u8,
}

impl Mapper1 {
    /// Create MMC1. Control defaults to $0C (PRG mode 3: $8000 switchable, $C000 fixed last).
    pub fn new(prg_rom: Vec<u8>, chr: Chr) -> Self {
        Self {
            prg_rom,
            chr,
            wram: vec![0; 8 * 1024],
            shift_reg: 0,
            shift_count: 0,
            control: regs::MMC1_PRG_FIX_LAST,
            chr0: 0,
            chr1: 0,
            prg_bank: 0,
        }
    }

    /// PRG bank mode from control bits 2–3: 0/1 = 32 KiB mode; 2 = $8000 fixed first, $C000 switchable; 3 = $8000 switchable, $C000 fixed last.
    fn prg_bank_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    fn prg_bank_count(&self) -> usize {
        (self.prg_rom.len() / 0x4000).max(1)
    }

    fn wram_enabled(&self) -> bool {
        self.prg_bank & regs::MMC1_WRAM_OFF == 0
    }

    /// 16 KiB bank mapped at `addr`.
    fn prg_bank_at(&self, addr: u16) -> usize {
        let bank = (self.prg_bank & 0x0F) as usize;
        let upper = addr >= 0xC000;
        match self.prg_bank_mode() {
            0 | 1 => (bank & !1) | upper as usize,
            2 if upper => bank,
            2 => 0,
            _ if upper => self.prg_bank_count() - 1,
            _ => bank,
        }
    }

    /// 4 KiB CHR bank mapped at `addr`.
    fn chr_bank_at(&self, addr: u16) -> usize {
        let upper = addr >= 0x1000;
        if self.control & regs::MMC1_CHR4K == 0 {
            (self.chr0 & !1) as usize | upper as usize
        } else if upper {
            self.chr1 as usize
        } else {
            self.chr0 as usize
        }
    }
}

impl Mapper for Mapper1 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.chr.read(self.chr_bank_at(addr), 0x1000, addr as usize),
            0x6000..=0x7FFF if self.wram_enabled() => self.wram[(addr - 0x6000) as usize],
            // PRG: bank mode and prg_bank select which 16 KiB bank(s) appear at $8000 and $C000.
            0x8000..=0xFFFF => {
                super::banked(&self.prg_rom, self.prg_bank_at(addr), 0x4000, addr as usize)
            }
            _ => open_bus(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => {
                let bank = self.chr_bank_at(addr);
                self.chr.write(bank, 0x1000, addr as usize, data);
                return;
            }
            0x6000..=0x7FFF => {
                if self.wram_enabled() {
                    self.wram[(addr - 0x6000) as usize] = data;
                }
                return;
            }
            0x8000..=0xFFFF => {}
            _ => return,
        }

        // MMC1: write with bit 7 set resets shift register and sets PRG mode 3.
        if data & regs::MMC1_RESET != 0 {
            self.shift_reg = 0;
            self.shift_count = 0;
            self.control |= regs::MMC1_PRG_FIX_LAST;
            return;
        }

        // Shift in LSB (bit 0); after 5 writes, latch to the register selected by address.
        self.shift_reg >>= 1;
        self.shift_reg |= (data & 1) << 4;
        self.shift_count += 1;

        if self.shift_count < 5 {
            return;
        }

        let value = self.shift_reg & 0x1F;
        match addr {
            0x8000..=0x9FFF => self.control = value,
            0xA000..=0xBFFF => self.chr0 = value,
            0xC000..=0xDFFF => self.chr1 = value,
            _ => self.prg_bank = value,
        }
        debug!("MMC1 ${addr:04X} <- ${value:02X}");

        self.shift_reg = 0;
        self.shift_count = 0;
    }

    /// Mirroring from control bits 0–1: 0 = one-screen lower, 1 = one-screen upper, 2 = vertical, 3 = horizontal.
    fn mirroring(&self) -> Mirroring {
        match self.control & regs::MMC1_MIRROR_MASK {
            regs::MMC1_MIRROR_1LOWER => Mirroring::OneScreenLower,
            regs::MMC1_MIRROR_1UPPER => Mirroring::OneScreenUpper,
            regs::MMC1_MIRROR_V => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }
}
