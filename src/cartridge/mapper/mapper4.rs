//! Mapper 4 (MMC3): bank switching, switchable mirroring, optional PRG RAM, scanline IRQ.
//!
//! [MMC3](https://www.nesdev.org/wiki/MMC3): Bank select at $8000–$9FFE (even), bank data at
//! $8001–$9FFF (odd). R0/R1 = 2 KiB CHR, R2–R5 = 1 KiB CHR, R6/R7 = 8 KiB PRG. Mirroring at
//! $A000–$BFFE (even), WRAM protect at $A001–$BFFF (odd). IRQ latch $C000, reload $C001,
//! disable $E000, enable $E001. IRQ counter clocks on PPU CHR A12 rising edge.

use log::debug;

use crate::cartridge::mapper::{Chr, Mirroring, banked, mapper::Mapper, open_bus};
use crate::registry::regs;

/// MMC3 state: bank registers, mirroring, PRG RAM, IRQ counter/latch/enable.
pub struct Mapper4 {
    prg_rom: Vec<u8>,
    chr: Chr,
    prg_ram: Vec<u8>,
    /// Bank select ($8000): bits 0–2 = register index, bit 6 = PRG mode, bit 7 = CHR A12 invert.
    bank_select: u8,
    /// R0–R5 CHR, R6–R7 PRG (R0/R1 are 2 KiB, others 1 KiB / 8 KiB).
    regs: [u8; 8],
    mirroring: Mirroring,
    /// PRG RAM enable (bit 7 of $A001).
    prg_ram_enable: bool,
    /// PRG RAM write protect (bit 6 of $A001).
    prg_ram_write_protect: bool,
    irq_latch: u8,
    irq_counter: u8,
    irq_reload_pending: bool,
    irq_enabled: bool,
    irq_pending: bool,
    /// Previous PPU A12 (from CHR address) to detect rising edge.
    last_chr_a12: bool,
}

impl Mapper4 {
    /// Create MMC3 with PRG ROM and CHR. PRG RAM 8 KiB is allocated for save RAM.
    pub fn new(prg_rom: Vec<u8>, chr: Chr) -> Self {
        Self {
            prg_rom,
            chr,
            prg_ram: vec![0; 8 * 1024],
            bank_select: 0,
            regs: [0; 8],
            mirroring: Mirroring::Vertical,
            prg_ram_enable: true,
            prg_ram_write_protect: false,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload_pending: false,
            irq_enabled: false,
            irq_pending: false,
            last_chr_a12: false,
        }
    }

    fn prg_bank_count(&self) -> usize {
        (self.prg_rom.len() / 0x2000).max(1)
    }

    /// Clock IRQ counter on PPU A12 rising edge.
    fn clock_irq(&mut self) {
        if self.irq_counter == 0 || self.irq_reload_pending {
            self.irq_counter = self.irq_latch;
            self.irq_reload_pending = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    /// 1 KiB CHR bank at `addr`. With CHR invert, the 2 KiB pair moves to $1000.
    fn chr_bank_at(&self, addr: u16) -> usize {
        let addr = if self.bank_select & regs::MMC3_CHR_INVERT != 0 {
            addr ^ 0x1000
        } else {
            addr
        };
        let slot = (addr >> 10) as usize & 7;
        match slot {
            // Two 2 KiB banks: R0/R1 with the low bit replaced by A10
            0..=3 => (self.regs[slot >> 1] & 0xFE) as usize | (slot & 1),
            _ => self.regs[slot - 2] as usize,
        }
    }

    /// 8 KiB PRG bank at `addr`. With PRG swap, R6 moves to $C000 and $8000 is fixed.
    fn prg_bank_at(&self, addr: u16) -> usize {
        let last = self.prg_bank_count() - 1;
        let second_last = last.saturating_sub(1);
        let r6 = (self.regs[6] & 0x3F) as usize;
        let r7 = (self.regs[7] & 0x3F) as usize;
        let swap = self.bank_select & regs::MMC3_PRG_SWAP != 0;
        match ((addr - 0x8000) >> 13, swap) {
            (0, false) | (2, true) => r6,
            (0, true) | (2, false) => second_last,
            (1, _) => r7,
            _ => last,
        }
    }
}

impl Mapper for Mapper4 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.chr.read(self.chr_bank_at(addr), 0x400, addr as usize),
            0x6000..=0x7FFF if self.prg_ram_enable => self.prg_ram[(addr - 0x6000) as usize],
            0x8000..=0xFFFF => banked(&self.prg_rom, self.prg_bank_at(addr), 0x2000, addr as usize),
            _ => open_bus(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => {
                let bank = self.chr_bank_at(addr);
                self.chr.write(bank, 0x400, addr as usize, data);
            }
            0x6000..=0x7FFF => {
                if self.prg_ram_enable && !self.prg_ram_write_protect {
                    self.prg_ram[(addr - 0x6000) as usize] = data;
                }
            }
            0x8000..=0x9FFF => {
                if addr & 1 == 0 {
                    self.bank_select = data;
                } else {
                    let r = (self.bank_select & regs::MMC3_REG_MASK) as usize;
                    self.regs[r] = data;
                    debug!("MMC3 R{r} <- ${data:02X}");
                }
            }
            0xA000..=0xBFFF => {
                if addr & 1 == 0 {
                    self.mirroring = if data & 1 == regs::MMC3_MIRROR_H {
                        Mirroring::Horizontal
                    } else {
                        Mirroring::Vertical
                    };
                } else {
                    self.prg_ram_enable = data & 0x80 != 0;
                    self.prg_ram_write_protect = data & 0x40 != 0;
                }
            }
            0xC000..=0xDFFF => {
                if addr & 1 == 0 {
                    self.irq_latch = data;
                } else {
                    self.irq_reload_pending = true;
                    self.irq_counter = 0;
                }
            }
            0xE000..=0xFFFF => {
                if addr & 1 == 0 {
                    self.irq_enabled = false;
                    self.irq_pending = false;
                } else {
                    self.irq_enabled = true;
                }
            }
            _ => {}
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Clocks IRQ counter on A12 rising edge.
    fn on_chr_access(&mut self, addr: u16) {
        let a12 = (addr & 0x1000) != 0;
        if !self.last_chr_a12 && a12 {
            self.clock_irq();
        }
        self.last_chr_a12 = a12;
    }

    fn irq(&self) -> bool {
        self.irq_pending
    }
}
