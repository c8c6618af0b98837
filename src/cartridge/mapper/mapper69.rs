//! Mapper 69 (Sunsoft FME-7): command/parameter register pair and a CPU cycle IRQ.
//!
//! [FME-7](https://www.nesdev.org/wiki/Sunsoft_FME-7): $8000 selects a command (0–15),
//! $A000 writes its parameter. Commands 0–7 = 1 KiB CHR banks, 8 = $6000 bank (ROM or
//! RAM, with RAM enable), 9–B = 8 KiB PRG at $8000/$A000/$C000, C = mirroring,
//! D = IRQ control, E/F = IRQ counter low/high. $E000 is fixed to the last bank.

use log::debug;

use crate::cartridge::mapper::{Chr, Mirroring, banked, mapper::Mapper, open_bus};
use crate::registry::regs;

pub struct Mapper69 {
    prg_rom: Vec<u8>,
    chr: Chr,
    wram: Vec<u8>,
    command: u8,
    chr_banks: [u8; 8],
    /// Command 8: bit 7 = RAM enable, bit 6 = RAM select, bits 0–5 = ROM bank.
    prg_6000: u8,
    prg_banks: [u8; 3],
    mirroring: u8,
    irq_enabled: bool,
    irq_counting: bool,
    irq_counter: u16,
    irq_pending: bool,
}

impl Mapper69 {
    pub fn new(prg_rom: Vec<u8>, chr: Chr) -> Self {
        Self {
            prg_rom,
            chr,
            wram: vec![0; 8 * 1024],
            command: 0,
            chr_banks: [0; 8],
            prg_6000: 0,
            prg_banks: [0; 3],
            mirroring: 0,
            irq_enabled: false,
            irq_counting: false,
            irq_counter: 0,
            irq_pending: false,
        }
    }

    fn prg_bank_count(&self) -> usize {
        (self.prg_rom.len() / 0x2000).max(1)
    }

    fn ram_selected(&self) -> bool {
        self.prg_6000 & 0x40 != 0
    }

    fn ram_enabled(&self) -> bool {
        self.prg_6000 & 0x80 != 0
    }

    fn write_parameter(&mut self, data: u8) {
        match self.command {
            0..=7 => self.chr_banks[self.command as usize] = data,
            regs::FME7_PRG_6000 => self.prg_6000 = data,
            0x09..=0x0B => self.prg_banks[(self.command - regs::FME7_PRG_8000) as usize] = data & 0x3F,
            regs::FME7_MIRRORING => self.mirroring = data & 0x03,
            regs::FME7_IRQ_CONTROL => {
                self.irq_enabled = data & regs::FME7_IRQ_ENABLE != 0;
                self.irq_counting = data & regs::FME7_IRQ_COUNT != 0;
                // Any write here acknowledges a pending IRQ.
                self.irq_pending = false;
            }
            regs::FME7_IRQ_COUNTER_LO => self.irq_counter = (self.irq_counter & 0xFF00) | data as u16,
            _ => self.irq_counter = (self.irq_counter & 0x00FF) | ((data as u16) << 8),
        }
        debug!("FME-7 cmd ${:X} <- ${data:02X}", self.command);
    }
}

impl Mapper for Mapper69 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => {
                let bank = self.chr_banks[(addr >> 10) as usize] as usize;
                self.chr.read(bank, 0x400, addr as usize)
            }
            0x6000..=0x7FFF => match (self.ram_selected(), self.ram_enabled()) {
                (true, true) => self.wram[(addr - 0x6000) as usize],
                (true, false) => open_bus(addr),
                (false, _) => banked(&self.prg_rom, (self.prg_6000 & 0x3F) as usize, 0x2000, addr as usize),
            },
            0x8000..=0xDFFF => {
                let bank = self.prg_banks[((addr - 0x8000) >> 13) as usize] as usize;
                banked(&self.prg_rom, bank, 0x2000, addr as usize)
            }
            0xE000..=0xFFFF => banked(&self.prg_rom, self.prg_bank_count() - 1, 0x2000, addr as usize),
            _ => open_bus(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => {
                let bank = self.chr_banks[(addr >> 10) as usize] as usize;
                self.chr.write(bank, 0x400, addr as usize, data);
            }
            0x6000..=0x7FFF => {
                if self.ram_selected() && self.ram_enabled() {
                    self.wram[(addr - 0x6000) as usize] = data;
                }
            }
            0x8000..=0x9FFF => self.command = data & 0x0F,
            0xA000..=0xBFFF => self.write_parameter(data),
            _ => {}
        }
    }

    fn mirroring(&self) -> Mirroring {
        match self.mirroring {
            regs::FME7_MIRROR_V => Mirroring::Vertical,
            regs::FME7_MIRROR_H => Mirroring::Horizontal,
            regs::FME7_MIRROR_1LOWER => Mirroring::OneScreenLower,
            _ => Mirroring::OneScreenUpper,
        }
    }

    /// The counter decrements every CPU cycle; wrapping from $0000 to $FFFF raises the IRQ.
    fn clock_cpu(&mut self) {
        if !self.irq_counting {
            return;
        }
        self.irq_counter = self.irq_counter.wrapping_sub(1);
        if self.irq_counter == 0xFFFF && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    fn irq(&self) -> bool {
        self.irq_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Mapper69 {
        let mut prg = vec![0; 8 * 0x2000];
        for bank in 0..8 {
            prg[bank * 0x2000] = bank as u8;
        }
        Mapper69::new(prg, Chr::ram(0x2000 * 4))
    }

    fn cmd(m: &mut Mapper69, command: u8, value: u8) {
        m.write(regs::FME7_SELECT, command);
        m.write(regs::FME7_DATA, value);
    }

    #[test]
    fn three_prg_windows_and_fixed_last() {
        let mut m = setup();
        cmd(&mut m, 0x09, 1);
        cmd(&mut m, 0x0A, 2);
        cmd(&mut m, 0x0B, 3);
        assert_eq!(m.read(0x8000), 1);
        assert_eq!(m.read(0xA000), 2);
        assert_eq!(m.read(0xC000), 3);
        assert_eq!(m.read(0xE000), 7);
    }

    #[test]
    fn wram_enable_and_disable() {
        let mut m = setup();
        cmd(&mut m, regs::FME7_PRG_6000, regs::FME7_WRAM_ON);
        m.write(0x6000, 0x77);
        assert_eq!(m.read(0x6000), 0x77);
        cmd(&mut m, regs::FME7_PRG_6000, regs::FME7_WRAM_OFF);
        assert_eq!(m.read(0x6000), open_bus(0x6000));
        cmd(&mut m, regs::FME7_PRG_6000, 5);
        assert_eq!(m.read(0x6000), 5);
    }

    #[test]
    fn all_four_mirroring_modes() {
        let mut m = setup();
        for (value, mode) in [
            (regs::FME7_MIRROR_V, Mirroring::Vertical),
            (regs::FME7_MIRROR_H, Mirroring::Horizontal),
            (regs::FME7_MIRROR_1LOWER, Mirroring::OneScreenLower),
            (regs::FME7_MIRROR_1UPPER, Mirroring::OneScreenUpper),
        ] {
            cmd(&mut m, regs::FME7_MIRRORING, value);
            assert_eq!(m.mirroring(), mode);
        }
    }

    #[test]
    fn irq_after_counter_plus_one_cycles() {
        let mut m = setup();
        cmd(&mut m, regs::FME7_IRQ_COUNTER_LO, 9);
        cmd(&mut m, regs::FME7_IRQ_COUNTER_HI, 0);
        cmd(&mut m, regs::FME7_IRQ_CONTROL, regs::FME7_IRQ_ENABLE | regs::FME7_IRQ_COUNT);
        for _ in 0..9 {
            m.clock_cpu();
        }
        assert!(!m.irq());
        m.clock_cpu();
        assert!(m.irq());
        cmd(&mut m, regs::FME7_IRQ_CONTROL, 0);
        assert!(!m.irq());
    }
}
