//! Single-latch discrete boards: UxROM (2), CNROM (3), AxROM (7), Color Dreams (11),
//! UNROM 512 (30), BNROM (34), GNROM (66).
//!
//! One 8-bit latch anywhere in $8000–$FFFF holds PRG, CHR, and one-screen select fields.
//! The field layout comes from the board's [`LatchLayout`]. Boards with bus conflicts see
//! the written value ANDed with the ROM byte at the same address.

use log::debug;

use crate::cartridge::mapper::{Chr, Mirroring, banked, mapper::Mapper, open_bus};
use crate::registry::{Field, LatchLayout, MapperDescriptor};

pub struct LatchBoard {
    name: &'static str,
    layout: LatchLayout,
    bus_conflicts: bool,
    /// 16 KiB switchable + fixed last bank; otherwise 32 KiB.
    prg_16k: bool,
    prg_rom: Vec<u8>,
    chr: Chr,
    latch: u8,
    solder_mirroring: Mirroring,
}

impl LatchBoard {
    pub fn new(desc: &'static MapperDescriptor, prg_rom: Vec<u8>, chr: Chr, mirroring: Mirroring) -> Self {
        let layout = desc.latch.unwrap_or(LatchLayout {
            prg: Field::NONE,
            chr: Field::NONE,
            screen: Field::NONE,
        });
        let prg_16k = desc.prg_windows.first().is_some_and(|w| w.size == 0x4000);
        Self {
            name: desc.name,
            layout,
            bus_conflicts: desc.bus_conflicts,
            prg_16k,
            prg_rom,
            chr,
            latch: 0,
            solder_mirroring: mirroring,
        }
    }

    fn prg_read(&self, addr: u16) -> u8 {
        let bank = self.layout.prg.extract(self.latch) as usize;
        if self.prg_16k {
            let bank = if addr < 0xC000 {
                bank
            } else {
                (self.prg_rom.len() / 0x4000).max(1) - 1
            };
            banked(&self.prg_rom, bank, 0x4000, addr as usize)
        } else {
            banked(&self.prg_rom, bank, 0x8000, addr as usize)
        }
    }

    fn chr_bank(&self) -> usize {
        self.layout.chr.extract(self.latch) as usize
    }
}

impl Mapper for LatchBoard {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.chr.read(self.chr_bank(), 0x2000, addr as usize),
            0x8000..=0xFFFF => self.prg_read(addr),
            _ => open_bus(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => {
                let bank = self.chr_bank();
                self.chr.write(bank, 0x2000, addr as usize, data);
            }
            0x8000..=0xFFFF => {
                let value = if self.bus_conflicts {
                    data & self.prg_read(addr)
                } else {
                    data
                };
                if value != data {
                    debug!("{} bus conflict at ${addr:04X}: ${data:02X} -> ${value:02X}", self.name);
                }
                self.latch = value;
            }
            _ => {}
        }
    }

    fn mirroring(&self) -> Mirroring {
        if !self.layout.screen.is_present() {
            self.solder_mirroring
        } else if self.layout.screen.extract(self.latch) != 0 {
            Mirroring::OneScreenUpper
        } else {
            Mirroring::OneScreenLower
        }
    }
}
