//! Memory buses and address decoding.
//!
//! [`Bus`] is the CPU side: the bank controller and diagnostics issue every register write
//! and read through it. [`PpuBus`] is the PPU side: pattern fetches (which flip MMC2 latches
//! and clock the MMC3 counter) and nametable accesses through CIRAM.

use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::{Mirroring, open_bus};

/// CPU address space.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
    /// Advance `cycles` CPU cycles.
    fn tick(&mut self, _cycles: usize) {}
    /// Level of the cartridge IRQ line.
    fn poll_irq(&mut self) -> bool {
        false
    }
}

/// PPU address space ($0000–$3FFF).
pub trait PpuBus {
    fn ppu_read(&mut self, addr: u16) -> u8;
    fn ppu_write(&mut self, addr: u16, data: u8);
}

/// Console wiring around one cartridge: 2 KiB CPU RAM, 2 KiB CIRAM (4 KiB with four-screen
/// VRAM on the board), and palette RAM. PPU and APU registers are not modelled and read as
/// open bus.
pub struct CartBus {
    pub ram: [u8; 2048],
    pub cart: Cartridge,
    ciram: [u8; 0x1000],
    palette: [u8; 32],
}

impl CartBus {
    pub fn new(cart: Cartridge) -> Self {
        Self {
            ram: [0; 2048],
            cart,
            ciram: [0; 0x1000],
            palette: [0; 32],
        }
    }

    /// Map $2000–$3EFF to a CIRAM offset following the board's current mirroring.
    pub fn map_nametable_addr(addr: u16, mirroring: Mirroring) -> u16 {
        let addr = (addr - 0x2000) & 0xfff;
        let table = addr / 0x400;
        let offset = addr & 0x3ff;

        match mirroring {
            Mirroring::Vertical => (table & 1) * 0x400 + offset,
            Mirroring::Horizontal => (table >> 1) * 0x400 + offset,
            Mirroring::OneScreenLower => offset,
            Mirroring::OneScreenUpper => offset + 0x400,
            Mirroring::FourScreen => addr,
        }
    }

    fn palette_index(addr: u16) -> usize {
        let i = (addr & 0x1f) as usize;
        // $3F10/$3F14/$3F18/$3F1C mirror the background entries
        if i >= 0x10 && i & 3 == 0 { i - 0x10 } else { i }
    }
}

impl Bus for CartBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // Internal RAM (mirrored 4x in 0x0000-0x1FFF)
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x401F => open_bus(addr),
            // Expansion, WRAM, PRG ROM
            0x4020..=0xFFFF => self.cart.read(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            0x2000..=0x401F => {}
            // Cartridge: WRAM and mapper registers
            0x4020..=0xFFFF => self.cart.write(addr, data),
        }
    }

    fn tick(&mut self, cycles: usize) {
        for _ in 0..cycles {
            self.cart.clock_cpu();
        }
    }

    fn poll_irq(&mut self) -> bool {
        self.cart.irq()
    }
}

impl PpuBus for CartBus {
    fn ppu_read(&mut self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => {
                let data = self.cart.read(addr);
                // Latches switch after the fetch that triggers them
                self.cart.on_chr_access(addr);
                data
            }
            0x2000..=0x3EFF => {
                let i = Self::map_nametable_addr(addr, self.cart.mirroring());
                self.ciram[i as usize]
            }
            _ => self.palette[Self::palette_index(addr)],
        }
    }

    fn ppu_write(&mut self, addr: u16, data: u8) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => {
                self.cart.write(addr, data);
                self.cart.on_chr_access(addr);
            }
            0x2000..=0x3EFF => {
                let i = Self::map_nametable_addr(addr, self.cart.mirroring());
                self.ciram[i as usize] = data;
            }
            _ => self.palette[Self::palette_index(addr)] = data,
        }
    }
}
