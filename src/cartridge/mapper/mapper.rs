//! Mapper trait: PRG/CHR memory access, mirroring, and IRQ lines.

use crate::cartridge::mapper::Mirroring;

/// Trait for NES cartridge boards. CPU and PPU use these for all cartridge address space.
///
/// Addresses $0000–$1FFF are the PPU pattern tables; $4020–$FFFF are CPU space.
/// The bus never forwards CPU RAM or PPU register accesses, so the two ranges don't clash.
pub trait Mapper {
    /// Read CHR ($0000–$1FFF), expansion/WRAM ($4020–$7FFF), or PRG ($8000–$FFFF).
    fn read(&self, addr: u16) -> u8;
    /// Write CHR RAM, WRAM, or mapper registers.
    fn write(&mut self, addr: u16, data: u8);
    /// Current nametable mirroring for the PPU.
    fn mirroring(&self) -> Mirroring;

    /// Called after every PPU pattern fetch (MMC2 latches, MMC3 A12 clocking).
    fn on_chr_access(&mut self, _addr: u16) {}

    /// Advance one CPU cycle (cycle-based IRQ counters).
    fn clock_cpu(&mut self) {}

    /// Current level of the cartridge IRQ line.
    fn irq(&self) -> bool {
        false
    }
}
