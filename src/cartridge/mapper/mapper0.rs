//! Mapper 0 (NROM): no bank switching, 16/32KB PRG, 8KB CHR.

use crate::cartridge::mapper::{Chr, Mirroring, mapper::Mapper, open_bus};

/// NROM mapper: fixed PRG and CHR, optionally 16KB PRG mirror.
pub struct Mapper0 {
    prg_rom: Vec<u8>,
    chr: Chr,
    mirroring: Mirroring,
}

impl Mapper0 {
    /// Create Mapper0 with given PRG and CHR; mirroring comes from the board's solder pads.
    pub fn new(prg_rom: Vec<u8>, chr: Chr, mirroring: Mirroring) -> Self {
        Self { prg_rom, chr, mirroring }
    }
}

impl Mapper for Mapper0 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            // PRG ROM: $8000-$FFFF, mirror if 16KB
            0x8000..=0xFFFF if !self.prg_rom.is_empty() => {
                let addr = (addr - 0x8000) as usize;
                self.prg_rom[addr % self.prg_rom.len()]
            }
            // CHR ROM: $0000-$1FFF
            0x0000..=0x1FFF => self.chr.read(0, 0x2000, addr as usize),
            _ => open_bus(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        // CHR RAM only if cartridge has no CHR ROM
        if let 0x0000..=0x1FFF = addr {
            self.chr.write(0, 0x2000, addr as usize, data);
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_k_prg_is_mirrored() {
        let mut prg = vec![0; 0x4000];
        prg[0] = 0x42;
        let m = Mapper0::new(prg, Chr::rom(vec![0; 0x2000]), Mirroring::Vertical);
        assert_eq!(m.read(0x8000), 0x42);
        assert_eq!(m.read(0xC000), 0x42);
    }

    #[test]
    fn chr_ram_is_writable() {
        let mut m = Mapper0::new(vec![0; 0x8000], Chr::ram(0x2000), Mirroring::Horizontal);
        m.write(0x1234, 0x99);
        assert_eq!(m.read(0x1234), 0x99);
    }

    #[test]
    fn chr_rom_ignores_writes() {
        let mut m = Mapper0::new(vec![0; 0x8000], Chr::rom(vec![7; 0x2000]), Mirroring::Horizontal);
        m.write(0x0010, 0x99);
        assert_eq!(m.read(0x0010), 7);
    }
}
