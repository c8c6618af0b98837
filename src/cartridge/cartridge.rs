//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mapper, etc.), then an optional
//! 512-byte trainer, PRG ROM, then CHR ROM. [NES 2.0](https://www.nesdev.org/wiki/NES_2.0) headers
//! add mapper bits 8–11, a submapper, size MSBs, and an explicit CHR RAM size.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::cartridge::mapper::{self, Chr, Mirroring, mapper::Mapper};
use crate::error::{CartridgeError, MapperError};
use crate::registry::{self, Board, MapperDescriptor};

const NES_MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];
const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;

/// Parsed 16-byte header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub mapper: u16,
    pub submapper: u8,
    pub prg_rom_size: usize,
    pub chr_rom_size: usize,
    /// CHR RAM size when the board has no CHR ROM.
    pub chr_ram_size: usize,
    pub mirroring: Mirroring,
    pub has_trainer: bool,
    pub has_battery: bool,
    pub nes2: bool,
}

impl Header {
    pub fn parse(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN {
            return Err(CartridgeError::Truncated { expected: HEADER_LEN, actual: data.len() });
        }
        if data[..4] != NES_MAGIC {
            return Err(CartridgeError::Format);
        }

        let flags6 = data[6];
        let flags7 = data[7];
        // Bits 2-3 of byte 7 equal to 2 mark NES 2.0
        let nes2 = flags7 & 0x0C == 0x08;

        let mut mapper = u16::from((flags7 & 0xF0) | (flags6 >> 4));
        let mut prg_units = usize::from(data[4]);
        let mut chr_units = usize::from(data[5]);
        let mut submapper = 0;
        let mut chr_ram_size = 0;
        if nes2 {
            mapper |= u16::from(data[8] & 0x0F) << 8;
            submapper = data[8] >> 4;
            prg_units |= usize::from(data[9] & 0x0F) << 8;
            chr_units |= usize::from(data[9] & 0xF0) << 4;
            let shift = data[11] & 0x0F;
            if shift != 0 {
                chr_ram_size = 64 << shift;
            }
        }

        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        Ok(Self {
            mapper,
            submapper,
            prg_rom_size: prg_units * 16 * 1024,
            chr_rom_size: chr_units * 8 * 1024,
            chr_ram_size,
            mirroring,
            has_trainer: flags6 & 0x04 != 0,
            has_battery: flags6 & 0x02 != 0,
            nes2,
        })
    }

    /// Registry entry for this header's mapper number.
    pub fn descriptor(&self) -> Result<&'static MapperDescriptor, MapperError> {
        let id = u8::try_from(self.mapper).map_err(|_| MapperError::UnknownMapper(self.mapper))?;
        registry::resolve(id)
    }
}

/// CHR RAM size a board gets when the header does not say.
pub fn default_chr_ram(desc: &MapperDescriptor) -> usize {
    match desc.board {
        Board::Unrom512 | Board::Action53 => 32 * 1024,
        _ => 8 * 1024,
    }
}

/// Cartridge: header, registry descriptor, and the board that implements the address space.
/// CPU reads PRG via bus at $8000–$FFFF; PPU reads CHR at $0000–$1FFF (pattern tables).
pub struct Cartridge {
    pub header: Header,
    pub descriptor: &'static MapperDescriptor,
    pub mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Load cartridge from an iNES file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let path = path.as_ref();
        info!("Loading cartridge from {}", path.display());
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        let header = Header::parse(data)?;
        let descriptor = header.descriptor()?;

        let prg_start = HEADER_LEN + if header.has_trainer { TRAINER_LEN } else { 0 };
        let prg_end = prg_start + header.prg_rom_size;
        let chr_end = prg_end + header.chr_rom_size;
        if data.len() < chr_end {
            return Err(CartridgeError::Truncated { expected: chr_end, actual: data.len() });
        }
        if header.prg_rom_size == 0 {
            return Err(CartridgeError::PrgSize(0));
        }

        let chr = if header.chr_rom_size > 0 {
            Chr::rom(data[prg_end..chr_end].to_vec())
        } else if header.chr_ram_size > 0 {
            Chr::ram(header.chr_ram_size)
        } else {
            Chr::ram(default_chr_ram(descriptor))
        };

        info!(
            "Mapper {} ({}), PRG ROM {} KiB, CHR {} {} KiB",
            header.mapper,
            descriptor.name,
            header.prg_rom_size / 1024,
            if chr.writable { "RAM" } else { "ROM" },
            chr.data.len() / 1024,
        );
        debug!("Header: {header:?}");

        let mapper = mapper::create(descriptor, data[prg_start..prg_end].to_vec(), chr, header.mirroring);
        Ok(Self { header, descriptor, mapper })
    }

    /// Build a cartridge from raw PRG and CHR without a file.
    pub fn from_parts(descriptor: &'static MapperDescriptor, prg_rom: Vec<u8>, chr: Chr, mirroring: Mirroring) -> Self {
        let header = Header {
            mapper: u16::from(descriptor.id),
            submapper: 0,
            prg_rom_size: prg_rom.len(),
            chr_rom_size: if chr.writable { 0 } else { chr.data.len() },
            chr_ram_size: if chr.writable { chr.data.len() } else { 0 },
            mirroring,
            has_trainer: false,
            has_battery: false,
            nes2: false,
        };
        let mapper = mapper::create(descriptor, prg_rom, chr, mirroring);
        Self { header, descriptor, mapper }
    }

    /// Read: PRG space ($8000–$FFFF) or CHR ($0000–$1FFF) depending on addr. Mapper dispatches.
    pub fn read(&self, addr: u16) -> u8 {
        self.mapper.read(addr)
    }

    /// Write: CHR RAM (if present) or mapper registers (e.g. MMC1 shift register). PRG ROM is R/O.
    pub fn write(&mut self, addr: u16, data: u8) {
        self.mapper.write(addr, data);
    }

    /// Notify mapper of PPU CHR read (MMC2 latches, MMC3 IRQ counter on A12 rising edge).
    pub fn on_chr_access(&mut self, addr: u16) {
        self.mapper.on_chr_access(addr);
    }

    pub fn clock_cpu(&mut self) {
        self.mapper.clock_cpu();
    }

    /// Level of the cartridge IRQ line.
    pub fn irq(&self) -> bool {
        self.mapper.irq()
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::id;

    fn ines(mapper: u8, prg_units: u8, chr_units: u8, flags6_low: u8) -> Vec<u8> {
        let mut data = vec![0; HEADER_LEN];
        data[..4].copy_from_slice(&NES_MAGIC);
        data[4] = prg_units;
        data[5] = chr_units;
        data[6] = (mapper << 4) | flags6_low;
        data[7] = mapper & 0xF0;
        data.resize(HEADER_LEN + prg_units as usize * 0x4000 + chr_units as usize * 0x2000, 0);
        data
    }

    #[test]
    fn parses_mapper_number_from_both_nibbles() {
        let header = Header::parse(&ines(id::FME7, 2, 1, 0)).unwrap();
        assert_eq!(header.mapper, 69);
        assert_eq!(header.prg_rom_size, 32 * 1024);
        assert_eq!(header.chr_rom_size, 8 * 1024);
        assert_eq!(header.mirroring, Mirroring::Horizontal);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = ines(0, 1, 1, 0);
        data[3] = 0;
        assert!(matches!(Header::parse(&data), Err(CartridgeError::Format)));
    }

    #[test]
    fn rejects_truncated_rom() {
        let mut data = ines(0, 2, 1, 0);
        data.truncate(0x5000);
        assert!(matches!(Cartridge::from_bytes(&data), Err(CartridgeError::Truncated { .. })));
    }

    #[test]
    fn unknown_mapper_is_reported() {
        let data = ines(id::UNKNOWN, 1, 1, 0);
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::Mapper(MapperError::UnknownMapper(248)))
        ));
    }

    #[test]
    fn extended_mapper_number_is_kept_in_error() {
        let mut data = ines(4, 1, 1, 0);
        data[7] |= 0x08;
        data[8] = 0x01;
        let header = Header::parse(&data).unwrap();
        assert_eq!(header.mapper, 260);
        assert_eq!(header.descriptor().unwrap_err(), MapperError::UnknownMapper(260));
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::Mapper(MapperError::UnknownMapper(260)))
        ));
    }

    #[test]
    fn skips_trainer_and_reads_prg() {
        let mut data = ines(0, 1, 1, 0x04 | 0x01);
        data.splice(HEADER_LEN..HEADER_LEN, std::iter::repeat_n(0xEE, TRAINER_LEN));
        data[HEADER_LEN + TRAINER_LEN] = 0x42;
        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.read(0x8000), 0x42);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn nes2_chr_ram_size() {
        let mut data = ines(id::UNROM512, 2, 0, 0);
        data[7] |= 0x08;
        data[11] = 9; // 64 << 9 = 32 KiB
        let header = Header::parse(&data).unwrap();
        assert!(header.nes2);
        assert_eq!(header.chr_ram_size, 32 * 1024);
    }
}
