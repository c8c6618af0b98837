//! Cartridges: iNES loading, synthesized test images, and the emulated boards.
//!
//! - **cartridge**: Loads iNES (.nes) files, holds the header, descriptor, and mapper.
//! - **image**: Tagged PRG/CHR images for bank diagnostics.
//! - **mapper**: Emulated boards; PRG/CHR bank switching, nametable mirroring, IRQ counters.

pub mod cartridge;
pub mod image;
pub mod mapper;
