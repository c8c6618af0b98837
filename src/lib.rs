//! cartprobe: NES cartridge mapper registry, bank control, and bank diagnostics.
//!
//! Describes the register layouts of common cartridge boards as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/Mapper), drives them through one uniform
//! operation set, and checks the result against emulated boards.
//!
//! ## Modules
//!
//! - **registry** – mapper IDs, [`registry::MapperDescriptor`] table, register constants
//! - **control** – [`control::controller::BankController`]: PRG/CHR banks, mirroring, WRAM, IRQ
//! - **bus** – CPU and PPU address spaces around a cartridge, CIRAM nametable mirroring
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading, tagged test images,
//!   emulated boards: NROM (0), MMC1 (1), UxROM (2), CNROM (3), MMC3 (4), AxROM (7),
//!   MMC2 (9), MMC4 (10), Color Dreams (11), Action 53 (28), UNROM 512 (30), BNROM (34),
//!   GNROM (66), FME-7 (69)
//! - **diagnostics** – bank, WRAM, mirroring, and IRQ tests with a [`diagnostics::TestResult`] bitfield
//! - **config** – command-line options of the `cartprobe` binary

pub mod bus;
pub mod cartridge;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod registry;
