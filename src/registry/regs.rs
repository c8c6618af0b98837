//! Register addresses and bitfields for the supported boards.
//!
//! These values are the contract with real hardware and emulators; see the
//! [NESdev Wiki](https://www.nesdev.org/wiki/Mapper) page for each board.

/// Bus-conflict-safe latch writes go to `BUS_CONFLICT_TABLE + value`, where every PRG
/// page of a test image stores the identity table.
pub const BUS_CONFLICT_TABLE: u16 = 0xFF00;

/// Start of cartridge WRAM ($6000–$7FFF).
pub const WRAM_START: u16 = 0x6000;
pub const WRAM_END: u16 = 0x7FFF;

/// Discrete latch boards decode writes anywhere in $8000–$FFFF.
pub const LATCH: u16 = 0x8000;

// --- MMC1 (https://www.nesdev.org/wiki/MMC1) ---

pub const MMC1_CONTROL: u16 = 0x8000;
pub const MMC1_CHR0: u16 = 0xA000;
pub const MMC1_CHR1: u16 = 0xC000;
pub const MMC1_PRG: u16 = 0xE000;

/// Any write with bit 7 set resets the shift register and sets PRG mode 3.
pub const MMC1_RESET: u8 = 0x80;

pub const MMC1_MIRROR_1LOWER: u8 = 0x00;
pub const MMC1_MIRROR_1UPPER: u8 = 0x01;
pub const MMC1_MIRROR_V: u8 = 0x02;
pub const MMC1_MIRROR_H: u8 = 0x03;
pub const MMC1_MIRROR_MASK: u8 = 0x03;

pub const MMC1_PRG32K: u8 = 0x00;
pub const MMC1_PRG_FIX_FIRST: u8 = 0x08;
pub const MMC1_PRG_FIX_LAST: u8 = 0x0C;
pub const MMC1_PRG_MODE_MASK: u8 = 0x0C;
pub const MMC1_CHR8K: u8 = 0x00;
pub const MMC1_CHR4K: u8 = 0x10;

/// Bit 4 of the PRG register disables WRAM on MMC1B and later.
pub const MMC1_WRAM_OFF: u8 = 0x10;

// --- MMC3 (https://www.nesdev.org/wiki/MMC3) ---

pub const MMC3_SELECT: u16 = 0x8000;
pub const MMC3_DATA: u16 = 0x8001;
pub const MMC3_MIRRORING: u16 = 0xA000;
pub const MMC3_WRAM_PROTECT: u16 = 0xA001;
pub const MMC3_IRQ_PERIOD: u16 = 0xC000;
pub const MMC3_IRQ_RELOAD: u16 = 0xC001;
pub const MMC3_IRQ_DISABLE: u16 = 0xE000;
pub const MMC3_IRQ_ENABLE: u16 = 0xE001;

pub const MMC3_REG_MASK: u8 = 0x07;
pub const MMC3_PRG_SWAP: u8 = 0x40;
pub const MMC3_CHR_INVERT: u8 = 0x80;

pub const MMC3_MIRROR_V: u8 = 0x00;
pub const MMC3_MIRROR_H: u8 = 0x01;

pub const MMC3_WRAM_ON: u8 = 0x80;
pub const MMC3_WRAM_READONLY: u8 = 0xC0;
pub const MMC3_WRAM_OFF: u8 = 0x00;

// --- MMC2 / MMC4 (https://www.nesdev.org/wiki/MMC2) ---

pub const MMC2_PRG: u16 = 0xA000;
pub const MMC2_CHR_FD_0000: u16 = 0xB000;
pub const MMC2_CHR_FE_0000: u16 = 0xC000;
pub const MMC2_CHR_FD_1000: u16 = 0xD000;
pub const MMC2_CHR_FE_1000: u16 = 0xE000;
pub const MMC2_MIRRORING: u16 = 0xF000;

pub const MMC2_MIRROR_V: u8 = 0x00;
pub const MMC2_MIRROR_H: u8 = 0x01;

/// PPU fetch addresses that flip the CHR latches once the fetch completes.
pub const MMC2_LATCH0_FD: u16 = 0x0FD8;
pub const MMC2_LATCH0_FE: u16 = 0x0FE8;
pub const MMC2_LATCH1_FD: u16 = 0x1FD8;
pub const MMC2_LATCH1_FE: u16 = 0x1FE8;

// --- FME-7 (https://www.nesdev.org/wiki/Sunsoft_FME-7) ---

pub const FME7_SELECT: u16 = 0x8000;
pub const FME7_DATA: u16 = 0xA000;

pub const FME7_CHR0: u8 = 0x00;
pub const FME7_PRG_6000: u8 = 0x08;
pub const FME7_PRG_8000: u8 = 0x09;
pub const FME7_MIRRORING: u8 = 0x0C;
pub const FME7_IRQ_CONTROL: u8 = 0x0D;
pub const FME7_IRQ_COUNTER_LO: u8 = 0x0E;
pub const FME7_IRQ_COUNTER_HI: u8 = 0x0F;

/// RAM enabled and selected at $6000.
pub const FME7_WRAM_ON: u8 = 0xC0;
/// RAM selected but disabled: $6000 reads open bus.
pub const FME7_WRAM_OFF: u8 = 0x40;

pub const FME7_MIRROR_V: u8 = 0x00;
pub const FME7_MIRROR_H: u8 = 0x01;
pub const FME7_MIRROR_1LOWER: u8 = 0x02;
pub const FME7_MIRROR_1UPPER: u8 = 0x03;

pub const FME7_IRQ_ENABLE: u8 = 0x01;
pub const FME7_IRQ_COUNT: u8 = 0x80;

// --- Action 53 (https://www.nesdev.org/wiki/Action_53_mapper) ---

pub const A53_SELECT: u16 = 0x5000;
pub const A53_DATA: u16 = 0x8000;

pub const A53_REG_CHR: u8 = 0x00;
pub const A53_REG_INNER: u8 = 0x01;
pub const A53_REG_MODE: u8 = 0x80;
pub const A53_REG_OUTER: u8 = 0x81;

pub const A53_MIRROR_1LOWER: u8 = 0x00;
pub const A53_MIRROR_1UPPER: u8 = 0x01;
pub const A53_MIRROR_V: u8 = 0x02;
pub const A53_MIRROR_H: u8 = 0x03;
pub const A53_MIRROR_MASK: u8 = 0x03;

pub const A53_PRG32K: u8 = 0x00;
pub const A53_PRG_FIX_FIRST: u8 = 0x08;
pub const A53_PRG_FIX_LAST: u8 = 0x0C;
pub const A53_PRG_MODE_MASK: u8 = 0x0C;
pub const A53_OUTER_32K: u8 = 0x00;
pub const A53_OUTER_64K: u8 = 0x10;
pub const A53_OUTER_128K: u8 = 0x20;
pub const A53_OUTER_256K: u8 = 0x30;
pub const A53_OUTER_MASK: u8 = 0x30;

/// Bit 4 of a $00/$01 write copies into mirroring bit 0 in one-screen modes.
pub const A53_ONE_SCREEN_BIT: u8 = 0x10;

// --- Discrete latch boards ---

pub const AXROM_PRG: u8 = 0x07;
pub const AXROM_UPPER_SCREEN: u8 = 0x10;

pub const UXROM_PRG: u8 = 0x0F;
pub const CNROM_CHR: u8 = 0x03;
pub const BNROM_PRG: u8 = 0x03;

pub const GNROM_PRG: u8 = 0x30;
pub const GNROM_CHR: u8 = 0x03;

pub const COLORDREAMS_PRG: u8 = 0x03;
pub const COLORDREAMS_CHR: u8 = 0xF0;

pub const UNROM512_PRG: u8 = 0x1F;
pub const UNROM512_CHR: u8 = 0x60;
pub const UNROM512_UPPER_SCREEN: u8 = 0x80;
