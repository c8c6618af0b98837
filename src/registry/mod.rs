//! Mapper registry: one static [`MapperDescriptor`] per supported board.
//!
//! A descriptor says where a chip's registers live, which PRG/CHR windows it can switch,
//! and which optional features (mirroring control, WRAM control, IRQ counter) it has.
//! Generic code dispatches on [`Board`] and checks capabilities instead of knowing chips.
//!
//! Mapper IDs are iNES mapper numbers, see [Mapper](https://www.nesdev.org/wiki/Mapper).

pub mod regs;

use crate::cartridge::mapper::{Mirroring, MirroringSet};
use crate::error::MapperError;

/// Mapper ID constants.
pub mod id {
    pub const NROM: u8 = 0;
    pub const MMC1: u8 = 1;
    pub const UXROM: u8 = 2;
    pub const CNROM: u8 = 3;
    pub const MMC3: u8 = 4;
    pub const AXROM: u8 = 7;
    pub const MMC2: u8 = 9;
    pub const MMC4: u8 = 10;
    pub const COLORDREAMS: u8 = 11;
    pub const ACTION53: u8 = 28;
    pub const UNROM512: u8 = 30;
    pub const BNROM: u8 = 34;
    pub const GNROM: u8 = 66;
    pub const FME7: u8 = 69;
    /// Board detection found nothing it recognizes. Never resolves.
    pub const UNKNOWN: u8 = 248;
}

/// Board family. Each variant has its own register layout and write protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Board {
    Nrom,
    Mmc1,
    UxRom,
    CnRom,
    Mmc3,
    AxRom,
    Mmc2,
    Mmc4,
    ColorDreams,
    Action53,
    Unrom512,
    BnRom,
    GnRom,
    Fme7,
}

/// What a register does on its board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterRole {
    /// MMC1 control (mirroring, PRG mode, CHR mode).
    Control,
    /// Bank/command select half of a select/data pair.
    Select,
    /// Data half of a select/data pair.
    Data,
    Prg,
    Chr0,
    Chr1,
    ChrFd0000,
    ChrFe0000,
    ChrFd1000,
    ChrFe1000,
    Mirroring,
    WramProtect,
    IrqPeriod,
    IrqReload,
    IrqDisable,
    IrqEnable,
    /// Single write-anywhere latch of a discrete board.
    Latch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    pub role: RegisterRole,
    pub addr: u16,
}

const fn reg(role: RegisterRole, addr: u16) -> Register {
    Register { role, addr }
}

/// State of an MMC2/MMC4 CHR latch. A window tagged with a latch only shows its bank
/// while that half of pattern memory has the latch in this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Latch {
    Fd,
    Fe,
}

/// Fixed layout of one switchable window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub base: u16,
    /// Window size in bytes.
    pub size: u32,
    /// Largest bank number the register can hold, in units of `size`.
    pub max_bank: u16,
    pub latch: Option<Latch>,
}

const fn window(base: u16, size: u32, max_bank: u16) -> WindowSpec {
    WindowSpec { base, size, max_bank, latch: None }
}

const fn latched(base: u16, latch: Latch) -> WindowSpec {
    WindowSpec { base, size: 0x1000, max_bank: 31, latch: Some(latch) }
}

impl WindowSpec {
    /// Last address inside the window.
    pub fn end(&self) -> u16 {
        (self.base as u32 + self.size - 1) as u16
    }
}

/// A bitfield inside a discrete latch byte, given as its mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field(pub u8);

impl Field {
    pub const NONE: Field = Field(0);

    pub fn is_present(self) -> bool {
        self.0 != 0
    }

    fn shift(self) -> u32 {
        self.0.trailing_zeros()
    }

    /// Largest value the field holds.
    pub fn max(self) -> u8 {
        self.0.checked_shr(self.shift()).unwrap_or(0)
    }

    /// Place `value` into the field's bits of `latch`, keeping the other bits.
    pub fn insert(self, latch: u8, value: u8) -> u8 {
        if !self.is_present() {
            return latch;
        }
        (latch & !self.0) | ((value << self.shift()) & self.0)
    }

    pub fn extract(self, latch: u8) -> u8 {
        (latch & self.0).checked_shr(self.shift()).unwrap_or(0)
    }
}

/// Bit layout of a discrete board's single latch register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatchLayout {
    pub prg: Field,
    pub chr: Field,
    /// One-screen nametable select (set = upper).
    pub screen: Field,
}

const fn layout(prg: u8, chr: u8, screen: u8) -> LatchLayout {
    LatchLayout { prg: Field(prg), chr: Field(chr), screen: Field(screen) }
}

/// How the board gates cartridge WRAM at $6000–$7FFF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WramControl {
    None,
    /// Always mapped, no enable bit.
    Fixed,
    /// Disable bit 4 of the PRG register.
    Mmc1,
    /// Enable and write-protect bits at $A001.
    Mmc3,
    /// Command 8 selects RAM and its enable.
    Fme7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqKind {
    None,
    /// Counts PPU A12 rises, one per rendered scanline.
    Scanline,
    /// Counts CPU cycles.
    CpuCycle,
}

/// Compile-time description of one cartridge chip variant.
#[derive(Debug)]
pub struct MapperDescriptor {
    pub id: u8,
    pub name: &'static str,
    pub board: Board,
    pub registers: &'static [Register],
    pub prg_windows: &'static [WindowSpec],
    pub chr_windows: &'static [WindowSpec],
    pub mirroring: MirroringSet,
    pub wram: WramControl,
    pub irq: IrqKind,
    pub bus_conflicts: bool,
    pub latch: Option<LatchLayout>,
}

impl MapperDescriptor {
    /// Address of the register with the given role, if the board has one.
    pub fn register(&self, role: RegisterRole) -> Option<u16> {
        self.registers.iter().find(|r| r.role == role).map(|r| r.addr)
    }

    pub fn supports_irq(&self) -> bool {
        self.irq != IrqKind::None
    }

    pub fn supports_mirroring(&self, mode: Mirroring) -> bool {
        MirroringSet::from_mode(mode).is_some_and(|m| self.mirroring.contains(m))
    }

    pub fn supports_multiple_mirror_modes(&self) -> bool {
        self.mirroring.bits().count_ones() > 1
    }

    pub fn has_wram(&self) -> bool {
        self.wram != WramControl::None
    }

    pub fn prg_window(&self, window: usize) -> Result<&WindowSpec, MapperError> {
        self.prg_windows.get(window).ok_or(MapperError::InvalidWindow {
            window,
            count: self.prg_windows.len(),
        })
    }

    pub fn chr_window(&self, window: usize) -> Result<&WindowSpec, MapperError> {
        self.chr_windows.get(window).ok_or(MapperError::InvalidWindow {
            window,
            count: self.chr_windows.len(),
        })
    }
}

use RegisterRole as R;

const ONE_SCREEN: MirroringSet = MirroringSet::ONE_SCREEN_LOWER.union(MirroringSet::ONE_SCREEN_UPPER);
const TWO_SCREEN: MirroringSet = MirroringSet::VERTICAL.union(MirroringSet::HORIZONTAL);

const LATCH_REGS: &[Register] = &[reg(R::Latch, regs::LATCH)];

const MMC2_CHR: &[WindowSpec] = &[
    latched(0x0000, Latch::Fd),
    latched(0x0000, Latch::Fe),
    latched(0x1000, Latch::Fd),
    latched(0x1000, Latch::Fe),
];

const MMC2_REGS: &[Register] = &[
    reg(R::Prg, regs::MMC2_PRG),
    reg(R::ChrFd0000, regs::MMC2_CHR_FD_0000),
    reg(R::ChrFe0000, regs::MMC2_CHR_FE_0000),
    reg(R::ChrFd1000, regs::MMC2_CHR_FD_1000),
    reg(R::ChrFe1000, regs::MMC2_CHR_FE_1000),
    reg(R::Mirroring, regs::MMC2_MIRRORING),
];

static MAPPERS: [MapperDescriptor; 14] = [
    MapperDescriptor {
        id: id::NROM,
        name: "NROM",
        board: Board::Nrom,
        registers: &[],
        prg_windows: &[],
        chr_windows: &[],
        mirroring: MirroringSet::empty(),
        wram: WramControl::None,
        irq: IrqKind::None,
        bus_conflicts: false,
        latch: None,
    },
    MapperDescriptor {
        id: id::MMC1,
        name: "MMC1",
        board: Board::Mmc1,
        registers: &[
            reg(R::Control, regs::MMC1_CONTROL),
            reg(R::Chr0, regs::MMC1_CHR0),
            reg(R::Chr1, regs::MMC1_CHR1),
            reg(R::Prg, regs::MMC1_PRG),
        ],
        prg_windows: &[window(0x8000, 0x4000, 15)],
        chr_windows: &[window(0x0000, 0x1000, 31), window(0x1000, 0x1000, 31)],
        mirroring: MirroringSet::all(),
        wram: WramControl::Mmc1,
        irq: IrqKind::None,
        bus_conflicts: false,
        latch: None,
    },
    MapperDescriptor {
        id: id::UXROM,
        name: "UxROM",
        board: Board::UxRom,
        registers: LATCH_REGS,
        prg_windows: &[window(0x8000, 0x4000, 15)],
        chr_windows: &[],
        mirroring: MirroringSet::empty(),
        wram: WramControl::None,
        irq: IrqKind::None,
        bus_conflicts: true,
        latch: Some(layout(regs::UXROM_PRG, 0, 0)),
    },
    MapperDescriptor {
        id: id::CNROM,
        name: "CNROM",
        board: Board::CnRom,
        registers: LATCH_REGS,
        prg_windows: &[],
        chr_windows: &[window(0x0000, 0x2000, 3)],
        mirroring: MirroringSet::empty(),
        wram: WramControl::None,
        irq: IrqKind::None,
        bus_conflicts: true,
        latch: Some(layout(0, regs::CNROM_CHR, 0)),
    },
    MapperDescriptor {
        id: id::MMC3,
        name: "MMC3",
        board: Board::Mmc3,
        registers: &[
            reg(R::Select, regs::MMC3_SELECT),
            reg(R::Data, regs::MMC3_DATA),
            reg(R::Mirroring, regs::MMC3_MIRRORING),
            reg(R::WramProtect, regs::MMC3_WRAM_PROTECT),
            reg(R::IrqPeriod, regs::MMC3_IRQ_PERIOD),
            reg(R::IrqReload, regs::MMC3_IRQ_RELOAD),
            reg(R::IrqDisable, regs::MMC3_IRQ_DISABLE),
            reg(R::IrqEnable, regs::MMC3_IRQ_ENABLE),
        ],
        prg_windows: &[window(0x8000, 0x2000, 63), window(0xA000, 0x2000, 63)],
        chr_windows: &[
            window(0x0000, 0x0800, 127),
            window(0x0800, 0x0800, 127),
            window(0x1000, 0x0400, 255),
            window(0x1400, 0x0400, 255),
            window(0x1800, 0x0400, 255),
            window(0x1C00, 0x0400, 255),
        ],
        mirroring: TWO_SCREEN,
        wram: WramControl::Mmc3,
        irq: IrqKind::Scanline,
        bus_conflicts: false,
        latch: None,
    },
    MapperDescriptor {
        id: id::AXROM,
        name: "AxROM",
        board: Board::AxRom,
        registers: LATCH_REGS,
        prg_windows: &[window(0x8000, 0x8000, 7)],
        chr_windows: &[],
        mirroring: ONE_SCREEN,
        wram: WramControl::None,
        irq: IrqKind::None,
        bus_conflicts: true,
        latch: Some(layout(regs::AXROM_PRG, 0, regs::AXROM_UPPER_SCREEN)),
    },
    MapperDescriptor {
        id: id::MMC2,
        name: "MMC2",
        board: Board::Mmc2,
        registers: MMC2_REGS,
        prg_windows: &[window(0x8000, 0x2000, 15)],
        chr_windows: MMC2_CHR,
        mirroring: TWO_SCREEN,
        wram: WramControl::None,
        irq: IrqKind::None,
        bus_conflicts: false,
        latch: None,
    },
    MapperDescriptor {
        id: id::MMC4,
        name: "MMC4",
        board: Board::Mmc4,
        registers: MMC2_REGS,
        prg_windows: &[window(0x8000, 0x4000, 15)],
        chr_windows: MMC2_CHR,
        mirroring: TWO_SCREEN,
        wram: WramControl::Fixed,
        irq: IrqKind::None,
        bus_conflicts: false,
        latch: None,
    },
    MapperDescriptor {
        id: id::COLORDREAMS,
        name: "Color Dreams",
        board: Board::ColorDreams,
        registers: LATCH_REGS,
        prg_windows: &[window(0x8000, 0x8000, 3)],
        chr_windows: &[window(0x0000, 0x2000, 15)],
        mirroring: MirroringSet::empty(),
        wram: WramControl::None,
        irq: IrqKind::None,
        bus_conflicts: true,
        latch: Some(layout(regs::COLORDREAMS_PRG, regs::COLORDREAMS_CHR, 0)),
    },
    MapperDescriptor {
        id: id::ACTION53,
        name: "Action 53",
        board: Board::Action53,
        registers: &[reg(R::Select, regs::A53_SELECT), reg(R::Data, regs::A53_DATA)],
        prg_windows: &[window(0x8000, 0x4000, 15)],
        chr_windows: &[window(0x0000, 0x2000, 3)],
        mirroring: MirroringSet::all(),
        wram: WramControl::None,
        irq: IrqKind::None,
        bus_conflicts: false,
        latch: None,
    },
    MapperDescriptor {
        id: id::UNROM512,
        name: "UNROM 512",
        board: Board::Unrom512,
        registers: LATCH_REGS,
        prg_windows: &[window(0x8000, 0x4000, 31)],
        chr_windows: &[window(0x0000, 0x2000, 3)],
        mirroring: ONE_SCREEN,
        wram: WramControl::None,
        irq: IrqKind::None,
        bus_conflicts: false,
        latch: Some(layout(
            regs::UNROM512_PRG,
            regs::UNROM512_CHR,
            regs::UNROM512_UPPER_SCREEN,
        )),
    },
    MapperDescriptor {
        id: id::BNROM,
        name: "BNROM",
        board: Board::BnRom,
        registers: LATCH_REGS,
        prg_windows: &[window(0x8000, 0x8000, 3)],
        chr_windows: &[],
        mirroring: MirroringSet::empty(),
        wram: WramControl::None,
        irq: IrqKind::None,
        bus_conflicts: true,
        latch: Some(layout(regs::BNROM_PRG, 0, 0)),
    },
    MapperDescriptor {
        id: id::GNROM,
        name: "GNROM",
        board: Board::GnRom,
        registers: LATCH_REGS,
        prg_windows: &[window(0x8000, 0x8000, 3)],
        chr_windows: &[window(0x0000, 0x2000, 3)],
        mirroring: MirroringSet::empty(),
        wram: WramControl::None,
        irq: IrqKind::None,
        bus_conflicts: true,
        latch: Some(layout(regs::GNROM_PRG, regs::GNROM_CHR, 0)),
    },
    MapperDescriptor {
        id: id::FME7,
        name: "FME-7",
        board: Board::Fme7,
        registers: &[reg(R::Select, regs::FME7_SELECT), reg(R::Data, regs::FME7_DATA)],
        prg_windows: &[
            window(0x8000, 0x2000, 63),
            window(0xA000, 0x2000, 63),
            window(0xC000, 0x2000, 63),
        ],
        chr_windows: &[
            window(0x0000, 0x0400, 255),
            window(0x0400, 0x0400, 255),
            window(0x0800, 0x0400, 255),
            window(0x0C00, 0x0400, 255),
            window(0x1000, 0x0400, 255),
            window(0x1400, 0x0400, 255),
            window(0x1800, 0x0400, 255),
            window(0x1C00, 0x0400, 255),
        ],
        mirroring: MirroringSet::all(),
        wram: WramControl::Fme7,
        irq: IrqKind::CpuCycle,
        bus_conflicts: false,
        latch: None,
    },
];

/// Look up the descriptor for a mapper ID.
pub fn resolve(id: u8) -> Result<&'static MapperDescriptor, MapperError> {
    MAPPERS
        .iter()
        .find(|m| m.id == id)
        .ok_or(MapperError::UnknownMapper(u16::from(id)))
}

/// Every registered descriptor, in ID order.
pub fn all() -> &'static [MapperDescriptor] {
    &MAPPERS
}

#[cfg(test)]
mod tests;
