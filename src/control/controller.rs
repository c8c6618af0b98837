use log::debug;

use crate::{
    bus::Bus,
    cartridge::mapper::Mirroring,
    error::{Feature, MapperError},
    registry::{Board, MapperDescriptor, RegisterRole, WindowSpec, WramControl, regs},
};

/// Access mode for cartridge WRAM at $6000–$7FFF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WramMode {
    Disabled,
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unconfigured,
    Configured,
}

/// Uniform bank control over one board. Every operation turns into the board's own
/// register writes on `bus`; the controller keeps a shadow of everything it wrote,
/// since most mapper registers are write-only.
pub struct BankController<B: Bus> {
    pub bus: B,
    desc: &'static MapperDescriptor,
    state: State,
    prg: Vec<u16>,
    chr: Vec<u16>,
    /// Discrete latch contents.
    latch: u8,
    /// Last value written to the select/command register (MMC3, FME-7, Action 53).
    select: u8,
    mmc1_control: u8,
    /// MMC1 PRG register including the WRAM disable bit.
    mmc1_prg: u8,
    a53_mode: u8,
    mirroring: Option<Mirroring>,
    wram: Option<WramMode>,
}

impl<B: Bus> BankController<B> {
    pub fn new(desc: &'static MapperDescriptor, bus: B) -> Self {
        Self {
            bus,
            desc,
            state: State::Unconfigured,
            prg: vec![0; desc.prg_windows.len()],
            chr: vec![0; desc.chr_windows.len()],
            latch: 0,
            select: 0,
            mmc1_control: 0,
            mmc1_prg: 0,
            a53_mode: 0,
            mirroring: None,
            wram: None,
        }
    }

    pub fn descriptor(&self) -> &'static MapperDescriptor {
        self.desc
    }

    pub fn is_initialized(&self) -> bool {
        self.state == State::Configured
    }

    /// Put the board into a known state: fixed bank modes, bank 0 in every window,
    /// WRAM enabled, IRQs off, and vertical (or lower one-screen) mirroring.
    pub fn initialize(&mut self) {
        let default_mirroring = self
            .desc
            .mirroring
            .modes()
            .next()
            .filter(|_| self.desc.supports_multiple_mirror_modes());

        match self.desc.board {
            Board::Nrom => {}
            Board::Mmc1 => {
                self.bus.write(regs::MMC1_CONTROL, regs::MMC1_RESET);
                self.mmc1_control = regs::MMC1_MIRROR_V | regs::MMC1_PRG_FIX_LAST | regs::MMC1_CHR4K;
                self.mmc1_prg = 0;
                self.mmc1_write(regs::MMC1_CONTROL, self.mmc1_control);
                self.mmc1_write(regs::MMC1_CHR0, 0);
                self.mmc1_write(regs::MMC1_CHR1, 0);
                self.mmc1_write(regs::MMC1_PRG, self.mmc1_prg);
            }
            Board::Mmc3 => {
                for r in 0..8 {
                    self.write_select(r);
                    self.write_data(0);
                }
                self.bus.write(regs::MMC3_MIRRORING, regs::MMC3_MIRROR_V);
                self.bus.write(regs::MMC3_WRAM_PROTECT, regs::MMC3_WRAM_ON);
                self.bus.write(regs::MMC3_IRQ_DISABLE, 0);
            }
            Board::Mmc2 | Board::Mmc4 => {
                for addr in [
                    regs::MMC2_PRG,
                    regs::MMC2_CHR_FD_0000,
                    regs::MMC2_CHR_FE_0000,
                    regs::MMC2_CHR_FD_1000,
                    regs::MMC2_CHR_FE_1000,
                ] {
                    self.bus.write(addr, 0);
                }
                self.bus.write(regs::MMC2_MIRRORING, regs::MMC2_MIRROR_V);
            }
            Board::Fme7 => {
                for cmd in 0..8 {
                    self.command(regs::FME7_CHR0 + cmd, 0);
                }
                self.command(regs::FME7_PRG_6000, regs::FME7_WRAM_ON);
                for cmd in regs::FME7_PRG_8000..regs::FME7_PRG_8000 + 3 {
                    self.command(cmd, 0);
                }
                self.command(regs::FME7_MIRRORING, regs::FME7_MIRROR_V);
                self.command(regs::FME7_IRQ_CONTROL, 0);
            }
            Board::Action53 => {
                // UNROM-style mode inside a 256 KiB outer bank, so inner banks 0-15 reach it all.
                self.a53_mode = regs::A53_PRG_FIX_LAST | regs::A53_OUTER_256K | regs::A53_MIRROR_V;
                self.a53_write(regs::A53_REG_MODE, self.a53_mode);
                self.a53_write(regs::A53_REG_OUTER, 0);
                self.a53_write(regs::A53_REG_CHR, 0);
                self.a53_write(regs::A53_REG_INNER, 0);
            }
            Board::UxRom
            | Board::CnRom
            | Board::AxRom
            | Board::ColorDreams
            | Board::Unrom512
            | Board::BnRom
            | Board::GnRom => self.write_latch(0),
        }

        self.prg.fill(0);
        self.chr.fill(0);
        self.mirroring = default_mirroring;
        self.wram = self.desc.has_wram().then_some(WramMode::ReadWrite);
        self.state = State::Configured;
        debug!("{} initialized", self.desc.name);
    }

    fn ensure_initialized(&self) -> Result<(), MapperError> {
        match self.state {
            State::Configured => Ok(()),
            State::Unconfigured => Err(MapperError::NotInitialized),
        }
    }

    fn check_bank(window: &WindowSpec, bank: u16) -> Result<u8, MapperError> {
        if bank > window.max_bank {
            return Err(MapperError::BankOutOfRange { bank, max: window.max_bank });
        }
        Ok(bank as u8)
    }

    /// Map `bank` into PRG window `window`.
    pub fn select_prg_bank(&mut self, window: usize, bank: u16) -> Result<(), MapperError> {
        self.ensure_initialized()?;
        let value = Self::check_bank(self.desc.prg_window(window)?, bank)?;

        match self.desc.board {
            Board::Mmc1 => {
                self.mmc1_prg = (self.mmc1_prg & regs::MMC1_WRAM_OFF) | value;
                self.mmc1_write(regs::MMC1_PRG, self.mmc1_prg);
            }
            Board::Mmc3 => {
                self.write_select(6 + window as u8);
                self.write_data(value);
            }
            Board::Mmc2 | Board::Mmc4 => self.bus.write(regs::MMC2_PRG, value),
            Board::Fme7 => self.command(regs::FME7_PRG_8000 + window as u8, value),
            Board::Action53 => {
                let screen = self.a53_screen_bit();
                self.a53_write(regs::A53_REG_INNER, value | screen);
            }
            _ => {
                if let Some(layout) = self.desc.latch {
                    self.latch = layout.prg.insert(self.latch, value);
                    self.write_latch(self.latch);
                }
            }
        }

        self.prg[window] = bank;
        debug!("{} PRG window {window} <- bank {bank}", self.desc.name);
        Ok(())
    }

    /// Map `bank` into CHR window `window`. On MMC2/MMC4 this sets the bank for one latch
    /// state; it shows once the PPU fetches the matching $FD/$FE tile.
    pub fn select_chr_bank(&mut self, window: usize, bank: u16) -> Result<(), MapperError> {
        self.ensure_initialized()?;
        let value = Self::check_bank(self.desc.chr_window(window)?, bank)?;

        match self.desc.board {
            Board::Mmc1 => {
                let addr = if window == 0 { regs::MMC1_CHR0 } else { regs::MMC1_CHR1 };
                self.mmc1_write(addr, value);
            }
            Board::Mmc3 => {
                self.write_select(window as u8);
                // R0/R1 count in 1 KiB units with the low bit ignored
                self.write_data(if window < 2 { value << 1 } else { value });
            }
            Board::Mmc2 | Board::Mmc4 => {
                let role = [
                    RegisterRole::ChrFd0000,
                    RegisterRole::ChrFe0000,
                    RegisterRole::ChrFd1000,
                    RegisterRole::ChrFe1000,
                ][window];
                if let Some(addr) = self.desc.register(role) {
                    self.bus.write(addr, value);
                }
            }
            Board::Fme7 => self.command(regs::FME7_CHR0 + window as u8, value),
            Board::Action53 => {
                let screen = self.a53_screen_bit();
                self.a53_write(regs::A53_REG_CHR, value | screen);
            }
            _ => {
                if let Some(layout) = self.desc.latch {
                    self.latch = layout.chr.insert(self.latch, value);
                    self.write_latch(self.latch);
                }
            }
        }

        self.chr[window] = bank;
        debug!("{} CHR window {window} <- bank {bank}", self.desc.name);
        Ok(())
    }

    pub fn set_mirroring(&mut self, mode: Mirroring) -> Result<(), MapperError> {
        self.ensure_initialized()?;
        if !self.desc.supports_mirroring(mode) {
            return Err(MapperError::UnsupportedMode(mode));
        }

        match self.desc.board {
            Board::Mmc1 => {
                let bits = match mode {
                    Mirroring::OneScreenLower => regs::MMC1_MIRROR_1LOWER,
                    Mirroring::OneScreenUpper => regs::MMC1_MIRROR_1UPPER,
                    Mirroring::Vertical => regs::MMC1_MIRROR_V,
                    _ => regs::MMC1_MIRROR_H,
                };
                self.mmc1_control = (self.mmc1_control & !regs::MMC1_MIRROR_MASK) | bits;
                self.mmc1_write(regs::MMC1_CONTROL, self.mmc1_control);
            }
            Board::Mmc3 => {
                let bits = if mode == Mirroring::Horizontal { regs::MMC3_MIRROR_H } else { regs::MMC3_MIRROR_V };
                self.bus.write(regs::MMC3_MIRRORING, bits);
            }
            Board::Mmc2 | Board::Mmc4 => {
                let bits = if mode == Mirroring::Horizontal { regs::MMC2_MIRROR_H } else { regs::MMC2_MIRROR_V };
                self.bus.write(regs::MMC2_MIRRORING, bits);
            }
            Board::Fme7 => {
                let bits = match mode {
                    Mirroring::Vertical => regs::FME7_MIRROR_V,
                    Mirroring::Horizontal => regs::FME7_MIRROR_H,
                    Mirroring::OneScreenLower => regs::FME7_MIRROR_1LOWER,
                    _ => regs::FME7_MIRROR_1UPPER,
                };
                self.command(regs::FME7_MIRRORING, bits);
            }
            Board::Action53 => {
                let bits = match mode {
                    Mirroring::OneScreenLower => regs::A53_MIRROR_1LOWER,
                    Mirroring::OneScreenUpper => regs::A53_MIRROR_1UPPER,
                    Mirroring::Vertical => regs::A53_MIRROR_V,
                    _ => regs::A53_MIRROR_H,
                };
                self.a53_mode = (self.a53_mode & !regs::A53_MIRROR_MASK) | bits;
                self.a53_write(regs::A53_REG_MODE, self.a53_mode);
            }
            _ => match self.desc.latch {
                Some(layout) if layout.screen.is_present() => {
                    let upper = (mode == Mirroring::OneScreenUpper) as u8;
                    self.latch = layout.screen.insert(self.latch, upper);
                    self.write_latch(self.latch);
                }
                _ => return Err(MapperError::UnsupportedMode(mode)),
            },
        }

        self.mirroring = Some(mode);
        debug!("{} mirroring <- {mode:?}", self.desc.name);
        Ok(())
    }

    pub fn set_wram(&mut self, mode: WramMode) -> Result<(), MapperError> {
        self.ensure_initialized()?;
        match (self.desc.wram, mode) {
            (WramControl::None, _) => return Err(MapperError::NotSupported(Feature::Wram)),
            (WramControl::Fixed, WramMode::ReadWrite) => {}
            (WramControl::Fixed, WramMode::Disabled) => return Err(MapperError::NotSupported(Feature::Wram)),
            (WramControl::Fixed | WramControl::Mmc1 | WramControl::Fme7, WramMode::ReadOnly) => {
                return Err(MapperError::NotSupported(Feature::WramProtect));
            }
            (WramControl::Mmc1, _) => {
                self.mmc1_prg = if mode == WramMode::Disabled {
                    self.mmc1_prg | regs::MMC1_WRAM_OFF
                } else {
                    self.mmc1_prg & !regs::MMC1_WRAM_OFF
                };
                self.mmc1_write(regs::MMC1_PRG, self.mmc1_prg);
            }
            (WramControl::Mmc3, _) => {
                let bits = match mode {
                    WramMode::Disabled => regs::MMC3_WRAM_OFF,
                    WramMode::ReadOnly => regs::MMC3_WRAM_READONLY,
                    WramMode::ReadWrite => regs::MMC3_WRAM_ON,
                };
                self.bus.write(regs::MMC3_WRAM_PROTECT, bits);
            }
            (WramControl::Fme7, _) => {
                let bits = if mode == WramMode::Disabled { regs::FME7_WRAM_OFF } else { regs::FME7_WRAM_ON };
                self.command(regs::FME7_PRG_6000, bits);
            }
        }
        self.wram = Some(mode);
        debug!("{} WRAM <- {mode:?}", self.desc.name);
        Ok(())
    }

    /// Arm the IRQ counter to fire after `period` scanlines (MMC3) or CPU cycles (FME-7).
    /// With `enabled` false the counter is loaded but the IRQ stays masked, and any
    /// pending IRQ is acknowledged.
    pub fn configure_irq(&mut self, period: u32, enabled: bool) -> Result<(), MapperError> {
        self.ensure_initialized()?;
        match self.desc.board {
            Board::Mmc3 => {
                if !(1..=256).contains(&period) {
                    return Err(MapperError::InvalidIrqPeriod(period));
                }
                self.bus.write(regs::MMC3_IRQ_PERIOD, (period - 1) as u8);
                self.bus.write(regs::MMC3_IRQ_RELOAD, 0);
                self.bus.write(regs::MMC3_IRQ_DISABLE, 0);
                if enabled {
                    self.bus.write(regs::MMC3_IRQ_ENABLE, 0);
                }
            }
            Board::Fme7 => {
                if !(1..=65536).contains(&period) {
                    return Err(MapperError::InvalidIrqPeriod(period));
                }
                let counter = (period - 1) as u16;
                self.command(regs::FME7_IRQ_CONTROL, 0);
                self.command(regs::FME7_IRQ_COUNTER_LO, counter as u8);
                self.command(regs::FME7_IRQ_COUNTER_HI, (counter >> 8) as u8);
                if enabled {
                    self.command(regs::FME7_IRQ_CONTROL, regs::FME7_IRQ_ENABLE | regs::FME7_IRQ_COUNT);
                }
            }
            _ => return Err(MapperError::NotSupported(Feature::Irq)),
        }
        debug!("{} IRQ period {period}, enabled {enabled}", self.desc.name);
        Ok(())
    }

    /// Clear a pending IRQ and keep the counter running.
    pub fn acknowledge_irq(&mut self) -> Result<(), MapperError> {
        self.ensure_initialized()?;
        match self.desc.board {
            Board::Mmc3 => {
                self.bus.write(regs::MMC3_IRQ_DISABLE, 0);
                self.bus.write(regs::MMC3_IRQ_ENABLE, 0);
            }
            Board::Fme7 => self.command(regs::FME7_IRQ_CONTROL, regs::FME7_IRQ_ENABLE | regs::FME7_IRQ_COUNT),
            _ => return Err(MapperError::NotSupported(Feature::Irq)),
        }
        Ok(())
    }

    /// Bank last written to PRG window `window`.
    pub fn prg_bank(&self, window: usize) -> Result<u16, MapperError> {
        self.ensure_initialized()?;
        self.desc.prg_window(window)?;
        Ok(self.prg[window])
    }

    /// Bank last written to CHR window `window`.
    pub fn chr_bank(&self, window: usize) -> Result<u16, MapperError> {
        self.ensure_initialized()?;
        self.desc.chr_window(window)?;
        Ok(self.chr[window])
    }

    pub fn mirroring(&self) -> Option<Mirroring> {
        self.mirroring
    }

    pub fn wram(&self) -> Option<WramMode> {
        self.wram
    }

    /// Run `handler` as an interrupt handler would run: between any two main-line writes.
    /// The select register is written back afterwards, so a main line caught between the
    /// select and data halves of a pair still lands its data in the intended register.
    pub fn run_handler<R>(&mut self, handler: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.select;
        let result = handler(self);
        if self.uses_select_pair() {
            self.write_select(saved);
        }
        result
    }

    fn uses_select_pair(&self) -> bool {
        matches!(self.desc.board, Board::Mmc3 | Board::Fme7 | Board::Action53)
    }

    /// Write the select/command half of a register pair and record it in the shadow.
    pub(crate) fn write_select(&mut self, value: u8) {
        let addr = match self.desc.board {
            Board::Mmc3 => regs::MMC3_SELECT,
            Board::Fme7 => regs::FME7_SELECT,
            Board::Action53 => regs::A53_SELECT,
            _ => return,
        };
        self.select = value;
        self.bus.write(addr, value);
    }

    /// Write the data half of a register pair.
    pub(crate) fn write_data(&mut self, value: u8) {
        let addr = match self.desc.board {
            Board::Mmc3 => regs::MMC3_DATA,
            Board::Fme7 => regs::FME7_DATA,
            Board::Action53 => regs::A53_DATA,
            _ => return,
        };
        self.bus.write(addr, value);
    }

    fn command(&mut self, cmd: u8, value: u8) {
        self.write_select(cmd);
        self.write_data(value);
    }

    fn a53_write(&mut self, reg: u8, value: u8) {
        self.write_select(reg);
        self.write_data(value);
    }

    /// In one-screen modes bit 4 of CHR and inner PRG writes also picks the screen.
    fn a53_screen_bit(&self) -> u8 {
        if self.a53_mode & 0x02 == 0 && self.a53_mode & 0x01 != 0 {
            regs::A53_ONE_SCREEN_BIT
        } else {
            0
        }
    }

    /// MMC1 serial port: five writes, LSB first.
    fn mmc1_write(&mut self, addr: u16, value: u8) {
        for bit in 0..5 {
            self.bus.write(addr, (value >> bit) & 1);
        }
    }

    /// Discrete latch write. On boards with bus conflicts the write goes to the identity
    /// table so ROM and CPU drive the same value.
    fn write_latch(&mut self, value: u8) {
        let addr = if self.desc.bus_conflicts {
            regs::BUS_CONFLICT_TABLE + value as u16
        } else {
            regs::LATCH
        };
        self.latch = value;
        self.bus.write(addr, value);
    }
}
