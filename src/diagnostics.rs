//! Cartridge diagnostics: the tests a cartridge test ROM runs against its own board.
//!
//! Every check goes through the [`BankController`] and reads the result back from the
//! hardware: the first byte of each PRG page (8 KiB) and CHR page (1 KiB) holds its page
//! number, so a read at a window's base tells which bank is really mapped there.

use bitflags::bitflags;
use log::{debug, warn};

use crate::bus::{Bus, CartBus, PpuBus};
use crate::cartridge::image::{CHR_PAGE, PRG_PAGE};
use crate::cartridge::mapper::{Mirroring, open_bus};
use crate::control::controller::{BankController, WramMode};
use crate::error::MapperError;
use crate::registry::{IrqKind, Latch, MapperDescriptor, WindowSpec, regs};

bitflags! {
    /// One bit per failed check.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TestResult: u16 {
        const PRG_BANK = 1 << 0;
        const CHR_BANK = 1 << 1;
        const CHR_LATCH = 1 << 2;
        const PRG_SIZE = 1 << 3;
        const WRAM = 1 << 4;
        const WRAM_DISABLE = 1 << 5;
        const WRAM_PROTECT = 1 << 6;
        const MIRRORING = 1 << 7;
        const IRQ = 1 << 8;
        /// The controller refused an operation the board should support.
        const CONTROL = 1 << 9;
    }
}

const LABELS: [(TestResult, &str); 10] = [
    (TestResult::PRG_BANK, "PRG banks"),
    (TestResult::CHR_BANK, "CHR banks"),
    (TestResult::CHR_LATCH, "CHR latches"),
    (TestResult::PRG_SIZE, "PRG size"),
    (TestResult::WRAM, "WRAM"),
    (TestResult::WRAM_DISABLE, "WRAM disable"),
    (TestResult::WRAM_PROTECT, "WRAM protect"),
    (TestResult::MIRRORING, "mirroring"),
    (TestResult::IRQ, "IRQ"),
    (TestResult::CONTROL, "control"),
];

impl TestResult {
    /// Label of a single flag; "multiple" for anything else.
    pub fn name(self) -> &'static str {
        LABELS.iter().find(|(flag, _)| *flag == self).map_or("multiple", |&(_, label)| label)
    }

    /// Every single check, in report order.
    pub fn checks() -> impl Iterator<Item = (TestResult, &'static str)> {
        LABELS.into_iter()
    }
}

/// Outcome of a full diagnostic run.
#[derive(Debug)]
pub struct Report {
    pub mapper: &'static MapperDescriptor,
    pub failures: TestResult,
    /// Checks that ran, failed or not.
    pub tested: TestResult,
    /// Bank selections verified by reading back their tag.
    pub prg_banks: usize,
    pub chr_banks: usize,
    /// PRG size found by looking for the first bank that mirrors bank 0.
    pub prg_size: Option<usize>,
    pub wram: bool,
    pub notes: Vec<String>,
}

impl Report {
    fn new(mapper: &'static MapperDescriptor) -> Self {
        Self {
            mapper,
            failures: TestResult::empty(),
            tested: TestResult::empty(),
            prg_banks: 0,
            chr_banks: 0,
            prg_size: None,
            wram: false,
            notes: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, flag: TestResult, note: String) {
        warn!("{}: {note}", self.mapper.name);
        self.failures |= flag;
        self.notes.push(note);
    }

    fn check(&mut self, flag: TestResult, ok: bool, note: impl FnOnce() -> String) {
        self.tested |= flag;
        if !ok {
            self.fail(flag, note());
        }
    }

    /// Record a controller error as a failure of `flag`.
    fn refused(&mut self, flag: TestResult, what: &str, err: MapperError) {
        self.tested |= flag;
        self.fail(flag | TestResult::CONTROL, format!("{what}: {err} (code {})", err.code()));
    }
}

fn page_tag(bank: u16, window: &WindowSpec, page: usize, total: usize) -> u8 {
    let pages = (total / page).max(1);
    ((bank as usize * window.size as usize / page) % pages) as u8
}

/// Run every diagnostic the board supports. Initializes the controller first.
pub fn run(ctl: &mut BankController<CartBus>) -> Report {
    let mut report = Report::new(ctl.descriptor());
    ctl.initialize();

    prg_banks(ctl, &mut report);
    prg_size(ctl, &mut report);
    chr_banks(ctl, &mut report);
    if ctl.descriptor().chr_windows.iter().any(|w| w.latch.is_some()) {
        chr_latches(ctl, &mut report);
    }
    if ctl.descriptor().has_wram() {
        wram(ctl, &mut report);
    }
    if ctl.descriptor().supports_multiple_mirror_modes() {
        mirroring(ctl, &mut report);
    }
    if ctl.descriptor().supports_irq() {
        irq(ctl, &mut report);
    }

    // Leave the board the way initialize left it
    ctl.initialize();
    debug!("{}: {:?}", report.mapper.name, report.failures);
    report
}

/// Select every bank in every PRG window and read its tag at the window base.
pub fn prg_banks(ctl: &mut BankController<CartBus>, report: &mut Report) {
    let desc = ctl.descriptor();
    let total = ctl.bus.cart.header.prg_rom_size;
    for (window, w) in desc.prg_windows.iter().enumerate() {
        for bank in 0..=w.max_bank {
            if let Err(err) = ctl.select_prg_bank(window, bank) {
                report.refused(TestResult::PRG_BANK, "PRG bank", err);
                return;
            }
            let expected = page_tag(bank, w, PRG_PAGE, total);
            let got = ctl.bus.read(w.base);
            report.check(TestResult::PRG_BANK, got == expected, || {
                format!("PRG window {window} bank {bank}: read page {got}, expected {expected}")
            });
            report.prg_banks += 1;
        }
        if let Err(err) = ctl.select_prg_bank(window, 0) {
            report.refused(TestResult::PRG_BANK, "PRG bank", err);
        }
    }
}

/// Find the PRG size by selecting banks 1, 2, 4, ... until one mirrors bank 0.
pub fn prg_size(ctl: &mut BankController<CartBus>, report: &mut Report) {
    let desc = ctl.descriptor();
    let Some(w) = desc.prg_windows.first() else {
        return;
    };
    let header_size = ctl.bus.cart.header.prg_rom_size;

    let mut size = (w.max_bank as usize + 1) * w.size as usize;
    let result = (|| {
        ctl.select_prg_bank(0, 0)?;
        let first = ctl.bus.read(w.base);
        let mut bank = 1u16;
        while bank <= w.max_bank {
            ctl.select_prg_bank(0, bank)?;
            if ctl.bus.read(w.base) == first {
                size = bank as usize * w.size as usize;
                break;
            }
            bank <<= 1;
        }
        ctl.select_prg_bank(0, 0)
    })();

    if let Err(err) = result {
        report.refused(TestResult::PRG_SIZE, "PRG size", err);
        return;
    }
    report.prg_size = Some(size);
    // A window larger than the ROM sees it mirrored inside the window
    let expected = header_size.max(w.size as usize);
    report.check(TestResult::PRG_SIZE, size == expected, || {
        format!("PRG size detected as {} KiB, header says {} KiB", size / 1024, header_size / 1024)
    });
}

/// Select every bank in every plain CHR window and read its tag at the window base.
/// CHR RAM gets tagged in a first pass.
pub fn chr_banks(ctl: &mut BankController<CartBus>, report: &mut Report) {
    let desc = ctl.descriptor();
    let total = ctl.bus.cart.header.chr_rom_size.max(ctl.bus.cart.header.chr_ram_size);
    let ram = ctl.bus.cart.header.chr_rom_size == 0;

    for (window, w) in desc.chr_windows.iter().enumerate().filter(|(_, w)| w.latch.is_none()) {
        if ram {
            for bank in 0..=w.max_bank {
                if let Err(err) = ctl.select_chr_bank(window, bank) {
                    report.refused(TestResult::CHR_BANK, "CHR bank", err);
                    return;
                }
                ctl.bus.ppu_write(w.base, page_tag(bank, w, CHR_PAGE, total));
            }
        }
        for bank in 0..=w.max_bank {
            if let Err(err) = ctl.select_chr_bank(window, bank) {
                report.refused(TestResult::CHR_BANK, "CHR bank", err);
                return;
            }
            let expected = page_tag(bank, w, CHR_PAGE, total);
            let got = ctl.bus.ppu_read(w.base);
            report.check(TestResult::CHR_BANK, got == expected, || {
                format!("CHR window {window} bank {bank}: read page {got}, expected {expected}")
            });
            report.chr_banks += 1;
        }
        if let Err(err) = ctl.select_chr_bank(window, 0) {
            report.refused(TestResult::CHR_BANK, "CHR bank", err);
        }
    }
}

/// Address whose fetch puts the latch for `base`'s half of pattern memory into `latch`.
fn latch_trigger(base: u16, latch: Latch) -> u16 {
    match (base >= 0x1000, latch) {
        (false, Latch::Fd) => regs::MMC2_LATCH0_FD,
        (false, Latch::Fe) => regs::MMC2_LATCH0_FE,
        (true, Latch::Fd) => regs::MMC2_LATCH1_FD,
        (true, Latch::Fe) => regs::MMC2_LATCH1_FE,
    }
}

/// MMC2/MMC4: each latch register must show only while its latch is set.
pub fn chr_latches(ctl: &mut BankController<CartBus>, report: &mut Report) {
    let desc = ctl.descriptor();
    let total = ctl.bus.cart.header.chr_rom_size.max(ctl.bus.cart.header.chr_ram_size);
    let windows: Vec<(usize, WindowSpec)> = desc.chr_windows.iter().copied().enumerate().collect();

    // Distinct banks per window so a wrong latch shows up as a wrong tag
    for &(window, w) in &windows {
        if let Err(err) = ctl.select_chr_bank(window, (window as u16 * 3 + 1) % (w.max_bank + 1)) {
            report.refused(TestResult::CHR_LATCH, "CHR latch", err);
            return;
        }
    }

    for &(window, w) in &windows {
        let Some(latch) = w.latch else { continue };
        let bank = (window as u16 * 3 + 1) % (w.max_bank + 1);
        // The trigger fetch itself still sees the old latch
        ctl.bus.ppu_read(latch_trigger(w.base, latch));
        let expected = page_tag(bank, &w, CHR_PAGE, total);
        let got = ctl.bus.ppu_read(w.base);
        report.check(TestResult::CHR_LATCH, got == expected, || {
            format!("CHR latch {latch:?} at ${:04X}: read page {got}, expected {expected}", w.base)
        });
        report.chr_banks += 1;
    }
}

/// WRAM read/write, then disable and write protect where the board has them.
pub fn wram(ctl: &mut BankController<CartBus>, report: &mut Report) {
    report.wram = true;
    if let Err(err) = ctl.set_wram(WramMode::ReadWrite) {
        report.refused(TestResult::WRAM, "WRAM enable", err);
        return;
    }
    ctl.bus.write(regs::WRAM_START, 0xA5);
    ctl.bus.write(regs::WRAM_END, 0x5A);
    let (lo, hi) = (ctl.bus.read(regs::WRAM_START), ctl.bus.read(regs::WRAM_END));
    report.check(TestResult::WRAM, lo == 0xA5 && hi == 0x5A, || {
        format!("WRAM read back ${lo:02X}/${hi:02X}, expected $A5/$5A")
    });

    match ctl.set_wram(WramMode::Disabled) {
        Ok(()) => {
            ctl.bus.write(regs::WRAM_START, 0xC3);
            let disabled = ctl.bus.read(regs::WRAM_START);
            if let Err(err) = ctl.set_wram(WramMode::ReadWrite) {
                report.refused(TestResult::WRAM, "WRAM re-enable", err);
                return;
            }
            let kept = ctl.bus.read(regs::WRAM_START);
            report.check(
                TestResult::WRAM_DISABLE,
                disabled == open_bus(regs::WRAM_START) && kept == 0xA5,
                || format!("disabled WRAM read ${disabled:02X}, then ${kept:02X} after enable"),
            );
        }
        Err(err) => report.notes.push(format!("WRAM disable skipped: {err}")),
    }

    match ctl.set_wram(WramMode::ReadOnly) {
        Ok(()) => {
            ctl.bus.write(regs::WRAM_START, 0x11);
            let got = ctl.bus.read(regs::WRAM_START);
            if let Err(err) = ctl.set_wram(WramMode::ReadWrite) {
                report.refused(TestResult::WRAM, "WRAM re-enable", err);
                return;
            }
            report.check(TestResult::WRAM_PROTECT, got == 0xA5, || {
                format!("write-protected WRAM changed to ${got:02X}")
            });
        }
        Err(err) => report.notes.push(format!("WRAM protect skipped: {err}")),
    }
}

const NAMETABLES: [u16; 4] = [0x2000, 0x2400, 0x2800, 0x2C00];

/// Which nametables alias nametable 0 in each mode.
fn aliases(mode: Mirroring) -> [bool; 4] {
    match mode {
        Mirroring::Vertical => [true, false, true, false],
        Mirroring::Horizontal => [true, true, false, false],
        Mirroring::FourScreen => [true, false, false, false],
        Mirroring::OneScreenLower | Mirroring::OneScreenUpper => [true; 4],
    }
}

/// For each supported mode, write a marker to nametable 0 and see where it shows up.
/// One-screen lower and upper also have to land in different CIRAM pages.
pub fn mirroring(ctl: &mut BankController<CartBus>, report: &mut Report) {
    let modes: Vec<Mirroring> = ctl.descriptor().mirroring.modes().collect();
    for (i, &mode) in modes.iter().enumerate() {
        if let Err(err) = ctl.set_mirroring(mode) {
            report.refused(TestResult::MIRRORING, "mirroring", err);
            continue;
        }
        for addr in NAMETABLES.iter().rev() {
            ctl.bus.ppu_write(*addr, 0);
        }
        let marker = 0x80 | i as u8;
        ctl.bus.ppu_write(NAMETABLES[0], marker);
        let seen = NAMETABLES.map(|addr| ctl.bus.ppu_read(addr) == marker);
        report.check(TestResult::MIRRORING, seen == aliases(mode), || {
            format!("{mode:?}: marker seen at {seen:?}")
        });
    }

    let one_screen = [Mirroring::OneScreenLower, Mirroring::OneScreenUpper];
    if one_screen.iter().all(|m| modes.contains(m)) {
        let result = (|| {
            ctl.set_mirroring(Mirroring::OneScreenLower)?;
            ctl.bus.ppu_write(NAMETABLES[0], 0xAA);
            ctl.set_mirroring(Mirroring::OneScreenUpper)?;
            ctl.bus.ppu_write(NAMETABLES[0], 0x55);
            ctl.set_mirroring(Mirroring::OneScreenLower)?;
            Ok::<u8, MapperError>(ctl.bus.ppu_read(NAMETABLES[0]))
        })();
        match result {
            Ok(got) => report.check(TestResult::MIRRORING, got == 0xAA, || {
                format!("one-screen upper wrote over the lower page (read ${got:02X})")
            }),
            Err(err) => report.refused(TestResult::MIRRORING, "mirroring", err),
        }
    }
}

/// One rendered scanline as the MMC3 sees it: background from $0000, sprites from $1000.
fn scanline(bus: &mut CartBus) {
    bus.ppu_read(0x0000);
    bus.ppu_read(0x1000);
}

/// Arm the IRQ counter and check that it fires after exactly `period` units, stays
/// quiet before, and that disabling acknowledges it.
pub fn irq(ctl: &mut BankController<CartBus>, report: &mut Report) {
    let kind = ctl.descriptor().irq;
    let period: u32 = match kind {
        IrqKind::Scanline => 8,
        IrqKind::CpuCycle => 100,
        IrqKind::None => return,
    };
    let advance = |bus: &mut CartBus, n: u32| match kind {
        IrqKind::Scanline => (0..n).for_each(|_| scanline(bus)),
        _ => bus.tick(n as usize),
    };

    if let Err(err) = ctl.configure_irq(period, true) {
        report.refused(TestResult::IRQ, "IRQ", err);
        return;
    }
    advance(&mut ctl.bus, period - 1);
    let early = ctl.bus.poll_irq();
    advance(&mut ctl.bus, 1);
    let fired = ctl.bus.poll_irq();
    report.check(TestResult::IRQ, !early && fired, || {
        format!("IRQ with period {period}: early {early}, at period {fired}")
    });

    if let Err(err) = ctl.acknowledge_irq() {
        report.refused(TestResult::IRQ, "IRQ acknowledge", err);
        return;
    }
    report.check(TestResult::IRQ, !ctl.bus.poll_irq(), || "IRQ still asserted after acknowledge".to_string());

    // Masked: the counter runs but the line stays low
    if let Err(err) = ctl.configure_irq(period, false) {
        report.refused(TestResult::IRQ, "IRQ", err);
        return;
    }
    advance(&mut ctl.bus, period * 2);
    report.check(TestResult::IRQ, !ctl.bus.poll_irq(), || "masked IRQ asserted".to_string());

    let bad = period_limit(kind) + 1;
    report.check(
        TestResult::IRQ,
        ctl.configure_irq(bad, true) == Err(MapperError::InvalidIrqPeriod(bad)),
        || format!("IRQ period {bad} was accepted"),
    );
}

fn period_limit(kind: IrqKind) -> u32 {
    match kind {
        IrqKind::Scanline => 256,
        IrqKind::CpuCycle => 65536,
        IrqKind::None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::cartridge::Cartridge;
    use crate::cartridge::image::{self, ImageSpec};
    use crate::cartridge::mapper::Chr;
    use crate::registry::{all, id, resolve};

    fn controller(mapper: u8, spec: Option<ImageSpec>) -> BankController<CartBus> {
        let desc = resolve(mapper).unwrap();
        let spec = spec.unwrap_or_else(|| ImageSpec::for_board(desc));
        BankController::new(desc, CartBus::new(image::synthesize(desc, &spec).unwrap()))
    }

    #[test]
    fn every_board_passes() {
        for desc in all() {
            let mut ctl = controller(desc.id, None);
            let report = run(&mut ctl);
            assert!(report.passed(), "{}: {:?} {:?}", desc.name, report.failures, report.notes);
            assert_eq!(report.prg_banks, desc.prg_windows.iter().map(|w| w.max_bank as usize + 1).sum::<usize>());
        }
    }

    #[test]
    fn detects_smaller_prg() {
        let desc = resolve(id::MMC3).unwrap();
        let mut ctl = controller(id::MMC3, Some(ImageSpec::for_board(desc).with_prg_kib(128).unwrap()));
        let report = run(&mut ctl);
        assert!(report.passed(), "{:?}", report.notes);
        assert_eq!(report.prg_size, Some(128 * 1024));
    }

    #[test]
    fn chr_ram_boards_are_tagged_by_writing() {
        let mut ctl = controller(id::UNROM512, None);
        let report = run(&mut ctl);
        assert!(report.passed(), "{:?}", report.notes);
        assert_eq!(report.chr_banks, 4);
    }

    #[test]
    fn reports_wrong_prg_contents() {
        // Every page tagged 0: bank switching appears to do nothing
        let desc = resolve(id::UXROM).unwrap();
        let mut prg = image::tagged_prg(0x40000);
        for page in prg.chunks_mut(PRG_PAGE) {
            page[0] = 0;
        }
        let cart = Cartridge::from_parts(desc, prg, Chr::ram(0x2000), Mirroring::Vertical);
        let mut ctl = BankController::new(desc, CartBus::new(cart));
        let report = run(&mut ctl);
        assert!(report.failures.contains(TestResult::PRG_BANK));
        assert!(report.failures.contains(TestResult::PRG_SIZE));
        assert!(!report.notes.is_empty());
    }

    #[test]
    fn irq_and_wram_checks_run_where_supported() {
        let report = run(&mut controller(id::FME7, None));
        assert!(report.tested.contains(TestResult::IRQ | TestResult::WRAM | TestResult::WRAM_DISABLE));
        assert!(!report.tested.contains(TestResult::WRAM_PROTECT));

        let report = run(&mut controller(id::MMC3, None));
        assert!(report.tested.contains(TestResult::WRAM_PROTECT | TestResult::MIRRORING));

        let report = run(&mut controller(id::CNROM, None));
        assert!(!report.tested.intersects(TestResult::IRQ | TestResult::WRAM | TestResult::MIRRORING));
        assert!(!report.wram);
    }

    #[test]
    fn wram_is_enabled_after_disable_and_protect_checks() {
        for mapper in [id::MMC1, id::MMC3, id::FME7] {
            let mut ctl = controller(mapper, None);
            ctl.initialize();
            let mut report = Report::new(ctl.descriptor());
            wram(&mut ctl, &mut report);
            assert!(report.passed(), "{:?}", report.notes);
            assert!(report.tested.contains(TestResult::WRAM_DISABLE));
            assert_eq!(ctl.wram(), Some(WramMode::ReadWrite));
            ctl.bus.write(regs::WRAM_START, 0x3C);
            assert_eq!(ctl.bus.read(regs::WRAM_START), 0x3C);
        }
    }

    #[test]
    fn result_names() {
        assert_eq!(TestResult::CHR_LATCH.name(), "CHR latches");
        assert_eq!((TestResult::IRQ | TestResult::WRAM).name(), "multiple");
    }
}
