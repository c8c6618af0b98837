use crate::{
    bus::{Bus, CartBus, PpuBus},
    cartridge::{
        image::{self, CHR_PAGE, ImageSpec, PRG_PAGE},
        mapper::Mirroring,
    },
    control::controller::{BankController, WramMode},
    error::{Feature, MapperError},
    registry::{all, id, regs, resolve},
};

struct TestBus {
    mem: [u8; 65536],
    writes: Vec<(u16, u8)>,
}

impl TestBus {
    fn new() -> Self {
        Self { mem: [0; 65536], writes: Vec::new() }
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.writes.push((addr, data));
        self.mem[addr as usize] = data;
    }
}

fn recorded(mapper: u8) -> BankController<TestBus> {
    let mut ctl = BankController::new(resolve(mapper).unwrap(), TestBus::new());
    ctl.initialize();
    ctl.bus.writes.clear();
    ctl
}

fn on_image(mapper: u8) -> BankController<CartBus> {
    let desc = resolve(mapper).unwrap();
    let cart = image::synthesize(desc, &ImageSpec::for_board(desc)).unwrap();
    let mut ctl = BankController::new(desc, CartBus::new(cart));
    ctl.initialize();
    ctl
}

#[test]
fn operations_fail_before_initialize() {
    let mut ctl = BankController::new(resolve(id::MMC3).unwrap(), TestBus::new());
    assert_eq!(ctl.select_prg_bank(0, 1), Err(MapperError::NotInitialized));
    assert_eq!(ctl.select_chr_bank(0, 1), Err(MapperError::NotInitialized));
    assert_eq!(ctl.set_mirroring(Mirroring::Vertical), Err(MapperError::NotInitialized));
    assert_eq!(ctl.configure_irq(8, true), Err(MapperError::NotInitialized));
    assert_eq!(ctl.prg_bank(0), Err(MapperError::NotInitialized));
    assert!(ctl.bus.writes.is_empty());
    ctl.initialize();
    assert!(ctl.is_initialized());
    assert_eq!(ctl.select_prg_bank(0, 1), Ok(()));
}

#[test]
fn mmc1_initialize_resets_shift_register_first() {
    let mut ctl = BankController::new(resolve(id::MMC1).unwrap(), TestBus::new());
    ctl.initialize();
    assert_eq!(ctl.bus.writes[0], (regs::MMC1_CONTROL, regs::MMC1_RESET));
}

#[test]
fn mmc1_bank_goes_through_serial_port() {
    let mut ctl = recorded(id::MMC1);
    ctl.select_prg_bank(0, 5).unwrap();
    let expected: Vec<(u16, u8)> = [1, 0, 1, 0, 0].iter().map(|&b| (regs::MMC1_PRG, b)).collect();
    assert_eq!(ctl.bus.writes, expected);
}

#[test]
fn mmc3_uses_select_data_pair() {
    let mut ctl = recorded(id::MMC3);
    ctl.select_prg_bank(1, 9).unwrap();
    assert_eq!(ctl.bus.writes, vec![(0x8000, 7), (0x8001, 9)]);

    ctl.bus.writes.clear();
    ctl.select_chr_bank(1, 3).unwrap();
    // 2 KiB windows take bank numbers in 1 KiB units
    assert_eq!(ctl.bus.writes, vec![(0x8000, 1), (0x8001, 6)]);
}

#[test]
fn mmc2_chr_windows_map_to_latch_registers() {
    let mut ctl = recorded(id::MMC2);
    for (window, addr) in [(0, 0xB000), (1, 0xC000), (2, 0xD000), (3, 0xE000)] {
        ctl.bus.writes.clear();
        ctl.select_chr_bank(window, 4).unwrap();
        assert_eq!(ctl.bus.writes, vec![(addr, 4)]);
    }
}

#[test]
fn fme7_and_action53_commands() {
    let mut ctl = recorded(id::FME7);
    ctl.select_prg_bank(2, 0x21).unwrap();
    assert_eq!(ctl.bus.writes, vec![(0x8000, 0x0B), (0xA000, 0x21)]);

    let mut ctl = recorded(id::ACTION53);
    ctl.select_prg_bank(0, 3).unwrap();
    assert_eq!(ctl.bus.writes, vec![(0x5000, regs::A53_REG_INNER), (0x8000, 3)]);
}

#[test]
fn latch_writes_avoid_bus_conflicts() {
    let mut ctl = recorded(id::UXROM);
    ctl.select_prg_bank(0, 5).unwrap();
    assert_eq!(ctl.bus.writes, vec![(regs::BUS_CONFLICT_TABLE + 5, 5)]);

    let mut ctl = recorded(id::GNROM);
    ctl.select_prg_bank(0, 2).unwrap();
    ctl.select_chr_bank(0, 1).unwrap();
    assert_eq!(ctl.bus.writes.last(), Some(&(regs::BUS_CONFLICT_TABLE + 0x21, 0x21)));

    let mut ctl = recorded(id::UNROM512);
    ctl.select_prg_bank(0, 5).unwrap();
    assert_eq!(ctl.bus.writes, vec![(regs::LATCH, 5)]);
}

#[test]
fn rejects_bad_windows_and_banks() {
    let mut ctl = recorded(id::MMC1);
    assert_eq!(ctl.select_prg_bank(1, 0), Err(MapperError::InvalidWindow { window: 1, count: 1 }));
    assert_eq!(ctl.select_prg_bank(0, 16), Err(MapperError::BankOutOfRange { bank: 16, max: 15 }));
    assert_eq!(ctl.select_chr_bank(2, 0), Err(MapperError::InvalidWindow { window: 2, count: 2 }));

    let mut ctl = recorded(id::NROM);
    assert_eq!(ctl.select_prg_bank(0, 0), Err(MapperError::InvalidWindow { window: 0, count: 0 }));
    assert!(ctl.bus.writes.is_empty());
}

#[test]
fn fme7_accepts_every_mirroring_mode() {
    let mut ctl = recorded(id::FME7);
    for mode in [
        Mirroring::Vertical,
        Mirroring::Horizontal,
        Mirroring::OneScreenLower,
        Mirroring::OneScreenUpper,
    ] {
        assert_eq!(ctl.set_mirroring(mode), Ok(()));
        assert_eq!(ctl.mirroring(), Some(mode));
    }
    assert_eq!(ctl.bus.writes.last(), Some(&(regs::FME7_DATA, regs::FME7_MIRROR_1UPPER)));
    assert_eq!(
        ctl.set_mirroring(Mirroring::FourScreen),
        Err(MapperError::UnsupportedMode(Mirroring::FourScreen))
    );
}

#[test]
fn axrom_rejects_two_screen_modes() {
    let mut ctl = recorded(id::AXROM);
    assert_eq!(ctl.set_mirroring(Mirroring::Vertical), Err(MapperError::UnsupportedMode(Mirroring::Vertical)));
    assert_eq!(
        ctl.set_mirroring(Mirroring::Horizontal),
        Err(MapperError::UnsupportedMode(Mirroring::Horizontal))
    );
    assert!(ctl.bus.writes.is_empty());
    ctl.set_mirroring(Mirroring::OneScreenUpper).unwrap();
    let value = regs::AXROM_UPPER_SCREEN;
    assert_eq!(ctl.bus.writes, vec![(regs::BUS_CONFLICT_TABLE + value as u16, value)]);
}

#[test]
fn hardwired_boards_reject_every_mode() {
    for mapper in [id::NROM, id::UXROM, id::CNROM, id::BNROM, id::GNROM, id::COLORDREAMS] {
        let mut ctl = recorded(mapper);
        assert!(ctl.set_mirroring(Mirroring::Vertical).is_err());
        assert!(ctl.set_mirroring(Mirroring::OneScreenLower).is_err());
        assert_eq!(ctl.mirroring(), None);
    }
}

#[test]
fn irq_only_on_counter_boards() {
    for desc in all() {
        let mut ctl = recorded(desc.id);
        let result = ctl.configure_irq(8, true);
        let ack = ctl.acknowledge_irq();
        if desc.supports_irq() {
            assert_eq!(result, Ok(()), "{}", desc.name);
            assert_eq!(ack, Ok(()), "{}", desc.name);
        } else {
            assert_eq!(result, Err(MapperError::NotSupported(Feature::Irq)), "{}", desc.name);
            assert_eq!(ack, Err(MapperError::NotSupported(Feature::Irq)), "{}", desc.name);
        }
    }
}

#[test]
fn irq_period_limits() {
    let mut ctl = recorded(id::MMC3);
    assert_eq!(ctl.configure_irq(0, true), Err(MapperError::InvalidIrqPeriod(0)));
    assert_eq!(ctl.configure_irq(257, true), Err(MapperError::InvalidIrqPeriod(257)));
    ctl.configure_irq(256, true).unwrap();
    assert_eq!(ctl.bus.writes[0], (regs::MMC3_IRQ_PERIOD, 0xFF));

    let mut ctl = recorded(id::FME7);
    assert_eq!(ctl.configure_irq(65537, true), Err(MapperError::InvalidIrqPeriod(65537)));
    ctl.configure_irq(65536, false).unwrap();
    assert!(ctl.bus.writes.contains(&(regs::FME7_SELECT, regs::FME7_IRQ_COUNTER_HI)));
    assert_eq!(ctl.bus.writes.last(), Some(&(regs::FME7_DATA, 0xFF)));
}

#[test]
fn wram_capabilities() {
    let mut ctl = recorded(id::NROM);
    assert_eq!(ctl.set_wram(WramMode::ReadWrite), Err(MapperError::NotSupported(Feature::Wram)));

    let mut ctl = recorded(id::MMC1);
    assert_eq!(ctl.set_wram(WramMode::ReadOnly), Err(MapperError::NotSupported(Feature::WramProtect)));
    ctl.set_wram(WramMode::Disabled).unwrap();
    assert_eq!(ctl.wram(), Some(WramMode::Disabled));

    let mut ctl = recorded(id::MMC3);
    ctl.set_wram(WramMode::ReadOnly).unwrap();
    assert_eq!(ctl.bus.writes, vec![(regs::MMC3_WRAM_PROTECT, regs::MMC3_WRAM_READONLY)]);

    let mut ctl = recorded(id::MMC4);
    assert_eq!(ctl.set_wram(WramMode::ReadWrite), Ok(()));
    assert_eq!(ctl.set_wram(WramMode::Disabled), Err(MapperError::NotSupported(Feature::Wram)));
}

#[test]
fn mmc1_wram_bit_survives_bank_switch() {
    let mut ctl = on_image(id::MMC1);
    ctl.bus.write(0x6000, 0x5A);
    ctl.set_wram(WramMode::Disabled).unwrap();
    ctl.select_prg_bank(0, 3).unwrap();
    assert_ne!(ctl.bus.read(0x6000), 0x5A);
    ctl.set_wram(WramMode::ReadWrite).unwrap();
    assert_eq!(ctl.bus.read(0x6000), 0x5A);
}

fn prg_tag(spec: &ImageSpec, size: u32, bank: u16) -> u8 {
    let pages = spec.prg_size / PRG_PAGE;
    ((bank as usize * size as usize / PRG_PAGE) % pages) as u8
}

fn chr_tag(spec: &ImageSpec, size: u32, bank: u16) -> u8 {
    let pages = spec.chr_size / CHR_PAGE;
    ((bank as usize * size as usize / CHR_PAGE) % pages) as u8
}

#[test]
fn selected_bank_reads_back_from_hardware() {
    for desc in all() {
        let spec = ImageSpec::for_board(desc);
        let mut ctl = on_image(desc.id);
        for (window, w) in desc.prg_windows.iter().enumerate() {
            for bank in [w.max_bank, 1, w.max_bank / 2, 0] {
                ctl.select_prg_bank(window, bank).unwrap();
                assert_eq!(ctl.prg_bank(window), Ok(bank));
                assert_eq!(ctl.bus.read(w.base), prg_tag(&spec, w.size, bank), "{} PRG {window}/{bank}", desc.name);
            }
        }
        if spec.chr_ram {
            continue;
        }
        for (window, w) in desc.chr_windows.iter().enumerate().filter(|(_, w)| w.latch.is_none()) {
            for bank in [w.max_bank, 1, 0] {
                ctl.select_chr_bank(window, bank).unwrap();
                assert_eq!(ctl.chr_bank(window), Ok(bank));
                assert_eq!(ctl.bus.ppu_read(w.base), chr_tag(&spec, w.size, bank), "{} CHR {window}/{bank}", desc.name);
            }
        }
    }
}

#[test]
fn mmc2_latch_picks_register() {
    let spec = ImageSpec::for_board(resolve(id::MMC2).unwrap());
    let mut ctl = on_image(id::MMC2);
    ctl.select_chr_bank(0, 2).unwrap();
    ctl.select_chr_bank(1, 5).unwrap();
    // Latches power up in the FE state
    assert_eq!(ctl.bus.ppu_read(0x0000), chr_tag(&spec, 0x1000, 5));
    ctl.bus.ppu_read(regs::MMC2_LATCH0_FD);
    assert_eq!(ctl.bus.ppu_read(0x0000), chr_tag(&spec, 0x1000, 2));
    ctl.bus.ppu_read(regs::MMC2_LATCH0_FE);
    assert_eq!(ctl.bus.ppu_read(0x0000), chr_tag(&spec, 0x1000, 5));
}

#[test]
fn handler_between_select_and_data_does_not_tear_pair() {
    let mut ctl = on_image(id::MMC3);
    ctl.write_select(6);
    ctl.run_handler(|c| c.select_chr_bank(2, 9).unwrap());
    ctl.write_data(3);
    assert_eq!(ctl.bus.read(0x8000), 3);
    assert_eq!(ctl.bus.ppu_read(0x1000), 9);
}

#[test]
fn handler_restores_select_register() {
    let mut ctl = recorded(id::FME7);
    ctl.write_select(regs::FME7_PRG_8000);
    ctl.bus.writes.clear();
    let result = ctl.run_handler(|c| c.set_mirroring(Mirroring::Horizontal));
    assert_eq!(result, Ok(()));
    assert_eq!(ctl.bus.writes.last(), Some(&(regs::FME7_SELECT, regs::FME7_PRG_8000)));
}

#[test]
fn action53_one_screen_survives_bank_writes() {
    let mut ctl = on_image(id::ACTION53);
    ctl.set_mirroring(Mirroring::OneScreenUpper).unwrap();
    ctl.select_prg_bank(0, 2).unwrap();
    ctl.select_chr_bank(0, 1).unwrap();
    assert_eq!(ctl.bus.cart.mirroring(), Mirroring::OneScreenUpper);
    ctl.set_mirroring(Mirroring::OneScreenLower).unwrap();
    ctl.select_prg_bank(0, 3).unwrap();
    assert_eq!(ctl.bus.cart.mirroring(), Mirroring::OneScreenLower);
}
