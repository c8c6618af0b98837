use super::*;
use crate::cartridge::mapper::Mirroring;

#[test]
fn every_defined_id_resolves() {
    for id in [
        id::NROM,
        id::MMC1,
        id::UXROM,
        id::CNROM,
        id::MMC3,
        id::AXROM,
        id::MMC2,
        id::MMC4,
        id::COLORDREAMS,
        id::ACTION53,
        id::UNROM512,
        id::BNROM,
        id::GNROM,
        id::FME7,
    ] {
        let desc = resolve(id).unwrap();
        assert_eq!(desc.id, id);
    }
    assert_eq!(all().len(), 14);
}

#[test]
fn table_is_sorted_by_id() {
    assert!(all().windows(2).all(|w| w[0].id < w[1].id));
}

#[test]
fn unknown_sentinel_never_resolves() {
    assert_eq!(resolve(id::UNKNOWN).unwrap_err(), MapperError::UnknownMapper(248));
    assert_eq!(resolve(5).unwrap_err(), MapperError::UnknownMapper(5));
}

#[test]
fn mmc1_registers() {
    let desc = resolve(id::MMC1).unwrap();
    assert_eq!(desc.register(RegisterRole::Control), Some(0x8000));
    assert_eq!(desc.register(RegisterRole::Chr0), Some(0xA000));
    assert_eq!(desc.register(RegisterRole::Chr1), Some(0xC000));
    assert_eq!(desc.register(RegisterRole::Prg), Some(0xE000));
    assert_eq!(regs::MMC1_RESET, 0x80);
    assert_eq!(regs::MMC1_PRG_FIX_LAST, 0x0C);
    assert_eq!(regs::MMC1_CHR4K, 0x10);
}

#[test]
fn mmc3_registers() {
    let desc = resolve(id::MMC3).unwrap();
    assert_eq!(desc.register(RegisterRole::Select), Some(0x8000));
    assert_eq!(desc.register(RegisterRole::Data), Some(0x8001));
    assert_eq!(desc.register(RegisterRole::Mirroring), Some(0xA000));
    assert_eq!(desc.register(RegisterRole::WramProtect), Some(0xA001));
    assert_eq!(desc.register(RegisterRole::IrqPeriod), Some(0xC000));
    assert_eq!(desc.register(RegisterRole::IrqReload), Some(0xC001));
    assert_eq!(desc.register(RegisterRole::IrqDisable), Some(0xE000));
    assert_eq!(desc.register(RegisterRole::IrqEnable), Some(0xE001));
    assert_eq!(regs::MMC3_WRAM_ON, 0x80);
    assert_eq!(regs::MMC3_WRAM_READONLY & 0x40, 0x40);
}

#[test]
fn mmc2_and_mmc4_share_registers() {
    for mapper in [id::MMC2, id::MMC4] {
        let desc = resolve(mapper).unwrap();
        assert_eq!(desc.register(RegisterRole::Prg), Some(0xA000));
        assert_eq!(desc.register(RegisterRole::ChrFd0000), Some(0xB000));
        assert_eq!(desc.register(RegisterRole::ChrFe0000), Some(0xC000));
        assert_eq!(desc.register(RegisterRole::ChrFd1000), Some(0xD000));
        assert_eq!(desc.register(RegisterRole::ChrFe1000), Some(0xE000));
        assert_eq!(desc.register(RegisterRole::Mirroring), Some(0xF000));
        assert_eq!(desc.chr_windows.len(), 4);
        assert!(desc.chr_windows.iter().all(|w| w.latch.is_some()));
    }
}

#[test]
fn fme7_and_action53_registers() {
    let fme7 = resolve(id::FME7).unwrap();
    assert_eq!(fme7.register(RegisterRole::Select), Some(0x8000));
    assert_eq!(fme7.register(RegisterRole::Data), Some(0xA000));

    let a53 = resolve(id::ACTION53).unwrap();
    assert_eq!(a53.register(RegisterRole::Select), Some(0x5000));
    assert_eq!(a53.register(RegisterRole::Data), Some(0x8000));
    assert_eq!(
        [regs::A53_REG_CHR, regs::A53_REG_INNER, regs::A53_REG_MODE, regs::A53_REG_OUTER],
        [0x00, 0x01, 0x80, 0x81]
    );
}

#[test]
fn discrete_boards_use_single_latch() {
    for mapper in [id::UXROM, id::CNROM, id::AXROM, id::COLORDREAMS, id::UNROM512, id::BNROM, id::GNROM] {
        let desc = resolve(mapper).unwrap();
        assert_eq!(desc.register(RegisterRole::Latch), Some(0x8000), "{}", desc.name);
        assert!(desc.latch.is_some(), "{}", desc.name);
    }
}

#[test]
fn fme7_supports_all_mirroring_modes() {
    let desc = resolve(id::FME7).unwrap();
    for mode in [
        Mirroring::Vertical,
        Mirroring::Horizontal,
        Mirroring::OneScreenLower,
        Mirroring::OneScreenUpper,
    ] {
        assert!(desc.supports_mirroring(mode));
    }
    assert!(!desc.supports_mirroring(Mirroring::FourScreen));
}

#[test]
fn axrom_only_switches_one_screen() {
    let desc = resolve(id::AXROM).unwrap();
    assert!(desc.supports_mirroring(Mirroring::OneScreenLower));
    assert!(desc.supports_mirroring(Mirroring::OneScreenUpper));
    assert!(!desc.supports_mirroring(Mirroring::Vertical));
    assert!(!desc.supports_mirroring(Mirroring::Horizontal));
}

#[test]
fn hardwired_boards_have_no_mirroring_control() {
    for mapper in [id::NROM, id::UXROM, id::CNROM, id::BNROM, id::GNROM, id::COLORDREAMS] {
        let desc = resolve(mapper).unwrap();
        assert!(!desc.supports_multiple_mirror_modes(), "{}", desc.name);
        assert_eq!(desc.mirroring.modes().count(), 0);
    }
}

#[test]
fn irq_only_on_mmc3_and_fme7() {
    let with_irq: Vec<u8> = all().iter().filter(|d| d.supports_irq()).map(|d| d.id).collect();
    assert_eq!(with_irq, vec![id::MMC3, id::FME7]);
    assert_eq!(resolve(id::MMC3).unwrap().irq, IrqKind::Scanline);
    assert_eq!(resolve(id::FME7).unwrap().irq, IrqKind::CpuCycle);
}

#[test]
fn window_lookup_rejects_missing_windows() {
    let desc = resolve(id::MMC3).unwrap();
    assert_eq!(desc.prg_window(1).unwrap().base, 0xA000);
    assert_eq!(desc.prg_window(2), Err(MapperError::InvalidWindow { window: 2, count: 2 }));
    assert_eq!(desc.chr_window(5).unwrap().end(), 0x1FFF);

    let nrom = resolve(id::NROM).unwrap();
    assert_eq!(nrom.prg_window(0), Err(MapperError::InvalidWindow { window: 0, count: 0 }));
}

#[test]
fn windows_fit_their_address_space() {
    for desc in all() {
        for w in desc.prg_windows {
            assert!(w.base >= 0x8000 && (w.base as u32 + w.size) <= 0x10000, "{}", desc.name);
        }
        for w in desc.chr_windows {
            assert!((w.base as u32 + w.size) <= 0x2000, "{}", desc.name);
        }
    }
}

#[test]
fn latch_fields_match_window_ranges() {
    for desc in all() {
        let Some(layout) = desc.latch else { continue };
        if let Some(w) = desc.prg_windows.first() {
            assert_eq!(layout.prg.max() as u16, w.max_bank, "{}", desc.name);
        }
        if let Some(w) = desc.chr_windows.first() {
            assert_eq!(layout.chr.max() as u16, w.max_bank, "{}", desc.name);
        }
    }
}

#[test]
fn field_insert_and_extract() {
    let prg = Field(regs::GNROM_PRG);
    let chr = Field(regs::GNROM_CHR);
    let latch = chr.insert(prg.insert(0, 2), 3);
    assert_eq!(latch, 0x23);
    assert_eq!(prg.extract(latch), 2);
    assert_eq!(chr.extract(latch), 3);
    assert_eq!(prg.max(), 3);

    assert_eq!(Field::NONE.insert(0x55, 7), 0x55);
    assert_eq!(Field::NONE.extract(0xFF), 0);
    assert_eq!(Field::NONE.max(), 0);
}
