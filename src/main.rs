//! cartprobe entry point.
//!
//! Lists the mapper registry, runs bank diagnostics on a synthesized cartridge, or shows
//! how a ROM's board is controlled. See `config::USAGE`.

use std::env;
use std::process::ExitCode;

use ansi_term::Colour::{Cyan, Green, Red, Yellow};
use cartprobe::{
    bus::CartBus,
    cartridge::{
        cartridge::Cartridge,
        image::{self, ImageSpec},
    },
    config::{Command, Config, USAGE},
    control::controller::BankController,
    diagnostics::{self, Report, TestResult},
    error::CartridgeError,
    registry::{self, IrqKind, MapperDescriptor, WramControl},
};
use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle, default_format};
use log::{error, info};

fn init_logging(config: &Config) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(config.log_spec())?
        .log_to_stderr()
        .format(default_format)
        .start()
}

fn pass_fail(ok: bool, color: bool) -> String {
    let (text, colour) = if ok { ("PASS", Green) } else { ("FAIL", Red) };
    if color {
        colour.bold().paint(text).to_string()
    } else {
        text.to_string()
    }
}

fn heading(text: &str, color: bool) -> String {
    if color {
        Cyan.bold().paint(text).to_string()
    } else {
        text.to_string()
    }
}

fn features(desc: &MapperDescriptor) -> String {
    let mut out = Vec::new();
    if desc.supports_multiple_mirror_modes() {
        let modes: Vec<String> = desc.mirroring.modes().map(|m| format!("{m:?}")).collect();
        out.push(format!("mirroring {}", modes.join("/")));
    }
    match desc.wram {
        WramControl::None => {}
        WramControl::Fixed => out.push("WRAM".to_string()),
        _ => out.push("WRAM control".to_string()),
    }
    match desc.irq {
        IrqKind::None => {}
        IrqKind::Scanline => out.push("scanline IRQ".to_string()),
        IrqKind::CpuCycle => out.push("CPU cycle IRQ".to_string()),
    }
    if desc.bus_conflicts {
        out.push("bus conflicts".to_string());
    }
    out.join(", ")
}

fn list(color: bool) {
    println!("{}", heading(" ID  Board         PRG  CHR  Features", color));
    for desc in registry::all() {
        println!(
            "{:>3}  {:<12} {:>4} {:>4}  {}",
            desc.id,
            desc.name,
            desc.prg_windows.len(),
            desc.chr_windows.len(),
            features(desc)
        );
    }
}

fn print_registers(desc: &MapperDescriptor, color: bool) {
    println!("{}", heading("Registers", color));
    if desc.registers.is_empty() {
        println!("  (none)");
    }
    for reg in desc.registers {
        println!("  ${:04X}  {:?}", reg.addr, reg.role);
    }
    println!("{}", heading("Windows", color));
    for (kind, windows) in [("PRG", desc.prg_windows), ("CHR", desc.chr_windows)] {
        for (i, w) in windows.iter().enumerate() {
            let latch = w.latch.map(|l| format!(" latch {l:?}")).unwrap_or_default();
            println!(
                "  {kind} {i}: ${:04X}-${:04X} {:>2} KiB, banks 0-{}{latch}",
                w.base,
                w.end(),
                w.size / 1024,
                w.max_bank
            );
        }
    }
    let features = features(desc);
    if !features.is_empty() {
        println!("  {features}");
    }
}

fn print_report(report: &Report, color: bool) {
    println!(
        "{}",
        heading(&format!("{} (mapper {})", report.mapper.name, report.mapper.id), color)
    );
    for (flag, label) in TestResult::checks() {
        if report.tested.contains(flag) {
            println!("  {:<14} {}", label, pass_fail(!report.failures.contains(flag), color));
        }
    }
    println!("  {} PRG and {} CHR bank selections verified", report.prg_banks, report.chr_banks);
    if let Some(size) = report.prg_size {
        println!("  PRG size {} KiB", size / 1024);
    }
    for note in &report.notes {
        let note = if color { Yellow.paint(note.as_str()).to_string() } else { note.clone() };
        println!("  {note}");
    }
    println!("{}", pass_fail(report.passed(), color));
}

fn probe(mapper: u8, prg_kib: Option<usize>, chr_kib: Option<usize>, color: bool) -> Result<bool, CartridgeError> {
    let desc = registry::resolve(mapper)?;
    let mut spec = ImageSpec::for_board(desc);
    if let Some(kib) = prg_kib {
        spec = spec.with_prg_kib(kib)?;
    }
    if let Some(kib) = chr_kib {
        spec = spec.with_chr_kib(kib)?;
    }
    info!("Probing {} with {spec:?}", desc.name);

    let cart = image::synthesize(desc, &spec)?;
    let mut ctl = BankController::new(desc, CartBus::new(cart));
    let report = diagnostics::run(&mut ctl);
    print_report(&report, color);
    Ok(report.passed())
}

fn inspect(path: &std::path::Path, color: bool) -> Result<bool, CartridgeError> {
    let cart = Cartridge::load(path)?;
    let header = &cart.header;
    println!("{}", heading(&path.display().to_string(), color));
    println!(
        "  {} mapper {}.{} ({}), PRG {} KiB, CHR {} {} KiB, {:?}{}",
        if header.nes2 { "NES 2.0" } else { "iNES" },
        header.mapper,
        header.submapper,
        cart.descriptor.name,
        header.prg_rom_size / 1024,
        if header.chr_rom_size > 0 { "ROM" } else { "RAM" },
        header.chr_rom_size.max(header.chr_ram_size) / 1024,
        header.mirroring,
        if header.has_battery { ", battery" } else { "" },
    );
    print_registers(cart.descriptor, color);
    Ok(true)
}

fn run(config: &Config) -> Result<bool, CartridgeError> {
    match &config.command {
        Command::List => {
            list(config.color);
            Ok(true)
        }
        Command::Probe { mapper, prg_kib, chr_kib } => probe(*mapper, *prg_kib, *chr_kib, config.color),
        Command::Inspect { path } => inspect(path, config.color),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_args(env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    // Keep the handle alive for the whole run
    let _logger = match init_logging(&config) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("logging disabled: {err}");
            None
        }
    };

    match run(&config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
