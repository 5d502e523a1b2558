mod emulator;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use chip8_engine::CompatibilityMode;
use clap::{Parser, ValueEnum};
use tracing::Level;

use emulator::{DEFAULT_FRAME_RATE, DEFAULT_INSTRUCTIONS_PER_SECOND, Emulator, Settings};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Original COSMAC VIP behavior for shifts and register block transfers
    Chip8,
    /// SUPER-CHIP behavior for shifts and register block transfers
    SuperChip,
}

impl From<Mode> for CompatibilityMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Chip8 => CompatibilityMode::Chip8,
            Mode::SuperChip => CompatibilityMode::SuperChip,
        }
    }
}

/// Run a CHIP-8 program in the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the program image
    rom: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND, value_parser = clap::value_parser!(u64).range(1..))]
    ips: u64,

    /// Display refresh and timer rate in Hz
    #[arg(long, default_value_t = DEFAULT_FRAME_RATE, value_parser = clap::value_parser!(u64).range(1..))]
    frame_rate: u64,

    /// Interpreter lineage to follow where the two disagree
    #[arg(long, value_enum, default_value_t = Mode::SuperChip)]
    mode: Mode,

    /// Write logs to this file (the terminal is taken by the display)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Most verbose level written to the log file
    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

fn init_logging(path: &Path, level: Level) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("could not create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_max_level(level)
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path, args.log_level)?;
    }

    let settings = Settings::new(args.frame_rate, args.ips, args.rom, args.mode.into());
    let mut emulator = Emulator::new(settings);
    emulator.run()
}
