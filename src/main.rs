use clap::Parser;
use lc3_vm::emulator::{self, EmulatorConfig};
use lc3_vm::errors::ExecutionError;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_LOAD_FAILURE: u8 = 1;
const EXIT_RESERVED_OPCODE: u8 = 3;
const EXIT_EXECUTION_FAILURE: u8 = 4;
const EXIT_INTERRUPTED: u8 = 130;

/// Runs an LC-3 program image in the terminal.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Program image: big-endian u16 words, the first one being the load address
    image: PathBuf,
    /// Log more details to stderr, repeat for more, overridden by `LC3_LOG`
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Do not print a notice when the program halts
    #[arg(long)]
    no_halt_notice: bool,
    /// Stop after that many instructions
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("LC3_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut emu = match emulator::from_program(&args.image) {
        Ok(emu) => emu,
        Err(e) => {
            eprintln!("Failed to load image: {e}");
            return ExitCode::from(EXIT_LOAD_FAILURE);
        }
    };
    emu.set_config(
        EmulatorConfig::default()
            .with_halt_notice(!args.no_halt_notice)
            .with_max_steps(args.max_steps),
    );
    match emu.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(match e {
                ExecutionError::Interrupted => EXIT_INTERRUPTED,
                ExecutionError::ReservedOpcode { .. } => EXIT_RESERVED_OPCODE,
                ExecutionError::IOInputOutputError(_) | ExecutionError::StepLimitReached(_) => {
                    EXIT_EXECUTION_FAILURE
                }
            })
        }
    }
}
