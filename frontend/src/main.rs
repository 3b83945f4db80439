use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info, warn};
use z80emu_core::core::{Machine, RunStatus};

mod config;
mod debugger;
mod display;
mod program;

use config::Config;
use debugger::{Flow, Monitor};

#[derive(Parser, Debug)]
#[command(
    name = "z80emu",
    version,
    about = "Z80 emulator with a machine-code monitor"
)]
struct Cli {
    /// Binary image to load before starting.
    program: Option<PathBuf>,

    /// Address to load PROGRAM at (hex).
    #[arg(long = "load-addr", value_name = "HEX", value_parser = parse_hex_arg, default_value = "0")]
    load_addr: u16,

    /// Memory size in bytes (1..=65536). Overrides the config file.
    #[arg(long = "memory-size", value_name = "BYTES")]
    memory_size: Option<usize>,

    /// Config file to use instead of the default location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Run without the monitor, from HEX or the configured entry point.
    /// Exits 0 on HALT and 1 when stopped by the step budget.
    #[arg(long, value_name = "HEX", num_args = 0..=1, value_parser = parse_hex_arg)]
    run: Option<Option<u16>>,

    /// Stop a run after N instructions (0 = unlimited).
    #[arg(long = "max-steps", value_name = "N")]
    max_steps: Option<u64>,
}

fn parse_hex_arg(text: &str) -> Result<u16, String> {
    debugger::parse_hex(text).ok_or_else(|| format!("invalid hex address: {text}"))
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("z80emu: {e}");
            return ExitCode::from(2);
        }
    };
    init_logging(&config.log.level);

    match run(cli, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("z80emu: {e}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli, config: &Config) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let memory_size = cli.memory_size.unwrap_or(config.memory.size);
    let mut machine = Machine::new(memory_size)?;
    let max_steps = match cli.max_steps {
        Some(0) => None,
        Some(n) => Some(n),
        None => config.max_steps(),
    };
    machine.set_max_steps(max_steps);
    machine.cpu.set_pc(config.run.entry);

    let stop = machine.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || stop.request_stop()) {
        warn!("Ctrl-C will not interrupt runs: {e}");
    }

    println!("Memory size: {:04x}", machine.memory.size());

    if let Some(path) = &cli.program {
        let n = program::load_file(&mut machine, path, cli.load_addr)?;
        println!("Loaded {n} bytes at {:04X}", cli.load_addr);
    }

    if let Some(addr) = cli.run {
        let entry = addr.unwrap_or(config.run.entry);
        info!("running from {entry:04X}");
        let status = machine.run_from(entry);
        println!("{}", display::registers(&machine.cpu));
        return Ok(match status {
            RunStatus::Halted => ExitCode::SUCCESS,
            RunStatus::Stopped => ExitCode::FAILURE,
        });
    }

    let stdout = io::stdout();
    let mut monitor = Monitor::new(machine, config.run.delay_us, stdout.lock());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        monitor.prompt()?;
        let Some(line) = lines.next() else {
            break;
        };
        if monitor.handle_line(&line?)? == Flow::Quit {
            break;
        }
    }
    debug!("monitor exit with PC at {:04X}", monitor.machine().cpu.pc());

    Ok(ExitCode::SUCCESS)
}
