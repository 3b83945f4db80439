//! Line-oriented monitor: parses commands and drives the machine.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use z80emu_core::core::{Machine, RunStatus};

use crate::display;
use crate::program;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line: step once if a program has been started.
    Repeat,
    Run(Option<u16>),
    Next,
    Cont,
    Mem(Option<u16>),
    Regs,
    Load { path: String, addr: u16 },
    Dump { path: String, addr: u16, len: usize },
    Delay(Option<u64>),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Known command, bad arguments. Holds the usage line.
    Usage(&'static str),
    Unknown(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Usage(usage) => write!(f, "Usage: {usage}"),
            CommandError::Unknown(_) => f.write_str(SUMMARY),
        }
    }
}

impl std::error::Error for CommandError {}

const SUMMARY: &str = "Commands: run [hex], mem [hex], regs, delay [value], load <path> <hex>, \
                       dump <path> <hex> <len>, next, cont, help, quit";

const HELP: &str = "\
Commands:
  run [hex]    start execution (defaults to PC)
  next         step one instruction (empty line repeats)
  cont         run until HALT from PC
  mem [hex]    show 32-byte memory window (defaults to PC)
  regs         show registers and flags
  delay [n]    show/set delay between instructions (microseconds)
  load <path> <hex>         load file at address
  dump <path> <hex> <len>   dump memory to file
  help         show this text
  quit         exit emulator
Ctrl-C interrupts a run or cont.";

/// Hex address, with or without a `0x` prefix.
pub fn parse_hex(text: &str) -> Option<u16> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).ok()
}

/// Split into words; a word starting with a quote runs to the matching quote.
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut chars = line.trim().chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut word = String::new();
        if c == '"' || c == '\'' {
            chars.next();
            for ch in chars.by_ref() {
                if ch == c {
                    break;
                }
                word.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                word.push(ch);
                chars.next();
            }
        }
        words.push(word);
    }
    words
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let words = split_words(line);
    let Some((cmd, args)) = words.split_first() else {
        return Ok(Command::Repeat);
    };
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let optional_addr = |usage: &'static str| match args.as_slice() {
        [] => Ok(None),
        [addr] => parse_hex(addr).map(Some).ok_or(CommandError::Usage(usage)),
        _ => Err(CommandError::Usage(usage)),
    };

    match cmd.as_str() {
        "run" | "r" => optional_addr("run [hex_address]").map(Command::Run),
        "next" | "n" => Ok(Command::Next),
        "cont" | "c" => Ok(Command::Cont),
        "mem" | "m" => optional_addr("mem [hex_address]").map(Command::Mem),
        "regs" | "g" => Ok(Command::Regs),
        "delay" | "d" => match args.as_slice() {
            [] => Ok(Command::Delay(None)),
            [n] => n
                .parse()
                .map(|n| Command::Delay(Some(n)))
                .map_err(|_| CommandError::Usage("delay <value>")),
            _ => Err(CommandError::Usage("delay <value>")),
        },
        "load" | "l" => {
            const USAGE: &str = "load <path> <hex_address>";
            match args.as_slice() {
                [path, addr] => Ok(Command::Load {
                    path: path.to_string(),
                    addr: parse_hex(addr).ok_or(CommandError::Usage(USAGE))?,
                }),
                _ => Err(CommandError::Usage(USAGE)),
            }
        }
        "dump" | "x" => {
            const USAGE: &str = "dump <path> <hex_address> <length>";
            match args.as_slice() {
                [path, addr, len] => Ok(Command::Dump {
                    path: path.to_string(),
                    addr: parse_hex(addr).ok_or(CommandError::Usage(USAGE))?,
                    len: len.parse().map_err(|_| CommandError::Usage(USAGE))?,
                }),
                _ => Err(CommandError::Usage(USAGE)),
            }
        }
        "help" | "h" | "usage" => Ok(Command::Help),
        "quit" | "q" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The interactive monitor. Output goes to any writer so it can be tested.
pub struct Monitor<W: Write> {
    machine: Machine,
    out: W,
    delay_us: u64,
    has_run: bool,
}

impl<W: Write> Monitor<W> {
    pub fn new(machine: Machine, delay_us: u64, out: W) -> Self {
        Self {
            machine,
            out,
            delay_us,
            has_run: false,
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "\n(debug) ")?;
        self.out.flush()
    }

    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        match parse_command(line) {
            Ok(cmd) => self.execute(cmd),
            Err(e) => {
                writeln!(self.out, "{e}")?;
                Ok(Flow::Continue)
            }
        }
    }

    pub fn execute(&mut self, cmd: Command) -> io::Result<Flow> {
        match cmd {
            Command::Quit => return Ok(Flow::Quit),
            Command::Run(addr) => {
                let addr = addr.unwrap_or_else(|| self.machine.cpu.pc());
                self.machine.start_at(addr);
                self.has_run = true;
                self.run()?;
            }
            Command::Repeat => {
                if self.has_run {
                    self.step()?;
                }
            }
            Command::Next => {
                if self.has_run {
                    self.step()?;
                } else {
                    writeln!(self.out, "Nothing to step; use run first")?;
                }
            }
            Command::Cont => {
                if self.has_run {
                    self.machine.cpu.halted = false;
                    self.run()?;
                } else {
                    writeln!(self.out, "Nothing to continue; use run first")?;
                }
            }
            Command::Mem(addr) => {
                let addr = addr.unwrap_or_else(|| self.machine.cpu.pc());
                write!(self.out, "{}", display::memory_window(&self.machine.memory, addr))?;
            }
            Command::Regs => writeln!(self.out, "{}", display::registers(&self.machine.cpu))?,
            Command::Delay(None) => writeln!(self.out, "Clock delay: {}", self.delay_us)?,
            Command::Delay(Some(us)) => {
                self.delay_us = us;
                writeln!(self.out, "Clock delay set to {us}")?;
            }
            Command::Load { path, addr } => {
                match program::load_file(&mut self.machine, Path::new(&path), addr) {
                    Ok(n) => writeln!(self.out, "Loaded {n} bytes at {addr:04X}")?,
                    Err(e) => writeln!(self.out, "Cannot load: {e}")?,
                }
            }
            Command::Dump { path, addr, len } => {
                match program::dump_file(&self.machine.memory, Path::new(&path), addr, len) {
                    Ok(n) => writeln!(self.out, "Wrote {n} bytes from {addr:04X} to {path}")?,
                    Err(e) => writeln!(self.out, "Cannot dump: {e}")?,
                }
            }
            Command::Help => writeln!(self.out, "{HELP}")?,
        }
        Ok(Flow::Continue)
    }

    fn step(&mut self) -> io::Result<()> {
        self.machine.step();
        writeln!(self.out, "{}", display::step_line(&self.machine.cpu))
    }

    /// Run until HALT or the budget, tracing every instruction.
    fn run(&mut self) -> io::Result<()> {
        let delay = Duration::from_micros(self.delay_us);
        // A Ctrl-C pressed at the prompt should not end the next run early
        self.machine.stop_handle().clear();
        let out = &mut self.out;
        let mut written = Ok(());
        let status = self.machine.run_observed(|cpu| {
            if written.is_ok() {
                written = writeln!(out, "{}", display::step_line(cpu));
            }
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        });
        written?;

        match status {
            RunStatus::Halted => writeln!(self.out, "HALT at {:04X}", self.machine.cpu.pc())?,
            RunStatus::Stopped => writeln!(self.out, "Stopped at {:04X}", self.machine.cpu.pc())?,
        }
        writeln!(self.out, "{}", display::registers(&self.machine.cpu))
    }
}
