use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use z80emu_core::core::MemoryBus;
use z80emu_core::cpu::z80::{Reg8, Reg16, Z80};

// --- TracingBus: flat 64KB memory with access recording ---

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusOp {
    Read,
    Write,
}

#[derive(Clone, Debug)]
pub struct BusAccess {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
}

pub struct TracingBus {
    pub memory: [u8; 0x10000],
    pub accesses: Vec<BusAccess>,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            accesses: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.memory[addr.wrapping_add(i as u16) as usize] = byte;
        }
    }

    pub fn clear_accesses(&mut self) {
        self.accesses.clear();
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus for TracingBus {
    fn read(&mut self, addr: u16) -> u8 {
        let data = self.memory[addr as usize];
        self.accesses.push(BusAccess {
            addr,
            data,
            op: BusOp::Read,
        });
        data
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
        self.accesses.push(BusAccess {
            addr,
            data,
            op: BusOp::Write,
        });
    }
}

// --- Z80 JSON test vector types (SingleStepTests/z80 format) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z80TestCase {
    pub name: String,
    pub initial: Z80CpuState,
    #[serde(rename = "final")]
    pub final_state: Z80CpuState,
    /// Per-cycle bus activity. Data is null on cycles with no data transfer.
    #[serde(default)]
    pub cycles: Vec<(u16, Option<u8>, String)>,
    #[serde(default)]
    pub ports: Vec<(u16, u8, String)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Z80CpuState {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub h: u8,
    pub l: u8,
    pub i: u8,
    pub r: u8,
    #[serde(default)]
    pub ei: u8,
    #[serde(default)]
    pub wz: u16,
    pub ix: u16,
    pub iy: u16,
    #[serde(rename = "af_")]
    pub af_prime: u16,
    #[serde(rename = "bc_")]
    pub bc_prime: u16,
    #[serde(rename = "de_")]
    pub de_prime: u16,
    #[serde(rename = "hl_")]
    pub hl_prime: u16,
    pub im: u8,
    #[serde(default)]
    pub p: u8,
    #[serde(default)]
    pub q: u8,
    pub iff1: u8,
    pub iff2: u8,
    pub ram: Vec<(u16, u8)>,
}

// --- Loading vector files ---

#[derive(Debug)]
pub enum VectorLoadError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for VectorLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorLoadError::Io(e) => write!(f, "I/O error: {e}"),
            VectorLoadError::Parse(e) => write!(f, "invalid test vector JSON: {e}"),
        }
    }
}

impl std::error::Error for VectorLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VectorLoadError::Io(e) => Some(e),
            VectorLoadError::Parse(e) => Some(e),
        }
    }
}

impl From<io::Error> for VectorLoadError {
    fn from(e: io::Error) -> Self {
        VectorLoadError::Io(e)
    }
}

impl From<serde_json::Error> for VectorLoadError {
    fn from(e: serde_json::Error) -> Self {
        VectorLoadError::Parse(e)
    }
}

/// True for `*.json` and `*.json.gz` files.
pub fn is_vector_file(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    name.ends_with(".json") || name.ends_with(".json.gz")
}

/// Read one vector file, transparently inflating `.gz` files.
pub fn load_vectors(path: &Path) -> Result<Vec<Z80TestCase>, VectorLoadError> {
    let file = BufReader::new(File::open(path)?);
    let gzipped = path.extension().is_some_and(|ext| ext == "gz");
    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(serde_json::from_reader(reader)?)
}

// --- Running and comparing ---

/// Flag bits 3 and 5 are copies of result bits on silicon; this core keeps them.
pub const IGNORED_FLAG_BITS: u8 = 0x28;

/// Vectors this core does not model: port I/O, the single-iteration view of
/// repeating block instructions, and HALT's PC hold.
pub fn is_unsupported(tc: &Z80TestCase) -> bool {
    if !tc.ports.is_empty() {
        return true;
    }
    let bytes: Vec<u8> = tc
        .name
        .split_whitespace()
        .take(2)
        .filter_map(|b| u8::from_str_radix(b, 16).ok())
        .collect();
    match bytes.as_slice() {
        [0x76, ..] | [0xDB, ..] | [0xD3, ..] => true,
        [0xDD | 0xFD, 0x76, ..] => true,
        [0xED, op] => {
            let x = op >> 6;
            let z = op & 0x07;
            // IN/OUT (x=1, z=0/1) and the I/O block family (z=2/3 in the block rows)
            (x == 1 && z <= 1) || (x == 2 && *op >= 0xA0 && (z == 2 || z == 3 || *op >= 0xB0))
        }
        _ => false,
    }
}

pub fn load_initial_state(cpu: &mut Z80, bus: &mut TracingBus, s: &Z80CpuState) {
    cpu.reset();
    let regs = &mut cpu.regs;
    regs.set16(Reg16::AF, u16::from_be_bytes([s.a, s.f]));
    regs.set16(Reg16::BC, u16::from_be_bytes([s.b, s.c]));
    regs.set16(Reg16::DE, u16::from_be_bytes([s.d, s.e]));
    regs.set16(Reg16::HL, u16::from_be_bytes([s.h, s.l]));
    regs.set8(Reg8::I, s.i);
    regs.set8(Reg8::R, s.r);
    regs.set16(Reg16::IX, s.ix);
    regs.set16(Reg16::IY, s.iy);
    regs.set16(Reg16::SP, s.sp);
    regs.set16(Reg16::PC, s.pc);
    regs.set_shadow(Reg16::AF, s.af_prime);
    regs.set_shadow(Reg16::BC, s.bc_prime);
    regs.set_shadow(Reg16::DE, s.de_prime);
    regs.set_shadow(Reg16::HL, s.hl_prime);
    cpu.iff1 = s.iff1 != 0;
    cpu.iff2 = s.iff2 != 0;
    cpu.im = s.im;
    cpu.halted = false;

    for &(addr, val) in &s.ram {
        bus.memory[addr as usize] = val;
    }
}

/// Compare CPU and memory against an expected final state.
/// Returns the first mismatch, formatted against the test name.
pub fn compare_final_state(
    name: &str,
    cpu: &Z80,
    bus: &TracingBus,
    fs: &Z80CpuState,
) -> Option<String> {
    macro_rules! check {
        ($got:expr, $exp:expr, $what:expr) => {
            if $got != $exp {
                return Some(format!(
                    "{}: {} (got 0x{:X} exp 0x{:X})",
                    name, $what, $got as u64, $exp as u64
                ));
            }
        };
    }

    let regs = &cpu.regs;
    let mask = !IGNORED_FLAG_BITS;
    check!(regs.get8(Reg8::A), fs.a, "A");
    check!(regs.get8(Reg8::F) & mask, fs.f & mask, "F");
    check!(regs.get8(Reg8::B), fs.b, "B");
    check!(regs.get8(Reg8::C), fs.c, "C");
    check!(regs.get8(Reg8::D), fs.d, "D");
    check!(regs.get8(Reg8::E), fs.e, "E");
    check!(regs.get8(Reg8::H), fs.h, "H");
    check!(regs.get8(Reg8::L), fs.l, "L");
    check!(regs.get8(Reg8::I), fs.i, "I");
    check!(regs.get8(Reg8::R), fs.r, "R");
    check!(regs.get16(Reg16::IX), fs.ix, "IX");
    check!(regs.get16(Reg16::IY), fs.iy, "IY");
    check!(regs.get16(Reg16::SP), fs.sp, "SP");
    check!(regs.get16(Reg16::PC), fs.pc, "PC");
    check!(cpu.iff1 as u8, (fs.iff1 != 0) as u8, "IFF1");
    check!(cpu.iff2 as u8, (fs.iff2 != 0) as u8, "IFF2");
    check!(cpu.im, fs.im, "IM");

    let af_mask = 0xFF00 | mask as u16;
    check!(regs.get_shadow(Reg16::AF) & af_mask, fs.af_prime & af_mask, "AF'");
    check!(regs.get_shadow(Reg16::BC), fs.bc_prime, "BC'");
    check!(regs.get_shadow(Reg16::DE), fs.de_prime, "DE'");
    check!(regs.get_shadow(Reg16::HL), fs.hl_prime, "HL'");

    for &(addr, expected) in &fs.ram {
        let got = bus.memory[addr as usize];
        if got != expected {
            return Some(format!(
                "{}: RAM[0x{:04X}] (got 0x{:02X} exp 0x{:02X})",
                name, addr, got, expected
            ));
        }
    }

    None
}

/// Execute one vector. `None` on pass.
pub fn run_test_case(tc: &Z80TestCase) -> Option<String> {
    let mut cpu = Z80::new();
    let mut bus = TracingBus::new();
    load_initial_state(&mut cpu, &mut bus, &tc.initial);
    cpu.step(&mut bus);
    compare_final_state(&tc.name, &cpu, &bus, &tc.final_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(name: &str) -> Z80TestCase {
        Z80TestCase {
            name: name.to_string(),
            initial: Z80CpuState::default(),
            final_state: Z80CpuState::default(),
            cycles: Vec::new(),
            ports: Vec::new(),
        }
    }

    #[test]
    fn parses_single_step_format() {
        let json = r#"[{
            "name": "3c 0000",
            "initial": {"pc": 0, "sp": 0, "a": 1, "b": 0, "c": 0, "d": 0, "e": 0,
                "f": 0, "h": 0, "l": 0, "i": 0, "r": 0, "ei": 0, "wz": 0,
                "ix": 0, "iy": 0, "af_": 0, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 0, "p": 0, "q": 0, "iff1": 0, "iff2": 0, "ram": [[0, 60]]},
            "final": {"pc": 1, "sp": 0, "a": 2, "b": 0, "c": 0, "d": 0, "e": 0,
                "f": 0, "h": 0, "l": 0, "i": 0, "r": 1, "ei": 0, "wz": 0,
                "ix": 0, "iy": 0, "af_": 0, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 0, "p": 0, "q": 0, "iff1": 0, "iff2": 0, "ram": [[0, 60]]},
            "cycles": [[0, 60, "r--m"], [1, null, "----"]]
        }]"#;
        let tests: Vec<Z80TestCase> = serde_json::from_str(json).unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].cycles[1].1, None);
        assert_eq!(run_test_case(&tests[0]), None);
    }

    #[test]
    fn ignores_undefined_flag_bits() {
        let mut tc = vector("00");
        tc.initial.ram = vec![(0, 0x00)];
        tc.initial.f = 0x28;
        tc.final_state.pc = 1;
        tc.final_state.r = 1;
        tc.final_state.f = 0x00;
        assert_eq!(run_test_case(&tc), None);
    }

    #[test]
    fn reports_register_mismatch() {
        let mut tc = vector("00");
        tc.initial.ram = vec![(0, 0x00)];
        tc.final_state.pc = 1;
        tc.final_state.r = 1;
        tc.final_state.b = 9;
        let err = run_test_case(&tc).unwrap();
        assert!(err.contains("B (got 0x0 exp 0x9)"), "{err}");
    }

    #[test]
    fn unsupported_vectors() {
        assert!(is_unsupported(&vector("76")));
        assert!(is_unsupported(&vector("db 12")));
        assert!(is_unsupported(&vector("ed 78")));
        assert!(is_unsupported(&vector("ed b0")));
        assert!(is_unsupported(&vector("ed a2")));
        assert!(!is_unsupported(&vector("ed a0")));
        assert!(!is_unsupported(&vector("ed 44")));
        assert!(!is_unsupported(&vector("3c")));
    }

    #[test]
    fn tracing_bus_records_accesses() {
        let mut bus = TracingBus::new();
        bus.write(0x10, 0xAA);
        assert_eq!(bus.read(0x10), 0xAA);
        assert_eq!(bus.accesses.len(), 2);
        assert_eq!(bus.accesses[0].op, BusOp::Write);
        assert_eq!(bus.accesses[1].op, BusOp::Read);
    }
}
