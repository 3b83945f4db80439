//! Record of the last executed instruction.
//!
//! The executor only stores typed data here. Turning it into text is left to
//! the `Display` impl, so nothing is formatted unless someone asks.

use std::fmt;

use crate::cpu::z80::{IndexMode, InstructionGroup, disasm};

/// Trailing operand bytes, as fetched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Operands {
    #[default]
    None,
    Byte(u8),
    Word(u16),
    Disp(i8),
    DispByte(i8, u8),
}

impl Operands {
    pub fn byte(self) -> u8 {
        match self {
            Operands::Byte(n) | Operands::DispByte(_, n) => n,
            _ => 0,
        }
    }

    pub fn word(self) -> u16 {
        match self {
            Operands::Word(nn) => nn,
            _ => 0,
        }
    }

    pub fn disp(self) -> i8 {
        match self {
            Operands::Disp(d) | Operands::DispByte(d, _) => d,
            _ => 0,
        }
    }
}

/// Opcode page an instruction was decoded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Base,
    /// CB xx
    Bit,
    /// ED xx
    Extended,
    /// DD xx / FD xx
    Index(IndexMode),
    /// DD CB d xx / FD CB d xx
    IndexBit(IndexMode),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Executed {
    /// Address of the first byte, prefixes included.
    pub pc: u16,
    /// Bytes consumed.
    pub len: u8,
    pub page: Page,
    /// Final opcode byte (after any prefixes).
    pub opcode: u8,
    pub group: InstructionGroup,
    pub operands: Operands,
}

impl Executed {
    /// Address of the instruction that follows in memory.
    pub fn next_pc(&self) -> u16 {
        self.pc.wrapping_add(self.len as u16)
    }

    /// Assembler text, e.g. `LD A,(IX+$05)`.
    pub fn mnemonic(&self) -> String {
        disasm::mnemonic(self)
    }
}

impl fmt::Display for Executed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mnemonic())
    }
}

/// Side channel for debuggers: what the last `step` did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    pub last: Option<Executed>,
    /// Most recent data read (instruction fetches excluded), if any.
    pub last_read: Option<u16>,
    /// Most recent memory write, if any.
    pub last_write: Option<u16>,
}
