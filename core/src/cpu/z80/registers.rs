//! Z80 register file.
//!
//! Each register pair is a single `u16`; the 8-bit halves are views produced
//! by masked shifts (high byte = bits 8-15, low byte = bits 0-7). Writing a
//! pair is therefore always visible through its halves and vice versa.

use crate::cpu::z80::flags::Flag;

/// 16-bit register slots, in storage order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg16 {
    AF = 0,
    BC,
    DE,
    HL,
    /// I in the high byte, R in the low byte.
    IR,
    IX,
    IY,
    SP,
    PC,
}

/// 8-bit halves of the register pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg8 {
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
    I,
    R,
    IXH,
    IXL,
    IYH,
    IYL,
}

impl Reg8 {
    /// Owning pair and whether this is the high half.
    pub const fn slot(self) -> (Reg16, bool) {
        match self {
            Reg8::A => (Reg16::AF, true),
            Reg8::F => (Reg16::AF, false),
            Reg8::B => (Reg16::BC, true),
            Reg8::C => (Reg16::BC, false),
            Reg8::D => (Reg16::DE, true),
            Reg8::E => (Reg16::DE, false),
            Reg8::H => (Reg16::HL, true),
            Reg8::L => (Reg16::HL, false),
            Reg8::I => (Reg16::IR, true),
            Reg8::R => (Reg16::IR, false),
            Reg8::IXH => (Reg16::IX, true),
            Reg8::IXL => (Reg16::IX, false),
            Reg8::IYH => (Reg16::IY, true),
            Reg8::IYL => (Reg16::IY, false),
        }
    }

    /// Decode the 3-bit `r` field of an opcode.
    /// Returns `None` for 6, which selects the byte at (HL) rather than a register.
    pub const fn from_index(index: u8) -> Option<Reg8> {
        match index & 0x07 {
            0 => Some(Reg8::B),
            1 => Some(Reg8::C),
            2 => Some(Reg8::D),
            3 => Some(Reg8::E),
            4 => Some(Reg8::H),
            5 => Some(Reg8::L),
            7 => Some(Reg8::A),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Reg8::A => "A",
            Reg8::F => "F",
            Reg8::B => "B",
            Reg8::C => "C",
            Reg8::D => "D",
            Reg8::E => "E",
            Reg8::H => "H",
            Reg8::L => "L",
            Reg8::I => "I",
            Reg8::R => "R",
            Reg8::IXH => "IXH",
            Reg8::IXL => "IXL",
            Reg8::IYH => "IYH",
            Reg8::IYL => "IYL",
        }
    }
}

impl Reg16 {
    /// Decode the 2-bit `rp` field (BC, DE, HL, SP).
    pub const fn from_rp(index: u8) -> Reg16 {
        match index & 0x03 {
            0 => Reg16::BC,
            1 => Reg16::DE,
            2 => Reg16::HL,
            _ => Reg16::SP,
        }
    }

    /// Decode the 2-bit `rp2` field used by PUSH/POP (BC, DE, HL, AF).
    pub const fn from_rp2(index: u8) -> Reg16 {
        match index & 0x03 {
            0 => Reg16::BC,
            1 => Reg16::DE,
            2 => Reg16::HL,
            _ => Reg16::AF,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Reg16::AF => "AF",
            Reg16::BC => "BC",
            Reg16::DE => "DE",
            Reg16::HL => "HL",
            Reg16::IR => "IR",
            Reg16::IX => "IX",
            Reg16::IY => "IY",
            Reg16::SP => "SP",
            Reg16::PC => "PC",
        }
    }

    /// Position in the shadow bank, for pairs that have one.
    const fn shadow_index(self) -> Option<usize> {
        match self {
            Reg16::AF => Some(0),
            Reg16::BC => Some(1),
            Reg16::DE => Some(2),
            Reg16::HL => Some(3),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    main: [u16; 9],
    /// AF', BC', DE', HL'
    shadow: [u16; 4],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            main: [0; 9],
            shadow: [0; 4],
        }
    }

    pub fn get16(&self, reg: Reg16) -> u16 {
        self.main[reg as usize]
    }

    pub fn set16(&mut self, reg: Reg16, val: u16) {
        self.main[reg as usize] = val;
    }

    pub fn get8(&self, reg: Reg8) -> u8 {
        let (pair, high) = reg.slot();
        let word = self.get16(pair);
        if high { (word >> 8) as u8 } else { word as u8 }
    }

    pub fn set8(&mut self, reg: Reg8, val: u8) {
        let (pair, high) = reg.slot();
        let word = self.get16(pair);
        let word = if high {
            (word & 0x00FF) | ((val as u16) << 8)
        } else {
            (word & 0xFF00) | val as u16
        };
        self.set16(pair, word);
    }

    /// Wrapping increment; returns the new value.
    pub fn inc16(&mut self, reg: Reg16) -> u16 {
        let val = self.get16(reg).wrapping_add(1);
        self.set16(reg, val);
        val
    }

    /// Wrapping decrement; returns the new value.
    pub fn dec16(&mut self, reg: Reg16) -> u16 {
        let val = self.get16(reg).wrapping_sub(1);
        self.set16(reg, val);
        val
    }

    /// Shadow copy of AF/BC/DE/HL. Other pairs have no shadow and read as 0.
    pub fn get_shadow(&self, reg: Reg16) -> u16 {
        reg.shadow_index().map_or(0, |i| self.shadow[i])
    }

    pub fn set_shadow(&mut self, reg: Reg16, val: u16) {
        if let Some(i) = reg.shadow_index() {
            self.shadow[i] = val;
        }
    }

    // --- Flags ---

    pub fn flags(&self) -> u8 {
        self.get8(Reg8::F)
    }

    pub fn set_flags(&mut self, f: u8) {
        self.set8(Reg8::F, f);
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.flags() & flag as u8 != 0
    }

    pub fn set_flag(&mut self, flag: Flag) {
        self.set_flags(self.flags() | flag as u8);
    }

    pub fn unset_flag(&mut self, flag: Flag) {
        self.set_flags(self.flags() & !(flag as u8));
    }

    pub fn assign_flag(&mut self, flag: Flag, on: bool) {
        if on {
            self.set_flag(flag);
        } else {
            self.unset_flag(flag);
        }
    }

    // --- Exchanges ---

    /// EX AF,AF'
    pub fn ex_af(&mut self) {
        std::mem::swap(&mut self.main[Reg16::AF as usize], &mut self.shadow[0]);
    }

    /// EXX: swap BC, DE and HL with their shadows.
    pub fn exx(&mut self) {
        for (i, reg) in [Reg16::BC, Reg16::DE, Reg16::HL].into_iter().enumerate() {
            std::mem::swap(&mut self.main[reg as usize], &mut self.shadow[i + 1]);
        }
    }

    /// EX DE,HL
    pub fn ex_de_hl(&mut self) {
        self.main.swap(Reg16::DE as usize, Reg16::HL as usize);
    }

    /// Advance the 7-bit memory refresh counter. Bit 7 of R is left alone.
    pub fn refresh(&mut self) {
        let r = self.get8(Reg8::R);
        self.set8(Reg8::R, (r & 0x80) | (r.wrapping_add(1) & 0x7F));
    }
}
