//! Opcode classification.
//!
//! A key is the opcode byte, with a preceding CB/ED/DD/FD prefix folded into
//! the high byte (`0xDD46` is `LD B,(IX+d)`). Each page is a dense 256-entry
//! table computed at compile time; building a page panics during const
//! evaluation if one opcode is assigned twice, so conflicting entries are a
//! build error rather than a silent override.
//!
//! The tag is deliberately coarse. Executors re-derive registers, condition
//! codes and directions from the opcode bits.

/// The eight accumulator operations, in opcode order (bits 3-5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    pub const fn from_bits(y: u8) -> AluOp {
        match y & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbc,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Adc => "ADC",
            AluOp::Sub => "SUB",
            AluOp::Sbc => "SBC",
            AluOp::And => "AND",
            AluOp::Xor => "XOR",
            AluOp::Or => "OR",
            AluOp::Cp => "CP",
        }
    }
}

/// Where the second operand of an accumulator operation comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    /// Register from bits 0-2 (IXH/IXL/IYH/IYL under an index prefix).
    Reg,
    /// Immediate byte.
    Imm,
    /// Byte at (HL).
    Hl,
    /// Byte at (IX+d) / (IY+d).
    Idx,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstructionGroup {
    Nop,
    Halt,

    // 8-bit loads
    LoadRR,
    LoadRN,
    LoadRHl,
    LoadRIdx,
    LoadHlR,
    LoadHlN,
    LoadIdxR,
    LoadIdxN,
    LoadAMem,
    LoadMemA,
    LoadAIndirect,
    LoadIndirectA,
    LoadAI,
    LoadAR,
    LoadIA,
    LoadRA,

    // 16-bit loads
    LoadRrNn,
    LoadRrMem,
    LoadMemRr,
    LoadSpRr,
    Push,
    Pop,
    Exchange,
    Exx,

    // 8-bit arithmetic and logic
    Alu(AluOp, Source),
    IncR,
    IncHl,
    IncIdx,
    DecR,
    DecHl,
    DecIdx,

    // 16-bit arithmetic
    AddHlRr,
    AdcHlRr,
    SbcHlRr,
    IncRr,
    DecRr,

    // Accumulator and flag operations
    RotateA,
    RotateDigit,
    Daa,
    Cpl,
    Neg,
    Ccf,
    Scf,

    // Control transfer
    Jp,
    JpIndirect,
    Jr,
    Djnz,
    Call,
    Ret,
    RetInterrupt,
    Rst,
    Di,
    Ei,
    Im,

    // Block operations
    BlockTransfer,
    BlockSearch,

    // CB page
    RotateShift,
    BitTest,
    BitReset,
    BitSet,

    // Prefix markers
    BitPrefix,
    IndexPrefix,
    ExtendedPrefix,
    IndexedBitPrefix,

    // Port I/O is decoded so operand bytes are consumed, but not emulated.
    PortIo,
    PortIoImm,

    Undefined,
}

/// Trailing bytes an instruction consumes after its opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandShape {
    None,
    /// Immediate byte.
    Byte,
    /// Little-endian 16-bit immediate or address.
    Word,
    /// Signed 8-bit displacement (index offset or relative jump).
    Displacement,
    /// Index displacement followed by an immediate byte.
    DisplacedByte,
}

impl InstructionGroup {
    pub const fn operand_shape(self) -> OperandShape {
        use InstructionGroup::*;
        match self {
            LoadRN | LoadHlN | PortIoImm | Alu(_, Source::Imm) => OperandShape::Byte,
            LoadAMem | LoadMemA | LoadRrNn | LoadRrMem | LoadMemRr | Jp | Call => {
                OperandShape::Word
            }
            LoadRIdx | LoadIdxR | IncIdx | DecIdx | Jr | Djnz | Alu(_, Source::Idx) => {
                OperandShape::Displacement
            }
            LoadIdxN => OperandShape::DisplacedByte,
            _ => OperandShape::None,
        }
    }

    /// Generic assembler form of the group, e.g. `LD r,(IX+d)`.
    pub const fn label(self) -> &'static str {
        use InstructionGroup::*;
        match self {
            Nop => "NOP",
            Halt => "HALT",
            LoadRR => "LD r,r'",
            LoadRN => "LD r,n",
            LoadRHl => "LD r,(HL)",
            LoadRIdx => "LD r,(IX+d)",
            LoadHlR => "LD (HL),r",
            LoadHlN => "LD (HL),n",
            LoadIdxR => "LD (IX+d),r",
            LoadIdxN => "LD (IX+d),n",
            LoadAMem => "LD A,(nn)",
            LoadMemA => "LD (nn),A",
            LoadAIndirect => "LD A,(rr)",
            LoadIndirectA => "LD (rr),A",
            LoadAI => "LD A,I",
            LoadAR => "LD A,R",
            LoadIA => "LD I,A",
            LoadRA => "LD R,A",
            LoadRrNn => "LD rr,nn",
            LoadRrMem => "LD rr,(nn)",
            LoadMemRr => "LD (nn),rr",
            LoadSpRr => "LD SP,HL",
            Push => "PUSH rr",
            Pop => "POP rr",
            Exchange => "EX",
            Exx => "EXX",
            Alu(op, src) => alu_label(op, src),
            IncR => "INC r",
            IncHl => "INC (HL)",
            IncIdx => "INC (IX+d)",
            DecR => "DEC r",
            DecHl => "DEC (HL)",
            DecIdx => "DEC (IX+d)",
            AddHlRr => "ADD HL,rr",
            AdcHlRr => "ADC HL,rr",
            SbcHlRr => "SBC HL,rr",
            IncRr => "INC rr",
            DecRr => "DEC rr",
            RotateA => "RLCA/RRCA/RLA/RRA",
            RotateDigit => "RLD/RRD",
            Daa => "DAA",
            Cpl => "CPL",
            Neg => "NEG",
            Ccf => "CCF",
            Scf => "SCF",
            Jp => "JP cc,nn",
            JpIndirect => "JP (HL)",
            Jr => "JR cc,e",
            Djnz => "DJNZ e",
            Call => "CALL cc,nn",
            Ret => "RET cc",
            RetInterrupt => "RETN/RETI",
            Rst => "RST p",
            Di => "DI",
            Ei => "EI",
            Im => "IM m",
            BlockTransfer => "LDI/LDD/LDIR/LDDR",
            BlockSearch => "CPI/CPD/CPIR/CPDR",
            RotateShift => "rot r",
            BitTest => "BIT b,r",
            BitReset => "RES b,r",
            BitSet => "SET b,r",
            BitPrefix => "CB prefix",
            IndexPrefix => "DD/FD prefix",
            ExtendedPrefix => "ED prefix",
            IndexedBitPrefix => "DDCB/FDCB prefix",
            PortIo => "IN/OUT (C)",
            PortIoImm => "IN/OUT (n)",
            Undefined => "UNDEFINED",
        }
    }
}

const fn alu_label(op: AluOp, src: Source) -> &'static str {
    match (op, src) {
        (AluOp::Add, Source::Reg) => "ADD A,r",
        (AluOp::Add, Source::Imm) => "ADD A,n",
        (AluOp::Add, Source::Hl) => "ADD A,(HL)",
        (AluOp::Add, Source::Idx) => "ADD A,(IX+d)",
        (AluOp::Adc, Source::Reg) => "ADC A,r",
        (AluOp::Adc, Source::Imm) => "ADC A,n",
        (AluOp::Adc, Source::Hl) => "ADC A,(HL)",
        (AluOp::Adc, Source::Idx) => "ADC A,(IX+d)",
        (AluOp::Sub, Source::Reg) => "SUB r",
        (AluOp::Sub, Source::Imm) => "SUB n",
        (AluOp::Sub, Source::Hl) => "SUB (HL)",
        (AluOp::Sub, Source::Idx) => "SUB (IX+d)",
        (AluOp::Sbc, Source::Reg) => "SBC A,r",
        (AluOp::Sbc, Source::Imm) => "SBC A,n",
        (AluOp::Sbc, Source::Hl) => "SBC A,(HL)",
        (AluOp::Sbc, Source::Idx) => "SBC A,(IX+d)",
        (AluOp::And, Source::Reg) => "AND r",
        (AluOp::And, Source::Imm) => "AND n",
        (AluOp::And, Source::Hl) => "AND (HL)",
        (AluOp::And, Source::Idx) => "AND (IX+d)",
        (AluOp::Xor, Source::Reg) => "XOR r",
        (AluOp::Xor, Source::Imm) => "XOR n",
        (AluOp::Xor, Source::Hl) => "XOR (HL)",
        (AluOp::Xor, Source::Idx) => "XOR (IX+d)",
        (AluOp::Or, Source::Reg) => "OR r",
        (AluOp::Or, Source::Imm) => "OR n",
        (AluOp::Or, Source::Hl) => "OR (HL)",
        (AluOp::Or, Source::Idx) => "OR (IX+d)",
        (AluOp::Cp, Source::Reg) => "CP r",
        (AluOp::Cp, Source::Imm) => "CP n",
        (AluOp::Cp, Source::Hl) => "CP (HL)",
        (AluOp::Cp, Source::Idx) => "CP (IX+d)",
    }
}

struct Page {
    slots: [InstructionGroup; 256],
}

impl Page {
    const fn new() -> Self {
        Self {
            slots: [InstructionGroup::Undefined; 256],
        }
    }

    const fn set(mut self, op: u8, group: InstructionGroup) -> Self {
        if !matches!(self.slots[op as usize], InstructionGroup::Undefined) {
            panic!("opcode assigned twice while building a classification page");
        }
        self.slots[op as usize] = group;
        self
    }
}

const fn base_page() -> [InstructionGroup; 256] {
    use InstructionGroup::*;
    let mut page = Page::new();
    let mut i = 0;
    while i < 256 {
        let op = i as u8;
        let x = op >> 6;
        let y = (op >> 3) & 7;
        let z = op & 7;
        let p = y >> 1;
        let q = y & 1;
        let group = match x {
            0 => match z {
                0 => match y {
                    0 => Nop,
                    1 => Exchange,
                    2 => Djnz,
                    _ => Jr,
                },
                1 => if q == 0 { LoadRrNn } else { AddHlRr },
                2 => match (p, q) {
                    (0 | 1, 0) => LoadIndirectA,
                    (0 | 1, _) => LoadAIndirect,
                    (2, 0) => LoadMemRr,
                    (2, _) => LoadRrMem,
                    (_, 0) => LoadMemA,
                    _ => LoadAMem,
                },
                3 => if q == 0 { IncRr } else { DecRr },
                4 => if y == 6 { IncHl } else { IncR },
                5 => if y == 6 { DecHl } else { DecR },
                6 => if y == 6 { LoadHlN } else { LoadRN },
                _ => match y {
                    0..=3 => RotateA,
                    4 => Daa,
                    5 => Cpl,
                    6 => Scf,
                    _ => Ccf,
                },
            },
            1 => {
                if y == 6 && z == 6 {
                    Halt
                } else if z == 6 {
                    LoadRHl
                } else if y == 6 {
                    LoadHlR
                } else {
                    LoadRR
                }
            }
            2 => Alu(AluOp::from_bits(y), if z == 6 { Source::Hl } else { Source::Reg }),
            _ => match z {
                0 => Ret,
                1 => match (q, p) {
                    (0, _) => Pop,
                    (_, 0) => Ret,
                    (_, 1) => Exx,
                    (_, 2) => JpIndirect,
                    _ => LoadSpRr,
                },
                2 => Jp,
                3 => match y {
                    0 => Jp,
                    1 => BitPrefix,
                    2 | 3 => PortIoImm,
                    4 | 5 => Exchange,
                    6 => Di,
                    _ => Ei,
                },
                4 => Call,
                5 => match (q, p) {
                    (0, _) => Push,
                    (_, 0) => Call,
                    (_, 2) => ExtendedPrefix,
                    _ => IndexPrefix,
                },
                6 => Alu(AluOp::from_bits(y), Source::Imm),
                _ => Rst,
            },
        };
        page = page.set(op, group);
        i += 1;
    }
    page.slots
}

const fn bit_page() -> [InstructionGroup; 256] {
    use InstructionGroup::*;
    let mut page = Page::new();
    let mut i = 0;
    while i < 256 {
        let op = i as u8;
        let group = match op >> 6 {
            0 => RotateShift,
            1 => BitTest,
            2 => BitReset,
            _ => BitSet,
        };
        page = page.set(op, group);
        i += 1;
    }
    page.slots
}

const fn extended_page() -> [InstructionGroup; 256] {
    use InstructionGroup::*;
    let mut page = Page::new();

    // 0x40-0x7F
    let mut i = 0x40;
    while i < 0x80 {
        let op = i as u8;
        let y = (op >> 3) & 7;
        let z = op & 7;
        let q = y & 1;
        let group = match z {
            0 | 1 => PortIo,
            2 => if q == 0 { SbcHlRr } else { AdcHlRr },
            3 => if q == 0 { LoadMemRr } else { LoadRrMem },
            4 => Neg,
            5 => RetInterrupt,
            6 => Im,
            _ => match y {
                0 => LoadIA,
                1 => LoadRA,
                2 => LoadAI,
                3 => LoadAR,
                4 | 5 => RotateDigit,
                _ => Nop,
            },
        };
        page = page.set(op, group);
        i += 1;
    }

    // Block instructions: 0xA0-0xA3, 0xA8-0xAB, 0xB0-0xB3, 0xB8-0xBB
    let mut y = 4;
    while y < 8 {
        let mut z = 0;
        while z < 4 {
            let op = 0x80 | (y << 3) | z;
            let group = match z {
                0 => BlockTransfer,
                1 => BlockSearch,
                _ => PortIo,
            };
            page = page.set(op, group);
            z += 1;
        }
        y += 1;
    }
    page.slots
}

/// Shared by DD and FD. Anything left `Undefined` here runs as the
/// unprefixed opcode.
const fn index_page() -> [InstructionGroup; 256] {
    use InstructionGroup::*;
    let mut page = Page::new()
        .set(0x09, AddHlRr)
        .set(0x19, AddHlRr)
        .set(0x29, AddHlRr)
        .set(0x39, AddHlRr)
        .set(0x21, LoadRrNn)
        .set(0x22, LoadMemRr)
        .set(0x2A, LoadRrMem)
        .set(0x23, IncRr)
        .set(0x2B, DecRr)
        .set(0x24, IncR)
        .set(0x2C, IncR)
        .set(0x25, DecR)
        .set(0x2D, DecR)
        .set(0x26, LoadRN)
        .set(0x2E, LoadRN)
        .set(0x34, IncIdx)
        .set(0x35, DecIdx)
        .set(0x36, LoadIdxN)
        .set(0xCB, IndexedBitPrefix)
        .set(0xE1, Pop)
        .set(0xE3, Exchange)
        .set(0xE5, Push)
        .set(0xE9, JpIndirect)
        .set(0xF9, LoadSpRr);

    // LD r,r' block: (IX+d) forms plus the undocumented IXH/IXL forms
    let mut i = 0x40;
    while i < 0x80 {
        let op = i as u8;
        let y = (op >> 3) & 7;
        let z = op & 7;
        let touches_half = y == 4 || y == 5 || z == 4 || z == 5;
        if y == 6 && z == 6 {
            // HALT
        } else if z == 6 {
            page = page.set(op, LoadRIdx);
        } else if y == 6 {
            page = page.set(op, LoadIdxR);
        } else if touches_half {
            page = page.set(op, LoadRR);
        }
        i += 1;
    }

    // ALU block
    let mut i = 0x80;
    while i < 0xC0 {
        let op = i as u8;
        let y = (op >> 3) & 7;
        let z = op & 7;
        if z == 6 {
            page = page.set(op, Alu(AluOp::from_bits(y), Source::Idx));
        } else if z == 4 || z == 5 {
            page = page.set(op, Alu(AluOp::from_bits(y), Source::Reg));
        }
        i += 1;
    }
    page.slots
}

static BASE_PAGE: [InstructionGroup; 256] = base_page();
static BIT_PAGE: [InstructionGroup; 256] = bit_page();
static EXTENDED_PAGE: [InstructionGroup; 256] = extended_page();
static INDEX_PAGE: [InstructionGroup; 256] = index_page();

/// Map a (possibly prefixed) opcode key to its instruction group.
///
/// Total over every `u16`: keys whose high byte is not 0x00, 0xCB, 0xED,
/// 0xDD or 0xFD, and unassigned slots within a page, are `Undefined`.
pub fn classify(key: u16) -> InstructionGroup {
    let op = (key & 0xFF) as usize;
    match key >> 8 {
        0x00 => BASE_PAGE[op],
        0xCB => BIT_PAGE[op],
        0xED => EXTENDED_PAGE[op],
        0xDD | 0xFD => INDEX_PAGE[op],
        _ => InstructionGroup::Undefined,
    }
}

/// Disassembly label for a key.
pub fn label(key: u16) -> &'static str {
    classify(key).label()
}
