//! Mnemonic rendering for executed instructions.
//!
//! Works from the decoded opcode fields rather than a string table, so the
//! output always agrees with what the executor did.

use crate::cpu::z80::{Executed, IndexMode, InstructionGroup, Operands, Page};

const CC: [&str; 8] = ["NZ", "Z", "NC", "C", "PO", "PE", "P", "M"];
const ALU: [&str; 8] = ["ADD A,", "ADC A,", "SUB ", "SBC A,", "AND ", "XOR ", "OR ", "CP "];
const ROT: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SLL", "SRL"];
const REG: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];

/// Formatting context: which register replaces HL, and the displacement.
struct Ctx {
    index: IndexMode,
    disp: i8,
}

impl Ctx {
    fn hl(&self) -> &'static str {
        match self.index {
            IndexMode::HL => "HL",
            IndexMode::IX => "IX",
            IndexMode::IY => "IY",
        }
    }

    /// `(HL)` or `(IX+$dd)`.
    fn mem(&self) -> String {
        match self.index {
            IndexMode::HL => "(HL)".to_string(),
            _ => {
                let sign = if self.disp < 0 { '-' } else { '+' };
                format!("({}{}${:02X})", self.hl(), sign, self.disp.unsigned_abs())
            }
        }
    }

    /// 8-bit register name. `half` enables IXH/IXL substitution for H/L.
    fn r(&self, i: u8, half: bool) -> String {
        match (i & 7, half, self.index) {
            (6, _, _) => self.mem(),
            (4, true, IndexMode::IX) => "IXH".to_string(),
            (5, true, IndexMode::IX) => "IXL".to_string(),
            (4, true, IndexMode::IY) => "IYH".to_string(),
            (5, true, IndexMode::IY) => "IYL".to_string(),
            (i, _, _) => REG[i as usize].to_string(),
        }
    }

    fn rp(&self, p: u8) -> &'static str {
        match p & 3 {
            0 => "BC",
            1 => "DE",
            2 => self.hl(),
            _ => "SP",
        }
    }

    fn rp2(&self, p: u8) -> &'static str {
        match p & 3 {
            3 => "AF",
            p => self.rp(p),
        }
    }
}

pub(crate) fn mnemonic(e: &Executed) -> String {
    if e.group == InstructionGroup::Undefined {
        return match e.page {
            Page::Extended => format!("UNDEFINED (ED {:02X})", e.opcode),
            _ => format!("UNDEFINED ({:02X})", e.opcode),
        };
    }
    match e.page {
        Page::Base => base(e, &Ctx { index: IndexMode::HL, disp: 0 }),
        Page::Index(index) => base(e, &Ctx { index, disp: e.operands.disp() }),
        Page::Bit => bit(e.opcode, &Ctx { index: IndexMode::HL, disp: 0 }),
        Page::IndexBit(index) => bit(e.opcode, &Ctx { index, disp: e.operands.disp() }),
        Page::Extended => extended(e),
    }
}

fn base(e: &Executed, ctx: &Ctx) -> String {
    let op = e.opcode;
    let x = op >> 6;
    let y = (op >> 3) & 7;
    let z = op & 7;
    let p = y >> 1;
    let q = y & 1;
    let n = format!("${:02X}", e.operands.byte());
    let nn = format!("${:04X}", e.operands.word());
    let target = format!("${:04X}", e.next_pc().wrapping_add(e.operands.disp() as i16 as u16));
    let hl = ctx.hl();

    match x {
        0 => match z {
            0 => match y {
                0 => "NOP".to_string(),
                1 => "EX AF,AF'".to_string(),
                2 => format!("DJNZ {target}"),
                3 => format!("JR {target}"),
                _ => format!("JR {},{target}", CC[(y - 4) as usize]),
            },
            1 if q == 0 => format!("LD {},{nn}", ctx.rp(p)),
            1 => format!("ADD {hl},{}", ctx.rp(p)),
            2 => match (p, q) {
                (0, 0) => "LD (BC),A".to_string(),
                (1, 0) => "LD (DE),A".to_string(),
                (2, 0) => format!("LD ({nn}),{hl}"),
                (3, 0) => format!("LD ({nn}),A"),
                (0, _) => "LD A,(BC)".to_string(),
                (1, _) => "LD A,(DE)".to_string(),
                (2, _) => format!("LD {hl},({nn})"),
                _ => format!("LD A,({nn})"),
            },
            3 if q == 0 => format!("INC {}", ctx.rp(p)),
            3 => format!("DEC {}", ctx.rp(p)),
            4 => format!("INC {}", ctx.r(y, true)),
            5 => format!("DEC {}", ctx.r(y, true)),
            6 => format!("LD {},{n}", ctx.r(y, true)),
            _ => ["RLCA", "RRCA", "RLA", "RRA", "DAA", "CPL", "SCF", "CCF"][y as usize].to_string(),
        },
        1 if y == 6 && z == 6 => "HALT".to_string(),
        1 => {
            // With a memory operand the other side is a plain register
            let half = y != 6 && z != 6;
            format!("LD {},{}", ctx.r(y, half), ctx.r(z, half))
        }
        2 => format!("{}{}", ALU[y as usize], ctx.r(z, true)),
        _ => match z {
            0 => format!("RET {}", CC[y as usize]),
            1 => match (q, p) {
                (0, _) => format!("POP {}", ctx.rp2(p)),
                (_, 0) => "RET".to_string(),
                (_, 1) => "EXX".to_string(),
                (_, 2) => format!("JP ({hl})"),
                _ => format!("LD SP,{hl}"),
            },
            2 => format!("JP {},{nn}", CC[y as usize]),
            3 => match y {
                0 => format!("JP {nn}"),
                1 => "PREFIX CB".to_string(),
                2 => format!("OUT ({n}),A"),
                3 => format!("IN A,({n})"),
                4 => format!("EX (SP),{hl}"),
                5 => "EX DE,HL".to_string(),
                6 => "DI".to_string(),
                _ => "EI".to_string(),
            },
            4 => format!("CALL {},{nn}", CC[y as usize]),
            5 => match (q, p) {
                (0, _) => format!("PUSH {}", ctx.rp2(p)),
                (_, 0) => format!("CALL {nn}"),
                (_, 1) => "PREFIX DD".to_string(),
                (_, 2) => "PREFIX ED".to_string(),
                _ => "PREFIX FD".to_string(),
            },
            6 => format!("{}{n}", ALU[y as usize]),
            _ => format!("RST ${:02X}", y * 8),
        },
    }
}

fn bit(op: u8, ctx: &Ctx) -> String {
    let x = op >> 6;
    let y = (op >> 3) & 7;
    let z = op & 7;
    let operand = if ctx.index == IndexMode::HL {
        ctx.r(z, false)
    } else {
        ctx.r(6, false)
    };
    let text = match x {
        0 => format!("{} {operand}", ROT[y as usize]),
        1 => format!("BIT {y},{operand}"),
        2 => format!("RES {y},{operand}"),
        _ => format!("SET {y},{operand}"),
    };
    // Indexed forms with z != 6 also copy the result into a register
    if ctx.index != IndexMode::HL && x != 1 && z != 6 {
        format!("{text},{}", REG[z as usize])
    } else {
        text
    }
}

fn extended(e: &Executed) -> String {
    let op = e.opcode;
    let x = op >> 6;
    let y = (op >> 3) & 7;
    let z = op & 7;
    let p = y >> 1;
    let q = y & 1;
    let ctx = Ctx { index: IndexMode::HL, disp: 0 };
    let nn = match e.operands {
        Operands::Word(nn) => format!("${nn:04X}"),
        _ => String::new(),
    };

    if x == 2 {
        const BLOCK: [[&str; 4]; 4] = [
            ["LDI", "CPI", "INI", "OUTI"],
            ["LDD", "CPD", "IND", "OUTD"],
            ["LDIR", "CPIR", "INIR", "OTIR"],
            ["LDDR", "CPDR", "INDR", "OTDR"],
        ];
        return BLOCK[(y - 4) as usize][z as usize].to_string();
    }

    match z {
        0 if y == 6 => "IN (C)".to_string(),
        0 => format!("IN {},(C)", REG[y as usize]),
        1 if y == 6 => "OUT (C),0".to_string(),
        1 => format!("OUT (C),{}", REG[y as usize]),
        2 if q == 0 => format!("SBC HL,{}", ctx.rp(p)),
        2 => format!("ADC HL,{}", ctx.rp(p)),
        3 if q == 0 => format!("LD ({nn}),{}", ctx.rp(p)),
        3 => format!("LD {},({nn})", ctx.rp(p)),
        4 => "NEG".to_string(),
        5 if y == 1 => "RETI".to_string(),
        5 => "RETN".to_string(),
        6 => format!("IM {}", ["0", "0", "1", "2"][(y & 3) as usize]),
        _ => ["LD I,A", "LD R,A", "LD A,I", "LD A,R", "RRD", "RLD", "NOP", "NOP"][y as usize]
            .to_string(),
    }
}
