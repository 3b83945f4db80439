use crate::core::MemoryBus;
use crate::cpu::z80::flags::{szp, sz};
use crate::cpu::z80::{AluOp, Flag, Operands, Reg8, Source, Target8, Z80};

const SZPV: u8 = Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8;

impl Z80 {
    // --- Flag Helpers ---

    fn update_flags_logic(&mut self, result: u8, is_and: bool) {
        let mut f = szp(result);
        if is_and { f |= Flag::H as u8; } // AND sets H, others clear it
        // N is 0, C is 0
        self.write_flags(0, f);
    }

    fn do_add(&mut self, val: u8, carry_in: bool) {
        let a = self.a();
        let c_val = if carry_in && self.flag(Flag::C) { 1 } else { 0 };
        let sum = (a as u16) + (val as u16) + c_val as u16;
        let result = sum as u8;

        let mut f = sz(result);
        if ((a & 0xF) + (val & 0xF) + c_val) > 0xF { f |= Flag::H as u8; }
        if (!(a ^ val) & (a ^ result) & 0x80) != 0 { f |= Flag::PV as u8; }
        if sum > 0xFF { f |= Flag::C as u8; }

        self.set_a(result);
        self.write_flags(0, f);
    }

    /// SUB/SBC, or CP when `store` is false (A is left alone).
    fn do_sub(&mut self, val: u8, carry_in: bool, store: bool) {
        let a = self.a();
        let c_val = if carry_in && self.flag(Flag::C) { 1 } else { 0 };
        let diff = a as i16 - val as i16 - c_val as i16;
        let result = diff as u8;

        let mut f = sz(result) | Flag::N as u8;
        if (a & 0xF) < (val & 0xF) + c_val { f |= Flag::H as u8; }
        if ((a ^ val) & (a ^ result) & 0x80) != 0 { f |= Flag::PV as u8; }
        if diff < 0 { f |= Flag::C as u8; }

        if store {
            self.set_a(result);
        }
        self.write_flags(0, f);
    }

    pub(crate) fn perform_alu_op(&mut self, op: AluOp, val: u8) {
        match op {
            AluOp::Add => self.do_add(val, false),
            AluOp::Adc => self.do_add(val, true),
            AluOp::Sub => self.do_sub(val, false, true),
            AluOp::Sbc => self.do_sub(val, true, true),
            AluOp::And => { let a = self.a() & val; self.set_a(a); self.update_flags_logic(a, true); }
            AluOp::Xor => { let a = self.a() ^ val; self.set_a(a); self.update_flags_logic(a, false); }
            AluOp::Or => { let a = self.a() | val; self.set_a(a); self.update_flags_logic(a, false); }
            AluOp::Cp => self.do_sub(val, false, false),
        }
    }

    // --- Instructions ---

    /// ALU A, r / n / (HL) / (IX+d)
    /// ADD, ADC, SUB, SBC, AND, XOR, OR, CP
    /// Opcode mask: 10 xxx zzz (register/memory), 11 xxx 110 (immediate)
    pub(crate) fn op_alu<B: MemoryBus + ?Sized>(
        &mut self,
        bus: &mut B,
        op: AluOp,
        src: Source,
        opcode: u8,
        operands: Operands,
    ) {
        let val = match src {
            Source::Imm => operands.byte(),
            Source::Reg => match self.reg8_ix(opcode) {
                Some(reg) => self.regs.get8(reg),
                None => return,
            },
            Source::Hl => {
                let addr = self.get_hl();
                self.read_mem(bus, addr)
            }
            Source::Idx => {
                let addr = self.index_addr(operands.disp());
                self.read_mem(bus, addr)
            }
        };
        self.perform_alu_op(op, val);
    }

    /// INC/DEC r (IXH/IXL/IYH/IYL under a prefix)
    /// Opcode mask: 00 rrr 10x
    pub(crate) fn op_inc_dec_r(&mut self, opcode: u8) {
        let Some(reg) = self.reg8_ix(opcode >> 3) else {
            return;
        };
        let val = self.regs.get8(reg);
        let result = if opcode & 0x01 != 0 {
            self.calc_dec_flags(val)
        } else {
            self.calc_inc_flags(val)
        };
        self.regs.set8(reg, result);
    }

    /// INC/DEC (HL) and (IX+d): read-modify-write of one byte.
    pub(crate) fn op_inc_dec_mem<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, addr: u16, is_dec: bool) {
        let target = Target8::Mem(addr);
        let val = self.read_target(bus, target);
        let result = if is_dec { self.calc_dec_flags(val) } else { self.calc_inc_flags(val) };
        self.write_target(bus, target, result);
    }

    fn calc_inc_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        let mut f = sz(result);
        if (val & 0xF) == 0xF { f |= Flag::H as u8; }
        if val == 0x7F { f |= Flag::PV as u8; } // Overflow 7F -> 80
        // N is 0, C preserved
        self.write_flags(Flag::C as u8, f);
        result
    }

    fn calc_dec_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        let mut f = sz(result) | Flag::N as u8;
        if (val & 0xF) == 0x0 { f |= Flag::H as u8; } // Borrow from bit 4
        if val == 0x80 { f |= Flag::PV as u8; } // Overflow 80 -> 7F
        self.write_flags(Flag::C as u8, f);
        result
    }

    // --- 16-bit ALU ---

    /// ADD HL,rr (also ADD IX,rr / ADD IY,rr)
    /// Opcode mask: 00 rr1 001 (rr: 0=BC, 1=DE, 2=HL/IX/IY, 3=SP)
    /// Flags: H = carry from bit 11, C = carry from bit 15, N = 0.
    /// S, Z, PV preserved.
    pub(crate) fn op_add_hl_rr(&mut self, opcode: u8) {
        let dst = self.index_reg();
        let hl = self.regs.get16(dst);
        let rr = self.regs.get16(self.rp(opcode >> 4));
        let result = (hl as u32) + (rr as u32);

        let mut f = 0;
        if ((hl & 0x0FFF) + (rr & 0x0FFF)) > 0x0FFF { f |= Flag::H as u8; }
        if result > 0xFFFF { f |= Flag::C as u8; }
        self.write_flags(SZPV, f);
        self.regs.set16(dst, result as u16);
    }

    /// ADC HL,rr (ED 01 rr1 010). All flags from the 16-bit result.
    pub(crate) fn op_adc_hl_rr(&mut self, opcode: u8) {
        let hl = self.get_hl();
        let rr = self.regs.get16(self.rp(opcode >> 4));
        let c = if self.flag(Flag::C) { 1u32 } else { 0 };
        let sum = hl as u32 + rr as u32 + c;
        let result = sum as u16;

        let mut f = 0;
        if result == 0 { f |= Flag::Z as u8; }
        if result & 0x8000 != 0 { f |= Flag::S as u8; }
        if (hl & 0x0FFF) as u32 + (rr & 0x0FFF) as u32 + c > 0x0FFF { f |= Flag::H as u8; }
        if (!(hl ^ rr) & (hl ^ result) & 0x8000) != 0 { f |= Flag::PV as u8; }
        if sum > 0xFFFF { f |= Flag::C as u8; }
        self.write_flags(0, f);
        self.set_hl(result);
    }

    /// SBC HL,rr (ED 01 rr0 010). All flags from the 16-bit result, N = 1.
    pub(crate) fn op_sbc_hl_rr(&mut self, opcode: u8) {
        let hl = self.get_hl();
        let rr = self.regs.get16(self.rp(opcode >> 4));
        let c = if self.flag(Flag::C) { 1i32 } else { 0 };
        let diff = hl as i32 - rr as i32 - c;
        let result = diff as u16;

        let mut f = Flag::N as u8;
        if result == 0 { f |= Flag::Z as u8; }
        if result & 0x8000 != 0 { f |= Flag::S as u8; }
        if ((hl & 0x0FFF) as i32) < (rr & 0x0FFF) as i32 + c { f |= Flag::H as u8; }
        if ((hl ^ rr) & (hl ^ result) & 0x8000) != 0 { f |= Flag::PV as u8; }
        if diff < 0 { f |= Flag::C as u8; }
        self.write_flags(0, f);
        self.set_hl(result);
    }

    /// INC rr / DEC rr
    /// INC: 00 rr0 011, DEC: 00 rr1 011. No flags affected.
    pub(crate) fn op_inc_dec_rr(&mut self, opcode: u8) {
        let reg = self.rp(opcode >> 4);
        if opcode & 0x08 != 0 {
            self.regs.dec16(reg);
        } else {
            self.regs.inc16(reg);
        }
    }

    // --- Accumulator Rotates ---

    /// RLCA / RRCA / RLA / RRA (00 0yy 111)
    /// H = 0, N = 0, C = bit shifted out. S, Z, PV preserved.
    pub(crate) fn op_rotate_a(&mut self, opcode: u8) {
        let a = self.a();
        let old_carry = self.flag(Flag::C) as u8;
        let (result, carry) = match (opcode >> 3) & 0x03 {
            0 => (a.rotate_left(1), a >> 7),           // RLCA
            1 => (a.rotate_right(1), a & 1),           // RRCA
            2 => ((a << 1) | old_carry, a >> 7),       // RLA
            _ => ((a >> 1) | (old_carry << 7), a & 1), // RRA
        };
        self.set_a(result);
        let f = if carry != 0 { Flag::C as u8 } else { 0 };
        self.write_flags(SZPV, f);
    }

    // --- Misc ALU ---

    /// DAA
    /// Decimal adjust accumulator after BCD add/sub.
    pub(crate) fn op_daa(&mut self) {
        let a = self.a();
        let n = self.flag(Flag::N);
        let old_h = self.flag(Flag::H);
        let old_c = self.flag(Flag::C);

        let mut correction = 0u8;
        let mut new_c = old_c;

        if old_h || (a & 0x0F) > 9 {
            correction |= 0x06;
        }
        if old_c || a > 0x99 {
            correction |= 0x60;
            new_c = true;
        }

        let result = if n {
            a.wrapping_sub(correction)
        } else {
            a.wrapping_add(correction)
        };

        self.set_a(result);
        let mut f = szp(result);
        if new_c { f |= Flag::C as u8; }
        if (a ^ result) & 0x10 != 0 { f |= Flag::H as u8; }
        // N preserved
        self.write_flags(Flag::N as u8, f);
    }

    /// CPL
    /// Complement A. Sets H and N. S, Z, PV, C preserved.
    pub(crate) fn op_cpl(&mut self) {
        let a = !self.a();
        self.set_a(a);
        self.write_flags(SZPV | Flag::C as u8, Flag::H as u8 | Flag::N as u8);
    }

    /// NEG (ED 44 and mirrors)
    /// A = 0 - A with SUB flags.
    pub(crate) fn op_neg(&mut self) {
        let val = self.a();
        self.set_a(0);
        self.do_sub(val, false, true);
    }

    /// SCF
    /// Set carry flag. C = 1, H = 0, N = 0. S, Z, PV preserved.
    pub(crate) fn op_scf(&mut self) {
        self.write_flags(SZPV, Flag::C as u8);
    }

    /// CCF
    /// Complement carry flag. H = old C, C = ~C, N = 0. S, Z, PV preserved.
    pub(crate) fn op_ccf(&mut self) {
        let f = if self.flag(Flag::C) { Flag::H as u8 } else { Flag::C as u8 };
        self.write_flags(SZPV, f);
    }

    /// Load A with I or R (ED 57 / ED 5F).
    /// S, Z from the value, H = 0, N = 0, PV = IFF2. C preserved.
    pub(crate) fn op_ld_a_ir(&mut self, src: Reg8) {
        let val = self.regs.get8(src);
        self.set_a(val);
        let mut f = sz(val);
        if self.iff2 { f |= Flag::PV as u8; }
        self.write_flags(Flag::C as u8, f);
    }
}

