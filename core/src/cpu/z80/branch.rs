use crate::core::MemoryBus;
use crate::cpu::z80::{Flag, Reg8, Z80};

impl Z80 {
    /// Evaluate condition code (0=NZ, 1=Z, 2=NC, 3=C, 4=PO, 5=PE, 6=P, 7=M)
    pub(crate) fn eval_condition(&self, cc: u8) -> bool {
        match cc & 0x07 {
            0 => !self.flag(Flag::Z),  // NZ
            1 => self.flag(Flag::Z),   // Z
            2 => !self.flag(Flag::C),  // NC
            3 => self.flag(Flag::C),   // C
            4 => !self.flag(Flag::PV), // PO (parity odd)
            5 => self.flag(Flag::PV),  // PE (parity even)
            6 => !self.flag(Flag::S),  // P (positive)
            _ => self.flag(Flag::S),   // M (minus)
        }
    }

    fn jump_relative(&mut self, e: i8) {
        let pc = self.pc().wrapping_add(e as i16 as u16);
        self.set_pc(pc);
    }

    /// JP nn (C3) / JP cc,nn (11 ccc 010)
    pub(crate) fn op_jp(&mut self, opcode: u8, nn: u16) {
        if opcode == 0xC3 || self.eval_condition(opcode >> 3) {
            self.set_pc(nn);
        }
    }

    /// JP (HL) / JP (IX) / JP (IY): PC takes the register value, no memory read.
    pub(crate) fn op_jp_indirect(&mut self) {
        let target = self.regs.get16(self.index_reg());
        self.set_pc(target);
    }

    /// JR e (18) / JR cc,e (001 cc 000, cc = NZ/Z/NC/C only)
    /// Displacement is relative to the address after the instruction.
    pub(crate) fn op_jr(&mut self, opcode: u8, e: i8) {
        if opcode == 0x18 || self.eval_condition((opcode >> 3) & 0x03) {
            self.jump_relative(e);
        }
    }

    /// DJNZ e (10): decrement B, jump while non-zero. No flags affected.
    pub(crate) fn op_djnz(&mut self, e: i8) {
        let b = self.regs.get8(Reg8::B).wrapping_sub(1);
        self.regs.set8(Reg8::B, b);
        if b != 0 {
            self.jump_relative(e);
        }
    }

    /// CALL nn (CD) / CALL cc,nn (11 ccc 100)
    /// Pushes the address of the following instruction.
    pub(crate) fn op_call<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8, nn: u16) {
        if opcode == 0xCD || self.eval_condition(opcode >> 3) {
            let ret = self.pc();
            self.push16(bus, ret);
            self.set_pc(nn);
        }
    }

    /// RET (C9) / RET cc (11 ccc 000)
    pub(crate) fn op_ret<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        if opcode == 0xC9 || self.eval_condition(opcode >> 3) {
            let pc = self.pop16(bus);
            self.set_pc(pc);
        }
    }

    /// RETN / RETI: return and copy IFF2 into IFF1.
    pub(crate) fn op_retn<B: MemoryBus + ?Sized>(&mut self, bus: &mut B) {
        let pc = self.pop16(bus);
        self.set_pc(pc);
        self.iff1 = self.iff2;
    }

    /// RST p (11 ppp 111): call to address p * 8.
    pub(crate) fn op_rst<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        let ret = self.pc();
        self.push16(bus, ret);
        self.set_pc((opcode & 0x38) as u16);
    }

    /// HALT (76). PC is left after the HALT; the run loop stops here.
    pub(crate) fn op_halt(&mut self) {
        self.halted = true;
    }

    pub(crate) fn op_di(&mut self) {
        self.iff1 = false;
        self.iff2 = false;
    }

    pub(crate) fn op_ei(&mut self) {
        self.iff1 = true;
        self.iff2 = true;
    }

    /// IM 0/1/2 (ED 01 0yy 110). The undocumented y = 1 / 5 encodings select mode 0.
    pub(crate) fn op_im(&mut self, opcode: u8) {
        self.im = match (opcode >> 3) & 0x03 {
            0 | 1 => 0,
            2 => 1,
            _ => 2,
        };
    }
}
