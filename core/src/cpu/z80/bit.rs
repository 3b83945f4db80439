use crate::core::MemoryBus;
use crate::cpu::z80::flags::szp;
use crate::cpu::z80::{Flag, Reg8, Target8, Z80};

impl Z80 {
    /// Perform CB rotate/shift operation on a value.
    /// op: 0=RLC, 1=RRC, 2=RL, 3=RR, 4=SLA, 5=SRA, 6=SLL(undoc), 7=SRL.
    /// Returns (result, new_flags). Flags: S, Z, PV(parity), C from shifted bit. H=0, N=0.
    fn do_cb_rotate_shift(&self, op: u8, val: u8) -> (u8, u8) {
        let old_c = self.flag(Flag::C) as u8;
        let (result, carry) = match op & 0x07 {
            0 => (val.rotate_left(1), val >> 7),         // RLC
            1 => (val.rotate_right(1), val & 1),         // RRC
            2 => ((val << 1) | old_c, val >> 7),         // RL
            3 => ((val >> 1) | (old_c << 7), val & 1),   // RR
            4 => (val << 1, val >> 7),                   // SLA
            5 => (((val as i8) >> 1) as u8, val & 1),    // SRA: sign bit kept
            6 => ((val << 1) | 1, val >> 7),             // SLL: bit 0 forced to 1
            _ => (val >> 1, val & 1),                    // SRL
        };

        let mut f = szp(result);
        if carry != 0 { f |= Flag::C as u8; }
        (result, f)
    }

    /// BIT b: Z = PV = !bit, H = 1, N = 0, S only for bit 7 when set. C preserved.
    fn do_bit_test(&mut self, bit: u8, val: u8) {
        let set = val & (1 << bit) != 0;
        let mut f = Flag::H as u8;
        if !set { f |= Flag::Z as u8 | Flag::PV as u8; }
        if bit == 7 && set { f |= Flag::S as u8; }
        self.write_flags(Flag::C as u8, f);
    }

    /// Apply the CB operation selected by `opcode` to `val`.
    /// Returns the value to write back, or `None` for BIT.
    fn do_cb_op(&mut self, opcode: u8, val: u8) -> Option<u8> {
        let y = (opcode >> 3) & 0x07;
        match opcode >> 6 {
            0 => {
                let (result, f) = self.do_cb_rotate_shift(y, val);
                self.write_flags(0, f);
                Some(result)
            }
            1 => {
                self.do_bit_test(y, val);
                None
            }
            2 => Some(val & !(1 << y)), // RES
            _ => Some(val | (1 << y)),  // SET
        }
    }

    /// Execute CB-prefixed instruction.
    /// Decoded directly from the bit pattern: xx yyy zzz, z = r operand.
    pub(crate) fn execute_cb<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        let target = match Reg8::from_index(opcode) {
            Some(reg) => Target8::Reg(reg),
            None => Target8::Mem(self.get_hl()),
        };
        let val = self.read_target(bus, target);
        if let Some(result) = self.do_cb_op(opcode, val) {
            self.write_target(bus, target, result);
        }
    }

    /// Execute DD CB d op / FD CB d op.
    /// The operand is always (IX+d)/(IY+d). For z != 6 the result is also
    /// copied into register z (undocumented); BIT never writes back.
    pub(crate) fn execute_indexed_cb<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8, d: i8) {
        let addr = self.index_addr(d);
        let val = self.read_mem(bus, addr);
        if let Some(result) = self.do_cb_op(opcode, val) {
            self.write_mem(bus, addr, result);
            if let Some(reg) = Reg8::from_index(opcode) {
                self.regs.set8(reg, result);
            }
        }
    }

    /// RRD (ED 67) / RLD (ED 6F)
    /// Rotate BCD digits between the low nibble of A and the byte at (HL).
    /// S, Z, PV(parity) from A, H = 0, N = 0, C preserved.
    pub(crate) fn op_rotate_digit<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        let addr = self.get_hl();
        let m = self.read_mem(bus, addr);
        let a = self.a();
        let (new_a, new_m) = if opcode & 0x08 != 0 {
            // RLD
            ((a & 0xF0) | (m >> 4), (m << 4) | (a & 0x0F))
        } else {
            // RRD
            ((a & 0xF0) | (m & 0x0F), (a << 4) | (m >> 4))
        };
        self.write_mem(bus, addr, new_m);
        self.set_a(new_a);
        self.write_flags(Flag::C as u8, szp(new_a));
    }
}

