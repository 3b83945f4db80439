use crate::core::MemoryBus;
use crate::cpu::z80::{Reg8, Reg16, Z80};

impl Z80 {
    // --- 8-bit loads ---

    /// LD r,r': 01 rrr rrr
    /// Under DD/FD, H and L on either side become IXH/IXL (IYH/IYL).
    pub(crate) fn op_ld_r_r(&mut self, opcode: u8) {
        let (Some(dst), Some(src)) = (self.reg8_ix(opcode >> 3), self.reg8_ix(opcode)) else {
            return;
        };
        let val = self.regs.get8(src);
        self.regs.set8(dst, val);
    }

    /// LD r,n: 00 rrr 110
    pub(crate) fn op_ld_r_n(&mut self, opcode: u8, n: u8) {
        if let Some(dst) = self.reg8_ix(opcode >> 3) {
            self.regs.set8(dst, n);
        }
    }

    /// LD r,(HL): 01 rrr 110
    pub(crate) fn op_ld_r_hl<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        let addr = self.get_hl();
        self.load_reg_from(bus, opcode >> 3, addr);
    }

    /// LD r,(IX+d): DD 01 rrr 110 d. r is never substituted.
    pub(crate) fn op_ld_r_idx<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8, d: i8) {
        let addr = self.index_addr(d);
        self.load_reg_from(bus, opcode >> 3, addr);
    }

    fn load_reg_from<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, index: u8, addr: u16) {
        if let Some(dst) = Reg8::from_index(index) {
            let val = self.read_mem(bus, addr);
            self.regs.set8(dst, val);
        }
    }

    /// LD (HL),r: 01 110 rrr
    pub(crate) fn op_ld_hl_r<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        let addr = self.get_hl();
        self.store_reg_to(bus, opcode, addr);
    }

    /// LD (IX+d),r: DD 01 110 rrr d. r is never substituted.
    pub(crate) fn op_ld_idx_r<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8, d: i8) {
        let addr = self.index_addr(d);
        self.store_reg_to(bus, opcode, addr);
    }

    fn store_reg_to<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, index: u8, addr: u16) {
        if let Some(src) = Reg8::from_index(index) {
            let val = self.regs.get8(src);
            self.write_mem(bus, addr, val);
        }
    }

    /// LD (HL),n: 36 n
    pub(crate) fn op_ld_hl_n<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, n: u8) {
        let addr = self.get_hl();
        self.write_mem(bus, addr, n);
    }

    /// LD (IX+d),n: DD 36 d n
    pub(crate) fn op_ld_idx_n<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, d: i8, n: u8) {
        let addr = self.index_addr(d);
        self.write_mem(bus, addr, n);
    }

    /// LD A,(nn): 3A
    pub(crate) fn op_ld_a_mem<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, nn: u16) {
        let val = self.read_mem(bus, nn);
        self.set_a(val);
    }

    /// LD (nn),A: 32
    pub(crate) fn op_ld_mem_a<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, nn: u16) {
        let a = self.a();
        self.write_mem(bus, nn, a);
    }

    /// LD A,(BC): 0A / LD A,(DE): 1A
    pub(crate) fn op_ld_a_indirect<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        let addr = self.regs.get16(Reg16::from_rp(opcode >> 4));
        let val = self.read_mem(bus, addr);
        self.set_a(val);
    }

    /// LD (BC),A: 02 / LD (DE),A: 12
    pub(crate) fn op_ld_indirect_a<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        let addr = self.regs.get16(Reg16::from_rp(opcode >> 4));
        let a = self.a();
        self.write_mem(bus, addr, a);
    }

    /// LD I,A (ED 47) / LD R,A (ED 4F). No flags affected.
    pub(crate) fn op_ld_ir_a(&mut self, dst: Reg8) {
        let a = self.a();
        self.regs.set8(dst, a);
    }

    // --- 16-bit loads ---

    /// LD rr,nn: 00 rr0 001
    pub(crate) fn op_ld_rr_nn(&mut self, opcode: u8, nn: u16) {
        let dst = self.rp(opcode >> 4);
        self.regs.set16(dst, nn);
    }

    /// LD HL,(nn): 2A, LD rr,(nn): ED 01 rr1 011
    pub(crate) fn op_ld_rr_mem<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8, nn: u16) {
        let dst = self.rp(opcode >> 4);
        let val = self.read_word(bus, nn);
        self.regs.set16(dst, val);
    }

    /// LD (nn),HL: 22, LD (nn),rr: ED 01 rr0 011
    pub(crate) fn op_ld_mem_rr<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8, nn: u16) {
        let val = self.regs.get16(self.rp(opcode >> 4));
        self.write_word(bus, nn, val);
    }

    /// LD SP,HL: F9 (LD SP,IX / LD SP,IY under a prefix)
    pub(crate) fn op_ld_sp_rr(&mut self) {
        let val = self.regs.get16(self.index_reg());
        self.set_sp(val);
    }

    // --- Exchanges ---

    /// EX AF,AF' (08), EX DE,HL (EB), EX (SP),HL (E3; IX/IY under a prefix)
    pub(crate) fn op_exchange<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        match opcode {
            0x08 => self.regs.ex_af(),
            0xEB => self.regs.ex_de_hl(),
            _ => {
                let reg = self.index_reg();
                let sp = self.sp();
                let from_stack = self.read_word(bus, sp);
                let val = self.regs.get16(reg);
                self.write_word(bus, sp, val);
                self.regs.set16(reg, from_stack);
            }
        }
    }
}
