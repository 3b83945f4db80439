use crate::core::MemoryBus;
use crate::cpu::z80::flags::sz;
use crate::cpu::z80::{Flag, Reg16, Z80};

impl Z80 {
    /// LDI / LDD / LDIR / LDDR (ED 101y y000, y = 4..7)
    ///
    /// Copy (HL) to (DE), step HL and DE, decrement BC.
    /// Flags: H = 0, N = 0, PV = (BC != 0). S, Z, C preserved.
    ///
    /// The repeating forms loop here until BC reaches zero, so the whole
    /// transfer is one step. Starting with BC = 0 copies 65536 bytes.
    pub(crate) fn op_block_transfer<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        let decrement = opcode & 0x08 != 0;
        let repeat = opcode & 0x10 != 0;

        loop {
            let hl = self.get_hl();
            let de = self.get_de();
            let val = self.read_mem(bus, hl);
            self.write_mem(bus, de, val);
            self.step_pointer(Reg16::HL, decrement);
            self.step_pointer(Reg16::DE, decrement);
            let bc = self.regs.dec16(Reg16::BC);
            if !repeat || bc == 0 {
                break;
            }
        }

        let keep = Flag::S as u8 | Flag::Z as u8 | Flag::C as u8;
        let f = if self.get_bc() != 0 { Flag::PV as u8 } else { 0 };
        self.write_flags(keep, f);
    }

    /// CPI / CPD / CPIR / CPDR (ED 101y y001, y = 4..7)
    ///
    /// Compare A with (HL) as CP would, step HL, decrement BC.
    /// Flags: S, Z, H from A - (HL), N = 1, PV = (BC != 0). C preserved.
    /// The repeating forms stop on a match or when BC reaches zero.
    pub(crate) fn op_block_search<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        let decrement = opcode & 0x08 != 0;
        let repeat = opcode & 0x10 != 0;
        let a = self.a();

        loop {
            let hl = self.get_hl();
            let val = self.read_mem(bus, hl);
            let result = a.wrapping_sub(val);
            self.step_pointer(Reg16::HL, decrement);
            let bc = self.regs.dec16(Reg16::BC);

            let mut f = sz(result) | Flag::N as u8;
            if (a & 0x0F) < (val & 0x0F) { f |= Flag::H as u8; }
            if bc != 0 { f |= Flag::PV as u8; }
            self.write_flags(Flag::C as u8, f);

            if !repeat || bc == 0 || result == 0 {
                break;
            }
        }
    }

    fn step_pointer(&mut self, reg: Reg16, decrement: bool) {
        if decrement {
            self.regs.dec16(reg);
        } else {
            self.regs.inc16(reg);
        }
    }
}
