use crate::core::MemoryBus;
use crate::cpu::z80::Z80;

impl Z80 {
    /// Push a word: high byte at SP-1, low byte at SP-2.
    pub(crate) fn push16<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, val: u16) {
        let sp = self.sp().wrapping_sub(1);
        self.write_mem(bus, sp, (val >> 8) as u8);
        let sp = sp.wrapping_sub(1);
        self.write_mem(bus, sp, val as u8);
        self.set_sp(sp);
    }

    /// Pop a word: low byte first, SP incremented after each read.
    pub(crate) fn pop16<B: MemoryBus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let sp = self.sp();
        let lo = self.read_mem(bus, sp) as u16;
        let hi = self.read_mem(bus, sp.wrapping_add(1)) as u16;
        self.set_sp(sp.wrapping_add(2));
        (hi << 8) | lo
    }

    /// PUSH qq: 11 qq0 101 (qq: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF)
    pub(crate) fn op_push<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        let val = self.regs.get16(self.rp2(opcode >> 4));
        self.push16(bus, val);
    }

    /// POP qq: 11 qq0 001
    pub(crate) fn op_pop<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, opcode: u8) {
        let reg = self.rp2(opcode >> 4);
        let val = self.pop16(bus);
        self.regs.set16(reg, val);
    }
}
