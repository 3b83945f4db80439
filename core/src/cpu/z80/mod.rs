mod alu;
mod bit;
mod block;
mod branch;
mod disasm;
mod load_store;
mod stack;

pub mod flags;
pub mod opcodes;
pub mod registers;
pub mod trace;

use log::warn;

use crate::core::MemoryBus;
use crate::cpu::state::{CpuStateTrait, Z80State};

pub use flags::Flag;
pub use opcodes::{AluOp, InstructionGroup, OperandShape, Source, classify, label};
pub use registers::{Reg8, Reg16, RegisterFile};
pub use trace::{Executed, Operands, Page, Trace};

use flags::UNDEFINED_BITS;

/// Which register stands in for HL in the current instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexMode {
    HL,
    IX,
    IY,
}

/// An 8-bit operand location: a register, or a byte of memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Target8 {
    Reg(Reg8),
    Mem(u16),
}

pub struct Z80 {
    pub regs: RegisterFile,

    // Internal state
    pub halted: bool,
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,

    // Prefix handling
    pub(crate) index_mode: IndexMode,

    pub(crate) trace: Trace,
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80 {
    pub fn new() -> Self {
        let mut cpu = Self {
            regs: RegisterFile::new(),
            halted: false,
            iff1: false,
            iff2: false,
            im: 0,
            index_mode: IndexMode::HL,
            trace: Trace::default(),
        };
        cpu.reset();
        cpu
    }

    /// Power-on register values. Memory is untouched.
    pub fn reset(&mut self) {
        self.regs = RegisterFile::new();
        for reg in [Reg16::AF, Reg16::BC, Reg16::DE, Reg16::HL, Reg16::IX, Reg16::IY, Reg16::SP] {
            self.regs.set16(reg, 0xFFFF);
            self.regs.set_shadow(reg, 0xFFFF);
        }
        self.halted = false;
        self.iff1 = false;
        self.iff2 = false;
        self.im = 0;
        self.index_mode = IndexMode::HL;
        self.trace = Trace::default();
    }

    // Helpers for register access
    pub fn a(&self) -> u8 { self.regs.get8(Reg8::A) }
    pub fn set_a(&mut self, val: u8) { self.regs.set8(Reg8::A, val) }

    pub fn f(&self) -> u8 { self.regs.flags() }
    pub fn set_f(&mut self, val: u8) { self.regs.set_flags(val) }

    pub fn get_bc(&self) -> u16 { self.regs.get16(Reg16::BC) }
    pub fn set_bc(&mut self, val: u16) { self.regs.set16(Reg16::BC, val) }

    pub fn get_de(&self) -> u16 { self.regs.get16(Reg16::DE) }
    pub fn set_de(&mut self, val: u16) { self.regs.set16(Reg16::DE, val) }

    pub fn get_hl(&self) -> u16 { self.regs.get16(Reg16::HL) }
    pub fn set_hl(&mut self, val: u16) { self.regs.set16(Reg16::HL, val) }

    pub fn get_af(&self) -> u16 { self.regs.get16(Reg16::AF) }
    pub fn set_af(&mut self, val: u16) { self.regs.set16(Reg16::AF, val) }

    pub fn pc(&self) -> u16 { self.regs.get16(Reg16::PC) }
    pub fn set_pc(&mut self, val: u16) { self.regs.set16(Reg16::PC, val) }

    pub fn sp(&self) -> u16 { self.regs.get16(Reg16::SP) }
    pub fn set_sp(&mut self, val: u16) { self.regs.set16(Reg16::SP, val) }

    pub fn flag(&self, flag: Flag) -> bool { self.regs.flag(flag) }

    /// What the most recent `step` executed and touched.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Register standing in for HL under the current prefix.
    pub(crate) fn index_reg(&self) -> Reg16 {
        match self.index_mode {
            IndexMode::HL => Reg16::HL,
            IndexMode::IX => Reg16::IX,
            IndexMode::IY => Reg16::IY,
        }
    }

    /// Effective address for (IX+d) / (IY+d). Under no prefix this is HL.
    pub(crate) fn index_addr(&self, d: i8) -> u16 {
        match self.index_mode {
            IndexMode::HL => self.get_hl(),
            _ => self.regs.get16(self.index_reg()).wrapping_add(d as i16 as u16),
        }
    }

    /// Decode an `r` field, substituting IXH/IXL/IYH/IYL for H/L under a prefix
    /// (undocumented). Index 6 is not a register; callers handle memory forms.
    pub(crate) fn reg8_ix(&self, index: u8) -> Option<Reg8> {
        match (index & 0x07, self.index_mode) {
            (4, IndexMode::IX) => Some(Reg8::IXH),
            (5, IndexMode::IX) => Some(Reg8::IXL),
            (4, IndexMode::IY) => Some(Reg8::IYH),
            (5, IndexMode::IY) => Some(Reg8::IYL),
            (i, _) => Reg8::from_index(i),
        }
    }

    /// `rp` field (BC, DE, HL/IX/IY, SP).
    pub(crate) fn rp(&self, p: u8) -> Reg16 {
        match Reg16::from_rp(p) {
            Reg16::HL => self.index_reg(),
            reg => reg,
        }
    }

    /// `rp2` field (BC, DE, HL/IX/IY, AF).
    pub(crate) fn rp2(&self, p: u8) -> Reg16 {
        match Reg16::from_rp2(p) {
            Reg16::HL => self.index_reg(),
            reg => reg,
        }
    }

    /// Replace F, keeping the flags in `keep`. Bits 3 and 5 are always kept.
    pub(crate) fn write_flags(&mut self, keep: u8, f: u8) {
        let keep = keep | UNDEFINED_BITS;
        let old = self.regs.flags();
        self.regs.set_flags((old & keep) | (f & !keep));
    }

    // --- Bus access ---

    pub(crate) fn read_mem<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, addr: u16) -> u8 {
        self.trace.last_read = Some(addr);
        bus.read(addr)
    }

    pub(crate) fn write_mem<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, addr: u16, data: u8) {
        self.trace.last_write = Some(addr);
        bus.write(addr, data);
    }

    pub(crate) fn read_word<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, addr: u16) -> u16 {
        let val = bus.read_word(addr);
        self.trace.last_read = Some(addr);
        val
    }

    pub(crate) fn write_word<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, addr: u16, data: u16) {
        bus.write_word(addr, data);
        self.trace.last_write = Some(addr);
    }

    pub(crate) fn read_target<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, target: Target8) -> u8 {
        match target {
            Target8::Reg(reg) => self.regs.get8(reg),
            Target8::Mem(addr) => self.read_mem(bus, addr),
        }
    }

    pub(crate) fn write_target<B: MemoryBus + ?Sized>(
        &mut self,
        bus: &mut B,
        target: Target8,
        data: u8,
    ) {
        match target {
            Target8::Reg(reg) => self.regs.set8(reg, data),
            Target8::Mem(addr) => self.write_mem(bus, addr, data),
        }
    }

    /// Read the byte at PC and advance PC.
    fn fetch_byte<B: MemoryBus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let pc = self.pc();
        self.set_pc(pc.wrapping_add(1));
        bus.read(pc)
    }

    /// Opcode fetch (M1): like `fetch_byte`, plus a memory refresh tick.
    fn fetch_opcode<B: MemoryBus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        self.regs.refresh();
        self.fetch_byte(bus)
    }

    /// The byte at PC, without advancing or refreshing.
    fn peek_byte<B: MemoryBus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        bus.read(self.pc())
    }

    fn fetch_word<B: MemoryBus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_byte(bus) as u16;
        let hi = self.fetch_byte(bus) as u16;
        (hi << 8) | lo
    }

    fn fetch_operands<B: MemoryBus + ?Sized>(&mut self, bus: &mut B, shape: OperandShape) -> Operands {
        match shape {
            OperandShape::None => Operands::None,
            OperandShape::Byte => Operands::Byte(self.fetch_byte(bus)),
            OperandShape::Word => Operands::Word(self.fetch_word(bus)),
            OperandShape::Displacement => Operands::Disp(self.fetch_byte(bus) as i8),
            OperandShape::DisplacedByte => {
                let d = self.fetch_byte(bus) as i8;
                Operands::DispByte(d, self.fetch_byte(bus))
            }
        }
    }

    /// Fetch, decode and execute one instruction.
    ///
    /// Prefix bytes belong to the instruction they modify, so a single call
    /// consumes e.g. all of `DD CB d op`. A DD/FD prefix followed by another
    /// DD/FD/ED byte is a one-byte no-op on its own; the next call decodes
    /// the new prefix, so the last one wins and every call stays bounded.
    pub fn step<B: MemoryBus + ?Sized>(&mut self, bus: &mut B) {
        let pc = self.pc();
        self.trace.last_read = None;
        self.trace.last_write = None;
        self.index_mode = IndexMode::HL;

        let mut op = self.fetch_opcode(bus);
        if op == 0xDD || op == 0xFD {
            if matches!(self.peek_byte(bus), 0xDD | 0xED | 0xFD) {
                let executed = Executed {
                    pc,
                    len: 1,
                    page: Page::Base,
                    opcode: op,
                    group: classify(op as u16),
                    operands: Operands::None,
                };
                log::trace!("{:04X}  {}", pc, executed);
                self.trace.last = Some(executed);
                return;
            }
            self.index_mode = if op == 0xDD { IndexMode::IX } else { IndexMode::IY };
            op = self.fetch_opcode(bus);
        }

        let executed = match (op, self.index_mode) {
            (0xCB, IndexMode::HL) => {
                let sub = self.fetch_opcode(bus);
                let len = self.pc().wrapping_sub(pc) as u8;
                self.execute_cb(bus, sub);
                Executed {
                    pc,
                    len,
                    page: Page::Bit,
                    opcode: sub,
                    group: classify(0xCB00 | sub as u16),
                    operands: Operands::None,
                }
            }
            (0xCB, mode) => {
                // DD CB d op: displacement comes before the opcode, which is
                // read as data (no refresh tick)
                let d = self.fetch_byte(bus) as i8;
                let sub = self.fetch_byte(bus);
                let len = self.pc().wrapping_sub(pc) as u8;
                self.execute_indexed_cb(bus, sub, d);
                Executed {
                    pc,
                    len,
                    page: Page::IndexBit(mode),
                    opcode: sub,
                    group: classify(0xCB00 | sub as u16),
                    operands: Operands::Disp(d),
                }
            }
            (0xED, _) => {
                let sub = self.fetch_opcode(bus);
                self.decode_and_execute(bus, pc, Page::Extended, sub, 0xED00 | sub as u16)
            }
            (_, IndexMode::HL) => self.decode_and_execute(bus, pc, Page::Base, op, op as u16),
            (_, mode) => {
                let prefix: u16 = if mode == IndexMode::IX { 0xDD } else { 0xFD };
                if classify(prefix << 8 | op as u16) == InstructionGroup::Undefined {
                    // Opcode does not involve HL: the prefix has no effect
                    self.index_mode = IndexMode::HL;
                    self.decode_and_execute(bus, pc, Page::Base, op, op as u16)
                } else {
                    self.decode_and_execute(bus, pc, Page::Index(mode), op, prefix << 8 | op as u16)
                }
            }
        };

        log::trace!("{:04X}  {}", pc, executed);
        self.trace.last = Some(executed);
    }

    fn decode_and_execute<B: MemoryBus + ?Sized>(
        &mut self,
        bus: &mut B,
        pc: u16,
        page: Page,
        opcode: u8,
        key: u16,
    ) -> Executed {
        let group = classify(key);
        let operands = self.fetch_operands(bus, group.operand_shape());
        let len = self.pc().wrapping_sub(pc) as u8;
        self.execute(bus, pc, group, opcode, operands, key);
        Executed {
            pc,
            len,
            page,
            opcode,
            group,
            operands,
        }
    }

    fn execute<B: MemoryBus + ?Sized>(
        &mut self,
        bus: &mut B,
        pc: u16,
        group: InstructionGroup,
        op: u8,
        operands: Operands,
        key: u16,
    ) {
        use InstructionGroup::*;
        match group {
            Nop => {}
            Halt => self.op_halt(),

            LoadRR => self.op_ld_r_r(op),
            LoadRN => self.op_ld_r_n(op, operands.byte()),
            LoadRHl => self.op_ld_r_hl(bus, op),
            LoadRIdx => self.op_ld_r_idx(bus, op, operands.disp()),
            LoadHlR => self.op_ld_hl_r(bus, op),
            LoadHlN => self.op_ld_hl_n(bus, operands.byte()),
            LoadIdxR => self.op_ld_idx_r(bus, op, operands.disp()),
            LoadIdxN => self.op_ld_idx_n(bus, operands.disp(), operands.byte()),
            LoadAMem => self.op_ld_a_mem(bus, operands.word()),
            LoadMemA => self.op_ld_mem_a(bus, operands.word()),
            LoadAIndirect => self.op_ld_a_indirect(bus, op),
            LoadIndirectA => self.op_ld_indirect_a(bus, op),
            LoadAI => self.op_ld_a_ir(Reg8::I),
            LoadAR => self.op_ld_a_ir(Reg8::R),
            LoadIA => self.op_ld_ir_a(Reg8::I),
            LoadRA => self.op_ld_ir_a(Reg8::R),

            LoadRrNn => self.op_ld_rr_nn(op, operands.word()),
            LoadRrMem => self.op_ld_rr_mem(bus, op, operands.word()),
            LoadMemRr => self.op_ld_mem_rr(bus, op, operands.word()),
            LoadSpRr => self.op_ld_sp_rr(),
            Push => self.op_push(bus, op),
            Pop => self.op_pop(bus, op),
            Exchange => self.op_exchange(bus, op),
            Exx => self.regs.exx(),

            Alu(alu, src) => self.op_alu(bus, alu, src, op, operands),
            IncR | DecR => self.op_inc_dec_r(op),
            IncHl | DecHl => {
                let addr = self.get_hl();
                self.op_inc_dec_mem(bus, addr, group == DecHl);
            }
            IncIdx | DecIdx => {
                let addr = self.index_addr(operands.disp());
                self.op_inc_dec_mem(bus, addr, group == DecIdx);
            }

            AddHlRr => self.op_add_hl_rr(op),
            AdcHlRr => self.op_adc_hl_rr(op),
            SbcHlRr => self.op_sbc_hl_rr(op),
            IncRr | DecRr => self.op_inc_dec_rr(op),

            RotateA => self.op_rotate_a(op),
            RotateDigit => self.op_rotate_digit(bus, op),
            Daa => self.op_daa(),
            Cpl => self.op_cpl(),
            Neg => self.op_neg(),
            Ccf => self.op_ccf(),
            Scf => self.op_scf(),

            Jp => self.op_jp(op, operands.word()),
            JpIndirect => self.op_jp_indirect(),
            Jr => self.op_jr(op, operands.disp()),
            Djnz => self.op_djnz(operands.disp()),
            Call => self.op_call(bus, op, operands.word()),
            Ret => self.op_ret(bus, op),
            RetInterrupt => self.op_retn(bus),
            Rst => self.op_rst(bus, op),
            Di => self.op_di(),
            Ei => self.op_ei(),
            Im => self.op_im(op),

            BlockTransfer => self.op_block_transfer(bus, op),
            BlockSearch => self.op_block_search(bus, op),

            RotateShift | BitTest | BitReset | BitSet => self.execute_cb(bus, op),

            PortIo | PortIoImm => {
                warn!("port I/O not emulated, skipping {:04X} at {:04X}", key, pc);
            }
            BitPrefix | IndexPrefix | ExtendedPrefix | IndexedBitPrefix | Undefined => {
                warn!("undefined opcode {:04X} at {:04X} treated as NOP", key, pc);
            }
        }
    }
}

impl CpuStateTrait for Z80 {
    type Snapshot = Z80State;

    fn snapshot(&self) -> Z80State {
        let r = &self.regs;
        Z80State {
            af: r.get16(Reg16::AF),
            bc: r.get16(Reg16::BC),
            de: r.get16(Reg16::DE),
            hl: r.get16(Reg16::HL),
            af_prime: r.get_shadow(Reg16::AF),
            bc_prime: r.get_shadow(Reg16::BC),
            de_prime: r.get_shadow(Reg16::DE),
            hl_prime: r.get_shadow(Reg16::HL),
            ix: r.get16(Reg16::IX),
            iy: r.get16(Reg16::IY),
            sp: r.get16(Reg16::SP),
            pc: r.get16(Reg16::PC),
            i: r.get8(Reg8::I),
            r: r.get8(Reg8::R),
            iff1: self.iff1,
            iff2: self.iff2,
            im: self.im,
            halted: self.halted,
        }
    }
}
