#![allow(dead_code)]

use z80emu_core::core::MemoryBus;
use z80emu_core::cpu::z80::Z80;

/// Minimal bus for testing: flat 64KB read/write memory, no peripherals.
pub struct TestBus {
    pub memory: [u8; 0x10000],
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl MemoryBus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }
}

/// Execute one instruction and return how many bytes it consumed.
pub fn run_instruction(cpu: &mut Z80, bus: &mut TestBus) -> u8 {
    cpu.step(bus);
    cpu.trace().last.map_or(0, |e| e.len)
}

/// A CPU with PC at 0, flags cleared and a stack at 0xFFF0.
pub fn fresh_cpu() -> Z80 {
    let mut cpu = Z80::new();
    cpu.set_pc(0);
    cpu.set_f(0);
    cpu.set_sp(0xFFF0);
    cpu
}

pub const FLAG_C: u8 = 0x01;
pub const FLAG_N: u8 = 0x02;
pub const FLAG_PV: u8 = 0x04;
pub const FLAG_H: u8 = 0x10;
pub const FLAG_Z: u8 = 0x40;
pub const FLAG_S: u8 = 0x80;
