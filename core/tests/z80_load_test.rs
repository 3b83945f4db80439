use z80emu_core::cpu::z80::{Reg8, Reg16};
mod common;
use common::*;

// ============================================================
// 8-bit loads
// ============================================================

#[test]
fn test_ld_r_n_all_registers() {
    let regs = [Reg8::B, Reg8::C, Reg8::D, Reg8::E, Reg8::H, Reg8::L, Reg8::A];
    let opcodes = [0x06, 0x0E, 0x16, 0x1E, 0x26, 0x2E, 0x3E];
    for (reg, op) in regs.into_iter().zip(opcodes) {
        let mut cpu = fresh_cpu();
        let mut bus = TestBus::new();
        bus.load(0, &[op, 0x5C]);
        assert_eq!(run_instruction(&mut cpu, &mut bus), 2);
        assert_eq!(cpu.regs.get8(reg), 0x5C, "{reg:?}");
    }
}

#[test]
fn test_ld_r_r() {
    let mut cpu = fresh_cpu();
    let mut bus = TestBus::new();
    cpu.regs.set8(Reg8::E, 0x99);
    bus.load(0, &[0x7B, 0x47]); // LD A,E; LD B,A
    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.get8(Reg8::B), 0x99);
    assert_eq!(cpu.f(), 0, "loads do not touch flags");
}

#[test]
fn test_ld_r_hl_and_hl_r() {
    let mut cpu = fresh_cpu();
    let mut bus = TestBus::new();
    cpu.set_hl(0x7000);
    bus.memory[0x7000] = 0x21;
    cpu.regs.set8(Reg8::C, 0x43);
    bus.load(0, &[0x56, 0x71]); // LD D,(HL); LD (HL),C
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.get8(Reg8::D), 0x21);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x7000], 0x43);
}

#[test]
fn test_ld_hl_n() {
    let mut cpu = fresh_cpu();
    let mut bus = TestBus::new();
    cpu.set_hl(0x7001);
    bus.load(0, &[0x36, 0xAB]); // LD (HL),0xAB
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x7001], 0xAB);
}

#[test]
fn test_ld_a_indirect() {
    let mut cpu = fresh_cpu();
    let mut bus = TestBus::new();
    cpu.set_bc(0x1111);
    cpu.set_de(0x2222);
    bus.memory[0x1111] = 0x01;
    bus.memory[0x2222] = 0x02;
    bus.load(0, &[0x0A, 0x12, 0x1A, 0x02]); // LD A,(BC); LD (DE),A; LD A,(DE); LD (BC),A
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a(), 0x01);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x2222], 0x01);
    bus.memory[0x2222] = 0x07;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a(), 0x07);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x1111], 0x07);
}

#[test]
fn test_ld_a_nn_and_nn_a() {
    let mut cpu = fresh_cpu();
    let mut bus = TestBus::new();
    bus.memory[0x4321] = 0x66;
    bus.load(0, &[0x3A, 0x21, 0x43, 0x32, 0x00, 0x50]); // LD A,(0x4321); LD (0x5000),A
    assert_eq!(run_instruction(&mut cpu, &mut bus), 3);
    assert_eq!(cpu.a(), 0x66);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x5000], 0x66);
}

// ============================================================
// 16-bit loads
// ============================================================

#[test]
fn test_ld_rr_nn_little_endian() {
    let mut cpu = fresh_cpu();
    let mut bus = TestBus::new();
    bus.load(0, &[0x01, 0x34, 0x12, 0x11, 0x78, 0x56, 0x21, 0xBC, 0x9A, 0x31, 0xF0, 0xDE]);
    for _ in 0..4 {
        run_instruction(&mut cpu, &mut bus);
    }
    assert_eq!(cpu.get_bc(), 0x1234);
    assert_eq!(cpu.get_de(), 0x5678);
    assert_eq!(cpu.get_hl(), 0x9ABC);
    assert_eq!(cpu.sp(), 0xDEF0);
}

#[test]
fn test_ld_hl_mem_round_trip() {
    let mut cpu = fresh_cpu();
    let mut bus = TestBus::new();
    cpu.set_hl(0xCAFE);
    bus.load(0, &[0x22, 0x00, 0x60, 0x21, 0x00, 0x00, 0x2A, 0x00, 0x60]);
    run_instruction(&mut cpu, &mut bus); // LD (0x6000),HL
    assert_eq!(bus.memory[0x6000], 0xFE);
    assert_eq!(bus.memory[0x6001], 0xCA);
    run_instruction(&mut cpu, &mut bus); // LD HL,0
    run_instruction(&mut cpu, &mut bus); // LD HL,(0x6000)
    assert_eq!(cpu.get_hl(), 0xCAFE);
}

#[test]
fn test_ld_sp_hl() {
    let mut cpu = fresh_cpu();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4455);
    bus.load(0, &[0xF9]);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.sp(), 0x4455);
}

// ============================================================
// Exchanges
// ============================================================

#[test]
fn test_ex_de_hl() {
    let mut cpu = fresh_cpu();
    let mut bus = TestBus::new();
    cpu.set_de(0x1111);
    cpu.set_hl(0x2222);
    bus.load(0, &[0xEB]);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.get_de(), 0x2222);
    assert_eq!(cpu.get_hl(), 0x1111);
}

#[test]
fn test_ex_af_round_trip() {
    let mut cpu = fresh_cpu();
    let mut bus = TestBus::new();
    cpu.set_af(0x1234);
    cpu.regs.set_shadow(Reg16::AF, 0x5678);
    bus.load(0, &[0x08, 0x08]);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.get_af(), 0x5678);
    assert_eq!(cpu.regs.get_shadow(Reg16::AF), 0x1234);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.get_af(), 0x1234);
}

#[test]
fn test_exx_round_trip() {
    let mut cpu = fresh_cpu();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0102);
    cpu.set_de(0x0304);
    cpu.set_hl(0x0506);
    cpu.regs.set_shadow(Reg16::BC, 0xA1A2);
    cpu.regs.set_shadow(Reg16::DE, 0xB1B2);
    cpu.regs.set_shadow(Reg16::HL, 0xC1C2);
    bus.load(0, &[0xD9, 0xD9]);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.get_bc(), 0xA1A2);
    assert_eq!(cpu.get_de(), 0xB1B2);
    assert_eq!(cpu.get_hl(), 0xC1C2);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.get_bc(), 0x0102);
    assert_eq!(cpu.get_de(), 0x0304);
    assert_eq!(cpu.get_hl(), 0x0506);
}

#[test]
fn test_ex_sp_hl() {
    let mut cpu = fresh_cpu();
    let mut bus = TestBus::new();
    cpu.set_sp(0x8000);
    cpu.set_hl(0x1234);
    bus.load(0x8000, &[0x78, 0x56]);
    bus.load(0, &[0xE3]); // EX (SP),HL
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.get_hl(), 0x5678);
    assert_eq!(bus.memory[0x8000], 0x34);
    assert_eq!(bus.memory[0x8001], 0x12);
    assert_eq!(cpu.sp(), 0x8000);
}
