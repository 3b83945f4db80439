use z80emu_core::cpu::z80::Z80;
mod common;
use common::*;

fn block_cpu(hl: u16, de: u16, bc: u16) -> Z80 {
    let mut cpu = fresh_cpu();
    cpu.set_hl(hl);
    cpu.set_de(de);
    cpu.set_bc(bc);
    cpu
}

// ============================================================
// LDI / LDD
// ============================================================

#[test]
fn test_ldi() {
    let mut cpu = block_cpu(0x1000, 0x2000, 3);
    let mut bus = TestBus::new();
    cpu.set_f(FLAG_C | FLAG_H | FLAG_N);
    bus.load(0, &[0xED, 0xA0]); // LDI
    bus.memory[0x1000] = 0x42;

    assert_eq!(run_instruction(&mut cpu, &mut bus), 2);
    assert_eq!(bus.memory[0x2000], 0x42, "Byte should be transferred");
    assert_eq!(cpu.get_hl(), 0x1001, "HL should be incremented");
    assert_eq!(cpu.get_de(), 0x2001, "DE should be incremented");
    assert_eq!(cpu.get_bc(), 0x0002, "BC should be decremented");
    assert_ne!(cpu.f() & FLAG_PV, 0, "PV should be set (BC != 0)");
    assert_eq!(cpu.f() & FLAG_N, 0, "N should be clear");
    assert_eq!(cpu.f() & FLAG_H, 0, "H should be clear");
    assert_ne!(cpu.f() & FLAG_C, 0, "C should be preserved");
}

#[test]
fn test_ldi_bc_reaches_zero() {
    let mut cpu = block_cpu(0x1000, 0x2000, 1);
    let mut bus = TestBus::new();
    bus.load(0, &[0xED, 0xA0]);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.get_bc(), 0x0000);
    assert_eq!(cpu.f() & FLAG_PV, 0, "PV should be clear (BC == 0)");
}

#[test]
fn test_ldd() {
    let mut cpu = block_cpu(0x1005, 0x2005, 3);
    let mut bus = TestBus::new();
    bus.load(0, &[0xED, 0xA8]); // LDD
    bus.memory[0x1005] = 0x77;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x2005], 0x77);
    assert_eq!(cpu.get_hl(), 0x1004, "HL should be decremented");
    assert_eq!(cpu.get_de(), 0x2004, "DE should be decremented");
    assert_eq!(cpu.get_bc(), 0x0002);
}

// ============================================================
// LDIR / LDDR
// ============================================================

#[test]
fn test_ldir_copies_block_in_one_step() {
    let mut cpu = block_cpu(0x1000, 0x2000, 3);
    let mut bus = TestBus::new();
    bus.load(0, &[0xED, 0xB0, 0x00]); // LDIR; NOP
    bus.load(0x1000, &[0x11, 0x22, 0x33, 0x44]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(&bus.memory[0x2000..0x2004], &[0x11, 0x22, 0x33, 0x00]);
    assert_eq!(cpu.get_hl(), 0x1003);
    assert_eq!(cpu.get_de(), 0x2003);
    assert_eq!(cpu.get_bc(), 0);
    assert_eq!(cpu.f() & FLAG_PV, 0, "PV clear once BC is exhausted");
    assert_eq!(cpu.pc(), 0x0002, "control returns after the whole block");
}

#[test]
fn test_lddr() {
    let mut cpu = block_cpu(0x1002, 0x2002, 3);
    let mut bus = TestBus::new();
    bus.load(0, &[0xED, 0xB8]); // LDDR
    bus.load(0x1000, &[0xAA, 0xBB, 0xCC]);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(&bus.memory[0x2000..0x2003], &[0xAA, 0xBB, 0xCC]);
    assert_eq!(cpu.get_hl(), 0x0FFF);
    assert_eq!(cpu.get_de(), 0x1FFF);
    assert_eq!(cpu.get_bc(), 0);
}

#[test]
fn test_ldir_overlapping_fill() {
    // Classic fill: copy each byte onto the next one
    let mut cpu = block_cpu(0x3000, 0x3001, 7);
    let mut bus = TestBus::new();
    bus.load(0, &[0xED, 0xB0]);
    bus.memory[0x3000] = 0xE5;
    run_instruction(&mut cpu, &mut bus);
    assert!(bus.memory[0x3000..0x3008].iter().all(|&b| b == 0xE5));
    assert_eq!(bus.memory[0x3008], 0x00);
}

// ============================================================
// CPI / CPD / CPIR / CPDR
// ============================================================

#[test]
fn test_cpi_match() {
    let mut cpu = block_cpu(0x4000, 0, 2);
    let mut bus = TestBus::new();
    cpu.set_a(0x55);
    cpu.set_f(FLAG_C);
    bus.load(0, &[0xED, 0xA1]); // CPI
    bus.memory[0x4000] = 0x55;
    run_instruction(&mut cpu, &mut bus);
    assert_ne!(cpu.f() & FLAG_Z, 0, "Z set on match");
    assert_ne!(cpu.f() & FLAG_N, 0, "N set");
    assert_ne!(cpu.f() & FLAG_PV, 0, "BC still non-zero");
    assert_ne!(cpu.f() & FLAG_C, 0, "C preserved");
    assert_eq!(cpu.get_hl(), 0x4001);
    assert_eq!(cpu.get_bc(), 1);
    assert_eq!(cpu.a(), 0x55, "A unchanged");
}

#[test]
fn test_cpd_no_match() {
    let mut cpu = block_cpu(0x4000, 0, 1);
    let mut bus = TestBus::new();
    cpu.set_a(0x10);
    bus.load(0, &[0xED, 0xA9]); // CPD
    bus.memory[0x4000] = 0x01;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.f() & FLAG_Z, 0);
    assert_ne!(cpu.f() & FLAG_H, 0, "borrow from bit 4");
    assert_eq!(cpu.f() & FLAG_PV, 0);
    assert_eq!(cpu.get_hl(), 0x3FFF);
}

#[test]
fn test_cpir_stops_on_match() {
    let mut cpu = block_cpu(0x4000, 0, 10);
    let mut bus = TestBus::new();
    cpu.set_a(0x33);
    bus.load(0, &[0xED, 0xB1]); // CPIR
    bus.load(0x4000, &[0x11, 0x22, 0x33, 0x44]);
    run_instruction(&mut cpu, &mut bus);
    assert_ne!(cpu.f() & FLAG_Z, 0, "found");
    assert_eq!(cpu.get_hl(), 0x4003, "HL points past the match");
    assert_eq!(cpu.get_bc(), 7);
    assert_ne!(cpu.f() & FLAG_PV, 0);
}

#[test]
fn test_cpir_exhausts_count() {
    let mut cpu = block_cpu(0x4000, 0, 4);
    let mut bus = TestBus::new();
    cpu.set_a(0x99);
    bus.load(0, &[0xED, 0xB1]);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.f() & FLAG_Z, 0, "not found");
    assert_eq!(cpu.get_bc(), 0);
    assert_eq!(cpu.f() & FLAG_PV, 0);
    assert_eq!(cpu.get_hl(), 0x4004);
}

#[test]
fn test_cpdr() {
    let mut cpu = block_cpu(0x4003, 0, 4);
    let mut bus = TestBus::new();
    cpu.set_a(0x11);
    bus.load(0, &[0xED, 0xB9]); // CPDR
    bus.load(0x4000, &[0x11, 0x22, 0x33, 0x44]);
    run_instruction(&mut cpu, &mut bus);
    assert_ne!(cpu.f() & FLAG_Z, 0);
    assert_eq!(cpu.get_hl(), 0x3FFF);
    assert_eq!(cpu.get_bc(), 0);
    assert_eq!(cpu.f() & FLAG_PV, 0, "match on the last item leaves BC = 0");
}
