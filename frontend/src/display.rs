//! Text rendering for the monitor: registers, memory windows, trace lines.

use std::fmt::Write;

use z80emu_core::core::Memory;
use z80emu_core::cpu::z80::{Reg8, Reg16, Z80};

const FLAG_NAMES: &[u8; 8] = b"SZ5H3PNC";

/// F as eight characters, one per bit from 7 down to 0; `.` when clear.
pub fn flags(f: u8) -> String {
    FLAG_NAMES
        .iter()
        .enumerate()
        .map(|(i, &name)| if f & (0x80 >> i) != 0 { name as char } else { '.' })
        .collect()
}

pub fn registers(cpu: &Z80) -> String {
    let r = &cpu.regs;
    let mut s = String::new();
    let _ = writeln!(
        s,
        "AF={:04X} BC={:04X} DE={:04X} HL={:04X} IX={:04X} IY={:04X}",
        r.get16(Reg16::AF),
        r.get16(Reg16::BC),
        r.get16(Reg16::DE),
        r.get16(Reg16::HL),
        r.get16(Reg16::IX),
        r.get16(Reg16::IY),
    );
    let _ = writeln!(
        s,
        "AF'={:04X} BC'={:04X} DE'={:04X} HL'={:04X} SP={:04X} PC={:04X}",
        r.get_shadow(Reg16::AF),
        r.get_shadow(Reg16::BC),
        r.get_shadow(Reg16::DE),
        r.get_shadow(Reg16::HL),
        r.get16(Reg16::SP),
        r.get16(Reg16::PC),
    );
    let _ = write!(
        s,
        "I={:02X} R={:02X} IM={} IFF1={} IFF2={} F={}{}",
        r.get8(Reg8::I),
        r.get8(Reg8::R),
        cpu.im,
        cpu.iff1 as u8,
        cpu.iff2 as u8,
        flags(r.flags()),
        if cpu.halted { " HALTED" } else { "" },
    );
    s
}

/// Two 16-byte rows starting at `addr` rounded down to a 16-byte boundary,
/// as hex and printable ASCII. Addresses wrap like the bus does.
pub fn memory_window(memory: &Memory, addr: u16) -> String {
    let bytes = memory.as_slice();
    let base = addr & 0xFFF0;
    let mut s = String::new();

    for row in 0..2u16 {
        let row_addr = base.wrapping_add(row * 16);
        let row_bytes: Vec<u8> = (0..16u16)
            .map(|col| bytes[row_addr.wrapping_add(col) as usize % bytes.len()])
            .collect();

        let _ = write!(s, "  {row_addr:04X}  ");
        for b in &row_bytes {
            let _ = write!(s, "{b:02X} ");
        }
        s.push_str(" |");
        s.extend(row_bytes.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' }
        }));
        s.push_str("|\n");
    }
    s
}

/// One line per executed instruction: address, mnemonic, data accesses.
pub fn step_line(cpu: &Z80) -> String {
    let trace = cpu.trace();
    let Some(executed) = trace.last else {
        return String::new();
    };
    let mut s = format!("{:04X}  {:<20}", executed.pc, executed.to_string());
    if let Some(addr) = trace.last_read {
        let _ = write!(s, " R:{addr:04X}");
    }
    if let Some(addr) = trace.last_write {
        let _ = write!(s, " W:{addr:04X}");
    }
    s.truncate(s.trim_end().len());
    s
}
