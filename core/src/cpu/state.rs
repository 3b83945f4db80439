//! CPU state snapshot types and traits

/// Trait for CPU types that can provide state snapshots
pub trait CpuStateTrait {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;
}

/// Z80 CPU state snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Z80State {
    pub af: u16,       // Accumulator and flags
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub af_prime: u16, // Shadow set
    pub bc_prime: u16,
    pub de_prime: u16,
    pub hl_prime: u16,
    pub ix: u16,       // Index register X
    pub iy: u16,       // Index register Y
    pub sp: u16,       // Stack pointer
    pub pc: u16,       // Program counter
    pub i: u8,         // Interrupt vector register
    pub r: u8,         // Memory refresh register
    pub iff1: bool,    // Interrupt flip-flop 1
    pub iff2: bool,    // Interrupt flip-flop 2
    pub im: u8,        // Interrupt mode (0, 1, 2)
    pub halted: bool,
}
