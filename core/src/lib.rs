pub mod core;
pub mod cpu;

pub mod prelude {
    pub use crate::core::{Machine, Memory, MemoryBus, MemoryError, RunStatus, StopHandle};
    pub use crate::cpu::z80::{Executed, Flag, InstructionGroup, Reg8, Reg16, Trace, classify};
    pub use crate::cpu::{CpuStateTrait, Z80, Z80State};
}
