use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::core::memory::{Memory, MemoryError};
use crate::cpu::z80::{Executed, Z80};

/// Why a run loop returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The program executed HALT.
    Halted,
    /// A stop was requested or the instruction budget ran out.
    Stopped,
}

impl RunStatus {
    /// Numeric status: 0 for a normal halt, -1 otherwise.
    pub fn code(self) -> i32 {
        match self {
            RunStatus::Halted => 0,
            RunStatus::Stopped => -1,
        }
    }
}

/// Cooperative stop request, checked between instructions.
///
/// Clones share the same flag, so one can be handed to another thread
/// (e.g. a Ctrl-C handler) while the machine runs.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Drop a request nobody has acted on yet.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Clear a pending request, returning whether one was pending.
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// A Z80 wired to its own flat memory.
pub struct Machine {
    pub cpu: Z80,
    pub memory: Memory,
    stop: StopHandle,
    max_steps: Option<u64>,
}

impl Machine {
    /// Build a machine with `memory_size` bytes of zeroed RAM.
    pub fn new(memory_size: usize) -> Result<Self, MemoryError> {
        Ok(Self::with_memory(Memory::new(memory_size)?))
    }

    pub fn with_memory(memory: Memory) -> Self {
        Self {
            cpu: Z80::new(),
            memory,
            stop: StopHandle::default(),
            max_steps: None,
        }
    }

    /// Limit each run to `steps` instructions (`None` = unlimited).
    pub fn set_max_steps(&mut self, steps: Option<u64>) {
        self.max_steps = steps;
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Copy a program image into memory at `offset`.
    pub fn load_program(&mut self, offset: usize, data: &[u8]) -> Result<(), MemoryError> {
        self.memory.load_at(offset, data)?;
        debug!("loaded {} bytes at {:04X}", data.len(), offset);
        Ok(())
    }

    /// Point PC at `addr` with a fresh stack at the top of memory.
    pub fn start_at(&mut self, addr: u16) {
        self.cpu.set_pc(addr);
        // 64 KiB of RAM puts SP at 0x0000, so the first push lands at 0xFFFF
        self.cpu.set_sp(self.memory.size() as u16);
        self.cpu.halted = false;
    }

    /// Start executing at `addr` with a fresh stack at the top of memory.
    pub fn run_from(&mut self, addr: u16) -> RunStatus {
        self.start_at(addr);
        self.run_until_halt()
    }

    /// Execute from the current PC until HALT, a stop request or the budget.
    pub fn run_until_halt(&mut self) -> RunStatus {
        self.run_observed(|_| {})
    }

    /// Like [`run_until_halt`](Self::run_until_halt), calling `observe`
    /// with the CPU after every instruction.
    pub fn run_observed<F: FnMut(&Z80)>(&mut self, mut observe: F) -> RunStatus {
        debug!("run from {:04X}", self.cpu.pc());
        let mut steps: u64 = 0;
        let status = loop {
            if self.cpu.halted {
                break RunStatus::Halted;
            }
            if self.stop.take() {
                break RunStatus::Stopped;
            }
            if self.max_steps.is_some_and(|max| steps >= max) {
                break RunStatus::Stopped;
            }
            self.cpu.step(&mut self.memory);
            steps += 1;
            observe(&self.cpu);
        };
        debug!("{:?} at {:04X} after {} instructions", status, self.cpu.pc(), steps);
        status
    }

    /// Execute exactly one instruction, resuming from HALT if needed.
    /// Returns true if the instruction halted the CPU.
    pub fn step(&mut self) -> bool {
        self.cpu.halted = false;
        self.cpu.step(&mut self.memory);
        self.cpu.halted
    }

    pub fn last_executed(&self) -> Option<Executed> {
        self.cpu.trace().last
    }
}
