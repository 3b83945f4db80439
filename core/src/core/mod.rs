pub mod bus;
pub mod machine;
pub mod memory;

pub use bus::MemoryBus;
pub use machine::{Machine, RunStatus, StopHandle};
pub use memory::{MAX_MEMORY_SIZE, Memory, MemoryError};
