use std::fmt;

use crate::core::MemoryBus;

/// Largest store a 16-bit address bus can reach.
pub const MAX_MEMORY_SIZE: usize = 0x1_0000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Requested size is zero or larger than the address space.
    InvalidSize(usize),
    /// The backing buffer could not be allocated.
    Allocation(usize),
    /// A bulk load would run past the end of the store.
    OutOfRange { offset: usize, len: usize, size: usize },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::InvalidSize(size) => write!(
                f,
                "invalid memory size {size} (expected 1..={MAX_MEMORY_SIZE})"
            ),
            MemoryError::Allocation(size) => {
                write!(f, "failed to allocate {size} bytes of memory")
            }
            MemoryError::OutOfRange { offset, len, size } => write!(
                f,
                "{len} bytes at {offset:#06X} exceed memory size {size:#06X}"
            ),
        }
    }
}

impl std::error::Error for MemoryError {}

/// Flat, zero-initialised RAM of a fixed size chosen at startup.
///
/// Every access reduces the address modulo the size, so a store smaller
/// than 64 KiB behaves as a mirrored window rather than a fault.
#[derive(Clone)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    pub fn new(size: usize) -> Result<Self, MemoryError> {
        if size == 0 || size > MAX_MEMORY_SIZE {
            return Err(MemoryError::InvalidSize(size));
        }
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| MemoryError::Allocation(size))?;
        data.resize(size, 0);
        Ok(Self { data })
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Copy `bytes` verbatim into memory starting at `offset`.
    pub fn load_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), MemoryError> {
        let size = self.size();
        match offset.checked_add(bytes.len()) {
            Some(end) if end <= size => {
                self.data[offset..end].copy_from_slice(bytes);
                Ok(())
            }
            _ => Err(MemoryError::OutOfRange {
                offset,
                len: bytes.len(),
                size,
            }),
        }
    }

    /// Borrow up to `len` bytes starting at `addr`, clamped to the end of memory.
    pub fn slice(&self, addr: usize, len: usize) -> &[u8] {
        let start = addr.min(self.size());
        let end = start.saturating_add(len).min(self.size());
        &self.data[start..end]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn index(&self, addr: u16) -> usize {
        addr as usize % self.data.len()
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory").field("size", &self.size()).finish()
    }
}

impl MemoryBus for Memory {
    fn read(&mut self, addr: u16) -> u8 {
        self.data[self.index(addr)]
    }

    fn write(&mut self, addr: u16, data: u8) {
        let index = self.index(addr);
        self.data[index] = data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_memory_is_zeroed() {
        let mem = Memory::new(0x100).unwrap();
        assert_eq!(mem.size(), 0x100);
        assert!(mem.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn rejects_bad_sizes() {
        assert_eq!(Memory::new(0).unwrap_err(), MemoryError::InvalidSize(0));
        assert_eq!(
            Memory::new(MAX_MEMORY_SIZE + 1).unwrap_err(),
            MemoryError::InvalidSize(MAX_MEMORY_SIZE + 1)
        );
        assert!(Memory::new(MAX_MEMORY_SIZE).is_ok());
    }

    #[test]
    fn accesses_wrap_modulo_size() {
        let mut mem = Memory::new(0x1000).unwrap();
        mem.write(0x1005, 0xAB);
        assert_eq!(mem.read(0x0005), 0xAB);
        assert_eq!(mem.read(0xF005), 0xAB);
    }

    #[test]
    fn load_at_copies_and_bounds_checks() {
        let mut mem = Memory::new(0x10).unwrap();
        mem.load_at(0x0C, &[1, 2, 3, 4]).unwrap();
        assert_eq!(mem.slice(0x0C, 4), &[1, 2, 3, 4]);

        let err = mem.load_at(0x0D, &[1, 2, 3, 4]).unwrap_err();
        assert_eq!(
            err,
            MemoryError::OutOfRange {
                offset: 0x0D,
                len: 4,
                size: 0x10
            }
        );
        // A failed load leaves memory untouched
        assert_eq!(mem.read(0x0D), 2);
    }

    #[test]
    fn slice_clamps_to_end() {
        let mem = Memory::new(0x10).unwrap();
        assert_eq!(mem.slice(0x0E, 8).len(), 2);
        assert!(mem.slice(0x20, 8).is_empty());
    }

    #[test]
    fn word_access_is_little_endian() {
        let mut mem = Memory::new(MAX_MEMORY_SIZE).unwrap();
        mem.write_word(0xFFFF, 0x1234);
        assert_eq!(mem.read(0xFFFF), 0x34);
        assert_eq!(mem.read(0x0000), 0x12);
        assert_eq!(mem.read_word(0xFFFF), 0x1234);
    }
}
