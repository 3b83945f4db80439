//! Moving binary images between files and machine memory.

use std::fmt;
use std::path::{Path, PathBuf};

use z80emu_core::core::{Machine, Memory, MemoryError};

#[derive(Debug)]
pub enum ProgramError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file had no bytes to load.
    Empty(PathBuf),
    Memory(MemoryError),
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            ProgramError::Empty(path) => write!(f, "no data read from file: {}", path.display()),
            ProgramError::Memory(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ProgramError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProgramError::Io { source, .. } => Some(source),
            ProgramError::Empty(_) => None,
            ProgramError::Memory(e) => Some(e),
        }
    }
}

impl From<MemoryError> for ProgramError {
    fn from(e: MemoryError) -> Self {
        ProgramError::Memory(e)
    }
}

/// Load a binary file at `addr`. Bytes that would run past the end of
/// memory are dropped. Returns the number of bytes loaded.
pub fn load_file(machine: &mut Machine, path: &Path, addr: u16) -> Result<usize, ProgramError> {
    let data = std::fs::read(path).map_err(|source| ProgramError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if data.is_empty() {
        return Err(ProgramError::Empty(path.to_path_buf()));
    }

    let offset = addr as usize;
    let room = machine.memory.size().saturating_sub(offset);
    if room == 0 {
        return Err(MemoryError::OutOfRange {
            offset,
            len: data.len(),
            size: machine.memory.size(),
        }
        .into());
    }
    let len = data.len().min(room);
    machine.load_program(offset, &data[..len])?;
    Ok(len)
}

/// Write `len` bytes starting at `addr` to a file, clamped to the end of
/// memory. Returns the number of bytes written.
pub fn dump_file(memory: &Memory, path: &Path, addr: u16, len: usize) -> Result<usize, ProgramError> {
    let bytes = memory.slice(addr as usize, len);
    std::fs::write(path, bytes).map_err(|source| ProgramError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use z80emu_core::core::MemoryBus;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("z80emu_program_test_{name}"))
    }

    #[test]
    fn load_places_bytes_at_address() {
        let path = temp_path("load.bin");
        std::fs::write(&path, [0x3E, 0x01, 0x76]).unwrap();

        let mut m = Machine::new(0x1000).unwrap();
        assert_eq!(load_file(&mut m, &path, 0x0100).unwrap(), 3);
        assert_eq!(m.memory.read(0x0100), 0x3E);
        assert_eq!(m.memory.read(0x0102), 0x76);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn load_truncates_at_end_of_memory() {
        let path = temp_path("truncate.bin");
        std::fs::write(&path, [0xAA; 8]).unwrap();

        let mut m = Machine::new(0x100).unwrap();
        assert_eq!(load_file(&mut m, &path, 0x00FC).unwrap(), 4);
        assert_eq!(m.memory.read(0x00FF), 0xAA);
        assert_eq!(m.memory.read(0x0000), 0x00, "no wraparound on load");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn load_rejects_empty_and_missing_files() {
        let path = temp_path("empty.bin");
        std::fs::write(&path, []).unwrap();
        let mut m = Machine::new(0x100).unwrap();
        assert!(matches!(load_file(&mut m, &path, 0), Err(ProgramError::Empty(_))));
        std::fs::remove_file(&path).unwrap();

        let missing = temp_path("missing.bin");
        let _ = std::fs::remove_file(&missing);
        assert!(matches!(load_file(&mut m, &missing, 0), Err(ProgramError::Io { .. })));
    }

    #[test]
    fn load_past_end_of_memory_fails() {
        let path = temp_path("past_end.bin");
        std::fs::write(&path, [1]).unwrap();
        let mut m = Machine::new(0x100).unwrap();
        assert!(matches!(
            load_file(&mut m, &path, 0x0100),
            Err(ProgramError::Memory(MemoryError::OutOfRange { .. }))
        ));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn dump_clamps_length() {
        let path = temp_path("dump.bin");
        let mut mem = Memory::new(0x20).unwrap();
        mem.write(0x1E, 0x12);
        mem.write(0x1F, 0x34);

        assert_eq!(dump_file(&mem, &path, 0x1E, 100).unwrap(), 2);
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x12, 0x34]);

        std::fs::remove_file(&path).unwrap();
    }
}
