//! Optional TOML settings for the monitor.
//!
//! Looked up at `<config dir>/z80emu/config.toml` unless a path is given on
//! the command line. Every key is optional; command-line flags win over the
//! file.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// 64 KiB minus one, the size the monitor has always defaulted to.
pub const DEFAULT_MEMORY_SIZE: usize = 0xFFFF;

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub memory: MemoryConfig,
    pub run: RunConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    pub size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_MEMORY_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Address `run` starts from when none is given.
    pub entry: u16,
    /// Instruction budget per run; 0 means unlimited.
    pub max_steps: u64,
    /// Pause between instructions, in microseconds.
    pub delay_us: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid config {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// `<config dir>/z80emu/config.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("z80emu").join("config.toml"))
}

impl Config {
    /// Load settings. An explicit `path` must exist; a missing file at the
    /// default location just yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text).map_err(|source| ConfigError::Parse { path, source }),
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Budget for the machine, with 0 meaning none.
    pub fn max_steps(&self) -> Option<u64> {
        (self.run.max_steps > 0).then_some(self.run.max_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.memory.size, DEFAULT_MEMORY_SIZE);
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.max_steps(), None);
    }

    #[test]
    fn parses_all_sections() {
        let config = Config::parse(
            r#"
            [memory]
            size = 32768

            [run]
            entry = 0x0100
            max_steps = 5000
            delay_us = 250

            [log]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.memory.size, 0x8000);
        assert_eq!(config.run.entry, 0x0100);
        assert_eq!(config.max_steps(), Some(5000));
        assert_eq!(config.run.delay_us, 250);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = Config::parse("[run]\ndelay_us = 10\n").unwrap();
        assert_eq!(config.run.delay_us, 10);
        assert_eq!(config.run.entry, 0);
        assert_eq!(config.memory.size, DEFAULT_MEMORY_SIZE);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Config::parse("[memory]\nsise = 10\n").is_err());
        assert!(Config::parse("[video]\nscale = 2\n").is_err());
    }

    #[test]
    fn rejects_entry_out_of_range() {
        assert!(Config::parse("[run]\nentry = 0x10000\n").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("z80emu_config_test_missing.toml");
        let _ = std::fs::remove_file(&path);
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let path = std::env::temp_dir().join("z80emu_config_test_bad.toml");
        std::fs::write(&path, "[memory]\nsize = \"big\"\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("z80emu_config_test_bad.toml"));
        std::fs::remove_file(&path).unwrap();
    }
}
