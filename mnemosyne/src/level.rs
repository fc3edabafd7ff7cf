//! Severity levels and the shared, atomically updated threshold.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI8, Ordering};
use std::sync::Arc;

/// Logging severity, ordered from least to most urgent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i8)]
pub enum Level {
    /// Verbose output, usually disabled in production
    Debug = -1,
    /// General operational messages
    #[default]
    Info = 0,
    /// Something unexpected that does not need immediate attention
    #[serde(alias = "warning")]
    Warn = 1,
    /// High-priority problems
    Error = 2,
    /// Panics in development mode, logs in production
    DPanic = 3,
    /// Logs, then panics the current thread
    Panic = 4,
    /// Logs, then terminates the process
    Fatal = 5,
    /// Sentinel above every real severity; as a threshold it disables logging
    Invalid = 6,
}

/// Minimum severity a freshly constructed facade emits.
pub const DEFAULT_LOG_LEVEL: Level = Level::Warn;

impl Level {
    /// The seven levels a record can actually be logged at.
    pub const ALL: [Level; 7] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::DPanic,
        Level::Panic,
        Level::Fatal,
    ];

    /// Lowercase name, as written by the default level encoding
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::DPanic => "dpanic",
            Self::Panic => "panic",
            Self::Fatal => "fatal",
            Self::Invalid => "invalid",
        }
    }

    /// Uppercase name, as written by the capital level encoding
    pub const fn as_capital_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::DPanic => "DPANIC",
            Self::Panic => "PANIC",
            Self::Fatal => "FATAL",
            Self::Invalid => "INVALID",
        }
    }

    fn from_i8(raw: i8) -> Self {
        match raw {
            -1 => Self::Debug,
            0 => Self::Info,
            1 => Self::Warn,
            2 => Self::Error,
            3 => Self::DPanic,
            4 => Self::Panic,
            5 => Self::Fatal,
            _ => Self::Invalid,
        }
    }

    /// Position in `Level::ALL`, used to index per-level tables
    pub(crate) fn index(self) -> usize {
        (self as i8 + 1) as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "dpanic" => Ok(Self::DPanic),
            "panic" => Ok(Self::Panic),
            "fatal" => Ok(Self::Fatal),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}

/// Shared minimum level.
///
/// Clones point at the same value, so a threshold handed to a core can be
/// raised or lowered later from any thread without locking.
#[derive(Clone, Debug)]
pub struct AtomicLevel {
    inner: Arc<AtomicI8>,
}

impl AtomicLevel {
    pub fn new(level: Level) -> Self {
        Self {
            inner: Arc::new(AtomicI8::new(level as i8)),
        }
    }

    pub fn level(&self) -> Level {
        Level::from_i8(self.inner.load(Ordering::Acquire))
    }

    pub fn set_level(&self, level: Level) {
        self.inner.store(level as i8, Ordering::Release);
    }

    /// Whether a record at `level` passes the current threshold
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }
}

impl Default for AtomicLevel {
    fn default() -> Self {
        Self::new(Level::default())
    }
}

impl From<Level> for AtomicLevel {
    fn from(level: Level) -> Self {
        Self::new(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered_by_severity() {
        let mut sorted = Level::ALL;
        sorted.sort();
        assert_eq!(sorted, Level::ALL);
        assert!(Level::Fatal < Level::Invalid);
        assert!(Level::Debug < Level::Info);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("debug".parse::<Level>().unwrap(), Level::Debug);
        assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("DPanic".parse::<Level>().unwrap(), Level::DPanic);
        assert_eq!("fatal".parse::<Level>().unwrap(), Level::Fatal);

        let err = "loud".parse::<Level>().unwrap_err();
        assert!(matches!(err, Error::InvalidLevel(ref s) if s == "loud"));
    }

    #[test]
    fn test_level_names() {
        assert_eq!(Level::DPanic.to_string(), "dpanic");
        assert_eq!(Level::Warn.as_capital_str(), "WARN");
        assert_eq!(Level::Invalid.as_str(), "invalid");
    }

    #[test]
    fn test_level_index_covers_real_levels() {
        for (i, level) in Level::ALL.iter().enumerate() {
            assert_eq!(level.index(), i);
        }
    }

    #[test]
    fn test_atomic_level_shared_between_clones() {
        let level = AtomicLevel::new(DEFAULT_LOG_LEVEL);
        let other = level.clone();
        assert!(!level.enabled(Level::Info));
        assert!(level.enabled(Level::Warn));

        other.set_level(Level::Debug);
        assert_eq!(level.level(), Level::Debug);
        assert!(level.enabled(Level::Debug));
    }

    #[test]
    fn test_invalid_threshold_disables_everything() {
        let level = AtomicLevel::new(Level::Invalid);
        for l in Level::ALL {
            assert!(!level.enabled(l));
        }
    }

    #[test]
    fn test_level_serde() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: Level,
        }
        let parsed: Wrapper = toml::from_str("level = \"dpanic\"").unwrap();
        assert_eq!(parsed.level, Level::DPanic);
        let parsed: Wrapper = toml::from_str("level = \"warning\"").unwrap();
        assert_eq!(parsed.level, Level::Warn);
    }
}
