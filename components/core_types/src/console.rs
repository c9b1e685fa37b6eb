//! Captured console output.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The console method a message was logged through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    /// `console.log`
    Log,
    /// `console.info`
    Info,
    /// `console.warn`
    Warn,
    /// `console.error`
    Error,
    /// `console.debug`
    Debug,
}

impl ConsoleLevel {
    /// All intercepted levels, in shim installation order
    pub const ALL: [ConsoleLevel; 5] = [
        ConsoleLevel::Log,
        ConsoleLevel::Info,
        ConsoleLevel::Warn,
        ConsoleLevel::Error,
        ConsoleLevel::Debug,
    ];

    /// The console method name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
            ConsoleLevel::Debug => "debug",
        }
    }

    /// Parse a console method name
    pub fn parse(name: &str) -> Option<ConsoleLevel> {
        ConsoleLevel::ALL.into_iter().find(|level| level.as_str() == name)
    }
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A run of identical consecutive console messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleLog {
    /// Console method
    pub level: ConsoleLevel,
    /// Formatted message text
    pub message: String,
    /// How many consecutive times it was logged
    pub count: u32,
}

impl ConsoleLog {
    /// True if `level`/`message` would coalesce into this entry
    pub fn matches(&self, level: ConsoleLevel, message: &str) -> bool {
        self.level == level && self.message == message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse_round_trips_names() {
        for level in ConsoleLevel::ALL {
            assert_eq!(ConsoleLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(ConsoleLevel::parse("trace"), None);
    }
}
