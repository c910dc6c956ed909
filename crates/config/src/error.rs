use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// TOML / JSON parse or deserialization error.
    Parse(String),
    /// File could not be read.
    Io(String),
    /// Parsed fine, but the values cannot be used together.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
