use std::error::Error;
use std::fmt;

use crate::error::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    Io,
    Parse,
    /// Every record decoded but a trailing checksum disagreed.
    Corrupt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for CoreError {}

impl From<LoadError> for CoreError {
    fn from(err: LoadError) -> Self {
        let code = if err.is_corrupt() {
            CoreErrorCode::Corrupt
        } else if err.kind() == crate::error::ErrorKind::Io {
            CoreErrorCode::Io
        } else {
            CoreErrorCode::Parse
        };
        Self::new(code, err.to_string())
    }
}
