use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    NotFound,
    Network,
    Persistence,
}

impl ErrorCode {
    /// Whether re-issuing the same operation can succeed without changing the input.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Persistence)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Network => "network",
            Self::Persistence => "persistence",
        };
        f.write_str(name)
    }
}

/// Implemented by the typed errors of the core so they can be surfaced uniformly.
pub trait Classified: std::error::Error {
    fn code(&self) -> ErrorCode;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn from_error<E: Classified>(err: &E) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
