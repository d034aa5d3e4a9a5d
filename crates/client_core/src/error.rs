use shared::{
    domain::TaskId,
    error::{Classified, ErrorCode},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskStoreError {
    #[error("invalid task: {0}")]
    Validation(String),
    #[error("task {0} not found")]
    NotFound(TaskId),
}

impl Classified for TaskStoreError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::Validation,
            Self::NotFound(_) => ErrorCode::NotFound,
        }
    }
}

/// Storage failure. Never fatal: the in-memory task list stays authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("failed to read snapshot from {slot}: {reason}")]
    Read { slot: String, reason: String },
    #[error("snapshot in {slot} is malformed: {reason}")]
    Malformed { slot: String, reason: String },
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
    #[error("failed to write snapshot to {slot}: {reason}")]
    Write { slot: String, reason: String },
}

impl Classified for PersistenceError {
    fn code(&self) -> ErrorCode {
        ErrorCode::Persistence
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("response from {url} could not be decoded: {reason}")]
    Decode { url: String, reason: String },
}

impl Classified for NetworkError {
    fn code(&self) -> ErrorCode {
        ErrorCode::Network
    }
}
