//! Error taxonomy shared by the store, the persistence layer and the CLI.
//!
//! Validation and not-found errors are raised before anything is mutated, so a
//! caller can surface them and retry. Storage errors leave the in-memory state
//! as it was after the mutation; only durability is affected.

use thiserror::Error;

pub type GoalResult<T> = Result<T, GoalError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GoalError {
    /// Malformed or missing required input (title, name, text, duration, date).
    #[error("invalid input: {0}")]
    Validation(String),
    /// Reference to an identity that is not in the addressed collection.
    #[error("not found: {0}")]
    NotFound(String),
    /// Persistence failed: capacity, I/O or serialization.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl GoalError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Short kind name used in CLI diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not-found",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<std::io::Error> for GoalError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<serde_json::Error> for GoalError {
    fn from(value: serde_json::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_and_json_errors_are_storage_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(GoalError::from(io).kind(), "storage");

        let json = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(GoalError::from(json), GoalError::Storage(_)));
    }

    #[test]
    fn display_carries_message() {
        let err = GoalError::validation("title cannot be empty");
        assert_eq!(err.to_string(), "invalid input: title cannot be empty");
    }
}
