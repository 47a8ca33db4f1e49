//! Error types for codebrief.
//!
//! Only a root that is missing or cannot be listed aborts a run.
//! Unreadable files, parse failures and a broken ignore file are reported
//! inside the digest instead.

use std::path::PathBuf;

use crate::report::OutputError;
use crate::walker::WalkError;

/// Top-level error type for codebrief operations.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("walk error: {0}")]
    Walk(WalkError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

impl From<WalkError> for DigestError {
    fn from(error: WalkError) -> Self {
        match error {
            WalkError::NotFound { path } => DigestError::PathNotFound(path),
            other => DigestError::Walk(other),
        }
    }
}

/// Map an error to its exit code.
pub fn exit_code(error: &DigestError) -> i32 {
    match error {
        DigestError::PathNotFound(_) => 3,
        DigestError::Walk(_) => 2,
        DigestError::Output(_) => 1,
    }
}
