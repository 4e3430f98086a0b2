//! # Framework Errors
//!
//! Errors raised by the engine layer itself. Command *failures* are not errors here:
//! a command that exits non-zero is a normal [`CommandOutput`](super::CommandOutput)
//! and the caller decides what it means.

/// Errors that can occur inside the engine (spawning, transport).
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FrameworkError {
    #[error("Failed to spawn `{program}`: {reason}")]
    Spawn { program: String, reason: String },
    #[error("HTTP request to {url} failed: {reason}")]
    Http { url: String, reason: String },
    #[error("Malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },
}
