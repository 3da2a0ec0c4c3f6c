//! Error types shared across the Brot crates.

use std::time::Duration;
use thiserror::Error;

use crate::arg::ArgKind;
use crate::catalog::ActionKey;

/// An argument string that could not be turned into a typed value.
///
/// Surfaced to the argument-collection UI as a message; never panics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} argument: {message}")]
pub struct ParseError {
    /// Kind the raw string was parsed as.
    pub kind: ArgKind,

    /// Human-readable reason.
    pub message: String,
}

impl ParseError {
    /// Create a parse error for the given kind.
    pub fn new(kind: ArgKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Errors raised while building or extending a partial action.
///
/// Dispatch itself never fails; these only occur at the boundary where
/// arguments are appended.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    /// The key is not part of the action catalog.
    #[error("Unknown action: {0}")]
    UnknownKey(String),

    /// More arguments were supplied than the signature allows.
    #[error("Action '{key}' takes {expected} argument(s)")]
    TooManyArgs { key: ActionKey, expected: usize },

    /// An argument of the wrong kind was appended.
    #[error("Action '{key}' expects {expected} at position {index}, got {found}")]
    KindMismatch {
        key: ActionKey,
        index: usize,
        expected: ArgKind,
        found: ArgKind,
    },

    /// A raw argument failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Backend errors - failures of the transport to the remote index.
///
/// These are propagated to the caller and never retried here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The request could not be delivered or answered.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote side did not answer in time.
    #[error("Backend timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// The backend has shut down.
    #[error("Backend closed")]
    Closed,

    /// The palette key is not known to the backend.
    #[error("Unknown palette: {0}")]
    UnknownPalette(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config directory found.
    #[error("Config directory not found")]
    NoConfigDir,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid shortcut chord.
    #[error("Invalid shortcut: {0}")]
    InvalidShortcut(String),
}
