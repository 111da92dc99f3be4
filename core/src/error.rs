//! Error types for command tree construction and parsing.
//!
//! Covers construction faults (bad command names, bad flag definitions),
//! the two terminal parse outcomes (help request and flag fault), and the
//! I/O and serialization failures of the [`Options`](crate::Options) store.

use thiserror::Error;

use crate::flags::FlagError;

/// Errors produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A command synonym does not match `[A-Za-z0-9][-A-Za-z0-9]*`.
    #[error("could not parse command: {0:?}")]
    InvalidCommandName(String),

    /// A flag could not be defined or assigned outside of parsing.
    #[error(transparent)]
    FlagDefinition(#[from] FlagError),

    /// `-h` or `-help` was given. Not a failure: print `usage` and exit 0.
    #[error("help requested for command {command:?}")]
    HelpRequested {
        /// Canonical path of the node that saw the request.
        command: String,
        /// Rendered usage text for that node.
        usage: String,
    },

    /// A flag on the matched path could not be parsed.
    #[error("{source}")]
    Flag {
        /// Canonical path of the node whose flags failed.
        command: String,
        /// Underlying flag error.
        source: FlagError,
        /// Rendered usage text for that node.
        usage: String,
    },

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` for [`Error::HelpRequested`].
    pub fn is_help(&self) -> bool {
        matches!(self, Self::HelpRequested { .. })
    }

    /// Usage text attached to a parse outcome, if any.
    pub fn usage(&self) -> Option<&str> {
        match self {
            Self::HelpRequested { usage, .. } | Self::Flag { usage, .. } => Some(usage),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
