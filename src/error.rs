//! Domain-specific error types for the reconciliation engine.
//!
//! Library code returns typed errors ([`ReconcileError`], [`ConfigError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ReconcileError
//! ├── TargetIsDirectory        - path names a directory (any mode, any dry-run)
//! ├── TargetMissing            - file absent and creation disallowed
//! ├── InvalidConfiguration     - line/pattern mismatch, both anchors, bad regex
//! ├── ExternalCommandFailed    - control-plane binary exited non-zero
//! └── Io                       - read, backup or write failure
//! ConfigError                  - manifest loading and entry validation
//! ```
//!
//! Every variant is terminal for the invocation; nothing is retried.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reconciling a single resource.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The target path is a directory.
    #[error("destination {} is a directory", path.display())]
    TargetIsDirectory {
        /// Offending path.
        path: PathBuf,
    },

    /// The target file does not exist and creation was not requested.
    #[error("destination {} does not exist", path.display())]
    TargetMissing {
        /// Offending path.
        path: PathBuf,
    },

    /// The requested configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The external control-plane command returned non-success.
    #[error("command '{command}' failed (exit {code}): {stderr}")]
    ExternalCommandFailed {
        /// Full command line that was run.
        command: String,
        /// Exit code returned by the process (`-1` when killed by a signal).
        code: i32,
        /// Captured standard error output.
        stderr: String,
    },

    /// An I/O error occurred while reading, backing up or writing a file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl ReconcileError {
    /// Build an [`ReconcileError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that arise from manifest loading and entry validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A field holds a value outside its accepted set.
    #[error("invalid value '{value}' for '{field}': {reason}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Value as written.
        value: String,
        /// Accepted values or other detail.
        reason: String,
    },

    /// A manifest entry failed validation.
    #[error("{kind} entry #{index}: {source}")]
    Entry {
        /// Manifest table name (`line` or `vhost`).
        kind: &'static str,
        /// Zero-based index within its table array.
        index: usize,
        /// The validation failure.
        source: ReconcileError,
    },

    /// The manifest file contains invalid TOML or unknown fields.
    #[error("invalid manifest {}: {message}", path.display())]
    InvalidSyntax {
        /// Manifest path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading the manifest.
    #[error("IO error reading manifest {}: {source}", path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
