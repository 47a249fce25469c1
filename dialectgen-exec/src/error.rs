//! Error types for dialectgen-exec.
//!
//! This module defines error types that distinguish between:
//! - Generation errors: fatal to one target and everything that depends on it
//! - Configuration warnings: recovered by falling back to a default

use camino::Utf8PathBuf;
use thiserror::Error;

/// A single target's generation failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The generator process could not be started.
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    /// The generator ran and exited unsuccessfully.
    #[error("generator exited with {status}: {stderr}")]
    NonZeroExit { status: String, stderr: String },

    /// The generator reported success but a declared output is absent.
    #[error("expected output {path} was not produced")]
    MissingOutput { path: Utf8PathBuf },

    /// A declared input could not be read for fingerprinting.
    #[error("input {path} is unreadable: {message}")]
    UnreadableInput { path: Utf8PathBuf, message: String },

    /// Output directories or the stamp could not be written.
    #[error("could not write {path}: {message}")]
    Io { path: Utf8PathBuf, message: String },

    /// The generator implementation panicked.
    #[error("generator panicked: {message}")]
    Panicked { message: String },
}

impl GenerationError {
    /// Short machine-readable code for reports.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::Spawn { .. } => "spawn_failed",
            GenerationError::NonZeroExit { .. } => "nonzero_exit",
            GenerationError::MissingOutput { .. } => "missing_output",
            GenerationError::UnreadableInput { .. } => "unreadable_input",
            GenerationError::Io { .. } => "io",
            GenerationError::Panicked { .. } => "panicked",
        }
    }
}

/// A non-fatal configuration problem; the build proceeds with a default.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationWarning {
    #[error("no interpreter configured; defaulting to '{default}'")]
    MissingInterpreter { default: String },
}
