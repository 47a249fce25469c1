//! Invoke the dialect code generator for every target of a build graph.
//!
//! The generator is a black box behind the [`Generator`] trait. [`ProcessGenerator`] runs an
//! external interpreter and script; tests substitute in-process fakes.
//!
//! [`Executor`] schedules targets in dependency order with bounded parallelism, skips targets
//! whose fingerprint is unchanged, and isolates failures to the failing target and its
//! dependents.

mod error;
mod executor;
mod fingerprint;
mod generator;

pub use error::{ConfigurationWarning, GenerationError};
pub use executor::{BuildOutcome, ExecOptions, Executor, TargetOutcome, default_jobs};
pub use fingerprint::{FingerprintStore, target_fingerprint};
pub use generator::{
    DEFAULT_INTERPRETER, DEFAULT_SEARCH_PATH_VAR, GeneratedOutputs, Generator, ProcessGenerator,
    resolve_interpreter,
};
