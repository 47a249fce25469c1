//! Embeddable core library for dialectgen.
//!
//! Provides a clap-free entry point suitable for linking into other build tooling.
//!
//! # Ports
//!
//! - [`WritePort`](ports::WritePort): write artifact files and create directories
//! - [`Generator`](ports::Generator): invoke the dialect code generator
//!
//! The [`adapters`] module provides default filesystem- and process-backed implementations.
//!
//! # Entry points
//!
//! - [`run_plan`](pipeline::run_plan): resolve the version, discover dialects, build the graph
//! - [`run_build`](pipeline::run_build): plan, then execute the graph
//! - [`run_install`](pipeline::run_install): stage build output into an install prefix

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-exported so embedders don't need the leaf crates directly.
pub use dialectgen_discovery::VersionSelection;
pub use dialectgen_domain::{ResolvedVersion, VersionSource};
pub use dialectgen_exec::{BuildOutcome, GenerationError, TargetOutcome};
pub use dialectgen_install::InstallReport;
