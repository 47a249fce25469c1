//! Domain logic: turn discovered dialects and project metadata into a deterministic build graph.
//!
//! This crate owns *what* gets generated and in which order. It does not own *how* the
//! generator is invoked; that's the `dialectgen-exec` crate.

mod graph;
mod manifest;
mod order;
mod passes;
mod version;

pub use graph::{DEFAULT_BASE_DIALECT, GraphBuilder, GraphConfig, GraphError, GraphInputs};
pub use manifest::build_manifest;
pub use order::topological_order;
pub use passes::{BaseDialectFanIn, GraphPass, builtin_passes};
pub use version::{
    DEFAULT_VERSION, ResolvedVersion, VersionFormatError, VersionSource, parse_version,
    read_metadata_version, resolve_version,
};
