//! Shared DTOs (schemas-as-code) for the dialectgen workspace.
//!
//! # Design constraints
//! - These types are intended to be serialized to disk.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod dialect;
pub mod graph;
pub mod manifest;
pub mod report;
pub mod version;
pub mod wire;

pub use dialect::{DialectDefinition, ProtocolVersion};
pub use graph::{BuildGraph, BuildTarget, Dependency, GenerationRequest, TargetId, TargetOutput};
pub use manifest::PackageManifest;
pub use version::VersionInfo;

/// Schema identifiers.
pub mod schema {
    pub const DIALECTGEN_GRAPH_V1: &str = "dialectgen.graph.v1";
    pub const DIALECTGEN_REPORT_V1: &str = "dialectgen.report.v1";
    pub const DIALECTGEN_FINGERPRINTS_V1: &str = "dialectgen.fingerprints.v1";
}
