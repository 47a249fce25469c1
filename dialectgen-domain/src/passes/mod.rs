//! Graph transformation passes run after construction.
//!
//! Workarounds for generator limitations live here rather than in the builder, so each one
//! can be audited and dropped on its own.

use crate::graph::{GraphConfig, GraphError};
use dialectgen_types::{BuildGraph, ProtocolVersion};

mod base_fan_in;

pub use base_fan_in::BaseDialectFanIn;

pub trait GraphPass {
    fn name(&self) -> &'static str;

    fn apply(&self, graph: &mut BuildGraph) -> Result<(), GraphError>;
}

pub fn builtin_passes(config: &GraphConfig) -> Vec<Box<dyn GraphPass>> {
    let mut passes: Vec<Box<dyn GraphPass>> = Vec::new();
    if config.base_fan_in && config.versions.contains(&ProtocolVersion::V2) {
        passes.push(Box::new(BaseDialectFanIn::new(
            ProtocolVersion::V2,
            &config.base_dialect,
        )));
    }
    passes
}
