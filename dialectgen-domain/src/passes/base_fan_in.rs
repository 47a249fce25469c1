use crate::graph::GraphError;
use crate::passes::GraphPass;
use dialectgen_types::{BuildGraph, Dependency, ProtocolVersion, TargetId};
use tracing::debug;

/// Make the base dialect's target depend on every other target of one protocol version.
///
/// The V2 generator unions shared enumerations into the base dialect's output from every
/// definition it has processed in the build tree. If the base target runs before a sibling
/// has been generated at least once, those entries are silently missing. With these edges
/// the base target runs after every sibling and reruns whenever any of them changes.
pub struct BaseDialectFanIn {
    version: ProtocolVersion,
    base: String,
}

impl BaseDialectFanIn {
    pub fn new(version: ProtocolVersion, base: &str) -> Self {
        Self {
            version,
            base: base.to_string(),
        }
    }
}

impl GraphPass for BaseDialectFanIn {
    fn name(&self) -> &'static str {
        "base-dialect-fan-in"
    }

    fn apply(&self, graph: &mut BuildGraph) -> Result<(), GraphError> {
        let base_id = TargetId::new(self.version, &self.base);

        let siblings: Vec<TargetId> = graph
            .for_version(self.version)
            .filter(|t| t.id != base_id)
            .map(|t| t.id.clone())
            .collect();

        let base = graph
            .get_mut(&base_id)
            .ok_or_else(|| GraphError::MissingBaseTarget {
                id: base_id.clone(),
            })?;

        for id in &siblings {
            base.depends_on.insert(Dependency::Target(id.clone()));
        }

        debug!(base = %base_id, edges = siblings.len(), "added base dialect fan-in edges");
        Ok(())
    }
}
