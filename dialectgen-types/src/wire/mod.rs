use serde::{Deserialize, Serialize};

use crate::graph::{BuildGraph, BuildTarget};

/// Schema-exact wire representation of dialectgen.graph.v1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphV1 {
    pub schema: String,

    #[serde(default)]
    pub passes: Vec<String>,

    #[serde(default)]
    pub targets: Vec<BuildTarget>,
}

impl From<&BuildGraph> for GraphV1 {
    fn from(graph: &BuildGraph) -> Self {
        Self {
            schema: crate::schema::DIALECTGEN_GRAPH_V1.to_string(),
            passes: graph.passes.clone(),
            targets: graph.targets().cloned().collect(),
        }
    }
}

impl TryFrom<GraphV1> for BuildGraph {
    type Error = WireError;

    fn try_from(wire: GraphV1) -> Result<Self, Self::Error> {
        if wire.schema != crate::schema::DIALECTGEN_GRAPH_V1 {
            return Err(WireError::UnexpectedSchema {
                expected: crate::schema::DIALECTGEN_GRAPH_V1,
                actual: wire.schema,
            });
        }
        let mut graph = BuildGraph::new();
        graph.passes = wire.passes;
        for target in wire.targets {
            let id = target.id.clone();
            if graph.insert(target).is_some() {
                return Err(WireError::DuplicateTarget { id: id.0 });
            }
        }
        Ok(graph)
    }
}

/// Errors emitted while converting wire models to internal models.
#[derive(Debug, Clone)]
pub enum WireError {
    UnexpectedSchema {
        expected: &'static str,
        actual: String,
    },
    DuplicateTarget {
        id: String,
    },
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireError::UnexpectedSchema { expected, actual } => {
                write!(f, "unexpected schema '{}' (expected {})", actual, expected)
            }
            WireError::DuplicateTarget { id } => write!(f, "duplicate target id {}", id),
        }
    }
}

impl std::error::Error for WireError {}
