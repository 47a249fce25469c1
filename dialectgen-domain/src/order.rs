use crate::graph::GraphError;
use dialectgen_types::{BuildGraph, TargetId};
use std::collections::{BTreeMap, BTreeSet};

/// Deterministic topological order of all targets (dependencies first).
///
/// Ties are broken by target id, so the same graph always yields the same order.
pub fn topological_order(graph: &BuildGraph) -> Result<Vec<TargetId>, GraphError> {
    let mut pending: BTreeMap<&TargetId, usize> = BTreeMap::new();
    for t in graph.targets() {
        let mut count = 0;
        for dep in t.target_deps() {
            if !graph.contains(dep) {
                return Err(GraphError::UnknownDependency {
                    target: t.id.clone(),
                    dependency: dep.clone(),
                });
            }
            count += 1;
        }
        pending.insert(&t.id, count);
    }

    let mut ready: BTreeSet<&TargetId> = pending
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(id) = ready.pop_first() {
        order.push(id.clone());
        for dependent in graph.dependents_of(id) {
            if let Some(n) = pending.get_mut(&dependent.id) {
                *n -= 1;
                if *n == 0 {
                    ready.insert(&dependent.id);
                }
            }
        }
    }

    if order.len() != graph.len() {
        let done: BTreeSet<&TargetId> = order.iter().collect();
        let targets = graph
            .ids()
            .filter(|id| !done.contains(id))
            .map(|id| id.to_string())
            .collect();
        return Err(GraphError::Cycle { targets });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, GraphConfig, GraphInputs};
    use dialectgen_types::{Dependency, DialectDefinition, ProtocolVersion};

    fn graph(names: &[&str]) -> BuildGraph {
        GraphBuilder::new(GraphConfig::default())
            .build(&GraphInputs {
                dialects: names
                    .iter()
                    .map(|n| DialectDefinition::from_path(format!("defs/{n}.xml")).unwrap())
                    .collect(),
                base_definition: "defs/common.xml".into(),
                generator_tool: "mavgen.py".into(),
            })
            .unwrap()
    }

    #[test]
    fn base_v2_comes_after_siblings() {
        let g = graph(&["ardupilotmega", "common", "minimal"]);
        let order = topological_order(&g).unwrap();
        let pos = |s: &str| order.iter().position(|id| id.as_str() == s).unwrap();
        assert!(pos("v2.0/common") > pos("v2.0/ardupilotmega"));
        assert!(pos("v2.0/common") > pos("v2.0/minimal"));
        assert_eq!(order.len(), g.len());
    }

    #[test]
    fn order_is_deterministic() {
        let g = graph(&["b", "a", "common"]);
        assert_eq!(topological_order(&g).unwrap(), topological_order(&g).unwrap());
    }

    #[test]
    fn cycle_detected() {
        let mut g = graph(&["common", "minimal"]);
        let base = TargetId::new(ProtocolVersion::V2, "common");
        g.get_mut(&TargetId::new(ProtocolVersion::V2, "minimal"))
            .unwrap()
            .depends_on
            .insert(Dependency::Target(base));
        let err = topological_order(&g).unwrap_err();
        let GraphError::Cycle { targets } = err else {
            panic!("expected cycle");
        };
        assert_eq!(targets, vec!["v2.0/common", "v2.0/minimal"]);
    }

    #[test]
    fn unknown_dependency_detected() {
        let mut g = graph(&["common"]);
        g.get_mut(&TargetId::new(ProtocolVersion::V1, "common"))
            .unwrap()
            .depends_on
            .insert(Dependency::Target(TargetId("v1.0/ghost".to_string())));
        assert!(matches!(
            topological_order(&g),
            Err(GraphError::UnknownDependency { .. })
        ));
    }
}
