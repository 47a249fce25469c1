use dialectgen_types::{BuildGraph, PackageManifest};

/// Derive the package manifest from a built graph.
pub fn build_manifest(
    project: &str,
    libraries: &[String],
    dependencies: &[String],
    graph: &BuildGraph,
) -> PackageManifest {
    PackageManifest {
        project: project.to_string(),
        libraries: libraries.to_vec(),
        dependencies: dependencies.to_vec(),
        dialects_per_version: graph.dialect_names(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, GraphConfig, GraphInputs};
    use dialectgen_types::{DialectDefinition, ProtocolVersion};

    #[test]
    fn lists_dialects_per_version() {
        let graph = GraphBuilder::new(GraphConfig::default())
            .build(&GraphInputs {
                dialects: vec![DialectDefinition::from_path("defs/minimal.xml").unwrap()],
                base_definition: "defs/common.xml".into(),
                generator_tool: "mavgen.py".into(),
            })
            .unwrap();
        let manifest = build_manifest("mavlink", &[], &["catkin".to_string()], &graph);
        assert_eq!(manifest.dialects(ProtocolVersion::V1), ["common", "minimal"]);
        assert_eq!(manifest.dialects(ProtocolVersion::V2), ["common", "minimal"]);
        assert_eq!(manifest.dependencies, vec!["catkin"]);
    }
}
