use crate::order::topological_order;
use crate::passes::{GraphPass, builtin_passes};
use camino::{Utf8Path, Utf8PathBuf};
use dialectgen_discovery::{VersionSelection, select_for_version};
use dialectgen_types::{
    BuildGraph, BuildTarget, Dependency, DialectDefinition, GenerationRequest, ProtocolVersion,
    TargetId, TargetOutput,
};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the shared dialect every other dialect extends.
pub const DEFAULT_BASE_DIALECT: &str = "common";

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no protocol versions selected")]
    NoVersions,

    #[error("dialect '{name}' appears more than once for {version}")]
    DuplicateDialect {
        version: ProtocolVersion,
        name: String,
    },

    #[error("base dialect target {id} is missing from the graph")]
    MissingBaseTarget { id: TargetId },

    #[error("target {target} depends on unknown target {dependency}")]
    UnknownDependency { target: TargetId, dependency: TargetId },

    #[error("dependency cycle among targets: {}", .targets.join(", "))]
    Cycle { targets: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Root of generated output, stamps, and state.
    pub build_dir: Utf8PathBuf,
    pub versions: Vec<ProtocolVersion>,
    pub base_dialect: String,
    pub selection: VersionSelection,
    /// Extra generator search path, ahead of each definition's own directory.
    pub search_path: Vec<Utf8PathBuf>,
    /// Register the base-dialect fan-in pass for V2.
    pub base_fan_in: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            build_dir: Utf8PathBuf::from("build"),
            versions: ProtocolVersion::ALL.to_vec(),
            base_dialect: DEFAULT_BASE_DIALECT.to_string(),
            selection: VersionSelection::default(),
            search_path: Vec::new(),
            base_fan_in: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphInputs {
    /// Discovered dialects, already filtered by the exclusion list.
    pub dialects: Vec<DialectDefinition>,
    /// Dedicated path of the base definition; used whether or not it was discovered.
    pub base_definition: Utf8PathBuf,
    pub generator_tool: Utf8PathBuf,
}

pub struct GraphBuilder {
    config: GraphConfig,
    passes: Vec<Box<dyn GraphPass>>,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        let passes = builtin_passes(&config);
        Self { config, passes }
    }

    pub fn with_passes(config: GraphConfig, passes: Vec<Box<dyn GraphPass>>) -> Self {
        Self { config, passes }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Construct the graph, run the registered passes, and validate the result.
    pub fn build(&self, inputs: &GraphInputs) -> Result<BuildGraph, GraphError> {
        let mut graph = self.construct(inputs)?;

        for pass in &self.passes {
            pass.apply(&mut graph)?;
            debug!(pass = pass.name(), "applied graph pass");
            graph.passes.push(pass.name().to_string());
        }

        topological_order(&graph)?;

        info!(
            targets = graph.len(),
            passes = graph.passes.len(),
            "constructed build graph"
        );
        Ok(graph)
    }

    fn construct(&self, inputs: &GraphInputs) -> Result<BuildGraph, GraphError> {
        let versions: BTreeSet<ProtocolVersion> = self.config.versions.iter().copied().collect();
        if versions.is_empty() {
            return Err(GraphError::NoVersions);
        }

        let base = DialectDefinition {
            name: self.config.base_dialect.clone(),
            path: inputs.base_definition.clone(),
        };

        let mut graph = BuildGraph::new();
        for version in versions {
            if self.config.selection.excludes(version, &base.name) {
                warn!(version = %version, dialect = %base.name, "base dialect cannot be excluded; building it anyway");
            }

            graph.insert(self.make_target(version, &base, &base, &inputs.generator_tool));

            let mut seen: HashSet<&str> = HashSet::new();
            let selected = select_for_version(&inputs.dialects, version, &self.config.selection);
            for dialect in &selected {
                if dialect.name == base.name {
                    continue;
                }
                if !seen.insert(dialect.name.as_str()) {
                    return Err(GraphError::DuplicateDialect {
                        version,
                        name: dialect.name.clone(),
                    });
                }
                graph.insert(self.make_target(version, dialect, &base, &inputs.generator_tool));
            }
        }
        Ok(graph)
    }

    fn make_target(
        &self,
        version: ProtocolVersion,
        dialect: &DialectDefinition,
        base: &DialectDefinition,
        tool: &Utf8Path,
    ) -> BuildTarget {
        let ns = version.namespace();
        let output_dir = self.config.build_dir.join("include").join(ns);

        let outputs = if version.tracks_output_files() {
            TargetOutput::File(
                output_dir
                    .join(&dialect.name)
                    .join(format!("{}.h", dialect.name)),
            )
        } else {
            TargetOutput::Stamp(
                self.config
                    .build_dir
                    .join("stamps")
                    .join(ns)
                    .join(format!("{}.stamp", dialect.name)),
            )
        };

        let depends_on = BTreeSet::from([
            Dependency::File(dialect.path.clone()),
            Dependency::File(base.path.clone()),
            Dependency::File(tool.to_path_buf()),
        ]);

        let mut search_path = self.config.search_path.clone();
        if let Some(parent) = dialect.path.parent()
            && !parent.as_str().is_empty()
            && !search_path.iter().any(|p| p == parent)
        {
            search_path.push(parent.to_path_buf());
        }

        BuildTarget {
            id: TargetId::new(version, &dialect.name),
            version,
            dialect: dialect.clone(),
            outputs,
            depends_on,
            command: GenerationRequest {
                language: version.language().to_string(),
                wire_version: version,
                output_dir,
                definition: dialect.path.clone(),
                search_path,
            },
        }
    }
}
