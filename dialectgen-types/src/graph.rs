use crate::dialect::{DialectDefinition, ProtocolVersion};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Stable target identifier: `<namespace>/<dialect>`, e.g. `v2.0/common`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(version: ProtocolVersion, dialect: &str) -> Self {
        Self(format!("{}/{}", version.namespace(), dialect))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An edge in the build graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Dependency {
    /// A file whose content invalidates the target.
    File(Utf8PathBuf),
    /// Another target that must finish first.
    Target(TargetId),
}

/// What a target produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum TargetOutput {
    /// A concrete generated file the build can check for.
    File(Utf8PathBuf),
    /// Completion marker written by the executor after the generator succeeds.
    Stamp(Utf8PathBuf),
}

impl TargetOutput {
    pub fn path(&self) -> &Utf8Path {
        match self {
            TargetOutput::File(p) | TargetOutput::Stamp(p) => p,
        }
    }

    pub fn is_stamp(&self) -> bool {
        matches!(self, TargetOutput::Stamp(_))
    }
}

/// Inputs of one generator invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub language: String,
    pub wire_version: ProtocolVersion,
    pub output_dir: Utf8PathBuf,
    pub definition: Utf8PathBuf,

    /// Directories that make the generator and co-located definitions resolvable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_path: Vec<Utf8PathBuf>,
}

impl GenerationRequest {
    /// Generator arguments, in invocation order.
    pub fn args(&self) -> Vec<String> {
        vec![
            format!("--lang={}", self.language),
            format!("--wire-protocol={}", self.wire_version.wire()),
            format!("--output={}", self.output_dir),
            self.definition.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTarget {
    pub id: TargetId,
    pub version: ProtocolVersion,
    pub dialect: DialectDefinition,
    pub outputs: TargetOutput,
    pub depends_on: BTreeSet<Dependency>,
    pub command: GenerationRequest,
}

impl BuildTarget {
    pub fn target_deps(&self) -> impl Iterator<Item = &TargetId> {
        self.depends_on.iter().filter_map(|d| match d {
            Dependency::Target(id) => Some(id),
            Dependency::File(_) => None,
        })
    }

    pub fn file_deps(&self) -> impl Iterator<Item = &Utf8PathBuf> {
        self.depends_on.iter().filter_map(|d| match d {
            Dependency::File(p) => Some(p),
            Dependency::Target(_) => None,
        })
    }

    pub fn depends_on_target(&self, id: &TargetId) -> bool {
        self.depends_on.contains(&Dependency::Target(id.clone()))
    }
}

/// The full set of generation targets, keyed (and therefore ordered) by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildGraph {
    targets: BTreeMap<TargetId, BuildTarget>,
    /// Names of the graph passes applied after construction, in order.
    pub passes: Vec<String>,
}

impl BuildGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a target. Returns the previous target with the same id, if any.
    pub fn insert(&mut self, target: BuildTarget) -> Option<BuildTarget> {
        self.targets.insert(target.id.clone(), target)
    }

    pub fn get(&self, id: &TargetId) -> Option<&BuildTarget> {
        self.targets.get(id)
    }

    pub fn get_mut(&mut self, id: &TargetId) -> Option<&mut BuildTarget> {
        self.targets.get_mut(id)
    }

    pub fn contains(&self, id: &TargetId) -> bool {
        self.targets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &TargetId> {
        self.targets.keys()
    }

    pub fn targets(&self) -> impl Iterator<Item = &BuildTarget> {
        self.targets.values()
    }

    pub fn for_version(&self, version: ProtocolVersion) -> impl Iterator<Item = &BuildTarget> {
        self.targets.values().filter(move |t| t.version == version)
    }

    /// Targets with a direct `Target` edge onto `id`.
    pub fn dependents_of<'a>(&'a self, id: &'a TargetId) -> impl Iterator<Item = &'a BuildTarget> {
        self.targets.values().filter(move |t| t.depends_on_target(id))
    }

    /// Dialect names per version, sorted.
    pub fn dialect_names(&self) -> BTreeMap<ProtocolVersion, Vec<String>> {
        let mut out: BTreeMap<ProtocolVersion, Vec<String>> = BTreeMap::new();
        for t in self.targets.values() {
            out.entry(t.version).or_default().push(t.dialect.name.clone());
        }
        for names in out.values_mut() {
            names.sort();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(version: ProtocolVersion, name: &str) -> BuildTarget {
        let dialect = DialectDefinition::from_path(format!("defs/{name}.xml")).unwrap();
        BuildTarget {
            id: TargetId::new(version, name),
            version,
            outputs: TargetOutput::Stamp(format!("stamps/{name}.stamp").into()),
            depends_on: BTreeSet::from([Dependency::File(dialect.path.clone())]),
            command: GenerationRequest {
                language: version.language().to_string(),
                wire_version: version,
                output_dir: "out".into(),
                definition: dialect.path.clone(),
                search_path: vec![],
            },
            dialect,
        }
    }

    #[test]
    fn target_id_uses_namespace() {
        assert_eq!(
            TargetId::new(ProtocolVersion::V2, "common").as_str(),
            "v2.0/common"
        );
    }

    #[test]
    fn request_args_are_in_invocation_order() {
        let t = target(ProtocolVersion::V1, "minimal");
        assert_eq!(
            t.command.args(),
            vec![
                "--lang=C".to_string(),
                "--wire-protocol=1.0".to_string(),
                "--output=out".to_string(),
                "defs/minimal.xml".to_string(),
            ]
        );
    }

    #[test]
    fn dependents_follow_target_edges() {
        let mut g = BuildGraph::new();
        let a = target(ProtocolVersion::V2, "a");
        let mut b = target(ProtocolVersion::V2, "b");
        b.depends_on.insert(Dependency::Target(a.id.clone()));
        let a_id = a.id.clone();
        g.insert(a);
        g.insert(b);

        let dependents: Vec<_> = g.dependents_of(&a_id).map(|t| t.id.as_str()).collect();
        assert_eq!(dependents, vec!["v2.0/b"]);
    }

    #[test]
    fn dialect_names_grouped_by_version() {
        let mut g = BuildGraph::new();
        g.insert(target(ProtocolVersion::V1, "b"));
        g.insert(target(ProtocolVersion::V1, "a"));
        g.insert(target(ProtocolVersion::V2, "a"));
        let names = g.dialect_names();
        assert_eq!(names[&ProtocolVersion::V1], vec!["a", "b"]);
        assert_eq!(names[&ProtocolVersion::V2], vec!["a"]);
    }
}
