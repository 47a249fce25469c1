use dialectgen_types::{DialectDefinition, ProtocolVersion};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Per-version dialect exclusions applied on top of discovery.
///
/// Empty by default, so every protocol version builds the same dialect set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VersionSelection {
    #[serde(default)]
    pub exclude: BTreeMap<ProtocolVersion, Vec<String>>,
}

impl VersionSelection {
    pub fn excluding(mut self, version: ProtocolVersion, names: &[&str]) -> Self {
        self.exclude
            .entry(version)
            .or_default()
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn excludes(&self, version: ProtocolVersion, name: &str) -> bool {
        self.exclude
            .get(&version)
            .is_some_and(|names| names.iter().any(|n| n == name))
    }
}

/// The dialects that build for `version`, order preserved.
pub fn select_for_version(
    dialects: &[DialectDefinition],
    version: ProtocolVersion,
    selection: &VersionSelection,
) -> Vec<DialectDefinition> {
    dialects
        .iter()
        .filter(|d| {
            let keep = !selection.excludes(version, &d.name);
            if !keep {
                debug!(dialect = %d.name, version = %version, "dialect excluded for version");
            }
            keep
        })
        .cloned()
        .collect()
}
