use crate::dialect::ProtocolVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Package description consumed by the installer.
///
/// Derived once from the resolved graph and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub project: String,

    #[serde(default)]
    pub libraries: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<String>,

    pub dialects_per_version: BTreeMap<ProtocolVersion, Vec<String>>,
}

impl PackageManifest {
    pub fn dialects(&self, version: ProtocolVersion) -> &[String] {
        self.dialects_per_version
            .get(&version)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
