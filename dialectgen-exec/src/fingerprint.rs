//! Persisted per-target fingerprints for incremental builds.

use crate::error::GenerationError;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use dialectgen_hash::{Fingerprinter, sha256_file};
use dialectgen_types::schema::DIALECTGEN_FINGERPRINTS_V1;
use dialectgen_types::{BuildTarget, TargetId};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Fingerprint of everything that can change a target's outputs: its command, the content
/// of each input file, and the fingerprints of the targets it depends on.
///
/// A dependency target without a known fingerprint hashes as empty.
pub fn target_fingerprint(
    target: &BuildTarget,
    dependency_fingerprints: &HashMap<TargetId, String>,
) -> Result<String, GenerationError> {
    let mut fp = Fingerprinter::new();
    fp.part("target", target.id.as_str().as_bytes());
    for arg in target.command.args() {
        fp.part("arg", arg.as_bytes());
    }
    for dir in &target.command.search_path {
        fp.part("search_path", dir.as_str().as_bytes());
    }
    fp.part("output", target.outputs.path().as_str().as_bytes());

    // BTreeSet order keeps this stable across runs.
    for path in target.file_deps() {
        let digest = sha256_file(path).map_err(|e| GenerationError::UnreadableInput {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fp.part(path.as_str(), digest.as_bytes());
    }
    for dep in target.target_deps() {
        let digest = dependency_fingerprints
            .get(dep)
            .map(String::as_str)
            .unwrap_or_default();
        fp.part(dep.as_str(), digest.as_bytes());
    }

    Ok(fp.finish())
}

#[derive(Debug, Serialize, Deserialize)]
struct FingerprintFile {
    schema: String,
    #[serde(default)]
    targets: BTreeMap<TargetId, String>,
}

/// Fingerprints of the last successful build of each target.
#[derive(Debug)]
pub struct FingerprintStore {
    path: Utf8PathBuf,
    entries: BTreeMap<TargetId, String>,
    dirty: bool,
}

impl FingerprintStore {
    pub fn empty(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Load the store. A missing file is empty; an unreadable or foreign one is discarded
    /// with a warning, which forces a full rebuild.
    pub fn load(path: impl Into<Utf8PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if !path.exists() {
            debug!(path = %path, "no fingerprint state; starting empty");
            return Ok(Self::empty(path));
        }

        let contents = fs::read_to_string(&path)?;
        match serde_json::from_str::<FingerprintFile>(&contents) {
            Ok(file) if file.schema == DIALECTGEN_FINGERPRINTS_V1 => Ok(Self {
                path,
                entries: file.targets,
                dirty: false,
            }),
            Ok(file) => {
                warn!(path = %path, schema = %file.schema, "unknown fingerprint schema; rebuilding everything");
                Ok(Self::empty(path))
            }
            Err(err) => {
                warn!(path = %path, error = %err, "corrupt fingerprint state; rebuilding everything");
                Ok(Self::empty(path))
            }
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn get(&self, id: &TargetId) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn insert(&mut self, id: TargetId, fingerprint: String) {
        if self.entries.get(&id) != Some(&fingerprint) {
            self.entries.insert(id, fingerprint);
            self.dirty = true;
        }
    }

    pub fn remove(&mut self, id: &TargetId) {
        if self.entries.remove(id).is_some() {
            self.dirty = true;
        }
    }

    /// Drop every entry whose id fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&TargetId) -> bool) {
        let before = self.entries.len();
        self.entries.retain(|id, _| keep(id));
        if self.entries.len() != before {
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the store if anything changed since it was loaded. Returns whether it wrote.
    pub fn save(&mut self) -> anyhow::Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = FingerprintFile {
            schema: DIALECTGEN_FINGERPRINTS_V1.to_string(),
            targets: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&file).context("serialize fingerprints")?;
        fs::write(&self.path, json)?;
        self.dirty = false;
        Ok(true)
    }
}
