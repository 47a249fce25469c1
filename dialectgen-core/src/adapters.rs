//! Default port implementations.

use crate::ports::WritePort;
use crate::settings::BuildSettings;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use dialectgen_exec::{ProcessGenerator, resolve_interpreter};
use fs_err as fs;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::debug;

/// Filesystem write operations. Identical content is not rewritten.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if path.is_file() && fs::read(path)? == contents {
            debug!(path = %path, "unchanged; not rewriting");
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}

/// Collects writes in memory, for embedding and testing.
#[derive(Debug, Default)]
pub struct InMemoryWritePort {
    files: Mutex<BTreeMap<Utf8PathBuf, Vec<u8>>>,
}

impl InMemoryWritePort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Utf8Path) -> Option<Vec<u8>> {
        self.files.lock().ok()?.get(path).cloned()
    }

    pub fn paths(&self) -> Vec<Utf8PathBuf> {
        self.files
            .lock()
            .map(|f| f.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl WritePort for InMemoryWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| anyhow::anyhow!("in-memory writer poisoned"))?;
        files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, _path: &Utf8Path) -> anyhow::Result<()> {
        Ok(())
    }
}

/// The process-backed generator described by `settings`.
///
/// An unset interpreter falls back to the default and logs a configuration warning.
pub fn process_generator(settings: &BuildSettings) -> ProcessGenerator {
    let (interpreter, _warning) = resolve_interpreter(settings.interpreter.as_deref());
    ProcessGenerator::new(interpreter, settings.generator_tool.clone())
        .with_search_path_var(settings.search_path_var.clone())
}
