use camino::{Utf8Path, Utf8PathBuf};
use dialectgen_types::DialectDefinition;
use glob::{Pattern, glob};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

/// Dialects reserved for generator self-tests; never part of a production build.
pub const DEFAULT_EXCLUDES: &[&str] = &["test", "python_array_test"];

pub const DEFAULT_EXTENSION: &str = "xml";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("definition directory {path} does not exist")]
    MissingDirectory { path: Utf8PathBuf },

    #[error("definition path {path} is not a directory")]
    NotADirectory { path: Utf8PathBuf },

    #[error("invalid discovery pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("io error while scanning {path}: {message}")]
    Io { path: Utf8PathBuf, message: String },
}

/// Discover `*.xml` dialects directly in `dir`.
pub fn discover_dialects(
    dir: &Utf8Path,
    exclude: &[String],
) -> Result<Vec<DialectDefinition>, DiscoveryError> {
    discover_dialects_with_extension(dir, DEFAULT_EXTENSION, exclude)
}

/// Discover `*.<extension>` dialects directly in `dir` (no recursion).
///
/// The result is sorted by dialect name and never contains a name listed in `exclude`.
pub fn discover_dialects_with_extension(
    dir: &Utf8Path,
    extension: &str,
    exclude: &[String],
) -> Result<Vec<DialectDefinition>, DiscoveryError> {
    if !dir.exists() {
        return Err(DiscoveryError::MissingDirectory {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(DiscoveryError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let pattern = format!("{}/*.{}", Pattern::escape(dir.as_str()), extension);
    debug!(pattern = %pattern, "scanning for dialect definitions");

    let excluded: BTreeSet<&str> = exclude.iter().map(String::as_str).collect();

    let entries = glob(&pattern).map_err(|e| DiscoveryError::Pattern {
        pattern: pattern.clone(),
        message: e.to_string(),
    })?;

    let mut out = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| DiscoveryError::Io {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if !path.is_file() {
            continue;
        }
        let Ok(path) = Utf8PathBuf::from_path_buf(path) else {
            debug!("skipping non-utf8 definition path");
            continue;
        };
        let Some(dialect) = DialectDefinition::from_path(path) else {
            continue;
        };
        if excluded.contains(dialect.name.as_str()) {
            debug!(dialect = %dialect.name, "excluding reserved dialect");
            continue;
        }
        out.push(dialect);
    }

    // Deterministic order matters.
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_fatal() {
        let td = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(td.path().join("nope")).unwrap();
        let err = discover_dialects(&dir, &[]).unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingDirectory { .. }));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn file_instead_of_directory_is_fatal() {
        let td = tempfile::tempdir().unwrap();
        let file = Utf8PathBuf::from_path_buf(td.path().join("common.xml")).unwrap();
        std::fs::write(&file, "<mavlink/>").unwrap();
        let err = discover_dialects(&file, &[]).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotADirectory { .. }));
    }

    #[test]
    fn default_excludes_cover_test_dialects() {
        assert!(DEFAULT_EXCLUDES.contains(&"test"));
    }
}
