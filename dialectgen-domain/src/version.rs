//! Project version resolution.
//!
//! The version comes from an optional metadata file. A missing file is not an error;
//! a malformed version is recovered by falling back to the default with a warning.

use camino::{Utf8Path, Utf8PathBuf};
use dialectgen_types::VersionInfo;
use fs_err as fs;
use thiserror::Error;
use tracing::{debug, warn};

/// Compiled-in fallback when no usable metadata version exists.
pub const DEFAULT_VERSION: VersionInfo = VersionInfo::new(1, 0, 0);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionFormatError {
    #[error("version '{value}' does not match MAJOR.MINOR.PATCH")]
    Malformed { value: String },

    #[error("no version field in {path}")]
    MissingField { path: Utf8PathBuf },

    #[error("unreadable metadata file {path}: {message}")]
    Unreadable { path: Utf8PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    Default,
    Metadata(Utf8PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: VersionInfo,
    pub source: VersionSource,
    /// Set when a metadata file existed but could not be used.
    pub warning: Option<VersionFormatError>,
}

/// Parse a strict `\d+.\d+.\d+` version. Surrounding whitespace is ignored.
pub fn parse_version(raw: &str) -> Result<VersionInfo, VersionFormatError> {
    let malformed = || VersionFormatError::Malformed {
        value: raw.to_string(),
    };

    let parts: Vec<&str> = raw.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(malformed());
    }

    let mut nums = [0u64; 3];
    for (slot, part) in nums.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        *slot = part.parse().map_err(|_| malformed())?;
    }

    Ok(VersionInfo::new(nums[0], nums[1], nums[2]))
}

/// Extract the raw version string from a metadata file.
///
/// `.toml` files use a top-level `version` or `package.version`; `.json` files a top-level
/// `"version"`; anything else (e.g. `package.xml`) the first `<version>` element.
pub fn read_metadata_version(path: &Utf8Path) -> Result<String, VersionFormatError> {
    let unreadable = |message: String| VersionFormatError::Unreadable {
        path: path.to_path_buf(),
        message,
    };
    let missing = || VersionFormatError::MissingField {
        path: path.to_path_buf(),
    };

    let contents = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;

    match path.extension() {
        Some("toml") => {
            let doc: toml::Table = toml::from_str(&contents).map_err(|e| unreadable(e.to_string()))?;
            doc.get("version")
                .or_else(|| doc.get("package").and_then(|p| p.get("version")))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(missing)
        }
        Some("json") => {
            let doc: serde_json::Value =
                serde_json::from_str(&contents).map_err(|e| unreadable(e.to_string()))?;
            doc.get("version")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(missing)
        }
        _ => xml_element_text(&contents, "version").ok_or_else(missing),
    }
}

fn xml_element_text(contents: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = contents.find(&open)? + open.len();
    let len = contents[start..].find(&close)?;
    Some(contents[start..start + len].trim().to_string())
}

/// Resolve the project version.
///
/// - no path, or the file does not exist: `default`, no warning
/// - well-formed version: the parsed value
/// - anything else: `default`, with the error logged and kept in `warning`
pub fn resolve_version(metadata: Option<&Utf8Path>, default: VersionInfo) -> ResolvedVersion {
    let fallback = |warning: Option<VersionFormatError>| ResolvedVersion {
        version: default,
        source: VersionSource::Default,
        warning,
    };

    let Some(path) = metadata else {
        debug!(version = %default, "no metadata file configured; using default version");
        return fallback(None);
    };
    if !path.exists() {
        debug!(path = %path, version = %default, "metadata file absent; using default version");
        return fallback(None);
    }

    match read_metadata_version(path).and_then(|raw| parse_version(&raw)) {
        Ok(version) => {
            debug!(path = %path, version = %version, "resolved version from metadata");
            ResolvedVersion {
                version,
                source: VersionSource::Metadata(path.to_path_buf()),
                warning: None,
            }
        }
        Err(err) => {
            warn!(path = %path, error = %err, fallback = %default, "falling back to default version");
            fallback(Some(err))
        }
    }
}
