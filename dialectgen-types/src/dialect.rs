use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A message-definition file and the dialect name derived from it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DialectDefinition {
    /// File stem of `path`.
    pub name: String,
    pub path: Utf8PathBuf,
}

impl DialectDefinition {
    /// Derive a definition from its file path. Returns `None` for paths without a file stem.
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_stem()?.to_string();
        if name.is_empty() {
            return None;
        }
        Some(Self { name, path })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// Wire-protocol revision a target is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    V1,
    V2,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 2] = [ProtocolVersion::V1, ProtocolVersion::V2];

    /// Value passed to the generator's `--wire-protocol` flag.
    pub fn wire(self) -> &'static str {
        match self {
            ProtocolVersion::V1 => "1.0",
            ProtocolVersion::V2 => "2.0",
        }
    }

    /// Output directory namespace, shared by the build tree and the install layout.
    pub fn namespace(self) -> &'static str {
        match self {
            ProtocolVersion::V1 => "v1.0",
            ProtocolVersion::V2 => "v2.0",
        }
    }

    /// Target language handed to the generator.
    pub fn language(self) -> &'static str {
        match self {
            ProtocolVersion::V1 => "C",
            ProtocolVersion::V2 => "C++11",
        }
    }

    /// Whether the generator's per-file output can be named before it runs.
    ///
    /// When it cannot, targets track a stamp file instead.
    pub fn tracks_output_files(self) -> bool {
        matches!(self, ProtocolVersion::V1)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" | "1.0" | "v1.0" => Ok(ProtocolVersion::V1),
            "v2" | "2" | "2.0" | "v2.0" => Ok(ProtocolVersion::V2),
            other => Err(format!("unknown protocol version '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_file_stem() {
        let d = DialectDefinition::from_path("defs/ardupilotmega.xml").unwrap();
        assert_eq!(d.name, "ardupilotmega");
        assert_eq!(d.path(), Utf8Path::new("defs/ardupilotmega.xml"));
    }

    #[test]
    fn path_without_stem_is_rejected() {
        assert!(DialectDefinition::from_path("/").is_none());
    }

    #[test]
    fn versions_parse_from_common_spellings() {
        for s in ["v1", "1.0", "V1.0"] {
            assert_eq!(s.parse::<ProtocolVersion>().unwrap(), ProtocolVersion::V1);
        }
        for s in ["v2", "2", "v2.0"] {
            assert_eq!(s.parse::<ProtocolVersion>().unwrap(), ProtocolVersion::V2);
        }
        assert!("v3".parse::<ProtocolVersion>().is_err());
    }

    #[test]
    fn languages_differ_per_version() {
        assert_ne!(
            ProtocolVersion::V1.language(),
            ProtocolVersion::V2.language()
        );
        assert!(ProtocolVersion::V1.tracks_output_files());
        assert!(!ProtocolVersion::V2.tracks_output_files());
    }

    #[test]
    fn serializes_as_lowercase_key() {
        let json = serde_json::to_string(&ProtocolVersion::V2).unwrap();
        assert_eq!(json, "\"v2\"");
    }
}
