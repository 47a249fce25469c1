//! Clap-free settings for the plan, build, and install pipelines.
//!
//! Paths are used as given; callers resolve them against the project root.

use camino::Utf8PathBuf;
use dialectgen_discovery::{DEFAULT_EXCLUDES, DEFAULT_EXTENSION, VersionSelection};
use dialectgen_domain::{DEFAULT_BASE_DIALECT, DEFAULT_VERSION};
use dialectgen_exec::{DEFAULT_SEARCH_PATH_VAR, default_jobs};
use dialectgen_types::{ProtocolVersion, VersionInfo};

pub const DEFAULT_PROJECT_NAME: &str = "mavlink";
pub const DEFAULT_DIALECTS_DIR: &str = "message_definitions";
pub const DEFAULT_GENERATOR_TOOL: &str = "pymavlink/tools/mavgen.py";
pub const DEFAULT_BUILD_DIR: &str = "build";
pub const DEFAULT_METADATA_FILE: &str = "package.xml";

/// Settings for planning and building.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub project_name: String,
    /// Optional metadata file the version is read from.
    pub metadata: Option<Utf8PathBuf>,
    pub default_version: VersionInfo,

    // Discovery
    pub dialects_dir: Utf8PathBuf,
    pub extension: String,
    pub exclude: Vec<String>,

    // Graph
    pub base_dialect: String,
    pub base_definition: Utf8PathBuf,
    pub versions: Vec<ProtocolVersion>,
    pub selection: VersionSelection,
    pub base_fan_in: bool,

    // Generator
    pub generator_tool: Utf8PathBuf,
    pub interpreter: Option<String>,
    pub search_path: Vec<Utf8PathBuf>,
    pub search_path_var: String,

    // Execution
    pub build_dir: Utf8PathBuf,
    pub jobs: usize,
    pub force: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        let dialects_dir = Utf8PathBuf::from(DEFAULT_DIALECTS_DIR);
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            metadata: Some(Utf8PathBuf::from(DEFAULT_METADATA_FILE)),
            default_version: DEFAULT_VERSION,
            base_definition: dialects_dir.join(format!("{}.{}", DEFAULT_BASE_DIALECT, DEFAULT_EXTENSION)),
            dialects_dir,
            extension: DEFAULT_EXTENSION.to_string(),
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            base_dialect: DEFAULT_BASE_DIALECT.to_string(),
            versions: ProtocolVersion::ALL.to_vec(),
            selection: VersionSelection::default(),
            base_fan_in: true,
            generator_tool: Utf8PathBuf::from(DEFAULT_GENERATOR_TOOL),
            interpreter: None,
            search_path: Vec::new(),
            search_path_var: DEFAULT_SEARCH_PATH_VAR.to_string(),
            build_dir: Utf8PathBuf::from(DEFAULT_BUILD_DIR),
            jobs: default_jobs(),
            force: false,
        }
    }
}

/// Settings for the install pipeline.
#[derive(Debug, Clone)]
pub struct InstallSettings {
    pub prefix: Utf8PathBuf,
    pub resources: Vec<Utf8PathBuf>,
    pub license: Option<Utf8PathBuf>,
    pub libraries: Vec<String>,
    pub dependencies: Vec<String>,
    pub cmake_template: Option<Utf8PathBuf>,
    pub pkgconfig_template: Option<Utf8PathBuf>,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            prefix: Utf8PathBuf::from("install"),
            resources: vec![Utf8PathBuf::from(DEFAULT_DIALECTS_DIR)],
            license: Some(Utf8PathBuf::from("LICENSE")),
            libraries: Vec::new(),
            dependencies: Vec::new(),
            cmake_template: None,
            pkgconfig_template: None,
        }
    }
}
