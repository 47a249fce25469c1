//! Configuration file loading for dialectgen.
//!
//! Discovers and loads `dialectgen.toml` from the project root.
//! Merges config file settings with CLI arguments (CLI takes precedence, lists extend).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use dialectgen_core::VersionSelection;
use dialectgen_core::settings::{BuildSettings, InstallSettings};
use dialectgen_domain::parse_version;
use dialectgen_types::ProtocolVersion;
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "dialectgen.toml";

/// Top-level configuration from dialectgen.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DialectgenConfig {
    pub project: ProjectConfig,
    pub dialects: DialectsConfig,
    pub targets: TargetsConfig,
    pub graph: GraphSection,
    pub generator: GeneratorConfig,
    pub build: BuildSection,
    pub install: InstallSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Package name used in the install layout.
    pub name: Option<String>,

    /// Metadata file the version is read from (default `package.xml`).
    pub metadata: Option<Utf8PathBuf>,

    /// Version used when the metadata file is absent or unusable.
    pub default_version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DialectsConfig {
    pub dir: Option<Utf8PathBuf>,

    /// Base dialect name (default `common`).
    pub base: Option<String>,

    /// Base definition file (default `<dir>/<base>.<extension>`).
    pub base_definition: Option<Utf8PathBuf>,

    /// Replaces the built-in exclusion list when set.
    pub exclude: Option<Vec<String>>,

    pub extension: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TargetsConfig {
    pub v1: VersionTargets,
    pub v2: VersionTargets,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VersionTargets {
    /// Build this protocol version at all.
    pub enabled: bool,

    /// Dialects skipped for this version only.
    pub exclude: Vec<String>,
}

impl Default for VersionTargets {
    fn default() -> Self {
        Self {
            enabled: true,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphSection {
    /// Make the V2 base dialect wait for every other V2 dialect.
    pub base_fan_in: bool,
}

impl Default for GraphSection {
    fn default() -> Self {
        Self { base_fan_in: true }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub tool: Option<Utf8PathBuf>,
    pub interpreter: Option<String>,
    pub search_path: Vec<Utf8PathBuf>,
    pub search_path_var: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub dir: Option<Utf8PathBuf>,
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstallSection {
    pub prefix: Option<Utf8PathBuf>,
    pub license: Option<Utf8PathBuf>,
    pub resources: Option<Vec<Utf8PathBuf>>,
    pub libraries: Vec<String>,
    pub dependencies: Vec<String>,
    pub cmake_template: Option<Utf8PathBuf>,
    pub pkgconfig_template: Option<Utf8PathBuf>,
}

/// Discover the dialectgen.toml config file.
///
/// Searches for `dialectgen.toml` in the project root directory.
/// Returns `None` if no config file is found.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a dialectgen.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<DialectgenConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<DialectgenConfig> {
    let config: DialectgenConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load `explicit` if given, else the project's config, else defaults.
pub fn load_or_default(
    project_root: &Utf8Path,
    explicit: Option<&Utf8Path>,
) -> anyhow::Result<DialectgenConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match discover_config(project_root) {
        Some(path) => load_config(&path),
        None => Ok(DialectgenConfig::default()),
    }
}

/// CLI values shared by every project command. `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct ProjectOverrides {
    pub dialects_dir: Option<Utf8PathBuf>,
    pub exclude: Vec<String>,
    pub build_dir: Option<Utf8PathBuf>,
    pub metadata: Option<Utf8PathBuf>,
    pub protocols: Vec<ProtocolVersion>,
    pub no_base_fan_in: bool,
}

/// CLI values specific to `build`.
#[derive(Debug, Clone, Default)]
pub struct BuildOverrides {
    pub jobs: Option<usize>,
    pub force: bool,
    pub interpreter: Option<String>,
    pub generator: Option<Utf8PathBuf>,
}

/// Builder for merging config file with CLI arguments.
///
/// Relative paths, from either source, resolve against the project root.
pub struct ConfigMerger {
    config: DialectgenConfig,
    root: Utf8PathBuf,
}

impl ConfigMerger {
    pub fn new(config: DialectgenConfig, project_root: &Utf8Path) -> Self {
        Self {
            config,
            root: project_root.to_path_buf(),
        }
    }

    fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Merge into clap-free build settings.
    ///
    /// CLI `exclude` extends the config list; `--protocol` narrows versions;
    /// scalar flags override config values.
    pub fn build_settings(
        &self,
        project: &ProjectOverrides,
        build: &BuildOverrides,
    ) -> anyhow::Result<BuildSettings> {
        let defaults = BuildSettings::default();
        let cfg = &self.config;

        let default_version = match &cfg.project.default_version {
            Some(raw) => parse_version(raw).context("project.default_version")?,
            None => defaults.default_version,
        };

        let metadata = project
            .metadata
            .as_deref()
            .or(cfg.project.metadata.as_deref())
            .or(defaults.metadata.as_deref())
            .map(|p| self.resolve(p));

        let dialects_dir = self.resolve(
            project
                .dialects_dir
                .as_deref()
                .or(cfg.dialects.dir.as_deref())
                .unwrap_or(&defaults.dialects_dir),
        );
        let extension = cfg
            .dialects
            .extension
            .clone()
            .unwrap_or(defaults.extension);
        let base_dialect = cfg.dialects.base.clone().unwrap_or(defaults.base_dialect);
        let base_definition = match &cfg.dialects.base_definition {
            Some(p) => self.resolve(p),
            None => dialects_dir.join(format!("{}.{}", base_dialect, extension)),
        };

        let mut exclude = cfg.dialects.exclude.clone().unwrap_or(defaults.exclude);
        for name in &project.exclude {
            if !exclude.contains(name) {
                exclude.push(name.clone());
            }
        }

        let mut selection = VersionSelection::default();
        selection
            .exclude
            .insert(ProtocolVersion::V1, cfg.targets.v1.exclude.clone());
        selection
            .exclude
            .insert(ProtocolVersion::V2, cfg.targets.v2.exclude.clone());

        let versions: Vec<ProtocolVersion> = if project.protocols.is_empty() {
            ProtocolVersion::ALL
                .into_iter()
                .filter(|v| match v {
                    ProtocolVersion::V1 => cfg.targets.v1.enabled,
                    ProtocolVersion::V2 => cfg.targets.v2.enabled,
                })
                .collect()
        } else {
            let mut v = project.protocols.clone();
            v.sort();
            v.dedup();
            v
        };

        let generator_tool = self.resolve(
            build
                .generator
                .as_deref()
                .or(cfg.generator.tool.as_deref())
                .unwrap_or(&defaults.generator_tool),
        );

        let build_dir = self.resolve(
            project
                .build_dir
                .as_deref()
                .or(cfg.build.dir.as_deref())
                .unwrap_or(&defaults.build_dir),
        );

        Ok(BuildSettings {
            project_name: cfg.project.name.clone().unwrap_or(defaults.project_name),
            metadata,
            default_version,
            dialects_dir,
            extension,
            exclude,
            base_dialect,
            base_definition,
            versions,
            selection,
            base_fan_in: cfg.graph.base_fan_in && !project.no_base_fan_in,
            generator_tool,
            interpreter: build
                .interpreter
                .clone()
                .or_else(|| cfg.generator.interpreter.clone()),
            search_path: cfg
                .generator
                .search_path
                .iter()
                .map(|p| self.resolve(p))
                .collect(),
            search_path_var: cfg
                .generator
                .search_path_var
                .clone()
                .unwrap_or(defaults.search_path_var),
            build_dir,
            jobs: build.jobs.or(cfg.build.jobs).unwrap_or(defaults.jobs).max(1),
            force: build.force,
        })
    }

    /// Merge into clap-free install settings. A CLI prefix overrides the config.
    pub fn install_settings(&self, prefix: Option<&Utf8Path>) -> InstallSettings {
        let defaults = InstallSettings::default();
        let cfg = &self.config.install;

        InstallSettings {
            prefix: self.resolve(
                prefix
                    .or(cfg.prefix.as_deref())
                    .unwrap_or(&defaults.prefix),
            ),
            resources: cfg
                .resources
                .as_ref()
                .unwrap_or(&defaults.resources)
                .iter()
                .map(|p| self.resolve(p))
                .collect(),
            license: cfg
                .license
                .as_deref()
                .or(defaults.license.as_deref())
                .map(|p| self.resolve(p)),
            libraries: cfg.libraries.clone(),
            dependencies: cfg.dependencies.clone(),
            cmake_template: cfg.cmake_template.as_deref().map(|p| self.resolve(p)),
            pkgconfig_template: cfg.pkgconfig_template.as_deref().map(|p| self.resolve(p)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialectgen_types::VersionInfo;
    use tempfile::TempDir;

    fn root() -> Utf8PathBuf {
        Utf8PathBuf::from("/proj")
    }

    #[test]
    fn test_parse_full_config() {
        let contents = r#"
[project]
name = "mavlink"
metadata = "package.xml"
default_version = "2.0.0"

[dialects]
dir = "message_definitions/v1.0"
base = "common"
exclude = ["test", "python_array_test", "all"]

[targets.v2]
exclude = ["legacy"]

[graph]
base_fan_in = true

[generator]
tool = "pymavlink/tools/mavgen.py"
interpreter = "python3"
search_path = ["."]

[build]
dir = "out"
jobs = 4

[install]
prefix = "/opt/mavlink"
dependencies = ["catkin"]
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.project.name.as_deref(), Some("mavlink"));
        assert_eq!(config.dialects.exclude.as_ref().unwrap().len(), 3);
        assert_eq!(config.targets.v2.exclude, vec!["legacy"]);
        assert!(config.targets.v1.enabled);
        assert_eq!(config.build.jobs, Some(4));
        assert_eq!(config.install.dependencies, vec!["catkin"]);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.project.name.is_none());
        assert!(config.graph.base_fan_in);
        assert!(config.targets.v2.enabled);
    }

    #[test]
    fn test_unknown_field_types_rejected() {
        assert!(parse_config("[build]\njobs = \"many\"\n").is_err());
    }

    #[test]
    fn test_defaults_resolve_against_root() {
        let merger = ConfigMerger::new(DialectgenConfig::default(), &root());
        let s = merger
            .build_settings(&ProjectOverrides::default(), &BuildOverrides::default())
            .unwrap();
        assert_eq!(s.dialects_dir, "/proj/message_definitions");
        assert_eq!(s.base_definition, "/proj/message_definitions/common.xml");
        assert_eq!(s.build_dir, "/proj/build");
        assert_eq!(s.metadata.as_deref(), Some(Utf8Path::new("/proj/package.xml")));
        assert_eq!(s.exclude, vec!["test", "python_array_test"]);
        assert_eq!(s.versions, ProtocolVersion::ALL.to_vec());
        assert!(s.interpreter.is_none());
    }

    #[test]
    fn test_cli_exclude_extends_config() {
        let config = parse_config("[dialects]\nexclude = [\"all\"]\n").unwrap();
        let project = ProjectOverrides {
            exclude: vec!["all".into(), "uAvionix".into()],
            ..Default::default()
        };
        let s = ConfigMerger::new(config, &root())
            .build_settings(&project, &BuildOverrides::default())
            .unwrap();
        assert_eq!(s.exclude, vec!["all", "uAvionix"]);
    }

    #[test]
    fn test_cli_scalars_override_config() {
        let config = parse_config(
            "[build]\ndir = \"out\"\njobs = 3\n[generator]\ninterpreter = \"python3.9\"\n",
        )
        .unwrap();
        let project = ProjectOverrides {
            build_dir: Some("/tmp/b".into()),
            no_base_fan_in: true,
            ..Default::default()
        };
        let build = BuildOverrides {
            jobs: Some(8),
            interpreter: Some("python3.12".into()),
            ..Default::default()
        };
        let s = ConfigMerger::new(config, &root())
            .build_settings(&project, &build)
            .unwrap();
        assert_eq!(s.build_dir, "/tmp/b");
        assert_eq!(s.jobs, 8);
        assert_eq!(s.interpreter.as_deref(), Some("python3.12"));
        assert!(!s.base_fan_in);
    }

    #[test]
    fn test_config_interpreter_used_when_cli_absent() {
        let config = parse_config("[generator]\ninterpreter = \"python3.9\"\n").unwrap();
        let s = ConfigMerger::new(config, &root())
            .build_settings(&ProjectOverrides::default(), &BuildOverrides::default())
            .unwrap();
        assert_eq!(s.interpreter.as_deref(), Some("python3.9"));
    }

    #[test]
    fn test_version_targets_and_protocol_filter() {
        let config =
            parse_config("[targets.v1]\nenabled = false\n[targets.v2]\nexclude = [\"x\"]\n")
                .unwrap();
        let merger = ConfigMerger::new(config, &root());
        let s = merger
            .build_settings(&ProjectOverrides::default(), &BuildOverrides::default())
            .unwrap();
        assert_eq!(s.versions, vec![ProtocolVersion::V2]);
        assert!(s.selection.excludes(ProtocolVersion::V2, "x"));
        assert!(!s.selection.excludes(ProtocolVersion::V1, "x"));

        let project = ProjectOverrides {
            protocols: vec![ProtocolVersion::V1, ProtocolVersion::V1],
            ..Default::default()
        };
        let s = merger
            .build_settings(&project, &BuildOverrides::default())
            .unwrap();
        assert_eq!(s.versions, vec![ProtocolVersion::V1]);
    }

    #[test]
    fn test_default_version_from_config() {
        let config = parse_config("[project]\ndefault_version = \"3.1.4\"\n").unwrap();
        let s = ConfigMerger::new(config, &root())
            .build_settings(&ProjectOverrides::default(), &BuildOverrides::default())
            .unwrap();
        assert_eq!(s.default_version, VersionInfo::new(3, 1, 4));

        let bad = parse_config("[project]\ndefault_version = \"3.1\"\n").unwrap();
        assert!(
            ConfigMerger::new(bad, &root())
                .build_settings(&ProjectOverrides::default(), &BuildOverrides::default())
                .is_err()
        );
    }

    #[test]
    fn test_install_settings_merge() {
        let config = parse_config(
            "[install]\nprefix = \"stage\"\nresources = [\"defs\", \"/abs/res\"]\nlicense = \"COPYING\"\n",
        )
        .unwrap();
        let merger = ConfigMerger::new(config, &root());

        let s = merger.install_settings(None);
        assert_eq!(s.prefix, "/proj/stage");
        assert_eq!(
            s.resources,
            vec![Utf8PathBuf::from("/proj/defs"), Utf8PathBuf::from("/abs/res")]
        );
        assert_eq!(s.license.as_deref(), Some(Utf8Path::new("/proj/COPYING")));

        let s = merger.install_settings(Some(Utf8Path::new("/usr/local")));
        assert_eq!(s.prefix, "/usr/local");
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "").expect("write config");
        assert!(discover_config(&root).is_some());
    }

    #[test]
    fn test_load_or_default_prefers_explicit_path() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let cfg = load_or_default(&root, None).expect("load default");
        assert!(cfg.project.name.is_none());

        let explicit = root.join("other.toml");
        std::fs::write(&explicit, "[project]\nname = \"custom\"\n").unwrap();
        let cfg = load_or_default(&root, Some(&explicit)).unwrap();
        assert_eq!(cfg.project.name.as_deref(), Some("custom"));
    }
}
