//! Installer: stage generated headers, shared resources, and rendered package descriptors
//! into a prefix.
//!
//! Layout under the prefix:
//! - `include/<project>/<ns>/**`: generated code, copied from `<build>/include/<ns>`
//! - `share/<project>/<resource>/**`: static resources
//! - `share/<project>/<license>`, `share/<project>/<manifest>`: copied verbatim
//! - `share/<project>/cmake/<project>-config.cmake`, `lib/pkgconfig/<project>.pc`: rendered
//!
//! Destination files whose content already matches are left untouched.

mod templates;

pub use templates::{CMAKE_CONFIG, PKGCONFIG};

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use dialectgen_render::render_template;
use dialectgen_types::{PackageManifest, ProtocolVersion, VersionInfo};
use fs_err as fs;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub build_dir: Utf8PathBuf,
    pub prefix: Utf8PathBuf,
    /// Static resource files or directories, copied under `share/<project>/`.
    pub resources: Vec<Utf8PathBuf>,
    pub license: Option<Utf8PathBuf>,
    /// Project metadata manifest (e.g. `package.xml`), copied verbatim.
    pub metadata: Option<Utf8PathBuf>,
    /// Replacement for the built-in CMake config template.
    pub cmake_template: Option<Utf8PathBuf>,
    /// Replacement for the built-in pkg-config template.
    pub pkgconfig_template: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub written: Vec<Utf8PathBuf>,
    pub unchanged: Vec<Utf8PathBuf>,
}

impl InstallReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.unchanged.len()
    }
}

/// Variables available to descriptor templates.
pub fn template_vars(
    request: &InstallRequest,
    version: &VersionInfo,
    manifest: &PackageManifest,
) -> BTreeMap<String, String> {
    let project = &manifest.project;
    let vars = [
        ("PROJECT_NAME", project.clone()),
        ("VERSION", version.to_string()),
        ("VERSION_MAJOR", version.major.to_string()),
        ("VERSION_MINOR", version.minor.to_string()),
        ("VERSION_PATCH", version.patch.to_string()),
        ("DIALECTS_V1", manifest.dialects(ProtocolVersion::V1).join(";")),
        ("DIALECTS_V2", manifest.dialects(ProtocolVersion::V2).join(";")),
        ("LIBRARIES", manifest.libraries.join(";")),
        ("DEPENDENCIES", manifest.dependencies.join(";")),
        ("PKGCONFIG_REQUIRES", manifest.dependencies.join(", ")),
        ("PREFIX", request.prefix.to_string()),
        (
            "INCLUDE_DIR",
            request.prefix.join("include").join(project).to_string(),
        ),
    ];
    vars.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

pub fn install(
    request: &InstallRequest,
    version: &VersionInfo,
    manifest: &PackageManifest,
) -> anyhow::Result<InstallReport> {
    let project = manifest.project.as_str();
    if project.is_empty() {
        bail!("project name is empty");
    }

    let mut report = InstallReport::default();
    let include_root = request.prefix.join("include").join(project);
    let share_root = request.prefix.join("share").join(project);

    for version in manifest.dialects_per_version.keys() {
        let ns = version.namespace();
        let src = request.build_dir.join("include").join(ns);
        if !src.is_dir() {
            bail!("no generated output for {} at {}; run the build first", ns, src);
        }
        copy_tree(&src, &include_root.join(ns), &mut report)?;
    }

    for resource in &request.resources {
        let Some(name) = resource.file_name() else {
            warn!(path = %resource, "resource path has no file name; skipping");
            continue;
        };
        let dest = share_root.join(name);
        if resource.is_dir() {
            copy_tree(resource, &dest, &mut report)?;
        } else if resource.is_file() {
            copy_file(resource, &dest, &mut report)?;
        } else {
            warn!(path = %resource, "resource not found; skipping");
        }
    }

    for file in [&request.license, &request.metadata].into_iter().flatten() {
        match file.file_name() {
            Some(name) if file.is_file() => copy_file(file, &share_root.join(name), &mut report)?,
            _ => warn!(path = %file, "file not found; skipping"),
        }
    }

    let vars = template_vars(request, version, manifest);
    let cmake = load_template(request.cmake_template.as_deref(), CMAKE_CONFIG)?;
    let cmake = render_template(&cmake, &vars).context("render cmake config")?;
    sync_bytes(
        cmake.as_bytes(),
        &share_root.join("cmake").join(format!("{}-config.cmake", project)),
        &mut report,
    )?;

    let pc = load_template(request.pkgconfig_template.as_deref(), PKGCONFIG)?;
    let pc = render_template(&pc, &vars).context("render pkg-config file")?;
    sync_bytes(
        pc.as_bytes(),
        &request
            .prefix
            .join("lib")
            .join("pkgconfig")
            .join(format!("{}.pc", project)),
        &mut report,
    )?;

    info!(
        prefix = %request.prefix,
        written = report.written.len(),
        unchanged = report.unchanged.len(),
        "install complete"
    );
    Ok(report)
}

fn load_template(path: Option<&Utf8Path>, builtin: &str) -> anyhow::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p).with_context(|| format!("read template {}", p)),
        None => Ok(builtin.to_string()),
    }
}

fn copy_tree(src: &Utf8Path, dest: &Utf8Path, report: &mut InstallReport) -> anyhow::Result<()> {
    let pattern = format!("{}/**/*", glob::Pattern::escape(src.as_str()));
    let mut files = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("invalid pattern {}", pattern))? {
        let path = entry.with_context(|| format!("walk {}", src))?;
        let path = Utf8PathBuf::try_from(path).context("non-UTF-8 path")?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    for file in files {
        let rel = file
            .strip_prefix(src)
            .with_context(|| format!("{} is outside {}", file, src))?;
        copy_file(&file, &dest.join(rel), report)?;
    }
    Ok(())
}

fn copy_file(src: &Utf8Path, dest: &Utf8Path, report: &mut InstallReport) -> anyhow::Result<()> {
    let bytes = fs::read(src)?;
    sync_bytes(&bytes, dest, report)
}

fn sync_bytes(bytes: &[u8], dest: &Utf8Path, report: &mut InstallReport) -> anyhow::Result<()> {
    if dest.is_file() && fs::read(dest)? == bytes {
        debug!(path = %dest, "unchanged");
        report.unchanged.push(dest.to_path_buf());
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, bytes)?;
    debug!(path = %dest, "installed");
    report.written.push(dest.to_path_buf());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vars_join_dialects_with_semicolons() {
        let request = InstallRequest {
            build_dir: "build".into(),
            prefix: "/opt/mav".into(),
            resources: vec![],
            license: None,
            metadata: None,
            cmake_template: None,
            pkgconfig_template: None,
        };
        let manifest = PackageManifest {
            project: "mavlink".into(),
            libraries: vec![],
            dependencies: vec!["a".into(), "b".into()],
            dialects_per_version: BTreeMap::from([
                (ProtocolVersion::V1, vec!["common".into(), "minimal".into()]),
                (ProtocolVersion::V2, vec!["common".into()]),
            ]),
        };
        let vars = template_vars(&request, &VersionInfo::new(2, 3, 1), &manifest);
        assert_eq!(vars["DIALECTS_V1"], "common;minimal");
        assert_eq!(vars["DIALECTS_V2"], "common");
        assert_eq!(vars["VERSION"], "2.3.1");
        assert_eq!(vars["VERSION_MINOR"], "3");
        assert_eq!(vars["DEPENDENCIES"], "a;b");
        assert_eq!(vars["PKGCONFIG_REQUIRES"], "a, b");
        assert_eq!(vars["INCLUDE_DIR"], "/opt/mav/include/mavlink");
    }

    #[test]
    fn builtin_templates_only_use_known_vars() {
        let request = InstallRequest {
            build_dir: "build".into(),
            prefix: "/usr".into(),
            resources: vec![],
            license: None,
            metadata: None,
            cmake_template: None,
            pkgconfig_template: None,
        };
        let manifest = PackageManifest {
            project: "mavlink".into(),
            libraries: vec![],
            dependencies: vec![],
            dialects_per_version: BTreeMap::new(),
        };
        let vars = template_vars(&request, &VersionInfo::new(1, 0, 0), &manifest);
        let cmake = render_template(CMAKE_CONFIG, &vars).unwrap();
        assert!(cmake.contains("set(mavlink_VERSION \"1.0.0\")"));
        assert!(cmake.contains("${CMAKE_CURRENT_LIST_DIR}"));
        let pc = render_template(PKGCONFIG, &vars).unwrap();
        assert!(pc.starts_with("prefix=/usr\n"));
    }
}
