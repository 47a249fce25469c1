use camino::{Utf8Path, Utf8PathBuf};
use dialectgen_install::{InstallRequest, install};
use dialectgen_types::{PackageManifest, ProtocolVersion, VersionInfo};
use fs_err as fs;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

struct Fixture {
    _tmp: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        let f = Self { _tmp: tmp, root };
        f.write("build/include/v1.0/common/common.h", "// v1 common\n");
        f.write("build/include/v1.0/minimal/minimal.h", "// v1 minimal\n");
        f.write("build/include/v2.0/common/common.hpp", "// v2 common\n");
        f.write("message_definitions/common.xml", "<mavlink/>\n");
        f.write("LICENSE", "MIT\n");
        f.write("package.xml", "<package><version>2.3.1</version></package>\n");
        f
    }

    fn write(&self, rel: &str, contents: &str) {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn request(&self) -> InstallRequest {
        InstallRequest {
            build_dir: self.root.join("build"),
            prefix: self.root.join("prefix"),
            resources: vec![self.root.join("message_definitions")],
            license: Some(self.root.join("LICENSE")),
            metadata: Some(self.root.join("package.xml")),
            cmake_template: None,
            pkgconfig_template: None,
        }
    }

    fn prefix(&self, rel: &str) -> Utf8PathBuf {
        self.root.join("prefix").join(rel)
    }
}

fn manifest() -> PackageManifest {
    PackageManifest {
        project: "mavlink".into(),
        libraries: vec![],
        dependencies: vec!["roscpp".into()],
        dialects_per_version: BTreeMap::from([
            (ProtocolVersion::V1, vec!["common".into(), "minimal".into()]),
            (ProtocolVersion::V2, vec!["common".into(), "minimal".into()]),
        ]),
    }
}

fn read(path: &Utf8Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn installs_headers_resources_and_descriptors() {
    let f = Fixture::new();
    let report = install(&f.request(), &VersionInfo::new(2, 3, 1), &manifest()).unwrap();

    assert_eq!(read(&f.prefix("include/mavlink/v1.0/common/common.h")), "// v1 common\n");
    assert!(f.prefix("include/mavlink/v1.0/minimal/minimal.h").is_file());
    assert!(f.prefix("include/mavlink/v2.0/common/common.hpp").is_file());
    assert!(f.prefix("share/mavlink/message_definitions/common.xml").is_file());
    assert_eq!(read(&f.prefix("share/mavlink/LICENSE")), "MIT\n");
    assert!(f.prefix("share/mavlink/package.xml").is_file());

    let cmake = read(&f.prefix("share/mavlink/cmake/mavlink-config.cmake"));
    assert!(cmake.contains("set(mavlink_VERSION \"2.3.1\")"));
    assert!(cmake.contains("set(mavlink_DIALECTS_V20 \"common;minimal\")"));
    assert!(!cmake.contains("@PROJECT_NAME@"));

    let pc = read(&f.prefix("lib/pkgconfig/mavlink.pc"));
    assert!(pc.contains("Version: 2.3.1"));
    assert!(pc.contains("Requires: roscpp"));

    assert_eq!(report.written.len(), 8);
    assert!(report.unchanged.is_empty());
}

#[test]
fn reinstall_rewrites_nothing() {
    let f = Fixture::new();
    let first = install(&f.request(), &VersionInfo::new(1, 0, 0), &manifest()).unwrap();
    let second = install(&f.request(), &VersionInfo::new(1, 0, 0), &manifest()).unwrap();
    assert!(second.written.is_empty());
    assert_eq!(second.unchanged.len(), first.total());
}

#[test]
fn version_change_rewrites_only_descriptors() {
    let f = Fixture::new();
    install(&f.request(), &VersionInfo::new(1, 0, 0), &manifest()).unwrap();
    let report = install(&f.request(), &VersionInfo::new(1, 1, 0), &manifest()).unwrap();
    assert_eq!(
        report.written,
        vec![
            f.prefix("share/mavlink/cmake/mavlink-config.cmake"),
            f.prefix("lib/pkgconfig/mavlink.pc"),
        ]
    );
}

#[test]
fn template_override_is_used() {
    let f = Fixture::new();
    f.write("templates/config.cmake.in", "# @PROJECT_NAME@ @VERSION_MAJOR@\n");
    let request = InstallRequest {
        cmake_template: Some(f.root.join("templates/config.cmake.in")),
        ..f.request()
    };
    install(&request, &VersionInfo::new(4, 0, 0), &manifest()).unwrap();
    assert_eq!(
        read(&f.prefix("share/mavlink/cmake/mavlink-config.cmake")),
        "# mavlink 4\n"
    );
}

#[test]
fn undefined_template_variable_fails() {
    let f = Fixture::new();
    f.write("templates/bad.pc.in", "Name: @NOPE@\n");
    let request = InstallRequest {
        pkgconfig_template: Some(f.root.join("templates/bad.pc.in")),
        ..f.request()
    };
    let err = install(&request, &VersionInfo::new(1, 0, 0), &manifest()).unwrap_err();
    assert!(format!("{err:#}").contains("NOPE"));
}

#[test]
fn missing_generated_output_is_an_error() {
    let f = Fixture::new();
    fs::remove_dir_all(f.root.join("build/include/v2.0")).unwrap();
    let err = install(&f.request(), &VersionInfo::new(1, 0, 0), &manifest()).unwrap_err();
    assert!(err.to_string().contains("v2.0"));
}

#[test]
fn missing_optional_files_are_skipped() {
    let f = Fixture::new();
    let request = InstallRequest {
        license: Some(f.root.join("COPYING")),
        resources: vec![f.root.join("no_such_dir")],
        ..f.request()
    };
    let report = install(&request, &VersionInfo::new(1, 0, 0), &manifest()).unwrap();
    assert!(!f.prefix("share/mavlink/COPYING").exists());
    assert!(f.prefix("share/mavlink/package.xml").is_file());
    assert_eq!(report.written.len(), 6);
}
