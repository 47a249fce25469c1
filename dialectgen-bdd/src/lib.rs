//! BDD harness (cucumber-rs).
//!
//! This crate exists to keep scenario tests isolated from the production crates.
//! The fixtures here build throwaway projects whose generator is a POSIX shell script.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use dialectgen_cli::config::{CONFIG_FILE_NAME, parse_config};
use fs_err as fs;
use tempfile::TempDir;

/// Stand-in generator. Writes `<output>/<name>/<name>.h`, appends `<output> <name>` to
/// `<output>/../../invocations.log`, and fails for any definition whose stem is listed
/// in `FAIL_DIALECTS` (space separated).
pub const FAKE_GENERATOR: &str = r#"#!/bin/sh
out=""
def=""
for a in "$@"; do
  case "$a" in
    --output=*) out="${a#--output=}" ;;
    --*) ;;
    *) def="$a" ;;
  esac
done
name=$(basename "$def" .xml)
for f in $FAIL_DIALECTS; do
  if [ "$f" = "$name" ]; then
    echo "$name: definition rejected" >&2
    exit 1
  fi
done
mkdir -p "$out/$name"
echo "// $name" > "$out/$name/$name.h"
echo "$out $name" >> "$out/../../invocations.log"
"#;

/// A scratch project on disk.
#[derive(Debug)]
pub struct Project {
    _temp: TempDir,
    pub root: Utf8PathBuf,
}

impl Project {
    pub fn new() -> anyhow::Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .map_err(|p| anyhow::anyhow!("non-UTF-8 tempdir {}", p.display()))?;

        fs::create_dir_all(root.join("message_definitions"))?;
        fs::write(root.join("gen.sh"), FAKE_GENERATOR)?;
        fs::write(
            root.join(CONFIG_FILE_NAME),
            r#"
[project]
name = "mavlink"

[generator]
tool = "gen.sh"
interpreter = "sh"
"#,
        )?;

        Ok(Self { _temp: temp, root })
    }

    pub fn definitions_dir(&self) -> Utf8PathBuf {
        self.root.join("message_definitions")
    }

    pub fn add_dialect(&self, name: &str) -> anyhow::Result<()> {
        self.write_dialect(name, &format!("<mavlink>{name}</mavlink>\n"))
    }

    pub fn write_dialect(&self, name: &str, contents: &str) -> anyhow::Result<()> {
        let path = self.definitions_dir().join(format!("{name}.xml"));
        fs::write(&path, contents).with_context(|| format!("write {}", path))
    }

    /// Append a TOML fragment to the project config. The result must still parse.
    pub fn append_config(&self, fragment: &str) -> anyhow::Result<()> {
        let path = self.root.join(CONFIG_FILE_NAME);
        let mut config = fs::read_to_string(&path)?;
        config.push_str(fragment);
        parse_config(&config).with_context(|| format!("invalid config after appending to {}", path))?;
        fs::write(&path, config)?;
        Ok(())
    }

    pub fn path(&self, rel: &str) -> Utf8PathBuf {
        self.root.join(rel)
    }

    /// Dialect names the generator was invoked for under `ns`, in invocation order.
    pub fn invocations(&self, ns: &str) -> anyhow::Result<Vec<String>> {
        let log = self.root.join("build").join("invocations.log");
        if !log.is_file() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&log)?;
        let marker = format!("/{ns}");
        Ok(text
            .lines()
            .filter_map(|line| line.split_once(' '))
            .filter(|(out, _)| out.ends_with(&marker))
            .map(|(_, name)| name.to_string())
            .collect())
    }

    /// Remove the invocation log so the next run starts counting from zero.
    pub fn reset_invocations(&self) -> anyhow::Result<()> {
        let log = self.root.join("build").join("invocations.log");
        if log.is_file() {
            fs::remove_file(&log)?;
        }
        Ok(())
    }

    pub fn read_json(&self, rel: &str) -> anyhow::Result<serde_json::Value> {
        let path = self.root.join(rel);
        let text = fs::read_to_string(&path)?;
        serde_json::from_str(&text).with_context(|| format!("parse {}", path))
    }
}

/// Relative path of a target's primary output under the project root.
pub fn output_path(ns: &str, dialect: &str) -> String {
    if ns == "v1.0" {
        format!("build/include/{ns}/{dialect}/{dialect}.h")
    } else {
        format!("build/stamps/{ns}/{dialect}.stamp")
    }
}

pub fn is_file(root: &Utf8Path, rel: &str) -> bool {
    root.join(rel).is_file()
}
