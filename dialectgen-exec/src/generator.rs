use crate::error::{ConfigurationWarning, GenerationError};
use camino::{Utf8Path, Utf8PathBuf};
use dialectgen_types::GenerationRequest;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

pub const DEFAULT_INTERPRETER: &str = "python3";

pub const DEFAULT_SEARCH_PATH_VAR: &str = "PYTHONPATH";

/// Bytes of stderr kept in a `NonZeroExit` error.
const STDERR_TAIL: usize = 4096;

/// Files a generator reports having written. May be empty when it cannot tell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedOutputs {
    pub files: Vec<Utf8PathBuf>,
}

/// The code generator, treated as a black box.
pub trait Generator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedOutputs, GenerationError>;
}

/// Pick the interpreter, falling back to [`DEFAULT_INTERPRETER`] with a warning.
pub fn resolve_interpreter(configured: Option<&str>) -> (String, Option<ConfigurationWarning>) {
    match configured.map(str::trim).filter(|s| !s.is_empty()) {
        Some(interpreter) => (interpreter.to_string(), None),
        None => {
            let warning = ConfigurationWarning::MissingInterpreter {
                default: DEFAULT_INTERPRETER.to_string(),
            };
            warn!("{}", warning);
            (DEFAULT_INTERPRETER.to_string(), Some(warning))
        }
    }
}

/// Runs `<interpreter> <tool> <request args>` as a child process.
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    pub interpreter: String,
    pub tool: Utf8PathBuf,
    /// Environment variable the request's search path is prepended to.
    pub search_path_var: String,
}

impl ProcessGenerator {
    pub fn new(interpreter: impl Into<String>, tool: impl Into<Utf8PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            tool: tool.into(),
            search_path_var: DEFAULT_SEARCH_PATH_VAR.to_string(),
        }
    }

    pub fn with_search_path_var(mut self, var: impl Into<String>) -> Self {
        self.search_path_var = var.into();
        self
    }

    pub fn tool(&self) -> &Utf8Path {
        &self.tool
    }

    fn command(&self, request: &GenerationRequest) -> Result<Command, GenerationError> {
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(self.tool.as_str()).args(request.args());

        if !request.search_path.is_empty() {
            let mut paths: Vec<PathBuf> = request
                .search_path
                .iter()
                .map(|p| p.as_std_path().to_path_buf())
                .collect();
            if let Some(existing) = std::env::var_os(&self.search_path_var) {
                paths.extend(std::env::split_paths(&existing));
            }
            let joined = std::env::join_paths(paths).map_err(|e| GenerationError::Spawn {
                program: self.interpreter.clone(),
                message: format!("invalid {}: {}", self.search_path_var, e),
            })?;
            cmd.env(&self.search_path_var, joined);
        }

        Ok(cmd)
    }
}

impl Generator for ProcessGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedOutputs, GenerationError> {
        let mut cmd = self.command(request)?;
        debug!(
            interpreter = %self.interpreter,
            tool = %self.tool,
            args = ?request.args(),
            "invoking generator"
        );

        let output = cmd.output().map_err(|e| GenerationError::Spawn {
            program: self.interpreter.clone(),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GenerationError::NonZeroExit {
                status: output.status.to_string(),
                stderr: tail(stderr.trim(), STDERR_TAIL).to_string(),
            });
        }

        Ok(GeneratedOutputs::default())
    }
}

fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialectgen_types::ProtocolVersion;

    fn request() -> GenerationRequest {
        GenerationRequest {
            language: "C".to_string(),
            wire_version: ProtocolVersion::V1,
            output_dir: "out".into(),
            definition: "defs/common.xml".into(),
            search_path: vec!["gen".into()],
        }
    }

    #[test]
    fn configured_interpreter_has_no_warning() {
        let (interp, warning) = resolve_interpreter(Some("python3.11"));
        assert_eq!(interp, "python3.11");
        assert!(warning.is_none());
    }

    #[test]
    fn missing_interpreter_defaults_with_warning() {
        for configured in [None, Some(""), Some("  ")] {
            let (interp, warning) = resolve_interpreter(configured);
            assert_eq!(interp, DEFAULT_INTERPRETER);
            assert!(matches!(
                warning,
                Some(ConfigurationWarning::MissingInterpreter { .. })
            ));
        }
    }

    #[test]
    fn command_passes_tool_then_request_args() {
        let generator = ProcessGenerator::new("python3", "tools/mavgen.py")
            .with_search_path_var("DIALECTGEN_TEST_SEARCH_PATH");
        let cmd = generator.command(&request()).unwrap();
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            args,
            vec![
                "tools/mavgen.py",
                "--lang=C",
                "--wire-protocol=1.0",
                "--output=out",
                "defs/common.xml",
            ]
        );
        let env: Vec<_> = cmd.get_envs().collect();
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].0, "DIALECTGEN_TEST_SEARCH_PATH");
    }

    #[test]
    fn unstartable_interpreter_is_spawn_error() {
        let generator = ProcessGenerator::new("/nonexistent/dialectgen-interpreter", "tool.py");
        let err = generator.generate(&request()).unwrap_err();
        assert!(matches!(err, GenerationError::Spawn { .. }));
    }

    #[test]
    fn tail_respects_char_boundaries() {
        assert_eq!(tail("abc", 10), "abc");
        assert_eq!(tail("abcdef", 2), "ef");
        assert_eq!(tail("aé", 1), "");
    }
}
