//! Parallel, incremental execution of a build graph.

use crate::error::GenerationError;
use crate::fingerprint::{FingerprintStore, target_fingerprint};
use crate::generator::{GeneratedOutputs, Generator};
use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use dialectgen_types::report::{ReportCounts, TargetStatus};
use dialectgen_types::{BuildGraph, BuildTarget, TargetId, TargetOutput};
use fs_err as fs;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Maximum generator invocations in flight.
    pub jobs: usize,
    /// Where per-target fingerprints persist between runs.
    pub state_file: Utf8PathBuf,
    /// Ignore stored fingerprints and run every target.
    pub force: bool,
}

impl ExecOptions {
    pub fn for_build_dir(build_dir: &camino::Utf8Path) -> Self {
        Self {
            jobs: default_jobs(),
            state_file: build_dir.join(".dialectgen").join("fingerprints.json"),
            force: false,
        }
    }
}

pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    pub id: TargetId,
    pub status: TargetStatus,
    pub error: Option<GenerationError>,
    /// For `Blocked`: the dependency that failed or was itself blocked.
    pub blocked_by: Option<TargetId>,
    pub duration: Option<Duration>,
}

impl TargetOutcome {
    fn new(id: TargetId, status: TargetStatus) -> Self {
        Self {
            id,
            status,
            error: None,
            blocked_by: None,
            duration: None,
        }
    }

    fn failed(id: TargetId, error: GenerationError, duration: Option<Duration>) -> Self {
        Self {
            error: Some(error),
            duration,
            ..Self::new(id, TargetStatus::Failed)
        }
    }

    fn blocked(id: TargetId, by: Option<TargetId>) -> Self {
        Self {
            blocked_by: by,
            ..Self::new(id, TargetStatus::Blocked)
        }
    }

    /// One-line human explanation, if the target did not succeed.
    pub fn message(&self) -> Option<String> {
        match (&self.error, &self.blocked_by) {
            (Some(err), _) => Some(err.to_string()),
            (None, Some(dep)) => Some(format!("dependency {} did not build", dep)),
            (None, None) if self.status == TargetStatus::Blocked => {
                Some("unresolved dependency or cycle".to_string())
            }
            _ => None,
        }
    }
}

/// Per-target results of one execution, keyed and ordered by target id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutcome {
    pub targets: BTreeMap<TargetId, TargetOutcome>,
}

impl BuildOutcome {
    pub fn get(&self, id: &TargetId) -> Option<&TargetOutcome> {
        self.targets.get(id)
    }

    pub fn status(&self, id: &TargetId) -> Option<TargetStatus> {
        self.targets.get(id).map(|o| o.status)
    }

    pub fn is_success(&self) -> bool {
        self.targets.values().all(|o| o.status.is_success())
    }

    /// Failed and blocked targets, sorted.
    pub fn unsuccessful(&self) -> Vec<TargetId> {
        self.targets
            .values()
            .filter(|o| !o.status.is_success())
            .map(|o| o.id.clone())
            .collect()
    }

    pub fn counts(&self) -> ReportCounts {
        let mut counts = ReportCounts::default();
        for o in self.targets.values() {
            counts.record(o.status);
        }
        counts
    }
}

type TaskResult = (
    TargetId,
    String,
    Duration,
    Result<GeneratedOutputs, GenerationError>,
);

/// Runs every target of a graph once its target dependencies have succeeded.
///
/// Independent targets run concurrently, up to `jobs` at a time. A failed target does not
/// stop unrelated targets; its dependents are reported `Blocked`.
pub struct Executor {
    generator: Arc<dyn Generator>,
    options: ExecOptions,
}

impl Executor {
    pub fn new(generator: Arc<dyn Generator>, options: ExecOptions) -> Self {
        Self { generator, options }
    }

    pub fn options(&self) -> &ExecOptions {
        &self.options
    }

    /// Blocking entry point.
    ///
    /// Outside any runtime this owns one for the duration of the build. Inside a
    /// multi-thread runtime it blocks the calling worker in place; a current-thread
    /// runtime cannot be blocked, so callers there must use [`Executor::run_async`].
    pub fn run(&self, graph: &BuildGraph) -> anyhow::Result<BuildOutcome> {
        if let Ok(handle) = Handle::try_current() {
            if handle.runtime_flavor() == RuntimeFlavor::CurrentThread {
                bail!("Executor::run called on a current-thread runtime; use run_async");
            }
            return tokio::task::block_in_place(|| handle.block_on(self.run_async(graph)));
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .max_blocking_threads(self.options.jobs.max(1))
            .thread_name("dialectgen-exec")
            .build()
            .context("start executor runtime")?;
        runtime.block_on(self.run_async(graph))
    }

    pub async fn run_async(&self, graph: &BuildGraph) -> anyhow::Result<BuildOutcome> {
        let jobs = self.options.jobs.max(1);
        let mut store = FingerprintStore::load(&self.options.state_file)?;

        let mut waiting: HashMap<TargetId, usize> = HashMap::new();
        let mut ready: BTreeSet<TargetId> = BTreeSet::new();
        for target in graph.targets() {
            let n = target.target_deps().count();
            if n == 0 {
                ready.insert(target.id.clone());
            } else {
                waiting.insert(target.id.clone(), n);
            }
        }

        let mut fingerprints: HashMap<TargetId, String> = HashMap::new();
        let mut outcomes: BTreeMap<TargetId, TargetOutcome> = BTreeMap::new();
        let mut in_flight: JoinSet<TaskResult> = JoinSet::new();

        info!(targets = graph.len(), jobs, "starting build");

        loop {
            while in_flight.len() < jobs {
                let Some(id) = ready.pop_first() else { break };
                let Some(target) = graph.get(&id) else { continue };

                if let Some(dep) = target
                    .target_deps()
                    .find(|d| outcomes.get(*d).is_some_and(|o| !o.status.is_success()))
                {
                    warn!(target = %id, dependency = %dep, "blocked by failed dependency");
                    let outcome = TargetOutcome::blocked(id.clone(), Some(dep.clone()));
                    finish(graph, outcome, &mut outcomes, &mut waiting, &mut ready);
                    continue;
                }

                let fingerprint = match target_fingerprint(target, &fingerprints) {
                    Ok(fp) => fp,
                    Err(err) => {
                        error!(target = %id, error = %err, "cannot fingerprint target");
                        store.remove(&id);
                        let outcome = TargetOutcome::failed(id.clone(), err, None);
                        finish(graph, outcome, &mut outcomes, &mut waiting, &mut ready);
                        continue;
                    }
                };

                if !self.options.force
                    && store.get(&id) == Some(fingerprint.as_str())
                    && target.outputs.path().exists()
                {
                    debug!(target = %id, "up to date");
                    fingerprints.insert(id.clone(), fingerprint);
                    let outcome = TargetOutcome::new(id.clone(), TargetStatus::UpToDate);
                    finish(graph, outcome, &mut outcomes, &mut waiting, &mut ready);
                    continue;
                }

                if let Err(err) = prepare_output_dirs(target) {
                    store.remove(&id);
                    let outcome = TargetOutcome::failed(id.clone(), err, None);
                    finish(graph, outcome, &mut outcomes, &mut waiting, &mut ready);
                    continue;
                }

                debug!(target = %id, "scheduling generator");
                let generator = Arc::clone(&self.generator);
                let request = target.command.clone();
                in_flight.spawn_blocking(move || {
                    let started = Instant::now();
                    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
                        generator.generate(&request)
                    }))
                    .unwrap_or_else(|panic| {
                        Err(GenerationError::Panicked {
                            message: panic_message(panic.as_ref()),
                        })
                    });
                    (id, fingerprint, started.elapsed(), result)
                });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            let (id, fingerprint, elapsed, result) = joined.context("generator task aborted")?;
            let Some(target) = graph.get(&id) else { continue };

            let result = result.and_then(|_| record_outputs(target, &fingerprint));
            let outcome = match result {
                Ok(()) => {
                    info!(target = %id, ms = elapsed.as_millis() as u64, "built");
                    store.insert(id.clone(), fingerprint.clone());
                    fingerprints.insert(id.clone(), fingerprint);
                    TargetOutcome {
                        duration: Some(elapsed),
                        ..TargetOutcome::new(id.clone(), TargetStatus::Built)
                    }
                }
                Err(err) => {
                    error!(target = %id, error = %err, "generation failed");
                    store.remove(&id);
                    TargetOutcome::failed(id.clone(), err, Some(elapsed))
                }
            };
            finish(graph, outcome, &mut outcomes, &mut waiting, &mut ready);
        }

        // Anything never released sits on a cycle or an unknown dependency.
        for target in graph.targets() {
            if !outcomes.contains_key(&target.id) {
                warn!(target = %target.id, "never became ready; marking blocked");
                outcomes.insert(target.id.clone(), TargetOutcome::blocked(target.id.clone(), None));
            }
        }

        store.retain(|id| graph.contains(id));
        if store.save()? {
            debug!(path = %store.path(), "saved fingerprints");
        }

        let outcome = BuildOutcome { targets: outcomes };
        let counts = outcome.counts();
        info!(
            built = counts.built,
            up_to_date = counts.up_to_date,
            failed = counts.failed,
            blocked = counts.blocked,
            "build finished"
        );
        Ok(outcome)
    }
}

fn finish(
    graph: &BuildGraph,
    outcome: TargetOutcome,
    outcomes: &mut BTreeMap<TargetId, TargetOutcome>,
    waiting: &mut HashMap<TargetId, usize>,
    ready: &mut BTreeSet<TargetId>,
) {
    let id = outcome.id.clone();
    outcomes.insert(id.clone(), outcome);
    for dependent in graph.dependents_of(&id) {
        if let Some(n) = waiting.get_mut(&dependent.id) {
            *n -= 1;
            if *n == 0 {
                waiting.remove(&dependent.id);
                ready.insert(dependent.id.clone());
            }
        }
    }
}

fn io_error(path: &camino::Utf8Path, err: std::io::Error) -> GenerationError {
    GenerationError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn prepare_output_dirs(target: &BuildTarget) -> Result<(), GenerationError> {
    let dir = &target.command.output_dir;
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))
}

/// Verify declared files exist, or write the stamp for versions that do not track files.
fn record_outputs(target: &BuildTarget, fingerprint: &str) -> Result<(), GenerationError> {
    match &target.outputs {
        TargetOutput::File(path) => {
            if path.exists() {
                Ok(())
            } else {
                Err(GenerationError::MissingOutput { path: path.clone() })
            }
        }
        TargetOutput::Stamp(path) => {
            if fs::read_to_string(path).is_ok_and(|existing| existing.trim() == fingerprint) {
                return Ok(());
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
            }
            fs::write(path, format!("{}\n", fingerprint)).map_err(|e| io_error(path, e))
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
