//! Core plan, build, and install pipelines, extracted from the CLI.
//!
//! Discovery and graph construction errors abort before anything is generated.
//! Generation errors are isolated per target and surface as [`ToolError::GenerationFailed`]
//! once every other target has had its chance to build.

use crate::ports::{Generator, WritePort};
use crate::settings::{BuildSettings, InstallSettings};
use anyhow::Context;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use dialectgen_discovery::discover_dialects_with_extension;
use dialectgen_domain::{
    GraphBuilder, GraphConfig, GraphInputs, ResolvedVersion, build_manifest, resolve_version,
};
use dialectgen_exec::{BuildOutcome, ExecOptions, Executor};
use dialectgen_install::{InstallReport, InstallRequest, install};
use dialectgen_render::{render_graph_md, render_report_md};
use dialectgen_types::report::{
    BuildReport, ReportCounts, ReportRunInfo, ReportStatus, ReportToolInfo, ReportVerdict,
    TargetReport,
};
use dialectgen_types::schema::DIALECTGEN_REPORT_V1;
use dialectgen_types::wire::GraphV1;
use dialectgen_types::{BuildGraph, DialectDefinition, PackageManifest};
use std::sync::Arc;
use tracing::{debug, info};

/// Error type for pipeline results. Exit code 2 = generation failure, 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("generation failed for {}", .targets.join(", "))]
    GenerationFailed { targets: Vec<String> },
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::GenerationFailed { .. } => 2,
            ToolError::Internal(_) => 1,
        }
    }
}

/// Outcome of `run_plan`.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub version: ResolvedVersion,
    pub dialects: Vec<DialectDefinition>,
    pub graph: BuildGraph,
    pub manifest: PackageManifest,
}

/// Discover dialects with the configured directory, extension, and exclusions.
pub fn discover(settings: &BuildSettings) -> anyhow::Result<Vec<DialectDefinition>> {
    let dialects = discover_dialects_with_extension(
        &settings.dialects_dir,
        &settings.extension,
        &settings.exclude,
    )
    .with_context(|| format!("discover dialects in {}", settings.dialects_dir))?;
    Ok(dialects)
}

/// Resolve the version, discover dialects, and construct the build graph.
///
/// Version resolution and discovery are independent; both feed the graph builder.
pub fn run_plan(settings: &BuildSettings) -> Result<PlanOutcome, ToolError> {
    let version = resolve_version(settings.metadata.as_deref(), settings.default_version);
    let dialects = discover(settings)?;
    info!(
        count = dialects.len(),
        dir = %settings.dialects_dir,
        version = %version.version,
        "discovered dialects"
    );

    let config = GraphConfig {
        build_dir: settings.build_dir.clone(),
        versions: settings.versions.clone(),
        base_dialect: settings.base_dialect.clone(),
        selection: settings.selection.clone(),
        search_path: settings.search_path.clone(),
        base_fan_in: settings.base_fan_in,
    };
    let inputs = GraphInputs {
        dialects: dialects.clone(),
        base_definition: settings.base_definition.clone(),
        generator_tool: settings.generator_tool.clone(),
    };
    let graph = GraphBuilder::new(config)
        .build(&inputs)
        .context("construct build graph")?;

    let manifest = build_manifest(&settings.project_name, &[], &[], &graph);

    Ok(PlanOutcome {
        version,
        dialects,
        graph,
        manifest,
    })
}

/// Write `graph.json` and `graph.md` into `out_dir`.
pub fn write_plan_artifacts(
    outcome: &PlanOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let wire = GraphV1::from(&outcome.graph);
    let json = serde_json::to_string_pretty(&wire).context("serialize graph")?;
    writer.write_file(&out_dir.join("graph.json"), json.as_bytes())?;

    let md = render_graph_md(&outcome.graph);
    writer.write_file(&out_dir.join("graph.md"), md.as_bytes())?;
    Ok(())
}

/// Outcome of `run_build`.
#[derive(Debug, Clone)]
pub struct BuildRun {
    pub plan: PlanOutcome,
    pub outcome: BuildOutcome,
    pub report: BuildReport,
}

impl BuildRun {
    /// `Err(GenerationFailed)` naming every failed or blocked target.
    pub fn check(&self) -> Result<(), ToolError> {
        let unsuccessful = self.outcome.unsuccessful();
        if unsuccessful.is_empty() {
            Ok(())
        } else {
            Err(ToolError::GenerationFailed {
                targets: unsuccessful.iter().map(|id| id.to_string()).collect(),
            })
        }
    }
}

/// Plan, then execute every target with `generator`.
///
/// Returns `Ok` even when targets failed; inspect [`BuildRun::check`] after writing
/// artifacts so the report always lands on disk.
pub fn run_build(
    settings: &BuildSettings,
    generator: Arc<dyn Generator>,
    tool: ReportToolInfo,
) -> Result<BuildRun, ToolError> {
    let plan = run_plan(settings)?;
    let started_at = Utc::now();

    let options = ExecOptions {
        jobs: settings.jobs.max(1),
        force: settings.force,
        ..ExecOptions::for_build_dir(&settings.build_dir)
    };
    let outcome = Executor::new(generator, options)
        .run(&plan.graph)
        .context("execute build graph")?;

    let report = report_from_outcome(&plan.graph, &outcome, tool, started_at, Utc::now());
    Ok(BuildRun {
        plan,
        outcome,
        report,
    })
}

/// Write graph artifacts plus `report.json` and `report.md` into `out_dir`.
pub fn write_build_artifacts(
    run: &BuildRun,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    write_plan_artifacts(&run.plan, out_dir, writer)?;

    let json = serde_json::to_string_pretty(&run.report).context("serialize report")?;
    writer.write_file(&out_dir.join("report.json"), json.as_bytes())?;

    let md = render_report_md(&run.report);
    writer.write_file(&out_dir.join("report.md"), md.as_bytes())?;
    Ok(())
}

pub(crate) fn report_from_outcome(
    graph: &BuildGraph,
    outcome: &BuildOutcome,
    tool: ReportToolInfo,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> BuildReport {
    let mut counts = ReportCounts::default();
    let mut targets = Vec::with_capacity(graph.len());

    for target in graph.targets() {
        let Some(o) = outcome.get(&target.id) else {
            continue;
        };
        counts.record(o.status);
        targets.push(TargetReport {
            id: target.id.clone(),
            version: target.version,
            dialect: target.dialect.name.clone(),
            status: o.status,
            message: o.message(),
            duration_ms: o.duration.map(|d| d.as_millis() as u64),
        });
    }

    let mut reasons = Vec::new();
    if counts.failed > 0 {
        reasons.push(format!("{} target(s) failed", counts.failed));
    }
    if counts.blocked > 0 {
        reasons.push(format!("{} target(s) blocked", counts.blocked));
    }
    let status = if reasons.is_empty() {
        ReportStatus::Pass
    } else {
        ReportStatus::Fail
    };

    let duration_ms = (ended_at - started_at).num_milliseconds().max(0) as u64;

    BuildReport {
        schema: DIALECTGEN_REPORT_V1.to_string(),
        tool,
        run: ReportRunInfo {
            build_id: uuid::Uuid::new_v4().to_string(),
            started_at: started_at.to_rfc3339(),
            ended_at: Some(ended_at.to_rfc3339()),
            duration_ms: Some(duration_ms),
        },
        verdict: ReportVerdict {
            status,
            counts,
            reasons,
        },
        targets,
        data: None,
    }
}

/// Plan (for the version and dialect lists), then stage the build output into the prefix.
pub fn run_install(
    build: &BuildSettings,
    settings: &InstallSettings,
) -> Result<InstallReport, ToolError> {
    let plan = run_plan(build)?;
    let manifest = build_manifest(
        &build.project_name,
        &settings.libraries,
        &settings.dependencies,
        &plan.graph,
    );

    let request = InstallRequest {
        build_dir: build.build_dir.clone(),
        prefix: settings.prefix.clone(),
        resources: settings.resources.clone(),
        license: settings.license.clone(),
        metadata: build.metadata.clone(),
        cmake_template: settings.cmake_template.clone(),
        pkgconfig_template: settings.pkgconfig_template.clone(),
    };
    debug!(prefix = %request.prefix, "installing");

    let report = install(&request, &plan.version.version, &manifest).context("install")?;
    Ok(report)
}
