use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use dialectgen_cli::config::{self, BuildOverrides, ConfigMerger, ProjectOverrides};
use dialectgen_core::VersionSource;
use dialectgen_core::adapters::{FsWritePort, process_generator};
use dialectgen_core::pipeline::{
    ToolError, run_build, run_install, run_plan, write_build_artifacts, write_plan_artifacts,
};
use dialectgen_core::settings::BuildSettings;
use dialectgen_types::ProtocolVersion;
use dialectgen_types::report::ReportToolInfo;
use std::collections::BTreeMap;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "dialectgen",
    version,
    about = "Build-graph orchestrator for multi-dialect protocol binding generation."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover dialects and write the build graph without generating anything.
    Plan(PlanArgs),
    /// Generate bindings for every (dialect, protocol version) target.
    Build(BuildArgs),
    /// Stage generated headers, resources, and package descriptors into a prefix.
    Install(InstallArgs),
    /// List the dialects that build for each protocol version.
    ListDialects(ListDialectsArgs),
    /// Print the resolved project version.
    Version(ProjectArgs),
}

#[derive(Debug, Clone, clap::Args)]
struct ProjectArgs {
    /// Project root (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Config file (default: <project_root>/dialectgen.toml).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Directory holding the dialect definition files.
    #[arg(long)]
    dialects_dir: Option<Utf8PathBuf>,

    /// Additional dialect names to skip (extends the configured list).
    #[arg(long)]
    exclude: Vec<String>,

    /// Build directory for generated output, stamps, and artifacts.
    #[arg(long)]
    build_dir: Option<Utf8PathBuf>,

    /// Metadata file the project version is read from.
    #[arg(long)]
    metadata: Option<Utf8PathBuf>,

    /// Restrict to these protocol versions (repeatable; v1, v2, 1.0, 2.0).
    #[arg(long = "protocol", value_parser = ProtocolVersion::from_str)]
    protocols: Vec<ProtocolVersion>,

    /// Do not make the V2 base dialect wait for the other V2 dialects.
    #[arg(long, default_value_t = false)]
    no_base_fan_in: bool,
}

#[derive(Debug, Parser)]
struct PlanArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Where to write graph.json and graph.md (default: the build directory).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct BuildArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Maximum concurrent generator invocations.
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// Regenerate every target, ignoring stored fingerprints.
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Interpreter the generator script runs under.
    #[arg(long, env = "DIALECTGEN_INTERPRETER")]
    interpreter: Option<String>,

    /// Generator script.
    #[arg(long)]
    generator: Option<Utf8PathBuf>,

    /// Where to write graph and report artifacts (default: the build directory).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct InstallArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Install prefix.
    #[arg(long)]
    prefix: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct ListDialectsArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{}", e);
        return ExitCode::from(e.exit_code());
    }
    ExitCode::SUCCESS
}

fn real_main() -> Result<(), ToolError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Build(args) => cmd_build(args),
        Command::Install(args) => cmd_install(args),
        Command::ListDialects(args) => cmd_list_dialects(args),
        Command::Version(args) => cmd_version(args),
    }
}

fn merger(project: &ProjectArgs) -> anyhow::Result<ConfigMerger> {
    let file_config = config::load_or_default(&project.project_root, project.config.as_deref())
        .context("load dialectgen.toml config")?;
    Ok(ConfigMerger::new(file_config, &project.project_root))
}

fn overrides(project: &ProjectArgs) -> ProjectOverrides {
    ProjectOverrides {
        dialects_dir: project.dialects_dir.clone(),
        exclude: project.exclude.clone(),
        build_dir: project.build_dir.clone(),
        metadata: project.metadata.clone(),
        protocols: project.protocols.clone(),
        no_base_fan_in: project.no_base_fan_in,
    }
}

fn build_settings(
    project: &ProjectArgs,
    build: &BuildOverrides,
) -> anyhow::Result<(ConfigMerger, BuildSettings)> {
    let merger = merger(project)?;
    let settings = merger.build_settings(&overrides(project), build)?;
    debug!(
        "merged config: dialects_dir={}, exclude={:?}, build_dir={}, versions={:?}, jobs={}",
        settings.dialects_dir, settings.exclude, settings.build_dir, settings.versions, settings.jobs
    );
    Ok((merger, settings))
}

fn cmd_plan(args: PlanArgs) -> Result<(), ToolError> {
    let (_, settings) = build_settings(&args.project, &BuildOverrides::default())?;
    let out_dir = args.out_dir.unwrap_or_else(|| settings.build_dir.clone());

    let plan = run_plan(&settings)?;
    write_plan_artifacts(&plan, &out_dir, &FsWritePort)?;

    println!(
        "{} targets for {} dialects (version {})",
        plan.graph.len(),
        plan.dialects.len(),
        plan.version.version
    );
    info!("wrote graph to {}", out_dir);
    Ok(())
}

fn cmd_build(args: BuildArgs) -> Result<(), ToolError> {
    let build = BuildOverrides {
        jobs: args.jobs,
        force: args.force,
        interpreter: args.interpreter.clone(),
        generator: args.generator.clone(),
    };
    let (_, settings) = build_settings(&args.project, &build)?;
    let out_dir = args.out_dir.unwrap_or_else(|| settings.build_dir.clone());

    let generator = Arc::new(process_generator(&settings));
    let run = run_build(&settings, generator, tool_info())?;
    write_build_artifacts(&run, &out_dir, &FsWritePort)?;

    let counts = &run.report.verdict.counts;
    println!(
        "built {}, up to date {}, failed {}, blocked {}",
        counts.built, counts.up_to_date, counts.failed, counts.blocked
    );
    info!("wrote build report to {}", out_dir);

    run.check()
}

fn cmd_install(args: InstallArgs) -> Result<(), ToolError> {
    let (merger, settings) = build_settings(&args.project, &BuildOverrides::default())?;
    let install = merger.install_settings(args.prefix.as_deref());

    let report = run_install(&settings, &install)?;
    println!(
        "installed {} files ({} unchanged) into {}",
        report.written.len(),
        report.unchanged.len(),
        install.prefix
    );
    Ok(())
}

fn cmd_list_dialects(args: ListDialectsArgs) -> Result<(), ToolError> {
    let (_, settings) = build_settings(&args.project, &BuildOverrides::default())?;
    let plan = run_plan(&settings)?;

    match args.format {
        OutputFormat::Text => {
            for (version, names) in &plan.manifest.dialects_per_version {
                println!("{}: {}", version.namespace(), names.join(" "));
            }
        }
        OutputFormat::Json => {
            let by_ns: BTreeMap<&str, &Vec<String>> = plan
                .manifest
                .dialects_per_version
                .iter()
                .map(|(v, names)| (v.namespace(), names))
                .collect();
            let json = serde_json::to_string_pretty(&by_ns).context("serialize dialects")?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn cmd_version(args: ProjectArgs) -> Result<(), ToolError> {
    let (_, settings) = build_settings(&args, &BuildOverrides::default())?;
    let resolved =
        dialectgen_domain::resolve_version(settings.metadata.as_deref(), settings.default_version);

    match &resolved.source {
        VersionSource::Metadata(path) => println!("{} ({})", resolved.version, path),
        VersionSource::Default => println!("{} (default)", resolved.version),
    }
    Ok(())
}

fn tool_info() -> ReportToolInfo {
    ReportToolInfo {
        name: "dialectgen".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}
