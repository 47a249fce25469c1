//! Rendering helpers: markdown for human-readable artifacts, `@VAR@` substitution for
//! installed package files.

mod template;

pub use template::{TemplateError, render_template};

use dialectgen_types::report::{BuildReport, ReportStatus};
use dialectgen_types::{BuildGraph, Dependency, ProtocolVersion};

pub fn render_graph_md(graph: &BuildGraph) -> String {
    let mut out = String::new();
    out.push_str("# dialectgen graph\n\n");
    out.push_str(&format!("- Targets: {}\n", graph.len()));
    if graph.passes.is_empty() {
        out.push_str("- Passes: none\n\n");
    } else {
        out.push_str(&format!("- Passes: {}\n\n", graph.passes.join(", ")));
    }

    if graph.is_empty() {
        out.push_str("_No targets._\n");
        return out;
    }

    for version in ProtocolVersion::ALL {
        let targets: Vec<_> = graph.for_version(version).collect();
        if targets.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "## {} ({}, wire {})\n\n",
            version.namespace(),
            version.language(),
            version.wire()
        ));
        for t in targets {
            out.push_str(&format!("### {}\n\n", t.id));
            out.push_str(&format!("- Definition: `{}`\n", t.command.definition));
            out.push_str(&format!(
                "- Output: `{}`{}\n",
                t.outputs.path(),
                if t.outputs.is_stamp() { " (stamp)" } else { "" }
            ));
            let deps: Vec<String> = t
                .depends_on
                .iter()
                .map(|d| match d {
                    Dependency::File(p) => format!("`{}`", p),
                    Dependency::Target(id) => format!("target `{}`", id),
                })
                .collect();
            if !deps.is_empty() {
                out.push_str(&format!("- Depends on: {}\n", deps.join(", ")));
            }
            out.push('\n');
        }
    }

    out
}

pub fn render_report_md(report: &BuildReport) -> String {
    let mut out = String::new();
    out.push_str("# dialectgen build\n\n");
    let counts = &report.verdict.counts;
    out.push_str(&format!(
        "- Status: `{}`\n- Built: {}\n- Up to date: {}\n- Failed: {}\n- Blocked: {}\n",
        status_label(report.verdict.status),
        counts.built,
        counts.up_to_date,
        counts.failed,
        counts.blocked
    ));
    if let Some(ms) = report.run.duration_ms {
        out.push_str(&format!("- Duration: {} ms\n", ms));
    }
    out.push('\n');

    if !report.verdict.reasons.is_empty() {
        out.push_str("## Reasons\n\n");
        for r in &report.verdict.reasons {
            out.push_str(&format!("- {}\n", r));
        }
        out.push('\n');
    }

    out.push_str("## Targets\n\n");
    if report.targets.is_empty() {
        out.push_str("_No targets._\n");
        return out;
    }

    out.push_str("| Target | Status | Detail |\n|---|---|---|\n");
    for t in &report.targets {
        let detail = t
            .message
            .as_deref()
            .map(|m| m.replace('|', "\\|").replace('\n', " "))
            .unwrap_or_default();
        out.push_str(&format!(
            "| `{}` | `{}` | {} |\n",
            t.id,
            t.status.as_str(),
            detail
        ));
    }

    out
}

fn status_label(s: ReportStatus) -> &'static str {
    match s {
        ReportStatus::Pass => "pass",
        ReportStatus::Fail => "fail",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialectgen_types::report::{
        ReportCounts, ReportRunInfo, ReportToolInfo, ReportVerdict, TargetReport, TargetStatus,
    };
    use dialectgen_types::schema::DIALECTGEN_REPORT_V1;
    use dialectgen_types::{
        BuildTarget, DialectDefinition, GenerationRequest, TargetId, TargetOutput,
    };
    use std::collections::BTreeSet;

    fn target(version: ProtocolVersion, name: &str) -> BuildTarget {
        let dialect = DialectDefinition::from_path(format!("defs/{name}.xml")).unwrap();
        BuildTarget {
            id: TargetId::new(version, name),
            version,
            dialect: dialect.clone(),
            outputs: if version.tracks_output_files() {
                TargetOutput::File(format!("build/include/v1.0/{name}/{name}.h").into())
            } else {
                TargetOutput::Stamp(format!("build/stamps/v2.0/{name}.stamp").into())
            },
            depends_on: BTreeSet::from([Dependency::File(dialect.path.clone())]),
            command: GenerationRequest {
                language: version.language().to_string(),
                wire_version: version,
                output_dir: format!("build/include/{}", version.namespace()).into(),
                definition: dialect.path,
                search_path: vec![],
            },
        }
    }

    #[test]
    fn graph_md_groups_by_version() {
        let mut graph = BuildGraph::new();
        graph.insert(target(ProtocolVersion::V1, "common"));
        graph.insert(target(ProtocolVersion::V2, "common"));
        graph.passes.push("base-dialect-fan-in".into());

        let md = render_graph_md(&graph);
        assert!(md.contains("- Targets: 2"));
        assert!(md.contains("- Passes: base-dialect-fan-in"));
        assert!(md.contains("## v1.0 (C, wire 1.0)"));
        assert!(md.contains("## v2.0 (C++11, wire 2.0)"));
        assert!(md.contains("`build/stamps/v2.0/common.stamp` (stamp)"));
        assert!(md.find("v1.0/common").unwrap() < md.find("v2.0/common").unwrap());
    }

    #[test]
    fn empty_graph_md() {
        let md = render_graph_md(&BuildGraph::new());
        assert!(md.contains("_No targets._"));
    }

    #[test]
    fn report_md_lists_targets_and_escapes_detail() {
        let report = BuildReport {
            schema: DIALECTGEN_REPORT_V1.to_string(),
            tool: ReportToolInfo {
                name: "dialectgen".into(),
                version: "0.3.1".into(),
            },
            run: ReportRunInfo {
                build_id: "id".into(),
                started_at: "2026-01-01T00:00:00Z".into(),
                ended_at: None,
                duration_ms: Some(12),
            },
            verdict: ReportVerdict {
                status: ReportStatus::Fail,
                counts: ReportCounts {
                    built: 1,
                    up_to_date: 0,
                    failed: 1,
                    blocked: 0,
                },
                reasons: vec!["1 target(s) did not build".into()],
            },
            targets: vec![
                TargetReport {
                    id: TargetId::new(ProtocolVersion::V1, "common"),
                    version: ProtocolVersion::V1,
                    dialect: "common".into(),
                    status: TargetStatus::Built,
                    message: None,
                    duration_ms: Some(5),
                },
                TargetReport {
                    id: TargetId::new(ProtocolVersion::V1, "broken"),
                    version: ProtocolVersion::V1,
                    dialect: "broken".into(),
                    status: TargetStatus::Failed,
                    message: Some("a | b\nc".into()),
                    duration_ms: None,
                },
            ],
            data: None,
        };

        let md = render_report_md(&report);
        assert!(md.contains("- Status: `fail`"));
        assert!(md.contains("- Duration: 12 ms"));
        assert!(md.contains("| `v1.0/common` | `built` |  |"));
        assert!(md.contains("| `v1.0/broken` | `failed` | a \\| b c |"));
        assert!(md.contains("- 1 target(s) did not build"));
    }
}
