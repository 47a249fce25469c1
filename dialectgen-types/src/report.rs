use crate::dialect::ProtocolVersion;
use crate::graph::TargetId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub schema: String,
    pub tool: ReportToolInfo,
    pub run: ReportRunInfo,
    pub verdict: ReportVerdict,

    #[serde(default)]
    pub targets: Vec<TargetReport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRunInfo {
    pub build_id: String,
    pub started_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportVerdict {
    pub status: ReportStatus,
    pub counts: ReportCounts,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounts {
    pub built: u64,
    pub up_to_date: u64,
    pub failed: u64,
    pub blocked: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetReport {
    pub id: TargetId,
    pub version: ProtocolVersion,
    pub dialect: String,
    pub status: TargetStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    /// The generator ran and succeeded.
    Built,
    /// Outputs present and fingerprint unchanged; generator not run.
    UpToDate,
    /// The generator failed for this target.
    Failed,
    /// Not attempted because a dependency failed or was blocked.
    Blocked,
}

impl TargetStatus {
    pub fn is_success(self) -> bool {
        matches!(self, TargetStatus::Built | TargetStatus::UpToDate)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetStatus::Built => "built",
            TargetStatus::UpToDate => "up_to_date",
            TargetStatus::Failed => "failed",
            TargetStatus::Blocked => "blocked",
        }
    }
}

impl ReportCounts {
    pub fn record(&mut self, status: TargetStatus) {
        match status {
            TargetStatus::Built => self.built += 1,
            TargetStatus::UpToDate => self.up_to_date += 1,
            TargetStatus::Failed => self.failed += 1,
            TargetStatus::Blocked => self.blocked += 1,
        }
    }
}
