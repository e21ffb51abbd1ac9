use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

/// Backend-reported audit status.
///
/// Older workers still emit `pending`/`in_progress` for the first two
/// states; they deserialize to the same variants, never to distinct ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    #[serde(alias = "pending")]
    Queued,
    #[serde(alias = "in_progress")]
    Running,
    Finished,
    Failed,
}

impl AuditStatus {
    /// Terminal statuses end polling.
    pub fn is_terminal(self) -> bool {
        matches!(self, AuditStatus::Finished | AuditStatus::Failed)
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditStatus::Queued => "queued",
            AuditStatus::Running => "running",
            AuditStatus::Finished => "finished",
            AuditStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One tracked analysis job for a URL, as represented by the backend.
///
/// Canonical wire naming is camelCase; the snake_case spellings some
/// workers still produce (`created_at`, `result_json`, ...) are accepted
/// on input via aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audit {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub email: Option<String>,
    pub status: AuditStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, alias = "result_json")]
    pub result: Option<AuditReport>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(rename = "createdAt", alias = "created_at", default)]
    pub created_at: Option<String>,
    #[serde(rename = "startedAt", alias = "started_at", default)]
    pub started_at: Option<String>,
    #[serde(rename = "finishedAt", alias = "finished_at", default)]
    pub finished_at: Option<String>,
}

/// Structured report attached to a finished audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub url: String,
    /// Grade as computed by the worker. Presentation derives its own grade
    /// from `overall_score`; this field exists for wire compatibility only.
    #[serde(rename = "letterGrade")]
    pub letter_grade: String,
    #[serde(rename = "overallScore")]
    pub overall_score: f64,
    #[serde(rename = "recommendedActions")]
    pub recommended_actions: String,
    #[serde(default)]
    pub cookies: CookieFindings,
    #[serde(default)]
    pub platforms: Vec<PlatformFinding>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CookieFindings {
    #[serde(default)]
    pub tracking: Vec<TrackingCookie>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingCookie {
    pub name: String,
    pub provider: String,
    pub category: String,
}

/// Per-platform assessment row. Rows with `present = false` carry scores
/// but are excluded from the rendered breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformFinding {
    pub platform: String,
    pub score: f64,
    pub present: bool,
    #[serde(rename = "resolveCTA", default, skip_serializing_if = "Option::is_none")]
    pub resolve_cta: Option<String>,
    #[serde(default)]
    pub debug: PlatformDebug,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformDebug {
    #[serde(default)]
    pub cookies: Vec<String>,
    #[serde(rename = "fpCookies", default, skip_serializing_if = "Option::is_none")]
    pub fp_cookies: Option<Vec<String>>,
    #[serde(rename = "tpCookies", default, skip_serializing_if = "Option::is_none")]
    pub tp_cookies: Option<Vec<String>>,
}

/// Client-visible lifecycle stage for one audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Creating,
    Running,
    AwaitingEmail,
    Ready,
    ViewingResults,
    Failed,
}

/// View events emitted by the lifecycle controller while an audit runs.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    StageChanged { stage: Stage },
    Progress { status: AuditStatus, progress: u8 },
    /// A single poll fetch failed; polling continues.
    PollFailed { message: String },
    AuditFailed { error: Option<String> },
}
