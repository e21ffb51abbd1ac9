//! Render projection for a finished audit.
//!
//! Derived values are recomputed from the raw report on every build and
//! never persisted. Absent optional fields stay absent; nothing here
//! substitutes placeholder data.

use crate::model::{Audit, AuditReport, TrackingCookie};
use crate::score::{self, Grade, ScoreLabel, SignalLevel};
use serde::Serialize;

/// One row of the platform breakdown. Only platforms the backend marked
/// `present` become rows.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformView {
    pub platform: String,
    pub score: f64,
    pub grade: Grade,
    pub signal: SignalLevel,
    pub cookies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_cta: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportProjection {
    pub url: String,
    pub overall_score: f64,
    pub grade: Grade,
    pub label: ScoreLabel,
    pub recommended_actions: String,
    pub platforms: Vec<PlatformView>,
    pub tracking_cookies: Vec<TrackingCookie>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

/// Build the render projection from a finished audit and its report.
///
/// The grade is always derived locally from `overall_score`; the worker's
/// `letter_grade` field may come from an older grading table and is not
/// consulted.
pub fn build_report_view(audit: &Audit, report: &AuditReport) -> ReportProjection {
    let platforms = report
        .platforms
        .iter()
        .filter(|p| p.present)
        .map(|p| PlatformView {
            platform: p.platform.clone(),
            score: p.score,
            grade: score::grade_from_score(p.score),
            signal: score::signal_from_score(p.score),
            cookies: p.debug.cookies.clone(),
            resolve_cta: p.resolve_cta.clone(),
        })
        .collect();

    ReportProjection {
        url: audit.url.clone(),
        overall_score: report.overall_score,
        grade: score::grade_from_score(report.overall_score),
        label: score::label_from_score(report.overall_score),
        recommended_actions: report.recommended_actions.clone(),
        platforms,
        tracking_cookies: report.cookies.tracking.clone(),
        finished_at: audit.finished_at.clone(),
    }
}
