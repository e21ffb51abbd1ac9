//! Text summary builder for CLI output.
//!
//! Formats a report projection into human-readable lines for text mode.

use crate::orchestrator::projection::ReportProjection;
use crate::score::SignalLevel;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Pre-formatted lines for text output.
pub struct TextSummary {
    pub lines: Vec<String>,
}

/// Render the 4-segment signal indicator, strongest = all segments filled.
fn signal_bars(level: SignalLevel) -> String {
    let active = usize::from(level.bars());
    let mut bars = String::new();
    for i in 0..4 {
        bars.push(if i < active { '▮' } else { '▯' });
    }
    bars
}

/// Reformat an RFC 3339 timestamp for display; unparseable input is shown
/// verbatim rather than dropped.
fn format_timestamp(raw: &str) -> String {
    let display = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute] UTC");
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|t| t.to_offset(time::UtcOffset::UTC).format(display).ok())
        .unwrap_or_else(|| raw.to_string())
}

/// Build the report lines: overall grade, recommended actions, platform
/// breakdown, tracking cookies.
pub fn build_text_summary(report: &ReportProjection) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!("Results for {}", report.url));
    lines.push(format!(
        "Overall grade: {}  ({:.0}/100, {})",
        report.grade, report.overall_score, report.label
    ));
    if !report.recommended_actions.trim().is_empty() {
        lines.push(format!("Recommended actions: {}", report.recommended_actions));
    }

    lines.push(String::new());
    if report.platforms.is_empty() {
        lines.push("No platforms detected.".to_string());
    } else {
        lines.push("Platform breakdown:".to_string());
        for platform in &report.platforms {
            lines.push(format!(
                "  {:<18} {} {:>2}  {:.0}/100",
                platform.platform,
                signal_bars(platform.signal),
                platform.grade,
                platform.score
            ));
            if !platform.cookies.is_empty() {
                lines.push(format!("    cookies: {}", platform.cookies.join(", ")));
            }
            if let Some(cta) = platform.resolve_cta.as_deref() {
                lines.push(format!("    {cta}"));
            }
        }
    }

    if !report.tracking_cookies.is_empty() {
        lines.push(String::new());
        lines.push("Tracking cookies:".to_string());
        for cookie in &report.tracking_cookies {
            lines.push(format!(
                "  {} ({}, {})",
                cookie.name, cookie.provider, cookie.category
            ));
        }
    }

    if let Some(finished_at) = report.finished_at.as_deref() {
        lines.push(String::new());
        lines.push(format!("Last updated: {}", format_timestamp(finished_at)));
    }

    TextSummary { lines }
}
