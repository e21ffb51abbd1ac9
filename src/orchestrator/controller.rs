//! Audit lifecycle controller.
//!
//! Owns the stage machine for a single audit (creating -> running ->
//! awaiting_email -> ready -> viewing_results, with failed absorbing) and
//! sequences the client and poller for presentation layers.

use crate::client::{self, ApiError, AuditApi};
use crate::model::{Audit, AuditEvent, AuditStatus, ClientConfig, Stage};
use crate::orchestrator::projection::{self, ReportProjection};
use crate::poller::{AuditPoller, PollUpdate};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Errors surfaced to the user by lifecycle actions. Poll fetch failures
/// are not errors at this level; they arrive as [`AuditEvent::PollFailed`].
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("action not available in the {0:?} stage")]
    InvalidStage(Stage),

    #[error("audit reported finished without a result payload")]
    MissingResult,
}

pub struct LifecycleController {
    api: Arc<dyn AuditApi>,
    cfg: ClientConfig,
    stage: Stage,
    audit: Option<Audit>,
    poller: AuditPoller,
    update_rx: Option<mpsc::UnboundedReceiver<PollUpdate>>,
}

impl LifecycleController {
    pub fn new(api: Arc<dyn AuditApi>, cfg: ClientConfig) -> Self {
        Self {
            api,
            cfg,
            stage: Stage::Creating,
            audit: None,
            poller: AuditPoller::new(),
            update_rx: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The last observed audit state, if one has been created.
    pub fn audit(&self) -> Option<&Audit> {
        self.audit.as_ref()
    }

    /// Create the audit and start polling. Only valid while `creating`;
    /// on failure the stage is unchanged and the caller may resubmit.
    ///
    /// The URL is normalized (and an optional email validated) locally, so
    /// bad input is rejected without a network round trip.
    pub async fn submit(&mut self, raw_url: &str, email: Option<&str>) -> Result<(), LifecycleError> {
        if self.stage != Stage::Creating {
            return Err(LifecycleError::InvalidStage(self.stage));
        }
        let url = client::normalize_url(raw_url)
            .ok_or_else(|| ApiError::Validation(format!("not a valid website URL: {raw_url:?}")))?;
        let email = email.map(client::validate_email).transpose()?;

        let audit = self.api.create_audit(&url, email.as_deref()).await?;
        debug!(id = %audit.id, url = %audit.url, "audit created");

        let (update_tx, update_rx) = mpsc::unbounded_channel();
        self.poller.start(
            self.api.clone(),
            audit.id.clone(),
            self.cfg.poll_interval,
            update_tx,
        );
        self.update_rx = Some(update_rx);
        self.audit = Some(audit);
        self.stage = Stage::Running;
        Ok(())
    }

    /// Pull the next view event while the audit runs. Updates are applied
    /// in arrival order; returns `None` once the stage leaves `running` or
    /// the poller channel closes.
    pub async fn next_event(&mut self) -> Option<AuditEvent> {
        if self.stage != Stage::Running {
            return None;
        }
        let update = self.update_rx.as_mut()?.recv().await?;
        Some(self.apply_update(update))
    }

    fn apply_update(&mut self, update: PollUpdate) -> AuditEvent {
        match update {
            PollUpdate::FetchFailed(err) => {
                warn!(error = %err, "poll fetch failed; audit continues");
                AuditEvent::PollFailed {
                    message: err.to_string(),
                }
            }
            PollUpdate::Snapshot(snapshot) => self.apply_snapshot(snapshot),
        }
    }

    fn apply_snapshot(&mut self, snapshot: Audit) -> AuditEvent {
        match snapshot.status {
            AuditStatus::Queued | AuditStatus::Running => {
                let event = AuditEvent::Progress {
                    status: snapshot.status,
                    progress: snapshot.progress,
                };
                self.audit = Some(snapshot);
                event
            }
            AuditStatus::Failed => {
                self.poller.stop();
                let error = snapshot.error.clone();
                self.audit = Some(snapshot);
                self.stage = Stage::Failed;
                AuditEvent::AuditFailed { error }
            }
            AuditStatus::Finished => {
                self.poller.stop();
                let email_known = snapshot
                    .email
                    .as_deref()
                    .is_some_and(|email| !email.is_empty());
                self.audit = Some(snapshot);
                self.stage = if email_known {
                    Stage::Ready
                } else {
                    Stage::AwaitingEmail
                };
                AuditEvent::StageChanged { stage: self.stage }
            }
        }
    }

    /// Attach the contact email. Only valid while `awaiting_email`; email
    /// is single-write, so the gate closes permanently once an attach
    /// succeeds. On failure the stage is unchanged and the caller may
    /// resubmit.
    pub async fn submit_email(&mut self, email: &str) -> Result<(), LifecycleError> {
        if self.stage != Stage::AwaitingEmail {
            return Err(LifecycleError::InvalidStage(self.stage));
        }
        let email = client::validate_email(email)?;
        let id = self.audit_id()?;

        let mut updated = self.api.attach_email(&id, &email).await?;
        // Older workers omit the result payload from the PATCH response;
        // keep the one already observed instead of discarding it.
        if updated.result.is_none() {
            if let Some(current) = self.audit.take() {
                updated.result = current.result;
            }
        }
        self.audit = Some(updated);
        self.stage = Stage::Ready;
        Ok(())
    }

    /// Move to `viewing_results` and build the render projection. The
    /// transition is refused when no result payload is present, so
    /// `viewing_results` is never entered without one.
    pub fn view_results(&mut self) -> Result<ReportProjection, LifecycleError> {
        if self.stage != Stage::Ready {
            return Err(LifecycleError::InvalidStage(self.stage));
        }
        let report = self.project()?;
        self.stage = Stage::ViewingResults;
        Ok(report)
    }

    /// Re-fetch the audit once (no polling) and recompute the projection.
    /// Only valid while `viewing_results`; picks up late-arriving data.
    pub async fn refresh(&mut self) -> Result<ReportProjection, LifecycleError> {
        if self.stage != Stage::ViewingResults {
            return Err(LifecycleError::InvalidStage(self.stage));
        }
        let id = self.audit_id()?;
        let snapshot = self.api.fetch_audit(&id).await?;
        self.audit = Some(snapshot);
        self.project()
    }

    /// Stop polling and drop the update channel, suppressing any in-flight
    /// fetch's effect. Safe from any stage.
    pub fn shutdown(&mut self) {
        self.poller.stop();
        self.update_rx = None;
    }

    fn audit_id(&self) -> Result<String, LifecycleError> {
        self.audit
            .as_ref()
            .map(|audit| audit.id.clone())
            .ok_or(LifecycleError::InvalidStage(self.stage))
    }

    fn project(&self) -> Result<ReportProjection, LifecycleError> {
        let audit = self.audit.as_ref().ok_or(LifecycleError::MissingResult)?;
        let report = audit.result.as_ref().ok_or(LifecycleError::MissingResult)?;
        Ok(projection::build_report_view(audit, report))
    }
}
