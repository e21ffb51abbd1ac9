//! Fixed-interval audit polling.
//!
//! A poller owns one cancellable fetch loop: fetch immediately, deliver the
//! outcome, sleep, repeat until the audit reaches a terminal status or
//! `stop()` is called. Fetches are serialized, so updates arrive in issue
//! order and at most one request is in flight at any instant.

use crate::client::{ApiError, AuditApi};
use crate::model::Audit;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
    Stopped,
}

/// One observation delivered to the consumer, in issue order.
#[derive(Debug)]
pub enum PollUpdate {
    Snapshot(Audit),
    /// The fetch failed; polling continues. A flaky request must not
    /// abandon a long-running audit.
    FetchFailed(ApiError),
}

pub struct AuditPoller {
    state: PollerState,
    cancel_tx: Option<watch::Sender<bool>>,
}

impl AuditPoller {
    pub fn new() -> Self {
        Self {
            state: PollerState::Idle,
            cancel_tx: None,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Begin polling `id`, delivering updates on `update_tx`. Only valid
    /// from `idle`; a lifecycle owns exactly one polling run per audit, so
    /// a second start is a logged no-op.
    pub fn start(
        &mut self,
        api: Arc<dyn AuditApi>,
        id: String,
        interval: Duration,
        update_tx: mpsc::UnboundedSender<PollUpdate>,
    ) {
        if self.state != PollerState::Idle {
            debug!(state = ?self.state, "poller start ignored");
            return;
        }
        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(poll_loop(api, id, interval, update_tx, cancel_rx));
        self.cancel_tx = Some(cancel_tx);
        self.state = PollerState::Polling;
    }

    /// Stop polling: disarm the pending timer and suppress any in-flight
    /// fetch's delivery. Idempotent.
    pub fn stop(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(true);
        }
        self.state = PollerState::Stopped;
    }
}

impl Drop for AuditPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    api: Arc<dyn AuditApi>,
    id: String,
    interval: Duration,
    update_tx: mpsc::UnboundedSender<PollUpdate>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    loop {
        let outcome = tokio::select! {
            outcome = api.fetch_audit(&id) => outcome,
            _ = cancel_rx.changed() => break,
        };
        // A fetch that completed in the same instant as stop() loses the
        // race above; check again so nothing is delivered after stop.
        if *cancel_rx.borrow() {
            break;
        }
        let terminal = match &outcome {
            Ok(audit) => audit.status.is_terminal(),
            Err(err) => {
                warn!(%id, error = %err, "audit fetch failed; polling continues");
                false
            }
        };
        let update = match outcome {
            Ok(audit) => PollUpdate::Snapshot(audit),
            Err(err) => PollUpdate::FetchFailed(err),
        };
        if update_tx.send(update).is_err() {
            break;
        }
        if terminal {
            debug!(%id, "terminal status observed, polling ends");
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel_rx.changed() => break,
        }
    }
}
