use crate::client::ApiClient;
use crate::model::{AuditEvent, ClientConfig, Stage};
use crate::orchestrator::controller::LifecycleController;
use crate::text_summary;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for the stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr so printing never stalls the
/// async event loop.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());
        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }
        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "tracking-audit-cli",
    version,
    about = "Audit a website's tracking and cookie posture"
)]
pub struct Cli {
    /// Website to audit; scheme is optional, https is assumed
    pub url: String,

    /// Contact email for the report. When omitted, you are prompted once
    /// the audit finishes.
    #[arg(long)]
    pub email: Option<String>,

    /// Base URL of the audit service
    #[arg(long, env = "AUDIT_BASE_URL")]
    pub base_url: String,

    /// Print the final audit and derived report as JSON (suppresses the
    /// text summary)
    #[arg(long)]
    pub json: bool,

    /// Interval between status fetches while the audit runs
    #[arg(long, default_value = "5s")]
    pub poll_interval: humantime::Duration,

    /// Deadline for each individual request
    #[arg(long, default_value = "10s")]
    pub request_timeout: humantime::Duration,
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.clone(),
        poll_interval: Duration::from(args.poll_interval),
        request_timeout: Duration::from(args.request_timeout),
        user_agent: format!("tracking-audit-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

/// JSON-mode output: the raw audit plus the derived report projection.
#[derive(Serialize)]
struct JsonOutput<'a> {
    audit: &'a crate::model::Audit,
    report: &'a crate::orchestrator::ReportProjection,
}

/// Read one line from stdin, prompting on stderr.
async fn prompt_line(prompt: &'static str) -> Result<String> {
    let line = tokio::task::spawn_blocking(move || {
        let mut stderr = std::io::stderr();
        write!(stderr, "{prompt}")?;
        stderr.flush()?;
        let mut line = String::new();
        let read = std::io::stdin().read_line(&mut line)?;
        if read == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stdin closed",
            ));
        }
        Ok::<_, std::io::Error>(line)
    })
    .await
    .context("prompt task failed")?
    .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let api = Arc::new(ApiClient::new(&cfg).context("failed to build API client")?);
    let mut controller = LifecycleController::new(api, cfg);
    let (out_tx, out_handle) = spawn_output_writer();

    let outcome = drive_lifecycle(&args, &mut controller, &out_tx).await;

    controller.shutdown();
    drop(out_tx);
    let _ = out_handle.await;
    outcome
}

async fn drive_lifecycle(
    args: &Cli,
    controller: &mut LifecycleController,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<()> {
    controller
        .submit(&args.url, args.email.as_deref())
        .await
        .context("failed to start audit")?;
    if let Some(audit) = controller.audit() {
        let _ = out_tx.send(OutputLine::Stderr(format!(
            "Audit {} created for {}",
            audit.id, audit.url
        )));
    }

    // Poll until the audit leaves the running stage; ctrl-c cancels the
    // poller before exit so no fetch outlives the process teardown.
    let cancelled = loop {
        tokio::select! {
            event = controller.next_event() => {
                match event {
                    Some(AuditEvent::Progress { status, progress }) => {
                        let _ = out_tx.send(OutputLine::Stderr(format!("{status}: {progress}%")));
                    }
                    Some(AuditEvent::PollFailed { message }) => {
                        let _ = out_tx.send(OutputLine::Stderr(format!(
                            "Status fetch failed ({message}); still polling"
                        )));
                    }
                    Some(AuditEvent::AuditFailed { .. })
                    | Some(AuditEvent::StageChanged { .. })
                    | None => break false,
                }
            }
            _ = tokio::signal::ctrl_c() => break true,
        }
    };
    if cancelled {
        controller.shutdown();
        let _ = out_tx.send(OutputLine::Stderr("Cancelled.".to_string()));
        return Ok(());
    }

    match controller.stage() {
        Stage::Failed => {
            let reason = controller
                .audit()
                .and_then(|audit| audit.error.clone())
                .unwrap_or_else(|| "no diagnostic reported".to_string());
            anyhow::bail!("audit failed: {reason}");
        }
        Stage::AwaitingEmail => {
            if let Some(email) = args.email.as_deref() {
                // Email given up front but the backend did not record it at
                // creation; attach it now without prompting.
                controller
                    .submit_email(email)
                    .await
                    .context("failed to attach email")?;
            } else {
                let _ = out_tx.send(OutputLine::Stderr(
                    "Audit complete. Enter your email to see the results.".to_string(),
                ));
                loop {
                    let email = prompt_line("Email address: ").await?;
                    match controller.submit_email(&email).await {
                        Ok(()) => break,
                        Err(err) => {
                            let _ = out_tx.send(OutputLine::Stderr(format!(
                                "Could not attach email ({err}); try again"
                            )));
                        }
                    }
                }
            }
        }
        Stage::Ready => {}
        stage => anyhow::bail!("audit polling ended in unexpected stage {stage:?}"),
    }

    let report = controller.view_results()?;
    if args.json {
        let audit = controller
            .audit()
            .context("audit state missing after completion")?;
        let out = serde_json::to_string_pretty(&JsonOutput {
            audit,
            report: &report,
        })?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        let summary = text_summary::build_text_summary(&report);
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }
    Ok(())
}
