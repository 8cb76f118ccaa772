// File: senda-core/src/tasks/pending_reconciler.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use senda_common::models::DecisionStatus;
use senda_common::traits::repository_traits::SubmissionRepository;
use senda_common::Error;

use crate::config::ReconcilerSettings;
use crate::services::ModerationService;

/// Spawns the background loop that re-evaluates submissions stuck in
/// `pending`. Waits out the initial delay, then ticks on the configured
/// interval until the shutdown channel flips to `true`.
pub fn spawn_pending_reconciler_task(
    service: Arc<ModerationService>,
    submissions: Arc<dyn SubmissionRepository>,
    settings: ReconcilerSettings,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_secs = settings.interval_secs,
            grace_period_secs = settings.grace_period_secs,
            "pending reconciler started"
        );

        tokio::select! {
            _ = sleep(Duration::from_secs(settings.initial_delay_secs)) => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("pending reconciler stopped before first pass");
                    return;
                }
            }
        }

        let mut interval =
            tokio::time::interval(Duration::from_secs(settings.interval_secs.max(1)));
        // A pass that outlives the interval delays the next tick instead of
        // stacking a burst of catch-up passes.
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let grace = Duration::from_secs(settings.grace_period_secs);
                    if let Err(e) = run_pending_pass(&service, submissions.as_ref(), grace).await {
                        error!("reconciler pass failed: {}", e);
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("pending reconciler stopping");
                        break;
                    }
                }
            }
        }
    })
}

/// One reconciler pass: fetch pending submissions older than the grace
/// period and push each back through the full pipeline, sequentially so a
/// large backlog never floods the external capabilities. Per-submission
/// failures are logged and skipped; the pass keeps going.
pub async fn run_pending_pass(
    service: &ModerationService,
    submissions: &dyn SubmissionRepository,
    grace: Duration,
) -> Result<(), Error> {
    let cutoff = Utc::now()
        - chrono::Duration::from_std(grace).unwrap_or_else(|_| chrono::Duration::seconds(300));
    let stale = submissions.list_pending(cutoff).await?;

    if stale.is_empty() {
        debug!("no stale pending submissions");
        return Ok(());
    }
    info!(count = stale.len(), "re-evaluating stale pending submissions");

    let mut resolved = 0usize;
    for submission in &stale {
        match service.reevaluate(submission).await {
            Ok(decision) => {
                if decision.status != DecisionStatus::Pending {
                    resolved += 1;
                }
                debug!(
                    submission = %submission.submission_id,
                    status = decision.status.as_str(),
                    "reconciler re-evaluation finished"
                );
            }
            Err(e) => {
                error!(
                    submission = %submission.submission_id,
                    "reconciler re-evaluation failed: {}",
                    e
                );
            }
        }
    }

    info!(
        total = stale.len(),
        resolved,
        "reconciler pass complete"
    );
    Ok(())
}
