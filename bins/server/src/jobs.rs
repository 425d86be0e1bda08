//! Background lifecycle jobs.
//!
//! Each job runs on its own interval with skipped (never stacked)
//! ticks, so a slow sweep delays the next one instead of overlapping
//! it. A sweep whose every attempt failed backs off exponentially
//! before the next run, up to a cap.

use chrono::Utc;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{info, warn};
use vaulta_api::{DeletionService, ReferenceService};
use vaulta_shared::config::LifecycleConfig;

/// How many references one renewal pass may touch.
const RENEWAL_BATCH: u64 = 100;

const INITIAL_BACKOFF: Duration = Duration::from_secs(30);
const MAX_BACKOFF: Duration = Duration::from_secs(30 * 60);

/// Spawn the deletion sweep and reference renewal loops.
pub fn spawn(deletions: DeletionService, references: ReferenceService, config: &LifecycleConfig) {
    tokio::spawn(deletion_loop(deletions, config.deletion_sweep_secs));
    tokio::spawn(renewal_loop(references, config.renewal_sweep_secs));
    info!(
        deletion_sweep_secs = config.deletion_sweep_secs,
        renewal_sweep_secs = config.renewal_sweep_secs,
        "Lifecycle jobs started"
    );
}

fn next_backoff(current: Option<Duration>) -> Duration {
    match current {
        None => INITIAL_BACKOFF,
        Some(delay) => (delay * 2).min(MAX_BACKOFF),
    }
}

async fn deletion_loop(deletions: DeletionService, sweep_secs: u64) {
    let tick = Duration::from_secs(sweep_secs.max(1));
    let mut ticker = time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut backoff: Option<Duration> = None;

    loop {
        ticker.tick().await;
        if let Some(delay) = backoff {
            time::sleep(delay).await;
        }

        let now = Utc::now();
        deletions.convert_expired(now).await;

        // A sweep gets at most one interval; tasks it did not reach
        // stay queued for the next tick.
        let stalled = match time::timeout(tick, deletions.sweep_once(now)).await {
            Ok(swept) => swept.failed > 0 && swept.purged == 0,
            Err(_) => {
                warn!(timeout_secs = tick.as_secs(), "Deletion sweep timed out");
                true
            }
        };
        backoff = if stalled {
            let delay = next_backoff(backoff);
            warn!(delay_secs = delay.as_secs(), "Deletion sweep failing, backing off");
            Some(delay)
        } else {
            None
        };
    }
}

async fn renewal_loop(references: ReferenceService, sweep_secs: u64) {
    let mut ticker = time::interval(Duration::from_secs(sweep_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut backoff: Option<Duration> = None;

    loop {
        ticker.tick().await;
        if let Some(delay) = backoff {
            time::sleep(delay).await;
        }

        let stats = references.renew_due(Utc::now(), RENEWAL_BATCH).await;
        backoff = if stats.failed > 0 && stats.renewed == 0 {
            let delay = next_backoff(backoff);
            warn!(
                delay_secs = delay.as_secs(),
                "Reference renewal failing, backing off"
            );
            Some(delay)
        } else {
            None
        };
    }
}
