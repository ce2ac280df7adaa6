//! Periodic driver for the grade poller.
//!
//! One cycle per interval tick; ticks never overlap. Retryable failures
//! are retried inside the cycle with exponential backoff and jitter; a
//! missing token just means the cycle ends quietly until login happens.

use crate::error::PortalError;
use crate::grades::poller::GradePoller;
use rand::Rng;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub struct GradeCheckJob {
    poller: GradePoller,
    interval: Duration,
    max_retries: u32,
    retry_base: Duration,
}

impl GradeCheckJob {
    pub fn new(
        poller: GradePoller,
        interval: Duration,
        max_retries: u32,
        retry_base: Duration,
    ) -> Self {
        Self {
            poller,
            interval,
            max_retries,
            retry_base,
        }
    }

    /// Runs until the shutdown channel fires or its sender drops. The first
    /// cycle starts immediately.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval = ?self.interval, "starting grade check job");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_cycle().await,
                _ = shutdown.changed() => {
                    info!("grade check job stopping");
                    return;
                }
            }
        }
    }

    async fn run_cycle(&self) {
        let mut attempt = 0u32;
        loop {
            match self.poller.poll().await {
                Ok(report) => {
                    info!(
                        notified = report.notified,
                        changed = report.snapshot_changed,
                        "poll cycle finished"
                    );
                    return;
                }
                Err(PortalError::NoToken) => {
                    debug!("no stored auth token, skipping cycle");
                    return;
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_delay(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "poll failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(error = %e, "poll cycle abandoned");
                    return;
                }
            }
        }
    }

    /// Exponential backoff with 0-20% jitter, capped at one minute.
    fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self.retry_base.as_millis() as u64;
        let exponential = base * 2u64.pow(attempt.saturating_sub(1).min(5));
        let capped = exponential.min(60_000);
        let jitter = rand::thread_rng().gen_range(0..=(capped / 5));
        Duration::from_millis(capped + jitter)
    }
}
