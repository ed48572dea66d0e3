use crate::etl::EtlEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Shortest period between scheduled batches
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to the periodic batch task
pub struct SchedulerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }

    /// Cancel the loop and wait for it to exit. A batch already running is
    /// allowed to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            warn!(error = %e, "scheduler task ended abnormally");
        }
        info!("ETL scheduler stopped");
    }
}

impl EtlEngine {
    /// Run one batch now, then one per configured interval until stopped.
    pub fn schedule(self: &Arc<Self>) -> SchedulerHandle {
        let engine = Arc::clone(self);
        let cancel = CancellationToken::new();
        let cancel_for_task = cancel.clone();
        let mut period = engine.config().interval;
        if period < MIN_INTERVAL {
            warn!(
                configured_ms = period.as_millis() as u64,
                min_ms = MIN_INTERVAL.as_millis() as u64,
                "ETL interval too short, clamping"
            );
            period = MIN_INTERVAL;
        }

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = period.as_secs(), "ETL scheduler started");

            loop {
                tokio::select! {
                    biased;
                    _ = cancel_for_task.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = engine.run_batch().await {
                            error!(error = %e, "scheduled batch failed");
                        }
                    }
                }
            }
        });

        SchedulerHandle { cancel, join }
    }
}
