//! Periodic background rate refresh (feature `async`)

use crate::service::CurrencyService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Running refresh task. Dropping the handle also stops the loop, without
/// waiting for it.
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Signal the loop to exit and wait for it
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            log::warn!("Rate refresh task ended abnormally: {}", e);
        }
    }
}

/// Refresh `service` rates every `period`, first tick immediately. Failures
/// are logged by the service and the previous table stays in place.
pub fn spawn_rate_refresh(service: Arc<CurrencyService>, base: String, period: Duration) -> RefreshHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!("Starting rate refresh every {:?} (base {})", period, base);

        loop {
            tokio::select! {
                biased;
                // Resolves on `stop` and when the handle is dropped
                _ = shutdown_rx.changed() => {
                    log::info!("Stopping rate refresh");
                    break;
                }
                _ = ticker.tick() => {
                    let service = Arc::clone(&service);
                    let base = base.clone();
                    // Provider and store calls block
                    match tokio::task::spawn_blocking(move || service.fetch_latest_rates(&base)).await {
                        Ok(true) => {}
                        Ok(false) => log::warn!("Scheduled rate refresh failed"),
                        Err(e) => log::error!("Rate refresh worker panicked: {}", e),
                    }
                }
            }
        }
    });

    RefreshHandle { shutdown, task }
}
