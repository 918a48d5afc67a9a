use super::data_sync::{CycleOutcome, RainfallSyncService};
use crate::datasources::ObservationStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Periodic refresh owned by the caller. The first tick fires one period after
/// `start`; dropping the handle stops the task.
pub struct RefreshSchedule {
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl RefreshSchedule {
    pub fn start<S>(service: Arc<RainfallSyncService<S>>, period: Duration) -> Self
    where
        S: ObservationStore + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                match service.refresh().await {
                    Ok(CycleOutcome::Published(stats)) => {
                        tracing::debug!("Scheduled refresh published {} months", stats.len())
                    }
                    Ok(outcome) => tracing::debug!("Scheduled refresh: {:?}", outcome),
                    Err(e) => tracing::warn!("Scheduled refresh failed: {}", e),
                }
            }
        });

        tracing::info!("Refresh scheduled every {:?}", period);
        Self {
            handle: Some(handle),
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop ticking. An in-flight cycle is dropped with the task.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::info!("Refresh schedule stopped");
        }
    }
}

impl Drop for RefreshSchedule {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::datasources::memory::MemoryStore;
    use crate::models::Observation;
    use chrono::{TimeZone, Utc};

    async fn ready_service(store: Arc<MemoryStore>) -> Arc<RainfallSyncService<MemoryStore>> {
        let svc = Arc::new(RainfallSyncService::new(store, &Config::default()));
        svc.initialize().await.unwrap();
        svc
    }

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new(
            vec![Observation::new(
                Utc.with_ymd_and_hms(2024, 8, 3, 9, 0, 0).unwrap(),
                1.5,
            )],
            1000,
        ))
    }

    #[tokio::test]
    async fn ticks_refresh_until_stopped() {
        let store = store();
        let svc = ready_service(Arc::clone(&store)).await;
        let after_initial = store.page_queries();
        assert_eq!(after_initial, 12);

        let mut schedule = RefreshSchedule::start(Arc::clone(&svc), Duration::from_millis(20));
        assert!(schedule.is_running());
        assert_eq!(schedule.period(), Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(150)).await;
        schedule.stop();
        assert!(!schedule.is_running());

        let after_stop = store.page_queries();
        assert!(after_stop > after_initial, "no scheduled cycle ran");

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.page_queries(), after_stop);
        assert!(!svc.snapshot().await.loading);
    }

    #[tokio::test]
    async fn first_tick_waits_one_period() {
        let store = store();
        let svc = ready_service(Arc::clone(&store)).await;

        let schedule = RefreshSchedule::start(svc, Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.page_queries(), 12);
        drop(schedule);
    }
}
