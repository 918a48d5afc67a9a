use crate::config::{DiscoveryConfig, DiscoveryStrategy};
use crate::datasources::ObservationStore;
use crate::error::{RainfallError, Result};
use crate::models::TimeWindow;
use futures::future::join_all;
use std::sync::Arc;

/// Finds the years that contain at least one observation
pub struct YearDiscovery<S> {
    store: Arc<S>,
    config: DiscoveryConfig,
}

impl<S: ObservationStore> YearDiscovery<S> {
    pub fn new(store: Arc<S>, config: DiscoveryConfig) -> Self {
        Self { store, config }
    }

    /// Years with data, newest first and without duplicates
    pub async fn discover(&self) -> Result<Vec<i32>> {
        if self.config.strategy == DiscoveryStrategy::Aggregate {
            match self.store.distinct_years().await {
                Ok(years) => {
                    let years = normalize(years);
                    tracing::info!("Discovered years {:?}", years);
                    return Ok(years);
                }
                Err(e) => {
                    tracing::warn!(
                        "Distinct-years query unavailable ({}), probing {}-{}",
                        e,
                        self.config.probe_start_year,
                        self.config.probe_end_year
                    );
                }
            }
        }

        self.probe().await
    }

    /// One `limit 1` query per candidate year. A failed probe skips that year;
    /// if every probe fails the store is treated as unavailable.
    async fn probe(&self) -> Result<Vec<i32>> {
        let candidates: Vec<(i32, TimeWindow)> = (self.config.probe_start_year
            ..=self.config.probe_end_year)
            .filter_map(|year| TimeWindow::year(year).map(|w| (year, w)))
            .collect();

        let results = join_all(candidates.iter().map(|(year, window)| async move {
            (*year, self.store.has_observations(*window).await)
        }))
        .await;

        let mut years = Vec::new();
        let mut last_error = None;
        let mut failures = 0;
        for (year, result) in results {
            match result {
                Ok(true) => years.push(year),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Year probe for {} failed: {}", year, e);
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        if failures > 0 && failures == candidates.len() {
            return Err(RainfallError::DataSourceUnavailable(format!(
                "all year probes failed: {}",
                last_error.map(|e| e.to_string()).unwrap_or_default()
            )));
        }

        let years = normalize(years);
        tracing::info!("Probed years {:?}", years);
        Ok(years)
    }
}

fn normalize(mut years: Vec<i32>) -> Vec<i32> {
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

/// Current year when it has data, else the most recent year with data
pub fn default_year(years: &[i32], current_year: i32) -> Option<i32> {
    if years.contains(&current_year) {
        Some(current_year)
    } else {
        years.iter().copied().max()
    }
}
