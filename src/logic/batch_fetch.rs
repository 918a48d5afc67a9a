use crate::datasources::ObservationStore;
use crate::error::{RainfallError, Result};
use crate::models::{MonthWindow, Observation};
use futures::future::join_all;
use std::sync::Arc;

/// Fetches a year of observations one calendar month at a time so that no
/// single query exceeds the store's row cap.
pub struct BatchFetcher<S> {
    store: Arc<S>,
    concurrent: bool,
}

impl<S: ObservationStore> BatchFetcher<S> {
    pub fn new(store: Arc<S>, concurrent: bool) -> Self {
        Self { store, concurrent }
    }

    /// All observations of `year`, concatenated in month order.
    ///
    /// Any failing month fails the whole fetch; the earliest failing month in
    /// calendar order is reported and rows from other months are dropped.
    pub async fn fetch_year(&self, year: i32) -> Result<Vec<Observation>> {
        let windows = MonthWindow::for_year(year);

        let results = if self.concurrent {
            join_all(windows.iter().map(|w| self.fetch_month(*w))).await
        } else {
            let mut results = Vec::with_capacity(windows.len());
            for window in &windows {
                let result = self.fetch_month(*window).await;
                let failed = result.is_err();
                results.push(result);
                if failed {
                    break;
                }
            }
            results
        };

        let mut all = Vec::new();
        for (window, result) in windows.iter().zip(results) {
            let rows = result.map_err(|e| RainfallError::MonthFetch {
                year,
                month: window.month_name(),
                reason: e.to_string(),
            })?;

            if rows.is_empty() {
                tracing::debug!("{} {}: no data", window.month_name(), year);
            } else {
                tracing::debug!("{} {}: {} records", window.month_name(), year, rows.len());
            }
            all.extend(rows);
        }

        tracing::info!("Fetched {} raw observations for {}", all.len(), year);
        Ok(all)
    }

    /// One month, paging with `offset` while the store keeps returning full pages
    async fn fetch_month(&self, month: MonthWindow) -> Result<Vec<Observation>> {
        let cap = self.store.row_cap().max(1);
        let mut rows: Vec<Observation> = Vec::new();

        loop {
            let page = self.store.fetch_page(month.window, rows.len(), cap).await?;
            let full = page.len() >= cap;
            rows.extend(page);

            if !full {
                break;
            }
            tracing::trace!(
                "{} {}: page full at {} rows, requesting next page",
                month.month_name(),
                month.year,
                rows.len()
            );
        }

        Ok(rows)
    }
}
