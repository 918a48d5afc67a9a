//! In-memory observation store for tests. Enforces the row cap the way the
//! remote store does (silently truncating), and supports failure injection,
//! query counting and per-year gates that hold queries until released.

use super::ObservationStore;
use crate::error::{RainfallError, Result};
use crate::models::{Observation, TimeWindow};
use chrono::{DateTime, Datelike, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

#[derive(Default)]
struct Controls {
    failing_months: HashMap<(i32, u32), String>,
    failing_probes: HashSet<i32>,
    distinct_years_unsupported: bool,
    gates: HashMap<i32, watch::Sender<bool>>,
}

pub struct MemoryStore {
    observations: Vec<Observation>,
    row_cap: usize,
    controls: Mutex<Controls>,
    page_queries: AtomicUsize,
    probe_queries: AtomicUsize,
    aggregate_queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new(mut observations: Vec<Observation>, row_cap: usize) -> Self {
        observations.sort_by_key(|o| o.timestamp);
        Self {
            observations,
            row_cap,
            controls: Mutex::new(Controls::default()),
            page_queries: AtomicUsize::new(0),
            probe_queries: AtomicUsize::new(0),
            aggregate_queries: AtomicUsize::new(0),
        }
    }

    /// `count` observations spaced `step_minutes` apart from `start`, all with `rain`
    pub fn series(
        start: DateTime<Utc>,
        count: usize,
        step_minutes: i64,
        rain: f64,
    ) -> Vec<Observation> {
        (0..count)
            .map(|i| Observation::new(start + Duration::minutes(step_minutes * i as i64), rain))
            .collect()
    }

    fn controls(&self) -> MutexGuard<'_, Controls> {
        self.controls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fail_month(&self, year: i32, month: u32, reason: &str) {
        self.controls()
            .failing_months
            .insert((year, month), reason.to_string());
    }

    pub fn fail_probe(&self, year: i32) {
        self.controls().failing_probes.insert(year);
    }

    pub fn without_distinct_years(self) -> Self {
        self.controls().distinct_years_unsupported = true;
        self
    }

    /// Queries for windows starting in `year` wait until `release_year`
    pub fn hold_year(&self, year: i32) {
        let (tx, _rx) = watch::channel(false);
        self.controls().gates.insert(year, tx);
    }

    pub fn release_year(&self, year: i32) {
        if let Some(tx) = self.controls().gates.get(&year) {
            tx.send_replace(true);
        }
    }

    pub fn page_queries(&self) -> usize {
        self.page_queries.load(Ordering::SeqCst)
    }

    pub fn probe_queries(&self) -> usize {
        self.probe_queries.load(Ordering::SeqCst)
    }

    pub fn aggregate_queries(&self) -> usize {
        self.aggregate_queries.load(Ordering::SeqCst)
    }

    fn in_window(&self, window: TimeWindow) -> impl Iterator<Item = &Observation> {
        self.observations
            .iter()
            .filter(move |o| o.timestamp.is_some_and(|ts| window.contains(ts)))
    }

    async fn wait_for_gate(&self, year: i32) {
        let gate = self.controls().gates.get(&year).map(|tx| tx.subscribe());
        if let Some(mut rx) = gate {
            let _ = rx.wait_for(|open| *open).await;
        }
    }
}

impl ObservationStore for MemoryStore {
    fn row_cap(&self) -> usize {
        self.row_cap
    }

    async fn fetch_page(
        &self,
        window: TimeWindow,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Observation>> {
        self.page_queries.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate(window.start.year()).await;

        let failure = self
            .controls()
            .failing_months
            .get(&(window.start.year(), window.start.month()))
            .cloned();
        if let Some(reason) = failure {
            return Err(RainfallError::DataSourceUnavailable(reason));
        }

        Ok(self
            .in_window(window)
            .skip(offset)
            .take(limit.min(self.row_cap))
            .cloned()
            .collect())
    }

    async fn distinct_years(&self) -> Result<Vec<i32>> {
        self.aggregate_queries.fetch_add(1, Ordering::SeqCst);
        if self.controls().distinct_years_unsupported {
            return Err(RainfallError::DataSourceUnavailable(
                "function distinct_years() does not exist".into(),
            ));
        }

        let mut years: Vec<i32> = self
            .observations
            .iter()
            .filter_map(|o| o.timestamp.map(|ts| ts.year()))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        Ok(years)
    }

    async fn has_observations(&self, window: TimeWindow) -> Result<bool> {
        self.probe_queries.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate(window.start.year()).await;

        if self.controls().failing_probes.contains(&window.start.year()) {
            return Err(RainfallError::DataSourceUnavailable("probe timed out".into()));
        }
        Ok(self.in_window(window).next().is_some())
    }

    async fn test_connection(&self) -> Result<bool> {
        Ok(true)
    }
}
