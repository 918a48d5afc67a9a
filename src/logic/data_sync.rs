use super::aggregation;
use super::batch_fetch::BatchFetcher;
use super::single_flight::SingleFlight;
use super::year_discovery::{default_year, YearDiscovery};
use crate::config::Config;
use crate::datasources::ObservationStore;
use crate::error::Result;
use crate::models::{DashboardState, MonthlyStats};
use chrono::{Datelike, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// What happened to one fetch cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The cycle's statistics are now the displayed dataset
    Published(Vec<MonthlyStats>),
    /// A newer cycle or a different year selection won; the result was dropped
    Superseded,
    /// A cycle for the same year was still running; nothing was queried
    AlreadyInFlight,
    NoYearSelected,
}

struct SharedState {
    dashboard: DashboardState,
    /// Newest published ticket per year
    published: HashMap<i32, u64>,
}

/// Runs fetch cycles against the observation store and owns the dataset the
/// caller displays.
///
/// Cycles are never cancelled. Each one takes a ticket when it starts and is
/// published only if its year is still selected and no newer ticket has been
/// published for that year, so a late result from a superseded year never
/// overwrites the current selection. Cycles for one year never overlap, so a
/// cycle that was running when its year was re-selected still publishes.
pub struct RainfallSyncService<S> {
    store: Arc<S>,
    fetcher: BatchFetcher<S>,
    discovery: YearDiscovery<S>,
    state: RwLock<SharedState>,
    cycles: SingleFlight<i32>,
    discovering: SingleFlight<()>,
    next_ticket: AtomicU64,
    updates: watch::Sender<u64>,
}

impl<S: ObservationStore> RainfallSyncService<S> {
    pub fn new(store: Arc<S>, config: &Config) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            fetcher: BatchFetcher::new(Arc::clone(&store), config.refresh.concurrent_months),
            discovery: YearDiscovery::new(Arc::clone(&store), config.discovery.clone()),
            store,
            state: RwLock::new(SharedState {
                dashboard: DashboardState::default(),
                published: HashMap::new(),
            }),
            cycles: SingleFlight::new(),
            discovering: SingleFlight::new(),
            next_ticket: AtomicU64::new(0),
            updates,
        }
    }

    /// Initial load: discover years, pick the default, run the first cycle
    pub async fn initialize(&self) -> Result<CycleOutcome> {
        self.discover_years().await?;
        self.refresh().await
    }

    /// Refresh the list of years with data.
    ///
    /// Returns `None` without querying if a discovery is already running. Keeps
    /// the current selection when it is still present, otherwise falls back
    /// to the default year.
    pub async fn discover_years(&self) -> Result<Option<Vec<i32>>> {
        let Some(_guard) = self.discovering.try_acquire(()) else {
            tracing::debug!("Year discovery already in progress");
            return Ok(None);
        };

        let years = match self.discovery.discover().await {
            Ok(years) => years,
            Err(e) => {
                self.state.write().await.dashboard.error = Some(e.to_string());
                return Err(e);
            }
        };

        let mut state = self.state.write().await;
        let keep_selection = state
            .dashboard
            .selected_year
            .is_some_and(|y| years.contains(&y));
        if !keep_selection {
            state.dashboard.selected_year = default_year(&years, Utc::now().year());
            state.dashboard.stats.clear();
        }
        state.dashboard.available_years = years.clone();

        match state.dashboard.selected_year {
            Some(year) => tracing::info!("Selected year {}", year),
            None => tracing::info!("No years with data"),
        }

        Ok(Some(years))
    }

    /// Switch the displayed year and start a cycle for it
    pub async fn select_year(&self, year: i32) -> Result<CycleOutcome> {
        {
            let mut state = self.state.write().await;
            if state.dashboard.selected_year != Some(year) {
                state.dashboard.selected_year = Some(year);
                state.dashboard.stats.clear();
                state.dashboard.error = None;
            }
        }
        self.refresh_year(year).await
    }

    /// Re-fetch the selected year. Used for manual refresh and timer ticks.
    pub async fn refresh(&self) -> Result<CycleOutcome> {
        let selected = self.state.read().await.dashboard.selected_year;
        match selected {
            Some(year) => self.refresh_year(year).await,
            None => Ok(CycleOutcome::NoYearSelected),
        }
    }

    async fn refresh_year(&self, year: i32) -> Result<CycleOutcome> {
        let Some(guard) = self.cycles.try_acquire(year) else {
            tracing::debug!("Fetch for {} already in flight", year);
            return Ok(CycleOutcome::AlreadyInFlight);
        };
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Starting cycle {} for {}", ticket, year);

        let result = self
            .fetcher
            .fetch_year(year)
            .await
            .map(|observations| aggregation::monthly_stats(&observations, year));
        drop(guard);

        let mut state = self.state.write().await;
        let last_published = state.published.get(&year).copied().unwrap_or(0);
        let current = state.dashboard.selected_year == Some(year) && ticket > last_published;
        if !current {
            match &result {
                Ok(_) => tracing::debug!("Discarding superseded cycle {} for {}", ticket, year),
                Err(e) => tracing::warn!("Superseded cycle {} for {} failed: {}", ticket, year, e),
            }
            return Ok(CycleOutcome::Superseded);
        }

        state.published.insert(year, ticket);
        state.dashboard.last_updated = Some(Utc::now());

        let outcome = match result {
            Ok(stats) => {
                tracing::info!("Published {} months for {}", stats.len(), year);
                state.dashboard.stats = stats.clone();
                state.dashboard.error = None;
                Ok(CycleOutcome::Published(stats))
            }
            Err(e) => {
                tracing::warn!("Fetch cycle for {} failed: {}", year, e);
                state.dashboard.stats.clear();
                state.dashboard.error = Some(e.to_string());
                Err(e)
            }
        };
        drop(state);

        self.updates.send_replace(ticket);
        outcome
    }

    /// Current dataset and selector state for display
    pub async fn snapshot(&self) -> DashboardState {
        let mut dashboard = self.state.read().await.dashboard.clone();
        dashboard.loading = self.cycles.any_active();
        dashboard
    }

    /// Notified with the cycle ticket every time a cycle is published
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    pub fn is_in_flight(&self, year: i32) -> bool {
        self.cycles.is_active(&year)
    }

    pub fn is_discovering(&self) -> bool {
        self.discovering.any_active()
    }

    pub async fn check_connection(&self) -> bool {
        self.store.test_connection().await.unwrap_or(false)
    }
}
