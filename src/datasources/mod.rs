#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod postgrest;

pub use postgres::PgObservationStore;
pub use postgrest::PostgrestObservationStore;

use crate::config::{Config, StoreBackend};
use crate::error::{RainfallError, Result};
use crate::models::{Observation, TimeWindow};
use std::future::Future;

/// Read contract of the remote observation table.
///
/// Every query returns at most `row_cap()` rows; callers page through a window
/// with `offset` when a full page comes back.
pub trait ObservationStore: Send + Sync {
    fn row_cap(&self) -> usize;

    /// Observations with a non-null timestamp in `[start, end)`, ascending by timestamp
    fn fetch_page(
        &self,
        window: TimeWindow,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Observation>>> + Send;

    /// Server-side distinct years aggregate. Fails when the store cannot answer it.
    fn distinct_years(&self) -> impl Future<Output = Result<Vec<i32>>> + Send;

    /// `limit 1` existence probe
    fn has_observations(&self, window: TimeWindow) -> impl Future<Output = Result<bool>> + Send;

    fn test_connection(&self) -> impl Future<Output = Result<bool>> + Send;
}

/// The configured backend
pub enum StoreClient {
    Postgres(PgObservationStore),
    Postgrest(PostgrestObservationStore),
}

impl StoreClient {
    pub async fn connect(config: &Config) -> Result<Self> {
        match config.store.backend {
            StoreBackend::Postgres => {
                let pg = config.postgres.as_ref().ok_or_else(|| {
                    RainfallError::Config("postgres section is missing".into())
                })?;
                let store = PgObservationStore::connect(pg, &config.store).await?;
                tracing::info!("Connected to PostgreSQL observation store");
                Ok(Self::Postgres(store))
            }
            StoreBackend::Postgrest => {
                let rest = config.postgrest.as_ref().ok_or_else(|| {
                    RainfallError::Config("postgrest section is missing".into())
                })?;
                tracing::info!("Using PostgREST observation store at {}", rest.url);
                Ok(Self::Postgrest(PostgrestObservationStore::new(
                    rest.clone(),
                    &config.store,
                )))
            }
        }
    }
}

impl ObservationStore for StoreClient {
    fn row_cap(&self) -> usize {
        match self {
            Self::Postgres(s) => s.row_cap(),
            Self::Postgrest(s) => s.row_cap(),
        }
    }

    async fn fetch_page(
        &self,
        window: TimeWindow,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Observation>> {
        match self {
            Self::Postgres(s) => s.fetch_page(window, offset, limit).await,
            Self::Postgrest(s) => s.fetch_page(window, offset, limit).await,
        }
    }

    async fn distinct_years(&self) -> Result<Vec<i32>> {
        match self {
            Self::Postgres(s) => s.distinct_years().await,
            Self::Postgrest(s) => s.distinct_years().await,
        }
    }

    async fn has_observations(&self, window: TimeWindow) -> Result<bool> {
        match self {
            Self::Postgres(s) => s.has_observations(window).await,
            Self::Postgrest(s) => s.has_observations(window).await,
        }
    }

    async fn test_connection(&self) -> Result<bool> {
        match self {
            Self::Postgres(s) => s.test_connection().await,
            Self::Postgrest(s) => s.test_connection().await,
        }
    }
}
