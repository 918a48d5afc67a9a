use super::ObservationStore;
use crate::config::{PostgresConfig, StoreConfig};
use crate::error::{RainfallError, Result};
use crate::models::{parse_accumulation, Observation, TimeWindow};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

pub struct PgObservationStore {
    pool: PgPool,
    row_cap: usize,
    page_sql: String,
    years_sql: String,
    probe_sql: String,
}

impl PgObservationStore {
    /// Table and column names must already be validated identifiers
    pub async fn connect(config: &PostgresConfig, store: &StoreConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&config.connection_string())
            .await
            .map_err(|e| RainfallError::DataSourceUnavailable(format!("PostgreSQL: {}", e)))?;

        Ok(Self::with_pool(pool, store))
    }

    fn with_pool(pool: PgPool, store: &StoreConfig) -> Self {
        let (page_sql, years_sql, probe_sql) = build_queries(store);
        Self {
            pool,
            row_cap: store.row_cap,
            page_sql,
            years_sql,
            probe_sql,
        }
    }

    fn row_to_observation(row: &sqlx::postgres::PgRow) -> Observation {
        // timestamptz first, then a plain timestamp read as UTC
        let timestamp = match row.try_get::<Option<DateTime<Utc>>, _>("obs_timestamp") {
            Ok(ts) => ts,
            Err(_) => row
                .try_get::<Option<NaiveDateTime>, _>("obs_timestamp")
                .ok()
                .flatten()
                .map(|dt| dt.and_utc()),
        };

        let rain_accumulation = row
            .try_get::<Option<String>, _>("rain_accumulation")
            .ok()
            .flatten()
            .and_then(|raw| parse_accumulation(&raw));

        Observation {
            timestamp,
            rain_accumulation,
        }
    }
}

/// Page, distinct-years and probe statements for the configured table.
/// Accumulation is read as text so numeric, real and text columns parse alike.
/// Pages order by timestamp then accumulation; rows tied on both are
/// interchangeable, so offset paging cannot lose a distinct reading.
fn build_queries(store: &StoreConfig) -> (String, String, String) {
    let table = &store.table;
    let ts = &store.timestamp_column;
    let rain = &store.rain_column;

    let page_sql = format!(
        "SELECT {ts} AS obs_timestamp, {rain}::text AS rain_accumulation \
         FROM {table} \
         WHERE {ts} IS NOT NULL AND {ts} >= $1 AND {ts} < $2 \
         ORDER BY {ts} ASC, {rain} ASC NULLS LAST \
         LIMIT $3 OFFSET $4"
    );

    let years_sql = format!(
        "SELECT DISTINCT EXTRACT(YEAR FROM {ts} AT TIME ZONE 'UTC')::int4 AS year \
         FROM {table} \
         WHERE {ts} IS NOT NULL \
         ORDER BY year DESC"
    );

    let probe_sql = format!(
        "SELECT 1 AS present FROM {table} \
         WHERE {ts} IS NOT NULL AND {ts} >= $1 AND {ts} < $2 \
         LIMIT 1"
    );

    (page_sql, years_sql, probe_sql)
}

impl ObservationStore for PgObservationStore {
    fn row_cap(&self) -> usize {
        self.row_cap
    }

    async fn fetch_page(
        &self,
        window: TimeWindow,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Observation>> {
        let limit = limit.min(self.row_cap);

        let rows = sqlx::query(&self.page_sql)
            .bind(window.start)
            .bind(window.end)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(Self::row_to_observation).collect())
    }

    async fn distinct_years(&self) -> Result<Vec<i32>> {
        let rows = sqlx::query(&self.years_sql).fetch_all(&self.pool).await?;

        let mut years = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(year) = row.try_get::<Option<i32>, _>("year")? {
                years.push(year);
            }
        }
        Ok(years)
    }

    async fn has_observations(&self, window: TimeWindow) -> Result<bool> {
        let row = sqlx::query(&self.probe_sql)
            .bind(window.start)
            .bind(window.end)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    async fn test_connection(&self) -> Result<bool> {
        let result = sqlx::query("SELECT 1").fetch_one(&self.pool).await;

        Ok(result.is_ok())
    }
}
