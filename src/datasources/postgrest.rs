use super::ObservationStore;
use crate::config::{PostgrestConfig, StoreConfig};
use crate::error::{RainfallError, Result};
use crate::models::{parse_accumulation, Observation, TimeWindow};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// PostgREST (Supabase) endpoint. The server enforces its own max-rows
/// setting, so `row_cap` must match it for pagination to be complete.
pub struct PostgrestObservationStore {
    client: reqwest::Client,
    config: PostgrestConfig,
    table: String,
    timestamp_column: String,
    rain_column: String,
    row_cap: usize,
}

impl PostgrestObservationStore {
    pub fn new(config: PostgrestConfig, store: &StoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            table: store.table.clone(),
            timestamp_column: store.timestamp_column.clone(),
            rain_column: store.rain_column.clone(),
            row_cap: store.row_cap,
        }
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn range_url(&self, select: &str, window: TimeWindow, offset: usize, limit: usize) -> String {
        let ts = &self.timestamp_column;
        let rain = &self.rain_column;
        format!(
            "{}/rest/v1/{}?select={}&{ts}=not.is.null&{ts}=gte.{}&{ts}=lt.{}\
             &order={ts}.asc,{rain}.asc.nullslast&limit={}&offset={}",
            self.base_url(),
            self.table,
            select,
            window.start.format(TIMESTAMP_FORMAT),
            window.end.format(TIMESTAMP_FORMAT),
            limit,
            offset,
        )
    }

    async fn get_rows(&self, url: &str) -> Result<Vec<Map<String, Value>>> {
        let response = self
            .client
            .get(url)
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await
            .map_err(|e| RainfallError::DataSourceUnavailable(format!("PostgREST: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RainfallError::DataSourceUnavailable(format!(
                "PostgREST returned {}: {}",
                status, body
            )));
        }

        let rows: Vec<Map<String, Value>> = response.json().await.map_err(|e| {
            RainfallError::DataSourceUnavailable(format!(
                "Failed to parse PostgREST response: {}",
                e
            ))
        })?;

        Ok(rows)
    }

    fn row_to_observation(&self, row: &Map<String, Value>) -> Observation {
        Observation {
            timestamp: row
                .get(&self.timestamp_column)
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
            rain_accumulation: row.get(&self.rain_column).and_then(value_to_accumulation),
        }
    }
}

impl ObservationStore for PostgrestObservationStore {
    fn row_cap(&self) -> usize {
        self.row_cap
    }

    async fn fetch_page(
        &self,
        window: TimeWindow,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Observation>> {
        let select = format!("{},{}", self.timestamp_column, self.rain_column);
        let url = self.range_url(&select, window, offset, limit.min(self.row_cap));

        let rows = self.get_rows(&url).await?;
        Ok(rows.iter().map(|row| self.row_to_observation(row)).collect())
    }

    async fn distinct_years(&self) -> Result<Vec<i32>> {
        let Some(ref rpc) = self.config.distinct_years_rpc else {
            return Err(RainfallError::NotFound(
                "no distinct-years RPC configured".into(),
            ));
        };

        let url = format!("{}/rest/v1/rpc/{}", self.base_url(), rpc);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| RainfallError::DataSourceUnavailable(format!("PostgREST RPC: {}", e)))?;

        if !response.status().is_success() {
            return Err(RainfallError::DataSourceUnavailable(format!(
                "PostgREST RPC {} returned {}",
                rpc,
                response.status()
            )));
        }

        let values: Vec<Value> = response.json().await?;
        Ok(values.iter().filter_map(value_to_year).collect())
    }

    async fn has_observations(&self, window: TimeWindow) -> Result<bool> {
        let url = self.range_url(&self.timestamp_column, window, 0, 1);
        let rows = self.get_rows(&url).await?;
        Ok(!rows.is_empty())
    }

    async fn test_connection(&self) -> Result<bool> {
        let url = format!(
            "{}/rest/v1/{}?select={}&limit=1",
            self.base_url(),
            self.table,
            self.timestamp_column
        );

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await
            .map_err(|e| RainfallError::DataSourceUnavailable(format!("PostgREST: {}", e)))?;

        Ok(response.status().is_success())
    }
}

/// RFC 3339 with offset, or a bare timestamp taken as UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|dt| dt.and_utc())
}

fn value_to_accumulation(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_accumulation(s),
        _ => None,
    }
}

/// RPC rows come back either as bare numbers or as `{ "year": 2025 }`
fn value_to_year(value: &Value) -> Option<i32> {
    let n = match value {
        Value::Object(obj) => obj.get("year")?,
        other => other,
    };
    match n {
        Value::Number(num) => num.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
