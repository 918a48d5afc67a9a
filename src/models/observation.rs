use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One raw reading from the station as returned by the observation store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: Option<DateTime<Utc>>,
    pub rain_accumulation: Option<f64>,
}

impl Observation {
    pub fn new(timestamp: DateTime<Utc>, rain_accumulation: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            rain_accumulation: Some(rain_accumulation),
        }
    }

    /// Accumulation in mm, with missing, non-finite and negative values read as zero.
    /// Negative values are the station's missing-data markers.
    pub fn rain_mm(&self) -> f64 {
        match self.rain_accumulation {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => 0.0,
        }
    }

    /// UTC calendar day of the observation, if it has a timestamp
    pub fn utc_day(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date_naive())
    }
}

/// Maximum accumulation recorded on one UTC calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyReading {
    pub day: NaiveDate,
    pub max_accumulation_mm: f64,
}

/// Parse a raw accumulation value the way the store delivers it as text.
/// Returns `None` for empty or non-numeric input.
pub fn parse_accumulation(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
