use super::monthly_stats::MonthlyStats;
use crate::logic::aggregation::rain_percentage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the caller displays: the latest published cycle plus selector state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardState {
    /// Years known to contain data, newest first
    pub available_years: Vec<i32>,
    pub selected_year: Option<i32>,
    pub stats: Vec<MonthlyStats>,
    pub error: Option<String>,
    pub loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn has_data(&self) -> bool {
        !self.stats.is_empty()
    }

    pub fn total_rain_mm(&self) -> f64 {
        self.stats.iter().map(|s| s.total_monthly_rain_mm).sum()
    }

    pub fn total_days_with_data(&self) -> u32 {
        self.stats.iter().map(|s| s.total_days_with_data).sum()
    }

    pub fn total_rain_days(&self) -> u32 {
        self.stats.iter().map(|s| s.days_with_rain).sum()
    }

    /// Share of days with data that had rain, across the whole year
    pub fn overall_rain_percentage(&self) -> f64 {
        rain_percentage(self.total_rain_days(), self.total_days_with_data())
    }
}
