use chrono::Month;
use serde::{Deserialize, Serialize};

/// Rainfall summary for one calendar month of the selected year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub month_number: u32,
    pub month_name: String,
    pub total_days_with_data: u32,
    pub days_with_rain: u32,
    pub total_monthly_rain_mm: f64,
    pub rain_percentage: f64,
}

/// English full month name for 1..=12
pub fn month_name(month_number: u32) -> Option<&'static str> {
    let number = u8::try_from(month_number).ok()?;
    Month::try_from(number).ok().map(|m| m.name())
}

/// Round to the nearest tenth, halves away from zero
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
