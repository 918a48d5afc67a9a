use crate::models::{month_name, round_to_tenth, DailyReading, MonthlyStats, Observation};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct MonthAccumulator {
    days: u32,
    rainy_days: u32,
    total_mm: f64,
}

/// Maximum accumulation per UTC calendar day.
///
/// Observations without a timestamp are skipped. Equal values keep the
/// existing reading, so the result does not depend on input order.
pub fn daily_maxima(observations: &[Observation]) -> BTreeMap<NaiveDate, f64> {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for obs in observations {
        let Some(day) = obs.utc_day() else {
            continue;
        };
        let rain = obs.rain_mm();

        daily
            .entry(day)
            .and_modify(|max| {
                if rain > *max {
                    *max = rain;
                }
            })
            .or_insert(rain);
    }

    daily
}

/// Daily maxima as readings, ascending by day
pub fn daily_readings(observations: &[Observation]) -> Vec<DailyReading> {
    daily_maxima(observations)
        .into_iter()
        .map(|(day, max_accumulation_mm)| DailyReading {
            day,
            max_accumulation_mm,
        })
        .collect()
}

/// Roll daily maxima into monthly statistics for `target_year`.
///
/// Days outside the target year are dropped. Months without any day are
/// omitted; the result is ascending by month.
///
/// Readings are summed in the order given; `daily_readings` yields them by day,
/// which keeps the float sums stable under input permutation.
pub fn rollup(daily: &[DailyReading], target_year: i32) -> Vec<MonthlyStats> {
    let mut months: BTreeMap<u32, MonthAccumulator> = BTreeMap::new();

    for reading in daily.iter().filter(|r| r.day.year() == target_year) {
        let rain = reading.max_accumulation_mm;
        let acc = months.entry(reading.day.month()).or_default();
        acc.days += 1;
        if rain > 0.0 {
            acc.rainy_days += 1;
        }
        acc.total_mm += rain;
    }

    let mut stats: Vec<MonthlyStats> = months
        .into_iter()
        .filter(|(_, acc)| acc.days > 0)
        .map(|(month, acc)| MonthlyStats {
            month_number: month,
            month_name: month_name(month).unwrap_or_default().to_string(),
            total_days_with_data: acc.days,
            days_with_rain: acc.rainy_days,
            total_monthly_rain_mm: round_to_tenth(acc.total_mm),
            rain_percentage: rain_percentage(acc.rainy_days, acc.days),
        })
        .collect();

    stats.sort_by_key(|s| s.month_number);
    stats
}

/// Share of days with rain, in percent rounded to one decimal
pub fn rain_percentage(days_with_rain: u32, total_days: u32) -> f64 {
    if total_days == 0 {
        return 0.0;
    }
    round_to_tenth(f64::from(days_with_rain) / f64::from(total_days) * 100.0)
}

/// Full pipeline: raw observations to ordered monthly statistics
pub fn monthly_stats(observations: &[Observation], target_year: i32) -> Vec<MonthlyStats> {
    let daily = daily_readings(observations);
    tracing::debug!("Total daily entries: {}", daily.len());

    let stats = rollup(&daily, target_year);
    tracing::debug!(
        "Days per month: {:?}",
        stats
            .iter()
            .map(|s| (s.month_number, s.total_days_with_data))
            .collect::<Vec<_>>()
    );
    stats
}
