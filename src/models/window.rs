use super::monthly_stats::month_name;
use chrono::{DateTime, NaiveDate, Utc};

/// Half-open UTC time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    /// The whole calendar year in UTC
    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start: first_of_month(year, 1)?,
            end: first_of_month(year + 1, 1)?,
        })
    }
}

/// One calendar month of a year, used as a single fetch batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub year: i32,
    pub month: u32,
    pub window: TimeWindow,
}

impl MonthWindow {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let start = first_of_month(year, month)?;
        let end = if month == 12 {
            first_of_month(year + 1, 1)?
        } else {
            first_of_month(year, month + 1)?
        };
        Some(Self {
            year,
            month,
            window: TimeWindow { start, end },
        })
    }

    /// All twelve windows of `year` in calendar order
    pub fn for_year(year: i32) -> Vec<Self> {
        (1..=12).filter_map(|m| Self::new(year, m)).collect()
    }

    pub fn month_name(&self) -> &'static str {
        month_name(self.month).unwrap_or("Unknown")
    }
}

fn first_of_month(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn year_splits_into_twelve_contiguous_windows() {
        let windows = MonthWindow::for_year(2024);
        assert_eq!(windows.len(), 12);

        assert_eq!(
            windows[0].window.start,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            windows[11].window.end,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );

        for pair in windows.windows(2) {
            assert_eq!(pair[0].window.end, pair[1].window.start);
        }
    }

    #[test]
    fn february_window_respects_leap_year() {
        let feb = MonthWindow::new(2024, 2).unwrap();
        assert_eq!(
            feb.window.end,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert!(feb
            .window
            .contains(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()));
        assert_eq!(feb.month_name(), "February");
    }

    #[test]
    fn window_is_half_open() {
        let jan = MonthWindow::new(2025, 1).unwrap().window;
        assert!(jan.contains(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        assert!(!jan.contains(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()));
        assert!(!jan.contains(Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap()));
    }

    #[test]
    fn invalid_month_yields_none() {
        assert!(MonthWindow::new(2025, 0).is_none());
        assert!(MonthWindow::new(2025, 13).is_none());
    }
}
