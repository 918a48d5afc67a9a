use crate::models::DashboardState;
use std::fmt::Write;

/// Plain-text table of the published statistics
pub fn render_table(station: &str, state: &DashboardState) -> String {
    let mut out = String::new();

    let Some(year) = state.selected_year else {
        let _ = writeln!(out, "{}: no rainfall data available", station);
        return out;
    };

    let _ = writeln!(out, "{} ({})", station, year);

    if let Some(ref error) = state.error {
        let _ = writeln!(out, "Error: {}", error);
        let _ = writeln!(out, "Retry with `rainfall-dash report` or wait for the next refresh.");
        return out;
    }

    if !state.has_data() {
        let _ = writeln!(out, "No observations recorded for {}", year);
        return out;
    }

    let _ = writeln!(
        out,
        "{:<10} {:>5} {:>10} {:>10} {:>7}",
        "Month", "Days", "Rain days", "Rain (mm)", "Rain %"
    );
    for s in &state.stats {
        let _ = writeln!(
            out,
            "{:<10} {:>5} {:>10} {:>10.1} {:>7.1}",
            s.month_name,
            s.total_days_with_data,
            s.days_with_rain,
            s.total_monthly_rain_mm,
            s.rain_percentage
        );
    }
    let _ = writeln!(
        out,
        "{:<10} {:>5} {:>10} {:>10.1} {:>7.1}",
        "Total",
        state.total_days_with_data(),
        state.total_rain_days(),
        state.total_rain_mm(),
        state.overall_rain_percentage()
    );

    if let Some(updated) = state.last_updated {
        let _ = writeln!(out, "Updated {}", updated.format("%Y-%m-%d %H:%M UTC"));
    }

    out
}
