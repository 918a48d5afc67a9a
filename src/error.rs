use thiserror::Error;

#[derive(Error, Debug)]
pub enum RainfallError {
    #[error("External database error: {0}")]
    ExternalDatabase(#[from] sqlx::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("Database query failed for {month} {year}: {reason}")]
    MonthFetch {
        year: i32,
        month: &'static str,
        reason: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, RainfallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_fetch_message_names_the_month() {
        let err = RainfallError::MonthFetch {
            year: 2025,
            month: "March",
            reason: "connection reset".into(),
        };
        assert_eq!(
            err.to_string(),
            "Database query failed for March 2025: connection reset"
        );
    }
}
