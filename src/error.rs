use thiserror::Error;

/// Failures at the parsing edges of the engine.
///
/// The report and weather computations themselves never fail; they degrade
/// to `None`/zero. These errors come from turning caller strings into typed
/// values (enums, timezones, dates) and from the JSON convenience wrappers.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
