pub mod app_entry; // Diary rows -> engine inputs
pub mod config;
pub mod counting; // Shared day-counting rules
pub mod error;
pub mod models;
pub mod report; // MiaryReportV2
pub mod weather; // Weather features + pressure association

pub use app_entry::{
    build_app_analysis_report, build_full_analysis, build_pdf_report, FullAnalysis, PainEntry,
};
pub use error::ReportError;
pub use report::{compute_miary_report, compute_miary_report_at, ComputeReportInput, MiaryReportV2};
pub use weather::{
    build_weather_day_features, build_weather_day_features_with_counts, compute_weather_association,
    WeatherAnalysisV2, WeatherDayFeature,
};

use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}
