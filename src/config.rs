/// Engine-level constants
pub const ENGINE_NAME: &str = "miary-report";
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Report schema generation emitted in `MiaryReportV2`.
pub const REPORT_SCHEMA_VERSION: u32 = 2;

/// IANA zone used when a caller omits the timezone or passes one we cannot resolve.
pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> String {
    format!("{}=info,warn", ENGINE_NAME.replace('-', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_name_is_miary_report() {
        assert_eq!(ENGINE_NAME, "miary-report");
    }

    #[test]
    fn engine_version_matches_cargo() {
        assert_eq!(ENGINE_VERSION, "0.6.0");
    }

    #[test]
    fn default_filter_targets_library_crate() {
        assert_eq!(default_log_filter(), "miary_report=info,warn");
    }

    #[test]
    fn default_timezone_resolves() {
        assert!(DEFAULT_TIMEZONE.parse::<chrono_tz::Tz>().is_ok());
    }
}
