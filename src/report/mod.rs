//! Miary report: per-day aggregation, KPIs and chart series.
//!
//! One pure function turns a caller's entry list and date range into the
//! `MiaryReportV2` payload. The interactive UI, the PDF export and the
//! server-side generator all call it, so they cannot disagree on a count.

mod aggregate;
mod charts;
mod kpis;
mod types;


pub use aggregate::*;
pub use charts::*;
pub use kpis::*;
pub use types::*;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::REPORT_SCHEMA_VERSION;
use crate::error::ReportError;

/// Computes the full report, stamping `generatedAtISO` with the current time.
pub fn compute_miary_report(input: &ComputeReportInput) -> MiaryReportV2 {
    compute_miary_report_at(input, Utc::now())
}

/// Same as [`compute_miary_report`] with an explicit generation instant.
pub fn compute_miary_report_at(input: &ComputeReportInput, generated_at: DateTime<Utc>) -> MiaryReportV2 {
    let _span = tracing::debug_span!(
        "compute_miary_report",
        entries = input.entries.len(),
        start = %input.range.start_iso,
        end = %input.range.end_iso,
    )
    .entered();

    let range = normalize_range(&input.range);
    let counts_by_day = aggregate_days(&input.entries);
    let basis = compute_basis(&range, &counts_by_day);
    let kpis = compute_kpis(&counts_by_day, basis.total_days_in_range, &input.options);
    let charts = build_charts(&counts_by_day, &input.entries, &basis, &input.options);

    tracing::debug!(
        total_days = basis.total_days_in_range,
        documented_days = basis.documented_days,
        headache_days = kpis.headache_days,
        "Report computed"
    );

    MiaryReportV2 {
        meta: ReportMeta {
            generated_at_iso: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            schema_version: REPORT_SCHEMA_VERSION,
            range,
            basis,
        },
        kpis,
        charts,
        raw: ReportRaw { counts_by_day },
    }
}

/// JSON in, JSON out. Used by the server-side generator and the CLI.
pub fn compute_miary_report_from_json(input_json: &str) -> Result<String, ReportError> {
    let input: ComputeReportInput = serde_json::from_str(input_json)?;
    let report = compute_miary_report(&input);
    Ok(serde_json::to_string(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pinned() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn input(entries: Vec<ReportEntryInput>, total: Option<u32>) -> ComputeReportInput {
        ComputeReportInput {
            range: ReportRange {
                start_iso: "2026-02-01".into(),
                end_iso: "2026-02-28".into(),
                timezone: "Europe/Berlin".into(),
                mode: "custom".into(),
                total_days_in_range: total,
            },
            options: ReportOptions::default(),
            entries,
        }
    }

    fn entry(date: &str, pain: Option<f64>) -> ReportEntryInput {
        ReportEntryInput {
            date_iso: date.into(),
            pain_max: pain,
            acute_med_used: false,
            triptan_used: false,
            me_cfs_levels: vec![],
            medications: vec![],
            documented: true,
        }
    }

    #[test]
    fn empty_input_does_not_panic() {
        let report = compute_miary_report_at(&input(vec![], None), pinned());
        assert_eq!(report.meta.basis.total_days_in_range, 0);
        assert!(report.raw.counts_by_day.is_empty());
        assert!(report.charts.pain_intensity_trend.is_empty());
        assert_eq!(report.kpis.avg_pain, None);
    }

    #[test]
    fn generated_at_is_the_only_clock_dependent_field() {
        let i = input(vec![entry("2026-02-02", Some(3.0))], Some(28));
        let a = compute_miary_report_at(&i, pinned());
        let mut b = compute_miary_report(&i);
        assert_ne!(a.meta.generated_at_iso, "");
        b.meta.generated_at_iso = a.meta.generated_at_iso.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn generated_at_format() {
        let report = compute_miary_report_at(&input(vec![], None), pinned());
        assert_eq!(report.meta.generated_at_iso, "2026-03-01T08:00:00.000Z");
    }

    #[test]
    fn wire_keys_match_consumers() {
        let report = compute_miary_report_at(&input(vec![entry("2026-02-02", Some(3.0))], None), pinned());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["meta"]["generatedAtISO"].is_string());
        assert_eq!(json["meta"]["range"]["startISO"], "2026-02-01");
        assert_eq!(json["meta"]["basis"]["totalDaysInRange"], 1);
        assert_eq!(json["raw"]["countsByDay"][0]["dateISO"], "2026-02-02");
        assert_eq!(json["kpis"]["mohRiskFlag"], "none");
        assert_eq!(json["charts"]["legacyHeadacheDaysPie"][1]["key"], "painNoTriptan");
    }

    #[test]
    fn json_round_trip_entry_point() {
        let json = r#"{
            "range": {"startISO": "2026-02-01", "endISO": "2026-02-03", "timezone": "Europe/Berlin", "mode": "custom"},
            "entries": [{"dateISO": "2026-02-01", "painMax": 6, "acuteMedUsed": true, "triptanUsed": true, "documented": true}]
        }"#;
        let out = compute_miary_report_from_json(json).unwrap();
        let report: MiaryReportV2 = serde_json::from_str(&out).unwrap();
        assert_eq!(report.kpis.triptan_days, 1);
        assert_eq!(report.kpis.max_pain, Some(6.0));
    }

    #[test]
    fn raised_total_shows_in_basis_not_in_echoed_range() {
        let i = input(
            vec![entry("2026-02-02", Some(3.0)), entry("2026-02-03", None), entry("2026-02-04", Some(1.0))],
            Some(2),
        );
        let report = compute_miary_report_at(&i, pinned());
        assert_eq!(report.meta.range.total_days_in_range, Some(2));
        assert_eq!(report.meta.basis.total_days_in_range, 3);
        assert_eq!(report.meta.basis.undocumented_days, 0);
        let pie_sum: u32 = report.charts.legacy_headache_days_pie.iter().map(|s| s.days).sum();
        assert_eq!(pie_sum, 3);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(compute_miary_report_from_json("{\"range\": 1}").is_err());
    }
}
