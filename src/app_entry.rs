//! Diary entry adapter shared by every report call site.
//!
//! The app stores pain diary rows with a verbal pain scale and a list of
//! medication intakes. The interactive analysis view, the PDF export and the
//! server-side report all project those rows through this module, so the
//! engine always sees the same inputs for the same diary.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::models::{lenient_enum, EntryKind, MeCfsSeverity, PainLevel};
use crate::report::{
    compute_miary_report, ComputeReportInput, MedicationUse, MiaryReportV2, ReportEntryInput,
    ReportOptions, ReportRange,
};
use crate::weather::time;
use crate::weather::{
    build_weather_day_features_with_counts, compute_weather_association, AssociationOptions,
    EntryForWeatherJoin, WeatherAnalysisV2, WeatherFeatureInput, WeatherFeatureSet,
    WeatherLogForFeature,
};

/// Medication taken as part of a diary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationIntake {
    pub medication_id: String,
    pub name: String,
    /// Self-rated effect, 0-10.
    #[serde(default)]
    pub effect: Option<f64>,
}

/// A diary row as the app stores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PainEntry {
    pub id: i64,
    #[serde(default)]
    pub selected_date: Option<String>,
    #[serde(default)]
    pub selected_time: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<String>,
    #[serde(default)]
    pub timestamp_created: Option<String>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub entry_kind: Option<EntryKind>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub pain_level: Option<PainLevel>,
    #[serde(default)]
    pub medications: Vec<MedicationIntake>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub me_cfs_severity: Option<MeCfsSeverity>,
    #[serde(default)]
    pub weather_id: Option<i64>,
}

/// Medications whose name marks them as a triptan.
pub fn is_triptan(name: &str) -> bool {
    name.to_lowercase().contains("triptan")
}

/// Report day of an entry: `selected_date`, else the local date of `occurred_at`,
/// else the local date of `timestamp_created`. Matches the weather join.
fn report_date(entry: &PainEntry, tz: Tz) -> Option<String> {
    if let Some(date) = entry.selected_date.as_deref().and_then(time::date_prefix) {
        return Some(date.to_string());
    }
    [&entry.occurred_at, &entry.timestamp_created]
        .into_iter()
        .flatten()
        .find_map(|raw| time::local_day_key(raw, tz))
}

/// Projects a diary row onto the report input. Rows without any usable date yield `None`.
pub fn to_report_entry(entry: &PainEntry, tz: Tz) -> Option<ReportEntryInput> {
    let date_iso = report_date(entry, tz)?;
    Some(ReportEntryInput {
        date_iso,
        pain_max: entry.pain_level.map(|level| level.numeric()),
        acute_med_used: !entry.medications.is_empty(),
        triptan_used: entry.medications.iter().any(|m| is_triptan(&m.name)),
        me_cfs_levels: entry.me_cfs_severity.into_iter().collect(),
        medications: entry
            .medications
            .iter()
            .map(|m| MedicationUse {
                medication_id: m.medication_id.clone(),
                name: m.name.clone(),
                effect: m.effect,
            })
            .collect(),
        documented: true,
    })
}

pub fn to_weather_join_entry(entry: &PainEntry) -> EntryForWeatherJoin {
    EntryForWeatherJoin {
        selected_date: entry.selected_date.clone(),
        selected_time: entry.selected_time.clone(),
        occurred_at: entry.occurred_at.clone(),
        timestamp_created: entry.timestamp_created.clone(),
        weather_id: entry.weather_id,
        entry_kind: entry.entry_kind,
        pain_level: entry.pain_level,
    }
}

/// Inclusive number of calendar days between two `YYYY-MM-DD` dates, in either order.
pub fn calendar_days_inclusive(start_iso: &str, end_iso: &str) -> Result<u32, ReportError> {
    let parse = |raw: &str| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ReportError::InvalidDate(raw.to_string()))
    };
    let start = parse(start_iso)?;
    let end = parse(end_iso)?;
    Ok((end - start).num_days().unsigned_abs() as u32 + 1)
}

fn with_calendar_total(range: &ReportRange) -> ReportRange {
    let mut range = range.clone();
    if range.total_days_in_range.is_none() {
        match calendar_days_inclusive(&range.start_iso, &range.end_iso) {
            Ok(days) => range.total_days_in_range = Some(days),
            Err(e) => tracing::warn!("Cannot derive calendar length of report range: {e}"),
        }
    }
    range
}

/// Report for the in-app analysis screen.
pub fn build_app_analysis_report(
    entries: &[PainEntry],
    range: &ReportRange,
    options: &ReportOptions,
) -> MiaryReportV2 {
    let tz = time::resolve_timezone(Some(range.timezone.as_str()));
    let input = ComputeReportInput {
        range: with_calendar_total(range),
        options: options.clone(),
        entries: entries.iter().filter_map(|e| to_report_entry(e, tz)).collect(),
    };
    compute_miary_report(&input)
}

/// Report for the PDF export. Same computation as the analysis screen.
pub fn build_pdf_report(
    entries: &[PainEntry],
    range: &ReportRange,
    options: &ReportOptions,
) -> MiaryReportV2 {
    build_app_analysis_report(entries, range, options)
}

/// Report, weather features and weather association in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullAnalysis {
    pub report: MiaryReportV2,
    pub weather_features: WeatherFeatureSet,
    pub weather: WeatherAnalysisV2,
}

pub fn build_full_analysis(
    entries: &[PainEntry],
    weather_logs: &[WeatherLogForFeature],
    range: &ReportRange,
    options: &ReportOptions,
) -> FullAnalysis {
    let report = build_app_analysis_report(entries, range, options);

    let weather_features = build_weather_day_features_with_counts(&WeatherFeatureInput {
        counts_by_day: report.raw.counts_by_day.clone(),
        entries: entries.iter().map(to_weather_join_entry).collect(),
        weather_logs: weather_logs.to_vec(),
        timezone: Some(range.timezone.clone()),
        prefer_pain_as_target: true,
    });

    let weather = compute_weather_association(
        &weather_features.features,
        &AssociationOptions {
            coverage_counts: Some(weather_features.coverage_counts),
        },
    );

    FullAnalysis {
        report,
        weather_features,
        weather,
    }
}
