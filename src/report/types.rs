use serde::{Deserialize, Serialize};

use crate::models::{HeadacheDonutKey, LegacyPieKey, MeCfsDonutKey, MeCfsSeverity, MohRiskFlag};

// ── Input ─────────────────────────────────────────────────────────────────────

/// Date range a report covers. Dates are `YYYY-MM-DD` and compare lexicographically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRange {
    #[serde(rename = "startISO")]
    pub start_iso: String,
    #[serde(rename = "endISO")]
    pub end_iso: String,
    pub timezone: String,
    /// Opaque caller label for how the range was chosen (e.g. "last30", "custom").
    pub mode: String,
    /// Authoritative day count when supplied. Echoed unchanged in `meta.range`;
    /// a value below the documented day count is raised to that count in
    /// `meta.basis`, so `meta.basis.totalDaysInRange` may differ from it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_days_in_range: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationUse {
    pub medication_id: String,
    pub name: String,
    #[serde(default)]
    pub effect: Option<f64>,
}

/// One raw observation. Several may share a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntryInput {
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    #[serde(default)]
    pub pain_max: Option<f64>,
    #[serde(default)]
    pub acute_med_used: bool,
    #[serde(default)]
    pub triptan_used: bool,
    #[serde(default)]
    pub me_cfs_levels: Vec<MeCfsSeverity>,
    #[serde(default)]
    pub medications: Vec<MedicationUse>,
    pub documented: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOptions {
    #[serde(default)]
    pub include_me_cfs: bool,
    /// Caller-supplied context, passed through to the KPIs untouched.
    #[serde(default)]
    pub preventive_med_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeReportInput {
    pub range: ReportRange,
    #[serde(default)]
    pub options: ReportOptions,
    #[serde(default)]
    pub entries: Vec<ReportEntryInput>,
}

// ── Derived per-day record ───────────────────────────────────────────────────

/// Canonical summary of one calendar day, merged from all of its entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCountRecord {
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    pub documented: bool,
    pub headache: bool,
    pub treatment: bool,
    /// Tracked next to `treatment` but counted independently for MOH.
    pub triptan: bool,
    pub pain_max: Option<f64>,
    pub me_cfs_max: Option<MeCfsSeverity>,
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBasis {
    /// Effective day count: the caller's `totalDaysInRange` (raised to
    /// `documented_days` if lower), else the number of observed dates.
    pub total_days_in_range: u32,
    pub documented_days: u32,
    pub undocumented_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    /// Wall-clock time of computation; the only non-deterministic field.
    #[serde(rename = "generatedAtISO")]
    pub generated_at_iso: String,
    pub schema_version: u32,
    pub range: ReportRange,
    pub basis: ReportBasis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportKpis {
    pub headache_days: u32,
    pub treatment_days: u32,
    pub acute_med_days: u32,
    pub triptan_days: u32,
    pub avg_pain: Option<f64>,
    pub max_pain: Option<f64>,
    pub moh_risk_flag: MohRiskFlag,
    pub preventive_med_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonutSegment<K> {
    pub key: K,
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationStat {
    pub medication_id: String,
    pub name: String,
    pub days_used: u32,
    pub avg_effect: Option<f64>,
}

/// Reserved four-bucket shape; populated with zeros until entries carry time-of-day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDayDistribution {
    pub night: u32,
    pub morning: u32,
    pub afternoon: u32,
    pub evening: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCharts {
    pub headache_days_donut: Vec<DonutSegment<HeadacheDonutKey>>,
    pub pain_intensity_trend: Vec<TrendPoint>,
    pub medications: Vec<MedicationStat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub me_cfs: Option<Vec<DonutSegment<MeCfsDonutKey>>>,
    pub legacy_headache_days_pie: Vec<DonutSegment<LegacyPieKey>>,
    pub time_of_day_distribution: TimeOfDayDistribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRaw {
    pub counts_by_day: Vec<DayCountRecord>,
}

/// Complete report payload shared by the UI, the PDF export and the server report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiaryReportV2 {
    pub meta: ReportMeta,
    pub kpis: ReportKpis,
    pub charts: ReportCharts,
    pub raw: ReportRaw,
}

impl<K> DonutSegment<K> {
    pub fn new(key: K, days: u32) -> Self {
        Self { key, days }
    }
}

/// Looks up a segment's day count by key; 0 when absent.
pub fn segment_days<K: PartialEq>(segments: &[DonutSegment<K>], key: K) -> u32 {
    segments
        .iter()
        .find(|s| s.key == key)
        .map(|s| s.days)
        .unwrap_or(0)
}
