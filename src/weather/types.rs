use serde::{Deserialize, Serialize};

use crate::models::{
    lenient_enum, ConfidenceTier, EntryKind, PainLevel, PressureDeltaBucket, PressureLevelBucket,
    WeatherCoverage,
};
use crate::report::DayCountRecord;

// ── Input rows (snake_case, as stored) ───────────────────────────────────────

/// A stored weather observation. `id` is only used for deterministic tie-breaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherLogForFeature {
    pub id: i64,
    #[serde(default)]
    pub snapshot_date: Option<String>,
    #[serde(default)]
    pub requested_at: Option<String>,
    #[serde(default)]
    pub pressure_mb: Option<f64>,
    #[serde(default)]
    pub pressure_change_24h: Option<f64>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
}

/// A diary entry projected down to what the weather join needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryForWeatherJoin {
    #[serde(default)]
    pub selected_date: Option<String>,
    #[serde(default)]
    pub selected_time: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<String>,
    #[serde(default)]
    pub timestamp_created: Option<String>,
    #[serde(default)]
    pub weather_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub entry_kind: Option<EntryKind>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub pain_level: Option<PainLevel>,
}

impl EntryForWeatherJoin {
    /// Pain entries anchor the day's target time. Untyped rows count when they carry a pain level.
    pub fn is_pain_entry(&self) -> bool {
        match self.entry_kind {
            Some(kind) => kind == EntryKind::Pain,
            None => self.pain_level.is_some(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherFeatureInput {
    pub counts_by_day: Vec<DayCountRecord>,
    #[serde(default)]
    pub entries: Vec<EntryForWeatherJoin>,
    #[serde(default)]
    pub weather_logs: Vec<WeatherLogForFeature>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default = "default_true")]
    pub prefer_pain_as_target: bool,
}

// ── Derived features ─────────────────────────────────────────────────────────

/// One row per documented day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherDayFeature {
    pub date: String,
    pub pain_max: Option<f64>,
    pub had_headache: bool,
    pub had_acute_med: bool,
    pub pressure_mb: Option<f64>,
    pub pressure_change_24h: Option<f64>,
    pub temperature_c: Option<f64>,
    pub humidity: Option<f64>,
    pub weather_coverage: WeatherCoverage,
    /// Id of the weather log the row was filled from.
    #[serde(default)]
    pub weather_log_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCounts {
    pub entry: u32,
    pub snapshot: u32,
    pub none: u32,
}

impl CoverageCounts {
    pub fn from_features(features: &[WeatherDayFeature]) -> Self {
        features.iter().fold(Self::default(), |mut counts, f| {
            match f.weather_coverage {
                WeatherCoverage::Entry => counts.entry += 1,
                WeatherCoverage::Snapshot => counts.snapshot += 1,
                WeatherCoverage::None => counts.none += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> u32 {
        self.entry + self.snapshot + self.none
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherFeatureSet {
    pub features: Vec<WeatherDayFeature>,
    pub coverage_counts: CoverageCounts,
}

// ── Association analysis ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationOptions {
    #[serde(default)]
    pub coverage_counts: Option<CoverageCounts>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherBucketResult<K> {
    pub key: K,
    pub label: String,
    pub n_days: u32,
    pub headache_days: u32,
    pub headache_rate: f64,
    pub mean_pain_max: Option<f64>,
    pub acute_med_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeRiskResult {
    pub bucket: PressureDeltaBucket,
    pub reference: PressureDeltaBucket,
    /// `None` when the reference headache rate is zero.
    pub rr: Option<f64>,
    pub abs_diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsolutePressureAnalysis {
    pub n_days: u32,
    pub buckets: Vec<WeatherBucketResult<PressureLevelBucket>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherCoverageSummary {
    pub counts: CoverageCounts,
    /// Share of documented days with a 24h pressure change.
    pub delta_coverage_ratio: f64,
}

/// Weather/headache association report. Check `enabled` and `confidence`
/// before presenting any rate as meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAnalysisV2 {
    pub enabled: bool,
    pub confidence: ConfidenceTier,
    pub documented_days: u32,
    pub paired_days: u32,
    pub coverage: WeatherCoverageSummary,
    pub buckets: Vec<WeatherBucketResult<PressureDeltaBucket>>,
    pub relative_risk: Vec<RelativeRiskResult>,
    pub absolute_pressure: Option<AbsolutePressureAnalysis>,
    pub notes: Vec<String>,
    pub disclaimer: String,
}
