use crate::models::{ConfidenceTier, PressureDeltaBucket, PressureLevelBucket};

use super::types::*;

/// Statistical thresholds for the pressure/headache association.
pub mod thresholds {
    /// Δp ≤ this (hPa / 24h) is a strong drop.
    pub const STRONG_DROP_MAX: f64 = -8.0;
    /// Δp ≤ this (and above the strong-drop bound) is a moderate drop; above it is stable/rise.
    pub const MODERATE_DROP_MAX: f64 = -3.0;

    pub const CONFIDENCE_LOW_MIN_DAYS: u32 = 20;
    pub const CONFIDENCE_MEDIUM_MIN_DAYS: u32 = 30;
    pub const CONFIDENCE_HIGH_MIN_DAYS: u32 = 60;

    /// Minimum days per bucket for relative risk, and below which a bucket is flagged as small.
    pub const MIN_BUCKET_DAYS: u32 = 5;
    pub const MIN_DELTA_COVERAGE_RATIO: f64 = 0.5;
    /// Acute-med rate spread across buckets above which medication may mask the pain signal.
    pub const CONFOUND_ACUTE_MED_SPREAD: f64 = 0.2;

    pub const ABSOLUTE_PRESSURE_MIN_DAYS: u32 = 60;
    pub const LOW_PRESSURE_BELOW: f64 = 1005.0;
    pub const HIGH_PRESSURE_ABOVE: f64 = 1025.0;
}

pub const DISCLAIMER: &str = "These figures describe a statistical association between weather and \
your documented headache days. Correlation is not causation, and this analysis is not a medical \
diagnosis. Discuss patterns with your doctor.";

pub fn confidence_tier(paired_days: u32) -> ConfidenceTier {
    if paired_days >= thresholds::CONFIDENCE_HIGH_MIN_DAYS {
        ConfidenceTier::High
    } else if paired_days >= thresholds::CONFIDENCE_MEDIUM_MIN_DAYS {
        ConfidenceTier::Medium
    } else if paired_days >= thresholds::CONFIDENCE_LOW_MIN_DAYS {
        ConfidenceTier::Low
    } else {
        ConfidenceTier::Insufficient
    }
}

pub fn classify_pressure_delta(delta: f64) -> PressureDeltaBucket {
    if delta <= thresholds::STRONG_DROP_MAX {
        PressureDeltaBucket::StrongDrop
    } else if delta <= thresholds::MODERATE_DROP_MAX {
        PressureDeltaBucket::ModerateDrop
    } else {
        PressureDeltaBucket::StableOrRise
    }
}

pub fn classify_pressure_level(pressure_mb: f64) -> PressureLevelBucket {
    if pressure_mb < thresholds::LOW_PRESSURE_BELOW {
        PressureLevelBucket::Low
    } else if pressure_mb > thresholds::HIGH_PRESSURE_ABOVE {
        PressureLevelBucket::High
    } else {
        PressureLevelBucket::Normal
    }
}

fn delta_label(bucket: PressureDeltaBucket) -> &'static str {
    match bucket {
        PressureDeltaBucket::StrongDrop => "Strong pressure drop (<= -8 hPa)",
        PressureDeltaBucket::ModerateDrop => "Moderate pressure drop (-8 to -3 hPa)",
        PressureDeltaBucket::StableOrRise => "Stable or rising pressure (> -3 hPa)",
    }
}

fn level_label(bucket: PressureLevelBucket) -> &'static str {
    match bucket {
        PressureLevelBucket::Low => "Low pressure (< 1005 hPa)",
        PressureLevelBucket::Normal => "Normal pressure (1005-1025 hPa)",
        PressureLevelBucket::High => "High pressure (> 1025 hPa)",
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Raw tallies for one bucket; rates are derived from these unrounded.
#[derive(Debug, Default, Clone, Copy)]
struct BucketTally {
    n_days: u32,
    headache_days: u32,
    acute_med_days: u32,
    pain_sum: f64,
    pain_n: u32,
}

impl BucketTally {
    fn add(&mut self, feature: &WeatherDayFeature) {
        self.n_days += 1;
        if feature.had_acute_med {
            self.acute_med_days += 1;
        }
        if feature.had_headache {
            self.headache_days += 1;
            if let Some(pain) = feature.pain_max {
                self.pain_sum += pain;
                self.pain_n += 1;
            }
        }
    }

    fn headache_rate(&self) -> f64 {
        if self.n_days == 0 {
            0.0
        } else {
            self.headache_days as f64 / self.n_days as f64
        }
    }

    fn acute_med_rate(&self) -> f64 {
        if self.n_days == 0 {
            0.0
        } else {
            self.acute_med_days as f64 / self.n_days as f64
        }
    }

    fn into_result<K>(self, key: K, label: &str) -> WeatherBucketResult<K> {
        WeatherBucketResult {
            key,
            label: label.to_string(),
            n_days: self.n_days,
            headache_days: self.headache_days,
            headache_rate: round_to(self.headache_rate(), 3),
            mean_pain_max: (self.pain_n > 0).then(|| round_to(self.pain_sum / self.pain_n as f64, 1)),
            acute_med_rate: round_to(self.acute_med_rate(), 3),
        }
    }
}

const DELTA_BUCKETS: [PressureDeltaBucket; 3] = [
    PressureDeltaBucket::StrongDrop,
    PressureDeltaBucket::ModerateDrop,
    PressureDeltaBucket::StableOrRise,
];

const LEVEL_BUCKETS: [PressureLevelBucket; 3] = [
    PressureLevelBucket::Low,
    PressureLevelBucket::Normal,
    PressureLevelBucket::High,
];

fn tally_by<'a, K: PartialEq + Copy, const N: usize>(
    keys: [K; N],
    samples: impl IntoIterator<Item = (K, &'a WeatherDayFeature)>,
) -> [BucketTally; N] {
    let mut tallies = [BucketTally::default(); N];
    for (key, feature) in samples {
        if let Some(i) = keys.iter().position(|k| *k == key) {
            tallies[i].add(feature);
        }
    }
    tallies
}

fn relative_risks(tallies: &[BucketTally; 3]) -> Vec<RelativeRiskResult> {
    let reference = tallies[2];
    if reference.n_days < thresholds::MIN_BUCKET_DAYS {
        return Vec::new();
    }
    let reference_rate = reference.headache_rate();

    DELTA_BUCKETS[..2]
        .iter()
        .zip(tallies.iter())
        .filter(|(_, t)| t.n_days >= thresholds::MIN_BUCKET_DAYS)
        .map(|(bucket, t)| {
            let rate = t.headache_rate();
            RelativeRiskResult {
                bucket: *bucket,
                reference: PressureDeltaBucket::StableOrRise,
                rr: (reference_rate > 0.0).then(|| round_to(rate / reference_rate, 2)),
                abs_diff: round_to(rate - reference_rate, 3),
            }
        })
        .collect()
}

fn absolute_pressure_analysis(features: &[WeatherDayFeature]) -> Option<AbsolutePressureAnalysis> {
    let with_pressure: Vec<(PressureLevelBucket, &WeatherDayFeature)> = features
        .iter()
        .filter_map(|f| f.pressure_mb.map(|p| (classify_pressure_level(p), f)))
        .collect();
    let n_days = with_pressure.len() as u32;
    if n_days < thresholds::ABSOLUTE_PRESSURE_MIN_DAYS {
        return None;
    }

    let tallies = tally_by(LEVEL_BUCKETS, with_pressure);
    Some(AbsolutePressureAnalysis {
        n_days,
        buckets: LEVEL_BUCKETS
            .iter()
            .zip(tallies)
            .map(|(key, tally)| tally.into_result(*key, level_label(*key)))
            .collect(),
    })
}

/// Analyzes how headache days distribute over 24h pressure-change buckets.
///
/// Never fails: too little delta data yields `enabled = false`, an `insufficient`
/// tier, empty buckets and an explanatory note. The absolute-pressure bands
/// have their own day gate and are reported either way.
pub fn compute_weather_association(
    features: &[WeatherDayFeature],
    options: &AssociationOptions,
) -> WeatherAnalysisV2 {
    let _span = tracing::debug_span!("compute_weather_association", features = features.len()).entered();

    let documented_days = features.len() as u32;
    let counts = options
        .coverage_counts
        .unwrap_or_else(|| CoverageCounts::from_features(features));

    let paired: Vec<(PressureDeltaBucket, &WeatherDayFeature)> = features
        .iter()
        .filter_map(|f| {
            f.pressure_change_24h
                .map(|delta| (classify_pressure_delta(delta), f))
        })
        .collect();
    let paired_days = paired.len() as u32;
    let delta_coverage_ratio = if documented_days == 0 {
        0.0
    } else {
        paired_days as f64 / documented_days as f64
    };
    let coverage = WeatherCoverageSummary {
        counts,
        delta_coverage_ratio: round_to(delta_coverage_ratio, 3),
    };

    let confidence = confidence_tier(paired_days);
    let absolute_pressure = absolute_pressure_analysis(features);
    let mut notes = Vec::new();

    if confidence == ConfidenceTier::Insufficient {
        notes.push(format!(
            "Only {paired_days} day(s) have pressure-change data; at least {} are needed before a weather pattern can be assessed.",
            thresholds::CONFIDENCE_LOW_MIN_DAYS
        ));
        tracing::debug!(paired_days, "Weather association insufficient");
        return WeatherAnalysisV2 {
            enabled: false,
            confidence,
            documented_days,
            paired_days,
            coverage,
            buckets: Vec::new(),
            relative_risk: Vec::new(),
            absolute_pressure,
            notes,
            disclaimer: DISCLAIMER.to_string(),
        };
    }

    let tallies = tally_by(DELTA_BUCKETS, paired);

    if delta_coverage_ratio < thresholds::MIN_DELTA_COVERAGE_RATIO {
        notes.push(format!(
            "Pressure-change data covers only {:.0}% of documented days; results may not be representative.",
            delta_coverage_ratio * 100.0
        ));
    }
    if counts.snapshot > 0 {
        notes.push(format!(
            "{} day(s) use a same-day weather snapshot rather than weather linked to an entry.",
            counts.snapshot
        ));
    }
    if counts.none > 0 {
        notes.push(format!("{} documented day(s) have no weather data.", counts.none));
    }

    for (bucket, tally) in DELTA_BUCKETS.iter().zip(tallies.iter()) {
        if tally.n_days < thresholds::MIN_BUCKET_DAYS {
            notes.push(format!(
                "{}: only {} day(s), rates are unstable.",
                delta_label(*bucket),
                tally.n_days
            ));
        }
    }

    let relative_risk = relative_risks(&tallies);
    if relative_risk.is_empty() {
        notes.push(format!(
            "Relative risk not computed: needs at least {} days with stable pressure and in one drop bucket.",
            thresholds::MIN_BUCKET_DAYS
        ));
    }

    let acute_rates: Vec<f64> = tallies
        .iter()
        .filter(|t| t.n_days > 0)
        .map(BucketTally::acute_med_rate)
        .collect();
    let spread = acute_rates.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        - acute_rates.iter().cloned().fold(f64::INFINITY, f64::min);
    if acute_rates.len() > 1 && spread > thresholds::CONFOUND_ACUTE_MED_SPREAD {
        notes.push(
            "Acute medication use differs markedly between pressure buckets; medication may be masking the natural pain pattern."
                .to_string(),
        );
    }

    let buckets = DELTA_BUCKETS
        .iter()
        .zip(tallies)
        .map(|(key, tally)| tally.into_result(*key, delta_label(*key)))
        .collect();

    tracing::debug!(
        paired_days,
        confidence = confidence.as_str(),
        relative_risks = relative_risk.len(),
        notes = notes.len(),
        "Weather association computed"
    );

    WeatherAnalysisV2 {
        enabled: true,
        confidence,
        documented_days,
        paired_days,
        coverage,
        buckets,
        relative_risk,
        absolute_pressure,
        notes,
        disclaimer: DISCLAIMER.to_string(),
    }
}
