//! Counting definitions: the single place where the medical counting rules live.
//!
//! Every call site (interactive charts, PDF export, server-side report) goes
//! through these predicates so a "headache day" means the same thing everywhere.

use serde::{Deserialize, Serialize};

use crate::models::{MeCfsSeverity, MohRiskFlag};

/// Medication-overuse thresholds (absolute day counts, not rates).
pub mod thresholds {
    pub const TRIPTAN_LIKELY_DAYS: u32 = 10;
    pub const ACUTE_MED_LIKELY_DAYS: u32 = 15;
    pub const TRIPTAN_POSSIBLE_DAYS: u32 = 8;
    pub const ACUTE_MED_POSSIBLE_DAYS: u32 = 12;
}

/// Fixed ordinal table for ME/CFS severity comparison.
const SEVERITY_ORDINALS: [(MeCfsSeverity, u8); 4] = [
    (MeCfsSeverity::None, 0),
    (MeCfsSeverity::Mild, 1),
    (MeCfsSeverity::Moderate, 2),
    (MeCfsSeverity::Severe, 3),
];

/// Day counts the MOH heuristic looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MohCounts {
    pub triptan_days: u32,
    pub acute_med_days: u32,
    pub headache_days: u32,
}

/// A day is documented as soon as any entry exists, even one that says "no pain".
pub fn is_documented_day(has_any_entry: bool) -> bool {
    has_any_entry
}

pub fn is_headache_day(pain_max: Option<f64>) -> bool {
    matches!(pain_max, Some(p) if p > 0.0)
}

pub fn is_treatment_day(acute_med_used: bool) -> bool {
    acute_med_used
}

pub fn severity_ordinal(severity: MeCfsSeverity) -> u8 {
    SEVERITY_ORDINALS
        .iter()
        .find(|(s, _)| *s == severity)
        .map(|(_, ordinal)| *ordinal)
        .unwrap_or(0)
}

/// Highest severity among the present levels, or `None` when nothing was recorded.
pub fn compute_me_cfs_max<I>(levels: I) -> Option<MeCfsSeverity>
where
    I: IntoIterator<Item = Option<MeCfsSeverity>>,
{
    levels.into_iter().flatten().fold(None, |best, level| match best {
        Some(current) if severity_ordinal(current) >= severity_ordinal(level) => Some(current),
        _ => Some(level),
    })
}

/// Medication-overuse risk from absolute day counts.
///
/// The thresholds are absolute, so `range_days` does not enter the result.
pub fn compute_moh_risk_flag(counts: MohCounts, range_days: u32) -> MohRiskFlag {
    let _ = range_days;

    if counts.triptan_days >= thresholds::TRIPTAN_LIKELY_DAYS
        || counts.acute_med_days >= thresholds::ACUTE_MED_LIKELY_DAYS
    {
        MohRiskFlag::Likely
    } else if counts.triptan_days >= thresholds::TRIPTAN_POSSIBLE_DAYS
        || counts.acute_med_days >= thresholds::ACUTE_MED_POSSIBLE_DAYS
    {
        MohRiskFlag::Possible
    } else {
        MohRiskFlag::None
    }
}
