use std::collections::BTreeMap;

use crate::counting::{compute_me_cfs_max, is_documented_day, is_headache_day, is_treatment_day};
use crate::models::MeCfsSeverity;

use super::types::*;

/// Working state while folding a day's entries together.
#[derive(Debug, Default)]
struct DayAccumulator {
    has_documented_entry: bool,
    pain_max: Option<f64>,
    acute_med_used: bool,
    triptan_used: bool,
    me_cfs_levels: Vec<MeCfsSeverity>,
}

impl DayAccumulator {
    fn absorb(&mut self, entry: &ReportEntryInput) {
        self.has_documented_entry |= entry.documented;
        self.pain_max = max_pain(self.pain_max, entry.pain_max);
        self.acute_med_used |= entry.acute_med_used;
        self.triptan_used |= entry.triptan_used;
        self.me_cfs_levels.extend(entry.me_cfs_levels.iter().copied());
    }

    fn into_record(self, date_iso: String) -> DayCountRecord {
        let documented = is_documented_day(self.has_documented_entry);
        DayCountRecord {
            date_iso,
            documented,
            headache: documented && is_headache_day(self.pain_max),
            treatment: documented && is_treatment_day(self.acute_med_used),
            triptan: documented && self.triptan_used,
            pain_max: self.pain_max,
            me_cfs_max: compute_me_cfs_max(self.me_cfs_levels.into_iter().map(Some)),
        }
    }
}

/// Null-safe maximum: a present value always beats an absent one.
fn max_pain(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

/// Returns the range with start/end ordered. An inverted range is swapped, never rejected.
pub fn normalize_range(range: &ReportRange) -> ReportRange {
    let mut normalized = range.clone();
    if normalized.start_iso > normalized.end_iso {
        tracing::warn!(
            start = %range.start_iso,
            end = %range.end_iso,
            "Report range inverted, swapping start and end"
        );
        std::mem::swap(&mut normalized.start_iso, &mut normalized.end_iso);
    }
    normalized
}

/// Merges all entries sharing a date into one record per date, ascending by date.
pub fn aggregate_days(entries: &[ReportEntryInput]) -> Vec<DayCountRecord> {
    let mut days: BTreeMap<&str, DayAccumulator> = BTreeMap::new();

    for entry in entries {
        days.entry(entry.date_iso.as_str())
            .or_default()
            .absorb(entry);
    }

    days.into_iter()
        .map(|(date, acc)| acc.into_record(date.to_string()))
        .collect()
}

/// Resolves the day basis. An explicit `total_days_in_range` wins over the
/// observed date count, but is never allowed below the documented day count.
pub fn compute_basis(range: &ReportRange, counts_by_day: &[DayCountRecord]) -> ReportBasis {
    let documented_days = counts_by_day.iter().filter(|d| d.documented).count() as u32;
    let observed_days = counts_by_day.len() as u32;

    let total_days_in_range = match range.total_days_in_range {
        Some(total) if total < documented_days => {
            tracing::warn!(
                total,
                documented_days,
                "totalDaysInRange below documented days, raising to documented count"
            );
            documented_days
        }
        Some(total) => total,
        None => observed_days,
    };

    ReportBasis {
        total_days_in_range,
        documented_days,
        undocumented_days: total_days_in_range - documented_days,
    }
}
