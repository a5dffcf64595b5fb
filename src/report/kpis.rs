use crate::counting::{compute_moh_risk_flag, MohCounts};

use super::types::*;

/// Rounds to one decimal place, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Reduces per-day records (documented days only) to the report's scalar metrics.
pub fn compute_kpis(
    counts_by_day: &[DayCountRecord],
    total_days_in_range: u32,
    options: &ReportOptions,
) -> ReportKpis {
    let documented = counts_by_day.iter().filter(|d| d.documented);

    let mut headache_days = 0u32;
    let mut treatment_days = 0u32;
    let mut triptan_days = 0u32;
    let mut pain_sum = 0.0;
    let mut pain_n = 0u32;
    let mut max_pain: Option<f64> = None;

    for day in documented {
        if day.treatment {
            treatment_days += 1;
        }
        if day.triptan {
            triptan_days += 1;
        }
        if !day.headache {
            continue;
        }
        headache_days += 1;
        if let Some(pain) = day.pain_max {
            pain_sum += pain;
            pain_n += 1;
            max_pain = Some(max_pain.map_or(pain, |m: f64| m.max(pain)));
        }
    }

    let avg_pain = (pain_n > 0).then(|| round1(pain_sum / pain_n as f64));

    let moh_risk_flag = compute_moh_risk_flag(
        MohCounts {
            triptan_days,
            acute_med_days: treatment_days,
            headache_days,
        },
        total_days_in_range,
    );

    ReportKpis {
        headache_days,
        treatment_days,
        acute_med_days: treatment_days,
        triptan_days,
        avg_pain,
        max_pain,
        moh_risk_flag,
        preventive_med_active: options.preventive_med_active,
    }
}
