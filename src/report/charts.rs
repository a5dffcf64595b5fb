use std::collections::{BTreeSet, HashMap};

use crate::models::{HeadacheDonutKey, LegacyPieKey, MeCfsDonutKey};

use super::kpis::round1;
use super::types::*;

/// Builds every chart aggregate from the per-day records and the raw entries.
pub fn build_charts(
    counts_by_day: &[DayCountRecord],
    entries: &[ReportEntryInput],
    basis: &ReportBasis,
    options: &ReportOptions,
) -> ReportCharts {
    ReportCharts {
        headache_days_donut: headache_days_donut(counts_by_day, basis),
        pain_intensity_trend: pain_intensity_trend(counts_by_day),
        medications: medication_stats(entries),
        me_cfs: options
            .include_me_cfs
            .then(|| me_cfs_donut(counts_by_day, basis)),
        legacy_headache_days_pie: legacy_headache_days_pie(counts_by_day, basis),
        time_of_day_distribution: TimeOfDayDistribution::default(),
    }
}

/// Headache / no headache / undocumented, counted over the whole range.
pub fn headache_days_donut(
    counts_by_day: &[DayCountRecord],
    basis: &ReportBasis,
) -> Vec<DonutSegment<HeadacheDonutKey>> {
    let headache = counts_by_day
        .iter()
        .filter(|d| d.documented && d.headache)
        .count() as u32;

    vec![
        DonutSegment::new(HeadacheDonutKey::Headache, headache),
        DonutSegment::new(HeadacheDonutKey::NoHeadache, basis.documented_days - headache),
        DonutSegment::new(HeadacheDonutKey::Undocumented, basis.undocumented_days),
    ]
}

pub fn pain_intensity_trend(counts_by_day: &[DayCountRecord]) -> Vec<TrendPoint> {
    counts_by_day
        .iter()
        .map(|d| TrendPoint {
            date_iso: d.date_iso.clone(),
            value: d.pain_max,
        })
        .collect()
}

#[derive(Default)]
struct MedicationAccumulator<'a> {
    name: &'a str,
    dates: BTreeSet<&'a str>,
    effect_sum: f64,
    effect_n: u32,
}

/// Per-medication usage: distinct days used and mean rated effect, most-used first.
pub fn medication_stats(entries: &[ReportEntryInput]) -> Vec<MedicationStat> {
    let mut by_id: HashMap<&str, MedicationAccumulator> = HashMap::new();

    for entry in entries {
        for med in &entry.medications {
            let acc = by_id
                .entry(med.medication_id.as_str())
                .or_insert_with(|| MedicationAccumulator {
                    name: med.name.as_str(),
                    ..Default::default()
                });
            acc.dates.insert(entry.date_iso.as_str());
            if let Some(effect) = med.effect {
                acc.effect_sum += effect;
                acc.effect_n += 1;
            }
        }
    }

    let mut stats: Vec<MedicationStat> = by_id
        .into_iter()
        .map(|(id, acc)| MedicationStat {
            medication_id: id.to_string(),
            name: acc.name.to_string(),
            days_used: acc.dates.len() as u32,
            avg_effect: (acc.effect_n > 0).then(|| round1(acc.effect_sum / acc.effect_n as f64)),
        })
        .collect();

    // HashMap order is random; name and id make ties deterministic.
    stats.sort_by(|a, b| {
        b.days_used
            .cmp(&a.days_used)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.medication_id.cmp(&b.medication_id))
    });
    stats
}

/// ME/CFS severity donut. Days without a recorded level fall into `undocumented`.
pub fn me_cfs_donut(
    counts_by_day: &[DayCountRecord],
    basis: &ReportBasis,
) -> Vec<DonutSegment<MeCfsDonutKey>> {
    let mut segments: Vec<DonutSegment<MeCfsDonutKey>> = [
        MeCfsDonutKey::None,
        MeCfsDonutKey::Mild,
        MeCfsDonutKey::Moderate,
        MeCfsDonutKey::Severe,
    ]
    .into_iter()
    .map(|key| DonutSegment::new(key, 0))
    .collect();

    let mut rated = 0u32;
    for day in counts_by_day.iter().filter(|d| d.documented) {
        if let Some(severity) = day.me_cfs_max {
            let key = MeCfsDonutKey::from(severity);
            if let Some(segment) = segments.iter_mut().find(|s| s.key == key) {
                segment.days += 1;
                rated += 1;
            }
        }
    }

    segments.push(DonutSegment::new(
        MeCfsDonutKey::Undocumented,
        basis.total_days_in_range - rated,
    ));
    segments
}

/// Three-bucket classification with priority triptan > pain without triptan > pain free.
///
/// `painFree` is the remainder, so the segments always sum to `total_days_in_range`.
pub fn legacy_headache_days_pie(
    counts_by_day: &[DayCountRecord],
    basis: &ReportBasis,
) -> Vec<DonutSegment<LegacyPieKey>> {
    let documented = counts_by_day.iter().filter(|d| d.documented);
    let (triptan, pain_no_triptan) = documented.fold((0u32, 0u32), |(t, p), day| {
        if day.triptan {
            (t + 1, p)
        } else if day.headache {
            (t, p + 1)
        } else {
            (t, p)
        }
    });

    let pain_free = basis
        .total_days_in_range
        .saturating_sub(triptan + pain_no_triptan);

    vec![
        DonutSegment::new(LegacyPieKey::Triptan, triptan),
        DonutSegment::new(LegacyPieKey::PainNoTriptan, pain_no_triptan),
        DonutSegment::new(LegacyPieKey::PainFree, pain_free),
    ]
}
