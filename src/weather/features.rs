use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono_tz::Tz;

use crate::models::WeatherCoverage;

use super::time::*;
use super::types::*;

/// An entry placed on a day, with its local time if one could be resolved.
#[derive(Debug)]
struct PlacedEntry<'a> {
    entry: &'a EntryForWeatherJoin,
    minutes: Option<i64>,
}

/// Day key: `selected_date`, then local date of `occurred_at`, then local date of `timestamp_created`.
fn entry_day_key(entry: &EntryForWeatherJoin, tz: Tz) -> Option<String> {
    if let Some(date) = entry.selected_date.as_deref().and_then(date_prefix) {
        return Some(date.to_string());
    }
    entry
        .occurred_at
        .as_deref()
        .and_then(|raw| local_day_key(raw, tz))
        .or_else(|| {
            entry
                .timestamp_created
                .as_deref()
                .and_then(|raw| local_day_key(raw, tz))
        })
}

/// Within-day time: `selected_time`, else `occurred_at` when it falls on the same local day.
/// `timestamp_created` never contributes a time.
fn entry_minutes(entry: &EntryForWeatherJoin, day: &str, tz: Tz) -> Option<i64> {
    if let Some(minutes) = entry.selected_time.as_deref().and_then(parse_time_of_day) {
        return Some(minutes);
    }
    entry
        .occurred_at
        .as_deref()
        .and_then(parse_instant)
        .and_then(|instant| minutes_on_day(day, instant, tz))
}

/// Earliest pain time (when preferred), else earliest time of any entry, else local noon.
fn resolve_target_minutes(entries: &[PlacedEntry], prefer_pain: bool) -> i64 {
    let earliest_pain = entries
        .iter()
        .filter(|p| p.entry.is_pain_entry())
        .filter_map(|p| p.minutes)
        .min();
    let earliest_any = entries.iter().filter_map(|p| p.minutes).min();

    let target = if prefer_pain {
        earliest_pain.or(earliest_any)
    } else {
        earliest_any
    };
    target.unwrap_or(LOCAL_NOON_MINUTES)
}

/// Ranking key: timed candidates first, then distance to target, then lowest id.
fn rank(minutes: Option<i64>, target: i64, id: i64) -> (bool, i64, i64) {
    match minutes {
        Some(m) => (false, (m - target).abs(), id),
        None => (true, 0, id),
    }
}

fn pick_entry_linked<'a>(
    entries: &[PlacedEntry],
    target: i64,
    logs_by_id: &HashMap<i64, &'a WeatherLogForFeature>,
) -> Option<&'a WeatherLogForFeature> {
    entries
        .iter()
        .filter_map(|p| {
            let weather_id = p.entry.weather_id?;
            let log = logs_by_id.get(&weather_id)?;
            Some((rank(p.minutes, target, weather_id), *log))
        })
        .min_by_key(|(key, _)| *key)
        .map(|(_, log)| log)
}

fn log_day_key(log: &WeatherLogForFeature, tz: Tz) -> Option<String> {
    if let Some(date) = log.snapshot_date.as_deref().and_then(date_prefix) {
        return Some(date.to_string());
    }
    log.requested_at.as_deref().and_then(|raw| local_day_key(raw, tz))
}

fn pick_snapshot<'a>(
    day: &str,
    target: i64,
    snapshots: Option<&Vec<&'a WeatherLogForFeature>>,
    tz: Tz,
) -> Option<&'a WeatherLogForFeature> {
    snapshots?
        .iter()
        .map(|log| {
            let minutes = log
                .requested_at
                .as_deref()
                .and_then(parse_instant)
                .and_then(|instant| minutes_from_day_start(day, instant, tz));
            (rank(minutes, target, log.id), *log)
        })
        .min_by_key(|(key, _)| *key)
        .map(|(_, log)| log)
}

/// Builds one weather feature row per documented day.
pub fn build_weather_day_features(input: &WeatherFeatureInput) -> Vec<WeatherDayFeature> {
    build_weather_day_features_with_counts(input).features
}

/// Like [`build_weather_day_features`], also reporting how many days fell into each coverage tier.
pub fn build_weather_day_features_with_counts(input: &WeatherFeatureInput) -> WeatherFeatureSet {
    let _span = tracing::debug_span!(
        "build_weather_day_features",
        days = input.counts_by_day.len(),
        entries = input.entries.len(),
        weather_logs = input.weather_logs.len(),
    )
    .entered();

    let tz = resolve_timezone(input.timezone.as_deref());

    let documented: BTreeSet<&str> = input
        .counts_by_day
        .iter()
        .filter(|d| d.documented)
        .map(|d| d.date_iso.as_str())
        .collect();

    let mut entries_by_day: BTreeMap<String, Vec<PlacedEntry>> = BTreeMap::new();
    let mut dropped = 0usize;
    for entry in &input.entries {
        match entry_day_key(entry, tz) {
            Some(day) if documented.contains(day.as_str()) => {
                let minutes = entry_minutes(entry, &day, tz);
                entries_by_day
                    .entry(day)
                    .or_default()
                    .push(PlacedEntry { entry, minutes });
            }
            _ => dropped += 1,
        }
    }

    let logs_by_id: HashMap<i64, &WeatherLogForFeature> =
        input.weather_logs.iter().map(|log| (log.id, log)).collect();

    let mut snapshots_by_day: HashMap<String, Vec<&WeatherLogForFeature>> = HashMap::new();
    for log in &input.weather_logs {
        if let Some(day) = log_day_key(log, tz) {
            snapshots_by_day.entry(day).or_default().push(log);
        }
    }

    let no_entries: Vec<PlacedEntry> = Vec::new();
    let mut coverage_counts = CoverageCounts::default();

    let features: Vec<WeatherDayFeature> = input
        .counts_by_day
        .iter()
        .filter(|d| d.documented)
        .map(|day| {
            let day_entries = entries_by_day.get(&day.date_iso).unwrap_or(&no_entries);
            let target = resolve_target_minutes(day_entries, input.prefer_pain_as_target);

            let (log, coverage) = match pick_entry_linked(day_entries, target, &logs_by_id) {
                Some(log) => (Some(log), WeatherCoverage::Entry),
                None => match pick_snapshot(&day.date_iso, target, snapshots_by_day.get(&day.date_iso), tz) {
                    Some(log) => (Some(log), WeatherCoverage::Snapshot),
                    None => (None, WeatherCoverage::None),
                },
            };

            match coverage {
                WeatherCoverage::Entry => coverage_counts.entry += 1,
                WeatherCoverage::Snapshot => coverage_counts.snapshot += 1,
                WeatherCoverage::None => coverage_counts.none += 1,
            }

            WeatherDayFeature {
                date: day.date_iso.clone(),
                pain_max: day.pain_max,
                had_headache: day.headache,
                had_acute_med: day.treatment,
                pressure_mb: log.and_then(|l| l.pressure_mb),
                pressure_change_24h: log.and_then(|l| l.pressure_change_24h),
                temperature_c: log.and_then(|l| l.temperature_c),
                humidity: log.and_then(|l| l.humidity),
                weather_coverage: coverage,
                weather_log_id: log.map(|l| l.id),
            }
        })
        .collect();

    tracing::debug!(
        features = features.len(),
        entry = coverage_counts.entry,
        snapshot = coverage_counts.snapshot,
        none = coverage_counts.none,
        dropped_entries = dropped,
        "Weather day features built"
    );

    WeatherFeatureSet {
        features,
        coverage_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryKind, PainLevel};
    use crate::report::DayCountRecord;

    fn day(date: &str) -> DayCountRecord {
        DayCountRecord {
            date_iso: date.into(),
            documented: true,
            headache: true,
            treatment: false,
            triptan: false,
            pain_max: Some(5.0),
            me_cfs_max: None,
        }
    }

    fn pain_entry(date: &str, time: Option<&str>) -> EntryForWeatherJoin {
        EntryForWeatherJoin {
            selected_date: Some(date.into()),
            selected_time: time.map(Into::into),
            entry_kind: Some(EntryKind::Pain),
            pain_level: Some(PainLevel::Mittel),
            ..Default::default()
        }
    }

    fn snapshot(id: i64, date: Option<&str>, requested_at: Option<&str>, pressure: f64) -> WeatherLogForFeature {
        WeatherLogForFeature {
            id,
            snapshot_date: date.map(Into::into),
            requested_at: requested_at.map(Into::into),
            pressure_mb: Some(pressure),
            pressure_change_24h: Some(-2.0),
            temperature_c: Some(4.0),
            humidity: Some(80.0),
        }
    }

    fn input(
        days: Vec<DayCountRecord>,
        entries: Vec<EntryForWeatherJoin>,
        logs: Vec<WeatherLogForFeature>,
    ) -> WeatherFeatureInput {
        WeatherFeatureInput {
            counts_by_day: days,
            entries,
            weather_logs: logs,
            timezone: Some("Europe/Berlin".into()),
            prefer_pain_as_target: true,
        }
    }

    #[test]
    fn empty_input_yields_no_features() {
        let set = build_weather_day_features_with_counts(&input(vec![], vec![], vec![]));
        assert!(set.features.is_empty());
        assert_eq!(set.coverage_counts.total(), 0);
    }

    #[test]
    fn undocumented_days_get_no_row() {
        let mut ghost = day("2026-02-02");
        ghost.documented = false;
        let features = build_weather_day_features(&input(vec![day("2026-02-01"), ghost], vec![], vec![]));
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].date, "2026-02-01");
        assert_eq!(features[0].weather_coverage, WeatherCoverage::None);
        assert_eq!(features[0].pressure_mb, None);
    }

    #[test]
    fn nearest_snapshot_to_pain_time_wins() {
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![pain_entry("2026-02-26", Some("08:00"))],
            vec![
                // 05:30 and 06:45 Berlin (UTC+1)
                snapshot(1, Some("2026-02-26"), Some("2026-02-26T04:30:00Z"), 1009.0),
                snapshot(2, Some("2026-02-26"), Some("2026-02-26T05:45:00Z"), 1015.0),
            ],
        ));
        assert_eq!(features[0].weather_coverage, WeatherCoverage::Snapshot);
        assert_eq!(features[0].pressure_mb, Some(1015.0));
        assert_eq!(features[0].weather_log_id, Some(2));
    }

    #[test]
    fn equal_distance_lowest_id_wins() {
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![pain_entry("2026-02-26", Some("08:00"))],
            vec![
                snapshot(9, Some("2026-02-26"), Some("2026-02-26T06:00:00Z"), 1001.0),
                snapshot(4, Some("2026-02-26"), Some("2026-02-26T06:00:00Z"), 1002.0),
                snapshot(7, Some("2026-02-26"), Some("2026-02-26T06:00:00Z"), 1003.0),
            ],
        ));
        assert_eq!(features[0].weather_log_id, Some(4));
    }

    #[test]
    fn timeless_snapshots_pick_lowest_id() {
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![],
            vec![
                snapshot(12, Some("2026-02-26"), None, 1001.0),
                snapshot(3, Some("2026-02-26"), None, 1002.0),
            ],
        ));
        assert_eq!(features[0].weather_log_id, Some(3));
    }

    #[test]
    fn timed_snapshot_beats_timeless_one() {
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![],
            vec![
                snapshot(1, Some("2026-02-26"), None, 1001.0),
                snapshot(2, Some("2026-02-26"), Some("2026-02-26T20:00:00Z"), 1002.0),
            ],
        ));
        assert_eq!(features[0].weather_log_id, Some(2));
    }

    #[test]
    fn snapshot_day_from_requested_at_uses_timezone() {
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![],
            vec![snapshot(5, None, Some("2026-02-25T23:30:00Z"), 1011.0)],
        ));
        assert_eq!(features[0].weather_coverage, WeatherCoverage::Snapshot);
        assert_eq!(features[0].weather_log_id, Some(5));
    }

    #[test]
    fn entry_link_beats_snapshot() {
        let mut linked = pain_entry("2026-02-26", Some("14:00"));
        linked.weather_id = Some(50);
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![pain_entry("2026-02-26", Some("08:00")), linked],
            vec![
                snapshot(2, Some("2026-02-26"), Some("2026-02-26T07:00:00Z"), 1015.0),
                snapshot(50, Some("2026-02-25"), Some("2026-02-25T12:00:00Z"), 998.0),
            ],
        ));
        assert_eq!(features[0].weather_coverage, WeatherCoverage::Entry);
        assert_eq!(features[0].pressure_mb, Some(998.0));
    }

    #[test]
    fn linked_entry_nearest_target_wins() {
        let mut early = pain_entry("2026-02-26", Some("07:30"));
        early.weather_id = Some(20);
        let mut late = pain_entry("2026-02-26", Some("18:00"));
        late.weather_id = Some(10);
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![late, early],
            vec![
                snapshot(10, None, None, 1000.0),
                snapshot(20, None, None, 1020.0),
            ],
        ));
        assert_eq!(features[0].weather_log_id, Some(20));
    }

    fn linked(kind: EntryKind, time: Option<&str>, weather_id: i64) -> EntryForWeatherJoin {
        EntryForWeatherJoin {
            selected_date: Some("2026-02-26".into()),
            selected_time: time.map(Into::into),
            entry_kind: Some(kind),
            weather_id: Some(weather_id),
            ..Default::default()
        }
    }

    #[test]
    fn equidistant_linked_entries_pick_lowest_id() {
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![
                pain_entry("2026-02-26", Some("08:00")),
                linked(EntryKind::Lifestyle, Some("07:00"), 9),
                linked(EntryKind::Medication, Some("09:00"), 3),
            ],
            vec![
                snapshot(9, None, None, 1001.0),
                snapshot(3, None, None, 1003.0),
            ],
        ));
        assert_eq!(features[0].weather_coverage, WeatherCoverage::Entry);
        assert_eq!(features[0].weather_log_id, Some(3));
        assert_eq!(features[0].pressure_mb, Some(1003.0));
    }

    #[test]
    fn untimed_linked_entries_pick_lowest_id() {
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![
                linked(EntryKind::Context, None, 8),
                linked(EntryKind::Trigger, None, 4),
            ],
            vec![
                snapshot(8, None, None, 1008.0),
                snapshot(4, None, None, 1004.0),
            ],
        ));
        assert_eq!(features[0].weather_log_id, Some(4));
    }

    #[test]
    fn unknown_entry_kind_still_joins() {
        let json = r#"{
            "countsByDay": [{"dateISO": "2026-02-26", "documented": true, "headache": true,
                "treatment": false, "triptan": false, "painMax": 7, "meCfsMax": null}],
            "entries": [{"selected_date": "2026-02-26", "selected_time": "07:00",
                "entry_kind": "voice", "pain_level": "stark", "weather_id": 5}],
            "weatherLogs": [{"id": 5, "snapshot_date": "2026-02-26", "pressure_mb": 1011}],
            "timezone": "Europe/Berlin"
        }"#;
        let parsed: WeatherFeatureInput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.entries[0].entry_kind, None);
        assert!(parsed.entries[0].is_pain_entry());

        let features = build_weather_day_features(&parsed);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].weather_coverage, WeatherCoverage::Entry);
        assert_eq!(features[0].pressure_mb, Some(1011.0));
    }

    #[test]
    fn unresolvable_weather_id_falls_back_to_snapshot() {
        let mut linked = pain_entry("2026-02-26", Some("09:00"));
        linked.weather_id = Some(999);
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![linked],
            vec![snapshot(2, Some("2026-02-26"), None, 1015.0)],
        ));
        assert_eq!(features[0].weather_coverage, WeatherCoverage::Snapshot);
    }

    #[test]
    fn occurred_at_resolves_day_across_midnight() {
        let entry = EntryForWeatherJoin {
            occurred_at: Some("2026-02-25T23:30:00Z".into()),
            entry_kind: Some(EntryKind::Pain),
            weather_id: Some(8),
            ..Default::default()
        };
        let set = build_weather_day_features_with_counts(&input(
            vec![day("2026-02-25"), day("2026-02-26")],
            vec![entry],
            vec![snapshot(8, None, None, 1003.0)],
        ));
        assert_eq!(set.features[0].weather_coverage, WeatherCoverage::None);
        assert_eq!(set.features[1].weather_coverage, WeatherCoverage::Entry);
        assert_eq!(set.coverage_counts, CoverageCounts { entry: 1, snapshot: 0, none: 1 });
    }

    #[test]
    fn entries_outside_known_days_are_dropped() {
        let mut stray = pain_entry("2026-03-10", Some("08:00"));
        stray.weather_id = Some(1);
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![stray],
            vec![snapshot(1, Some("2026-03-10"), None, 1000.0)],
        ));
        assert_eq!(features[0].weather_coverage, WeatherCoverage::None);
    }

    #[test]
    fn target_prefers_pain_over_earlier_other_entry() {
        let lifestyle = EntryForWeatherJoin {
            selected_date: Some("2026-02-26".into()),
            selected_time: Some("05:00".into()),
            entry_kind: Some(EntryKind::Lifestyle),
            ..Default::default()
        };
        let logs = vec![
            snapshot(1, Some("2026-02-26"), Some("2026-02-26T04:00:00Z"), 1001.0), // 05:00
            snapshot(2, Some("2026-02-26"), Some("2026-02-26T14:00:00Z"), 1002.0), // 15:00
        ];
        let entries = vec![lifestyle, pain_entry("2026-02-26", Some("16:00"))];

        let preferred = build_weather_day_features(&input(vec![day("2026-02-26")], entries.clone(), logs.clone()));
        assert_eq!(preferred[0].weather_log_id, Some(2));

        let mut plain = input(vec![day("2026-02-26")], entries, logs);
        plain.prefer_pain_as_target = false;
        let any = build_weather_day_features(&plain);
        assert_eq!(any[0].weather_log_id, Some(1));
    }

    #[test]
    fn untimed_day_targets_noon() {
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![pain_entry("2026-02-26", Some("not a time"))],
            vec![
                snapshot(1, Some("2026-02-26"), Some("2026-02-26T06:00:00Z"), 1001.0), // 07:00
                snapshot(2, Some("2026-02-26"), Some("2026-02-26T12:00:00Z"), 1002.0), // 13:00
            ],
        ));
        assert_eq!(features[0].weather_log_id, Some(2));
    }

    #[test]
    fn timestamp_created_assigns_day_but_no_time() {
        let entry = EntryForWeatherJoin {
            timestamp_created: Some("2026-02-26T06:00:00Z".into()),
            entry_kind: Some(EntryKind::Pain),
            ..Default::default()
        };
        let features = build_weather_day_features(&input(
            vec![day("2026-02-26")],
            vec![entry],
            vec![
                snapshot(1, Some("2026-02-26"), Some("2026-02-26T06:00:00Z"), 1001.0), // 07:00
                snapshot(2, Some("2026-02-26"), Some("2026-02-26T10:30:00Z"), 1002.0), // 11:30
            ],
        ));
        // No time from timestamp_created, so the target is noon.
        assert_eq!(features[0].weather_log_id, Some(2));
    }

    #[test]
    fn feature_wire_keys() {
        let features = build_weather_day_features(&input(vec![day("2026-02-26")], vec![], vec![]));
        let json = serde_json::to_value(&features[0]).unwrap();
        assert_eq!(json["weatherCoverage"], "none");
        assert!(json.get("pressureChange24h").is_some());
        assert_eq!(json["hadHeadache"], true);
    }
}
