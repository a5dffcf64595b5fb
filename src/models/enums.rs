use crate::error::ReportError;
use serde::{Deserialize, Deserializer, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same literal, so the wire format and `as_str` never drift.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ReportError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ReportError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(
    /// ME/CFS post-exertional severity recorded on an entry.
    MeCfsSeverity {
        None => "none",
        Mild => "mild",
        Moderate => "moderate",
        Severe => "severe",
    }
);

str_enum!(
    /// Medication-overuse headache risk heuristic.
    MohRiskFlag {
        None => "none",
        Possible => "possible",
        Likely => "likely",
    }
);

str_enum!(
    /// Where a day's weather reading came from.
    WeatherCoverage {
        Entry => "entry",
        Snapshot => "snapshot",
        None => "none",
    }
);

str_enum!(
    /// Confidence of a weather association, by number of paired days.
    ConfidenceTier {
        Insufficient => "insufficient",
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

str_enum!(
    /// 24h pressure change bands.
    PressureDeltaBucket {
        StrongDrop => "strong_drop",
        ModerateDrop => "moderate_drop",
        StableOrRise => "stable_or_rise",
    }
);

str_enum!(
    /// Absolute pressure bands.
    PressureLevelBucket {
        Low => "low",
        Normal => "normal",
        High => "high",
    }
);

str_enum!(
    /// Diary entry classification as stored by the app.
    EntryKind {
        Pain => "pain",
        Lifestyle => "lifestyle",
        Medication => "medication",
        Trigger => "trigger",
        Context => "context",
    }
);

str_enum!(
    /// Verbal pain scale used by the diary UI.
    PainLevel {
        Keine => "keine",
        Leicht => "leicht",
        Mittel => "mittel",
        Stark => "stark",
        SehrStark => "sehr_stark",
    }
);

str_enum!(HeadacheDonutKey {
    Headache => "headache",
    NoHeadache => "no_headache",
    Undocumented => "undocumented",
});

str_enum!(MeCfsDonutKey {
    None => "none",
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
    Undocumented => "undocumented",
});

str_enum!(LegacyPieKey {
    Triptan => "triptan",
    PainNoTriptan => "painNoTriptan",
    PainFree => "painFree",
});

impl PainLevel {
    /// Numeric 0-10 value the report aggregates over.
    pub fn numeric(&self) -> f64 {
        match self {
            Self::Keine => 0.0,
            Self::Leicht => 2.0,
            Self::Mittel => 5.0,
            Self::Stark => 7.0,
            Self::SehrStark => 9.0,
        }
    }
}

impl From<MeCfsSeverity> for MeCfsDonutKey {
    fn from(severity: MeCfsSeverity) -> Self {
        match severity {
            MeCfsSeverity::None => Self::None,
            MeCfsSeverity::Mild => Self::Mild,
            MeCfsSeverity::Moderate => Self::Moderate,
            MeCfsSeverity::Severe => Self::Severe,
        }
    }
}

/// Field deserializer for stored enum columns: an unrecognised literal reads as `None`
/// instead of failing the whole document.
pub fn lenient_enum<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr<Err = ReportError>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("{e}, treating as absent");
            None
        }
    }))
}
