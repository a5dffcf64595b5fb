//! Weather correlation: per-day weather features and the pressure association analysis.
//!
//! `build_weather_day_features` joins documented days with diary entries and
//! stored weather logs, picking for each day the reading nearest the day's
//! target time (entry-linked first, same-day snapshot second). Ties always go
//! to the lowest weather log id. `compute_weather_association` then buckets
//! those days by 24h pressure change and grades the result by sample size.

mod association;
mod features;
pub mod time;
mod types;

pub use association::*;
pub use features::*;
pub use types::*;
