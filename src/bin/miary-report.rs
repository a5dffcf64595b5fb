use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use miary_report::config;
use miary_report::weather::{
    build_weather_day_features_with_counts, compute_weather_association, AssociationOptions,
    WeatherAnalysisV2, WeatherFeatureInput, WeatherFeatureSet,
};
use miary_report::{compute_miary_report, ComputeReportInput};

/// Miary report engine - headache diary reports and weather association
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Emit compact JSON instead of pretty-printed output
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute a MiaryReportV2 from a report input document
    Report {
        /// Input JSON file (reads stdin when omitted or "-")
        input: Option<PathBuf>,
    },
    /// Build weather day features and the pressure association analysis
    Weather {
        /// Input JSON file (reads stdin when omitted or "-")
        input: Option<PathBuf>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeatherOutput {
    #[serde(flatten)]
    feature_set: WeatherFeatureSet,
    analysis: WeatherAnalysisV2,
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read input file {}", p.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read input from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{out}");
    Ok(())
}

fn main() -> Result<()> {
    miary_report::init_tracing();

    let args = Args::parse();
    info!("{} v{}", config::ENGINE_NAME, config::ENGINE_VERSION);

    match &args.command {
        Command::Report { input } => {
            let raw = read_input(input.as_ref())?;
            let input: ComputeReportInput =
                serde_json::from_str(&raw).context("Invalid report input JSON")?;
            let report = compute_miary_report(&input);
            info!(
                documented_days = report.meta.basis.documented_days,
                headache_days = report.kpis.headache_days,
                "Report generated"
            );
            print_json(&report, args.compact)
        }
        Command::Weather { input } => {
            let raw = read_input(input.as_ref())?;
            let input: WeatherFeatureInput =
                serde_json::from_str(&raw).context("Invalid weather input JSON")?;
            let feature_set = build_weather_day_features_with_counts(&input);
            let analysis = compute_weather_association(
                &feature_set.features,
                &AssociationOptions {
                    coverage_counts: Some(feature_set.coverage_counts),
                },
            );
            info!(
                paired_days = analysis.paired_days,
                confidence = %analysis.confidence,
                "Weather analysis generated"
            );
            print_json(&WeatherOutput { feature_set, analysis }, args.compact)
        }
    }
}
