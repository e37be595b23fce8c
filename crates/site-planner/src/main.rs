//! Offline Site Planning CLI
//!
//! Ranks candidate sites for new infrastructure inside a viewport using
//! climate estimators instead of live services.
//!
//! Usage:
//!   plan-sites --north 40.92 --south 40.49 --east -73.70 --west -74.26 \
//!              --type cooling_center --hazard heatwave --hazard flood \
//!              --pois demos/nyc-shelters.json --output plan.json --geojson

use anyhow::Result;
use clap::Parser;
use data_sources::EstimatedMetricSource;
use site_planner::loader::{self, StaticInfrastructure};
use site_planner::planner::to_geojson;
use site_planner::{
    PlanningConstraints, PlanningRequest, SitePlanner, DEFAULT_MAX_DISTANCE_KM,
    DEFAULT_MAX_SUGGESTIONS,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "plan-sites",
    about = "Suggest hazard-aware infrastructure sites inside a viewport"
)]
struct Args {
    #[arg(long, allow_hyphen_values = true)]
    north: f64,

    #[arg(long, allow_hyphen_values = true)]
    south: f64,

    #[arg(long, allow_hyphen_values = true)]
    east: f64,

    #[arg(long, allow_hyphen_values = true)]
    west: f64,

    /// Infrastructure type (shelter, hospital, cooling_center, ...)
    #[arg(short = 't', long = "type", default_value = "shelter")]
    infrastructure_type: String,

    /// Hazard to plan for, repeatable
    #[arg(long = "hazard")]
    hazards: Vec<String>,

    /// Maximum number of suggestions (1-10)
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_SUGGESTIONS)]
    max_suggestions: usize,

    /// Target coverage distance in km
    #[arg(long, default_value_t = DEFAULT_MAX_DISTANCE_KM)]
    max_distance_km: f64,

    /// JSON file with existing facilities
    #[arg(short, long)]
    pois: Option<PathBuf>,

    /// Month (1-12) used for seasonal estimates, defaults to the current month
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    /// Output JSON file
    #[arg(short, long, default_value = "planning.json")]
    output: PathBuf,

    /// Also output GeoJSON
    #[arg(long)]
    geojson: bool,

    /// Include the ranked candidate preview
    #[arg(long)]
    debug: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("Infrastructure Site Planner (offline)");
    info!("{}", "=".repeat(60));

    let infrastructure = match &args.pois {
        Some(path) => StaticInfrastructure::new(loader::load_pois(path)?),
        None => StaticInfrastructure::default(),
    };
    info!("{} existing facilities loaded", infrastructure.len());

    let metrics = match args.month {
        Some(month) => EstimatedMetricSource::for_month(month - 1),
        None => EstimatedMetricSource::current(),
    };

    let planner = SitePlanner::new(Arc::new(metrics), Arc::new(infrastructure));

    let request = PlanningRequest {
        viewport: Some(suitability_core::Viewport {
            north: args.north,
            south: args.south,
            east: args.east,
            west: args.west,
        }),
        infrastructure_type: Some(args.infrastructure_type),
        hazards: Some(args.hazards),
        max_suggestions: Some(args.max_suggestions as f64),
        constraints: Some(PlanningConstraints {
            max_distance_km: Some(args.max_distance_km),
            ..PlanningConstraints::default()
        }),
        include_debug: args.debug,
    };

    let response = planner.suggest_infrastructure_sites(request).await?;

    info!("Writing output to {:?}", args.output);
    let file = File::create(&args.output)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &response)?;

    if args.geojson {
        let geojson_path = args.output.with_extension("geojson");
        info!("Writing GeoJSON to {:?}", geojson_path);
        let file = File::create(&geojson_path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &to_geojson(&response))?;
    }

    info!("{}", "=".repeat(60));
    info!("{}", response.summary);
    for s in &response.suggestions {
        info!(
            "  {:6} | {:>9.4}, {:>9.4} | {}",
            format!("{:?}", s.priority).to_lowercase(),
            s.lat,
            s.lng,
            s.reason
        );
    }

    Ok(())
}
