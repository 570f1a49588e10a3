#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Command line tool for life-space mobility metrics and street-network
//! isochrones.
//!
//! `lifespace` reads a `timestamp,lon,lat` trace CSV and prints the
//! per-day metric table (or one JSON document). `isochrone` reads a
//! GeoJSON street-segment network, builds reachability polygons around
//! a center, and writes them back out as GeoJSON.

mod network_io;
mod trace;

use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use geojson::{Feature, FeatureCollection, GeoJson};
use mobility_map_isochrone::{IsochroneRequest, build_isochrones};
use mobility_map_lifespace as lifespace;

#[derive(Parser)]
#[command(
    name = "mobility-map",
    about = "Life-space mobility metrics and street-network isochrones"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute per-day life-space metrics from a trace CSV
    Lifespace(LifespaceArgs),
    /// Build isochrone polygons around a center on a road network
    Isochrone(IsochroneArgs),
}

#[derive(Args)]
struct LifespaceArgs {
    /// CSV file with `timestamp,lon,lat` rows (RFC 3339 timestamps)
    #[arg(long)]
    trace: PathBuf,

    /// Emit one JSON document instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct IsochroneArgs {
    /// GeoJSON FeatureCollection of street segments
    #[arg(long)]
    network: PathBuf,

    /// Center longitude
    #[arg(long)]
    lon: f64,

    /// Center latitude
    #[arg(long)]
    lat: f64,

    /// Time budgets in minutes, comma separated
    #[arg(long, value_delimiter = ',')]
    budgets: Vec<f64>,

    /// Travel speed in km/h
    #[arg(long, default_value_t = 4.5)]
    speed: f64,

    /// Node buffer radius in metres
    #[arg(long, default_value_t = 50.0)]
    node_buffer: f64,

    /// Edge buffer radius in metres
    #[arg(long, default_value_t = 25.0)]
    edge_buffer: f64,

    /// Remove interior holes so polygons read as solid
    #[arg(long)]
    infill: bool,

    /// Output path; stdout when omitted
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Lifespace(args) => run_lifespace(&args),
        Commands::Isochrone(args) => run_isochrone(&args),
    }
}

fn run_lifespace(args: &LifespaceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let records = trace::read_trace(&args.trace)?;
    log::info!("loaded {} trace samples", records.len());

    let hulls = lifespace::daily_hulls(&records);
    if hulls.is_empty() {
        return Err("no usable days in trace".into());
    }

    let revisit = lifespace::revisit_overlap(&hulls)?;
    let coverage = lifespace::overlap_with_overall(&hulls)?;
    let compact = lifespace::compactness_series(&hulls)?;
    let daily_km2 = lifespace::daily_area_km2(&hulls)?;
    let aggregate_km2 = lifespace::aggregate_area_km2(&hulls)?;
    let aggregate_compactness = lifespace::aggregate_compactness(&hulls)?;

    if args.json {
        let days: Vec<serde_json::Value> = hulls
            .dates()
            .iter()
            .map(|date| {
                serde_json::json!({
                    "date": date.to_string(),
                    "revisitOverlapPct": revisit.get(date),
                    "overallOverlapPct": coverage.get(date),
                    "compactness": compact.get(date),
                    "areaKm2": daily_km2.get(date),
                })
            })
            .collect();
        let dropped: Vec<serde_json::Value> = hulls
            .dropped()
            .iter()
            .map(|day| {
                serde_json::json!({
                    "date": day.date.to_string(),
                    "reason": day.reason.to_string(),
                })
            })
            .collect();
        let document = serde_json::json!({
            "days": days,
            "aggregate": {
                "areaKm2": aggregate_km2,
                "compactness": aggregate_compactness,
            },
            "droppedDays": dropped,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        println!(
            "{:<12} {:>10} {:>10} {:>12} {:>10}",
            "date", "revisit %", "overall %", "compactness", "km2"
        );
        for date in hulls.dates() {
            println!(
                "{:<12} {:>10.2} {:>10.2} {:>12.3} {:>10.4}",
                date.to_string(),
                revisit.get(&date).copied().unwrap_or_default(),
                coverage.get(&date).copied().unwrap_or_default(),
                compact.get(&date).copied().unwrap_or_default(),
                daily_km2.get(&date).copied().unwrap_or_default(),
            );
        }
        println!();
        println!(
            "aggregate life-space: {aggregate_km2:.4} km2, compactness {aggregate_compactness:.3}"
        );
        if !hulls.dropped().is_empty() {
            println!("dropped {} degenerate day(s); see log for details", hulls.dropped().len());
        }
    }
    Ok(())
}

fn run_isochrone(args: &IsochroneArgs) -> Result<(), Box<dyn std::error::Error>> {
    let network = network_io::read_network(&args.network)?;

    let mut request = IsochroneRequest::new(args.lon, args.lat, args.budgets.clone(), args.speed);
    request.node_buffer_m = args.node_buffer;
    request.edge_buffer_m = args.edge_buffer;
    request.infill = args.infill;

    let isochrones = build_isochrones(&network, &request)?;

    let features: Vec<Feature> = isochrones
        .iter()
        .map(|isochrone| {
            let polygons = isochrone.region.polygons();
            let mut properties = geojson::JsonObject::new();
            properties.insert(
                "budgetMinutes".to_string(),
                isochrone.budget_minutes.into(),
            );
            properties.insert("epsg".to_string(), isochrone.region.crs().epsg().into());
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&polygons))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    let document = GeoJson::from(collection).to_string();

    match &args.out {
        Some(path) => {
            fs::write(path, document)?;
            log::info!(
                "wrote {} isochrone(s) to {}",
                isochrones.len(),
                path.display()
            );
        }
        None => println!("{document}"),
    }
    Ok(())
}
