// src/main.rs
//! Probe: fetch the features of one bounding box and optionally resolve a point.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use feature_overlay::{
    config::load_config, utils::setup_logging, BoundingBox, FeatureCache, HitResolver, Point,
    WikimapiaClient,
};
use log::{info, warn};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "feature-overlay", about = "Query map features for a bounding box")]
struct Args {
    /// Bounding box as west,south,east,north
    #[arg(long)]
    bbox: String,

    /// Point to resolve, as lat,lng
    #[arg(long)]
    point: Option<String>,
}

fn parse_numbers<const N: usize>(text: &str, what: &str) -> Result<[f64; N]> {
    let values: Vec<f64> = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("{} must be {} comma-separated numbers", what, N))?;
    values
        .try_into()
        .map_err(|v: Vec<f64>| anyhow!("{} needs {} numbers, got {}", what, N, v.len()))
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging().context("Failed to initialize logging")?;
    let args = Args::parse();
    let config = load_config()?;

    let [west, south, east, north] = parse_numbers::<4>(&args.bbox, "--bbox")?;
    let viewport = BoundingBox::new(south, west, north, east)?;

    let client = Arc::new(WikimapiaClient::new(&config)?);
    let cache = FeatureCache::new(client, &config, tokio::runtime::Handle::current());
    let applied = cache.refresh(viewport).await?;
    info!("Fetched {} features for {}", applied, viewport);

    for feature in cache.get().values() {
        println!("{:>10}  {}  {}", feature.id, feature.name, feature.url);
    }

    if let Some(point) = args.point {
        let [lat, lng] = parse_numbers::<2>(&point, "--point")?;
        let point = Point::new(lat, lng);
        let resolver = HitResolver::from_config(&config);
        match resolver.resolve(&point, cache.get().values(), &viewport) {
            Some(feature) => println!("{} -> {} ({})", point, feature.name, feature.id),
            None => warn!("No feature at {}", point),
        }
    }

    Ok(())
}
