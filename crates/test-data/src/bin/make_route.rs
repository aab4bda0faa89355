//! Writes a procedural paced route as a timed GPX file.
//!
//! Run with:
//! ```
//! ROUTE_PLAN=negative ROUTE_KM=10 cargo run -p test-data --bin make-route
//! ```

use std::env;

use anyhow::{Context, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use test_data::prelude::*;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let out = env::var("ROUTE_OUT").unwrap_or_else(|_| "route.gpx".to_string());
    let km: f64 = env::var("ROUTE_KM")
        .unwrap_or_else(|_| "5".to_string())
        .parse()
        .context("ROUTE_KM must be a number")?;
    let pace: f64 = env::var("ROUTE_BASE_PACE")
        .unwrap_or_else(|_| "5.0".to_string())
        .parse()
        .context("ROUTE_BASE_PACE must be a number")?;

    let region_name = env::var("ROUTE_REGION").unwrap_or_else(|_| "paris".to_string());
    let Some(region) = Region::by_name(&region_name) else {
        bail!("Unknown region {region_name}");
    };
    let plan_name = env::var("ROUTE_PLAN").unwrap_or_else(|_| "steady".to_string());
    let Some(plan) = PacePlan::by_name(&plan_name) else {
        bail!("Unknown pace plan {plan_name}");
    };

    let seed = env::var("RACE_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(12345); // Reproducible by default
    let mut rng = StdRng::seed_from_u64(seed);

    let profile = RunnerProfile::with_pace(pace).plan(plan);
    let route = ProceduralGenerator::for_region(region)
        .with_distance(km * 1000.0)
        .generate(&profile, &mut rng)?;

    GpxWriter::new(OffsetDateTime::now_utc())
        .name(format!("{plan_name} {km} km"))
        .write_file(&route, &out)
        .with_context(|| format!("Failed to write {out}"))?;

    tracing::info!("Route written to {out}");
    tracing::info!("  Distance: {:.2} km", route.total_distance_m() / 1000.0);
    tracing::info!("  Micro-segments: {}", route.segment_count());
    tracing::info!("  Planned time: {:.1} min", route.total_duration_ms() as f64 / 60_000.0);
    tracing::info!("  Mean pace: {:.2} min/km", route.mean_pace());

    Ok(())
}
