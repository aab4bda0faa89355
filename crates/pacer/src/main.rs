use std::env;
use std::sync::Arc;

use anyhow::Context;
use pacer::coach::HttpCoach;
use pacer::config::{CoachConfig, SimulationConfig};
use pacer::gpx_route::{self, PaceSource};
use pacer::models::AdviceState;
use pacer::race::{Race, RaceStatus};
use pacer::sampler::BoxMuller;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let route_path = env::var("ROUTE_GPX").context("ROUTE_GPX must point to a GPX file")?;
    let pace = match env::var("ROUTE_PACE").ok().and_then(|p| p.parse::<f64>().ok()) {
        Some(p) => PaceSource::Constant(p),
        None => PaceSource::recorded(),
    };
    let route = gpx_route::load_file(&route_path, pace)
        .with_context(|| format!("Failed to load route from {route_path}"))?;

    let config = match env::var("PACER_CONFIG") {
        Ok(path) => SimulationConfig::from_json_file(&path)
            .with_context(|| format!("Failed to read config {path}"))?,
        Err(_) => SimulationConfig::default(),
    };

    let coach_config = CoachConfig {
        base_url: env::var("COACH_URL").unwrap_or_else(|_| CoachConfig::default().base_url),
        ..Default::default()
    };
    tracing::info!("Coaching service at {}", coach_config.base_url);
    let coach = Arc::new(HttpCoach::new(&coach_config)?);

    let rng = match env::var("RACE_SEED").ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let race = Race::start(route, config, coach, Box::new(BoxMuller::new(rng)))?;
    let mut views = race.subscribe();
    let mut advice = race.subscribe_advice();
    let mut last_sample = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                let t = view.history.pace.latest_sample().map(|s| s.t);
                if t != last_sample {
                    last_sample = t;
                    let s = &view.snapshot;
                    tracing::info!(
                        "{:.2}/{:.2} km | pace {:.2} (obj {:.2}, gap {:+.2}) | hr {} (avg {:.0}) | next change in {:.2} km, eta gap {:+.2} min | cv {:.3}",
                        s.done_km,
                        s.done_km + s.remain_km,
                        s.pace_now,
                        s.pace_obj,
                        s.pace_gap,
                        s.heart_rate,
                        s.hr_avg,
                        s.next_change_km,
                        s.eta_gap_min,
                        s.pace_cv
                    );
                }
                if view.status != RaceStatus::Running {
                    break;
                }
            }
            changed = advice.changed() => {
                if changed.is_ok()
                    && let AdviceState::Showing(text) = &*advice.borrow_and_update()
                {
                    tracing::info!("Coach: {text}");
                }
            }
        }
    }

    for split in race.splits().iter() {
        tracing::info!(
            "km {}: avg pace {:.2}, cv {:.3}, avg hr {}",
            split.km,
            split.avg_pace,
            split.cv_pace,
            split.avg_hr.map_or("-".to_string(), |hr| format!("{hr:.0}"))
        );
    }

    // Bounded by the coach client's timeout
    if let Some(notification) = race.reset().await
        && let Err(e) = notification.await
    {
        tracing::warn!("End-of-race notification task failed: {e}");
    }

    Ok(())
}
