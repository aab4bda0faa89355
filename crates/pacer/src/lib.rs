//! Real-time race simulation and telemetry engine.
//!
//! A simulated runner is animated along a pre-computed route while a
//! stochastic pace process and a dependent heart-rate model produce live
//! telemetry. Derived metrics are published as immutable snapshots and sent
//! to an external coaching service on a fixed cadence or on demand.
//!
//! ```rust,ignore
//! use pacer::prelude::*;
//!
//! let route = RouteBuilder::new()
//!     .leg(warmup, 6.0)
//!     .leg(tempo, 4.5)
//!     .build()?;
//! let coach = Arc::new(HttpCoach::new(&CoachConfig::default())?);
//! let noise = Box::new(BoxMuller::new(StdRng::seed_from_u64(7)));
//!
//! let race = Race::start(route, SimulationConfig::default(), coach, noise)?;
//! let advice = race.ask().await?;
//! race.reset().await;
//! ```

pub mod clock;
pub mod coach;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod gpx_route;
pub mod history;
pub mod metrics;
pub mod models;
pub mod race;
pub mod route;
pub mod sampler;
pub mod simulation;
pub mod splits;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::clock::{ClockReading, SimulationClock};
    pub use crate::coach::{Channel, CoachingService, HttpCoach};
    pub use crate::config::{CoachConfig, HeartRateParams, SamplerParams, SimulationConfig};
    pub use crate::dispatcher::TelemetryDispatcher;
    pub use crate::errors::{AskError, CoachError, ConfigError, RouteError};
    pub use crate::gpx_route::PaceSource;
    pub use crate::history::{BoundedSeries, SampleHistory};
    pub use crate::models::{
        Advice, AdviceState, MetricsSnapshot, RaceSummary, Sample, TelemetryTick, Waypoint,
    };
    pub use crate::race::{Race, RaceHandle, RaceStatus, RaceView, SnapshotSource};
    pub use crate::route::{MicroSegment, PacedLeg, Route, RouteBuilder};
    pub use crate::sampler::{BoxMuller, NoiseSource, SequenceNoise, StochasticSampler};
    pub use crate::simulation::{Simulation, SimulationState};
    pub use crate::splits::{KmSplitSummary, KmSplits};
}
