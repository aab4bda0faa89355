//! Route fixtures for pacer.
//!
//! Generates paced routes for manual runs and integration tests, and writes
//! them out as GPX files the `pacer` binary can replay.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let profile = RunnerProfile::with_pace(5.0).plan(PacePlan::negative_split());
//! let route = ProceduralGenerator::for_region(Region::PARIS)
//!     .with_distance(10_000.0)
//!     .generate(&profile, &mut rng)?;
//!
//! GpxWriter::new(OffsetDateTime::now_utc())
//!     .name("Negative split 10k")
//!     .write_file(&route, "route.gpx")?;
//! ```

pub mod config;
pub mod profiles;
pub mod sources;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{BoundingBox, Region, RouteConfig};
    pub use crate::profiles::{PacePlan, RunnerProfile, round_pace, sample_variance};
    pub use crate::sources::{ExportError, GpxWriter, ProceduralGenerator};
}
