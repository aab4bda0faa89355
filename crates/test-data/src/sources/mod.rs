//! Route sources for fixtures.
//!
//! - [`ProceduralGenerator`]: synthetic paced routes inside a bounding box
//! - [`GpxWriter`]: exports routes as timed GPX tracks

mod gpx_files;
mod procedural;

pub use gpx_files::{ExportError, GpxWriter};
pub use procedural::{ProceduralGenerator, split_legs};
