#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod image;
pub mod orchestrator;
pub mod pipeline;
pub mod source;
pub mod types;

// Stage modules – public for tools and tests, considered internals.
pub mod angle;
pub mod background;
pub mod camera;
pub mod contour;
pub mod edges;
pub mod error;
pub mod geometry;
pub mod model;
pub mod preview;
pub mod rays;
pub mod synthetic;
pub mod texture;

// --- High-level re-exports -------------------------------------------------

// Entry points: threaded reconstruction and the synchronous driver.
pub use crate::orchestrator::{Command, ModelGuard, ModelOutput, OrchestratorError, Reconstructor};
pub use crate::pipeline::{CameraPipeline, SyncDriver};

// Configuration and camera setup.
pub use crate::camera::CameraPose;
pub use crate::config::{CameraConfig, HullConfig};

// Output types.
pub use crate::types::{ModelFrame, ModelQuad};

// Frame sources.
pub use crate::source::{FrameSource, SourceError};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use visual_hull::prelude::*;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(std::path::Path::new("hull.json"))?;
/// let sources: Vec<SyntheticSource> = Vec::new();
/// let hull = Reconstructor::start(config, sources)?;
/// let output = hull.output();
/// if output.wait_for_new_model(Duration::from_secs(1)) {
///     let model = output.acquire()?;
///     println!("{} quads", model.len());
/// }
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::config::load_config;
    pub use crate::source::SyntheticSource;
    pub use crate::{Command, FrameSource, HullConfig, ModelFrame, Reconstructor};
}
