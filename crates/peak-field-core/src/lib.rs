pub mod config;
pub mod constants;
pub mod motion;
pub mod peak;
pub mod resource;
pub mod rng;
pub mod world;

pub use config::{FieldConfig, HaloConfig, PeakConfig, PeakConfigError, PeakLayerConfig};
pub use peak::{PeakController, TickOutcome};
pub use resource::{GridGeometry, ResourceGrid};
pub use world::{PeakField, RunSummary, StepMetrics};
