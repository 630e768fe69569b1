//! Self-contained stand-ins for the game host
//!
//! Used by the skirmish runner and the integration tests.

pub mod estimator;
pub mod scenario;
pub mod world;

pub use estimator::ValueRatioEstimator;
pub use scenario::{Skirmish, SkirmishSettings, SkirmishTally};
pub use world::SandboxWorld;
