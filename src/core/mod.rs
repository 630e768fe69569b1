pub mod config;
pub mod error;
pub mod types;

pub use config::{load_profile, TacticsConfig};
pub use error::{Result, TacticsError};
