//! Army Tactics - combat decisions for a real-time strategy agent
//!
//! Each tick the engine reads a world snapshot, decides whether to attack,
//! defend or hold, and emits unit commands.

pub mod core;
pub mod sandbox;
pub mod spatial;
pub mod tactics;
pub mod units;
