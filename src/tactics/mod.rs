//! Tactical decision pipeline
//!
//! Threats, stance, targets, defenders and per-unit micro. `TacticsEngine`
//! runs them in order once per tick.

pub mod anchor;
pub mod commands;
pub mod defense;
pub mod engine;
pub mod formation;
pub mod hysteresis;
pub mod intel;
pub mod micro;
pub mod nova;
pub mod outcome;
pub mod services;
pub mod snapshot;
pub mod stance;
pub mod state;
pub mod targeting;
pub mod threat;

pub use commands::{Ability, CommandKind, UnitCommand};
pub use defense::{BaseThreat, DefenseCoordinator};
pub use engine::{TacticsEngine, TickOutput};
pub use hysteresis::{Engagement, EngagementTracker, SquadKey};
pub use intel::IntelQuality;
pub use outcome::FightOutcome;
pub use services::{EstimateOptions, FightEstimator, PathingGrid, QueryFilter, Services, SpatialQuery, Squad, WorldQuery};
pub use snapshot::{MapInfo, Snapshot};
pub use stance::{Stance, StanceDecision};
pub use state::{EngineState, SharedFlags};
pub use targeting::{TargetRule, TargetSelector};
pub use threat::{ResponseType, ThreatRecord};
