//! Unit snapshots, static kind data and role bookkeeping

pub mod kind;
pub mod roles;
pub mod unit;

pub use kind::{KindProfile, UnitKind};
pub use roles::{apply_role_changes, RoleBook, RoleRegistry, StagedRoles, UnitRole};
pub use unit::{Alliance, CombatRole, Unit, UnitId};
