//! Unit commands produced by the engine
//!
//! The engine only states intent. Pathing and execution belong to the host.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::units::UnitId;

/// Abilities the engine casts itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    /// Disruptor splash shot
    PurificationNova,
}

/// What a unit should do
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CommandKind {
    Move(Vec2),
    /// Move, fighting anything met on the way
    AttackMove(Vec2),
    Attack(UnitId),
    Hold,
    Cast { ability: Ability, target: Vec2 },
}

/// One command for one unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCommand {
    pub unit: UnitId,
    pub kind: CommandKind,
}

impl UnitCommand {
    pub fn new(unit: UnitId, kind: CommandKind) -> Self {
        Self { unit, kind }
    }

    pub fn move_to(unit: UnitId, point: Vec2) -> Self {
        Self::new(unit, CommandKind::Move(point))
    }

    pub fn attack_move(unit: UnitId, point: Vec2) -> Self {
        Self::new(unit, CommandKind::AttackMove(point))
    }

    pub fn attack(unit: UnitId, target: UnitId) -> Self {
        Self::new(unit, CommandKind::Attack(target))
    }

    pub fn hold(unit: UnitId) -> Self {
        Self::new(unit, CommandKind::Hold)
    }

    /// Destination point, if the command has one
    pub fn destination(&self) -> Option<Vec2> {
        match self.kind {
            CommandKind::Move(p) | CommandKind::AttackMove(p) => Some(p),
            CommandKind::Cast { target, .. } => Some(target),
            CommandKind::Attack(_) | CommandKind::Hold => None,
        }
    }
}
