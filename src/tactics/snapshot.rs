//! Per-tick game state handed to the engine
//!
//! The snapshot owns the units for one tick. Lookups by id return `None`
//! for units that died or left memory, and callers skip those.

use ahash::AHashMap;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::types::{GamePhase, GameSeconds, Race, Tick};
use crate::units::{Alliance, Unit, UnitId};

/// Static map knowledge, fixed for the whole game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapInfo {
    pub start_location: Vec2,
    pub enemy_start: Vec2,
    pub own_natural: Vec2,
    pub enemy_natural: Vec2,
    /// Top of the main base ramp
    pub main_ramp_top: Option<Vec2>,
    /// Wall-off position held by a gatekeeper unit, if the build uses one
    pub gatekeeper_position: Option<Vec2>,
    pub expansion_locations: Vec<Vec2>,
    pub enemy_race: Race,
}

/// Everything observed on one tick
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tick: Tick,
    pub time: GameSeconds,
    pub supply_used: f32,
    /// Production layer is defending an early rush
    pub cheese_defense: bool,
    pub phase: GamePhase,
    pub mineral_fields: Vec<Vec2>,
    units: Vec<Unit>,
    index: AHashMap<UnitId, usize>,
}

impl Snapshot {
    pub fn new(tick: Tick, time: GameSeconds) -> Self {
        Self {
            tick,
            time,
            supply_used: 0.0,
            cheese_defense: false,
            phase: GamePhase::from_time(time),
            mineral_fields: Vec::new(),
            units: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Add or replace a unit
    pub fn insert(&mut self, unit: Unit) {
        match self.index.get(&unit.id) {
            Some(&i) => self.units[i] = unit,
            None => {
                self.index.insert(unit.id, self.units.len());
                self.units.push(unit);
            }
        }
    }

    pub fn with_units(mut self, units: impl IntoIterator<Item = Unit>) -> Self {
        for unit in units {
            self.insert(unit);
        }
        self
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.index.get(&id).map(|&i| &self.units[i])
    }

    /// All units in insertion order
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Resolve ids, skipping any that are gone
    pub fn resolve(&self, ids: &[UnitId]) -> Vec<&Unit> {
        ids.iter().filter_map(|&id| self.unit(id)).collect()
    }

    pub fn own_units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.iter().filter(|u| u.alliance == Alliance::Own)
    }

    pub fn enemy_units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.iter().filter(|u| u.alliance == Alliance::Enemy)
    }

    /// Own structures and workers, the assets a threat can damage
    pub fn own_assets(&self) -> Vec<&Unit> {
        self.own_units()
            .filter(|u| u.is_structure() || u.is_worker())
            .collect()
    }

    pub fn own_townhalls(&self) -> Vec<&Unit> {
        self.own_units().filter(|u| u.kind.is_townhall()).collect()
    }

    pub fn own_structures(&self) -> Vec<&Unit> {
        self.own_units().filter(|u| u.is_structure()).collect()
    }

    /// Enemy structures worth attacking
    ///
    /// Falls back to every enemy structure when only ignorable ones remain.
    pub fn enemy_structures(&self) -> Vec<&Unit> {
        let all: Vec<&Unit> = self.enemy_units().filter(|u| u.is_structure()).collect();
        let valid: Vec<&Unit> = all.iter().copied().filter(|u| !u.kind.is_ignored()).collect();
        if valid.is_empty() {
            all
        } else {
            valid
        }
    }

    /// Cached enemy army, remembered units included
    pub fn enemy_army(&self) -> Vec<&Unit> {
        self.enemy_units()
            .filter(|u| !u.is_structure() && !u.is_worker() && !u.kind.is_ignored())
            .collect()
    }

    /// Combined supply of a unit set
    pub fn supply_of(units: &[&Unit]) -> f32 {
        units.iter().map(|u| u.supply()).sum()
    }
}
