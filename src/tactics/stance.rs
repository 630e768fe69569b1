//! Attack/retreat state machine for the main force
//!
//! Two states, `NotAttacking` and `Attacking`. Starting an attack needs
//! usable intel and a favourable estimate. Once started, an attack is held
//! for a commitment window before any retreat is considered. This module is
//! the only writer of the commenced flag and the defensive anchor.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::config::TacticsConfig;
use crate::core::types::{closest_index, GameSeconds};
use crate::tactics::anchor::{choose_anchor, AnchorInputs};
use crate::tactics::intel::IntelQuality;
use crate::tactics::outcome::FightOutcome;
use crate::tactics::state::EngineState;

/// Top-level stance of the main force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    NotAttacking,
    Attacking,
}

/// What the main force should do this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StanceDecision {
    /// Push to the attack target
    Attack,
    /// Fall back to a base after calling off an attack
    Retreat(Vec2),
    /// Meet a serious threat at home
    Defend(Vec2),
    /// Wait at the defensive anchor
    Anchor(Vec2),
}

impl StanceDecision {
    pub fn stance(&self) -> Stance {
        match self {
            StanceDecision::Attack => Stance::Attacking,
            _ => Stance::NotAttacking,
        }
    }

    /// Destination, if it does not come from the target selector
    pub fn destination(&self) -> Option<Vec2> {
        match *self {
            StanceDecision::Attack => None,
            StanceDecision::Retreat(p) | StanceDecision::Defend(p) | StanceDecision::Anchor(p) => Some(p),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StanceDecision::Attack => "attack",
            StanceDecision::Retreat(_) => "retreat",
            StanceDecision::Defend(_) => "defend",
            StanceDecision::Anchor(_) => "anchor",
        }
    }
}

/// Per-tick signals the state machine reads
#[derive(Debug, Clone, Copy)]
pub struct StanceInputs {
    pub now: GameSeconds,
    pub intel: IntelQuality,
    /// Main army against the cached enemy army
    pub outcome: FightOutcome,
    pub under_attack: bool,
    pub cheese_defense: bool,
    pub own_army_supply: f32,
    pub enemy_army_supply: f32,
    pub enemy_has_siege: bool,
    pub supply_used: f32,
    pub army_center: Option<Vec2>,
    /// Threat centroid when a threat is serious enough to pull the army home
    pub defend_target: Option<Vec2>,
}

/// Decide the stance for this tick and update the engine state
pub fn decide_stance(
    state: &mut EngineState,
    inputs: &StanceInputs,
    anchor: &AnchorInputs<'_>,
    config: &TacticsConfig,
) -> StanceDecision {
    if state.attack_commenced() {
        return continue_attack(state, inputs, anchor, config);
    }

    let intel = &inputs.intel;
    if !intel.has_intel || intel.freshness < config.intel.stale_threshold {
        return StanceDecision::Anchor(refresh_anchor(state, anchor, inputs.now, config));
    }

    if inputs.under_attack {
        if let Some(threat) = inputs.defend_target {
            return StanceDecision::Defend(threat);
        }
    }

    if siege_blocks(inputs, config) {
        return StanceDecision::Anchor(refresh_anchor(state, anchor, inputs.now, config));
    }

    let unlocked = if inputs.supply_used >= config.stance.max_supply {
        true
    } else if intel.freshness >= config.intel.fresh_threshold {
        inputs.outcome.is_decisive_victory_or_better()
            || (inputs.outcome.is_marginal_victory_or_better()
                && !inputs.under_attack
                && !inputs.cheese_defense)
    } else {
        inputs.outcome.is_emphatic_victory()
    };

    if unlocked {
        tracing::info!(
            "Attack commenced at {:.1}s (estimate {:?}, freshness {:.2})",
            inputs.now,
            inputs.outcome,
            intel.freshness
        );
        state.commence_attack(inputs.now);
        StanceDecision::Attack
    } else {
        StanceDecision::Anchor(refresh_anchor(state, anchor, inputs.now, config))
    }
}

fn continue_attack(
    state: &mut EngineState,
    inputs: &StanceInputs,
    anchor: &AnchorInputs<'_>,
    config: &TacticsConfig,
) -> StanceDecision {
    let elapsed = inputs.now - state.attack_commenced_time();
    if elapsed < config.stance.commitment_seconds {
        return StanceDecision::Attack;
    }

    let reason = if siege_blocks(inputs, config) {
        Some("siege units and not enough supply")
    } else if inputs.outcome.is_decisive_loss_or_worse() {
        Some("losing decisively")
    } else {
        None
    };

    match reason {
        Some(reason) => {
            tracing::info!(
                "Calling off attack after {:.1}s: {} ({:?})",
                elapsed,
                reason,
                inputs.outcome
            );
            state.call_off_attack();
            StanceDecision::Retreat(retreat_target(inputs.army_center, anchor))
        }
        None => StanceDecision::Attack,
    }
}

/// Entrenched siege units the estimate underrates, and not enough supply to break them
fn siege_blocks(inputs: &StanceInputs, config: &TacticsConfig) -> bool {
    inputs.enemy_has_siege
        && inputs.own_army_supply < inputs.enemy_army_supply * config.stance.siege_supply_ratio
}

/// Nearest own base to the army, or the start location
pub fn retreat_target(army_center: Option<Vec2>, anchor: &AnchorInputs<'_>) -> Vec2 {
    let start = anchor.map.start_location;
    let Some(center) = army_center else {
        return start;
    };
    let bases: Vec<Vec2> = anchor.own_townhalls.iter().map(|u| u.position).collect();
    closest_index(&bases, center)
        .map(|i| bases[i])
        .unwrap_or(start)
}

/// Current anchor, re-evaluated at most once per cooldown
fn refresh_anchor(
    state: &mut EngineState,
    inputs: &AnchorInputs<'_>,
    now: GameSeconds,
    config: &TacticsConfig,
) -> Vec2 {
    if let (Some(current), Some(set_at)) = (state.defensive_anchor(), state.anchor_set_time()) {
        if now < set_at + config.stance.anchor_cooldown_seconds {
            return current;
        }
    }

    let anchor = choose_anchor(inputs, &config.stance);
    if state.defensive_anchor() != Some(anchor) {
        tracing::debug!("Defensive anchor moved to ({:.1}, {:.1})", anchor.x, anchor.y);
        state.set_defensive_anchor(anchor, now);
    }
    anchor
}
