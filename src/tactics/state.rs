//! Engine-owned mutable state
//!
//! Everything that survives between ticks and is visible to other parts of
//! the agent lives here. Fields are private and each write goes through a
//! named method, so every mutation site is greppable. Outside the crate the
//! state is read-only.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::config::ThreatConfig;
use crate::core::types::GameSeconds;
use crate::tactics::threat::{ThreatRecord, UnderAttackLatch};

/// Read-only flags published to production and scouting collaborators
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedFlags {
    pub under_attack: bool,
    pub attack_commenced: bool,
    pub current_target: Option<Vec2>,
    pub defensive_anchor: Option<Vec2>,
    pub main_army_defending: bool,
    pub scout_urgency: f32,
}

/// Persistent state of the main force
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    latch: UnderAttackLatch,
    attack_commenced: bool,
    attack_commenced_time: GameSeconds,
    current_target: Option<Vec2>,
    defensive_anchor: Option<Vec2>,
    anchor_set_time: Option<GameSeconds>,
    threat_position: Option<Vec2>,
    worst_threat: Option<ThreatRecord>,
    main_army_defending: bool,
    scout_urgency: f32,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> SharedFlags {
        SharedFlags {
            under_attack: self.latch.is_active(),
            attack_commenced: self.attack_commenced,
            current_target: self.current_target,
            defensive_anchor: self.defensive_anchor,
            main_army_defending: self.main_army_defending,
            scout_urgency: self.scout_urgency,
        }
    }

    pub fn under_attack(&self) -> bool {
        self.latch.is_active()
    }

    pub fn attack_commenced(&self) -> bool {
        self.attack_commenced
    }

    pub fn attack_commenced_time(&self) -> GameSeconds {
        self.attack_commenced_time
    }

    pub fn current_target(&self) -> Option<Vec2> {
        self.current_target
    }

    pub fn defensive_anchor(&self) -> Option<Vec2> {
        self.defensive_anchor
    }

    pub fn anchor_set_time(&self) -> Option<GameSeconds> {
        self.anchor_set_time
    }

    /// Where the most recent defended threat was
    pub fn threat_position(&self) -> Option<Vec2> {
        self.threat_position
    }

    /// Most severe threat seen this tick
    pub fn worst_threat(&self) -> Option<&ThreatRecord> {
        self.worst_threat.as_ref()
    }

    pub fn main_army_defending(&self) -> bool {
        self.main_army_defending
    }

    // === STANCE WRITES ===

    pub(crate) fn commence_attack(&mut self, now: GameSeconds) {
        self.attack_commenced = true;
        self.attack_commenced_time = now;
    }

    pub(crate) fn call_off_attack(&mut self) {
        self.attack_commenced = false;
    }

    pub(crate) fn set_defensive_anchor(&mut self, anchor: Vec2, now: GameSeconds) {
        self.defensive_anchor = Some(anchor);
        self.anchor_set_time = Some(now);
    }

    pub(crate) fn set_current_target(&mut self, target: Vec2) {
        self.current_target = Some(target);
    }

    // === DEFENCE WRITES ===

    /// Start a tick's threat pass
    pub(crate) fn begin_threat_pass(&mut self) {
        self.worst_threat = None;
        self.main_army_defending = false;
    }

    /// Feed a tick's threats into the latch; returns true when the flag flipped
    ///
    /// Only the worst threat is observed, so the result does not depend on
    /// the order bases are visited in. It also becomes the remembered threat
    /// position.
    pub(crate) fn observe_threats<'r>(
        &mut self,
        threats: impl IntoIterator<Item = (&'r ThreatRecord, Vec2)>,
        early_cheese: bool,
        config: &ThreatConfig,
    ) -> bool {
        let mut worst: Option<(&ThreatRecord, Vec2)> = None;
        for (record, position) in threats {
            let worse = worst.map_or(true, |(w, _)| {
                (record.threat_level, record.threat_value) > (w.threat_level, w.threat_value)
            });
            if worse {
                worst = Some((record, position));
            }
        }
        let Some((record, position)) = worst else {
            return false;
        };

        self.threat_position = Some(position);
        self.worst_threat = Some(record.clone());
        self.latch.observe(record.threat_level, early_cheese, config)
    }

    pub(crate) fn set_main_army_defending(&mut self) {
        self.main_army_defending = true;
    }

    /// No enemy near any base; returns true when the flag flipped
    pub(crate) fn clear_threats(&mut self) -> bool {
        self.worst_threat = None;
        self.latch.reset()
    }

    pub(crate) fn forget_threat_position(&mut self) {
        self.threat_position = None;
    }

    pub(crate) fn set_scout_urgency(&mut self, urgency: f32) {
        self.scout_urgency = urgency;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tactics::threat::ResponseType;

    fn record(level: u32) -> ThreatRecord {
        let mut r = ThreatRecord::none();
        r.threat_level = level;
        r.response_type = ResponseType::Combat;
        r
    }

    #[test]
    fn test_default_flags() {
        let flags = EngineState::new().flags();
        assert!(!flags.under_attack);
        assert!(!flags.attack_commenced);
        assert!(flags.current_target.is_none());
        assert!(flags.defensive_anchor.is_none());
    }

    #[test]
    fn test_commence_records_time() {
        let mut state = EngineState::new();
        state.commence_attack(42.0);
        assert!(state.attack_commenced());
        assert_eq!(state.attack_commenced_time(), 42.0);
        state.call_off_attack();
        assert!(!state.flags().attack_commenced);
    }

    #[test]
    fn test_worst_threat_kept() {
        let config = ThreatConfig::default();
        let mut state = EngineState::new();
        state.begin_threat_pass();
        let (severe, mild) = (record(6), record(2));
        state.observe_threats([(&severe, Vec2::ZERO), (&mild, Vec2::ONE)], false, &config);
        assert_eq!(state.worst_threat().map(|t| t.threat_level), Some(6));
        assert_eq!(state.threat_position(), Some(Vec2::ZERO));
        assert!(state.under_attack());
        assert!(state.clear_threats());
        assert!(!state.under_attack());
    }

    #[test]
    fn test_latch_ignores_threat_order() {
        let config = ThreatConfig::default();
        let (severe, faint) = (record(6), record(1));
        let main = Vec2::new(20.0, 20.0);
        let natural = Vec2::new(45.0, 22.0);

        let mut forward = EngineState::new();
        forward.begin_threat_pass();
        let flipped = forward.observe_threats([(&severe, main), (&faint, natural)], false, &config);
        assert!(flipped);

        let mut backward = EngineState::new();
        backward.begin_threat_pass();
        let flipped = backward.observe_threats([(&faint, natural), (&severe, main)], false, &config);
        assert!(flipped);

        for state in [&forward, &backward] {
            assert!(state.under_attack());
            assert_eq!(state.threat_position(), Some(main));
            assert_eq!(state.worst_threat().map(|t| t.threat_level), Some(6));
        }
    }

    #[test]
    fn test_no_threats_leaves_latch() {
        let config = ThreatConfig::default();
        let mut state = EngineState::new();
        state.observe_threats([(&record(6), Vec2::ZERO)], false, &config);
        let none: [(&ThreatRecord, Vec2); 0] = [];
        assert!(!state.observe_threats(none, false, &config));
        assert!(state.under_attack());
    }
}
