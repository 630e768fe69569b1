//! Seeded random skirmish
//!
//! A toy two-base map with a Protoss army under engine control and a Zerg
//! army that sits at its natural, then pushes. Movement is straight-line,
//! combat is flat damage per shot. Good enough to drive every engine stage.

use ahash::AHashMap;
use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{towards, GameSeconds, Race, Tick, TICKS_PER_SECOND};
use crate::tactics::commands::{CommandKind, UnitCommand};
use crate::tactics::snapshot::{MapInfo, Snapshot};
use crate::units::{Alliance, Unit, UnitId, UnitKind};

/// Seconds between shots for every weapon
const WEAPON_PERIOD: f32 = 1.0;
const NOVA_COOLDOWN: f32 = 21.0;
const NOVA_DAMAGE: f32 = 145.0;
const SIGHT_RANGE: f32 = 11.0;
/// Remembered enemy units are dropped after this long
const MEMORY_SECONDS: f32 = 30.0;
/// Enemy units react to own units this close
const AGGRO_RANGE: f32 = 12.0;

const OWN_ROSTER: [UnitKind; 6] = [
    UnitKind::Zealot,
    UnitKind::Stalker,
    UnitKind::Stalker,
    UnitKind::Adept,
    UnitKind::Immortal,
    UnitKind::Disruptor,
];

const ENEMY_ROSTER: [UnitKind; 6] = [
    UnitKind::Zergling,
    UnitKind::Zergling,
    UnitKind::Roach,
    UnitKind::Hydralisk,
    UnitKind::Ravager,
    UnitKind::Queen,
];

/// Knobs for a generated skirmish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkirmishSettings {
    pub own_army: usize,
    pub enemy_army: usize,
    /// Game time at which the enemy army moves out (seconds)
    pub enemy_push_seconds: f32,
    /// Game loops simulated per engine tick
    pub loops_per_step: u64,
}

impl Default for SkirmishSettings {
    fn default() -> Self {
        Self {
            own_army: 12,
            enemy_army: 10,
            enemy_push_seconds: 240.0,
            loops_per_step: 8,
        }
    }
}

/// Who is still standing
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SkirmishTally {
    pub own_army_alive: usize,
    pub enemy_army_alive: usize,
    pub own_lost: usize,
    pub enemy_lost: usize,
}

enum Intent {
    Move(usize, Vec2),
    Fire(usize, usize),
    Nova(usize, Vec2),
}

/// Ground truth for one skirmish
pub struct Skirmish {
    settings: SkirmishSettings,
    map: MapInfo,
    size: Vec2,
    mineral_fields: Vec<Vec2>,
    units: Vec<Unit>,
    /// Last time and place each enemy unit was seen
    last_seen: AHashMap<UnitId, (GameSeconds, Vec2)>,
    weapon_cooldowns: AHashMap<UnitId, f32>,
    ability_cooldowns: AHashMap<UnitId, f32>,
    game_loop: Tick,
    tally: SkirmishTally,
}

impl Skirmish {
    pub fn generate(seed: u64, settings: SkirmishSettings) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let size = Vec2::new(160.0, 160.0);
        let start = Vec2::new(20.0, 20.0);
        let natural = Vec2::new(45.0, 22.0);
        let enemy_start = Vec2::new(140.0, 140.0);
        let enemy_natural = Vec2::new(115.0, 138.0);
        let expansions = vec![
            start,
            natural,
            Vec2::new(20.0, 80.0),
            Vec2::new(80.0, 20.0),
            Vec2::new(140.0, 80.0),
            Vec2::new(80.0, 140.0),
            enemy_natural,
            enemy_start,
        ];
        let mineral_fields = expansions
            .iter()
            .flat_map(|&e| (0..4).map(move |i| e + Vec2::new(-3.0 + 2.0 * i as f32, 6.0)))
            .collect();

        let map = MapInfo {
            start_location: start,
            enemy_start,
            own_natural: natural,
            enemy_natural,
            main_ramp_top: Some(Vec2::new(30.0, 30.0)),
            gatekeeper_position: None,
            expansion_locations: expansions,
            enemy_race: Race::Zerg,
        };

        let mut units = Vec::new();
        let mut next_id = 1u64;
        let mut spawn = |units: &mut Vec<Unit>, kind: UnitKind, alliance: Alliance, pos: Vec2| {
            units.push(Unit::new(UnitId(next_id), kind, alliance, pos));
            next_id += 1;
        };

        spawn(&mut units, UnitKind::Nexus, Alliance::Own, start);
        spawn(&mut units, UnitKind::Pylon, Alliance::Own, start + Vec2::new(6.0, 0.0));
        spawn(&mut units, UnitKind::Gateway, Alliance::Own, start + Vec2::new(6.0, 4.0));
        for i in 0..6 {
            spawn(&mut units, UnitKind::Probe, Alliance::Own, start + Vec2::new(i as f32 - 3.0, 4.0));
        }
        for _ in 0..settings.own_army {
            let kind = OWN_ROSTER.choose(&mut rng).copied().unwrap_or(UnitKind::Zealot);
            let jitter = Vec2::new(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0));
            spawn(&mut units, kind, Alliance::Own, Vec2::new(28.0, 28.0) + jitter);
        }

        spawn(&mut units, UnitKind::Hatchery, Alliance::Enemy, enemy_start);
        spawn(&mut units, UnitKind::Hatchery, Alliance::Enemy, enemy_natural);
        spawn(&mut units, UnitKind::SpawningPool, Alliance::Enemy, enemy_start + Vec2::new(-6.0, 0.0));
        for i in 0..8 {
            spawn(&mut units, UnitKind::Drone, Alliance::Enemy, enemy_start + Vec2::new(i as f32 - 4.0, -4.0));
        }
        for _ in 0..settings.enemy_army {
            let kind = ENEMY_ROSTER.choose(&mut rng).copied().unwrap_or(UnitKind::Zergling);
            let jitter = Vec2::new(rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0));
            spawn(&mut units, kind, Alliance::Enemy, enemy_natural + Vec2::new(-8.0, -8.0) + jitter);
        }

        tracing::info!(
            "Generated skirmish seed {}: {} own army vs {} enemy army",
            seed,
            settings.own_army,
            settings.enemy_army
        );

        Self {
            settings,
            map,
            size,
            mineral_fields,
            units,
            last_seen: AHashMap::new(),
            weapon_cooldowns: AHashMap::new(),
            ability_cooldowns: AHashMap::new(),
            game_loop: 0,
            tally: SkirmishTally::default(),
        }
        .with_vision()
    }

    fn with_vision(mut self) -> Self {
        self.refresh_vision();
        self
    }

    pub fn map(&self) -> &MapInfo {
        &self.map
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn time(&self) -> GameSeconds {
        self.game_loop as f32 / TICKS_PER_SECOND
    }

    pub fn game_loop(&self) -> Tick {
        self.game_loop
    }

    pub fn tally(&self) -> SkirmishTally {
        let army = |a: Alliance| {
            self.units
                .iter()
                .filter(|u| u.alliance == a && !u.is_structure() && !u.is_worker())
                .count()
        };
        SkirmishTally {
            own_army_alive: army(Alliance::Own),
            enemy_army_alive: army(Alliance::Enemy),
            ..self.tally
        }
    }

    /// Whether one side has no army and no structures left
    pub fn is_decided(&self) -> bool {
        let standing = |a: Alliance| self.units.iter().any(|u| u.alliance == a && !u.is_worker());
        !standing(Alliance::Own) || !standing(Alliance::Enemy)
    }

    /// What the engine sees: own units, visible enemies and remembered ones
    pub fn snapshot(&self) -> Snapshot {
        let now = self.time();
        let mut snapshot = Snapshot::new(self.game_loop, now);
        snapshot.supply_used = self
            .units
            .iter()
            .filter(|u| u.alliance == Alliance::Own)
            .map(|u| u.supply())
            .sum();
        snapshot.mineral_fields = self.mineral_fields.clone();

        for unit in &self.units {
            match unit.alliance {
                Alliance::Own => snapshot.insert(unit.clone()),
                _ => {
                    let Some(&(seen_at, seen_pos)) = self.last_seen.get(&unit.id) else {
                        continue;
                    };
                    let age = now - seen_at;
                    if age <= 0.0 {
                        snapshot.insert(unit.clone());
                    } else if unit.is_structure() || age <= MEMORY_SECONDS {
                        let mut memory = unit.clone().with_age(age);
                        memory.position = seen_pos;
                        snapshot.insert(memory);
                    }
                }
            }
        }
        snapshot
    }

    /// Advance the simulation by one engine tick
    pub fn step(&mut self, commands: &[UnitCommand]) {
        let dt = self.settings.loops_per_step as f32 / TICKS_PER_SECOND;
        for cd in self.weapon_cooldowns.values_mut().chain(self.ability_cooldowns.values_mut()) {
            *cd -= dt;
        }

        let orders: AHashMap<UnitId, CommandKind> = commands.iter().map(|c| (c.unit, c.kind)).collect();
        let pushing = self.time() >= self.settings.enemy_push_seconds;
        let intents: Vec<Intent> = (0..self.units.len())
            .filter_map(|i| match self.units[i].alliance {
                Alliance::Own => self.own_intent(i, orders.get(&self.units[i].id).copied()),
                Alliance::Enemy => self.enemy_intent(i, pushing),
                Alliance::Neutral => None,
            })
            .collect();

        let mut damage: AHashMap<usize, f32> = AHashMap::new();
        for intent in intents {
            match intent {
                Intent::Move(i, to) => {
                    let unit = &mut self.units[i];
                    let stride = unit.movement_speed * dt;
                    let next = if unit.position.distance(to) <= stride {
                        to
                    } else {
                        towards(unit.position, to, stride)
                    };
                    unit.position = next.clamp(Vec2::ZERO, self.size);
                }
                Intent::Fire(attacker, target) => {
                    let shot = 8.0 * self.units[attacker].kind.army_value().max(0.5);
                    *damage.entry(target).or_default() += shot;
                    self.weapon_cooldowns.insert(self.units[attacker].id, WEAPON_PERIOD);
                }
                Intent::Nova(caster, at) => {
                    for (j, unit) in self.units.iter().enumerate() {
                        if !unit.flying && unit.position.distance(at) <= 1.5 {
                            *damage.entry(j).or_default() += NOVA_DAMAGE;
                        }
                    }
                    self.ability_cooldowns.insert(self.units[caster].id, NOVA_COOLDOWN);
                }
            }
        }

        for (i, amount) in damage {
            let unit = &mut self.units[i];
            let absorbed = unit.shield.min(amount);
            unit.shield -= absorbed;
            unit.health -= amount - absorbed;
        }
        let before = self.units.len();
        let mut own_lost = 0;
        self.units.retain(|u| {
            let alive = u.health > 0.0;
            if !alive && u.alliance == Alliance::Own {
                own_lost += 1;
            }
            alive
        });
        self.tally.own_lost += own_lost;
        self.tally.enemy_lost += before - self.units.len() - own_lost;

        for unit in &mut self.units {
            unit.weapon_ready = self.weapon_cooldowns.get(&unit.id).map_or(true, |&cd| cd <= 0.0);
            unit.ability_ready = self.ability_cooldowns.get(&unit.id).map_or(true, |&cd| cd <= 0.0);
        }

        self.game_loop += self.settings.loops_per_step;
        self.refresh_vision();
    }

    fn refresh_vision(&mut self) {
        let now = self.time();
        let sight_sq = SIGHT_RANGE * SIGHT_RANGE;
        let eyes: Vec<Vec2> = self
            .units
            .iter()
            .filter(|u| u.alliance == Alliance::Own)
            .map(|u| u.position)
            .collect();
        for unit in self.units.iter().filter(|u| u.alliance == Alliance::Enemy) {
            if eyes.iter().any(|e| e.distance_squared(unit.position) <= sight_sq) {
                self.last_seen.insert(unit.id, (now, unit.position));
            }
        }
        let units = &self.units;
        self.last_seen.retain(|id, _| units.iter().any(|u| u.id == *id));
    }

    fn weapon_ready(&self, i: usize) -> bool {
        self.weapon_cooldowns
            .get(&self.units[i].id)
            .map_or(true, |&cd| cd <= 0.0)
    }

    /// Weakest opposing unit in weapon range
    fn target_in_range(&self, i: usize) -> Option<usize> {
        let me = &self.units[i];
        self.units
            .iter()
            .enumerate()
            .filter(|(_, u)| u.alliance != me.alliance && u.alliance != Alliance::Neutral)
            .filter(|(_, u)| !u.kind.is_ignored() && me.in_attack_range_of(u))
            .min_by(|(_, a), (_, b)| a.health_fraction().total_cmp(&b.health_fraction()))
            .map(|(j, _)| j)
    }

    fn fire_or(&self, i: usize, otherwise: Option<Intent>) -> Option<Intent> {
        if self.weapon_ready(i) {
            if let Some(target) = self.target_in_range(i) {
                return Some(Intent::Fire(i, target));
            }
        }
        otherwise
    }

    fn own_intent(&self, i: usize, order: Option<CommandKind>) -> Option<Intent> {
        match order {
            Some(CommandKind::Move(p)) => Some(Intent::Move(i, p)),
            Some(CommandKind::AttackMove(p)) => self.fire_or(i, Some(Intent::Move(i, p))),
            Some(CommandKind::Attack(target)) => {
                let j = self.units.iter().position(|u| u.id == target)?;
                if self.units[i].in_attack_range_of(&self.units[j]) {
                    self.weapon_ready(i).then_some(Intent::Fire(i, j))
                } else {
                    Some(Intent::Move(i, self.units[j].position))
                }
            }
            Some(CommandKind::Cast { target, .. }) => {
                let ready = self
                    .ability_cooldowns
                    .get(&self.units[i].id)
                    .map_or(true, |&cd| cd <= 0.0);
                ready.then_some(Intent::Nova(i, target))
            }
            Some(CommandKind::Hold) | None => self.fire_or(i, None),
        }
    }

    fn enemy_intent(&self, i: usize, pushing: bool) -> Option<Intent> {
        let me = &self.units[i];
        if me.is_structure() || me.is_worker() || me.movement_speed <= 0.0 {
            return self.fire_or(i, None);
        }
        let aggro_sq = AGGRO_RANGE * AGGRO_RANGE;
        let prey = self
            .units
            .iter()
            .filter(|u| u.alliance == Alliance::Own && me.can_target(u))
            .map(|u| (u.position.distance_squared(me.position), u.position))
            .filter(|(d, _)| *d <= aggro_sq)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, p)| p);
        let advance = match prey {
            Some(p) => Some(Intent::Move(i, p)),
            None if pushing => Some(Intent::Move(i, self.map.own_natural)),
            None => None,
        };
        self.fire_or(i, advance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_seeded() {
        let a = Skirmish::generate(7, SkirmishSettings::default());
        let b = Skirmish::generate(7, SkirmishSettings::default());
        let kinds = |s: &Skirmish| s.units.iter().map(|u| (u.kind, u.position)).collect::<Vec<_>>();
        assert_eq!(kinds(&a), kinds(&b));
    }

    #[test]
    fn test_snapshot_hides_unseen_enemies() {
        let skirmish = Skirmish::generate(1, SkirmishSettings::default());
        let snapshot = skirmish.snapshot();
        assert!(snapshot.enemy_units().next().is_none());
        assert_eq!(snapshot.own_townhalls().len(), 1);
        assert!(snapshot.supply_used > 0.0);
    }

    #[test]
    fn test_move_command_moves_unit() {
        let mut skirmish = Skirmish::generate(3, SkirmishSettings::default());
        let zealot = skirmish
            .units
            .iter()
            .find(|u| u.alliance == Alliance::Own && !u.is_structure() && !u.is_worker())
            .map(|u| (u.id, u.position))
            .expect("own army unit");
        let target = zealot.1 + Vec2::new(10.0, 0.0);
        skirmish.step(&[UnitCommand::move_to(zealot.0, target)]);
        let moved = skirmish.units.iter().find(|u| u.id == zealot.0).map(|u| u.position);
        assert!(moved.is_some_and(|p| p.distance(target) < 10.0));
        assert_eq!(skirmish.game_loop(), 8);
    }
}
