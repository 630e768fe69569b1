//! Per-tick orchestration
//!
//! `TacticsEngine::tick` runs every stage in a fixed order: role upkeep,
//! intel, base defence, the stance decision, target selection, squad
//! control and housekeeping. A tick never fails. If a collaborator call
//! errors, the tick is logged, its changes are rolled back and it degrades
//! to issuing nothing new.

use ahash::AHashSet;
use glam::Vec2;
use serde::Serialize;

use crate::core::config::TacticsConfig;
use crate::core::error::Result;
use crate::core::types::{center_of, GameSeconds, Tick};
use crate::tactics::anchor::AnchorInputs;
use crate::tactics::commands::UnitCommand;
use crate::tactics::defense::{BaseThreat, DefenseCoordinator};
use crate::tactics::formation::{move_squad, MoveOrder};
use crate::tactics::hysteresis::{EngagementTracker, SquadKey};
use crate::tactics::intel::{IntelQuality, IntelTracker};
use crate::tactics::micro::{micro_unit, MicroContext};
use crate::tactics::nova::NovaPlanner;
use crate::tactics::services::{EstimateOptions, QueryFilter, Services, SpatialQuery};
use crate::tactics::snapshot::{MapInfo, Snapshot};
use crate::tactics::stance::{decide_stance, Stance, StanceDecision, StanceInputs};
use crate::tactics::state::{EngineState, SharedFlags};
use crate::tactics::targeting::{TargetInputs, TargetRule, TargetSelector};
use crate::units::{apply_role_changes, RoleBook, StagedRoles, Unit, UnitId, UnitRole};

/// Everything one tick decided
#[derive(Debug, Clone, Serialize)]
pub struct TickOutput {
    pub tick: Tick,
    pub time: GameSeconds,
    pub stance: Stance,
    /// `None` when the tick degraded
    pub decision: Option<StanceDecision>,
    pub target_rule: Option<TargetRule>,
    pub commands: Vec<UnitCommand>,
    pub threats: Vec<BaseThreat>,
    /// Units moved to base defence this tick
    pub dispatched: Vec<UnitId>,
    /// Defenders returned to the army this tick
    pub released: Vec<UnitId>,
    pub intel: IntelQuality,
    pub flags: SharedFlags,
    pub degraded: bool,
}

impl TickOutput {
    fn hold(tick: Tick, time: GameSeconds, stance: Stance, flags: SharedFlags) -> Self {
        Self {
            tick,
            time,
            stance,
            decision: None,
            target_rule: None,
            commands: Vec::new(),
            threats: Vec::new(),
            dispatched: Vec::new(),
            released: Vec::new(),
            intel: IntelQuality::blind(),
            flags,
            degraded: true,
        }
    }
}

/// How one role's squads are driven
struct SquadPlan {
    role: UnitRole,
    radius: f32,
    destination: Vec2,
    /// Non-main squads regroup on the main squad
    follow_main: bool,
    /// Skip the engagement estimate and always fight
    always_engage: bool,
}

/// Engine state as it stood before a tick
struct Checkpoint {
    state: EngineState,
    intel: IntelTracker,
    hysteresis: EngagementTracker,
    targets: TargetSelector,
    defense: DefenseCoordinator,
    nova: NovaPlanner,
}

/// The combat decision engine
pub struct TacticsEngine {
    config: TacticsConfig,
    map: MapInfo,
    state: EngineState,
    intel: IntelTracker,
    hysteresis: EngagementTracker,
    targets: TargetSelector,
    defense: DefenseCoordinator,
    nova: NovaPlanner,
}

impl TacticsEngine {
    pub fn new(config: TacticsConfig, map: MapInfo) -> Self {
        tracing::info!(
            "Tactics engine ready with profile '{}', {} expansions",
            config.name,
            map.expansion_locations.len()
        );
        Self {
            hysteresis: EngagementTracker::new(config.hysteresis.eviction_ticks),
            targets: TargetSelector::new(&map),
            config,
            map,
            state: EngineState::new(),
            intel: IntelTracker::new(),
            defense: DefenseCoordinator::new(),
            nova: NovaPlanner::new(),
        }
    }

    pub fn config(&self) -> &TacticsConfig {
        &self.config
    }

    pub fn map(&self) -> &MapInfo {
        &self.map
    }

    /// Read-only view of the persistent state
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn flags(&self) -> SharedFlags {
        self.state.flags()
    }

    pub fn hysteresis(&self) -> &EngagementTracker {
        &self.hysteresis
    }

    pub fn defense(&self) -> &DefenseCoordinator {
        &self.defense
    }

    /// Run one decision tick
    ///
    /// Role changes are staged and only reach the caller's role book when the
    /// whole tick succeeds. A degraded tick rolls every piece of engine state
    /// back, so it leaves no trace beyond the log line.
    pub fn tick(&mut self, snapshot: &Snapshot, services: &mut Services<'_>) -> TickOutput {
        let checkpoint = self.checkpoint();
        let mut staged = StagedRoles::new(&*services.roles);
        let result = {
            let mut staged_services = Services {
                spatial: services.spatial,
                estimator: services.estimator,
                pathing: services.pathing,
                world: services.world,
                roles: &mut staged,
            };
            self.try_tick(snapshot, &mut staged_services)
        };

        match result {
            Ok(output) => {
                let changes = staged.into_changes();
                apply_role_changes(services.roles, &changes);
                output
            }
            Err(e) => {
                self.restore(checkpoint);
                tracing::warn!("Tick {} degraded to hold: {}", snapshot.tick, e);
                let stance = if self.state.attack_commenced() {
                    Stance::Attacking
                } else {
                    Stance::NotAttacking
                };
                TickOutput::hold(snapshot.tick, snapshot.time, stance, self.state.flags())
            }
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            state: self.state.clone(),
            intel: self.intel.clone(),
            hysteresis: self.hysteresis.clone(),
            targets: self.targets.clone(),
            defense: self.defense.clone(),
            nova: self.nova.clone(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.state = checkpoint.state;
        self.intel = checkpoint.intel;
        self.hysteresis = checkpoint.hysteresis;
        self.targets = checkpoint.targets;
        self.defense = checkpoint.defense;
        self.nova = checkpoint.nova;
    }

    fn try_tick(&mut self, snapshot: &Snapshot, services: &mut Services<'_>) -> Result<TickOutput> {
        upkeep_roles(snapshot, services.roles);

        let enemy_army = snapshot.enemy_army();
        let intel = self.intel.update(&enemy_army, &self.config.intel);
        self.state.set_scout_urgency(self.intel.urgency());

        let report = self.defense.update(snapshot, services, &mut self.state, &self.config);
        if report.threats.is_empty() && self.defense.defender_count() == 0 {
            self.state.forget_threat_position();
        }

        let army_ids = services.roles.units_with_role(UnitRole::Attacking);
        let main_army = snapshot.resolve(&army_ids);
        let army_center = center_of(main_army.iter().map(|u| u.position));
        let outcome = services
            .estimator
            .estimate(&main_army, &enemy_army, EstimateOptions::default());

        let visible_enemies = snapshot.enemy_units().any(|u| !u.is_memory());
        let defend_target = if self.state.main_army_defending() && visible_enemies {
            self.state
                .worst_threat()
                .and_then(|t| t.centroid)
                .or(self.state.threat_position())
        } else {
            None
        };

        let townhalls = snapshot.own_townhalls();
        let structures = snapshot.own_structures();
        let anchor = AnchorInputs {
            phase: snapshot.phase,
            own_townhalls: &townhalls,
            own_structures: &structures,
            map: &self.map,
        };
        let stance_inputs = StanceInputs {
            now: snapshot.time,
            intel,
            outcome,
            under_attack: self.state.under_attack(),
            cheese_defense: snapshot.cheese_defense,
            own_army_supply: Snapshot::supply_of(&main_army),
            enemy_army_supply: Snapshot::supply_of(&enemy_army),
            enemy_has_siege: enemy_army.iter().any(|u| u.kind.is_siege()),
            supply_used: snapshot.supply_used,
            army_center,
            defend_target,
        };
        let decision = decide_stance(&mut self.state, &stance_inputs, &anchor, &self.config);

        let mut target_rule = None;
        let destination = match decision.destination() {
            Some(point) => point,
            None => {
                let enemy_structures = snapshot.enemy_structures();
                let visible_army: Vec<&Unit> = enemy_army.iter().copied().filter(|u| !u.is_memory()).collect();
                let inputs = TargetInputs {
                    now: snapshot.time,
                    previous: self.state.current_target(),
                    army_center,
                    enemy_structures: &enemy_structures,
                    enemy_army: &visible_army,
                    mineral_fields: &snapshot.mineral_fields,
                    map: &self.map,
                };
                let (target, rule) = self.targets.select(&inputs, services.world, &self.config.targeting);
                if self.state.current_target() != Some(target) {
                    tracing::debug!("Attack target ({:.1}, {:.1}) via {:?}", target.x, target.y, rule);
                }
                self.state.set_current_target(target);
                target_rule = Some(rule);
                target
            }
        };

        self.nova.prune(snapshot.time);

        let mut commands = self.control_squads(
            snapshot,
            services,
            &SquadPlan {
                role: UnitRole::Attacking,
                radius: self.config.micro.attacking_squad_radius,
                destination,
                follow_main: true,
                always_engage: false,
            },
            &main_army,
        )?;

        let rally = self
            .state
            .threat_position()
            .or(self.map.main_ramp_top)
            .unwrap_or(self.map.start_location);
        let defender_ids = services.roles.units_with_role(UnitRole::BaseDefender);
        let defenders = snapshot.resolve(&defender_ids);
        commands.extend(self.control_squads(
            snapshot,
            services,
            &SquadPlan {
                role: UnitRole::BaseDefender,
                radius: self.config.defense.defender_squad_radius,
                destination: rally,
                follow_main: false,
                always_engage: true,
            },
            &defenders,
        )?);

        let evicted = self.hysteresis.evict_stale(snapshot.tick);
        if evicted > 0 {
            tracing::debug!("Evicted {} stale squad engagement entries", evicted);
        }

        Ok(TickOutput {
            tick: snapshot.tick,
            time: snapshot.time,
            stance: decision.stance(),
            decision: Some(decision),
            target_rule,
            commands,
            threats: report.threats,
            dispatched: report.dispatched,
            released: report.released,
            intel,
            flags: self.state.flags(),
            degraded: false,
        })
    }

    /// Fight with squads that have enemies close, move the rest
    fn control_squads(
        &mut self,
        snapshot: &Snapshot,
        services: &Services<'_>,
        plan: &SquadPlan,
        group: &[&Unit],
    ) -> Result<Vec<UnitCommand>> {
        let squads = services.spatial.squads(plan.role, plan.radius, &*services.roles)?;
        let main_position = squads
            .iter()
            .find(|s| s.main)
            .map(|s| s.position)
            .unwrap_or(plan.destination);

        let mut commands = Vec::new();
        for squad in &squads {
            let members = snapshot.resolve(&squad.members);
            if members.len() < squad.members.len() {
                tracing::warn!(
                    "Squad {} lost {} members mid-tick, skipping them",
                    squad.id,
                    squad.members.len() - members.len()
                );
            }
            if members.is_empty() {
                continue;
            }
            let move_to = if squad.main || !plan.follow_main {
                plan.destination
            } else {
                main_position
            };

            let enemies = enemies_near(snapshot, services.spatial, &members, self.config.micro.enemy_detection_range);
            if enemies.is_empty() {
                let range_sq = self.config.micro.structure_attack_range * self.config.micro.structure_attack_range;
                let structures: Vec<&Unit> = snapshot
                    .enemy_structures()
                    .into_iter()
                    .filter(|s| !s.is_memory() && s.position.distance_squared(squad.position) <= range_sq)
                    .collect();
                let order = MoveOrder {
                    members: &members,
                    center: squad.position,
                    destination: move_to,
                    home: self.map.start_location,
                    nearby_structures: &structures,
                };
                commands.extend(move_squad(&order, &self.config.micro));
                continue;
            }

            let engage = if plan.always_engage || !self.state.attack_commenced() {
                true
            } else {
                let radius_sq = self.config.micro.squad_engage_radius * self.config.micro.squad_engage_radius;
                let own_nearby: Vec<&Unit> = group
                    .iter()
                    .copied()
                    .filter(|u| u.position.distance_squared(squad.position) < radius_sq)
                    .collect();
                let combat_enemies: Vec<&Unit> = enemies.iter().copied().filter(|u| !u.is_worker()).collect();
                let outcome = services
                    .estimator
                    .estimate(&own_nearby, &combat_enemies, EstimateOptions::default());
                self.hysteresis.should_engage(SquadKey(squad.id), outcome, snapshot.tick)
            };

            let ctx = MicroContext {
                now: snapshot.time,
                enemies: &enemies,
                friends: &members,
                fallback: move_to,
                engage,
                pathing: services.pathing,
                world: services.world,
            };
            for unit in &members {
                commands.push(micro_unit(unit, &ctx, &mut self.nova, &self.config.micro));
            }
        }
        Ok(commands)
    }
}

/// Give new army units the attacking role and forget dead units
fn upkeep_roles(snapshot: &Snapshot, roles: &mut dyn RoleBook) {
    for role in UnitRole::ALL {
        for id in roles.units_with_role(role) {
            if snapshot.unit(id).is_none() {
                roles.remove(id);
            }
        }
    }
    for unit in snapshot.own_units() {
        let army = !unit.is_worker() && !unit.is_structure() && !unit.kind.is_ignored() && unit.movement_speed > 0.0;
        if army && roles.role_of(unit.id).is_none() {
            roles.assign_role(unit.id, UnitRole::Attacking);
        }
    }
}

/// Visible enemy units near any member, structures and ignored kinds excluded
fn enemies_near<'s>(
    snapshot: &'s Snapshot,
    spatial: &dyn SpatialQuery,
    members: &[&Unit],
    range: f32,
) -> Vec<&'s Unit> {
    let points: Vec<Vec2> = members.iter().map(|u| u.position).collect();
    let mut seen = AHashSet::new();
    let mut enemies = Vec::new();
    for id in spatial
        .units_in_range(&points, range, QueryFilter::visible_enemies())
        .into_iter()
        .flatten()
    {
        if !seen.insert(id) {
            continue;
        }
        if let Some(unit) = snapshot.unit(id) {
            if !unit.is_memory() && !unit.is_structure() && !unit.kind.is_ignored() {
                enemies.push(unit);
            }
        }
    }
    enemies
}
