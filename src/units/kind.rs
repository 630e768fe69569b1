//! Unit kinds and their static properties
//!
//! Army value is a rough combat-worth scalar used to weigh forces against
//! each other. It is not resource cost: workers and structures that cannot
//! fight are worth little or nothing.

use serde::{Deserialize, Serialize};

/// Type of unit, across all three races
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    // Protoss
    Probe,
    Zealot,
    Stalker,
    Sentry,
    Adept,
    AdeptPhaseShift,
    HighTemplar,
    DarkTemplar,
    Archon,
    Immortal,
    Colossus,
    Disruptor,
    Observer,
    WarpPrism,
    Phoenix,
    VoidRay,
    Oracle,
    Carrier,
    Tempest,
    Nexus,
    Pylon,
    Gateway,
    PhotonCannon,
    ShieldBattery,

    // Terran
    Scv,
    Mule,
    Marine,
    Marauder,
    Reaper,
    Ghost,
    Hellion,
    Hellbat,
    SiegeTank,
    SiegeTankSieged,
    Cyclone,
    Thor,
    WidowMine,
    Viking,
    Medivac,
    Liberator,
    LiberatorSieged,
    Banshee,
    Raven,
    Battlecruiser,
    CommandCenter,
    OrbitalCommand,
    SupplyDepot,
    Barracks,
    Bunker,
    MissileTurret,

    // Zerg
    Drone,
    Zergling,
    Baneling,
    Queen,
    Roach,
    Ravager,
    Hydralisk,
    Lurker,
    LurkerBurrowed,
    Mutalisk,
    Corruptor,
    Infestor,
    SwarmHost,
    Locust,
    Ultralisk,
    BroodLord,
    Broodling,
    Viper,
    Overlord,
    Overseer,
    Larva,
    Egg,
    CreepTumor,
    Changeling,
    Hatchery,
    Lair,
    Hive,
    SpawningPool,
    SpineCrawler,
    SporeCrawler,

    /// Anything not in the catalogue
    Other,
}

/// Default properties for a unit kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindProfile {
    pub army_value: f32,
    pub supply: f32,
    /// Ground weapon range, 0.0 when the kind cannot hit ground
    pub ground_range: f32,
    /// Air weapon range, 0.0 when the kind cannot hit air
    pub air_range: f32,
    pub max_health: f32,
    pub max_shield: f32,
    pub movement_speed: f32,
    pub flying: bool,
    pub has_energy: bool,
}

impl KindProfile {
    const fn ground(
        army_value: f32,
        supply: f32,
        ground_range: f32,
        air_range: f32,
        max_health: f32,
        max_shield: f32,
        movement_speed: f32,
    ) -> Self {
        Self {
            army_value,
            supply,
            ground_range,
            air_range,
            max_health,
            max_shield,
            movement_speed,
            flying: false,
            has_energy: false,
        }
    }

    const fn building(army_value: f32, ground_range: f32, air_range: f32, max_health: f32, max_shield: f32) -> Self {
        Self::ground(army_value, 0.0, ground_range, air_range, max_health, max_shield, 0.0)
    }

    const fn inert(max_health: f32) -> Self {
        Self::ground(0.0, 0.0, 0.0, 0.0, max_health, 0.0, 0.0)
    }

    const fn flying(mut self) -> Self {
        self.flying = true;
        self
    }

    const fn energy(mut self) -> Self {
        self.has_energy = true;
        self
    }
}

impl UnitKind {
    /// Get default properties for this kind
    pub fn profile(&self) -> KindProfile {
        use UnitKind::*;
        match self {
            Probe => KindProfile::ground(0.5, 1.0, 0.1, 0.0, 20.0, 20.0, 3.94),
            Zealot => KindProfile::ground(2.0, 2.0, 0.1, 0.0, 100.0, 50.0, 3.15),
            Stalker => KindProfile::ground(2.5, 2.0, 6.0, 6.0, 80.0, 80.0, 4.13),
            Sentry => KindProfile::ground(1.5, 2.0, 5.0, 5.0, 40.0, 40.0, 3.15).energy(),
            Adept => KindProfile::ground(2.0, 2.0, 4.0, 0.0, 70.0, 70.0, 3.5),
            AdeptPhaseShift => KindProfile::ground(0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 5.0),
            HighTemplar => KindProfile::ground(3.0, 2.0, 0.0, 0.0, 40.0, 40.0, 2.62).energy(),
            DarkTemplar => KindProfile::ground(3.5, 2.0, 0.1, 0.0, 40.0, 80.0, 3.94),
            Archon => KindProfile::ground(5.0, 4.0, 3.0, 3.0, 10.0, 350.0, 3.94),
            Immortal => KindProfile::ground(4.0, 4.0, 6.0, 0.0, 200.0, 100.0, 3.15),
            Colossus => KindProfile::ground(6.0, 6.0, 7.0, 0.0, 200.0, 150.0, 3.15),
            Disruptor => KindProfile::ground(4.0, 3.0, 0.0, 0.0, 100.0, 100.0, 3.15),
            Observer => KindProfile::ground(0.5, 1.0, 0.0, 0.0, 40.0, 20.0, 2.63).flying(),
            WarpPrism => KindProfile::ground(1.0, 2.0, 0.0, 0.0, 80.0, 100.0, 4.13).flying(),
            Phoenix => KindProfile::ground(2.5, 2.0, 0.0, 5.0, 120.0, 60.0, 5.95).flying().energy(),
            VoidRay => KindProfile::ground(4.0, 4.0, 6.0, 6.0, 150.0, 100.0, 3.85).flying(),
            Oracle => KindProfile::ground(3.0, 3.0, 4.0, 0.0, 100.0, 60.0, 5.6).flying().energy(),
            Carrier => KindProfile::ground(8.0, 6.0, 8.0, 8.0, 300.0, 150.0, 2.62).flying(),
            Tempest => KindProfile::ground(6.0, 5.0, 10.0, 14.0, 150.0, 125.0, 3.15).flying(),
            Nexus => KindProfile::building(0.0, 0.0, 0.0, 1000.0, 1000.0),
            Pylon => KindProfile::building(0.0, 0.0, 0.0, 200.0, 200.0),
            Gateway => KindProfile::building(0.0, 0.0, 0.0, 500.0, 500.0),
            PhotonCannon => KindProfile::building(3.0, 7.0, 7.0, 150.0, 150.0),
            ShieldBattery => KindProfile::building(1.0, 0.0, 0.0, 150.0, 150.0).energy(),

            Scv => KindProfile::ground(0.5, 1.0, 0.1, 0.0, 45.0, 0.0, 3.94),
            Mule => KindProfile::ground(0.0, 0.0, 0.0, 0.0, 60.0, 0.0, 3.94),
            Marine => KindProfile::ground(1.0, 1.0, 5.0, 5.0, 45.0, 0.0, 3.15),
            Marauder => KindProfile::ground(2.0, 2.0, 6.0, 0.0, 125.0, 0.0, 3.15),
            Reaper => KindProfile::ground(1.5, 1.0, 5.0, 0.0, 60.0, 0.0, 5.25),
            Ghost => KindProfile::ground(3.0, 2.0, 6.0, 6.0, 100.0, 0.0, 3.94).energy(),
            Hellion => KindProfile::ground(1.5, 2.0, 5.0, 0.0, 90.0, 0.0, 5.95),
            Hellbat => KindProfile::ground(2.0, 2.0, 2.0, 0.0, 135.0, 0.0, 3.15),
            SiegeTank => KindProfile::ground(4.0, 3.0, 7.0, 0.0, 175.0, 0.0, 3.15),
            SiegeTankSieged => KindProfile::ground(4.0, 3.0, 13.0, 0.0, 175.0, 0.0, 0.0),
            Cyclone => KindProfile::ground(3.0, 3.0, 5.0, 5.0, 120.0, 0.0, 4.13),
            Thor => KindProfile::ground(6.0, 6.0, 7.0, 10.0, 400.0, 0.0, 2.62),
            WidowMine => KindProfile::ground(2.0, 2.0, 5.0, 5.0, 90.0, 0.0, 3.94),
            Viking => KindProfile::ground(2.5, 2.0, 0.0, 9.0, 135.0, 0.0, 3.85).flying(),
            Medivac => KindProfile::ground(1.5, 2.0, 0.0, 0.0, 150.0, 0.0, 3.5).flying().energy(),
            Liberator => KindProfile::ground(3.0, 3.0, 0.0, 5.0, 180.0, 0.0, 4.72).flying(),
            LiberatorSieged => KindProfile::ground(3.0, 3.0, 10.0, 0.0, 180.0, 0.0, 0.0).flying(),
            Banshee => KindProfile::ground(3.0, 3.0, 6.0, 0.0, 140.0, 0.0, 3.85).flying().energy(),
            Raven => KindProfile::ground(2.0, 2.0, 0.0, 0.0, 140.0, 0.0, 3.85).flying().energy(),
            Battlecruiser => KindProfile::ground(8.0, 6.0, 6.0, 6.0, 550.0, 0.0, 2.62).flying(),
            CommandCenter => KindProfile::building(0.0, 0.0, 0.0, 1500.0, 0.0),
            OrbitalCommand => KindProfile::building(0.0, 0.0, 0.0, 1500.0, 0.0).energy(),
            SupplyDepot => KindProfile::building(0.0, 0.0, 0.0, 400.0, 0.0),
            Barracks => KindProfile::building(0.0, 0.0, 0.0, 1000.0, 0.0),
            Bunker => KindProfile::building(3.0, 6.0, 6.0, 400.0, 0.0),
            MissileTurret => KindProfile::building(2.0, 0.0, 7.0, 250.0, 0.0),

            Drone => KindProfile::ground(0.5, 1.0, 0.1, 0.0, 40.0, 0.0, 3.94),
            Zergling => KindProfile::ground(1.0, 0.5, 0.1, 0.0, 35.0, 0.0, 4.13),
            Baneling => KindProfile::ground(1.5, 0.5, 0.25, 0.0, 30.0, 0.0, 3.5),
            Queen => KindProfile::ground(2.0, 2.0, 5.0, 7.0, 175.0, 0.0, 1.31).energy(),
            Roach => KindProfile::ground(2.0, 2.0, 4.0, 0.0, 145.0, 0.0, 3.15),
            Ravager => KindProfile::ground(3.0, 3.0, 6.0, 0.0, 120.0, 0.0, 3.85),
            Hydralisk => KindProfile::ground(2.5, 2.0, 5.0, 5.0, 90.0, 0.0, 3.15),
            Lurker => KindProfile::ground(4.0, 3.0, 0.0, 0.0, 200.0, 0.0, 4.13),
            LurkerBurrowed => KindProfile::ground(4.0, 3.0, 8.0, 0.0, 200.0, 0.0, 0.0),
            Mutalisk => KindProfile::ground(2.5, 2.0, 3.0, 3.0, 120.0, 0.0, 5.6).flying(),
            Corruptor => KindProfile::ground(3.0, 2.0, 0.0, 6.0, 200.0, 0.0, 4.72).flying(),
            Infestor => KindProfile::ground(3.0, 2.0, 0.0, 0.0, 90.0, 0.0, 3.15).energy(),
            SwarmHost => KindProfile::ground(3.0, 3.0, 0.0, 0.0, 160.0, 0.0, 3.15),
            Locust => KindProfile::ground(0.0, 0.0, 3.0, 0.0, 50.0, 0.0, 2.62),
            Ultralisk => KindProfile::ground(6.0, 6.0, 1.0, 0.0, 500.0, 0.0, 4.13),
            BroodLord => KindProfile::ground(6.0, 4.0, 10.0, 0.0, 225.0, 0.0, 1.97).flying(),
            Broodling => KindProfile::ground(0.0, 0.0, 0.1, 0.0, 30.0, 0.0, 5.37),
            Viper => KindProfile::ground(3.0, 3.0, 0.0, 0.0, 150.0, 0.0, 4.13).flying().energy(),
            Overlord => KindProfile::ground(0.0, 0.0, 0.0, 0.0, 200.0, 0.0, 0.9).flying(),
            Overseer => KindProfile::ground(0.5, 0.0, 0.0, 0.0, 200.0, 0.0, 2.62).flying().energy(),
            Larva | Egg | CreepTumor => KindProfile::inert(25.0),
            Changeling => KindProfile::ground(0.0, 0.0, 0.0, 0.0, 5.0, 0.0, 3.15),
            Hatchery | Lair | Hive => KindProfile::building(0.0, 0.0, 0.0, 1500.0, 0.0),
            SpawningPool => KindProfile::building(0.0, 0.0, 0.0, 1000.0, 0.0),
            SpineCrawler => KindProfile::building(3.0, 7.0, 0.0, 300.0, 0.0),
            SporeCrawler => KindProfile::building(2.0, 0.0, 7.0, 400.0, 0.0),

            Other => KindProfile::ground(1.0, 1.0, 0.0, 0.0, 100.0, 0.0, 3.0),
        }
    }

    pub fn army_value(&self) -> f32 {
        self.profile().army_value
    }

    pub fn supply(&self) -> f32 {
        self.profile().supply
    }

    pub fn is_worker(&self) -> bool {
        matches!(self, UnitKind::Probe | UnitKind::Scv | UnitKind::Drone)
    }

    pub fn is_townhall(&self) -> bool {
        matches!(
            self,
            UnitKind::Nexus
                | UnitKind::CommandCenter
                | UnitKind::OrbitalCommand
                | UnitKind::Hatchery
                | UnitKind::Lair
                | UnitKind::Hive
        )
    }

    pub fn is_structure(&self) -> bool {
        self.is_townhall()
            || matches!(
                self,
                UnitKind::Pylon
                    | UnitKind::Gateway
                    | UnitKind::PhotonCannon
                    | UnitKind::ShieldBattery
                    | UnitKind::SupplyDepot
                    | UnitKind::Barracks
                    | UnitKind::Bunker
                    | UnitKind::MissileTurret
                    | UnitKind::SpawningPool
                    | UnitKind::SpineCrawler
                    | UnitKind::SporeCrawler
                    | UnitKind::CreepTumor
            )
    }

    /// Fast, fragile raiders that hit economy rather than armies
    pub fn is_harasser(&self) -> bool {
        matches!(
            self,
            UnitKind::Reaper
                | UnitKind::Adept
                | UnitKind::Oracle
                | UnitKind::Hellion
                | UnitKind::Banshee
                | UnitKind::LiberatorSieged
        )
    }

    /// Focus-fire targets for the micro dispatcher
    pub fn is_priority_target(&self) -> bool {
        matches!(
            self,
            UnitKind::SiegeTank | UnitKind::SiegeTankSieged | UnitKind::Colossus
        )
    }

    /// Entrenched units the fight estimate underrates
    pub fn is_siege(&self) -> bool {
        matches!(
            self,
            UnitKind::SiegeTank
                | UnitKind::SiegeTankSieged
                | UnitKind::LiberatorSieged
                | UnitKind::LurkerBurrowed
        )
    }

    /// Units that place a delayed splash and need a fire position
    pub fn is_splash_caster(&self) -> bool {
        matches!(self, UnitKind::Disruptor)
    }

    /// Combat-irrelevant units never targeted or counted
    pub fn is_ignored(&self) -> bool {
        matches!(
            self,
            UnitKind::Egg
                | UnitKind::Larva
                | UnitKind::CreepTumor
                | UnitKind::Mule
                | UnitKind::Overlord
                | UnitKind::Overseer
                | UnitKind::Locust
                | UnitKind::AdeptPhaseShift
                | UnitKind::Changeling
                | UnitKind::Broodling
        )
    }

    /// Collision radius
    pub fn radius(&self) -> f32 {
        if self.is_townhall() {
            2.75
        } else if self.is_structure() {
            1.25
        } else {
            match self {
                UnitKind::Thor
                | UnitKind::Ultralisk
                | UnitKind::Colossus
                | UnitKind::Carrier
                | UnitKind::Battlecruiser
                | UnitKind::Tempest
                | UnitKind::Archon => 1.0,
                _ => 0.5,
            }
        }
    }
}
