//! Tactical configuration with documented constants
//!
//! All tunable thresholds are collected here with explanations of their
//! purpose and how they interact with each other. Every section is
//! `#[serde(default)]`, so a TOML profile only needs to name the values it
//! overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, TacticsError};

/// Threat scoring and the global under-attack latch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatConfig {
    // === CLUSTERING ===
    /// Radius around the enemy centroid that counts as "clustered" (world units)
    pub cluster_radius: f32,
    /// Minimum clustered units before the isolation discount is skipped
    pub cluster_min_units: usize,
    /// Radius used to find the dense core of a threat group
    pub center_mass_radius: f32,
    /// Enemies this close to an own townhall count as a threat to it
    pub base_threat_radius: f32,
    /// Multiplier applied to total value when the group is not clustered
    ///
    /// At 0.5, two isolated raiders score the same as one massed unit.
    pub isolated_value_factor: f32,

    // === DISTANCE URGENCY ===
    /// Multiplier for a threat standing on top of a base
    pub distance_factor_max: f32,
    /// Floor for the multiplier far from any base
    pub distance_factor_min: f32,
    /// Distance over which the multiplier drops by 1.0
    ///
    /// With max 2.0 and falloff 20.0 the multiplier reaches the 0.5 floor
    /// at 30 units from the nearest base.
    pub distance_falloff: f32,

    // === DAMAGE BONUS ===
    /// Health fraction below which a structure is critical
    pub critical_structure_health: f32,
    /// Health fraction below which a worker is critical
    pub critical_worker_health: f32,
    /// Strike range around friendly structures
    pub structure_strike_range: f32,
    /// Strike range around friendly workers
    pub worker_strike_range: f32,
    pub critical_structure_bonus: f32,
    pub critical_worker_bonus: f32,
    pub damaged_structure_bonus: f32,
    pub damaged_worker_bonus: f32,
    /// Accumulated damage bonus above which the response becomes `damage`
    pub damage_bonus_threshold: f32,

    // === CLASSIFICATION ===
    /// Share of harassment-type units needed for a `harassment` response
    pub harassment_ratio: f32,
    /// Largest group that can still be treated as harassment
    pub harassment_max_units: usize,
    /// A `combat` response needs strictly more units than this
    pub combat_min_units: usize,
    /// A `combat` response needs strictly more value than this
    pub combat_min_value: f32,

    // === UNDER-ATTACK LATCH ===
    /// Threat level that sets the global under-attack flag
    pub latch_high: u32,
    /// Threat level below which the flag clears
    ///
    /// The gap between high and low is the hysteresis band. Levels inside
    /// the band keep whatever state the flag already had.
    pub latch_low: u32,
    /// Set threshold while defending an early rush
    pub cheese_latch_high: u32,
    /// Clear threshold while defending an early rush
    pub cheese_latch_low: u32,
    /// Game time after which the rush thresholds no longer apply (seconds)
    pub cheese_window_seconds: f32,
    /// Minimum level that gets defenders even when the latch is clear
    pub defend_level: u32,
    /// Level that marks the main army as needed at home
    pub main_army_redirect_level: u32,
    /// A `combat` threat with more units than this also needs the main army
    pub main_army_combat_units: usize,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            cluster_radius: 5.0,
            cluster_min_units: 3,
            center_mass_radius: 10.0,
            base_threat_radius: 18.0,
            isolated_value_factor: 0.5,

            distance_factor_max: 2.0,
            distance_factor_min: 0.5,
            distance_falloff: 20.0,

            critical_structure_health: 0.5,
            critical_worker_health: 0.3,
            structure_strike_range: 3.0,
            worker_strike_range: 2.0,
            critical_structure_bonus: 3.0,
            critical_worker_bonus: 2.0,
            damaged_structure_bonus: 1.5,
            damaged_worker_bonus: 1.0,
            damage_bonus_threshold: 2.0,

            harassment_ratio: 0.8,
            harassment_max_units: 6,
            combat_min_units: 3,
            combat_min_value: 10.0,

            latch_high: 5,
            latch_low: 2,
            cheese_latch_high: 2,
            cheese_latch_low: 1,
            cheese_window_seconds: 180.0,
            defend_level: 3,
            main_army_redirect_level: 8,
            main_army_combat_units: 8,
        }
    }
}

/// Enemy army observation quality
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelConfig {
    /// Freshness at or above which normal attack bars apply
    pub fresh_threshold: f32,
    /// Freshness below which the army never initiates an attack
    ///
    /// Between stale and fresh the army only attacks on an emphatic
    /// victory estimate.
    pub stale_threshold: f32,
    /// Age at which a remembered unit contributes zero freshness (seconds)
    pub memory_horizon_seconds: f32,
    /// Units seen more recently than this count as visible (seconds)
    pub visible_age_seconds: f32,
    /// Scouting urgency gained per tick while intel is stale
    pub urgency_build: f32,
    /// Scouting urgency lost per tick otherwise
    pub urgency_decay: f32,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            fresh_threshold: 0.7,
            stale_threshold: 0.3,
            memory_horizon_seconds: 30.0,
            visible_age_seconds: 3.0,
            urgency_build: 0.02,
            urgency_decay: 0.005,
        }
    }
}

/// Attack/retreat state machine and defensive anchor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StanceConfig {
    /// Minimum time an attack is held once commenced (seconds)
    ///
    /// Estimates flicker as units enter and leave vision. Without this
    /// window the army would turn around mid-fight on a single bad tick.
    pub commitment_seconds: f32,
    /// Own supply must be at least enemy supply times this when siege units are present
    pub siege_supply_ratio: f32,
    /// Supply at which the army attacks regardless of the estimate
    pub max_supply: f32,
    /// Minimum time between defensive anchor changes (seconds)
    pub anchor_cooldown_seconds: f32,
    /// Offset from a base toward the enemy when anchoring
    pub anchor_offset: f32,
    /// Offset from the gatekeeper position when anchoring there
    pub gatekeeper_offset: f32,
    /// Own structures within this distance of the natural mean it is taken
    pub natural_structure_radius: f32,
}

impl Default for StanceConfig {
    fn default() -> Self {
        Self {
            commitment_seconds: 20.0,
            siege_supply_ratio: 1.5,
            max_supply: 199.0,
            anchor_cooldown_seconds: 15.0,
            anchor_offset: 3.0,
            gatekeeper_offset: 4.0,
            natural_structure_radius: 20.0,
        }
    }
}

/// Attack target cascade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    /// Previous target is kept while a valid structure stays this close to it
    pub sticky_tolerance: f32,
    /// Squared distance from army centroid that locks onto a structure target
    pub proximity_sticky_distance_sq: f32,
    /// Minimum visible enemy army supply worth chasing
    pub enemy_army_min_supply: f32,
    /// Radius around the enemy centroid used for the density check
    pub enemy_cluster_radius: f32,
    /// Minimum supply inside that radius
    pub enemy_cluster_min_supply: f32,
    /// A visible base with no mineral field this close is considered empty
    pub empty_base_mineral_radius: f32,
    /// Before this game time the enemy spawn is the last resort target (seconds)
    pub enemy_spawn_cutoff_seconds: f32,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            sticky_tolerance: 5.0,
            proximity_sticky_distance_sq: 450.0,
            enemy_army_min_supply: 6.0,
            enemy_cluster_radius: 11.5,
            enemy_cluster_min_supply: 7.0,
            empty_base_mineral_radius: 12.0,
            enemy_spawn_cutoff_seconds: 240.0,
        }
    }
}

/// Defensive force allocation and release
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseConfig {
    /// Allocated value aims for threat value times this margin
    pub value_margin: f32,
    /// Floor on the allocated value target
    pub min_value_target: f32,
    /// Sort bias toward valuable units (subtracted from squared distance)
    pub value_preference: f32,
    /// No more defenders once committed value exceeds threat value times this
    pub escalation_cap: f32,
    /// Hard cap on defenders sent to one threat
    pub max_defenders_per_threat: usize,
    /// Consecutive quiet ticks before defenders return to the army
    pub release_quiet_ticks: u32,
    /// Clustering radius for defender squads
    pub defender_squad_radius: f32,
}

impl Default for DefenseConfig {
    fn default() -> Self {
        Self {
            value_margin: 1.1,
            min_value_target: 2.0,
            value_preference: 0.1,
            escalation_cap: 1.5,
            max_defenders_per_threat: 8,
            release_quiet_ticks: 8,
            defender_squad_radius: 6.0,
        }
    }
}

/// Squad movement and per-unit micro
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroConfig {
    /// Ground range at or below which a unit fights as melee
    pub melee_range_threshold: f32,
    /// Radius around each squad member searched for enemies
    pub enemy_detection_range: f32,
    /// Clustering radius for attacking squads
    pub attacking_squad_radius: f32,
    /// Own units this close to a squad are part of its fight estimate
    pub squad_engage_radius: f32,
    /// Enemy structures this close to an idle squad get attacked
    pub structure_attack_range: f32,
    /// Distance a unit steps back while its weapon cools down
    pub stutter_distance: f32,

    // === COHESION ===
    /// Squads farther than this from their destination move in formation
    pub cohesion_engage_distance: f32,
    /// Units further ahead of the centroid than this wait
    pub cohesion_lead_distance: f32,
    /// Units further from the centroid than this wait
    pub cohesion_spread_distance: f32,
    /// How far behind the squad centroid splash casters trail
    pub caster_trail_offset: f32,

    /// Height difference that makes a hidden target "uphill"
    pub blind_uphill_height: f32,

    // === SPLASH CASTER ===
    pub nova_cast_range: f32,
    pub nova_radius: f32,
    /// Radius around a recent cast where no second cast is placed
    pub nova_exclusion_radius: f32,
    /// How long a cast blocks its exclusion zone (seconds)
    pub nova_exclusion_seconds: f32,
    /// Weight of friendly value relative to enemy value in the fire field
    pub nova_friendly_weight: f32,
    /// Minimum field value worth a cast
    pub nova_min_value: f32,
}

impl Default for MicroConfig {
    fn default() -> Self {
        Self {
            melee_range_threshold: 3.0,
            enemy_detection_range: 12.0,
            attacking_squad_radius: 9.0,
            squad_engage_radius: 15.0,
            structure_attack_range: 12.0,
            stutter_distance: 1.5,

            cohesion_engage_distance: 7.0,
            cohesion_lead_distance: 6.0,
            cohesion_spread_distance: 8.0,
            caster_trail_offset: 3.0,

            blind_uphill_height: 1.0,

            nova_cast_range: 15.0,
            nova_radius: 1.5,
            nova_exclusion_radius: 3.0,
            nova_exclusion_seconds: 2.1,
            nova_friendly_weight: 2.0,
            nova_min_value: 3.0,
        }
    }
}

/// Per-squad engagement memory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    /// Entries untouched for this many ticks are dropped
    ///
    /// Squad ids churn as squads merge and split, so the map would grow
    /// without bound otherwise. 224 ticks is ten seconds of game time.
    pub eviction_ticks: u64,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self { eviction_ticks: 224 }
    }
}

/// Complete tactical configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TacticsConfig {
    /// Name of this profile (set from filename)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub threat: ThreatConfig,
    #[serde(default)]
    pub intel: IntelConfig,
    #[serde(default)]
    pub stance: StanceConfig,
    #[serde(default)]
    pub targeting: TargetingConfig,
    #[serde(default)]
    pub defense: DefenseConfig,
    #[serde(default)]
    pub micro: MicroConfig,
    #[serde(default)]
    pub hysteresis: HysteresisConfig,
}

impl Default for TacticsConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            threat: ThreatConfig::default(),
            intel: IntelConfig::default(),
            stance: StanceConfig::default(),
            targeting: TargetingConfig::default(),
            defense: DefenseConfig::default(),
            micro: MicroConfig::default(),
            hysteresis: HysteresisConfig::default(),
        }
    }
}

impl TacticsConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: TacticsConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&contents)?;
        if config.name.is_empty() {
            config.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.intel.stale_threshold >= self.intel.fresh_threshold {
            return Err(TacticsError::InvalidConfig(format!(
                "stale_threshold ({}) should be < fresh_threshold ({})",
                self.intel.stale_threshold, self.intel.fresh_threshold
            )));
        }

        if self.threat.latch_low >= self.threat.latch_high
            || self.threat.cheese_latch_low >= self.threat.cheese_latch_high
        {
            return Err(TacticsError::InvalidConfig(
                "latch low thresholds must be below their high thresholds".into(),
            ));
        }

        let radii = [
            self.threat.cluster_radius,
            self.threat.distance_falloff,
            self.micro.enemy_detection_range,
            self.micro.attacking_squad_radius,
            self.defense.defender_squad_radius,
            self.targeting.enemy_cluster_radius,
            self.intel.memory_horizon_seconds,
        ];
        if radii.iter().any(|&r| r <= 0.0) {
            return Err(TacticsError::InvalidConfig(
                "radii and horizons must be positive".into(),
            ));
        }

        if self.defense.escalation_cap < 1.0 {
            return Err(TacticsError::InvalidConfig(format!(
                "escalation_cap ({}) should be >= 1.0",
                self.defense.escalation_cap
            )));
        }

        if self.defense.max_defenders_per_threat == 0 {
            return Err(TacticsError::InvalidConfig(
                "max_defenders_per_threat must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// Load a named profile
///
/// Loads from `data/tactics/{name}.toml`
pub fn load_profile(name: &str) -> Result<TacticsConfig> {
    let mut config = TacticsConfig::load(&profile_path(name))?;
    config.name = name.to_string();
    Ok(config)
}

/// Get path to profile file
fn profile_path(name: &str) -> PathBuf {
    PathBuf::from("data/tactics").join(format!("{}.toml", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TacticsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TacticsConfig::from_toml_str(
            r#"
            [stance]
            commitment_seconds = 30.0
            "#,
        )
        .unwrap();
        assert_eq!(config.stance.commitment_seconds, 30.0);
        assert_eq!(config.stance.anchor_cooldown_seconds, 15.0);
        assert_eq!(config.intel.fresh_threshold, 0.7);
    }

    #[test]
    fn test_inverted_freshness_rejected() {
        let result = TacticsConfig::from_toml_str(
            r#"
            [intel]
            fresh_threshold = 0.2
            stale_threshold = 0.5
            "#,
        );
        assert!(matches!(result, Err(TacticsError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let result = TacticsConfig::from_toml_str("[stance\ncommitment_seconds = ");
        assert!(matches!(result, Err(TacticsError::ConfigParse(_))));
    }

    #[test]
    fn test_inverted_latch_rejected() {
        let mut config = TacticsConfig::default();
        config.threat.latch_low = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_default_profile() {
        let config = load_profile("default").expect("Should load default profile");
        assert_eq!(config.name, "default");
        assert!(config.intel.stale_threshold < config.intel.fresh_threshold);
    }

    #[test]
    fn test_load_aggressive_profile() {
        let config = load_profile("aggressive").expect("Should load aggressive profile");
        let default = TacticsConfig::default();
        assert!(config.stance.commitment_seconds > default.stance.commitment_seconds);
        assert!(config.intel.fresh_threshold < default.intel.fresh_threshold);
    }
}
