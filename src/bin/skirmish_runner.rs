//! Headless Skirmish Runner
//!
//! Drives the tactics engine against a seeded sandbox skirmish and prints a
//! summary of what it decided.

use std::path::PathBuf;

use army_tactics::core::config::{load_profile, TacticsConfig};
use army_tactics::sandbox::{SandboxWorld, Skirmish, SkirmishSettings, ValueRatioEstimator};
use army_tactics::tactics::{Services, Stance, TacticsEngine};
use army_tactics::units::RoleRegistry;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Headless Skirmish Runner - exercise the tactics engine end to end
#[derive(Parser, Debug)]
#[command(name = "skirmish_runner")]
#[command(about = "Run the tactics engine against a sandbox skirmish")]
struct Args {
    /// Tactics profile name (loaded from data/tactics/)
    #[arg(long, default_value = "default")]
    profile: String,

    /// Explicit config file, overrides --profile
    #[arg(long)]
    config: Option<PathBuf>,

    /// Own army size
    #[arg(long, default_value_t = 12)]
    own_army: usize,

    /// Enemy army size
    #[arg(long, default_value_t = 10)]
    enemy_army: usize,

    /// Game time at which the enemy pushes (seconds)
    #[arg(long, default_value_t = 240.0)]
    enemy_push: f32,

    /// Maximum engine ticks before stopping
    #[arg(long, default_value_t = 4000)]
    max_ticks: u64,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Log every stance transition and dispatch
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// One stance change
#[derive(Serialize)]
struct Transition {
    tick: u64,
    time: f32,
    decision: String,
}

/// JSON output structure
#[derive(Serialize)]
struct SkirmishResult {
    outcome: String,
    ticks: u64,
    game_seconds: f32,
    own_army_alive: usize,
    enemy_army_alive: usize,
    own_lost: usize,
    enemy_lost: usize,
    transitions: Vec<Transition>,
    defenders_dispatched: usize,
    defenders_released: usize,
    commands_issued: usize,
    degraded_ticks: usize,
    profile: String,
    seed: u64,
}

fn load_config(args: &Args) -> TacticsConfig {
    let loaded = match &args.config {
        Some(path) => TacticsConfig::load(path),
        None => load_profile(&args.profile),
    };
    loaded.unwrap_or_else(|e| {
        tracing::warn!("Failed to load tactics config: {}. Using defaults", e);
        TacticsConfig::default()
    })
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);
    let config = load_config(&args);
    let profile = config.name.clone();

    let settings = SkirmishSettings {
        own_army: args.own_army,
        enemy_army: args.enemy_army,
        enemy_push_seconds: args.enemy_push,
        ..SkirmishSettings::default()
    };
    let mut skirmish = Skirmish::generate(seed, settings);
    let mut engine = TacticsEngine::new(config, skirmish.map().clone());
    let mut world = SandboxWorld::new(skirmish.size());
    let estimator = ValueRatioEstimator;
    let mut roles = RoleRegistry::new();

    let mut transitions = Vec::new();
    let mut last_decision: Option<&'static str> = None;
    let mut dispatched = 0;
    let mut released = 0;
    let mut commands_issued = 0;
    let mut degraded_ticks = 0;
    let mut ticks = 0;

    while ticks < args.max_ticks && !skirmish.is_decided() {
        let snapshot = skirmish.snapshot();
        world.sync(&snapshot);
        let output = {
            let mut services = Services {
                spatial: &world,
                estimator: &estimator,
                pathing: &world,
                world: &world,
                roles: &mut roles,
            };
            engine.tick(&snapshot, &mut services)
        };

        if output.degraded {
            degraded_ticks += 1;
        }
        if let Some(decision) = output.decision {
            if last_decision != Some(decision.label()) {
                tracing::info!("[{:.1}s] {} -> {}", output.time, last_decision.unwrap_or("start"), decision.label());
                last_decision = Some(decision.label());
                transitions.push(Transition {
                    tick: output.tick,
                    time: output.time,
                    decision: decision.label().to_string(),
                });
            }
        }
        dispatched += output.dispatched.len();
        released += output.released.len();
        commands_issued += output.commands.len();

        skirmish.step(&output.commands);
        ticks += 1;
    }

    let tally = skirmish.tally();
    let outcome = if tally.enemy_army_alive == 0 && tally.own_army_alive > 0 {
        "victory"
    } else if tally.own_army_alive == 0 && tally.enemy_army_alive > 0 {
        "defeat"
    } else {
        "undecided"
    };
    let final_stance = match engine.flags().attack_commenced {
        true => Stance::Attacking,
        false => Stance::NotAttacking,
    };

    let result = SkirmishResult {
        outcome: outcome.to_string(),
        ticks,
        game_seconds: skirmish.time(),
        own_army_alive: tally.own_army_alive,
        enemy_army_alive: tally.enemy_army_alive,
        own_lost: tally.own_lost,
        enemy_lost: tally.enemy_lost,
        transitions,
        defenders_dispatched: dispatched,
        defenders_released: released,
        commands_issued,
        degraded_ticks,
        profile,
        seed,
    };

    if args.format == "json" {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Failed to serialize result: {}", e),
        }
    } else {
        println!("Outcome: {} after {} ticks ({:.1}s)", result.outcome, result.ticks, result.game_seconds);
        println!(
            "Army: {} own alive ({} lost), {} enemy alive ({} lost)",
            result.own_army_alive, result.own_lost, result.enemy_army_alive, result.enemy_lost
        );
        println!("Final stance: {:?}", final_stance);
        for t in &result.transitions {
            println!("  [{:>7.1}s] {}", t.time, t.decision);
        }
        println!(
            "Defenders dispatched: {}, released: {}",
            result.defenders_dispatched, result.defenders_released
        );
        println!("Commands issued: {}, degraded ticks: {}", result.commands_issued, result.degraded_ticks);
        println!("Profile: {}, Seed: {}", result.profile, result.seed);
    }
}
