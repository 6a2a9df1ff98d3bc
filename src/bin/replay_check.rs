//! Replay Determinism Checker
//!
//! Plays a seeded skirmish twice, once with players updated in parallel and
//! once sequentially, and fails if the two command streams differ.

use clap::Parser;
use skirmish_ai::ai::Difficulty;
use skirmish_ai::core::{load_config, AiConfig, AiError, Result};
use skirmish_ai::scenario::{run_skirmish, ScenarioConfig, TickRecord};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{info, warn};

/// Replay Determinism Checker - compares command streams across runs
#[derive(Parser, Debug)]
#[command(name = "replay_check")]
#[command(about = "Run a seeded skirmish twice and verify identical AI commands")]
struct Args {
    /// Scenario seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Ticks to simulate per run
    #[arg(long, default_value_t = 1800)]
    ticks: u64,

    /// Number of AI players
    #[arg(long, default_value_t = 2)]
    players: u8,

    /// Difficulty for every player: dummy, easy, medium or hard
    #[arg(long, default_value = "hard")]
    difficulty: String,

    /// Configuration name (loaded from data/ai/); built-in defaults if omitted
    #[arg(long)]
    config: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("skirmish_ai=info")),
        )
        .init();

    let args = Args::parse();
    let difficulty = Difficulty::from_key(&args.difficulty).ok_or_else(|| {
        AiError::InvalidConfig(format!("unknown difficulty '{}'", args.difficulty))
    })?;
    let ai_config = match &args.config {
        Some(name) => load_config(name)?,
        None => AiConfig::default(),
    };
    let scenario = ScenarioConfig {
        seed: args.seed,
        players: args.players,
        ..ScenarioConfig::default()
    };

    info!(seed = args.seed, ticks = args.ticks, %difficulty, "starting replay check");

    let (_, parallel) = run_skirmish(&scenario, difficulty, &ai_config, args.ticks, true);
    let (_, sequential) = run_skirmish(&scenario, difficulty, &ai_config, args.ticks, false);

    if let Some(tick) = first_divergence(&parallel, &sequential) {
        warn!(tick, "command streams diverged");
        return Err(AiError::Nondeterministic {
            tick,
            detail: format!(
                "{} vs {} command ticks recorded",
                parallel.len(),
                sequential.len()
            ),
        });
    }

    let a = digest(&parallel)?;
    let b = digest(&sequential)?;
    if a != b {
        return Err(AiError::Nondeterministic {
            tick: args.ticks,
            detail: format!("digest {:016x} vs {:016x}", a, b),
        });
    }

    let commands: usize = parallel
        .iter()
        .flat_map(|r| r.issued.iter())
        .map(|p| p.commands.len())
        .sum();
    println!(
        "deterministic: {} ticks, {} commands, digest {:016x}",
        args.ticks, commands, a
    );
    Ok(())
}

fn first_divergence(a: &[TickRecord], b: &[TickRecord]) -> Option<u64> {
    a.iter()
        .zip(b.iter())
        .find(|(x, y)| x != y)
        .map(|(x, _)| x.tick)
        .or_else(|| match a.len().cmp(&b.len()) {
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Less => b.get(a.len()).map(|r| r.tick),
            std::cmp::Ordering::Greater => a.get(b.len()).map(|r| r.tick),
        })
}

fn digest(records: &[TickRecord]) -> Result<u64> {
    let json = serde_json::to_string(records)?;
    let mut hasher = DefaultHasher::new();
    json.hash(&mut hasher);
    Ok(hasher.finish())
}
