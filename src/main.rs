//! Runs a scripted AI-vs-AI battle from a scenario file.

use anyhow::{Context, Result};
use clap::Parser;
use pokemon_battle_core::{
    Battle, BattleConfig, BattleOutcome, Behavior, ConsoleSink, NullSink, PresentationSink, Scenario, ScoringAI, StaticDatabase,
    TurnPhase,
};
use pokemon_battle_core::battle::logic::rng_from_config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Battle simulator
#[derive(Parser, Debug)]
#[command(name = "battle-sim")]
#[command(about = "Simulates a battle between two AI-controlled banks", long_about = None)]
#[command(version)]
struct Cli {
    /// Static database (RON)
    #[arg(long, default_value = "data/database.ron")]
    database: PathBuf,

    /// Scenario with the banks to field (RON)
    #[arg(long, default_value = "data/scenario.ron")]
    scenario: PathBuf,

    /// Battle config overriding the scenario's (RON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed overriding the config's
    #[arg(long)]
    seed: Option<u64>,

    /// Print the event log and final report as JSON instead of battle text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let db = StaticDatabase::load(&cli.database)
        .with_context(|| format!("loading database {}", cli.database.display()))?;
    let scenario = Scenario::load(&cli.scenario)
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;
    let mut config = match &cli.config {
        Some(path) => BattleConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => scenario.config.clone(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let sink: Box<dyn PresentationSink> = if cli.json {
        Box::new(NullSink)
    } else {
        Box::new(ConsoleSink::default())
    };
    let rng = rng_from_config(&config);
    let mut battle = Battle::new(Arc::new(db), config, &scenario.banks, rng, sink)?;

    let ai = ScoringAI::new();
    while !battle.is_over() {
        for position in battle.replacements_needed() {
            if let Some(party_index) = ai.choose_replacement(battle.logic(), position) {
                battle.replace_fainted(position, party_index)?;
            }
        }
        for bank in 0..battle.logic().banks().len() as u8 {
            for action in ai.decide_actions(battle.logic(), bank) {
                if let Err(e) = battle.submit(action) {
                    warn!(bank, error = %e, "AI chose an invalid action");
                }
            }
        }
        if battle.missing_actions() > 0 {
            warn!(missing = battle.missing_actions(), "no legal actions left; ending in a draw");
            battle.abort(BattleOutcome::Draw)?;
            break;
        }
        while battle.run_round()? == TurnPhase::TurnBlocked {
            battle.acknowledge_animation()?;
        }
    }

    let events = battle.logic().events().events().to_vec();
    let report = battle.finish();
    info!(outcome = ?report.outcome, turns = report.turns, "simulation complete");

    if cli.json {
        let output = serde_json::json!({ "events": events, "report": report });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Result: {:?} after {} turns", report.outcome, report.turns);
    }
    Ok(())
}
