// In: src/lib.rs

//! Pokemon Battle Core
//!
//! A turn-based battle engine: battlers, hook-driven effects, ordered
//! actions and a resumable turn executor. Static data is loaded once from
//! RON (or a postcard snapshot) and every random draw goes through one
//! injectable RNG, so battles replay deterministically from a seed.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod config;
pub mod database;
pub mod errors;
pub mod pokemon;
pub mod scenario;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    AbilityData, BaseStats, CreatureData, DbSymbol, ItemData, MegaForm, MoveCategory, MoveData, MoveTarget,
    PokemonType, StatType, StatusType,
};

// --- From this crate's modules (`src/`) ---

// Turn executor and the state it drives.
pub use battle::actions::{Action, FleeKind, TargetSpec};
pub use battle::ai::{Behavior, ScoringAI};
pub use battle::bank::BankSetup;
pub use battle::battler::{Battler, BattlerId, Position};
pub use battle::engine::{Battle, BattleReport, TurnPhase};
pub use battle::logic::Logic;
pub use battle::presentation::{ConsoleSink, NullSink, PresentationSink, RecordingSink};
pub use battle::rng::{BattleRng, ScriptedRng, SeededRng};
pub use battle::state::{BattleEvent, BattleOutcome, EventBus};

// Setup.
pub use config::BattleConfig;
pub use database::StaticDatabase;
pub use pokemon::{PokemonRecord, StatusCondition};
pub use scenario::Scenario;

// Crate-specific error and result types.
pub use errors::{
    ActionError, BattleEngineError, BattleResult, BattleStateError, DataError, DataResult, InvariantViolation,
};
