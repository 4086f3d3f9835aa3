use crate::battle::actions::{Action, TargetSpec};
use crate::battle::bank::BankSetup;
use crate::battle::battler::{BattlerId, Position};
use crate::battle::engine::{Battle, TurnPhase};
use crate::battle::logic::Logic;
use crate::battle::presentation::{NullSink, PresentationSink, RecordingSink};
use crate::battle::rng::{BattleRng, ScriptedRng};
use crate::battle::state::BattleEvent;
use crate::config::BattleConfig;
use crate::database::StaticDatabase;
use crate::pokemon::PokemonRecord;
use std::sync::Arc;

pub const PLAYER_LEAD: BattlerId = BattlerId { bank: 0, party_index: 0 };
pub const FOE_LEAD: BattlerId = BattlerId { bank: 1, party_index: 0 };

pub fn database() -> Arc<StaticDatabase> {
    Arc::new(StaticDatabase::from_ron_str(include_str!("../../../data/database.ron")).unwrap())
}

/// Every roll is 50: no crits, 92% damage rolls, hits at 50%+ accuracy,
/// 10-30% secondaries miss, speed ties keep submission order.
pub fn neutral_rng() -> ScriptedRng {
    ScriptedRng::new(vec![50; 2000])
}

pub fn config() -> BattleConfig {
    BattleConfig {
        seed: Some(0),
        ..BattleConfig::default()
    }
}

pub fn pokemon(species: &str, level: u8, moves: &[&str]) -> PokemonRecord {
    PokemonRecord::new(species, level, moves)
}

pub fn player(party: Vec<PokemonRecord>) -> BankSetup {
    BankSetup::new("Red", party).as_player()
}

pub fn foe(party: Vec<PokemonRecord>) -> BankSetup {
    BankSetup::new("Blue", party)
}

/// A battle builder with neutral defaults.
pub struct TestBattle {
    config: BattleConfig,
    banks: Vec<BankSetup>,
    rng: Box<dyn BattleRng>,
    sink: Box<dyn PresentationSink>,
}

impl TestBattle {
    pub fn new(player_bank: BankSetup, foe_bank: BankSetup) -> Self {
        Self {
            config: config(),
            banks: vec![player_bank, foe_bank],
            rng: Box::new(neutral_rng()),
            sink: Box::new(NullSink),
        }
    }

    pub fn singles(player_party: Vec<PokemonRecord>, foe_party: Vec<PokemonRecord>) -> Self {
        Self::new(player(player_party), foe(foe_party))
    }

    pub fn with_config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_rng(mut self, rng: impl BattleRng + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_sink(mut self, sink: impl PresentationSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn build(self) -> Battle {
        Battle::new(database(), self.config, &self.banks, self.rng, self.sink).unwrap()
    }

    /// The battle context alone, for handler-level tests.
    pub fn build_logic(self) -> Logic {
        let mut logic = Logic::new(database(), self.config, &self.banks, self.rng, self.sink).unwrap();
        logic.switch_handler().send_out_initial().unwrap();
        logic
    }
}

pub fn attack(user: BattlerId, move_index: usize) -> Action {
    Action::Attack {
        user,
        move_index,
        target: TargetSpec::Auto,
    }
}

pub fn attack_at(user: BattlerId, move_index: usize, bank: u8, slot: u8) -> Action {
    Action::Attack {
        user,
        move_index,
        target: TargetSpec::Position(Position::new(bank, slot)),
    }
}

/// Submits `actions` and runs the round to its end.
pub fn play_round(battle: &mut Battle, actions: Vec<Action>) -> TurnPhase {
    for action in actions {
        battle.submit(action).unwrap();
    }
    battle.run_round().unwrap()
}

/// Events logged since the last `TurnStarted`.
pub fn last_round_events(battle: &Battle) -> Vec<BattleEvent> {
    let events = battle.logic().events().events();
    let start = events
        .iter()
        .rposition(|event| matches!(event, BattleEvent::TurnStarted { .. }))
        .unwrap_or(0);
    events[start..].to_vec()
}

/// Users of the `MoveUsed` events in log order.
pub fn move_order(events: &[BattleEvent]) -> Vec<BattlerId> {
    events
        .iter()
        .filter_map(|event| match event {
            BattleEvent::MoveUsed { user, .. } => Some(*user),
            _ => None,
        })
        .collect()
}

pub fn recording() -> RecordingSink {
    RecordingSink::new()
}
