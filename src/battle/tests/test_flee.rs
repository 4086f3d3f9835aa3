use super::common::*;
use crate::battle::actions::{Action, FleeKind};
use crate::battle::engine::{Battle, TurnPhase};
use crate::battle::state::{BattleEvent, BattleOutcome};
use pretty_assertions::assert_eq;

fn wild(player_species: &str, wild_species: &str) -> Battle {
    let mut config = config();
    config.wild_battle = true;
    TestBattle::singles(
        vec![pokemon(player_species, 50, &["splash"])],
        vec![pokemon(wild_species, 50, &["splash"])],
    )
    .with_config(config)
    .build()
}

fn run_away() -> Action {
    Action::Flee {
        bank: 0,
        kind: FleeKind::Player,
    }
}

#[test]
fn test_faster_side_always_escapes() {
    let mut battle = wild("pikachu", "snorlax");

    let phase = play_round(&mut battle, vec![run_away(), attack(FOE_LEAD, 0)]);

    assert_eq!(phase, TurnPhase::BattleOver(BattleOutcome::Flee));
    let events = last_round_events(&battle);
    assert!(events.contains(&BattleEvent::FleeSucceeded { bank: 0 }));
    // The wild side never got to act.
    assert!(move_order(&events).is_empty());
}

#[test]
fn test_slower_side_escapes_as_attempts_add_up() {
    // Odds out of 256 are 82, 112 and then 142 against a neutral roll of 125.
    let mut battle = wild("snorlax", "pikachu");

    for _ in 0..2 {
        let phase = play_round(&mut battle, vec![run_away(), attack(FOE_LEAD, 0)]);
        assert_eq!(phase, TurnPhase::AwaitingActions);
        assert!(last_round_events(&battle).contains(&BattleEvent::FleeFailed { bank: 0 }));
    }
    let phase = play_round(&mut battle, vec![run_away(), attack(FOE_LEAD, 0)]);

    assert_eq!(phase, TurnPhase::BattleOver(BattleOutcome::Flee));
    assert_eq!(battle.logic().bank(0).unwrap().flee_attempts, 3);
}

#[test]
fn test_roaming_creature_leaves_after_everyone_else() {
    let mut battle = wild("snorlax", "pikachu");

    let phase = play_round(
        &mut battle,
        vec![
            attack(PLAYER_LEAD, 0),
            Action::Flee {
                bank: 1,
                kind: FleeKind::Roaming,
            },
        ],
    );

    assert_eq!(phase, TurnPhase::BattleOver(BattleOutcome::Flee));
    let events = last_round_events(&battle);
    assert_eq!(move_order(&events), vec![PLAYER_LEAD]);
    assert!(events.contains(&BattleEvent::FleeSucceeded { bank: 1 }));
}
