use super::common::*;
use crate::battle::actions::Action;
use crate::battle::state::{BattleEvent, BattleOutcome};
use crate::errors::{ActionError, BattleEngineError};
use pretty_assertions::assert_eq;
use schema::{DbSymbol, PokemonType};

fn charizard_battle() -> crate::battle::engine::Battle {
    TestBattle::singles(
        vec![pokemon("charizard", 50, &["ember", "splash"]).with_item("charizardite_y")],
        vec![pokemon("snorlax", 50, &["splash"])],
    )
    .build()
}

#[test]
fn test_mega_evolution_happens_before_attacks() {
    let mut battle = charizard_battle();

    play_round(
        &mut battle,
        vec![attack(FOE_LEAD, 0), attack(PLAYER_LEAD, 0), Action::Mega { user: PLAYER_LEAD }],
    );

    let events = last_round_events(&battle);
    let evolved = events
        .iter()
        .position(|event| matches!(event, BattleEvent::MegaEvolved { .. }))
        .unwrap();
    let first_move = events
        .iter()
        .position(|event| matches!(event, BattleEvent::MoveUsed { .. }))
        .unwrap();
    assert!(evolved < first_move);

    let charizard = battle.logic().battler(PLAYER_LEAD);
    assert!(charizard.mega_evolved);
    assert_eq!(charizard.name, "Mega Charizard Y");
    assert_eq!(charizard.types, vec![PokemonType::Fire, PokemonType::Flying]);
    assert_eq!(charizard.ability, Some(DbSymbol::from("drought")));
    assert!(battle.logic().bank(0).unwrap().mega_used);
}

#[test]
fn test_mega_is_once_per_battle() {
    let mut battle = charizard_battle();
    play_round(
        &mut battle,
        vec![Action::Mega { user: PLAYER_LEAD }, attack(PLAYER_LEAD, 1), attack(FOE_LEAD, 0)],
    );

    assert_eq!(
        battle.submit(Action::Mega { user: PLAYER_LEAD }).unwrap_err(),
        BattleEngineError::Action(ActionError::MegaUnavailable)
    );
}

#[test]
fn test_mega_needs_the_stone() {
    let mut battle = TestBattle::singles(
        vec![pokemon("charizard", 50, &["ember"]).with_item("leftovers")],
        vec![pokemon("snorlax", 50, &["splash"])],
    )
    .build();

    assert_eq!(
        battle.submit(Action::Mega { user: PLAYER_LEAD }).unwrap_err(),
        BattleEngineError::Action(ActionError::MegaUnavailable)
    );
}

#[test]
fn test_finish_rolls_the_form_back() {
    let mut battle = charizard_battle();
    let max_hp = battle.logic().battler(PLAYER_LEAD).max_hp();
    play_round(
        &mut battle,
        vec![Action::Mega { user: PLAYER_LEAD }, attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)],
    );
    battle.abort(BattleOutcome::Draw).unwrap();

    let report = battle.finish();

    assert_eq!(report.outcome, Some(BattleOutcome::Draw));
    assert_eq!(report.turns, 1);
    let record = &report.parties[0][0];
    assert_eq!(record.item, Some(DbSymbol::from("charizardite_y")));
    assert_eq!(record.ability, None);
    assert_eq!(record.current_hp, Some(max_hp));
    // One PP of ember was spent and persists.
    assert_eq!(record.moves[0].pp_used, 1);
}
