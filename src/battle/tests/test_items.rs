use super::common::*;
use crate::battle::actions::Action;
use crate::battle::effects::{EffectKind, EffectScope};
use crate::battle::engine::{Battle, TurnPhase};
use crate::battle::state::{BattleEvent, BattleOutcome};
use crate::errors::{ActionError, BattleEngineError};
use crate::pokemon::StatusCondition;
use pretty_assertions::assert_eq;
use schema::{DbSymbol, StatType};

fn with_bag(lead: crate::pokemon::PokemonRecord, item: &str) -> Battle {
    TestBattle::new(
        player(vec![lead]).with_bag_item(item, 1),
        foe(vec![pokemon("snorlax", 50, &["splash"])]),
    )
    .build()
}

fn use_item(item: &str) -> Action {
    Action::Item {
        bank: 0,
        item: DbSymbol::from(item),
        target: PLAYER_LEAD,
    }
}

fn bag_count(battle: &Battle, item: &str) -> u16 {
    battle.logic().bank(0).unwrap().item_count(&DbSymbol::from(item))
}

#[test]
fn test_potion_heals_and_is_spent() {
    let mut battle = with_bag(pokemon("snorlax", 50, &["splash"]).with_hp(100), "potion");

    play_round(&mut battle, vec![use_item("potion"), attack(FOE_LEAD, 0)]);

    assert_eq!(battle.logic().battler(PLAYER_LEAD).hp(), 120);
    assert_eq!(bag_count(&battle, "potion"), 0);
    assert!(last_round_events(&battle).contains(&BattleEvent::ItemUsed {
        bank: 0,
        item: DbSymbol::from("potion"),
        target: PLAYER_LEAD,
    }));
}

#[test]
fn test_potion_on_full_hp_is_kept() {
    let mut battle = with_bag(pokemon("snorlax", 50, &["splash"]), "potion");

    play_round(&mut battle, vec![use_item("potion"), attack(FOE_LEAD, 0)]);

    assert_eq!(bag_count(&battle, "potion"), 1);
    assert!(last_round_events(&battle).contains(&BattleEvent::ItemHadNoEffect {
        bank: 0,
        item: DbSymbol::from("potion"),
    }));
}

#[test]
fn test_full_restore_heals_and_cures() {
    let mut battle = with_bag(
        pokemon("snorlax", 50, &["splash"])
            .with_hp(50)
            .with_status(StatusCondition::Poison),
        "full_restore",
    );
    let max_hp = battle.logic().battler(PLAYER_LEAD).max_hp();

    play_round(&mut battle, vec![use_item("full_restore"), attack(FOE_LEAD, 0)]);

    let lead = battle.logic().battler(PLAYER_LEAD);
    assert_eq!(lead.hp(), max_hp);
    assert_eq!(lead.status, None);
    assert!(!battle
        .logic()
        .has_effect(EffectScope::Pokemon(PLAYER_LEAD), EffectKind::Status));
}

#[test]
fn test_x_attack_raises_attack_two_stages() {
    let mut battle = with_bag(pokemon("snorlax", 50, &["splash"]), "x_attack");

    play_round(&mut battle, vec![use_item("x_attack"), attack(FOE_LEAD, 0)]);

    assert_eq!(battle.logic().battler(PLAYER_LEAD).stage(StatType::Attack), 2);
}

#[test]
fn test_item_submission_is_checked_against_the_bag() {
    let mut battle = with_bag(pokemon("snorlax", 50, &["splash"]), "potion");

    assert_eq!(
        battle.submit(use_item("super_potion")).unwrap_err(),
        BattleEngineError::Action(ActionError::ItemNotInBag(DbSymbol::from("super_potion")))
    );
    // The item takes the bank's turn.
    battle.submit(use_item("potion")).unwrap();
    assert_eq!(
        battle.submit(attack(PLAYER_LEAD, 0)).unwrap_err(),
        BattleEngineError::Action(ActionError::DuplicateAction)
    );
}

#[test]
fn test_held_items_are_not_usable_from_the_bag() {
    let mut battle = with_bag(pokemon("snorlax", 50, &["splash"]), "leftovers");

    assert_eq!(
        battle.submit(use_item("leftovers")).unwrap_err(),
        BattleEngineError::Action(ActionError::ItemNotUsable(DbSymbol::from("leftovers")))
    );
}

#[test]
fn test_leftovers_restore_a_sixteenth_at_end_of_turn() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["splash"]).with_item("leftovers").with_hp(100)],
        vec![pokemon("snorlax", 50, &["splash"])],
    )
    .build();
    let max_hp = battle.logic().battler(PLAYER_LEAD).max_hp();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    assert_eq!(battle.logic().battler(PLAYER_LEAD).hp(), 100 + max_hp / 16);
    assert!(last_round_events(&battle).contains(&BattleEvent::HeldItemActivated {
        battler: PLAYER_LEAD,
        item: DbSymbol::from("leftovers"),
    }));
}

#[test]
fn test_focus_sash_survives_once_and_is_consumed() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["tackle"])],
        vec![
            pokemon("magikarp", 5, &["splash"]).with_item("focus_sash"),
            pokemon("magikarp", 5, &["splash"]),
        ],
    )
    .build();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    let magikarp = battle.logic().battler(FOE_LEAD);
    assert_eq!(magikarp.hp(), 1);
    assert_eq!(magikarp.item, None);
    assert!(!battle
        .logic()
        .has_effect(EffectScope::Pokemon(FOE_LEAD), EffectKind::FocusSash));

    let phase = play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);
    assert_eq!(phase, TurnPhase::AwaitingActions);
    assert!(battle.logic().battler(FOE_LEAD).is_fainted());

    // A consumed item stays gone after the battle.
    battle.abort(BattleOutcome::Draw).unwrap();
    let report = battle.finish();
    assert_eq!(report.parties[1][0].item, None);
    assert_eq!(report.parties[1][0].current_hp, Some(0));
}

#[test]
fn test_sturdy_behaves_like_an_innate_sash() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["tackle"])],
        vec![pokemon("geodude", 5, &["splash"])],
    )
    .build();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    assert_eq!(battle.logic().battler(FOE_LEAD).hp(), 1);
    assert!(last_round_events(&battle).contains(&BattleEvent::AbilityActivated {
        battler: FOE_LEAD,
        ability: DbSymbol::from("sturdy"),
    }));
}

#[test]
fn test_repeated_bag_entries_cap_instead_of_overflowing() {
    let battle = TestBattle::new(
        player(vec![pokemon("snorlax", 50, &["splash"])])
            .with_bag_item("potion", u16::MAX)
            .with_bag_item("potion", 5),
        foe(vec![pokemon("snorlax", 50, &["splash"])]),
    )
    .build();

    assert_eq!(bag_count(&battle, "potion"), u16::MAX);
}
