use super::common::*;
use crate::battle::actions::Action;
use crate::battle::rng::ScriptedRng;
use crate::battle::state::BattleEvent;
use crate::battle::effects::{EffectKind, EffectScope};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case::player_faster("pikachu", "snorlax", vec![PLAYER_LEAD, FOE_LEAD])]
#[case::foe_faster("snorlax", "pikachu", vec![FOE_LEAD, PLAYER_LEAD])]
fn test_faster_battler_moves_first(#[case] player_species: &str, #[case] foe_species: &str, #[case] expected: Vec<crate::battle::battler::BattlerId>) {
    let mut battle = TestBattle::singles(
        vec![pokemon(player_species, 50, &["tackle"])],
        vec![pokemon(foe_species, 50, &["tackle"])],
    )
    .build();

    // Foe submits first so insertion order cannot explain the result.
    play_round(&mut battle, vec![attack(FOE_LEAD, 0), attack(PLAYER_LEAD, 0)]);

    assert_eq!(move_order(&last_round_events(&battle)), expected);
}

#[test]
fn test_move_priority_beats_speed() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["quick_attack"])],
        vec![pokemon("ninjask", 50, &["tackle"])],
    )
    .build();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    assert_eq!(move_order(&last_round_events(&battle)), vec![PLAYER_LEAD, FOE_LEAD]);
}

#[test]
fn test_switch_resolves_before_attacks() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["tackle"]), pokemon("geodude", 50, &["tackle"])],
        vec![pokemon("ninjask", 50, &["tackle"])],
    )
    .build();

    play_round(&mut battle, vec![Action::Switch { who: PLAYER_LEAD, with: 1 }, attack(FOE_LEAD, 0)]);

    let events = last_round_events(&battle);
    let recalled = events
        .iter()
        .position(|event| matches!(event, BattleEvent::PokemonRecalled { .. }))
        .unwrap();
    let foe_move = events
        .iter()
        .position(|event| matches!(event, BattleEvent::MoveUsed { .. }))
        .unwrap();
    assert!(recalled < foe_move);
    // The foe's tackle lands on the incoming battler.
    let geodude = crate::battle::battler::BattlerId::new(0, 1);
    assert!(events
        .iter()
        .any(|event| matches!(event, BattleEvent::DamageDealt { target, .. } if *target == geodude)));
}

#[test]
fn test_trick_room_reverses_speed_order() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["trick_room", "tackle"])],
        vec![pokemon("ninjask", 50, &["tackle"])],
    )
    .build();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);
    assert!(battle.logic().has_effect(EffectScope::Field, EffectKind::TrickRoom));
    // Trick Room itself has -7 priority.
    assert_eq!(move_order(&last_round_events(&battle)), vec![FOE_LEAD, PLAYER_LEAD]);

    play_round(&mut battle, vec![attack(FOE_LEAD, 0), attack(PLAYER_LEAD, 1)]);
    assert_eq!(move_order(&last_round_events(&battle)), vec![PLAYER_LEAD, FOE_LEAD]);
}

#[test]
fn test_quick_claw_moves_holder_first_and_is_announced() {
    let mut rolls = vec![10];
    rolls.extend(std::iter::repeat(50).take(200));
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["tackle"]).with_item("quick_claw")],
        vec![pokemon("pikachu", 50, &["tackle"])],
    )
    .with_rng(ScriptedRng::new(rolls))
    .build();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    let events = last_round_events(&battle);
    assert!(matches!(events[1], BattleEvent::HeldItemActivated { battler, .. } if battler == PLAYER_LEAD));
    assert_eq!(move_order(&events), vec![PLAYER_LEAD, FOE_LEAD]);
}

#[test]
fn test_quick_claw_miss_keeps_speed_order() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["tackle"]).with_item("quick_claw")],
        vec![pokemon("pikachu", 50, &["tackle"])],
    )
    .build();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    assert_eq!(move_order(&last_round_events(&battle)), vec![FOE_LEAD, PLAYER_LEAD]);
}

#[test]
fn test_speed_tie_is_settled_by_the_rng() {
    // Tie keys are drawn in submission order: player gets 20, foe gets 80.
    let mut rolls = vec![20, 80];
    rolls.extend(std::iter::repeat(50).take(200));
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["tackle"])],
        vec![pokemon("snorlax", 50, &["tackle"])],
    )
    .with_rng(ScriptedRng::new(rolls))
    .build();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    assert_eq!(move_order(&last_round_events(&battle)), vec![FOE_LEAD, PLAYER_LEAD]);
}
