use super::common::*;
use crate::battle::effects::pokemon::Substitute;
use crate::battle::effects::{EffectKind, EffectScope};
use crate::battle::rng::ScriptedRng;
use crate::battle::state::BattleEvent;
use crate::pokemon::StatusCondition;
use pretty_assertions::assert_eq;
use schema::DbSymbol;

fn is_damage_on(event: &BattleEvent, who: crate::battle::battler::BattlerId) -> bool {
    matches!(event, BattleEvent::DamageDealt { target, .. } if *target == who)
}

#[test]
fn test_protect_blocks_a_damaging_move() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["protect"])],
        vec![pokemon("pikachu", 50, &["tackle"])],
    )
    .build();
    let hp_before = battle.logic().battler(PLAYER_LEAD).hp();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    let events = last_round_events(&battle);
    assert_eq!(move_order(&events), vec![PLAYER_LEAD, FOE_LEAD]);
    assert!(events.contains(&BattleEvent::Protected { target: PLAYER_LEAD }));
    assert!(!events.iter().any(|event| is_damage_on(event, PLAYER_LEAD)));
    assert_eq!(battle.logic().battler(PLAYER_LEAD).hp(), hp_before);
    // The shield only lasts the round it was raised in.
    assert!(!battle
        .logic()
        .has_effect(EffectScope::Pokemon(PLAYER_LEAD), EffectKind::Protect));
}

#[test]
fn test_protect_blocks_a_status_move() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["protect"])],
        vec![pokemon("pikachu", 50, &["thunder_wave"])],
    )
    .build();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    assert!(last_round_events(&battle).contains(&BattleEvent::Protected { target: PLAYER_LEAD }));
    assert_eq!(battle.logic().battler(PLAYER_LEAD).status, None);
}

#[test]
fn test_consecutive_protect_fails_on_a_bad_roll() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["protect"])],
        vec![pokemon("pikachu", 50, &["tackle"])],
    )
    .build();
    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);
    assert_eq!(battle.logic().battler(PLAYER_LEAD).protect_streak, 1);

    // Second use in a row succeeds one time in three; a roll of 50 misses.
    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    let events = last_round_events(&battle);
    assert!(events.contains(&BattleEvent::MoveFailed { user: PLAYER_LEAD }));
    assert!(events.iter().any(|event| is_damage_on(event, PLAYER_LEAD)));
    assert_eq!(battle.logic().battler(PLAYER_LEAD).protect_streak, 0);
}

#[test]
fn test_spiky_shield_hurts_contact_attackers() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["spiky_shield"])],
        vec![pokemon("pikachu", 50, &["tackle"])],
    )
    .build();
    let max_hp = battle.logic().battler(FOE_LEAD).max_hp();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    let events = last_round_events(&battle);
    assert!(events.contains(&BattleEvent::EffectDamage {
        target: FOE_LEAD,
        kind: EffectKind::Protect,
    }));
    assert_eq!(battle.logic().battler(FOE_LEAD).hp(), max_hp - max_hp / 8);
}

#[test]
fn test_baneful_bunker_poisons_contact_attackers() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["baneful_bunker"])],
        vec![pokemon("pikachu", 50, &["tackle"])],
    )
    .build();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    assert_eq!(battle.logic().battler(FOE_LEAD).status, Some(StatusCondition::Poison));
}

#[test]
fn test_protect_resolves_before_the_accuracy_roll() {
    // Every roll is 95, so a 90% move would miss if accuracy came first.
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["protect"])],
        vec![pokemon("pikachu", 50, &["rock_slide"])],
    )
    .with_rng(ScriptedRng::new(vec![95; 200]))
    .build();
    let hp_before = battle.logic().battler(PLAYER_LEAD).hp();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    let events = last_round_events(&battle);
    assert!(events.contains(&BattleEvent::Protected { target: PLAYER_LEAD }));
    assert!(!events
        .iter()
        .any(|event| matches!(event, BattleEvent::MoveMissed { .. })));
    assert_eq!(battle.logic().battler(PLAYER_LEAD).hp(), hp_before);
}

#[test]
fn test_protect_comes_before_sturdy() {
    let mut battle = TestBattle::singles(
        vec![pokemon("geodude", 5, &["protect"])],
        vec![pokemon("snorlax", 50, &["tackle"])],
    )
    .build();
    let max_hp = battle.logic().battler(PLAYER_LEAD).max_hp();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    let events = last_round_events(&battle);
    assert!(events.contains(&BattleEvent::Protected { target: PLAYER_LEAD }));
    assert!(!events
        .iter()
        .any(|event| matches!(event, BattleEvent::AbilityActivated { .. })));
    assert_eq!(battle.logic().battler(PLAYER_LEAD).hp(), max_hp);
}

#[test]
fn test_protect_keeps_the_focus_sash_unused() {
    let mut battle = TestBattle::singles(
        vec![pokemon("magikarp", 5, &["protect"]).with_item("focus_sash")],
        vec![pokemon("snorlax", 50, &["tackle"])],
    )
    .build();
    let max_hp = battle.logic().battler(PLAYER_LEAD).max_hp();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    let magikarp = battle.logic().battler(PLAYER_LEAD);
    assert_eq!(magikarp.hp(), max_hp);
    assert_eq!(magikarp.item, Some(DbSymbol::from("focus_sash")));
    assert!(battle
        .logic()
        .has_effect(EffectScope::Pokemon(PLAYER_LEAD), EffectKind::FocusSash));
}

#[test]
fn test_substitute_soaks_a_weak_hit() {
    let mut battle = TestBattle::singles(
        vec![pokemon("pikachu", 50, &["substitute"])],
        vec![pokemon("magikarp", 5, &["tackle"])],
    )
    .build();
    let max_hp = battle.logic().battler(PLAYER_LEAD).max_hp();
    let decoy_hp = max_hp / 4;

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    assert!(last_round_events(&battle).contains(&BattleEvent::SubstituteDamaged { target: PLAYER_LEAD }));
    assert_eq!(battle.logic().battler(PLAYER_LEAD).hp(), max_hp - decoy_hp);
    let substitute = battle
        .logic()
        .effects()
        .find_as::<Substitute>(EffectScope::Pokemon(PLAYER_LEAD), EffectKind::Substitute)
        .unwrap();
    assert!(substitute.hp() > 0 && substitute.hp() < decoy_hp);
}

#[test]
fn test_substitute_breaks_before_sturdy_is_needed() {
    let mut battle = TestBattle::singles(
        vec![pokemon("geodude", 5, &["splash"])],
        vec![pokemon("snorlax", 50, &["tackle"])],
    )
    .build();
    let max_hp = battle.logic().battler(PLAYER_LEAD).max_hp();
    battle
        .logic_mut()
        .add_effect(Box::new(Substitute::new(PLAYER_LEAD, 5)));

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    let events = last_round_events(&battle);
    assert!(events.contains(&BattleEvent::SubstituteDamaged { target: PLAYER_LEAD }));
    assert!(events.contains(&BattleEvent::EffectEnded {
        kind: EffectKind::Substitute,
        scope: EffectScope::Pokemon(PLAYER_LEAD),
    }));
    assert!(!events
        .iter()
        .any(|event| matches!(event, BattleEvent::AbilityActivated { .. })));
    assert_eq!(battle.logic().battler(PLAYER_LEAD).hp(), max_hp);
    assert!(!battle
        .logic()
        .has_effect(EffectScope::Pokemon(PLAYER_LEAD), EffectKind::Substitute));
}
