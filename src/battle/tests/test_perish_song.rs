use super::common::*;
use crate::battle::effects::pokemon::PerishSong;
use crate::battle::effects::{EffectKind, EffectScope};
use crate::battle::engine::TurnPhase;
use crate::battle::state::{BattleEvent, BattleOutcome};
use pretty_assertions::assert_eq;

fn counter(battle: &crate::battle::engine::Battle, who: crate::battle::battler::BattlerId) -> Option<u8> {
    battle
        .logic()
        .find_effect_as::<PerishSong>(EffectScope::Pokemon(who), EffectKind::PerishSong)
        .map(PerishSong::counter)
}

#[test]
fn test_perish_song_knocks_out_everyone_who_heard_it() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["perish_song", "splash"])],
        vec![pokemon("snorlax", 50, &["splash"])],
    )
    .build();

    let phase = play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);
    assert_eq!(phase, TurnPhase::AwaitingActions);
    assert_eq!(counter(&battle, PLAYER_LEAD), Some(2));
    assert_eq!(counter(&battle, FOE_LEAD), Some(2));
    assert!(last_round_events(&battle).contains(&BattleEvent::PerishCount {
        target: FOE_LEAD,
        count: 2,
    }));

    let phase = play_round(&mut battle, vec![attack(PLAYER_LEAD, 1), attack(FOE_LEAD, 0)]);
    assert_eq!(phase, TurnPhase::AwaitingActions);
    assert_eq!(counter(&battle, PLAYER_LEAD), Some(1));

    let phase = play_round(&mut battle, vec![attack(PLAYER_LEAD, 1), attack(FOE_LEAD, 0)]);

    assert_eq!(phase, TurnPhase::BattleOver(BattleOutcome::Draw));
    assert!(battle.logic().battler(PLAYER_LEAD).is_fainted());
    assert!(battle.logic().battler(FOE_LEAD).is_fainted());
    let events = last_round_events(&battle);
    assert!(events.contains(&BattleEvent::Fainted { battler: PLAYER_LEAD }));
    assert!(events.contains(&BattleEvent::Fainted { battler: FOE_LEAD }));
}

#[test]
fn test_singing_again_does_not_reset_the_count() {
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["perish_song"])],
        vec![pokemon("snorlax", 50, &["splash"])],
    )
    .build();

    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);
    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    assert!(last_round_events(&battle).contains(&BattleEvent::MoveFailed { user: PLAYER_LEAD }));
    assert_eq!(counter(&battle, FOE_LEAD), Some(1));
}
