use super::common::*;
use crate::battle::actions::{Action, FleeKind};
use crate::battle::battler::BattlerId;
use crate::battle::effects::{EffectKind, EffectScope};
use crate::battle::engine::TurnPhase;
use crate::battle::presentation::{Animation, RecordingSink};
use crate::battle::state::{BattleEvent, BattleOutcome};
use crate::errors::{ActionError, BattleEngineError, BattleStateError};
use pretty_assertions::assert_eq;

fn pikachu_vs_snorlax() -> crate::battle::engine::Battle {
    TestBattle::singles(
        vec![pokemon("pikachu", 50, &["tackle", "splash"]), pokemon("geodude", 50, &["tackle"])],
        vec![pokemon("snorlax", 50, &["tackle", "splash"])],
    )
    .build()
}

#[test]
fn test_round_runs_through_every_phase_back_to_awaiting_actions() {
    let mut battle = pikachu_vs_snorlax();
    assert_eq!(battle.phase(), TurnPhase::AwaitingActions);

    battle.submit(attack(PLAYER_LEAD, 0)).unwrap();
    battle.submit(attack(FOE_LEAD, 0)).unwrap();

    assert_eq!(battle.step().unwrap(), TurnPhase::BuildQueue);
    assert_eq!(battle.step().unwrap(), TurnPhase::ExecuteNext);
    assert_eq!(battle.queued().count(), 2);
    assert_eq!(battle.step().unwrap(), TurnPhase::ActionDone);
    assert_eq!(battle.step().unwrap(), TurnPhase::ExecuteNext);
    assert_eq!(battle.step().unwrap(), TurnPhase::ActionDone);
    assert_eq!(battle.step().unwrap(), TurnPhase::ExecuteNext);
    assert_eq!(battle.step().unwrap(), TurnPhase::EndTurnHooks);
    assert_eq!(battle.step().unwrap(), TurnPhase::PurgeDead);
    assert_eq!(battle.step().unwrap(), TurnPhase::AwaitingActions);

    let events = last_round_events(&battle);
    assert_eq!(events.first(), Some(&BattleEvent::TurnStarted { turn_number: 1 }));
    assert_eq!(events.last(), Some(&BattleEvent::TurnEnded { turn_number: 1 }));
    assert!(battle.committed().is_empty());
}

#[test]
fn test_step_refuses_to_start_with_missing_actions() {
    let mut battle = pikachu_vs_snorlax();
    battle.submit(attack(PLAYER_LEAD, 0)).unwrap();

    assert_eq!(battle.missing_actions(), 1);
    assert_eq!(
        battle.step().unwrap_err(),
        BattleEngineError::BattleState(BattleStateError::ActionsMissing(1))
    );
    assert_eq!(battle.phase(), TurnPhase::AwaitingActions);
}

#[test]
fn test_submit_rejects_malformed_actions() {
    let mut battle = TestBattle::singles(
        vec![
            pokemon("pikachu", 50, &["tackle"]),
            pokemon("geodude", 50, &["tackle"]).with_hp(0),
            pokemon("snorlax", 50, &["tackle"]),
        ],
        vec![pokemon("snorlax", 50, &["tackle"])],
    )
    .build();

    let err = |battle: &mut crate::battle::engine::Battle, action: Action| battle.submit(action).unwrap_err();

    assert_eq!(
        err(&mut battle, attack(PLAYER_LEAD, 4)),
        BattleEngineError::Action(ActionError::InvalidMoveIndex(4))
    );
    assert_eq!(
        err(&mut battle, attack_at(PLAYER_LEAD, 0, 1, 3)),
        BattleEngineError::BattleState(BattleStateError::InvalidPosition { bank: 1, slot: 3 })
    );
    assert_eq!(
        err(&mut battle, Action::Switch { who: PLAYER_LEAD, with: 1 }),
        BattleEngineError::Action(ActionError::SwitchTargetFainted)
    );
    assert_eq!(
        err(&mut battle, Action::Switch { who: PLAYER_LEAD, with: 0 }),
        BattleEngineError::Action(ActionError::SwitchTargetActive)
    );
    assert_eq!(
        err(&mut battle, Action::Switch { who: PLAYER_LEAD, with: 7 }),
        BattleEngineError::Action(ActionError::InvalidPartyIndex(7))
    );
    assert_eq!(
        err(&mut battle, attack(BattlerId::new(0, 2), 0)),
        BattleEngineError::BattleState(BattleStateError::NotOnField)
    );
    assert_eq!(
        err(&mut battle, Action::Flee { bank: 0, kind: FleeKind::Player }),
        BattleEngineError::Action(ActionError::CannotFlee)
    );
    assert_eq!(
        err(&mut battle, Action::Mega { user: PLAYER_LEAD }),
        BattleEngineError::Action(ActionError::MegaUnavailable)
    );
    assert_eq!(
        err(
            &mut battle,
            Action::HighPriorityItemNotice {
                holder: PLAYER_LEAD,
                item: "quick_claw".into(),
            }
        ),
        BattleEngineError::Action(ActionError::NotChoosable)
    );

    battle.submit(attack(PLAYER_LEAD, 0)).unwrap();
    assert_eq!(
        err(&mut battle, attack(PLAYER_LEAD, 0)),
        BattleEngineError::Action(ActionError::DuplicateAction)
    );
    assert_eq!(battle.committed().len(), 1);
}

#[test]
fn test_fainted_battler_loses_its_queued_action() {
    let mut battle = TestBattle::singles(
        vec![pokemon("pikachu", 50, &["tackle"])],
        vec![pokemon("snorlax", 50, &["tackle"]).with_hp(1)],
    )
    .build();

    let phase = play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    assert_eq!(phase, TurnPhase::BattleOver(BattleOutcome::Win));
    let events = last_round_events(&battle);
    assert_eq!(move_order(&events), vec![PLAYER_LEAD]);
    assert!(events.contains(&BattleEvent::Fainted { battler: FOE_LEAD }));
    assert_eq!(events.last(), Some(&BattleEvent::BattleEnded { outcome: BattleOutcome::Win }));
    assert_eq!(battle.logic().battler(PLAYER_LEAD).hp(), battle.logic().battler(PLAYER_LEAD).max_hp());
}

#[test]
fn test_finished_battle_rejects_further_input() {
    let mut battle = TestBattle::singles(
        vec![pokemon("pikachu", 50, &["tackle"])],
        vec![pokemon("snorlax", 50, &["tackle"]).with_hp(1)],
    )
    .build();
    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    assert!(battle.is_over());
    assert_eq!(
        battle.submit(attack(PLAYER_LEAD, 0)).unwrap_err(),
        BattleEngineError::BattleState(BattleStateError::BattleOver)
    );
    assert_eq!(
        battle.abort(BattleOutcome::Draw).unwrap_err(),
        BattleEngineError::BattleState(BattleStateError::BattleOver)
    );
    assert_eq!(battle.outcome(), Some(BattleOutcome::Win));
}

#[test]
fn test_round_limit_ends_in_a_draw() {
    let mut config = config();
    config.max_turns = 2;
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["splash"])],
        vec![pokemon("snorlax", 50, &["splash"])],
    )
    .with_config(config)
    .build();

    let first = play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);
    let second = play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    assert_eq!(first, TurnPhase::AwaitingActions);
    assert_eq!(second, TurnPhase::BattleOver(BattleOutcome::Draw));
    assert_eq!(battle.logic().turn(), 2);
}

#[test]
fn test_abort_runs_effect_cleanup() {
    let sink = recording();
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["substitute"])],
        vec![pokemon("snorlax", 50, &["splash"])],
    )
    .with_sink(sink.clone())
    .build();
    play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);
    assert!(battle
        .logic()
        .has_effect(EffectScope::Pokemon(PLAYER_LEAD), EffectKind::Substitute));

    battle.abort(BattleOutcome::Flee).unwrap();

    assert_eq!(battle.phase(), TurnPhase::BattleOver(BattleOutcome::Flee));
    assert!(battle.logic().effects().is_empty());
    assert!(sink
        .snapshot()
        .animations
        .contains(&Animation::SubstituteFade { battler: PLAYER_LEAD }));
    assert_eq!(
        battle.logic().events().events().last(),
        Some(&BattleEvent::BattleEnded { outcome: BattleOutcome::Flee })
    );
}

#[test]
fn test_pending_send_out_blocks_the_round_until_acknowledged() {
    let sink = RecordingSink::deferring();
    let mut battle = TestBattle::singles(
        vec![pokemon("pikachu", 50, &["tackle"])],
        vec![pokemon("snorlax", 50, &["tackle"])],
    )
    .with_sink(sink.clone())
    .build();
    assert_eq!(sink.snapshot().acknowledgements_requested, 2);

    let foe_hp = battle.logic().battler(FOE_LEAD).hp();
    let phase = play_round(&mut battle, vec![attack(PLAYER_LEAD, 0), attack(FOE_LEAD, 0)]);

    // Parked before the first action: nothing has moved or spent PP yet.
    assert_eq!(phase, TurnPhase::TurnBlocked);
    assert_eq!(battle.queued().count(), 2);
    assert!(move_order(&last_round_events(&battle)).is_empty());
    assert_eq!(battle.logic().battler(FOE_LEAD).hp(), foe_hp);
    let slot = battle.logic().battler(PLAYER_LEAD).move_slot(0).unwrap();
    assert_eq!(slot.pp, slot.max_pp);
    assert_eq!(
        battle.submit(attack(PLAYER_LEAD, 0)).unwrap_err(),
        BattleEngineError::BattleState(BattleStateError::RoundInProgress)
    );

    battle.acknowledge_animation().unwrap();
    assert_eq!(battle.run_round().unwrap(), TurnPhase::AwaitingActions);
    assert_eq!(move_order(&last_round_events(&battle)), vec![PLAYER_LEAD, FOE_LEAD]);
    assert_eq!(
        battle.acknowledge_animation().unwrap_err(),
        BattleEngineError::BattleState(BattleStateError::NothingToAcknowledge)
    );
}

#[test]
fn test_switch_mid_round_waits_for_send_out_animation() {
    let sink = RecordingSink::deferring();
    let mut battle = TestBattle::singles(
        vec![pokemon("snorlax", 50, &["tackle"]), pokemon("geodude", 50, &["tackle"])],
        vec![pokemon("pikachu", 50, &["tackle"])],
    )
    .with_sink(sink.clone())
    .build();
    battle.acknowledge_animation().unwrap();

    let phase = play_round(
        &mut battle,
        vec![Action::Switch { who: PLAYER_LEAD, with: 1 }, attack(FOE_LEAD, 0)],
    );

    assert_eq!(phase, TurnPhase::TurnBlocked);
    assert!(matches!(
        sink.snapshot().animations.last(),
        Some(Animation::SendOut { battler, .. }) if *battler == BattlerId::new(0, 1)
    ));
    battle.acknowledge_animation().unwrap();
    assert_eq!(battle.run_round().unwrap(), TurnPhase::AwaitingActions);
}
