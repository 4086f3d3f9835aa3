use super::TargetSpec;
use crate::battle::battler::BattlerId;
use crate::battle::effects::{EffectKind, EffectScope, Hook, MoveContext};
use crate::battle::logic::Logic;
use crate::battle::moves::is_protect_method;
use crate::battle::presentation::Animation;
use crate::battle::state::BattleEvent;
use crate::errors::{BattleResult, DataError};
use schema::{MoveData, MoveTarget};
use tracing::debug;

/// Battlers a move will hit, re-resolved at execution time. A chosen foe
/// that is gone falls back to another living foe.
pub fn resolve_targets(logic: &mut Logic, user: BattlerId, move_data: &MoveData, spec: TargetSpec) -> Vec<BattlerId> {
    let foes = logic.alive_foes(user);
    match (move_data.target, spec) {
        (MoveTarget::User, _) => vec![user],
        (MoveTarget::UserBank | MoveTarget::FoeBank | MoveTarget::Field, _) => Vec::new(),
        (MoveTarget::AllFoes, _) | (_, TargetSpec::AllFoes) => foes,
        (MoveTarget::RandomFoe, _) | (_, TargetSpec::Random) => pick_random(logic, foes),
        (MoveTarget::Foe, TargetSpec::Position(position)) => match logic.alive_battler_at(position) {
            Some(target) if target != user => vec![target],
            _ => foes.into_iter().take(1).collect(),
        },
        (MoveTarget::Foe, TargetSpec::Auto) => foes.into_iter().take(1).collect(),
    }
}

fn pick_random(logic: &mut Logic, foes: Vec<BattlerId>) -> Vec<BattlerId> {
    match foes.len() {
        0 => Vec::new(),
        1 => foes,
        n => {
            let index = logic.rng().range(n as u32, "random target") as usize;
            vec![foes[index]]
        }
    }
}

fn needs_target(target: MoveTarget) -> bool {
    matches!(target, MoveTarget::Foe | MoveTarget::AllFoes | MoveTarget::RandomFoe)
}

/// Runs one Attack action: user prevention band, PP, announcement, then the
/// move's procedure.
pub fn execute(logic: &mut Logic, user: BattlerId, move_index: usize, spec: TargetSpec) -> BattleResult<()> {
    let Some(slot) = logic.battler(user).move_slot(move_index).cloned() else {
        debug!(?user, move_index, "attack with an unknown move slot skipped");
        return Ok(());
    };
    let move_data = logic.db().lookup_move(&slot.db_symbol)?.clone();
    logic.battler_mut(user).moved_this_turn = true;

    if slot.pp == 0 {
        logic.emit(BattleEvent::MoveFailed { user });
        return Ok(());
    }

    let targets = resolve_targets(logic, user, &move_data, spec);
    let ctx = MoveContext {
        user,
        move_data,
        move_index: Some(move_index),
        targets,
    };

    // A bond lasts until its owner's next attempt, whether or not it moves.
    logic.kill_effects(EffectScope::Pokemon(user), EffectKind::DestinyBond);

    let scopes = logic.scopes_for(&[user]);
    let prevented = logic.dispatch_prevention(Hook::OnMovePreventionUser, &scopes, |effect, logic| {
        effect.on_move_prevention_user(logic, &ctx)
    })?;
    if prevented.is_some() {
        debug!(?user, move_used = %ctx.move_data.db_symbol, "move prevented");
        logic.battler_mut(user).protect_streak = 0;
        return Ok(());
    }

    let method = ctx.move_data.battle_engine_method.clone();
    let battler = logic.battler_mut(user);
    battler.spend_pp(move_index);
    battler.last_move = Some(ctx.move_data.db_symbol.clone());
    if !is_protect_method(&method) {
        battler.protect_streak = 0;
    }

    logic.emit(BattleEvent::MoveUsed {
        user,
        move_used: ctx.move_data.db_symbol.clone(),
    });
    logic.play_animation(Animation::MoveUsed {
        user,
        move_used: ctx.move_data.db_symbol.clone(),
    });

    if ctx.targets.is_empty() && needs_target(ctx.move_data.target) {
        logic.emit(BattleEvent::NoTarget { user });
        return Ok(());
    }

    let procedure = logic
        .registries()
        .moves
        .get(&method)
        .ok_or_else(|| DataError::UnknownMoveProcedure {
            move_symbol: ctx.move_data.db_symbol.clone(),
            method: method.clone(),
        })?;
    procedure(logic, &ctx)
}
