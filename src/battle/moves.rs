//! Procedures behind each move's `battle_engine_method`.
//!
//! A procedure runs once the user has passed its own prevention band and the
//! move has been announced. It runs the target prevention band, rolls
//! accuracy, then applies the move through the handlers. Procedures are
//! looked up by name, so the database decides which one a move uses.

use crate::battle::battler::{BattlerId, Position};
use crate::battle::calculators;
use crate::battle::effects::bank::{Mist, Safeguard, StealthRock};
use crate::battle::effects::field::{Sandstorm, TrickRoom};
use crate::battle::effects::pokemon::{
    protect_odds, DestinyBond, Disable, Flinch, Ingrain, LeechSeed, PerishSong, Protect, ProtectStyle, SaltCure,
    Substitute, Taunt,
};
use crate::battle::effects::position::Wish;
use crate::battle::effects::{DamageSource, EffectKind, EffectScope, Hook, MoveContext, MoveHit, SwitchContext};
use crate::battle::handlers::DamageOutcome;
use crate::battle::logic::Logic;
use crate::battle::presentation::Animation;
use crate::battle::state::BattleEvent;
use crate::errors::BattleResult;
use schema::PokemonType;
use std::collections::HashMap;
use tracing::debug;

pub type MoveProcedure = fn(&mut Logic, &MoveContext) -> BattleResult<()>;

const PROTECT_METHODS: [&str; 5] = [
    "s_protect",
    "s_spiky_shield",
    "s_kings_shield",
    "s_obstruct",
    "s_baneful_bunker",
];

/// Whether `method` belongs to the protect family, whose consecutive uses
/// keep the streak alive.
pub fn is_protect_method(method: &str) -> bool {
    PROTECT_METHODS.contains(&method)
}

#[derive(Debug, Clone, Default)]
pub struct MoveProcedures {
    entries: HashMap<&'static str, MoveProcedure>,
}

impl MoveProcedures {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut procedures = Self::empty();
        procedures.register("s_basic", s_basic);
        procedures.register("s_focus_punch", s_basic);
        procedures.register("s_salt_cure", s_salt_cure);
        procedures.register("s_status", s_status);
        procedures.register("s_stat", s_stat);
        procedures.register("s_protect", s_protect);
        procedures.register("s_spiky_shield", s_spiky_shield);
        procedures.register("s_kings_shield", s_kings_shield);
        procedures.register("s_obstruct", s_obstruct);
        procedures.register("s_baneful_bunker", s_baneful_bunker);
        procedures.register("s_substitute", s_substitute);
        procedures.register("s_leech_seed", s_leech_seed);
        procedures.register("s_perish_song", s_perish_song);
        procedures.register("s_taunt", s_taunt);
        procedures.register("s_disable", s_disable);
        procedures.register("s_ingrain", s_ingrain);
        procedures.register("s_destiny_bond", s_destiny_bond);
        procedures.register("s_wish", s_wish);
        procedures.register("s_stealth_rock", s_stealth_rock);
        procedures.register("s_mist", s_mist);
        procedures.register("s_safeguard", s_safeguard);
        procedures.register("s_sandstorm", s_sandstorm);
        procedures.register("s_trick_room", s_trick_room);
        procedures.register("s_baton_pass", s_baton_pass);
        procedures
    }

    pub fn register(&mut self, method: &'static str, procedure: MoveProcedure) {
        self.entries.insert(method, procedure);
    }

    pub fn get(&self, method: &str) -> Option<MoveProcedure> {
        self.entries.get(method).copied()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.entries.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// --- Shared steps ---

/// Runs the target prevention band. True when an effect stopped the move.
pub fn move_blocked_by_target(logic: &mut Logic, ctx: &MoveContext, target: BattlerId) -> BattleResult<bool> {
    let scopes = logic.scopes_for(&[target, ctx.user]);
    let verdict = logic.dispatch_prevention(Hook::OnMovePreventionTarget, &scopes, |effect, logic| {
        effect.on_move_prevention_target(logic, ctx, target)
    })?;
    Ok(verdict.is_some())
}

/// Target prevention then accuracy.
fn lands_on(logic: &mut Logic, ctx: &MoveContext, target: BattlerId) -> BattleResult<bool> {
    if move_blocked_by_target(logic, ctx, target)? {
        return Ok(false);
    }
    if !calculators::move_hits(logic, ctx, target) {
        logic.emit(BattleEvent::MoveMissed { user: ctx.user, target });
        return Ok(false);
    }
    Ok(true)
}

fn effect_roll(logic: &mut Logic, chance: u8, reason: &str) -> bool {
    chance >= 100 || logic.rng().chance(chance, reason)
}

fn fail(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    logic.emit(BattleEvent::MoveFailed { user: ctx.user });
    Ok(())
}

fn applied(logic: &mut Logic, kind: EffectKind, scope: EffectScope) {
    logic.emit(BattleEvent::EffectApplied { kind, scope });
}

/// One damaging hit on `target`. `None` when the move did not connect.
pub fn basic_hit(logic: &mut Logic, ctx: &MoveContext, target: BattlerId) -> BattleResult<Option<DamageOutcome>> {
    if !lands_on(logic, ctx, target)? {
        return Ok(None);
    }
    let roll = calculators::damage_roll(logic, ctx, target, ctx.targets.len());
    if roll.effectiveness == 0.0 {
        logic.emit(BattleEvent::TypeEffectiveness {
            target,
            multiplier: 0.0,
        });
        return Ok(None);
    }

    logic.play_animation(Animation::Hit { target });
    let outcome = logic
        .damage_handler()
        .damage_change(roll.damage, target, DamageSource::Move(MoveHit::from_context(ctx)))?;
    if outcome == DamageOutcome::Prevented {
        return Ok(Some(outcome));
    }
    if roll.critical {
        logic.emit(BattleEvent::CriticalHit { target });
    }
    if roll.effectiveness != 1.0 {
        logic.emit(BattleEvent::TypeEffectiveness {
            target,
            multiplier: roll.effectiveness,
        });
    }
    Ok(Some(outcome))
}

/// Status, stat changes and flinch riding on a damaging hit.
fn apply_secondary_effects(logic: &mut Logic, ctx: &MoveContext, target: BattlerId) -> BattleResult<()> {
    let data = &ctx.move_data;
    let has_secondary = data.status.is_some() || !data.stat_changes.is_empty();
    if has_secondary && effect_roll(logic, data.effect_chance, "secondary effect") {
        if let Some(status) = data.status {
            logic
                .status_handler()
                .status_change(target, status, Some(ctx.user), false)?;
        }
        for change in &data.stat_changes {
            let who = if change.on_user { ctx.user } else { target };
            logic
                .stat_change_handler()
                .stat_change(who, change.stat, change.stages, Some(ctx.user))?;
        }
    }

    let can_flinch = data.flinch_chance > 0
        && !logic.battler(target).moved_this_turn
        && !logic.has_effect(EffectScope::Pokemon(target), EffectKind::Flinch);
    if can_flinch && effect_roll(logic, data.flinch_chance, "flinch") {
        logic.add_effect(Box::new(Flinch::new(target)));
    }
    Ok(())
}

/// Hits every target in turn, running `after_hit` on each one that took
/// damage and is still standing.
fn hit_each(
    logic: &mut Logic,
    ctx: &MoveContext,
    mut after_hit: impl FnMut(&mut Logic, &MoveContext, BattlerId) -> BattleResult<()>,
) -> BattleResult<()> {
    for &target in &ctx.targets {
        if logic.battler(target).is_fainted() {
            continue;
        }
        if let Some(DamageOutcome::Dealt { fainted: false, .. }) = basic_hit(logic, ctx, target)? {
            after_hit(logic, ctx, target)?;
        }
        if logic.battler(ctx.user).is_fainted() {
            break;
        }
    }
    Ok(())
}

// --- Damaging moves ---

fn s_basic(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    if !ctx.move_data.is_damaging() {
        return fail(logic, ctx);
    }
    hit_each(logic, ctx, apply_secondary_effects)
}

fn apply_salt_cure(logic: &mut Logic, _ctx: &MoveContext, target: BattlerId) -> BattleResult<()> {
    let scope = EffectScope::Pokemon(target);
    if !logic.has_effect(scope, EffectKind::SaltCure) {
        logic.add_effect(Box::new(SaltCure::new(target)));
        applied(logic, EffectKind::SaltCure, scope);
    }
    Ok(())
}

fn s_salt_cure(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    hit_each(logic, ctx, apply_salt_cure)
}

// --- Status and stat moves ---

fn s_status(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    let Some(status) = ctx.move_data.status else {
        return fail(logic, ctx);
    };
    for &target in &ctx.targets {
        if !lands_on(logic, ctx, target)? {
            continue;
        }
        let immune = logic
            .db()
            .type_effectiveness(ctx.move_data.move_type, &logic.battler(target).types)
            == 0.0;
        if immune {
            logic.emit(BattleEvent::StatusFailed { target });
            continue;
        }
        logic
            .status_handler()
            .status_change(target, status, Some(ctx.user), true)?;
    }
    Ok(())
}

fn s_stat(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    for &target in &ctx.targets {
        if !lands_on(logic, ctx, target)? {
            continue;
        }
        for change in &ctx.move_data.stat_changes {
            let who = if change.on_user { ctx.user } else { target };
            logic
                .stat_change_handler()
                .stat_change(who, change.stat, change.stages, Some(ctx.user))?;
        }
    }
    Ok(())
}

// --- Protect family ---

/// Each consecutive success divides the odds of the next one by three.
fn protect_with(logic: &mut Logic, ctx: &MoveContext, style: ProtectStyle) -> BattleResult<()> {
    let user = ctx.user;
    let streak = logic.battler(user).protect_streak;
    let odds = protect_odds(streak);
    let succeeds = odds == 1 || logic.rng().range(odds, "protect chain") == 0;
    if !succeeds {
        debug!(?user, streak, "protect chain broke");
        logic.battler_mut(user).protect_streak = 0;
        return fail(logic, ctx);
    }
    logic.battler_mut(user).protect_streak = streak.saturating_add(1);
    logic.add_effect(Box::new(Protect::new(user, style)));
    applied(logic, EffectKind::Protect, EffectScope::Pokemon(user));
    Ok(())
}

fn s_protect(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    protect_with(logic, ctx, ProtectStyle::PROTECT)
}

fn s_spiky_shield(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    protect_with(logic, ctx, ProtectStyle::SPIKY_SHIELD)
}

fn s_kings_shield(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    protect_with(logic, ctx, ProtectStyle::KINGS_SHIELD)
}

fn s_obstruct(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    protect_with(logic, ctx, ProtectStyle::OBSTRUCT)
}

fn s_baneful_bunker(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    protect_with(logic, ctx, ProtectStyle::BANEFUL_BUNKER)
}

// --- Battler effects ---

/// Pays a quarter of max HP for a decoy with that much HP.
fn s_substitute(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    let user = ctx.user;
    let scope = EffectScope::Pokemon(user);
    let battler = logic.battler(user);
    let cost = (battler.max_hp() / 4).max(1);
    if logic.has_effect(scope, EffectKind::Substitute) || battler.hp() <= cost {
        return fail(logic, ctx);
    }
    logic
        .damage_handler()
        .effect_damage(cost, user, EffectKind::Substitute)?;
    logic.add_effect(Box::new(Substitute::new(user, cost)));
    logic.play_animation(Animation::SubstituteAppear { battler: user });
    applied(logic, EffectKind::Substitute, scope);
    Ok(())
}

fn s_leech_seed(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    let Some(receiver) = logic.position_of(ctx.user) else {
        return fail(logic, ctx);
    };
    for &target in &ctx.targets {
        if !lands_on(logic, ctx, target)? {
            continue;
        }
        let scope = EffectScope::Pokemon(target);
        let seeded = logic.battler(target).has_type(PokemonType::Grass)
            || logic.has_effect(scope, EffectKind::LeechSeed)
            || logic.has_effect(scope, EffectKind::Substitute);
        if seeded {
            fail(logic, ctx)?;
            continue;
        }
        logic.add_effect(Box::new(LeechSeed::new(target, receiver, LeechSeed::DEFAULT_POWER)));
        applied(logic, EffectKind::LeechSeed, scope);
    }
    Ok(())
}

/// Every active battler that has not heard the song yet starts counting.
fn s_perish_song(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    let mut listeners = 0;
    for battler in logic.active_battlers() {
        if logic.has_effect(EffectScope::Pokemon(battler), EffectKind::PerishSong) {
            continue;
        }
        logic.add_effect(Box::new(PerishSong::new(battler, PerishSong::START)));
        listeners += 1;
    }
    if listeners == 0 {
        return fail(logic, ctx);
    }
    applied(logic, EffectKind::PerishSong, EffectScope::Field);
    Ok(())
}

fn s_taunt(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    for &target in &ctx.targets {
        if !lands_on(logic, ctx, target)? {
            continue;
        }
        let scope = EffectScope::Pokemon(target);
        if logic.has_effect(scope, EffectKind::Taunt) {
            fail(logic, ctx)?;
            continue;
        }
        logic.add_effect(Box::new(Taunt::new(target)));
        applied(logic, EffectKind::Taunt, scope);
    }
    Ok(())
}

/// Locks the target's last used move.
fn s_disable(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    for &target in &ctx.targets {
        if !lands_on(logic, ctx, target)? {
            continue;
        }
        let scope = EffectScope::Pokemon(target);
        let last_move = logic.battler(target).last_move.clone();
        match last_move {
            Some(last_move) if !logic.has_effect(scope, EffectKind::Disable) => {
                logic.add_effect(Box::new(Disable::new(target, last_move)));
                applied(logic, EffectKind::Disable, scope);
            }
            _ => fail(logic, ctx)?,
        }
    }
    Ok(())
}

fn s_ingrain(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    let scope = EffectScope::Pokemon(ctx.user);
    if logic.has_effect(scope, EffectKind::Ingrain) {
        return fail(logic, ctx);
    }
    logic.add_effect(Box::new(Ingrain::new(ctx.user)));
    applied(logic, EffectKind::Ingrain, scope);
    Ok(())
}

fn s_destiny_bond(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    let scope = EffectScope::Pokemon(ctx.user);
    logic.kill_effects(scope, EffectKind::DestinyBond);
    logic.add_effect(Box::new(DestinyBond::new(ctx.user)));
    applied(logic, EffectKind::DestinyBond, scope);
    Ok(())
}

// --- Position, bank and field effects ---

/// Heals whoever stands in the user's position at the end of next turn.
fn s_wish(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    let Some(position) = logic.position_of(ctx.user) else {
        return fail(logic, ctx);
    };
    let scope = EffectScope::Position(position);
    if logic.has_effect(scope, EffectKind::Wish) {
        return fail(logic, ctx);
    }
    let amount = (logic.battler(ctx.user).max_hp() / 2).max(1);
    logic.add_effect(Box::new(Wish::new(position, amount)));
    applied(logic, EffectKind::Wish, scope);
    Ok(())
}

fn foe_bank(logic: &Logic, user: BattlerId) -> Option<u8> {
    logic.banks().iter().map(|bank| bank.index).find(|&index| index != user.bank)
}

fn s_stealth_rock(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    let Some(bank) = foe_bank(logic, ctx.user) else {
        return fail(logic, ctx);
    };
    let scope = EffectScope::Bank(bank);
    if logic.has_effect(scope, EffectKind::StealthRock) {
        return fail(logic, ctx);
    }
    logic.add_effect(Box::new(StealthRock::new(bank)));
    applied(logic, EffectKind::StealthRock, scope);
    Ok(())
}

fn s_mist(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    let bank = ctx.user.bank;
    let scope = EffectScope::Bank(bank);
    if logic.has_effect(scope, EffectKind::Mist) {
        return fail(logic, ctx);
    }
    logic.add_effect(Box::new(Mist::new(bank)));
    applied(logic, EffectKind::Mist, scope);
    Ok(())
}

fn s_safeguard(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    let bank = ctx.user.bank;
    let scope = EffectScope::Bank(bank);
    if logic.has_effect(scope, EffectKind::Safeguard) {
        return fail(logic, ctx);
    }
    logic.add_effect(Box::new(Safeguard::new(bank)));
    applied(logic, EffectKind::Safeguard, scope);
    Ok(())
}

fn s_sandstorm(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    if logic.has_effect(EffectScope::Field, EffectKind::Sandstorm) {
        return fail(logic, ctx);
    }
    logic.add_effect(Box::new(Sandstorm::new()));
    applied(logic, EffectKind::Sandstorm, EffectScope::Field);
    Ok(())
}

/// Using Trick Room while it is up ends it.
fn s_trick_room(logic: &mut Logic, _ctx: &MoveContext) -> BattleResult<()> {
    if logic.kill_effects(EffectScope::Field, EffectKind::TrickRoom) > 0 {
        logic.emit(BattleEvent::EffectEnded {
            kind: EffectKind::TrickRoom,
            scope: EffectScope::Field,
        });
        return Ok(());
    }
    logic.add_effect(Box::new(TrickRoom::new()));
    applied(logic, EffectKind::TrickRoom, EffectScope::Field);
    Ok(())
}

/// Switches with the first healthy benched member, passing stages and
/// transferable effects along.
fn s_baton_pass(logic: &mut Logic, ctx: &MoveContext) -> BattleResult<()> {
    let user = ctx.user;
    let Some(slot) = logic.battler(user).position else {
        return fail(logic, ctx);
    };
    let Some(incoming) = logic
        .bank(user.bank)
        .and_then(|bank| bank.benched_healthy().first().copied())
    else {
        return fail(logic, ctx);
    };
    let switch = SwitchContext {
        outgoing: Some(user),
        incoming: BattlerId::new(user.bank, incoming),
        position: Position::new(user.bank, slot),
        baton_pass: true,
    };
    if !logic.switch_handler().can_switch(&switch)? {
        return Ok(());
    }
    logic.switch_handler().execute_switch(switch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protect_family_membership() {
        for method in PROTECT_METHODS {
            assert!(is_protect_method(method));
        }
        assert!(!is_protect_method("s_basic"));
        assert!(!is_protect_method("s_substitute"));
    }

    #[test]
    fn test_standard_registry_covers_protect_family() {
        let procedures = MoveProcedures::standard();
        assert!(PROTECT_METHODS.iter().all(|method| procedures.contains(method)));
        assert!(procedures.get("s_basic").is_some());
        assert!(procedures.get("s_hyper_beam").is_none());
    }
}
