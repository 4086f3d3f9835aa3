//! Stateful battle effects and the hooks they subscribe to.
//!
//! An effect is bound to a scope (a battler, a position, a bank or the whole
//! field) and overrides whichever hooks it cares about. Prevention hooks
//! return a verdict and stop the dispatch at the first one; notification
//! hooks only cause side effects and always reach every live effect.

pub mod abilities;
pub mod bank;
pub mod field;
pub mod handler;
pub mod held_items;
pub mod pokemon;
pub mod position;

use crate::battle::battler::{BattlerId, Position};
use crate::battle::logic::Logic;
use crate::errors::BattleResult;
use schema::{DbSymbol, MoveCategory, MoveData, MoveFlags, PokemonType, StatType, StatusType};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use strum::{Display, EnumString};

pub use handler::{EffectId, EffectsHandler};

/// What an effect is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectScope {
    Pokemon(BattlerId),
    Position(Position),
    Bank(u8),
    Field,
}

/// Identifies the kind of an effect for existence checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum EffectKind {
    Protect,
    Substitute,
    LeechSeed,
    PerishSong,
    Taunt,
    Disable,
    Flinch,
    Ingrain,
    SaltCure,
    DestinyBond,
    FocusPunchCharge,
    Status,
    Wish,
    StealthRock,
    Mist,
    Safeguard,
    Sandstorm,
    TrickRoom,
    Limber,
    Insomnia,
    ClearBody,
    SpeedBoost,
    Sturdy,
    Intimidate,
    Leftovers,
    FocusSash,
    QuickClaw,
}

/// Every hook an effect can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Hook {
    OnMovePreventionUser,
    OnMovePreventionTarget,
    OnDamagePrevention,
    OnDamageEndure,
    OnStatusPrevention,
    OnStatIncreasePrevention,
    OnStatDecreasePrevention,
    OnSwitchPrevention,
    OnPostDamage,
    OnPostDamageDeath,
    OnPostStatusChange,
    OnEndTurnEvent,
    OnPostActionEvent,
    OnSwitchEvent,
    OnSpeedPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// Stops at the first effect returning a verdict.
    Prevention,
    /// Reaches every live effect.
    Notification,
    /// Like a prevention hook, but the verdict is a value rather than a veto.
    Query,
}

impl Hook {
    pub fn kind(self) -> HookKind {
        match self {
            Hook::OnMovePreventionUser
            | Hook::OnMovePreventionTarget
            | Hook::OnDamagePrevention
            | Hook::OnStatusPrevention
            | Hook::OnStatIncreasePrevention
            | Hook::OnStatDecreasePrevention
            | Hook::OnSwitchPrevention => HookKind::Prevention,
            Hook::OnPostDamage
            | Hook::OnPostDamageDeath
            | Hook::OnPostStatusChange
            | Hook::OnEndTurnEvent
            | Hook::OnPostActionEvent
            | Hook::OnSwitchEvent => HookKind::Notification,
            Hook::OnDamageEndure | Hook::OnSpeedPriority => HookKind::Query,
        }
    }
}

/// Veto returned by a prevention hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prevent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamagePrevention {
    Prevent,
    /// Deal this amount instead of the requested one.
    Replace(u16),
}

/// Answer of an `on_speed_priority` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedPriority {
    pub value: i8,
    /// Held item to announce before the round starts.
    pub announce_item: Option<DbSymbol>,
}

/// The move being executed, shared by every hook fired while it resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveContext {
    pub user: BattlerId,
    pub move_data: MoveData,
    pub move_index: Option<usize>,
    pub targets: Vec<BattlerId>,
}

impl MoveContext {
    pub fn is_status_move(&self) -> bool {
        self.move_data.category == MoveCategory::Status
    }
}

/// Summary of the move behind a hit.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveHit {
    pub user: BattlerId,
    pub db_symbol: DbSymbol,
    pub move_type: PokemonType,
    pub category: MoveCategory,
    pub flags: MoveFlags,
}

impl MoveHit {
    pub fn from_context(ctx: &MoveContext) -> Self {
        Self {
            user: ctx.user,
            db_symbol: ctx.move_data.db_symbol.clone(),
            move_type: ctx.move_data.move_type,
            category: ctx.move_data.category,
            flags: ctx.move_data.flags,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DamageSource {
    Move(MoveHit),
    Effect(EffectKind),
}

impl DamageSource {
    pub fn move_hit(&self) -> Option<&MoveHit> {
        match self {
            DamageSource::Move(hit) => Some(hit),
            DamageSource::Effect(_) => None,
        }
    }

    /// The attacking battler, when the damage comes from another battler's move.
    pub fn foe_attacker(&self, target: BattlerId) -> Option<BattlerId> {
        self.move_hit().map(|hit| hit.user).filter(|&user| user != target)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DamageContext {
    pub target: BattlerId,
    pub amount: u16,
    pub source: DamageSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusContext {
    pub target: BattlerId,
    pub status: StatusType,
    pub source: Option<BattlerId>,
}

impl StatusContext {
    pub fn from_foe(&self) -> bool {
        self.source.is_some_and(|source| source.bank != self.target.bank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatChangeContext {
    pub target: BattlerId,
    pub stat: StatType,
    pub amount: i8,
    pub source: Option<BattlerId>,
}

impl StatChangeContext {
    pub fn from_foe(&self) -> bool {
        self.source.is_some_and(|source| source.bank != self.target.bank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchContext {
    pub outgoing: Option<BattlerId>,
    pub incoming: BattlerId,
    pub position: Position,
    pub baton_pass: bool,
}

/// Downcasting support for `dyn Effect`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub fn downcast_ref<'a, T: Effect>(effect: &'a (dyn Effect + 'static)) -> Option<&'a T> {
    <dyn Effect as AsAny>::as_any(effect).downcast_ref::<T>()
}

pub fn downcast_mut<'a, T: Effect>(effect: &'a mut (dyn Effect + 'static)) -> Option<&'a mut T> {
    <dyn Effect as AsAny>::as_any_mut(effect).downcast_mut::<T>()
}

/// Common contract of every battle effect. All hooks default to no-ops.
#[allow(unused_variables)]
pub trait Effect: AsAny + fmt::Debug {
    fn name(&self) -> EffectKind;

    fn scope(&self) -> EffectScope;

    fn dead(&self) -> bool {
        false
    }

    /// Called once when the effect is purged from the registry.
    fn on_delete(&mut self, logic: &mut Logic) -> BattleResult<()> {
        Ok(())
    }

    /// Called when the owner leaves through Baton Pass. Returning an effect
    /// re-creates it on `incoming`; `None` lets this one die with the switch.
    fn baton_switch_transfer(&self, incoming: BattlerId) -> Option<Box<dyn Effect>> {
        None
    }

    fn on_move_prevention_user(&mut self, logic: &mut Logic, ctx: &MoveContext) -> BattleResult<Option<Prevent>> {
        Ok(None)
    }

    fn on_move_prevention_target(
        &mut self,
        logic: &mut Logic,
        ctx: &MoveContext,
        target: BattlerId,
    ) -> BattleResult<Option<Prevent>> {
        Ok(None)
    }

    fn on_damage_prevention(&mut self, logic: &mut Logic, ctx: &DamageContext) -> BattleResult<Option<DamagePrevention>> {
        Ok(None)
    }

    /// Runs only when no effect prevented the hit. Returns the damage to
    /// deal instead, so the holder survives.
    fn on_damage_endure(&mut self, logic: &mut Logic, ctx: &DamageContext) -> BattleResult<Option<u16>> {
        Ok(None)
    }

    fn on_status_prevention(&mut self, logic: &mut Logic, ctx: &StatusContext) -> BattleResult<Option<Prevent>> {
        Ok(None)
    }

    fn on_stat_increase_prevention(&mut self, logic: &mut Logic, ctx: &StatChangeContext) -> BattleResult<Option<Prevent>> {
        Ok(None)
    }

    fn on_stat_decrease_prevention(&mut self, logic: &mut Logic, ctx: &StatChangeContext) -> BattleResult<Option<Prevent>> {
        Ok(None)
    }

    fn on_switch_prevention(&mut self, logic: &mut Logic, ctx: &SwitchContext) -> BattleResult<Option<Prevent>> {
        Ok(None)
    }

    fn on_post_damage(&mut self, logic: &mut Logic, ctx: &DamageContext, dealt: u16) -> BattleResult<()> {
        Ok(())
    }

    fn on_post_damage_death(&mut self, logic: &mut Logic, ctx: &DamageContext) -> BattleResult<()> {
        Ok(())
    }

    fn on_post_status_change(&mut self, logic: &mut Logic, ctx: &StatusContext) -> BattleResult<()> {
        Ok(())
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        Ok(())
    }

    fn on_post_action_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        Ok(())
    }

    fn on_switch_event(&mut self, logic: &mut Logic, ctx: &SwitchContext) -> BattleResult<()> {
        Ok(())
    }

    fn on_speed_priority(&mut self, logic: &mut Logic, user: BattlerId) -> BattleResult<Option<SpeedPriority>> {
        Ok(None)
    }
}

/// Builds the effect a data symbol (ability or held item) grants its holder.
#[derive(Debug, Clone, Copy)]
pub struct EffectFactory {
    pub kind: EffectKind,
    pub build: fn(BattlerId) -> Box<dyn Effect>,
}

/// `max(1, floor(max_hp / divisor))`, the rounding rule of every
/// HP-fraction effect.
pub fn hp_fraction(max_hp: u16, divisor: u16) -> u16 {
    (max_hp / divisor.max(1)).max(1)
}

/// Turn counter shared by timed effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u8,
}

impl Countdown {
    pub fn new(turns: u8) -> Self {
        Self { remaining: turns }
    }

    /// Decrements and reports whether the counter just ran out.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }

    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    pub fn expired(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(100, 8, 12)]
    #[case(7, 8, 1)]
    #[case(0, 16, 1)]
    #[case(160, 16, 10)]
    #[case(33, 32, 1)]
    #[case(203, 4, 50)]
    fn test_hp_fraction_floors_with_minimum_one(#[case] max_hp: u16, #[case] divisor: u16, #[case] expected: u16) {
        assert_eq!(hp_fraction(max_hp, divisor), expected);
    }

    #[test]
    fn test_hook_names_round_trip() {
        assert_eq!(Hook::from_str("on_end_turn_event").unwrap(), Hook::OnEndTurnEvent);
        assert_eq!(Hook::OnStatDecreasePrevention.to_string(), "on_stat_decrease_prevention");
        assert!(Hook::from_str("on_teatime").is_err());
        assert_eq!(Hook::OnDamagePrevention.kind(), HookKind::Prevention);
        assert_eq!(Hook::OnSwitchEvent.kind(), HookKind::Notification);
        assert_eq!(Hook::from_str("on_damage_endure").unwrap().kind(), HookKind::Query);
    }

    #[test]
    fn test_countdown() {
        let mut countdown = Countdown::new(2);
        assert!(!countdown.tick());
        assert!(countdown.tick());
        assert!(countdown.expired());
        assert!(countdown.tick());
    }
}
