//! Effects bound to a single battler.

use super::{
    hp_fraction, Countdown, DamageContext, DamagePrevention, DamageSource, Effect, EffectKind, EffectScope,
    MoveContext, Prevent, StatChangeContext, StatusContext, SwitchContext,
};
use crate::battle::battler::{BattlerId, Position};
use crate::battle::logic::Logic;
use crate::battle::presentation::Animation;
use crate::battle::state::{BattleEvent, PreventionReason};
use crate::errors::BattleResult;
use crate::pokemon::StatusCondition;
use schema::{DbSymbol, PokemonType, StatType, StatusType};

/// Method name of the move that charges through `FocusPunchCharge`.
pub const FOCUS_PUNCH_METHOD: &str = "s_focus_punch";

// --- Protect family ---

/// Extra consequence for a contact move that hits a protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectPenalty {
    ContactDamage { divisor: u16 },
    ContactStatDrop { stat: StatType, stages: i8 },
    ContactStatus(StatusType),
}

/// How a protection behaves, composed per move instead of subclassed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectStyle {
    pub blocks_status_moves: bool,
    pub penalty: Option<ProtectPenalty>,
}

impl ProtectStyle {
    pub const PROTECT: Self = Self {
        blocks_status_moves: true,
        penalty: None,
    };
    pub const SPIKY_SHIELD: Self = Self {
        blocks_status_moves: true,
        penalty: Some(ProtectPenalty::ContactDamage { divisor: 8 }),
    };
    pub const KINGS_SHIELD: Self = Self {
        blocks_status_moves: false,
        penalty: Some(ProtectPenalty::ContactStatDrop {
            stat: StatType::Attack,
            stages: -1,
        }),
    };
    pub const OBSTRUCT: Self = Self {
        blocks_status_moves: false,
        penalty: Some(ProtectPenalty::ContactStatDrop {
            stat: StatType::Defense,
            stages: -2,
        }),
    };
    pub const BANEFUL_BUNKER: Self = Self {
        blocks_status_moves: true,
        penalty: Some(ProtectPenalty::ContactStatus(StatusType::Poison)),
    };
}

/// Odds, as `1 / n`, of a protection succeeding after `streak` consecutive successes.
pub fn protect_odds(streak: u8) -> u32 {
    3u32.saturating_pow(streak as u32)
}

#[derive(Debug)]
pub struct Protect {
    owner: BattlerId,
    style: ProtectStyle,
    expired: bool,
}

impl Protect {
    pub fn new(owner: BattlerId, style: ProtectStyle) -> Self {
        Self {
            owner,
            style,
            expired: false,
        }
    }

    pub fn style(&self) -> ProtectStyle {
        self.style
    }

    fn punish(&self, logic: &mut Logic, attacker: BattlerId) -> BattleResult<()> {
        match self.style.penalty {
            None => Ok(()),
            Some(ProtectPenalty::ContactDamage { divisor }) => {
                let amount = hp_fraction(logic.battler(attacker).max_hp(), divisor);
                logic
                    .damage_handler()
                    .effect_damage(amount, attacker, EffectKind::Protect)
                    .map(|_| ())
            }
            Some(ProtectPenalty::ContactStatDrop { stat, stages }) => logic
                .stat_change_handler()
                .stat_change(attacker, stat, stages, Some(self.owner))
                .map(|_| ()),
            Some(ProtectPenalty::ContactStatus(status)) => logic
                .status_handler()
                .status_change(attacker, status, Some(self.owner), false)
                .map(|_| ()),
        }
    }
}

impl Effect for Protect {
    fn name(&self) -> EffectKind {
        EffectKind::Protect
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn dead(&self) -> bool {
        self.expired
    }

    fn on_move_prevention_target(
        &mut self,
        logic: &mut Logic,
        ctx: &MoveContext,
        target: BattlerId,
    ) -> BattleResult<Option<Prevent>> {
        let status_move = ctx.is_status_move();
        let blocked = target == self.owner
            && ctx.user != self.owner
            && ctx.move_data.flags.blocked_by_protect
            && (!status_move || self.style.blocks_status_moves);
        if !blocked {
            return Ok(None);
        }
        logic.emit(BattleEvent::Protected { target });
        if !status_move && ctx.move_data.flags.contact {
            self.punish(logic, ctx.user)?;
        }
        Ok(Some(Prevent))
    }

    fn on_end_turn_event(&mut self, _logic: &mut Logic) -> BattleResult<()> {
        self.expired = true;
        Ok(())
    }
}

// --- Substitute ---

#[derive(Debug)]
pub struct Substitute {
    owner: BattlerId,
    hp: u16,
}

impl Substitute {
    pub fn new(owner: BattlerId, hp: u16) -> Self {
        Self { owner, hp }
    }

    pub fn hp(&self) -> u16 {
        self.hp
    }

    fn blocks(&self, target: BattlerId, from_foe: bool) -> bool {
        target == self.owner && from_foe && self.hp > 0
    }
}

impl Effect for Substitute {
    fn name(&self) -> EffectKind {
        EffectKind::Substitute
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn dead(&self) -> bool {
        self.hp == 0
    }

    fn on_delete(&mut self, logic: &mut Logic) -> BattleResult<()> {
        logic.play_animation(Animation::SubstituteFade { battler: self.owner });
        Ok(())
    }

    fn baton_switch_transfer(&self, incoming: BattlerId) -> Option<Box<dyn Effect>> {
        Some(Box::new(Substitute::new(incoming, self.hp)))
    }

    fn on_damage_prevention(&mut self, logic: &mut Logic, ctx: &DamageContext) -> BattleResult<Option<DamagePrevention>> {
        let Some(hit) = ctx.source.move_hit() else {
            return Ok(None);
        };
        let from_foe = ctx.source.foe_attacker(ctx.target).is_some();
        if !self.blocks(ctx.target, from_foe) || hit.flags.authentic || hit.flags.sound {
            return Ok(None);
        }
        self.hp = self.hp.saturating_sub(ctx.amount);
        logic.emit(BattleEvent::SubstituteDamaged { target: self.owner });
        if self.hp == 0 {
            logic.emit(BattleEvent::EffectEnded {
                kind: EffectKind::Substitute,
                scope: self.scope(),
            });
        }
        Ok(Some(DamagePrevention::Prevent))
    }

    fn on_status_prevention(&mut self, logic: &mut Logic, ctx: &StatusContext) -> BattleResult<Option<Prevent>> {
        if !self.blocks(ctx.target, ctx.from_foe()) {
            return Ok(None);
        }
        logic.emit(BattleEvent::EffectBlocked {
            kind: EffectKind::Substitute,
            target: ctx.target,
        });
        Ok(Some(Prevent))
    }

    fn on_stat_decrease_prevention(&mut self, logic: &mut Logic, ctx: &StatChangeContext) -> BattleResult<Option<Prevent>> {
        if !self.blocks(ctx.target, ctx.from_foe()) {
            return Ok(None);
        }
        logic.emit(BattleEvent::EffectBlocked {
            kind: EffectKind::Substitute,
            target: ctx.target,
        });
        Ok(Some(Prevent))
    }
}

// --- Leech Seed ---

/// Drains `1 / leech_power` of the owner's max HP each turn into whoever
/// stands at `receiver`.
#[derive(Debug)]
pub struct LeechSeed {
    owner: BattlerId,
    receiver: Position,
    leech_power: u16,
}

impl LeechSeed {
    pub const DEFAULT_POWER: u16 = 8;

    pub fn new(owner: BattlerId, receiver: Position, leech_power: u16) -> Self {
        Self {
            owner,
            receiver,
            leech_power,
        }
    }

    pub fn receiver(&self) -> Position {
        self.receiver
    }
}

impl Effect for LeechSeed {
    fn name(&self) -> EffectKind {
        EffectKind::LeechSeed
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn baton_switch_transfer(&self, incoming: BattlerId) -> Option<Box<dyn Effect>> {
        Some(Box::new(LeechSeed::new(incoming, self.receiver, self.leech_power)))
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        if logic.battler(self.owner).is_fainted() {
            return Ok(());
        }
        let Some(receiver) = logic.alive_battler_at(self.receiver) else {
            return Ok(());
        };
        let amount = hp_fraction(logic.battler(self.owner).max_hp(), self.leech_power);
        let drained = logic
            .damage_handler()
            .effect_damage(amount, self.owner, EffectKind::LeechSeed)?
            .dealt();
        if drained > 0 {
            logic.damage_handler().heal(receiver, drained)?;
        }
        Ok(())
    }
}

// --- Perish Song ---

#[derive(Debug)]
pub struct PerishSong {
    owner: BattlerId,
    counter: u8,
}

impl PerishSong {
    pub const START: u8 = 3;

    pub fn new(owner: BattlerId, counter: u8) -> Self {
        Self { owner, counter }
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }
}

impl Effect for PerishSong {
    fn name(&self) -> EffectKind {
        EffectKind::PerishSong
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn dead(&self) -> bool {
        self.counter == 0
    }

    fn baton_switch_transfer(&self, incoming: BattlerId) -> Option<Box<dyn Effect>> {
        Some(Box::new(PerishSong::new(incoming, self.counter)))
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        if logic.battler(self.owner).is_fainted() {
            return Ok(());
        }
        self.counter = self.counter.saturating_sub(1);
        logic.emit(BattleEvent::PerishCount {
            target: self.owner,
            count: self.counter,
        });
        if self.counter == 0 {
            let hp = logic.battler(self.owner).hp();
            logic
                .damage_handler()
                .damage_change(hp, self.owner, DamageSource::Effect(EffectKind::PerishSong))?;
        }
        Ok(())
    }
}

// --- Taunt / Disable / Flinch ---

#[derive(Debug)]
pub struct Taunt {
    owner: BattlerId,
    turns: Countdown,
}

impl Taunt {
    pub const TURNS: u8 = 3;

    pub fn new(owner: BattlerId) -> Self {
        Self {
            owner,
            turns: Countdown::new(Self::TURNS),
        }
    }
}

impl Effect for Taunt {
    fn name(&self) -> EffectKind {
        EffectKind::Taunt
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn dead(&self) -> bool {
        self.turns.expired()
    }

    fn on_move_prevention_user(&mut self, logic: &mut Logic, ctx: &MoveContext) -> BattleResult<Option<Prevent>> {
        if ctx.user != self.owner || !ctx.is_status_move() {
            return Ok(None);
        }
        logic.emit(BattleEvent::MovePrevented {
            user: self.owner,
            reason: PreventionReason::Taunted,
        });
        Ok(Some(Prevent))
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        if self.turns.tick() {
            logic.emit(BattleEvent::EffectEnded {
                kind: EffectKind::Taunt,
                scope: self.scope(),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Disable {
    owner: BattlerId,
    disabled: DbSymbol,
    turns: Countdown,
}

impl Disable {
    pub const TURNS: u8 = 4;

    pub fn new(owner: BattlerId, disabled: DbSymbol) -> Self {
        Self {
            owner,
            disabled,
            turns: Countdown::new(Self::TURNS),
        }
    }

    pub fn disabled_move(&self) -> &DbSymbol {
        &self.disabled
    }
}

impl Effect for Disable {
    fn name(&self) -> EffectKind {
        EffectKind::Disable
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn dead(&self) -> bool {
        self.turns.expired()
    }

    fn on_move_prevention_user(&mut self, logic: &mut Logic, ctx: &MoveContext) -> BattleResult<Option<Prevent>> {
        if ctx.user != self.owner || ctx.move_data.db_symbol != self.disabled {
            return Ok(None);
        }
        logic.emit(BattleEvent::MovePrevented {
            user: self.owner,
            reason: PreventionReason::Disabled,
        });
        Ok(Some(Prevent))
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        if self.turns.tick() {
            logic.emit(BattleEvent::EffectEnded {
                kind: EffectKind::Disable,
                scope: self.scope(),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Flinch {
    owner: BattlerId,
    expired: bool,
}

impl Flinch {
    pub fn new(owner: BattlerId) -> Self {
        Self { owner, expired: false }
    }
}

impl Effect for Flinch {
    fn name(&self) -> EffectKind {
        EffectKind::Flinch
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn dead(&self) -> bool {
        self.expired
    }

    fn on_move_prevention_user(&mut self, logic: &mut Logic, ctx: &MoveContext) -> BattleResult<Option<Prevent>> {
        if ctx.user != self.owner {
            return Ok(None);
        }
        self.expired = true;
        logic.emit(BattleEvent::MovePrevented {
            user: self.owner,
            reason: PreventionReason::Flinched,
        });
        Ok(Some(Prevent))
    }

    fn on_end_turn_event(&mut self, _logic: &mut Logic) -> BattleResult<()> {
        self.expired = true;
        Ok(())
    }
}

// --- Ingrain / Salt Cure ---

#[derive(Debug)]
pub struct Ingrain {
    owner: BattlerId,
}

impl Ingrain {
    pub fn new(owner: BattlerId) -> Self {
        Self { owner }
    }
}

impl Effect for Ingrain {
    fn name(&self) -> EffectKind {
        EffectKind::Ingrain
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn baton_switch_transfer(&self, incoming: BattlerId) -> Option<Box<dyn Effect>> {
        Some(Box::new(Ingrain::new(incoming)))
    }

    fn on_switch_prevention(&mut self, _logic: &mut Logic, ctx: &SwitchContext) -> BattleResult<Option<Prevent>> {
        if ctx.outgoing == Some(self.owner) && !ctx.baton_pass {
            return Ok(Some(Prevent));
        }
        Ok(None)
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        let battler = logic.battler(self.owner);
        if battler.is_fainted() || battler.hp() == battler.max_hp() {
            return Ok(());
        }
        let amount = hp_fraction(battler.max_hp(), 16);
        logic.emit(BattleEvent::EffectHeal {
            target: self.owner,
            kind: EffectKind::Ingrain,
        });
        logic.damage_handler().heal(self.owner, amount)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SaltCure {
    owner: BattlerId,
}

impl SaltCure {
    pub fn new(owner: BattlerId) -> Self {
        Self { owner }
    }

    pub fn divisor(types: &[PokemonType]) -> u16 {
        if types.contains(&PokemonType::Water) || types.contains(&PokemonType::Steel) {
            4
        } else {
            8
        }
    }
}

impl Effect for SaltCure {
    fn name(&self) -> EffectKind {
        EffectKind::SaltCure
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        let battler = logic.battler(self.owner);
        if battler.is_fainted() {
            return Ok(());
        }
        let amount = hp_fraction(battler.max_hp(), Self::divisor(&battler.types));
        logic
            .damage_handler()
            .effect_damage(amount, self.owner, EffectKind::SaltCure)?;
        Ok(())
    }
}

// --- Destiny Bond / Focus Punch ---

/// Takes the attacker down with the owner. The attack executor ends it when
/// the owner next tries to move.
#[derive(Debug)]
pub struct DestinyBond {
    owner: BattlerId,
    expired: bool,
}

impl DestinyBond {
    pub fn new(owner: BattlerId) -> Self {
        Self { owner, expired: false }
    }
}

impl Effect for DestinyBond {
    fn name(&self) -> EffectKind {
        EffectKind::DestinyBond
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn dead(&self) -> bool {
        self.expired
    }

    fn on_post_damage_death(&mut self, logic: &mut Logic, ctx: &DamageContext) -> BattleResult<()> {
        if ctx.target != self.owner {
            return Ok(());
        }
        let Some(attacker) = ctx.source.foe_attacker(self.owner) else {
            return Ok(());
        };
        if logic.battler(attacker).is_fainted() {
            return Ok(());
        }
        self.expired = true;
        let hp = logic.battler(attacker).hp();
        logic.emit(BattleEvent::EffectDamage {
            target: attacker,
            kind: EffectKind::DestinyBond,
        });
        logic
            .damage_handler()
            .damage_change(hp, attacker, DamageSource::Effect(EffectKind::DestinyBond))?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct FocusPunchCharge {
    owner: BattlerId,
    lost_focus: bool,
    expired: bool,
}

impl FocusPunchCharge {
    pub fn new(owner: BattlerId) -> Self {
        Self {
            owner,
            lost_focus: false,
            expired: false,
        }
    }

    pub fn lost_focus(&self) -> bool {
        self.lost_focus
    }
}

impl Effect for FocusPunchCharge {
    fn name(&self) -> EffectKind {
        EffectKind::FocusPunchCharge
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn dead(&self) -> bool {
        self.expired
    }

    fn on_post_damage(&mut self, _logic: &mut Logic, ctx: &DamageContext, dealt: u16) -> BattleResult<()> {
        if ctx.target == self.owner && dealt > 0 && ctx.source.foe_attacker(self.owner).is_some() {
            self.lost_focus = true;
        }
        Ok(())
    }

    fn on_move_prevention_user(&mut self, logic: &mut Logic, ctx: &MoveContext) -> BattleResult<Option<Prevent>> {
        if ctx.user != self.owner || ctx.move_data.battle_engine_method != FOCUS_PUNCH_METHOD {
            return Ok(None);
        }
        self.expired = true;
        if !self.lost_focus {
            return Ok(None);
        }
        logic.emit(BattleEvent::MovePrevented {
            user: self.owner,
            reason: PreventionReason::LostFocus,
        });
        Ok(Some(Prevent))
    }

    fn on_end_turn_event(&mut self, _logic: &mut Logic) -> BattleResult<()> {
        self.expired = true;
        Ok(())
    }
}

// --- Major status ---

/// Carries the turn-by-turn behavior of a battler's major status. The
/// condition itself lives on the battler; curing kills this effect.
#[derive(Debug)]
pub struct StatusEffect {
    owner: BattlerId,
    status: StatusType,
    toxic_counter: u8,
}

impl StatusEffect {
    pub const THAW_CHANCE: u8 = 20;
    pub const FULL_PARALYSIS_CHANCE: u8 = 25;

    pub fn new(owner: BattlerId, condition: StatusCondition) -> Self {
        Self {
            owner,
            status: condition.kind(),
            toxic_counter: 0,
        }
    }

    pub fn status(&self) -> StatusType {
        self.status
    }

    /// Toxic deals `n / 16` on its n-th turn, capped at 15.
    pub fn toxic_damage(max_hp: u16, counter: u8) -> u16 {
        ((max_hp as u32 * counter.min(15) as u32 / 16) as u16).max(1)
    }

    fn prevent(&self, logic: &mut Logic, reason: PreventionReason) -> BattleResult<Option<Prevent>> {
        logic.emit(BattleEvent::MovePrevented {
            user: self.owner,
            reason,
        });
        Ok(Some(Prevent))
    }
}

impl Effect for StatusEffect {
    fn name(&self) -> EffectKind {
        EffectKind::Status
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn on_move_prevention_user(&mut self, logic: &mut Logic, ctx: &MoveContext) -> BattleResult<Option<Prevent>> {
        if ctx.user != self.owner {
            return Ok(None);
        }
        match logic.battler(self.owner).status {
            Some(StatusCondition::Sleep { turns_remaining: 0 }) => {
                logic.status_handler().cure(self.owner)?;
                Ok(None)
            }
            Some(StatusCondition::Sleep { turns_remaining }) => {
                logic.battler_mut(self.owner).status = Some(StatusCondition::Sleep {
                    turns_remaining: turns_remaining - 1,
                });
                self.prevent(logic, PreventionReason::Asleep)
            }
            Some(StatusCondition::Freeze) => {
                if logic.rng().chance(Self::THAW_CHANCE, "thaw") {
                    logic.status_handler().cure(self.owner)?;
                    Ok(None)
                } else {
                    self.prevent(logic, PreventionReason::Frozen)
                }
            }
            Some(StatusCondition::Paralysis) => {
                if logic.rng().chance(Self::FULL_PARALYSIS_CHANCE, "full paralysis") {
                    self.prevent(logic, PreventionReason::Paralyzed)
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }

    fn on_post_damage(&mut self, logic: &mut Logic, ctx: &DamageContext, _dealt: u16) -> BattleResult<()> {
        let fire_hit = ctx
            .source
            .move_hit()
            .is_some_and(|hit| hit.move_type == PokemonType::Fire);
        if ctx.target == self.owner && self.status == StatusType::Freeze && fire_hit {
            logic.status_handler().cure(self.owner)?;
        }
        Ok(())
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        let battler = logic.battler(self.owner);
        if battler.is_fainted() || !battler.on_field() {
            return Ok(());
        }
        let max_hp = battler.max_hp();
        let amount = match self.status {
            StatusType::Poison => hp_fraction(max_hp, 8),
            StatusType::Burn => hp_fraction(max_hp, 16),
            StatusType::Toxic => {
                self.toxic_counter = (self.toxic_counter + 1).min(15);
                Self::toxic_damage(max_hp, self.toxic_counter)
            }
            StatusType::Paralysis | StatusType::Sleep | StatusType::Freeze => return Ok(()),
        };
        logic.emit(BattleEvent::StatusHurt {
            target: self.owner,
            status: self.status,
        });
        logic
            .damage_handler()
            .damage_change(amount, self.owner, DamageSource::Effect(EffectKind::Status))?;
        Ok(())
    }
}
