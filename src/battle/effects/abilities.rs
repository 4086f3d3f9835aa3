//! Ability effects and the registry that maps ability symbols to them.

use super::{
    DamageContext, Effect, EffectFactory, EffectKind, EffectScope, Prevent, StatChangeContext,
    StatusContext, SwitchContext,
};
use crate::battle::battler::BattlerId;
use crate::battle::logic::Logic;
use crate::battle::state::BattleEvent;
use crate::errors::BattleResult;
use schema::{DbSymbol, StatType, StatusType};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct AbilityRegistry {
    entries: HashMap<DbSymbol, EffectFactory>,
}

impl AbilityRegistry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register("limber", EffectKind::Limber, |owner| Box::new(Limber::new(owner)));
        registry.register("insomnia", EffectKind::Insomnia, |owner| Box::new(Insomnia::new(owner)));
        registry.register("clear_body", EffectKind::ClearBody, |owner| Box::new(ClearBody::new(owner)));
        registry.register("speed_boost", EffectKind::SpeedBoost, |owner| Box::new(SpeedBoost::new(owner)));
        registry.register("sturdy", EffectKind::Sturdy, |owner| Box::new(Sturdy::new(owner)));
        registry.register("intimidate", EffectKind::Intimidate, |owner| Box::new(Intimidate::new(owner)));
        registry
    }

    pub fn register(&mut self, ability: &str, kind: EffectKind, build: fn(BattlerId) -> Box<dyn Effect>) {
        self.entries.insert(DbSymbol::from(ability), EffectFactory { kind, build });
    }

    /// Effect for `ability` held by `owner`. Abilities without battle
    /// behavior have no entry.
    pub fn build(&self, ability: &DbSymbol, owner: BattlerId) -> Option<Box<dyn Effect>> {
        self.entries.get(ability).map(|factory| (factory.build)(owner))
    }

    pub fn kind_of(&self, ability: &DbSymbol) -> Option<EffectKind> {
        self.entries.get(ability).map(|factory| factory.kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn announce(logic: &mut Logic, battler: BattlerId) {
    if let Some(ability) = logic.battler(battler).ability.clone() {
        logic.emit(BattleEvent::AbilityActivated { battler, ability });
    }
}

macro_rules! ability_effect {
    ($name:ident) => {
        #[derive(Debug)]
        pub struct $name {
            owner: BattlerId,
        }

        impl $name {
            pub fn new(owner: BattlerId) -> Self {
                Self { owner }
            }
        }
    };
}

ability_effect!(Limber);
ability_effect!(Insomnia);
ability_effect!(ClearBody);
ability_effect!(SpeedBoost);
ability_effect!(Sturdy);
ability_effect!(Intimidate);

/// Shared body of the single-status immunities.
fn block_status(logic: &mut Logic, owner: BattlerId, ctx: &StatusContext, blocked: StatusType) -> Option<Prevent> {
    if ctx.target != owner || ctx.status != blocked {
        return None;
    }
    announce(logic, owner);
    Some(Prevent)
}

impl Effect for Limber {
    fn name(&self) -> EffectKind {
        EffectKind::Limber
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn on_status_prevention(&mut self, logic: &mut Logic, ctx: &StatusContext) -> BattleResult<Option<Prevent>> {
        Ok(block_status(logic, self.owner, ctx, StatusType::Paralysis))
    }
}

impl Effect for Insomnia {
    fn name(&self) -> EffectKind {
        EffectKind::Insomnia
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn on_status_prevention(&mut self, logic: &mut Logic, ctx: &StatusContext) -> BattleResult<Option<Prevent>> {
        Ok(block_status(logic, self.owner, ctx, StatusType::Sleep))
    }
}

impl Effect for ClearBody {
    fn name(&self) -> EffectKind {
        EffectKind::ClearBody
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn on_stat_decrease_prevention(&mut self, logic: &mut Logic, ctx: &StatChangeContext) -> BattleResult<Option<Prevent>> {
        if ctx.target != self.owner || !ctx.from_foe() {
            return Ok(None);
        }
        announce(logic, self.owner);
        Ok(Some(Prevent))
    }
}

impl Effect for SpeedBoost {
    fn name(&self) -> EffectKind {
        EffectKind::SpeedBoost
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        let battler = logic.battler(self.owner);
        if !battler.alive() || !battler.on_field() || battler.stage(StatType::Speed) >= crate::battle::battler::MAX_STAGE {
            return Ok(());
        }
        announce(logic, self.owner);
        logic
            .stat_change_handler()
            .stat_change(self.owner, StatType::Speed, 1, Some(self.owner))?;
        Ok(())
    }
}

impl Effect for Sturdy {
    fn name(&self) -> EffectKind {
        EffectKind::Sturdy
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    /// Survives a move that would knock it out from full HP.
    fn on_damage_endure(&mut self, logic: &mut Logic, ctx: &DamageContext) -> BattleResult<Option<u16>> {
        if ctx.target != self.owner || ctx.source.move_hit().is_none() {
            return Ok(None);
        }
        let battler = logic.battler(self.owner);
        let hp = battler.hp();
        if hp != battler.max_hp() || hp <= 1 || ctx.amount < hp {
            return Ok(None);
        }
        announce(logic, self.owner);
        Ok(Some(hp - 1))
    }
}

impl Effect for Intimidate {
    fn name(&self) -> EffectKind {
        EffectKind::Intimidate
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn on_switch_event(&mut self, logic: &mut Logic, ctx: &SwitchContext) -> BattleResult<()> {
        if ctx.incoming != self.owner || logic.battler(self.owner).is_fainted() {
            return Ok(());
        }
        announce(logic, self.owner);
        for foe in logic.alive_foes(self.owner) {
            logic
                .stat_change_handler()
                .stat_change(foe, StatType::Attack, -1, Some(self.owner))?;
        }
        Ok(())
    }
}
