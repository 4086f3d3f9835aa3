//! Held item effects and their registry.

use super::{
    hp_fraction, DamageContext, Effect, EffectFactory, EffectKind, EffectScope, SpeedPriority,
};
use crate::battle::battler::BattlerId;
use crate::battle::logic::Logic;
use crate::battle::state::BattleEvent;
use crate::errors::BattleResult;
use schema::DbSymbol;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct HeldItemRegistry {
    entries: HashMap<DbSymbol, EffectFactory>,
}

impl HeldItemRegistry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register("leftovers", EffectKind::Leftovers, |owner| Box::new(Leftovers::new(owner)));
        registry.register("focus_sash", EffectKind::FocusSash, |owner| Box::new(FocusSash::new(owner)));
        registry.register("quick_claw", EffectKind::QuickClaw, |owner| Box::new(QuickClaw::new(owner)));
        registry
    }

    pub fn register(&mut self, item: &str, kind: EffectKind, build: fn(BattlerId) -> Box<dyn Effect>) {
        self.entries.insert(DbSymbol::from(item), EffectFactory { kind, build });
    }

    pub fn build(&self, item: &DbSymbol, owner: BattlerId) -> Option<Box<dyn Effect>> {
        self.entries.get(item).map(|factory| (factory.build)(owner))
    }

    pub fn kind_of(&self, item: &DbSymbol) -> Option<EffectKind> {
        self.entries.get(item).map(|factory| factory.kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn announce(logic: &mut Logic, battler: BattlerId, item: DbSymbol) {
    logic.emit(BattleEvent::HeldItemActivated { battler, item });
}

fn holds(logic: &Logic, owner: BattlerId, item: &str) -> bool {
    logic
        .battler(owner)
        .item
        .as_ref()
        .is_some_and(|held| held.as_str() == item)
}

#[derive(Debug)]
pub struct Leftovers {
    owner: BattlerId,
}

impl Leftovers {
    pub fn new(owner: BattlerId) -> Self {
        Self { owner }
    }
}

impl Effect for Leftovers {
    fn name(&self) -> EffectKind {
        EffectKind::Leftovers
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        let battler = logic.battler(self.owner);
        if !battler.alive() || battler.hp() == battler.max_hp() || !holds(logic, self.owner, "leftovers") {
            return Ok(());
        }
        let amount = hp_fraction(battler.max_hp(), 16);
        announce(logic, self.owner, DbSymbol::from("leftovers"));
        logic.damage_handler().heal(self.owner, amount)?;
        Ok(())
    }
}

/// Leaves the holder at 1 HP instead of fainting from full, once.
#[derive(Debug)]
pub struct FocusSash {
    owner: BattlerId,
    consumed: bool,
}

impl FocusSash {
    pub fn new(owner: BattlerId) -> Self {
        Self { owner, consumed: false }
    }
}

impl Effect for FocusSash {
    fn name(&self) -> EffectKind {
        EffectKind::FocusSash
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn dead(&self) -> bool {
        self.consumed
    }

    fn on_damage_endure(&mut self, logic: &mut Logic, ctx: &DamageContext) -> BattleResult<Option<u16>> {
        if ctx.target != self.owner || ctx.source.move_hit().is_none() || !holds(logic, self.owner, "focus_sash") {
            return Ok(None);
        }
        let battler = logic.battler(self.owner);
        let hp = battler.hp();
        if hp != battler.max_hp() || hp <= 1 || ctx.amount < hp {
            return Ok(None);
        }
        self.consumed = true;
        if let Some(item) = logic.battler_mut(self.owner).consume_item() {
            announce(logic, self.owner, item);
        }
        Ok(Some(hp - 1))
    }
}

#[derive(Debug)]
pub struct QuickClaw {
    owner: BattlerId,
}

impl QuickClaw {
    pub const CHANCE: u8 = 20;

    pub fn new(owner: BattlerId) -> Self {
        Self { owner }
    }
}

impl Effect for QuickClaw {
    fn name(&self) -> EffectKind {
        EffectKind::QuickClaw
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Pokemon(self.owner)
    }

    fn on_speed_priority(&mut self, logic: &mut Logic, user: BattlerId) -> BattleResult<Option<SpeedPriority>> {
        if user != self.owner || !holds(logic, self.owner, "quick_claw") {
            return Ok(None);
        }
        if !logic.rng().chance(Self::CHANCE, "quick claw") {
            return Ok(None);
        }
        Ok(Some(SpeedPriority {
            value: 1,
            announce_item: Some(DbSymbol::from("quick_claw")),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry() {
        let registry = HeldItemRegistry::standard();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.kind_of(&DbSymbol::from("leftovers")), Some(EffectKind::Leftovers));
        assert!(registry.build(&DbSymbol::from("potion"), BattlerId::new(0, 0)).is_none());
    }
}
