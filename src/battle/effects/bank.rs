//! Effects bound to one side of the battle.

use super::{hp_fraction, Countdown, Effect, EffectKind, EffectScope, Prevent, StatChangeContext, StatusContext, SwitchContext};
use crate::battle::logic::Logic;
use crate::battle::state::BattleEvent;
use crate::errors::BattleResult;
use schema::PokemonType;

/// Max-HP divisor of Stealth Rock for a given Rock effectiveness.
pub fn stealth_rock_divisor(effectiveness: f32) -> Option<u16> {
    match effectiveness {
        m if m <= 0.0 => None,
        m if m <= 0.25 => Some(32),
        m if m <= 0.5 => Some(16),
        m if m <= 1.0 => Some(8),
        m if m <= 2.0 => Some(4),
        _ => Some(2),
    }
}

#[derive(Debug)]
pub struct StealthRock {
    bank: u8,
}

impl StealthRock {
    pub fn new(bank: u8) -> Self {
        Self { bank }
    }
}

impl Effect for StealthRock {
    fn name(&self) -> EffectKind {
        EffectKind::StealthRock
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Bank(self.bank)
    }

    fn on_switch_event(&mut self, logic: &mut Logic, ctx: &SwitchContext) -> BattleResult<()> {
        if ctx.incoming.bank != self.bank || logic.battler(ctx.incoming).is_fainted() {
            return Ok(());
        }
        let battler = logic.battler(ctx.incoming);
        let effectiveness = logic.db().type_effectiveness(PokemonType::Rock, &battler.types);
        let Some(divisor) = stealth_rock_divisor(effectiveness) else {
            return Ok(());
        };
        let amount = hp_fraction(battler.max_hp(), divisor);
        logic
            .damage_handler()
            .effect_damage(amount, ctx.incoming, EffectKind::StealthRock)?;
        Ok(())
    }
}

/// Shields a bank from foe stat drops for a few turns.
#[derive(Debug)]
pub struct Mist {
    bank: u8,
    turns: Countdown,
}

impl Mist {
    pub const TURNS: u8 = 5;

    pub fn new(bank: u8) -> Self {
        Self {
            bank,
            turns: Countdown::new(Self::TURNS),
        }
    }
}

impl Effect for Mist {
    fn name(&self) -> EffectKind {
        EffectKind::Mist
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Bank(self.bank)
    }

    fn dead(&self) -> bool {
        self.turns.expired()
    }

    fn on_stat_decrease_prevention(&mut self, logic: &mut Logic, ctx: &StatChangeContext) -> BattleResult<Option<Prevent>> {
        if ctx.target.bank != self.bank || !ctx.from_foe() {
            return Ok(None);
        }
        logic.emit(BattleEvent::EffectBlocked {
            kind: EffectKind::Mist,
            target: ctx.target,
        });
        Ok(Some(Prevent))
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        if self.turns.tick() {
            logic.emit(BattleEvent::EffectEnded {
                kind: EffectKind::Mist,
                scope: self.scope(),
            });
        }
        Ok(())
    }
}

/// Shields a bank from foe-inflicted major status.
#[derive(Debug)]
pub struct Safeguard {
    bank: u8,
    turns: Countdown,
}

impl Safeguard {
    pub const TURNS: u8 = 5;

    pub fn new(bank: u8) -> Self {
        Self {
            bank,
            turns: Countdown::new(Self::TURNS),
        }
    }
}

impl Effect for Safeguard {
    fn name(&self) -> EffectKind {
        EffectKind::Safeguard
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Bank(self.bank)
    }

    fn dead(&self) -> bool {
        self.turns.expired()
    }

    fn on_status_prevention(&mut self, logic: &mut Logic, ctx: &StatusContext) -> BattleResult<Option<Prevent>> {
        if ctx.target.bank != self.bank || !ctx.from_foe() {
            return Ok(None);
        }
        logic.emit(BattleEvent::EffectBlocked {
            kind: EffectKind::Safeguard,
            target: ctx.target,
        });
        Ok(Some(Prevent))
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        if self.turns.tick() {
            logic.emit(BattleEvent::EffectEnded {
                kind: EffectKind::Safeguard,
                scope: self.scope(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.25, Some(32))]
    #[case(0.5, Some(16))]
    #[case(1.0, Some(8))]
    #[case(2.0, Some(4))]
    #[case(4.0, Some(2))]
    #[case(0.0, None)]
    fn test_stealth_rock_tiers(#[case] effectiveness: f32, #[case] divisor: Option<u16>) {
        assert_eq!(stealth_rock_divisor(effectiveness), divisor);
    }
}
