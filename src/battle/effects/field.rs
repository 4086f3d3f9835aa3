//! Effects bound to the whole field.

use super::{hp_fraction, Countdown, Effect, EffectKind, EffectScope};
use crate::battle::logic::Logic;
use crate::battle::state::BattleEvent;
use crate::errors::BattleResult;
use schema::PokemonType;

#[derive(Debug)]
pub struct Sandstorm {
    turns: Countdown,
}

impl Sandstorm {
    pub const TURNS: u8 = 5;

    pub fn new() -> Self {
        Self {
            turns: Countdown::new(Self::TURNS),
        }
    }

    pub fn immune(types: &[PokemonType]) -> bool {
        types
            .iter()
            .any(|t| matches!(t, PokemonType::Rock | PokemonType::Ground | PokemonType::Steel))
    }
}

impl Default for Sandstorm {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Sandstorm {
    fn name(&self) -> EffectKind {
        EffectKind::Sandstorm
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Field
    }

    fn dead(&self) -> bool {
        self.turns.expired()
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        for target in logic.active_battlers() {
            let battler = logic.battler(target);
            if battler.is_fainted() || Self::immune(&battler.types) {
                continue;
            }
            let amount = hp_fraction(battler.max_hp(), 16);
            logic
                .damage_handler()
                .effect_damage(amount, target, EffectKind::Sandstorm)?;
        }
        if self.turns.tick() {
            logic.emit(BattleEvent::EffectEnded {
                kind: EffectKind::Sandstorm,
                scope: EffectScope::Field,
            });
        }
        Ok(())
    }
}

/// Slower battlers move first while active. Using Trick Room again ends it.
#[derive(Debug)]
pub struct TrickRoom {
    turns: Countdown,
}

impl TrickRoom {
    pub const TURNS: u8 = 5;

    pub fn new() -> Self {
        Self {
            turns: Countdown::new(Self::TURNS),
        }
    }
}

impl Default for TrickRoom {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for TrickRoom {
    fn name(&self) -> EffectKind {
        EffectKind::TrickRoom
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Field
    }

    fn dead(&self) -> bool {
        self.turns.expired()
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        if self.turns.tick() {
            logic.emit(BattleEvent::EffectEnded {
                kind: EffectKind::TrickRoom,
                scope: EffectScope::Field,
            });
        }
        Ok(())
    }
}
