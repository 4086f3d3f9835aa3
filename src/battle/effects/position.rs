//! Effects bound to a (bank, slot) position rather than a battler.

use super::{Countdown, Effect, EffectKind, EffectScope};
use crate::battle::battler::Position;
use crate::battle::logic::Logic;
use crate::battle::state::BattleEvent;
use crate::errors::BattleResult;

/// Heals whoever occupies the position when the wish comes true.
#[derive(Debug)]
pub struct Wish {
    position: Position,
    amount: u16,
    turns: Countdown,
}

impl Wish {
    pub const TURNS: u8 = 2;

    pub fn new(position: Position, amount: u16) -> Self {
        Self {
            position,
            amount,
            turns: Countdown::new(Self::TURNS),
        }
    }
}

impl Effect for Wish {
    fn name(&self) -> EffectKind {
        EffectKind::Wish
    }

    fn scope(&self) -> EffectScope {
        EffectScope::Position(self.position)
    }

    fn dead(&self) -> bool {
        self.turns.expired()
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        if !self.turns.tick() {
            return Ok(());
        }
        let Some(target) = logic.alive_battler_at(self.position) else {
            return Ok(());
        };
        logic.emit(BattleEvent::EffectHeal {
            target,
            kind: EffectKind::Wish,
        });
        logic.damage_handler().heal(target, self.amount)?;
        Ok(())
    }
}
