use crate::battle::battler::BattlerId;
use crate::battle::effects::{Hook, StatChangeContext};
use crate::battle::logic::Logic;
use crate::battle::presentation::Animation;
use crate::battle::state::BattleEvent;
use crate::errors::BattleResult;
use schema::StatType;
use tracing::debug;

#[derive(Debug)]
pub struct StatChangeHandler<'a> {
    logic: &'a mut Logic,
}

impl<'a> StatChangeHandler<'a> {
    pub(crate) fn new(logic: &'a mut Logic) -> Self {
        Self { logic }
    }

    /// Changes a stage by `amount` and returns the delta actually applied.
    ///
    /// A stage already at its limit reports the limit instead of a change.
    pub fn stat_change(
        &mut self,
        target: BattlerId,
        stat: StatType,
        amount: i8,
        source: Option<BattlerId>,
    ) -> BattleResult<i8> {
        let logic = &mut *self.logic;
        if amount == 0 || logic.battler(target).is_fainted() {
            return Ok(0);
        }

        let ctx = StatChangeContext {
            target,
            stat,
            amount,
            source,
        };
        let scopes = logic.scopes_for(&[target]);
        let verdict = if amount > 0 {
            logic.dispatch_prevention(Hook::OnStatIncreasePrevention, &scopes, |effect, logic| {
                effect.on_stat_increase_prevention(logic, &ctx)
            })?
        } else {
            logic.dispatch_prevention(Hook::OnStatDecreasePrevention, &scopes, |effect, logic| {
                effect.on_stat_decrease_prevention(logic, &ctx)
            })?
        };
        if verdict.is_some() {
            debug!(?target, %stat, amount, "stat change prevented");
            return Ok(0);
        }

        let battler = logic.battler_mut(target);
        let old_stage = battler.stage(stat);
        let delta = battler.change_stat(stat, amount);
        let new_stage = battler.stage(stat);

        if delta == 0 {
            logic.emit(BattleEvent::StatStageLimit {
                target,
                stat,
                rising: amount > 0,
            });
        } else {
            logic.play_animation(Animation::StatChange {
                target,
                stat,
                rising: delta > 0,
            });
            logic.emit(BattleEvent::StatStageChanged {
                target,
                stat,
                old_stage,
                new_stage,
            });
        }

        logic.check_invariants()?;
        Ok(delta)
    }
}
