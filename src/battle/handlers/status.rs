use crate::battle::battler::BattlerId;
use crate::battle::effects::pokemon::StatusEffect;
use crate::battle::effects::{EffectKind, EffectScope, Hook, StatusContext};
use crate::battle::logic::Logic;
use crate::battle::state::BattleEvent;
use crate::errors::BattleResult;
use crate::pokemon::StatusCondition;
use schema::{PokemonType, StatusType};
use tracing::debug;

/// Types that can never carry a given status.
pub fn status_immune(types: &[PokemonType], status: StatusType) -> bool {
    types.iter().any(|&t| match status {
        StatusType::Burn => t == PokemonType::Fire,
        StatusType::Freeze => t == PokemonType::Ice,
        StatusType::Poison | StatusType::Toxic => t == PokemonType::Poison || t == PokemonType::Steel,
        StatusType::Paralysis => t == PokemonType::Electric,
        StatusType::Sleep => false,
    })
}

#[derive(Debug)]
pub struct StatusHandler<'a> {
    logic: &'a mut Logic,
}

impl<'a> StatusHandler<'a> {
    pub(crate) fn new(logic: &'a mut Logic) -> Self {
        Self { logic }
    }

    /// Inflicts a major status. Returns whether it landed.
    ///
    /// `announce_failure` controls the "it failed" line; secondary effects of
    /// damaging moves fail silently.
    pub fn status_change(
        &mut self,
        target: BattlerId,
        status: StatusType,
        source: Option<BattlerId>,
        announce_failure: bool,
    ) -> BattleResult<bool> {
        let logic = &mut *self.logic;
        let battler = logic.battler(target);
        if battler.is_fainted() {
            return Ok(false);
        }
        if battler.status.is_some() || status_immune(&battler.types, status) {
            if announce_failure {
                logic.emit(BattleEvent::StatusFailed { target });
            }
            return Ok(false);
        }

        let ctx = StatusContext { target, status, source };
        let scopes = logic.scopes_for(&[target]);
        let verdict = logic.dispatch_prevention(Hook::OnStatusPrevention, &scopes, |effect, logic| {
            effect.on_status_prevention(logic, &ctx)
        })?;
        if verdict.is_some() {
            debug!(?target, %status, "status prevented");
            return Ok(false);
        }

        let condition = match status {
            StatusType::Poison => StatusCondition::Poison,
            StatusType::Toxic => StatusCondition::Toxic,
            StatusType::Paralysis => StatusCondition::Paralysis,
            StatusType::Burn => StatusCondition::Burn,
            StatusType::Freeze => StatusCondition::Freeze,
            StatusType::Sleep => StatusCondition::Sleep {
                turns_remaining: logic.rng().range(3, "sleep turns") as u8 + 1,
            },
        };
        logic.battler_mut(target).status = Some(condition);
        logic.add_effect(Box::new(StatusEffect::new(target, condition)));
        logic.emit(BattleEvent::StatusApplied { target, status });

        let mut involved = vec![target];
        if let Some(source) = source.filter(|&source| source != target) {
            involved.push(source);
        }
        let scopes = logic.scopes_for(&involved);
        logic.dispatch_notification(Hook::OnPostStatusChange, &scopes, |effect, logic| {
            effect.on_post_status_change(logic, &ctx)
        })?;
        Ok(true)
    }

    /// Clears the major status of `target`. Returns whether there was one.
    pub fn cure(&mut self, target: BattlerId) -> BattleResult<bool> {
        let logic = &mut *self.logic;
        let Some(condition) = logic.battler_mut(target).status.take() else {
            return Ok(false);
        };
        logic.kill_effects(EffectScope::Pokemon(target), EffectKind::Status);
        logic.emit(BattleEvent::StatusCured {
            target,
            status: condition.kind(),
        });
        Ok(true)
    }
}
