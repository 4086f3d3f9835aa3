use crate::battle::battler::BattlerId;
use crate::battle::effects::{DamageContext, DamagePrevention, DamageSource, EffectKind, Hook};
use crate::battle::logic::Logic;
use crate::battle::presentation::Animation;
use crate::battle::state::BattleEvent;
use crate::errors::BattleResult;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Prevented,
    Dealt { amount: u16, fainted: bool },
}

impl DamageOutcome {
    pub fn dealt(&self) -> u16 {
        match self {
            DamageOutcome::Prevented => 0,
            DamageOutcome::Dealt { amount, .. } => *amount,
        }
    }

    pub fn fainted(&self) -> bool {
        matches!(self, DamageOutcome::Dealt { fainted: true, .. })
    }
}

#[derive(Debug)]
pub struct DamageHandler<'a> {
    logic: &'a mut Logic,
}

impl<'a> DamageHandler<'a> {
    pub(crate) fn new(logic: &'a mut Logic) -> Self {
        Self { logic }
    }

    /// Deals `amount` to `target` after the damage prevention band. Endure
    /// effects are asked only once no effect prevented the hit.
    ///
    /// `on_post_damage_death` fires instead of `on_post_damage` when the hit
    /// takes the target to 0 HP. Pokemon-tied effects of a fainted battler
    /// are killed once the death band has run.
    pub fn damage_change(&mut self, amount: u16, target: BattlerId, source: DamageSource) -> BattleResult<DamageOutcome> {
        let logic = &mut *self.logic;
        if logic.battler(target).is_fainted() {
            return Ok(DamageOutcome::Prevented);
        }

        let mut ctx = DamageContext { target, amount, source };
        let mut involved = vec![target];
        if let Some(attacker) = ctx.source.foe_attacker(target) {
            involved.push(attacker);
        }
        let scopes = logic.scopes_for(&involved);

        let verdict = logic.dispatch_prevention(Hook::OnDamagePrevention, &scopes, |effect, logic| {
            effect.on_damage_prevention(logic, &ctx)
        })?;
        match verdict {
            Some(DamagePrevention::Prevent) => {
                debug!(?target, amount, "damage prevented");
                return Ok(DamageOutcome::Prevented);
            }
            Some(DamagePrevention::Replace(replacement)) => {
                debug!(?target, amount, replacement, "damage replaced");
                ctx.amount = replacement;
            }
            None => {}
        }
        let endured = logic.dispatch_prevention(Hook::OnDamageEndure, &scopes, |effect, logic| {
            effect.on_damage_endure(logic, &ctx)
        })?;
        if let Some(endured) = endured {
            debug!(?target, amount = ctx.amount, endured, "damage endured");
            ctx.amount = endured;
        }

        let battler = logic.battler_mut(target);
        let before = battler.hp();
        let fainted = battler.set_hp(before as i32 - ctx.amount as i32);
        let remaining_hp = battler.hp();
        let dealt = before - remaining_hp;
        if fainted {
            battler.status = None;
        }

        logic.emit(BattleEvent::DamageDealt {
            target,
            damage: dealt,
            remaining_hp,
        });

        if fainted {
            logic.emit(BattleEvent::Fainted { battler: target });
            logic.play_animation(Animation::Faint { battler: target });
            logic.dispatch_notification(Hook::OnPostDamageDeath, &scopes, |effect, logic| {
                effect.on_post_damage_death(logic, &ctx)
            })?;
            logic.kill_pokemon_effects(target);
            award_evs(logic, target)?;
        } else {
            logic.dispatch_notification(Hook::OnPostDamage, &scopes, |effect, logic| {
                effect.on_post_damage(logic, &ctx, dealt)
            })?;
        }

        logic.check_invariants()?;
        Ok(DamageOutcome::Dealt { amount: dealt, fainted })
    }

    /// Restores up to `amount` HP and returns what was actually healed.
    pub fn heal(&mut self, target: BattlerId, amount: u16) -> BattleResult<u16> {
        let logic = &mut *self.logic;
        let battler = logic.battler_mut(target);
        if battler.is_fainted() || amount == 0 {
            return Ok(0);
        }
        let before = battler.hp();
        battler.set_hp(before as i32 + amount as i32);
        let new_hp = battler.hp();
        let healed = new_hp - before;
        if healed > 0 {
            logic.emit(BattleEvent::Healed {
                target,
                amount: healed,
                new_hp,
            });
        }
        logic.check_invariants()?;
        Ok(healed)
    }

    /// Damage a battler takes from one of its own effects or from the field.
    pub fn effect_damage(&mut self, amount: u16, target: BattlerId, kind: EffectKind) -> BattleResult<DamageOutcome> {
        if self.logic.battler(target).is_fainted() {
            return Ok(DamageOutcome::Prevented);
        }
        self.logic.emit(BattleEvent::EffectDamage { target, kind });
        self.damage_change(amount, target, DamageSource::Effect(kind))
    }
}

/// Bank 0 battlers on the field earn the fainted foe's EV yield.
fn award_evs(logic: &mut Logic, fainted: BattlerId) -> BattleResult<()> {
    if fainted.bank == 0 {
        return Ok(());
    }
    let species = logic.battler(fainted).species.clone();
    let ev_yield = logic.db().lookup_creature(&species)?.ev_yield;
    if ev_yield.iter().all(|&ev| ev == 0) {
        return Ok(());
    }
    let earners: Vec<BattlerId> = logic
        .active_battlers()
        .into_iter()
        .filter(|id| id.bank == 0)
        .collect();
    for earner in earners {
        logic.battler_mut(earner).gain_evs(&ev_yield);
        logic.emit(BattleEvent::EvsGained { battler: earner });
    }
    Ok(())
}
