use crate::battle::battler::{BattlerId, Position};
use crate::battle::effects::pokemon::StatusEffect;
use crate::battle::effects::{Effect, EffectScope, Hook, SwitchContext};
use crate::battle::logic::Logic;
use crate::battle::presentation::Animation;
use crate::battle::state::BattleEvent;
use crate::errors::{BattleResult, BattleStateError};
use tracing::debug;

#[derive(Debug)]
pub struct SwitchHandler<'a> {
    logic: &'a mut Logic,
}

impl<'a> SwitchHandler<'a> {
    pub(crate) fn new(logic: &'a mut Logic) -> Self {
        Self { logic }
    }

    /// Runs the switch prevention band for the outgoing battler.
    pub fn can_switch(&mut self, ctx: &SwitchContext) -> BattleResult<bool> {
        let Some(outgoing) = ctx.outgoing else {
            return Ok(true);
        };
        let logic = &mut *self.logic;
        let scopes = logic.scopes_for(&[outgoing]);
        let verdict = logic.dispatch_prevention(Hook::OnSwitchPrevention, &scopes, |effect, logic| {
            effect.on_switch_prevention(logic, ctx)
        })?;
        if verdict.is_some() {
            logic.emit(BattleEvent::SwitchPrevented { battler: outgoing });
            return Ok(false);
        }
        Ok(true)
    }

    /// Replaces whoever stands at `ctx.position` with `ctx.incoming`, then
    /// fires the switch-in hooks.
    pub fn execute_switch(&mut self, ctx: SwitchContext) -> BattleResult<()> {
        self.place(&ctx)?;
        self.announce(&ctx)
    }

    /// Sends in the first healthy benched battlers of every bank.
    ///
    /// Everyone is placed before any switch-in hook runs, so an entry ability
    /// sees every opponent.
    pub fn send_out_initial(&mut self) -> BattleResult<()> {
        let mut placed = Vec::new();
        let bank_count = self.logic.banks().len() as u8;
        for bank in 0..bank_count {
            let Some(slots) = self.logic.bank(bank).map(|b| b.slot_count()) else {
                continue;
            };
            for slot in 0..slots {
                let Some(party_index) = self
                    .logic
                    .bank(bank)
                    .and_then(|b| b.benched_healthy().first().copied())
                else {
                    break;
                };
                let ctx = SwitchContext {
                    outgoing: None,
                    incoming: BattlerId::new(bank, party_index),
                    position: Position::new(bank, slot),
                    baton_pass: false,
                };
                self.place(&ctx)?;
                placed.push(ctx);
            }
        }
        for ctx in &placed {
            if self.logic.battler(ctx.incoming).alive() {
                self.dispatch_switch_event(ctx)?;
            }
        }
        Ok(())
    }

    fn place(&mut self, ctx: &SwitchContext) -> BattleResult<()> {
        let logic = &mut *self.logic;
        let position = ctx.position;
        let incoming = ctx.incoming;
        let mut transferred: Vec<Box<dyn Effect>> = Vec::new();
        let mut stages = None;

        if let Some(outgoing) = ctx.outgoing {
            if ctx.baton_pass {
                transferred = logic
                    .effects()
                    .iter()
                    .filter(|(_, effect)| effect.scope() == EffectScope::Pokemon(outgoing))
                    .filter_map(|(_, effect)| effect.baton_switch_transfer(incoming))
                    .collect();
                stages = Some(*logic.battler(outgoing).stages());
                debug!(?outgoing, ?incoming, transferred = transferred.len(), "baton pass");
            }
            logic.kill_pokemon_effects(outgoing);
            logic.battler_mut(outgoing).on_switch_out();
            logic.emit(BattleEvent::PokemonRecalled { battler: outgoing });
            logic.play_animation(Animation::Recall { battler: outgoing });
        }

        logic
            .bank_mut(position.bank)
            .ok_or(BattleStateError::InvalidBank(position.bank))?
            .set_occupant(position.slot, Some(incoming.party_index));
        let battler = logic.battler_mut(incoming);
        battler.position = Some(position.slot);
        if let Some(stages) = stages {
            battler.set_stages(stages);
        }

        for effect in transferred {
            logic.add_effect(effect);
        }
        register_battler_effects(logic, incoming);

        logic.emit(BattleEvent::PokemonSentOut {
            battler: incoming,
            position,
        });
        logic.request_acknowledgement(Animation::SendOut {
            battler: incoming,
            position,
        });
        Ok(())
    }

    fn announce(&mut self, ctx: &SwitchContext) -> BattleResult<()> {
        self.dispatch_switch_event(ctx)?;
        self.logic.check_invariants()
    }

    fn dispatch_switch_event(&mut self, ctx: &SwitchContext) -> BattleResult<()> {
        let logic = &mut *self.logic;
        let scopes = logic.every_scope();
        logic.dispatch_notification(Hook::OnSwitchEvent, &scopes, |effect, logic| {
            effect.on_switch_event(logic, ctx)
        })
    }
}

/// Registers the ability, held item and major status effects a battler
/// carries onto the field.
pub(crate) fn register_battler_effects(logic: &mut Logic, id: BattlerId) {
    let registries = logic.registries();
    let battler = logic.battler(id);
    let ability = battler
        .ability
        .as_ref()
        .and_then(|ability| registries.abilities.build(ability, id));
    let item = battler
        .item
        .as_ref()
        .and_then(|item| registries.held_items.build(item, id));
    let status = battler.status.map(|condition| StatusEffect::new(id, condition));

    if let Some(effect) = ability {
        logic.add_effect(effect);
    }
    if let Some(effect) = item {
        logic.add_effect(effect);
    }
    if let Some(effect) = status {
        logic.add_effect(Box::new(effect));
    }
}
