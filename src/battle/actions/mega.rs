use crate::battle::battler::BattlerId;
use crate::battle::effects::EffectScope;
use crate::battle::logic::Logic;
use crate::battle::presentation::Animation;
use crate::battle::state::BattleEvent;
use crate::errors::BattleResult;
use schema::MegaForm;
use tracing::debug;

/// The mega form `user` can enter right now, if any. Requires the form's
/// stone as held item and an unused mega for the bank.
pub fn available_form(logic: &Logic, user: BattlerId) -> Option<MegaForm> {
    let battler = logic.battler(user);
    if battler.mega_evolved || !battler.alive() || !battler.on_field() {
        return None;
    }
    if logic.bank(user.bank).map_or(true, |bank| bank.mega_used) {
        return None;
    }
    let form = logic.db().lookup_creature(&battler.species).ok()?.mega.clone()?;
    (battler.item.as_ref() == Some(&form.mega_stone)).then_some(form)
}

pub fn execute(logic: &mut Logic, user: BattlerId) -> BattleResult<()> {
    let Some(form) = available_form(logic, user) else {
        debug!(?user, "mega evolution no longer available");
        return Ok(());
    };

    let registries = logic.registries();
    if let Some(kind) = logic
        .battler(user)
        .ability
        .as_ref()
        .and_then(|ability| registries.abilities.kind_of(ability))
    {
        logic.kill_effects(EffectScope::Pokemon(user), kind);
    }

    logic.battler_mut(user).mega_evolve(&form);
    if let Some(bank) = logic.bank_mut(user.bank) {
        bank.mega_used = true;
    }
    if let Some(effect) = registries.abilities.build(&form.ability, user) {
        logic.add_effect(effect);
    }

    logic.play_animation(Animation::MegaEvolution { battler: user });
    logic.emit(BattleEvent::MegaEvolved {
        battler: user,
        form: form.name,
    });
    Ok(())
}
