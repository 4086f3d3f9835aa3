//! The battle context passed to every handler and effect.
//!
//! `Logic` owns the banks, the effect registry, the RNG stream, the event log
//! and the presentation sink. Nothing else holds battle state, so every
//! mutation is reachable from here and flows through the handlers it hands
//! out.

use crate::battle::actions::item::UsableItemRegistry;
use crate::battle::actions::Action;
use crate::battle::bank::{Bank, BankSetup};
use crate::battle::battler::{Battler, BattlerId, Position, MAX_STAGE, MIN_STAGE};
use crate::battle::calculators;
use crate::battle::effects::abilities::AbilityRegistry;
use crate::battle::effects::held_items::HeldItemRegistry;
use crate::battle::effects::{
    Effect, EffectId, EffectKind, EffectScope, EffectsHandler, Hook, HookKind,
};
use crate::battle::handlers::{DamageHandler, StatChangeHandler, StatusHandler, SwitchHandler};
use crate::battle::moves::MoveProcedures;
use crate::battle::presentation::{Animation, AnimationAck, PresentationSink};
use crate::battle::rng::{BattleRng, SeededRng};
use crate::battle::state::{BattleEvent, BattleOutcome, EventBus};
use crate::config::BattleConfig;
use crate::database::StaticDatabase;
use crate::errors::{BattleResult, BattleStateError, DataError, DataResult, InvariantViolation};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Lookup tables resolved once at battle setup.
#[derive(Debug)]
pub struct Registries {
    pub moves: MoveProcedures,
    pub abilities: AbilityRegistry,
    pub held_items: HeldItemRegistry,
    pub usable_items: UsableItemRegistry,
}

impl Registries {
    pub fn build(db: &StaticDatabase) -> DataResult<Self> {
        let moves = MoveProcedures::standard();
        db.validate_move_procedures(|method| moves.contains(method))?;
        Ok(Self {
            moves,
            abilities: AbilityRegistry::standard(),
            held_items: HeldItemRegistry::standard(),
            usable_items: UsableItemRegistry::from_database(db),
        })
    }
}

/// Builds the RNG a config asks for.
pub fn rng_from_config(config: &BattleConfig) -> Box<dyn BattleRng> {
    match config.seed {
        Some(seed) => Box::new(SeededRng::new(seed)),
        None => Box::new(SeededRng::from_entropy()),
    }
}

#[derive(Debug)]
pub struct Logic {
    db: Arc<StaticDatabase>,
    config: BattleConfig,
    pub(crate) banks: Vec<Bank>,
    pub(crate) effects: EffectsHandler,
    rng: Box<dyn BattleRng>,
    events: EventBus,
    sink: Box<dyn PresentationSink>,
    pub(crate) turn: u32,
    pub(crate) appended_actions: Vec<Action>,
    pub(crate) pending_end: Option<BattleOutcome>,
    pub(crate) awaiting_ack: bool,
    pub(crate) registries: Arc<Registries>,
    traced_hooks: HashSet<Hook>,
}

impl Logic {
    pub fn new(
        db: Arc<StaticDatabase>,
        config: BattleConfig,
        setups: &[BankSetup],
        rng: Box<dyn BattleRng>,
        sink: Box<dyn PresentationSink>,
    ) -> BattleResult<Self> {
        config.validate()?;
        let traced_hooks = config.traced_hook_set()?;
        if setups.len() < 2 {
            return Err(DataError::InvalidConfig("a battle needs at least two banks".to_string()).into());
        }
        let registries = Registries::build(&db)?;
        let banks = setups
            .iter()
            .enumerate()
            .map(|(index, setup)| Bank::new(index as u8, setup, config.vs_type, &db))
            .collect::<DataResult<Vec<_>>>()?;

        debug!(banks = banks.len(), vs_type = config.vs_type, "battle logic created");

        Ok(Self {
            db,
            config,
            banks,
            effects: EffectsHandler::new(),
            rng,
            events: EventBus::new(),
            sink,
            turn: 0,
            appended_actions: Vec::new(),
            pending_end: None,
            awaiting_ack: false,
            registries: Arc::new(registries),
            traced_hooks,
        })
    }

    // --- Accessors ---

    pub fn db(&self) -> &StaticDatabase {
        &self.db
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn rng(&mut self) -> &mut dyn BattleRng {
        self.rng.as_mut()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn registries(&self) -> Arc<Registries> {
        Arc::clone(&self.registries)
    }

    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    pub fn bank(&self, index: u8) -> Option<&Bank> {
        self.banks.get(index as usize)
    }

    pub(crate) fn bank_mut(&mut self, index: u8) -> Option<&mut Bank> {
        self.banks.get_mut(index as usize)
    }

    /// Panics on an id that was not handed out by this battle.
    pub fn battler(&self, id: BattlerId) -> &Battler {
        &self.banks[id.bank as usize].party[id.party_index as usize]
    }

    pub(crate) fn battler_mut(&mut self, id: BattlerId) -> &mut Battler {
        &mut self.banks[id.bank as usize].party[id.party_index as usize]
    }

    pub fn try_battler(&self, id: BattlerId) -> BattleResult<&Battler> {
        self.bank(id.bank)
            .and_then(|bank| bank.battler(id.party_index))
            .ok_or_else(|| {
                BattleStateError::InvalidBattler {
                    bank: id.bank,
                    party_index: id.party_index,
                }
                .into()
            })
    }

    /// Display name, prefixed for battlers outside bank 0.
    pub fn battler_label(&self, id: BattlerId) -> String {
        let battler = self.battler(id);
        if id.bank == 0 {
            battler.display_name().to_string()
        } else {
            format!("The opposing {}", battler.display_name())
        }
    }

    /// Whoever occupies `position`, fainted or not.
    pub fn battler_at(&self, position: Position) -> Option<&Battler> {
        let bank = self.bank(position.bank)?;
        bank.occupant(position.slot).and_then(|index| bank.battler(index))
    }

    pub fn alive_battler_at(&self, position: Position) -> Option<BattlerId> {
        self.battler_at(position)
            .filter(|battler| battler.alive())
            .map(|battler| battler.id)
    }

    pub fn position_of(&self, id: BattlerId) -> Option<Position> {
        self.battler(id).position.map(|slot| Position::new(id.bank, slot))
    }

    pub fn all_positions(&self) -> Vec<Position> {
        self.banks
            .iter()
            .flat_map(|bank| (0..bank.slot_count()).map(move |slot| Position::new(bank.index, slot)))
            .collect()
    }

    /// Living battlers on the field, in bank then slot order.
    pub fn active_battlers(&self) -> Vec<BattlerId> {
        self.all_positions()
            .into_iter()
            .filter_map(|position| self.alive_battler_at(position))
            .collect()
    }

    pub fn alive_foes(&self, id: BattlerId) -> Vec<BattlerId> {
        self.active_battlers()
            .into_iter()
            .filter(|other| other.bank != id.bank)
            .collect()
    }

    pub fn effective_speed(&self, id: BattlerId) -> u32 {
        calculators::effective_speed(self.battler(id))
    }

    pub fn trick_room_active(&self) -> bool {
        self.has_effect(EffectScope::Field, EffectKind::TrickRoom)
    }

    // --- Handlers ---

    pub fn damage_handler(&mut self) -> DamageHandler<'_> {
        DamageHandler::new(self)
    }

    pub fn status_handler(&mut self) -> StatusHandler<'_> {
        StatusHandler::new(self)
    }

    pub fn stat_change_handler(&mut self) -> StatChangeHandler<'_> {
        StatChangeHandler::new(self)
    }

    pub fn switch_handler(&mut self) -> SwitchHandler<'_> {
        SwitchHandler::new(self)
    }

    // --- Events and presentation ---

    /// Records an event and forwards its text to the sink.
    pub fn emit(&mut self, event: BattleEvent) {
        if let Some(text) = event.format(self) {
            if event.waits_for_player() {
                self.sink.display_message_and_wait(&text);
            } else {
                self.sink.display_message(&text);
            }
        }
        self.events.push(event);
    }

    pub fn play_animation(&mut self, animation: Animation) {
        self.sink.play_animation(&animation);
    }

    /// Plays an animation and parks the turn if the sink has not finished it.
    pub(crate) fn request_acknowledgement(&mut self, animation: Animation) {
        if self.sink.request_acknowledgement(&animation) == AnimationAck::Pending {
            debug!(?animation, "waiting for animation acknowledgement");
            self.awaiting_ack = true;
        }
    }

    pub(crate) fn append_action(&mut self, action: Action) {
        self.appended_actions.push(action);
    }

    pub(crate) fn end_battle(&mut self, outcome: BattleOutcome) {
        if self.pending_end.is_none() {
            self.pending_end = Some(outcome);
        }
    }

    // --- Effects ---

    pub fn effects(&self) -> &EffectsHandler {
        &self.effects
    }

    pub fn add_effect(&mut self, effect: Box<dyn Effect>) -> EffectId {
        debug!(kind = %effect.name(), scope = ?effect.scope(), "effect added");
        self.effects.add(effect)
    }

    pub fn has_effect(&self, scope: EffectScope, kind: EffectKind) -> bool {
        self.effects.has(scope, kind)
    }

    pub fn find_effect(&self, scope: EffectScope, kind: EffectKind) -> Option<EffectId> {
        self.effects.find(scope, kind)
    }

    pub fn find_effect_as<T: Effect>(&self, scope: EffectScope, kind: EffectKind) -> Option<&T> {
        self.effects.find_as::<T>(scope, kind)
    }

    pub fn find_effect_as_mut<T: Effect>(&mut self, scope: EffectScope, kind: EffectKind) -> Option<&mut T> {
        self.effects.find_as_mut::<T>(scope, kind)
    }

    pub fn kill_effect(&mut self, id: EffectId) {
        trace!(id, "effect killed");
        self.effects.kill(id);
    }

    pub fn kill_effects(&mut self, scope: EffectScope, kind: EffectKind) -> usize {
        self.effects
            .kill_where(|effect_scope, effect_kind| effect_scope == scope && effect_kind == kind)
    }

    /// Kills every effect bound to `battler`.
    pub fn kill_pokemon_effects(&mut self, battler: BattlerId) -> usize {
        self.effects
            .kill_where(|scope, _| scope == EffectScope::Pokemon(battler))
    }

    /// Removes dead effects, calling `on_delete` once for each in registry order.
    pub fn purge_dead_effects(&mut self) -> BattleResult<()> {
        let removed = self.effects.drain_dead();
        for mut effect in removed {
            debug!(kind = %effect.name(), scope = ?effect.scope(), "effect purged");
            effect.on_delete(self)?;
        }
        Ok(())
    }

    // --- Dispatch ---

    /// Hook scopes around `battlers`: their pokemon effects, then their
    /// positions, then their banks, then the field.
    pub fn scopes_for(&self, battlers: &[BattlerId]) -> Vec<EffectScope> {
        let mut scopes = Vec::new();
        for &battler in battlers {
            push_unique(&mut scopes, EffectScope::Pokemon(battler));
        }
        for &battler in battlers {
            if let Some(position) = self.position_of(battler) {
                push_unique(&mut scopes, EffectScope::Position(position));
            }
        }
        for &battler in battlers {
            push_unique(&mut scopes, EffectScope::Bank(battler.bank));
        }
        scopes.push(EffectScope::Field);
        scopes
    }

    /// Every scope, in end-of-turn order: battlers in slot order, positions,
    /// banks, then the field.
    pub fn every_scope(&self) -> Vec<EffectScope> {
        let positions = self.all_positions();
        let mut scopes: Vec<EffectScope> = positions
            .iter()
            .filter_map(|&position| self.battler_at(position))
            .map(|battler| EffectScope::Pokemon(battler.id))
            .collect();
        scopes.extend(positions.into_iter().map(EffectScope::Position));
        scopes.extend(self.banks.iter().map(|bank| EffectScope::Bank(bank.index)));
        scopes.push(EffectScope::Field);
        scopes
    }

    fn trace_visit(&self, hook: Hook, id: EffectId, effect: &dyn Effect) {
        if self.traced_hooks.contains(&hook) {
            debug!(%hook, id, kind = %effect.name(), scope = ?effect.scope(), "hook visit");
        } else {
            trace!(%hook, id, kind = %effect.name(), "hook visit");
        }
    }

    /// Runs a prevention or query hook over a snapshot of the effects in
    /// `scopes`, stopping at the first verdict.
    pub fn dispatch_prevention<R>(
        &mut self,
        hook: Hook,
        scopes: &[EffectScope],
        mut call: impl FnMut(&mut dyn Effect, &mut Logic) -> BattleResult<Option<R>>,
    ) -> BattleResult<Option<R>> {
        debug_assert_ne!(hook.kind(), HookKind::Notification);
        let snapshot = self.effects.snapshot(scopes);
        trace!(%hook, effects = snapshot.len(), "dispatch");
        for id in snapshot {
            let Some(mut effect) = self.effects.take(id) else {
                continue;
            };
            if effect.dead() {
                self.effects.restore(id, effect);
                continue;
            }
            self.trace_visit(hook, id, effect.as_ref());
            let verdict = call(effect.as_mut(), self);
            self.effects.restore(id, effect);
            if let Some(verdict) = verdict? {
                trace!(%hook, id, "dispatch short-circuited");
                return Ok(Some(verdict));
            }
        }
        Ok(None)
    }

    /// Runs a notification hook over every live effect of a snapshot.
    pub fn dispatch_notification(
        &mut self,
        hook: Hook,
        scopes: &[EffectScope],
        mut call: impl FnMut(&mut dyn Effect, &mut Logic) -> BattleResult<()>,
    ) -> BattleResult<()> {
        debug_assert_eq!(hook.kind(), HookKind::Notification);
        let snapshot = self.effects.snapshot(scopes);
        trace!(%hook, effects = snapshot.len(), "dispatch");
        for id in snapshot {
            let Some(mut effect) = self.effects.take(id) else {
                continue;
            };
            if effect.dead() {
                self.effects.restore(id, effect);
                continue;
            }
            self.trace_visit(hook, id, effect.as_ref());
            let result = call(effect.as_mut(), self);
            self.effects.restore(id, effect);
            result?;
        }
        Ok(())
    }

    // --- Turn bookkeeping ---

    pub(crate) fn begin_turn(&mut self) {
        self.turn += 1;
        for bank in &mut self.banks {
            for battler in &mut bank.party {
                battler.moved_this_turn = false;
            }
        }
    }

    /// Win/loss/flee/draw, from bank 0's point of view.
    pub fn evaluate_outcome(&self) -> Option<BattleOutcome> {
        if let Some(outcome) = self.pending_end {
            return Some(outcome);
        }
        let player_out = self.banks[0].all_fainted();
        let foes_out = self.banks[1..].iter().all(|bank| bank.all_fainted());
        match (player_out, foes_out) {
            (true, true) => Some(BattleOutcome::Draw),
            (false, true) => Some(BattleOutcome::Win),
            (true, false) => Some(BattleOutcome::Loss),
            (false, false) => None,
        }
    }

    /// Verifies HP and stage bounds for every battler.
    pub fn check_invariants(&self) -> BattleResult<()> {
        for battler in self.banks.iter().flat_map(|bank| bank.party.iter()) {
            if battler.hp() > battler.max_hp() || (battler.hp() == 0) != battler.is_fainted() {
                return Err(InvariantViolation::HpOutOfRange {
                    hp: battler.hp(),
                    max_hp: battler.max_hp(),
                    fainted: battler.is_fainted(),
                }
                .into());
            }
            if let Some((_, stage)) = battler
                .stages()
                .iter()
                .find(|(_, stage)| !(MIN_STAGE..=MAX_STAGE).contains(stage))
            {
                return Err(InvariantViolation::StageOutOfRange { stage }.into());
            }
        }
        Ok(())
    }
}

fn push_unique(scopes: &mut Vec<EffectScope>, scope: EffectScope) {
    if !scopes.contains(&scope) {
        scopes.push(scope);
    }
}
