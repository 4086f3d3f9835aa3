//! The turn executor.
//!
//! A round moves through `AwaitingActions -> BuildQueue -> ExecuteNext ->
//! ActionDone -> ... -> EndTurnHooks -> PurgeDead` and back to
//! `AwaitingActions`, or stops in `BattleOver`. Each call to [`Battle::step`]
//! advances exactly one phase, and dead effects are purged after every phase.
//! `TurnBlocked` is the only suspension point: the round waits there until the
//! caller reports that a pending animation finished.

use crate::battle::actions::{mega, Action, ActionQueue, FleeKind, TargetSpec};
use crate::battle::bank::BankSetup;
use crate::battle::battler::{BattlerId, Position};
use crate::battle::effects::{Hook, SwitchContext};
use crate::battle::logic::Logic;
use crate::battle::presentation::PresentationSink;
use crate::battle::rng::BattleRng;
use crate::battle::state::{BattleEvent, BattleOutcome};
use crate::config::BattleConfig;
use crate::database::StaticDatabase;
use crate::errors::{ActionError, BattleResult, BattleStateError};
use crate::pokemon::PokemonRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    AwaitingActions,
    BuildQueue,
    ExecuteNext,
    ActionDone,
    /// Parked until [`Battle::acknowledge_animation`] is called.
    TurnBlocked,
    EndTurnHooks,
    PurgeDead,
    BattleOver(BattleOutcome),
}

/// What a finished battle leaves behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    pub outcome: Option<BattleOutcome>,
    pub turns: u32,
    /// Party records per bank, with battle-only changes rolled back.
    pub parties: Vec<Vec<PokemonRecord>>,
}

#[derive(Debug)]
pub struct Battle {
    logic: Logic,
    phase: TurnPhase,
    committed: Vec<Action>,
    queue: ActionQueue,
}

impl Battle {
    /// Builds the battle and sends out the leading battlers.
    ///
    /// Missing moves, abilities, items or creatures fail here, before any
    /// round runs.
    pub fn new(
        db: Arc<StaticDatabase>,
        config: BattleConfig,
        setups: &[BankSetup],
        rng: Box<dyn BattleRng>,
        sink: Box<dyn PresentationSink>,
    ) -> BattleResult<Self> {
        let mut logic = Logic::new(db, config, setups, rng, sink)?;
        logic.switch_handler().send_out_initial()?;
        logic.purge_dead_effects()?;
        info!(banks = logic.banks().len(), "battle started");
        Ok(Self {
            logic,
            phase: TurnPhase::AwaitingActions,
            committed: Vec::new(),
            queue: ActionQueue::new(),
        })
    }

    pub fn logic(&self) -> &Logic {
        &self.logic
    }

    #[cfg(test)]
    pub(crate) fn logic_mut(&mut self) -> &mut Logic {
        &mut self.logic
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, TurnPhase::BattleOver(_))
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.phase {
            TurnPhase::BattleOver(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn committed(&self) -> &[Action] {
        &self.committed
    }

    /// Actions still queued for the running round, in execution order.
    pub fn queued(&self) -> impl Iterator<Item = &Action> {
        self.queue.iter()
    }

    // --- Action collection ---

    /// Commits one action for the coming round after validating it against
    /// the current state.
    pub fn submit(&mut self, action: Action) -> BattleResult<()> {
        match self.phase {
            TurnPhase::AwaitingActions => {}
            TurnPhase::BattleOver(_) => return Err(BattleStateError::BattleOver.into()),
            _ => return Err(BattleStateError::RoundInProgress.into()),
        }
        self.validate_submission(&action)?;
        debug!(?action, "action submitted");
        self.committed.push(action);
        Ok(())
    }

    fn validate_submission(&self, action: &Action) -> BattleResult<()> {
        let logic = &self.logic;
        match action {
            Action::Attack {
                user,
                move_index,
                target,
            } => {
                self.check_active(*user)?;
                let slot = logic
                    .battler(*user)
                    .move_slot(*move_index)
                    .ok_or(ActionError::InvalidMoveIndex(*move_index))?;
                if slot.pp == 0 {
                    return Err(ActionError::NoPpRemaining.into());
                }
                if let TargetSpec::Position(position) = target {
                    let in_range = logic
                        .bank(position.bank)
                        .is_some_and(|bank| position.slot < bank.slot_count());
                    if !in_range {
                        return Err(BattleStateError::InvalidPosition {
                            bank: position.bank,
                            slot: position.slot,
                        }
                        .into());
                    }
                }
                self.check_unclaimed(*user)
            }
            Action::Switch { who, with } => {
                self.check_active(*who)?;
                let bank = logic.bank(who.bank).ok_or(BattleStateError::InvalidBank(who.bank))?;
                let incoming = bank
                    .battler(*with)
                    .ok_or(ActionError::InvalidPartyIndex(*with as usize))?;
                if incoming.is_fainted() {
                    return Err(ActionError::SwitchTargetFainted.into());
                }
                if incoming.on_field() || self.switch_claimed(who.bank, *with) {
                    return Err(ActionError::SwitchTargetActive.into());
                }
                self.check_unclaimed(*who)
            }
            Action::Item { bank, item, target } => {
                let owner = logic.bank(*bank).ok_or(BattleStateError::InvalidBank(*bank))?;
                logic.try_battler(*target)?;
                if owner.item_count(item) == 0 {
                    return Err(ActionError::ItemNotInBag(item.clone()).into());
                }
                if !logic.registries().usable_items.contains(item) {
                    return Err(ActionError::ItemNotUsable(item.clone()).into());
                }
                self.check_bank_capacity(*bank)
            }
            Action::Flee { bank, kind } => {
                logic.bank(*bank).ok_or(BattleStateError::InvalidBank(*bank))?;
                if *kind == FleeKind::Player && !logic.config().wild_battle {
                    return Err(ActionError::CannotFlee.into());
                }
                self.check_bank_capacity(*bank)
            }
            Action::Mega { user } => {
                self.check_active(*user)?;
                let already_chosen = self
                    .committed
                    .iter()
                    .any(|other| matches!(other, Action::Mega { user: u } if u.bank == user.bank));
                if already_chosen || mega::available_form(logic, *user).is_none() {
                    return Err(ActionError::MegaUnavailable.into());
                }
                Ok(())
            }
            Action::PreAttack { .. } | Action::HighPriorityItemNotice { .. } => {
                Err(ActionError::NotChoosable.into())
            }
        }
    }

    fn check_active(&self, id: BattlerId) -> BattleResult<()> {
        let battler = self.logic.try_battler(id)?;
        if battler.is_fainted() {
            return Err(ActionError::UserFainted.into());
        }
        if !battler.on_field() {
            return Err(BattleStateError::NotOnField.into());
        }
        Ok(())
    }

    /// A battler gets one attack or switch per round.
    fn check_unclaimed(&self, id: BattlerId) -> BattleResult<()> {
        let claimed = self.committed.iter().any(|action| match action {
            Action::Attack { user, .. } => *user == id,
            Action::Switch { who, .. } => *who == id,
            _ => false,
        });
        if claimed {
            return Err(ActionError::DuplicateAction.into());
        }
        self.check_bank_capacity(id.bank)
    }

    fn switch_claimed(&self, bank: u8, party_index: u8) -> bool {
        self.committed
            .iter()
            .any(|action| matches!(action, Action::Switch { who, with } if who.bank == bank && *with == party_index))
    }

    fn check_bank_capacity(&self, bank: u8) -> BattleResult<()> {
        if self.main_actions_of(bank) >= self.active_count(bank) {
            return Err(ActionError::DuplicateAction.into());
        }
        Ok(())
    }

    fn active_count(&self, bank: u8) -> usize {
        self.logic
            .active_battlers()
            .into_iter()
            .filter(|id| id.bank == bank)
            .count()
    }

    /// Attacks, switches, items and flee attempts each take a battler's turn.
    fn main_actions_of(&self, bank: u8) -> usize {
        self.committed
            .iter()
            .filter(|action| match action {
                Action::Attack { user, .. } => user.bank == bank,
                Action::Switch { who, .. } => who.bank == bank,
                Action::Item { bank: b, .. } | Action::Flee { bank: b, .. } => *b == bank,
                _ => false,
            })
            .count()
    }

    /// How many more main actions the round needs before it can start.
    pub fn missing_actions(&self) -> usize {
        (0..self.logic.banks().len() as u8)
            .map(|bank| self.active_count(bank).saturating_sub(self.main_actions_of(bank)))
            .sum()
    }

    // --- Round execution ---

    /// Advances the state machine by one phase.
    pub fn step(&mut self) -> BattleResult<TurnPhase> {
        let next = match self.phase {
            TurnPhase::AwaitingActions => {
                let missing = self.missing_actions();
                if missing > 0 {
                    return Err(BattleStateError::ActionsMissing(missing).into());
                }
                TurnPhase::BuildQueue
            }
            TurnPhase::BuildQueue => self.build_queue()?,
            TurnPhase::ExecuteNext => self.execute_next()?,
            TurnPhase::ActionDone => match self.logic.evaluate_outcome() {
                Some(outcome) => TurnPhase::BattleOver(outcome),
                None if self.logic.awaiting_ack => TurnPhase::TurnBlocked,
                None => TurnPhase::ExecuteNext,
            },
            TurnPhase::TurnBlocked => TurnPhase::TurnBlocked,
            TurnPhase::EndTurnHooks => {
                let scopes = self.logic.every_scope();
                self.logic
                    .dispatch_notification(Hook::OnEndTurnEvent, &scopes, |effect, logic| {
                        effect.on_end_turn_event(logic)
                    })?;
                let turn_number = self.logic.turn();
                self.logic.emit(BattleEvent::TurnEnded { turn_number });
                TurnPhase::PurgeDead
            }
            TurnPhase::PurgeDead => {
                self.logic.purge_dead_effects()?;
                match self.logic.evaluate_outcome() {
                    Some(outcome) => TurnPhase::BattleOver(outcome),
                    None if self.logic.turn() >= self.logic.config().max_turns => {
                        warn!(turn = self.logic.turn(), "round limit reached");
                        TurnPhase::BattleOver(BattleOutcome::Draw)
                    }
                    None => TurnPhase::AwaitingActions,
                }
            }
            TurnPhase::BattleOver(outcome) => return Ok(TurnPhase::BattleOver(outcome)),
        };
        self.enter(next)?;
        Ok(self.phase)
    }

    fn build_queue(&mut self) -> BattleResult<TurnPhase> {
        self.logic.begin_turn();
        let turn_number = self.logic.turn();
        self.logic.emit(BattleEvent::TurnStarted { turn_number });
        let committed = std::mem::take(&mut self.committed);
        self.queue = ActionQueue::build(&mut self.logic, committed)?;
        debug!(turn_number, queued = self.queue.len(), "round started");
        Ok(TurnPhase::ExecuteNext)
    }

    fn execute_next(&mut self) -> BattleResult<TurnPhase> {
        // A send-out from setup or a replacement may still be on screen.
        if self.logic.awaiting_ack {
            return Ok(TurnPhase::TurnBlocked);
        }
        let Some(action) = self.queue.pop_front() else {
            return Ok(TurnPhase::EndTurnHooks);
        };
        if !action.valid(&self.logic) {
            debug!(?action, "stale action skipped");
            return Ok(TurnPhase::ExecuteNext);
        }
        action.execute(&mut self.logic)?;

        let scopes = self.logic.every_scope();
        self.logic
            .dispatch_notification(Hook::OnPostActionEvent, &scopes, |effect, logic| {
                effect.on_post_action_event(logic)
            })?;
        for appended in std::mem::take(&mut self.logic.appended_actions) {
            self.queue.push_back(appended);
        }
        Ok(TurnPhase::ActionDone)
    }

    fn enter(&mut self, next: TurnPhase) -> BattleResult<()> {
        if let TurnPhase::BattleOver(outcome) = next {
            if !self.is_over() {
                self.conclude(outcome)?;
            }
            return Ok(());
        }
        self.phase = next;
        self.logic.purge_dead_effects()
    }

    /// Drops the rest of the queue, then kills every effect so `on_delete`
    /// cleanup still runs.
    fn conclude(&mut self, outcome: BattleOutcome) -> BattleResult<()> {
        let dropped = self.queue.len();
        self.queue.clear();
        self.committed.clear();
        self.logic.effects.kill_where(|_, _| true);
        self.logic.purge_dead_effects()?;
        self.phase = TurnPhase::BattleOver(outcome);
        self.logic.emit(BattleEvent::BattleEnded { outcome });
        info!(?outcome, turn = self.logic.turn(), dropped, "battle over");
        Ok(())
    }

    /// Steps until the round finishes, blocks on an animation, or the battle
    /// ends.
    pub fn run_round(&mut self) -> BattleResult<TurnPhase> {
        if self.phase == TurnPhase::AwaitingActions {
            self.step()?;
        }
        loop {
            match self.phase {
                TurnPhase::AwaitingActions | TurnPhase::TurnBlocked | TurnPhase::BattleOver(_) => {
                    return Ok(self.phase);
                }
                _ => {
                    self.step()?;
                }
            }
        }
    }

    /// Signals that the animation the round is waiting on has finished.
    pub fn acknowledge_animation(&mut self) -> BattleResult<()> {
        if !self.logic.awaiting_ack {
            return Err(BattleStateError::NothingToAcknowledge.into());
        }
        self.logic.awaiting_ack = false;
        if self.phase == TurnPhase::TurnBlocked {
            self.phase = TurnPhase::ExecuteNext;
        }
        debug!("animation acknowledged");
        Ok(())
    }

    /// Ends the battle at once, skipping whatever is still queued.
    pub fn abort(&mut self, outcome: BattleOutcome) -> BattleResult<()> {
        if self.is_over() {
            return Err(BattleStateError::BattleOver.into());
        }
        warn!(?outcome, phase = ?self.phase, "battle aborted");
        self.conclude(outcome)
    }

    // --- Between rounds ---

    /// Positions whose occupant is gone while the bank still has a healthy
    /// battler on the bench.
    pub fn replacements_needed(&self) -> Vec<Position> {
        if self.is_over() {
            return Vec::new();
        }
        self.logic
            .all_positions()
            .into_iter()
            .filter(|&position| self.logic.alive_battler_at(position).is_none())
            .filter(|position| {
                self.logic
                    .bank(position.bank)
                    .is_some_and(|bank| !bank.benched_healthy().is_empty())
            })
            .collect()
    }

    /// Sends `party_index` into an empty or fainted position. Only allowed
    /// between rounds. Switch-in hooks fire as for a normal switch.
    pub fn replace_fainted(&mut self, position: Position, party_index: u8) -> BattleResult<()> {
        match self.phase {
            TurnPhase::AwaitingActions => {}
            TurnPhase::BattleOver(_) => return Err(BattleStateError::BattleOver.into()),
            _ => return Err(BattleStateError::RoundInProgress.into()),
        }
        if !self.replacements_needed().contains(&position) {
            return Err(BattleStateError::ReplacementNotNeeded.into());
        }
        let incoming_id = BattlerId::new(position.bank, party_index);
        let incoming = self
            .logic
            .bank(position.bank)
            .and_then(|bank| bank.battler(party_index))
            .ok_or(ActionError::InvalidPartyIndex(party_index as usize))?;
        if incoming.is_fainted() {
            return Err(ActionError::SwitchTargetFainted.into());
        }
        if incoming.on_field() {
            return Err(ActionError::SwitchTargetActive.into());
        }

        if let Some(fainted) = self.logic.battler_at(position).map(|battler| battler.id) {
            self.logic.battler_mut(fainted).on_switch_out();
        }
        debug!(?position, party_index, "replacing fainted battler");
        self.logic.switch_handler().execute_switch(SwitchContext {
            outgoing: None,
            incoming: incoming_id,
            position,
            baton_pass: false,
        })?;
        self.logic.purge_dead_effects()
    }

    /// Rolls every battler back and returns the records to persist.
    pub fn finish(mut self) -> BattleReport {
        let outcome = self.outcome();
        let turns = self.logic.turn();
        let parties = self
            .logic
            .banks
            .iter_mut()
            .map(|bank| {
                let records = bank.records().to_vec();
                bank.party
                    .iter_mut()
                    .zip(records.iter())
                    .map(|(battler, template)| {
                        battler.rollback();
                        battler.to_record(template)
                    })
                    .collect()
            })
            .collect();
        info!(?outcome, turns, "battle finished");
        BattleReport {
            outcome,
            turns,
            parties,
        }
    }
}
