//! Committed intents for a round and the order they resolve in.
//!
//! Actions sort by band first (pre-attack announcements, mega evolution,
//! bag items, switches, then attacks and flee attempts), then by move
//! priority, then by speed-priority overrides, then by effective speed.
//! Equal speeds are settled by a random key drawn once per action when the
//! queue is built.

pub mod attack;
pub mod flee;
pub mod item;
pub mod mega;

use crate::battle::battler::{BattlerId, Position};
use crate::battle::effects::pokemon::{FocusPunchCharge, FOCUS_PUNCH_METHOD};
use crate::battle::effects::{EffectKind, EffectScope, Hook, SpeedPriority, SwitchContext};
use crate::battle::logic::Logic;
use crate::battle::state::BattleEvent;
use crate::errors::BattleResult;
use schema::DbSymbol;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

pub use flee::FleeKind;

/// Who an attack was aimed at when it was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetSpec {
    /// Let the move's own target rule decide.
    #[default]
    Auto,
    Position(Position),
    AllFoes,
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Attack {
        user: BattlerId,
        move_index: usize,
        target: TargetSpec,
    },
    Switch {
        who: BattlerId,
        /// Party index of the incoming battler.
        with: u8,
    },
    Item {
        bank: u8,
        item: DbSymbol,
        target: BattlerId,
    },
    Mega {
        user: BattlerId,
    },
    Flee {
        bank: u8,
        kind: FleeKind,
    },
    /// Start-of-round charge announcements (Focus Punch).
    PreAttack {
        users: Vec<BattlerId>,
    },
    /// A held item decided its holder moves first this round.
    HighPriorityItemNotice {
        holder: BattlerId,
        item: DbSymbol,
    },
}

// Resolution bands, highest first.
pub const BAND_PRE_ATTACK: u8 = 5;
pub const BAND_MEGA: u8 = 4;
pub const BAND_ITEM: u8 = 3;
pub const BAND_SWITCH: u8 = 2;
pub const BAND_ATTACK: u8 = 1;

pub const ROAMING_FLEE_PRIORITY: i8 = -7;

/// Sort key of one queued action. Compared field by field, higher first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ActionPriority {
    pub band: u8,
    pub priority: i8,
    pub speed_priority: i8,
    /// Negated while Trick Room is up.
    pub speed: i64,
    pub tie_breaker: u32,
}

impl Action {
    /// The battler whose speed orders this action, if any.
    pub fn actor(&self, logic: &Logic) -> Option<BattlerId> {
        match self {
            Action::Attack { user, .. } | Action::Mega { user } => Some(*user),
            Action::Switch { who, .. } => Some(*who),
            Action::HighPriorityItemNotice { holder, .. } => Some(*holder),
            Action::Item { bank, .. } | Action::Flee { bank, .. } => fastest_of_bank(logic, *bank),
            Action::PreAttack { .. } => None,
        }
    }

    pub fn band(&self) -> u8 {
        match self {
            Action::PreAttack { .. } | Action::HighPriorityItemNotice { .. } => BAND_PRE_ATTACK,
            Action::Mega { .. } => BAND_MEGA,
            Action::Item { .. } => BAND_ITEM,
            Action::Switch { .. } => BAND_SWITCH,
            Action::Attack { .. } | Action::Flee { .. } => BAND_ATTACK,
        }
    }

    /// Move priority for attacks, the fixed roaming priority for wild flees.
    pub fn move_priority(&self, logic: &Logic) -> i8 {
        match self {
            Action::Attack { user, move_index, .. } => logic
                .battler(*user)
                .move_slot(*move_index)
                .and_then(|slot| logic.db().lookup_move(&slot.db_symbol).ok())
                .map(|data| data.priority)
                .unwrap_or(0),
            Action::Flee {
                kind: FleeKind::Roaming,
                ..
            } => ROAMING_FLEE_PRIORITY,
            _ => 0,
        }
    }

    fn priority(&self, logic: &mut Logic, speed_priorities: &HashMap<BattlerId, i8>, trick_room: bool) -> ActionPriority {
        let actor = self.actor(logic);
        let speed = actor.map(|id| logic.effective_speed(id) as i64).unwrap_or(0);
        ActionPriority {
            band: self.band(),
            priority: self.move_priority(logic),
            speed_priority: actor
                .and_then(|id| speed_priorities.get(&id).copied())
                .filter(|_| matches!(self, Action::Attack { .. }))
                .unwrap_or(0),
            speed: if trick_room { -speed } else { speed },
            tie_breaker: logic.rng().range(u16::MAX as u32, "speed tie"),
        }
    }

    /// Re-checks the action right before it runs. An invalid action is
    /// skipped silently.
    pub fn valid(&self, logic: &Logic) -> bool {
        let active = |id: BattlerId| {
            let battler = logic.battler(id);
            battler.alive() && battler.on_field()
        };
        match self {
            Action::Attack { user, .. } => active(*user),
            Action::Switch { who, with } => {
                let incoming = logic.bank(who.bank).and_then(|bank| bank.battler(*with));
                active(*who) && incoming.is_some_and(|b| b.alive() && !b.on_field())
            }
            Action::Item { bank, item, target } => {
                logic.bank(*bank).is_some_and(|b| b.item_count(item) > 0) && logic.battler(*target).alive()
            }
            Action::Mega { user } => active(*user) && logic.bank(user.bank).is_some_and(|b| !b.mega_used),
            Action::Flee { bank, .. } => fastest_of_bank(logic, *bank).is_some(),
            Action::PreAttack { users } => users.iter().any(|&user| active(user)),
            Action::HighPriorityItemNotice { holder, .. } => active(*holder),
        }
    }

    pub fn execute(self, logic: &mut Logic) -> BattleResult<()> {
        debug!(action = ?self, "executing action");
        match self {
            Action::Attack {
                user,
                move_index,
                target,
            } => attack::execute(logic, user, move_index, target),
            Action::Switch { who, with } => execute_switch(logic, who, with),
            Action::Item { bank, item, target } => item::execute(logic, bank, &item, target),
            Action::Mega { user } => mega::execute(logic, user),
            Action::Flee { bank, kind } => flee::execute(logic, bank, kind),
            Action::PreAttack { users } => {
                for user in users {
                    let battler = logic.battler(user);
                    if !battler.alive() || !battler.on_field() {
                        continue;
                    }
                    logic.add_effect(Box::new(FocusPunchCharge::new(user)));
                    logic.emit(BattleEvent::EffectApplied {
                        kind: EffectKind::FocusPunchCharge,
                        scope: EffectScope::Pokemon(user),
                    });
                }
                Ok(())
            }
            Action::HighPriorityItemNotice { holder, item } => {
                logic.emit(BattleEvent::HeldItemActivated { battler: holder, item });
                Ok(())
            }
        }
    }
}

fn fastest_of_bank(logic: &Logic, bank: u8) -> Option<BattlerId> {
    logic
        .active_battlers()
        .into_iter()
        .filter(|id| id.bank == bank)
        .max_by_key(|&id| logic.effective_speed(id))
}

fn execute_switch(logic: &mut Logic, who: BattlerId, with: u8) -> BattleResult<()> {
    let Some(slot) = logic.battler(who).position else {
        return Ok(());
    };
    let ctx = SwitchContext {
        outgoing: Some(who),
        incoming: BattlerId::new(who.bank, with),
        position: Position::new(who.bank, slot),
        baton_pass: false,
    };
    if !logic.switch_handler().can_switch(&ctx)? {
        return Ok(());
    }
    logic.switch_handler().execute_switch(ctx)
}

/// Asks the user's effects for a speed-priority override.
pub fn speed_priority(logic: &mut Logic, user: BattlerId) -> BattleResult<Option<SpeedPriority>> {
    let scopes = logic.scopes_for(&[user]);
    logic.dispatch_prevention(Hook::OnSpeedPriority, &scopes, |effect, logic| {
        effect.on_speed_priority(logic, user)
    })
}

/// The frozen execution order of one round.
#[derive(Debug, Default)]
pub struct ActionQueue {
    actions: VecDeque<Action>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders the committed actions, adding the pre-attack and item-notice
    /// actions they imply.
    pub fn build(logic: &mut Logic, committed: Vec<Action>) -> BattleResult<Self> {
        let mut speed_priorities = HashMap::new();
        let mut notices = Vec::new();
        let mut charging = Vec::new();

        for action in &committed {
            let Action::Attack { user, move_index, .. } = action else {
                continue;
            };
            if let Some(override_) = speed_priority(logic, *user)? {
                speed_priorities.insert(*user, override_.value);
                if let Some(item) = override_.announce_item {
                    notices.push(Action::HighPriorityItemNotice { holder: *user, item });
                }
            }
            let charges = logic
                .battler(*user)
                .move_slot(*move_index)
                .and_then(|slot| logic.db().lookup_move(&slot.db_symbol).ok())
                .is_some_and(|data| data.battle_engine_method == FOCUS_PUNCH_METHOD);
            if charges {
                charging.push(*user);
            }
        }

        let mut actions = Vec::with_capacity(committed.len() + notices.len() + 1);
        if !charging.is_empty() {
            actions.push(Action::PreAttack { users: charging });
        }
        actions.extend(notices);
        actions.extend(committed);

        let trick_room = logic.trick_room_active();
        let mut keyed = Vec::with_capacity(actions.len());
        for action in actions {
            let priority = action.priority(logic, &speed_priorities, trick_room);
            keyed.push((priority, action));
        }
        keyed.sort_by(|a, b| b.0.cmp(&a.0));

        debug!(actions = keyed.len(), trick_room, "action queue built");
        trace!(order = ?keyed, "action order");
        Ok(Self {
            actions: keyed.into_iter().map(|(_, action)| action).collect(),
        })
    }

    /// Appends an action decided mid-round. It is not re-sorted.
    pub fn push_back(&mut self, action: Action) {
        self.actions.push_back(action);
    }

    pub fn pop_front(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_key_orders_fields_lexicographically() {
        let base = ActionPriority {
            band: BAND_ATTACK,
            priority: 0,
            speed_priority: 0,
            speed: 100,
            tie_breaker: 0,
        };
        let quicker_move = ActionPriority { priority: 1, speed: 1, ..base };
        let switch = ActionPriority {
            band: BAND_SWITCH,
            priority: -7,
            speed: 0,
            ..base
        };
        let claw = ActionPriority {
            speed_priority: 1,
            speed: 5,
            ..base
        };
        assert!(quicker_move > base);
        assert!(switch > quicker_move);
        assert!(claw > base);
        assert!(ActionPriority { tie_breaker: 9, ..base } > base);
    }
}
