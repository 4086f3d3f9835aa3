use crate::battle::battler::{BattlerId, Position};
use crate::battle::effects::{EffectKind, EffectScope};
use crate::battle::logic::Logic;
use schema::{DbSymbol, StatType, StatusType};
use serde::{Deserialize, Serialize};

/// Final result of a battle, seen from bank 0.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    Win,
    Loss,
    Flee,
    Draw,
}

/// Why a battler could not use its move.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreventionReason {
    Asleep,
    Frozen,
    Paralyzed,
    Flinched,
    Taunted,
    Disabled,
    LostFocus,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Turn Management
    TurnStarted {
        turn_number: u32,
    },
    TurnEnded {
        turn_number: u32,
    },

    // Switching
    PokemonSentOut {
        battler: BattlerId,
        position: Position,
    },
    PokemonRecalled {
        battler: BattlerId,
    },
    SwitchPrevented {
        battler: BattlerId,
    },

    // Moves
    MoveUsed {
        user: BattlerId,
        move_used: DbSymbol,
    },
    MovePrevented {
        user: BattlerId,
        reason: PreventionReason,
    },
    MoveFailed {
        user: BattlerId,
    },
    MoveMissed {
        user: BattlerId,
        target: BattlerId,
    },
    NoTarget {
        user: BattlerId,
    },
    Protected {
        target: BattlerId,
    },
    CriticalHit {
        target: BattlerId,
    },
    TypeEffectiveness {
        target: BattlerId,
        multiplier: f32,
    },

    // HP
    DamageDealt {
        target: BattlerId,
        damage: u16,
        remaining_hp: u16,
    },
    Healed {
        target: BattlerId,
        amount: u16,
        new_hp: u16,
    },
    Fainted {
        battler: BattlerId,
    },
    /// Flavor line announcing damage caused by an effect.
    EffectDamage {
        target: BattlerId,
        kind: EffectKind,
    },
    /// Flavor line announcing healing caused by an effect.
    EffectHeal {
        target: BattlerId,
        kind: EffectKind,
    },

    // Major status
    StatusApplied {
        target: BattlerId,
        status: StatusType,
    },
    StatusCured {
        target: BattlerId,
        status: StatusType,
    },
    StatusFailed {
        target: BattlerId,
    },
    StatusHurt {
        target: BattlerId,
        status: StatusType,
    },

    // Stat stages
    StatStageChanged {
        target: BattlerId,
        stat: StatType,
        old_stage: i8,
        new_stage: i8,
    },
    StatStageLimit {
        target: BattlerId,
        stat: StatType,
        rising: bool,
    },

    // Effects
    EffectApplied {
        kind: EffectKind,
        scope: EffectScope,
    },
    EffectEnded {
        kind: EffectKind,
        scope: EffectScope,
    },
    /// `kind` stopped something from happening to `target`.
    EffectBlocked {
        kind: EffectKind,
        target: BattlerId,
    },
    SubstituteDamaged {
        target: BattlerId,
    },
    PerishCount {
        target: BattlerId,
        count: u8,
    },
    AbilityActivated {
        battler: BattlerId,
        ability: DbSymbol,
    },
    HeldItemActivated {
        battler: BattlerId,
        item: DbSymbol,
    },

    // Bag items, mega evolution, fleeing
    ItemUsed {
        bank: u8,
        item: DbSymbol,
        target: BattlerId,
    },
    ItemHadNoEffect {
        bank: u8,
        item: DbSymbol,
    },
    MegaEvolved {
        battler: BattlerId,
        form: String,
    },
    FleeSucceeded {
        bank: u8,
    },
    FleeFailed {
        bank: u8,
    },
    EvsGained {
        battler: BattlerId,
    },

    // Battle End
    BattleEnded {
        outcome: BattleOutcome,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string using battle context.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, logic: &Logic) -> Option<String> {
        let name = |id: &BattlerId| logic.battler_label(*id);
        match self {
            // === Turn Management Events ===
            BattleEvent::TurnStarted { turn_number } => Some(format!("=== Turn {} ===", turn_number)),
            BattleEvent::TurnEnded { .. } => None,

            // === Switching Events ===
            BattleEvent::PokemonSentOut { battler, .. } => {
                let bank = logic.bank(battler.bank).map(|b| b.name.as_str()).unwrap_or("?");
                Some(format!("{} sent out {}!", bank, logic.battler(*battler).display_name()))
            }
            BattleEvent::PokemonRecalled { battler } => Some(format!("{}, come back!", name(battler))),
            BattleEvent::SwitchPrevented { battler } => Some(format!("{} can't be switched out!", name(battler))),

            // === Move Events ===
            BattleEvent::MoveUsed { user, move_used } => {
                let move_name = logic
                    .db()
                    .lookup_move(move_used)
                    .map(|m| m.name.clone())
                    .unwrap_or_else(|_| move_used.to_string());
                Some(format!("{} used {}!", name(user), move_name))
            }
            BattleEvent::MovePrevented { user, reason } => Some(format!(
                "{} {}",
                name(user),
                Self::format_prevention_reason(*reason)
            )),
            BattleEvent::MoveFailed { .. } => Some("But it failed!".to_string()),
            BattleEvent::MoveMissed { target, .. } => Some(format!("{} avoided the attack!", name(target))),
            BattleEvent::NoTarget { .. } => Some("But there was no target...".to_string()),
            BattleEvent::Protected { target } => Some(format!("{} protected itself!", name(target))),
            BattleEvent::CriticalHit { .. } => Some("A critical hit!".to_string()),
            BattleEvent::TypeEffectiveness { target, multiplier } => match *multiplier {
                m if m > 1.0 => Some("It's super effective!".to_string()),
                m if m > 0.0 && m < 1.0 => Some("It's not very effective...".to_string()),
                m if m == 0.0 => Some(format!("It doesn't affect {}...", name(target))),
                _ => None,
            },

            // === HP Events ===
            BattleEvent::DamageDealt { target, damage, .. } => {
                Some(format!("{} took {} damage!", name(target), damage))
            }
            BattleEvent::Healed { target, amount, .. } => {
                Some(format!("{} recovered {} HP!", name(target), amount))
            }
            BattleEvent::Fainted { battler } => Some(format!("{} fainted!", name(battler))),
            BattleEvent::EffectDamage { target, kind } => {
                Some(Self::format_effect_damage(&name(target), *kind))
            }
            BattleEvent::EffectHeal { target, kind } => {
                Some(Self::format_effect_heal(&name(target), *kind))
            }

            // === Status Events ===
            BattleEvent::StatusApplied { target, status } => Some(format!(
                "{} {}",
                name(target),
                Self::format_status_applied(*status)
            )),
            BattleEvent::StatusCured { target, status } => match status {
                StatusType::Sleep => Some(format!("{} woke up!", name(target))),
                StatusType::Freeze => Some(format!("{} thawed out!", name(target))),
                _ => Some(format!("{} is no longer {}!", name(target), status)),
            },
            BattleEvent::StatusFailed { target } => Some(format!("It doesn't affect {}...", name(target))),
            BattleEvent::StatusHurt { target, status } => match status {
                StatusType::Burn => Some(format!("{} was hurt by its burn!", name(target))),
                _ => Some(format!("{} was hurt by poison!", name(target))),
            },

            // === Stat Change Events ===
            BattleEvent::StatStageChanged {
                target,
                stat,
                old_stage,
                new_stage,
            } => {
                let verb = match new_stage - old_stage {
                    d if d >= 3 => "rose drastically",
                    2 => "rose sharply",
                    1 => "rose",
                    -1 => "fell",
                    -2 => "harshly fell",
                    _ => "severely fell",
                };
                Some(format!("{}'s {} {}!", name(target), stat, verb))
            }
            BattleEvent::StatStageLimit { target, stat, rising } => Some(format!(
                "{}'s {} won't go any {}!",
                name(target),
                stat,
                if *rising { "higher" } else { "lower" }
            )),

            // === Effect Events ===
            BattleEvent::EffectApplied { kind, scope } => Self::format_effect_applied(logic, *kind, *scope),
            BattleEvent::EffectEnded { kind, scope } => Self::format_effect_ended(logic, *kind, *scope),
            BattleEvent::EffectBlocked { kind, target } => Some(match kind {
                EffectKind::Mist => format!("{} is protected by the mist!", name(target)),
                EffectKind::Safeguard => format!("{} is protected by Safeguard!", name(target)),
                EffectKind::Substitute => format!("But it failed! {} is behind a substitute.", name(target)),
                EffectKind::Ingrain => format!("{} anchored itself with its roots!", name(target)),
                _ => format!("{} is unaffected!", name(target)),
            }),
            BattleEvent::SubstituteDamaged { target } => {
                Some(format!("The substitute took damage for {}!", name(target)))
            }
            BattleEvent::PerishCount { target, count } => {
                Some(format!("{}'s perish count fell to {}.", name(target), count))
            }
            BattleEvent::AbilityActivated { battler, ability } => {
                let ability_name = logic
                    .db()
                    .lookup_ability(ability)
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|_| ability.to_string());
                Some(format!("[{}'s {}]", name(battler), ability_name))
            }
            BattleEvent::HeldItemActivated { battler, item } => {
                let item_name = Self::item_name(logic, item);
                Some(match item.as_str() {
                    "quick_claw" => format!("{}'s {} let it move first!", name(battler), item_name),
                    "focus_sash" => format!("{} hung on using its {}!", name(battler), item_name),
                    _ => format!("{}'s {} activated!", name(battler), item_name),
                })
            }

            // === Bag, Mega and Flee Events ===
            BattleEvent::ItemUsed { bank, item, target } => {
                let bank_name = logic.bank(*bank).map(|b| b.name.as_str()).unwrap_or("?");
                Some(format!(
                    "{} used {} on {}!",
                    bank_name,
                    Self::item_name(logic, item),
                    logic.battler(*target).display_name()
                ))
            }
            BattleEvent::ItemHadNoEffect { .. } => Some("It won't have any effect.".to_string()),
            BattleEvent::MegaEvolved { battler, form } => {
                Some(format!("{} has Mega Evolved into {}!", name(battler), form))
            }
            BattleEvent::FleeSucceeded { bank } => Some(if *bank == 0 {
                "Got away safely!".to_string()
            } else {
                "The wild Pokémon fled!".to_string()
            }),
            BattleEvent::FleeFailed { .. } => Some("Can't escape!".to_string()),
            BattleEvent::EvsGained { .. } => None,

            // === Battle End Events ===
            BattleEvent::BattleEnded { outcome } => Some(
                match outcome {
                    BattleOutcome::Win => "You won the battle!",
                    BattleOutcome::Loss => "You lost the battle...",
                    BattleOutcome::Flee => "The battle is over.",
                    BattleOutcome::Draw => "The battle ended in a draw!",
                }
                .to_string(),
            ),
        }
    }

    /// Events the player should acknowledge before the log moves on.
    pub fn waits_for_player(&self) -> bool {
        matches!(
            self,
            BattleEvent::Fainted { .. } | BattleEvent::BattleEnded { .. } | BattleEvent::MegaEvolved { .. }
        )
    }

    // --- Private Helper Functions ---

    fn item_name(logic: &Logic, item: &DbSymbol) -> String {
        logic
            .db()
            .lookup_item(item)
            .map(|i| i.name.clone())
            .unwrap_or_else(|_| item.to_string())
    }

    fn scope_subject(logic: &Logic, scope: EffectScope) -> String {
        match scope {
            EffectScope::Pokemon(id) => logic.battler_label(id),
            EffectScope::Position(position) => logic
                .battler_at(position)
                .map(|b| logic.battler_label(b.id))
                .unwrap_or_else(|| "The position".to_string()),
            EffectScope::Bank(0) => "Your team".to_string(),
            EffectScope::Bank(_) => "The opposing team".to_string(),
            EffectScope::Field => "The field".to_string(),
        }
    }

    fn format_effect_applied(logic: &Logic, kind: EffectKind, scope: EffectScope) -> Option<String> {
        let subject = Self::scope_subject(logic, scope);
        let text = match kind {
            EffectKind::Protect => format!("{} protected itself!", subject),
            EffectKind::Substitute => format!("{} put in a substitute!", subject),
            EffectKind::LeechSeed => format!("{} was seeded!", subject),
            EffectKind::PerishSong => {
                "All Pokémon that heard the song will faint in three turns!".to_string()
            }
            EffectKind::Taunt => format!("{} fell for the taunt!", subject),
            EffectKind::Disable => format!("{}'s move was disabled!", subject),
            EffectKind::Ingrain => format!("{} planted its roots!", subject),
            EffectKind::SaltCure => format!("{} is being salt cured!", subject),
            EffectKind::DestinyBond => format!("{} is hoping to take its attacker down with it!", subject),
            EffectKind::FocusPunchCharge => format!("{} is tightening its focus!", subject),
            EffectKind::Wish => format!("{} made a wish!", subject),
            EffectKind::StealthRock => "Pointed stones float in the air around the opposing team!".to_string(),
            EffectKind::Mist => format!("{} became shrouded in mist!", subject),
            EffectKind::Safeguard => format!("{} became cloaked in a mystical veil!", subject),
            EffectKind::Sandstorm => "A sandstorm kicked up!".to_string(),
            EffectKind::TrickRoom => "The dimensions were twisted!".to_string(),
            _ => return None,
        };
        Some(text)
    }

    fn format_effect_ended(logic: &Logic, kind: EffectKind, scope: EffectScope) -> Option<String> {
        let subject = Self::scope_subject(logic, scope);
        let text = match kind {
            EffectKind::Substitute => format!("{}'s substitute faded!", subject),
            EffectKind::Taunt => format!("{} shook off the taunt!", subject),
            EffectKind::Disable => format!("{}'s move is no longer disabled!", subject),
            EffectKind::Mist => format!("{} is no longer protected by mist!", subject),
            EffectKind::Safeguard => format!("{} is no longer protected by Safeguard!", subject),
            EffectKind::Sandstorm => "The sandstorm subsided.".to_string(),
            EffectKind::TrickRoom => "The twisted dimensions returned to normal!".to_string(),
            _ => return None,
        };
        Some(text)
    }

    fn format_effect_damage(subject: &str, kind: EffectKind) -> String {
        match kind {
            EffectKind::LeechSeed => format!("{}'s health is sapped by Leech Seed!", subject),
            EffectKind::Sandstorm => format!("{} is buffeted by the sandstorm!", subject),
            EffectKind::StealthRock => format!("Pointed stones dug into {}!", subject),
            EffectKind::SaltCure => format!("{} is hurt by Salt Cure!", subject),
            EffectKind::Protect => format!("{} was hurt by the shield!", subject),
            EffectKind::DestinyBond => format!("{} took its attacker down with it!", subject),
            EffectKind::PerishSong => format!("{}'s perish count reached 0!", subject),
            EffectKind::Substitute => format!("{} paid HP for a substitute!", subject),
            _ => format!("{} was hurt!", subject),
        }
    }

    fn format_effect_heal(subject: &str, kind: EffectKind) -> String {
        match kind {
            EffectKind::Leftovers => format!("{} restored a little HP using its Leftovers!", subject),
            EffectKind::Ingrain => format!("{} absorbed nutrients with its roots!", subject),
            EffectKind::Wish => format!("{}'s wish came true!", subject),
            EffectKind::LeechSeed => format!("{} drained some health!", subject),
            _ => format!("{} restored HP!", subject),
        }
    }

    fn format_status_applied(status: StatusType) -> &'static str {
        match status {
            StatusType::Poison => "was poisoned!",
            StatusType::Toxic => "was badly poisoned!",
            StatusType::Paralysis => "is paralyzed! It may be unable to move!",
            StatusType::Burn => "was burned!",
            StatusType::Sleep => "fell asleep!",
            StatusType::Freeze => "was frozen solid!",
        }
    }

    fn format_prevention_reason(reason: PreventionReason) -> &'static str {
        match reason {
            PreventionReason::Asleep => "is fast asleep.",
            PreventionReason::Frozen => "is frozen solid!",
            PreventionReason::Paralyzed => "is paralyzed! It can't move!",
            PreventionReason::Flinched => "flinched and couldn't move!",
            PreventionReason::Taunted => "can't use that move after the taunt!",
            PreventionReason::Disabled => "can't use that move, it is disabled!",
            PreventionReason::LostFocus => "lost its focus and couldn't move!",
        }
    }
}

/// Event bus for collecting and managing battle events.
///
/// ```rust,ignore
/// event_bus.print_debug_with_message("Turn 1 events:");
/// event_bus.print_formatted(&logic);
/// println!("{}", event_bus);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Print all events in debug format with indentation.
    pub fn print_debug(&self) {
        for event in &self.events {
            println!("  {:?}", event);
        }
    }

    /// Print all events in debug format with a custom prefix message.
    pub fn print_debug_with_message(&self, message: &str) {
        println!("{}", message);
        self.print_debug();
    }

    /// Print all events using their formatted text when available.
    /// Falls back to debug format for silent events.
    pub fn print_formatted(&self, logic: &Logic) {
        for event in &self.events {
            match event.format(logic) {
                Some(formatted) => println!("  {}", formatted),
                None => println!("  {:?} (silent)", event),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn count_where(&self, predicate: impl Fn(&BattleEvent) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }

    pub fn contains(&self, predicate: impl Fn(&BattleEvent) -> bool) -> bool {
        self.events.iter().any(predicate)
    }
}

impl std::fmt::Display for EventBus {
    /// Format the EventBus for printing. Shows debug format of all events.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}
