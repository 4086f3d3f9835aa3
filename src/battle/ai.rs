//! A module for defining AI behaviors for battle opponents.

use crate::battle::actions::{Action, TargetSpec};
use crate::battle::battler::{Battler, BattlerId, Position, MAX_STAGE, MIN_STAGE};
use crate::battle::calculators;
use crate::battle::effects::{EffectKind, EffectScope};
use crate::battle::handlers::status::status_immune;
use crate::battle::logic::Logic;
use crate::battle::moves::is_protect_method;
use ordered_float::OrderedFloat;
use schema::{MoveData, MoveTarget, PokemonType};

/// A trait for any system that can decide on battle actions.
/// This provides a common interface for different AI difficulties or strategies.
pub trait Behavior {
    /// One action per active battler of `bank`.
    fn decide_actions(&self, logic: &Logic, bank: u8) -> Vec<Action>;

    /// Party index to send into `position` after a faint.
    fn choose_replacement(&self, logic: &Logic, position: Position) -> Option<u8>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScoringAI;

impl ScoringAI {
    pub fn new() -> Self {
        Self
    }

    /// Scores one move against `defender`. Negative means "never pick".
    fn score_move(&self, logic: &Logic, attacker: &Battler, move_data: &MoveData, defender: Option<&Battler>) -> f32 {
        // --- Damage ---
        let mut damage_score = 0.0;
        if move_data.is_damaging() {
            let Some(defender) = defender else {
                return -1.0;
            };
            let effectiveness = logic.db().type_effectiveness(move_data.move_type, &defender.types);
            if effectiveness < 0.1 {
                return -1.0;
            }
            let stab = if attacker.has_type(move_data.move_type) { 1.5 } else { 1.0 };
            let attack = calculators::effective_attack(attacker, move_data.category, false) as f32;
            let normalized_power = attack / (attacker.level as f32 * 2.0).max(1.0);
            damage_score = move_data.power as f32 * effectiveness * stab * normalized_power;
        }

        // --- Utility ---
        let chance = move_data.effect_chance as f32 / 100.0;
        let mut utility_score = 0.0;
        for change in &move_data.stat_changes {
            if change.on_user && change.stages > 0 {
                let stage = attacker.stage(change.stat);
                if stage < MAX_STAGE {
                    let potential_gain = 1.0 - stage as f32 / MAX_STAGE as f32;
                    utility_score += 20.0 * change.stages as f32 * potential_gain * chance;
                }
            } else if !change.on_user && change.stages < 0 {
                if defender.is_some_and(|d| d.stage(change.stat) > MIN_STAGE) {
                    utility_score += 15.0 * change.stages.unsigned_abs() as f32 * chance;
                }
            }
        }
        if let (Some(status), Some(defender)) = (move_data.status, defender) {
            if defender.status.is_none() && !status_immune(&defender.types, status) {
                utility_score += 45.0 * chance;
            }
        }
        utility_score += 30.0 * move_data.flinch_chance as f32 / 100.0;
        utility_score += self.procedure_utility(logic, attacker, move_data, defender);

        if !move_data.is_damaging() && utility_score < 1.0 {
            return -1.0;
        }

        let mut final_score = damage_score + utility_score;
        if move_data.is_damaging() {
            // Sure-hit moves get a slight edge.
            let accuracy = if move_data.never_misses() { 101 } else { move_data.accuracy };
            final_score *= accuracy as f32 / 100.0;
        }
        final_score
    }

    /// Value of the moves whose effect lives in their procedure.
    fn procedure_utility(&self, logic: &Logic, attacker: &Battler, move_data: &MoveData, defender: Option<&Battler>) -> f32 {
        let method = move_data.battle_engine_method.as_str();
        if is_protect_method(method) {
            return if attacker.protect_streak == 0 { 5.0 } else { 0.0 };
        }
        match method {
            "s_leech_seed" => match defender {
                Some(d) if !d.has_type(PokemonType::Grass)
                    && !logic.has_effect(EffectScope::Pokemon(d.id), EffectKind::LeechSeed) =>
                {
                    25.0
                }
                _ => 0.0,
            },
            "s_substitute" => {
                let up = logic.has_effect(EffectScope::Pokemon(attacker.id), EffectKind::Substitute);
                if !up && attacker.hp_rate() > 0.5 { 15.0 } else { 0.0 }
            }
            "s_wish" | "s_ingrain" if attacker.hp_rate() < 0.75 => 12.0,
            "s_taunt" | "s_disable" | "s_stealth_rock" | "s_perish_song" => 10.0,
            _ => 0.0,
        }
    }

    fn score_switch(&self) -> f32 {
        // Better than an immune move, worse than almost any real option.
        1.0
    }

    /// How well `candidate`'s moves hit `foe`, used to pick replacements.
    fn matchup(&self, logic: &Logic, candidate: &Battler, foe: Option<&Battler>) -> f32 {
        candidate
            .moves
            .iter()
            .filter(|slot| slot.pp > 0)
            .filter_map(|slot| logic.db().lookup_move(&slot.db_symbol).ok())
            .map(|data| self.score_move(logic, candidate, data, foe))
            .max_by_key(|score| OrderedFloat(*score))
            .unwrap_or(0.0)
    }

    fn target_for(&self, logic: &Logic, user: BattlerId, move_data: &MoveData) -> TargetSpec {
        if move_data.target != MoveTarget::Foe {
            return TargetSpec::Auto;
        }
        logic
            .alive_foes(user)
            .first()
            .and_then(|&foe| logic.position_of(foe))
            .map(TargetSpec::Position)
            .unwrap_or_default()
    }

    fn decide_for(&self, logic: &Logic, user: BattlerId, claimed: &[u8]) -> Option<Action> {
        let attacker = logic.battler(user);
        let defender = logic.alive_foes(user).first().map(|&foe| logic.battler(foe));

        let best_move = attacker
            .moves
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.pp > 0)
            .filter_map(|(index, slot)| {
                let data = logic.db().lookup_move(&slot.db_symbol).ok()?;
                Some((index, data, self.score_move(logic, attacker, data, defender)))
            })
            .max_by_key(|(_, _, score)| OrderedFloat(*score));

        let best_switch = logic.bank(user.bank).and_then(|bank| {
            bank.benched_healthy()
                .into_iter()
                .filter(|index| !claimed.contains(index))
                .map(|index| (index, self.score_switch()))
                .max_by_key(|(_, score)| OrderedFloat(*score))
        });

        let attack = |index: usize, data: &MoveData| Action::Attack {
            user,
            move_index: index,
            target: self.target_for(logic, user, data),
        };
        match (best_move, best_switch) {
            (Some((index, data, move_score)), Some((with, switch_score))) => {
                if switch_score > move_score {
                    Some(Action::Switch { who: user, with })
                } else {
                    Some(attack(index, data))
                }
            }
            (Some((index, data, _)), None) => Some(attack(index, data)),
            (None, Some((with, _))) => Some(Action::Switch { who: user, with }),
            (None, None) => None,
        }
    }
}

impl Behavior for ScoringAI {
    fn decide_actions(&self, logic: &Logic, bank: u8) -> Vec<Action> {
        let mut actions = Vec::new();
        let mut claimed = Vec::new();
        for user in logic.active_battlers().into_iter().filter(|id| id.bank == bank) {
            if let Some(action) = self.decide_for(logic, user, &claimed) {
                if let Action::Switch { with, .. } = action {
                    claimed.push(with);
                }
                actions.push(action);
            }
        }
        actions
    }

    fn choose_replacement(&self, logic: &Logic, position: Position) -> Option<u8> {
        let bank = logic.bank(position.bank)?;
        let foe = logic
            .active_battlers()
            .into_iter()
            .find(|id| id.bank != position.bank)
            .map(|id| logic.battler(id));
        bank.benched_healthy()
            .into_iter()
            .filter_map(|index| bank.battler(index))
            .max_by_key(|candidate| OrderedFloat(self.matchup(logic, candidate, foe)))
            .map(|candidate| candidate.id.party_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_baseline_is_low() {
        assert!(ScoringAI::new().score_switch() < 5.0);
    }
}
