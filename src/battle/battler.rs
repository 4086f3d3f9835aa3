//! In-battle projection of a creature.

use crate::database::StaticDatabase;
use crate::errors::DataResult;
use crate::pokemon::{add_evs, calculate_stats, KnownMove, PokemonRecord, StatusCondition};
use schema::{BaseStats, DbSymbol, MegaForm, PokemonType, StatType};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_STAGE: i8 = -6;
pub const MAX_STAGE: i8 = 6;

/// Stable identity of a battler: its bank and its index in that bank's party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BattlerId {
    pub bank: u8,
    pub party_index: u8,
}

impl BattlerId {
    pub fn new(bank: u8, party_index: u8) -> Self {
        Self { bank, party_index }
    }
}

/// A place on the field: bank plus slot within the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub bank: u8,
    pub slot: u8,
}

impl Position {
    pub fn new(bank: u8, slot: u8) -> Self {
        Self { bank, slot }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bank {} slot {}", self.bank, self.slot)
    }
}

/// Multiplier for a stat stage: `(2 + s) / 2` when positive, `2 / (2 - s)` otherwise.
pub fn stage_multiplier(stage: i8) -> f64 {
    if stage >= 0 {
        (2.0 + stage as f64) / 2.0
    } else {
        2.0 / (2.0 - stage as f64)
    }
}

/// The seven stage counters, each clamped to `[-6, 6]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatStages([i8; 7]);

impl StatStages {
    pub fn get(&self, stat: StatType) -> i8 {
        self.0[stat.index()]
    }

    /// Applies `amount` and returns the delta that actually landed.
    pub fn change(&mut self, stat: StatType, amount: i8) -> i8 {
        let old = self.get(stat);
        let new = (old as i16 + amount as i16).clamp(MIN_STAGE as i16, MAX_STAGE as i16) as i8;
        self.0[stat.index()] = new;
        new - old
    }

    pub fn modifier(&self, stat: StatType) -> f64 {
        stage_multiplier(self.get(stat))
    }

    pub fn reset(&mut self) {
        self.0 = [0; 7];
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatType, i8)> + '_ {
        StatType::ALL.iter().map(move |&stat| (stat, self.get(stat)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub db_symbol: DbSymbol,
    pub pp: u8,
    pub max_pp: u8,
}

/// Snapshot of everything the battle may alter temporarily.
#[derive(Debug, Clone, PartialEq)]
struct OriginalState {
    name: String,
    types: Vec<PokemonType>,
    base_stats: BaseStats,
    ability: Option<DbSymbol>,
    item: Option<DbSymbol>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Battler {
    pub id: BattlerId,
    pub species: DbSymbol,
    pub name: String,
    pub nickname: Option<String>,
    pub level: u8,
    pub types: Vec<PokemonType>,
    base_stats: BaseStats,
    stats: [u16; 6], // HP, ATK, DEF, SP.ATK, SP.DEF, SPD
    ivs: [u8; 6],
    pub evs: [u8; 6],
    hp: u16,
    fainted: bool,
    pub status: Option<StatusCondition>,
    stages: StatStages,
    /// Slot on the bank, `None` while benched.
    pub position: Option<u8>,
    pub item: Option<DbSymbol>,
    item_consumed: bool,
    pub ability: Option<DbSymbol>,
    pub moves: Vec<MoveSlot>,
    pub last_move: Option<DbSymbol>,
    /// Consecutive successful protection moves.
    pub protect_streak: u8,
    pub mega_evolved: bool,
    pub moved_this_turn: bool,
    original: OriginalState,
}

impl Battler {
    /// Builds a battler from its persistent record, resolving every reference
    /// against the database.
    pub fn from_record(id: BattlerId, record: &PokemonRecord, db: &StaticDatabase) -> DataResult<Self> {
        let creature = db.lookup_creature(&record.species)?;

        let mut moves = Vec::with_capacity(record.moves.len());
        for known in &record.moves {
            let move_data = db.lookup_move(&known.db_symbol)?;
            moves.push(MoveSlot {
                db_symbol: known.db_symbol.clone(),
                pp: move_data.pp.saturating_sub(known.pp_used),
                max_pp: move_data.pp,
            });
        }

        if let Some(item) = &record.item {
            db.lookup_item(item)?;
        }
        let ability = match &record.ability {
            Some(ability) => Some(ability.clone()),
            None => creature.abilities.first().cloned(),
        };
        if let Some(ability) = &ability {
            db.lookup_ability(ability)?;
        }

        let stats = calculate_stats(&creature.base_stats, record.level, &record.ivs, &record.evs);
        let hp = record.current_hp.unwrap_or(stats[0]).min(stats[0]);

        Ok(Self {
            id,
            species: creature.db_symbol.clone(),
            name: creature.name.clone(),
            nickname: record.nickname.clone(),
            level: record.level,
            types: creature.types.clone(),
            base_stats: creature.base_stats,
            stats,
            ivs: record.ivs,
            evs: record.evs,
            hp,
            fainted: hp == 0,
            status: if hp == 0 { None } else { record.status },
            stages: StatStages::default(),
            position: None,
            item: record.item.clone(),
            item_consumed: false,
            ability: ability.clone(),
            moves,
            last_move: None,
            protect_streak: 0,
            mega_evolved: false,
            moved_this_turn: false,
            original: OriginalState {
                name: creature.name.clone(),
                types: creature.types.clone(),
                base_stats: creature.base_stats,
                ability,
                item: record.item.clone(),
            },
        })
    }

    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.name)
    }

    pub fn hp(&self) -> u16 {
        self.hp
    }

    pub fn max_hp(&self) -> u16 {
        self.stats[0]
    }

    pub fn hp_rate(&self) -> f64 {
        self.hp as f64 / self.max_hp().max(1) as f64
    }

    /// Sets HP clamped to `[0, max_hp]`. Returns true when this call is the
    /// one that took the battler to 0 HP.
    pub fn set_hp(&mut self, value: i32) -> bool {
        self.hp = value.clamp(0, self.max_hp() as i32) as u16;
        if self.hp == 0 && !self.fainted {
            self.fainted = true;
            return true;
        }
        false
    }

    pub fn is_fainted(&self) -> bool {
        self.fainted
    }

    pub fn alive(&self) -> bool {
        !self.fainted
    }

    pub fn on_field(&self) -> bool {
        self.position.is_some()
    }

    pub fn has_type(&self, pokemon_type: PokemonType) -> bool {
        self.types.contains(&pokemon_type)
    }

    /// Raw (unstaged) value of a stat. Accuracy and evasion have no raw value.
    pub fn raw_stat(&self, stat: StatType) -> u16 {
        match stat {
            StatType::Attack => self.stats[1],
            StatType::Defense => self.stats[2],
            StatType::SpecialAttack => self.stats[3],
            StatType::SpecialDefense => self.stats[4],
            StatType::Speed => self.stats[5],
            StatType::Evasion | StatType::Accuracy => 1,
        }
    }

    pub fn stage(&self, stat: StatType) -> i8 {
        self.stages.get(stat)
    }

    pub fn stages(&self) -> &StatStages {
        &self.stages
    }

    /// Applies a stage change and returns the delta actually applied.
    ///
    /// Stage changes during a battle go through the stat change handler so
    /// prevention hooks run; this is the mutation it ends with.
    pub fn change_stat(&mut self, stat: StatType, amount: i8) -> i8 {
        self.stages.change(stat, amount)
    }

    pub fn stat_modifier(&self, stat: StatType) -> f64 {
        self.stages.modifier(stat)
    }

    pub fn reset_stages(&mut self) {
        self.stages.reset();
    }

    pub(crate) fn set_stages(&mut self, stages: StatStages) {
        self.stages = stages;
    }

    pub fn move_slot(&self, index: usize) -> Option<&MoveSlot> {
        self.moves.get(index)
    }

    pub fn knows_move(&self, symbol: &DbSymbol) -> bool {
        self.moves.iter().any(|slot| &slot.db_symbol == symbol)
    }

    pub fn spend_pp(&mut self, index: usize) {
        if let Some(slot) = self.moves.get_mut(index) {
            slot.pp = slot.pp.saturating_sub(1);
        }
    }

    /// Removes the held item for the rest of the battle and beyond.
    pub fn consume_item(&mut self) -> Option<DbSymbol> {
        let item = self.item.take();
        if item.is_some() && item == self.original.item {
            self.item_consumed = true;
        }
        item
    }

    pub fn gain_evs(&mut self, yield_: &[u8; 6]) {
        add_evs(&mut self.evs, yield_);
    }

    /// Switches to a mega form. HP is kept, every other stat is recomputed.
    pub fn mega_evolve(&mut self, form: &MegaForm) {
        let hp_stat = self.stats[0];
        let mut stats = calculate_stats(&form.base_stats, self.level, &self.ivs, &self.evs);
        stats[0] = hp_stat;
        self.stats = stats;
        self.base_stats = form.base_stats;
        self.types = form.types.clone();
        self.ability = Some(form.ability.clone());
        self.name = form.name.clone();
        self.mega_evolved = true;
    }

    /// Clears per-appearance state when leaving the field.
    pub fn on_switch_out(&mut self) {
        self.position = None;
        self.reset_stages();
        self.protect_streak = 0;
        self.last_move = None;
        self.moved_this_turn = false;
    }

    /// Writes the permanent consequences of the battle back into a record.
    ///
    /// Stages, forms, swapped abilities and stolen items are reverted; HP,
    /// status, PP, consumed items and EVs persist.
    pub fn to_record(&self, template: &PokemonRecord) -> PokemonRecord {
        let base = &self.original.base_stats;
        let max_hp = calculate_stats(base, self.level, &self.ivs, &self.evs)[0];
        let hp = if self.fainted { 0 } else { self.hp.min(max_hp) };
        PokemonRecord {
            species: self.species.clone(),
            nickname: self.nickname.clone(),
            level: self.level,
            ivs: self.ivs,
            evs: self.evs,
            current_hp: Some(hp),
            status: self.status,
            moves: self
                .moves
                .iter()
                .map(|slot| KnownMove {
                    db_symbol: slot.db_symbol.clone(),
                    pp_used: slot.max_pp - slot.pp,
                })
                .collect(),
            item: if self.item_consumed {
                None
            } else {
                self.original.item.clone()
            },
            ability: template.ability.clone(),
        }
    }

    /// Restores the temporary battle changes in place.
    pub fn rollback(&mut self) {
        self.reset_stages();
        self.types = self.original.types.clone();
        self.name = self.original.name.clone();
        self.ability = self.original.ability.clone();
        if !self.item_consumed {
            self.item = self.original.item.clone();
        }
        if self.mega_evolved {
            let hp_stat = self.stats[0];
            self.stats = calculate_stats(&self.original.base_stats, self.level, &self.ivs, &self.evs);
            self.stats[0] = hp_stat;
            self.base_stats = self.original.base_stats;
            self.mega_evolved = false;
        }
        self.position = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, 2, 2)]
    #[case(5, 2, 1)]
    #[case(6, 1, 0)]
    #[case(-5, -3, -1)]
    #[case(-6, 12, 12)]
    #[case(3, -12, -9)]
    fn test_change_returns_actual_delta(#[case] start: i8, #[case] amount: i8, #[case] expected: i8) {
        let mut stages = StatStages::default();
        stages.change(StatType::Attack, start);
        let before = stages.get(StatType::Attack);

        let delta = stages.change(StatType::Attack, amount);

        assert_eq!(delta, expected);
        assert_eq!(stages.get(StatType::Attack) - before, delta);
        assert!((MIN_STAGE..=MAX_STAGE).contains(&stages.get(StatType::Attack)));
    }

    #[test]
    fn test_any_change_sequence_stays_in_range() {
        let mut stages = StatStages::default();
        let sequence = [3, 4, -2, 12, -7, -7, -1, 6, 2, -12, 5, 127, -128];
        for amount in sequence {
            let before = stages.get(StatType::Speed);
            let delta = stages.change(StatType::Speed, amount);
            let after = stages.get(StatType::Speed);
            assert_eq!(delta, after - before);
            assert!((MIN_STAGE..=MAX_STAGE).contains(&after));
        }
    }

    #[rstest]
    #[case(0, 1.0)]
    #[case(1, 1.5)]
    #[case(2, 2.0)]
    #[case(6, 4.0)]
    #[case(-1, 2.0 / 3.0)]
    #[case(-2, 0.5)]
    #[case(-6, 0.25)]
    fn test_stage_multiplier(#[case] stage: i8, #[case] expected: f64) {
        assert!((stage_multiplier(stage) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_stages_are_independent() {
        let mut stages = StatStages::default();
        stages.change(StatType::Attack, 2);
        stages.change(StatType::Evasion, -1);
        let values: Vec<(StatType, i8)> = stages.iter().filter(|(_, v)| *v != 0).collect();
        assert_eq!(values, vec![(StatType::Attack, 2), (StatType::Evasion, -1)]);
    }
}
