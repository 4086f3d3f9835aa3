//! Read-only static data consumed by the battle core.
//!
//! The database is loaded once before a battle starts, either from RON text
//! or from a postcard snapshot of the same `DatabaseFile`. Every lookup that
//! misses is a `DataError`, which callers treat as fatal at setup.

use crate::errors::{DataError, DataResult};
use schema::{AbilityData, CreatureData, DbSymbol, ItemData, MoveData, PokemonType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Replaces one cell of the standard type chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeChartEntry {
    pub attacking: PokemonType,
    pub defending: PokemonType,
    pub multiplier: f32,
}

/// On-disk layout of the database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseFile {
    #[serde(default)]
    pub moves: Vec<MoveData>,
    #[serde(default)]
    pub abilities: Vec<AbilityData>,
    #[serde(default)]
    pub items: Vec<ItemData>,
    #[serde(default)]
    pub creatures: Vec<CreatureData>,
    #[serde(default)]
    pub type_chart_overrides: Vec<TypeChartEntry>,
}

#[derive(Debug, Clone)]
pub struct StaticDatabase {
    file: DatabaseFile,
    moves: HashMap<DbSymbol, usize>,
    abilities: HashMap<DbSymbol, usize>,
    items: HashMap<DbSymbol, usize>,
    creatures: HashMap<DbSymbol, usize>,
    chart_overrides: HashMap<(PokemonType, PokemonType), f32>,
}

fn index_by<T>(records: &[T], key: impl Fn(&T) -> &DbSymbol) -> HashMap<DbSymbol, usize> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| (key(record).clone(), index))
        .collect()
}

impl StaticDatabase {
    pub fn from_file(file: DatabaseFile) -> Self {
        let moves = index_by(&file.moves, |m| &m.db_symbol);
        let abilities = index_by(&file.abilities, |a| &a.db_symbol);
        let items = index_by(&file.items, |i| &i.db_symbol);
        let creatures = index_by(&file.creatures, |c| &c.db_symbol);
        let chart_overrides = file
            .type_chart_overrides
            .iter()
            .map(|entry| ((entry.attacking, entry.defending), entry.multiplier))
            .collect();

        Self {
            file,
            moves,
            abilities,
            items,
            creatures,
            chart_overrides,
        }
    }

    pub fn from_ron_str(text: &str) -> DataResult<Self> {
        let file: DatabaseFile = ron::from_str(text).map_err(|e| DataError::Parse {
            what: "database".to_string(),
            details: e.to_string(),
        })?;
        Ok(Self::from_file(file))
    }

    pub fn load(path: impl AsRef<Path>) -> DataResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        Self::from_ron_str(&text)
    }

    /// Compact binary snapshot of the database.
    pub fn to_postcard(&self) -> DataResult<Vec<u8>> {
        postcard::to_allocvec(&self.file).map_err(|e| DataError::Parse {
            what: "database snapshot".to_string(),
            details: e.to_string(),
        })
    }

    pub fn from_postcard(bytes: &[u8]) -> DataResult<Self> {
        let file: DatabaseFile = postcard::from_bytes(bytes).map_err(|e| DataError::Parse {
            what: "database snapshot".to_string(),
            details: e.to_string(),
        })?;
        Ok(Self::from_file(file))
    }

    pub fn lookup_move(&self, symbol: &DbSymbol) -> DataResult<&MoveData> {
        self.moves
            .get(symbol)
            .map(|&index| &self.file.moves[index])
            .ok_or_else(|| DataError::MoveNotFound(symbol.clone()))
    }

    pub fn lookup_ability(&self, symbol: &DbSymbol) -> DataResult<&AbilityData> {
        self.abilities
            .get(symbol)
            .map(|&index| &self.file.abilities[index])
            .ok_or_else(|| DataError::AbilityNotFound(symbol.clone()))
    }

    pub fn lookup_item(&self, symbol: &DbSymbol) -> DataResult<&ItemData> {
        self.items
            .get(symbol)
            .map(|&index| &self.file.items[index])
            .ok_or_else(|| DataError::ItemNotFound(symbol.clone()))
    }

    pub fn lookup_creature(&self, symbol: &DbSymbol) -> DataResult<&CreatureData> {
        self.creatures
            .get(symbol)
            .map(|&index| &self.file.creatures[index])
            .ok_or_else(|| DataError::CreatureNotFound(symbol.clone()))
    }

    pub fn moves(&self) -> impl Iterator<Item = &MoveData> {
        self.file.moves.iter()
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemData> {
        self.file.items.iter()
    }

    /// Multiplier of one attacking type against one defending type.
    pub fn lookup_type_chart(&self, attacking: PokemonType, defending: PokemonType) -> f32 {
        self.chart_overrides
            .get(&(attacking, defending))
            .copied()
            .unwrap_or_else(|| PokemonType::type_effectiveness(attacking, defending))
    }

    /// Combined multiplier against every type of a defender.
    pub fn type_effectiveness(&self, attacking: PokemonType, defending: &[PokemonType]) -> f32 {
        defending
            .iter()
            .map(|&defending_type| self.lookup_type_chart(attacking, defending_type))
            .product()
    }

    /// Fails when a move names a procedure that `is_registered` rejects.
    pub fn validate_move_procedures(&self, is_registered: impl Fn(&str) -> bool) -> DataResult<()> {
        for move_data in &self.file.moves {
            if !is_registered(&move_data.battle_engine_method) {
                return Err(DataError::UnknownMoveProcedure {
                    move_symbol: move_data.db_symbol.clone(),
                    method: move_data.battle_engine_method.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DATABASE: &str = include_str!("../data/database.ron");

    fn database() -> StaticDatabase {
        StaticDatabase::from_ron_str(DATABASE).expect("bundled database should parse")
    }

    #[test]
    fn test_lookup_hits_and_misses() {
        let db = database();
        let tackle = db.lookup_move(&DbSymbol::from("tackle")).unwrap();
        assert_eq!(tackle.power, 40);

        let missing = db.lookup_move(&DbSymbol::from("hyper_mega_beam"));
        assert_eq!(
            missing.unwrap_err(),
            DataError::MoveNotFound(DbSymbol::from("hyper_mega_beam"))
        );
        assert!(db.lookup_item(&DbSymbol::from("leftovers")).is_ok());
        assert!(db.lookup_ability(&DbSymbol::from("sturdy")).is_ok());
        assert!(db.lookup_creature(&DbSymbol::from("nowhere_mon")).is_err());
    }

    #[test]
    fn test_dual_type_effectiveness_multiplies() {
        let db = database();
        let multiplier =
            db.type_effectiveness(PokemonType::Rock, &[PokemonType::Fire, PokemonType::Flying]);
        assert_eq!(multiplier, 4.0);
    }

    #[test]
    fn test_chart_override_replaces_cell() {
        let file = DatabaseFile {
            type_chart_overrides: vec![TypeChartEntry {
                attacking: PokemonType::Normal,
                defending: PokemonType::Ghost,
                multiplier: 1.0,
            }],
            ..Default::default()
        };
        let db = StaticDatabase::from_file(file);
        assert_eq!(db.lookup_type_chart(PokemonType::Normal, PokemonType::Ghost), 1.0);
        assert_eq!(db.lookup_type_chart(PokemonType::Fighting, PokemonType::Ghost), 0.0);
    }

    #[test]
    fn test_postcard_snapshot_matches_ron_source() {
        let db = database();
        let bytes = db.to_postcard().unwrap();
        let restored = StaticDatabase::from_postcard(&bytes).unwrap();
        assert_eq!(restored.file, db.file);
    }

    #[test]
    fn test_unknown_procedure_is_fatal() {
        let db = database();
        let err = db
            .validate_move_procedures(|method| method != "s_protect")
            .unwrap_err();
        assert!(matches!(err, DataError::UnknownMoveProcedure { .. }));
    }
}
