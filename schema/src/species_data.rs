use crate::{DbSymbol, PokemonType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub sp_attack: u16,
    pub sp_defense: u16,
    pub speed: u16,
}

impl BaseStats {
    /// Stats in `[hp, atk, def, sp_atk, sp_def, speed]` order.
    pub fn as_array(&self) -> [u16; 6] {
        [
            self.hp,
            self.attack,
            self.defense,
            self.sp_attack,
            self.sp_defense,
            self.speed,
        ]
    }
}

/// Alternate form entered through Mega Evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MegaForm {
    pub name: String,
    pub types: Vec<PokemonType>,
    pub base_stats: BaseStats,
    pub ability: DbSymbol,
    /// Held item required to evolve.
    pub mega_stone: DbSymbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureData {
    pub db_symbol: DbSymbol,
    pub name: String,
    pub types: Vec<PokemonType>,
    pub base_stats: BaseStats,
    pub abilities: Vec<DbSymbol>,
    /// EVs granted to the opponents that defeat this creature.
    #[serde(default)]
    pub ev_yield: [u8; 6],
    #[serde(default)]
    pub mega: Option<MegaForm>,
}
