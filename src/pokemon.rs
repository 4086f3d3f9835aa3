use schema::{BaseStats, DbSymbol, StatusType};
use serde::{Deserialize, Serialize};

/// Major status as carried by a creature, in and out of battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCondition {
    Poison,
    Toxic,
    Paralysis,
    Burn,
    Sleep { turns_remaining: u8 },
    Freeze,
}

impl StatusCondition {
    pub fn kind(&self) -> StatusType {
        match self {
            StatusCondition::Poison => StatusType::Poison,
            StatusCondition::Toxic => StatusType::Toxic,
            StatusCondition::Paralysis => StatusType::Paralysis,
            StatusCondition::Burn => StatusType::Burn,
            StatusCondition::Sleep { .. } => StatusType::Sleep,
            StatusCondition::Freeze => StatusType::Freeze,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownMove {
    pub db_symbol: DbSymbol,
    #[serde(default)]
    pub pp_used: u8,
}

impl KnownMove {
    pub fn new(db_symbol: impl Into<DbSymbol>) -> Self {
        Self {
            db_symbol: db_symbol.into(),
            pp_used: 0,
        }
    }
}

/// Persistent out-of-battle state of one creature.
///
/// A `Battler` is built from a record at battle setup and written back to one
/// when the battle finishes. Only the permanent consequences of the battle
/// (HP, major status, PP, consumed items, EVs) survive that round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonRecord {
    pub species: DbSymbol,
    #[serde(default)]
    pub nickname: Option<String>,
    pub level: u8,
    #[serde(default = "default_ivs")]
    pub ivs: [u8; 6], // HP, ATK, DEF, SP.ATK, SP.DEF, SPD
    #[serde(default)]
    pub evs: [u8; 6],
    /// `None` means full HP.
    #[serde(default)]
    pub current_hp: Option<u16>,
    #[serde(default)]
    pub status: Option<StatusCondition>,
    pub moves: Vec<KnownMove>,
    #[serde(default)]
    pub item: Option<DbSymbol>,
    /// `None` selects the creature's first ability.
    #[serde(default)]
    pub ability: Option<DbSymbol>,
}

fn default_ivs() -> [u8; 6] {
    [15; 6]
}

pub const MAX_EV_PER_STAT: u8 = 252;
pub const MAX_EV_TOTAL: u16 = 510;

impl PokemonRecord {
    pub fn new(species: impl Into<DbSymbol>, level: u8, moves: &[&str]) -> Self {
        Self {
            species: species.into(),
            nickname: None,
            level,
            ivs: default_ivs(),
            evs: [0; 6],
            current_hp: None,
            status: None,
            moves: moves.iter().map(|m| KnownMove::new(*m)).collect(),
            item: None,
            ability: None,
        }
    }

    pub fn with_item(mut self, item: &str) -> Self {
        self.item = Some(DbSymbol::from(item));
        self
    }

    pub fn with_ability(mut self, ability: &str) -> Self {
        self.ability = Some(DbSymbol::from(ability));
        self
    }

    pub fn with_status(mut self, status: StatusCondition) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_hp(mut self, hp: u16) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn with_nickname(mut self, nickname: &str) -> Self {
        self.nickname = Some(nickname.to_string());
        self
    }
}

/// Adds `yield_` to `evs`, respecting the per-stat and total caps.
pub fn add_evs(evs: &mut [u8; 6], yield_: &[u8; 6]) {
    for i in 0..6 {
        let total: u16 = evs.iter().map(|&ev| ev as u16).sum();
        let room = MAX_EV_TOTAL.saturating_sub(total);
        let gain = (yield_[i] as u16)
            .min(room)
            .min((MAX_EV_PER_STAT - evs[i].min(MAX_EV_PER_STAT)) as u16);
        evs[i] += gain as u8;
    }
}

/// Stats in `[hp, atk, def, sp_atk, sp_def, speed]` order.
pub fn calculate_stats(base_stats: &BaseStats, level: u8, ivs: &[u8; 6], evs: &[u8; 6]) -> [u16; 6] {
    let base = base_stats.as_array();
    let level = level as u32;
    let mut stats = [0u16; 6];

    for i in 0..6 {
        // floor(0.01 * (2 * Base + IV + floor(0.25 * EV)) * Level)
        let scaled = (2 * base[i] as u32 + ivs[i] as u32 + evs[i] as u32 / 4) * level / 100;
        let stat = if i == 0 {
            scaled + level + 10
        } else {
            scaled + 5
        };
        stats[i] = stat.min(u16::MAX as u32) as u16;
    }

    stats
}
