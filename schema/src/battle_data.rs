use crate::{DbSymbol, PokemonType};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

/// The seven stats that carry a battle stage.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum StatType {
    Attack,
    Defense,
    Speed,
    SpecialAttack,
    SpecialDefense,
    Evasion,
    Accuracy,
}

impl StatType {
    pub const ALL: [StatType; 7] = [
        StatType::Attack,
        StatType::Defense,
        StatType::Speed,
        StatType::SpecialAttack,
        StatType::SpecialDefense,
        StatType::Evasion,
        StatType::Accuracy,
    ];

    /// Slot of this stat in a battler's stage array.
    pub fn index(self) -> usize {
        match self {
            StatType::Attack => 0,
            StatType::Defense => 1,
            StatType::Speed => 2,
            StatType::SpecialAttack => 3,
            StatType::SpecialDefense => 4,
            StatType::Evasion => 5,
            StatType::Accuracy => 6,
        }
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            StatType::Attack => "Attack",
            StatType::Defense => "Defense",
            StatType::Speed => "Speed",
            StatType::SpecialAttack => "Sp. Atk",
            StatType::SpecialDefense => "Sp. Def",
            StatType::Evasion => "evasiveness",
            StatType::Accuracy => "accuracy",
        };
        write!(f, "{}", display_name)
    }
}

/// Major (persistent) status conditions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum StatusType {
    Poison,
    Toxic,
    Paralysis,
    Burn,
    Sleep,
    Freeze,
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            StatusType::Poison => "poisoned",
            StatusType::Toxic => "badly poisoned",
            StatusType::Paralysis => "paralyzed",
            StatusType::Burn => "burned",
            StatusType::Sleep => "asleep",
            StatusType::Freeze => "frozen",
        };
        write!(f, "{}", display_name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

/// Who a move resolves against when the action is built.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MoveTarget {
    /// One chosen foe position.
    #[default]
    Foe,
    User,
    AllFoes,
    RandomFoe,
    /// The user's side of the field.
    UserBank,
    /// The opposing side of the field.
    FoeBank,
    /// The whole battle field.
    Field,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct MoveFlags {
    pub contact: bool,
    pub blocked_by_protect: bool,
    pub sound: bool,
    /// Goes through Substitute.
    pub authentic: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatChangeData {
    pub stat: StatType,
    pub stages: i8,
    #[serde(default)]
    pub on_user: bool,
}

fn always() -> u8 {
    100
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveData {
    pub db_symbol: DbSymbol,
    pub name: String,
    pub move_type: PokemonType,
    pub category: MoveCategory,
    #[serde(default)]
    pub power: u16,
    /// Percent chance to hit; 0 means the move never misses.
    #[serde(default)]
    pub accuracy: u8,
    pub pp: u8,
    #[serde(default)]
    pub priority: i8,
    #[serde(default)]
    pub target: MoveTarget,
    #[serde(default)]
    pub flags: MoveFlags,
    /// Name of the procedure that executes the move.
    pub battle_engine_method: String,
    #[serde(default)]
    pub critical_rate: u8,
    /// Chance for the secondary status / stat changes to apply.
    #[serde(default = "always")]
    pub effect_chance: u8,
    #[serde(default)]
    pub status: Option<StatusType>,
    #[serde(default)]
    pub stat_changes: Vec<StatChangeData>,
    #[serde(default)]
    pub flinch_chance: u8,
}

impl MoveData {
    pub fn is_damaging(&self) -> bool {
        self.category != MoveCategory::Status && self.power > 0
    }

    pub fn never_misses(&self) -> bool {
        self.accuracy == 0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AbilityData {
    pub db_symbol: DbSymbol,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum HealAmount {
    Fixed(u16),
    Percent(u8),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatBoost {
    pub stat: StatType,
    pub stages: i8,
}

/// What a bag item does when used on a battler.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ItemUsage {
    pub heal: Option<HealAmount>,
    pub cure_status: Vec<StatusType>,
    pub cure_all_status: bool,
    pub stat_boost: Option<StatBoost>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ItemData {
    pub db_symbol: DbSymbol,
    pub name: String,
    /// Present when the item can be used from the bag during battle.
    #[serde(default)]
    pub usage: Option<ItemUsage>,
}
