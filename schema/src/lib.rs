// Battle Core Schema - Static data records
// These types describe the read-only database the battle core consumes:
// moves, abilities, items, creatures and the type chart. They are plain
// serde records so the same definitions back RON files and postcard snapshots.

pub use battle_data::*;
pub use db_symbol::*;
pub use pokemon_types::*;
pub use species_data::*;

pub mod battle_data;
pub mod db_symbol;
pub mod pokemon_types;
pub mod species_data;
