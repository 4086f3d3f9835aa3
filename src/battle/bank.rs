//! One side of the battle: its party, the slots it fills and its bag.

use crate::battle::battler::{Battler, BattlerId};
use crate::database::StaticDatabase;
use crate::errors::DataResult;
use crate::pokemon::PokemonRecord;
use schema::DbSymbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagEntry {
    pub item: DbSymbol,
    pub quantity: u16,
}

/// Everything needed to field a bank at battle setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSetup {
    pub name: String,
    #[serde(default)]
    pub is_player: bool,
    pub party: Vec<PokemonRecord>,
    #[serde(default)]
    pub bag: Vec<BagEntry>,
}

impl BankSetup {
    pub fn new(name: &str, party: Vec<PokemonRecord>) -> Self {
        Self {
            name: name.to_string(),
            is_player: false,
            party,
            bag: Vec::new(),
        }
    }

    pub fn with_bag_item(mut self, item: &str, quantity: u16) -> Self {
        self.bag.push(BagEntry {
            item: DbSymbol::from(item),
            quantity,
        });
        self
    }

    pub fn as_player(mut self) -> Self {
        self.is_player = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Bank {
    pub index: u8,
    pub name: String,
    pub is_player: bool,
    pub party: Vec<Battler>,
    /// Party index occupying each slot.
    slots: Vec<Option<u8>>,
    bag: BTreeMap<DbSymbol, u16>,
    pub mega_used: bool,
    pub flee_attempts: u8,
    records: Vec<PokemonRecord>,
}

impl Bank {
    pub fn new(index: u8, setup: &BankSetup, vs_type: u8, db: &StaticDatabase) -> DataResult<Self> {
        let party = setup
            .party
            .iter()
            .enumerate()
            .map(|(party_index, record)| {
                Battler::from_record(BattlerId::new(index, party_index as u8), record, db)
            })
            .collect::<DataResult<Vec<_>>>()?;

        let mut bag: BTreeMap<DbSymbol, u16> = BTreeMap::new();
        for entry in &setup.bag {
            db.lookup_item(&entry.item)?;
            let count = bag.entry(entry.item.clone()).or_insert(0);
            *count = count.saturating_add(entry.quantity);
        }

        Ok(Self {
            index,
            name: setup.name.clone(),
            is_player: setup.is_player,
            party,
            slots: vec![None; vs_type as usize],
            bag,
            mega_used: false,
            flee_attempts: 0,
            records: setup.party.clone(),
        })
    }

    pub fn slot_count(&self) -> u8 {
        self.slots.len() as u8
    }

    pub fn occupant(&self, slot: u8) -> Option<u8> {
        self.slots.get(slot as usize).copied().flatten()
    }

    pub(crate) fn set_occupant(&mut self, slot: u8, party_index: Option<u8>) {
        if let Some(entry) = self.slots.get_mut(slot as usize) {
            *entry = party_index;
        }
    }

    pub fn battler(&self, party_index: u8) -> Option<&Battler> {
        self.party.get(party_index as usize)
    }

    pub(crate) fn battler_mut(&mut self, party_index: u8) -> Option<&mut Battler> {
        self.party.get_mut(party_index as usize)
    }

    /// True once every party member has fainted.
    pub fn all_fainted(&self) -> bool {
        self.party.iter().all(|battler| battler.is_fainted())
    }

    /// Healthy party members that are not on the field.
    pub fn benched_healthy(&self) -> Vec<u8> {
        self.party
            .iter()
            .filter(|battler| battler.alive() && !battler.on_field())
            .map(|battler| battler.id.party_index)
            .collect()
    }

    pub fn item_count(&self, item: &DbSymbol) -> u16 {
        self.bag.get(item).copied().unwrap_or(0)
    }

    /// Removes one unit of `item` from the bag.
    pub(crate) fn take_item(&mut self, item: &DbSymbol) -> bool {
        match self.bag.get_mut(item) {
            Some(quantity) if *quantity > 0 => {
                *quantity -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn bag(&self) -> impl Iterator<Item = BagEntry> + '_ {
        self.bag.iter().map(|(item, &quantity)| BagEntry {
            item: item.clone(),
            quantity,
        })
    }

    pub(crate) fn records(&self) -> &[PokemonRecord] {
        &self.records
    }
}
