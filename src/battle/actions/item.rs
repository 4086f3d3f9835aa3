//! Bag items used through the Item action.
//!
//! Each usable item is a list of small capabilities built from its data
//! record. An item can be used on a battler when at least one capability
//! applies to it.

use crate::battle::battler::{Battler, BattlerId, MAX_STAGE};
use crate::battle::logic::Logic;
use crate::battle::state::BattleEvent;
use crate::database::StaticDatabase;
use crate::errors::BattleResult;
use schema::{DbSymbol, HealAmount, ItemData, StatType, StatusType};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

pub trait Usable: Debug + Send + Sync {
    /// Whether using the item on `battler` would do anything.
    fn applies(&self, battler: &Battler) -> bool;

    fn apply(&self, logic: &mut Logic, target: BattlerId) -> BattleResult<()>;
}

fn can_heal(battler: &Battler) -> bool {
    battler.alive() && battler.hp() < battler.max_hp()
}

#[derive(Debug, Clone, Copy)]
pub struct HealsFixedAmount(pub u16);

impl Usable for HealsFixedAmount {
    fn applies(&self, battler: &Battler) -> bool {
        can_heal(battler)
    }

    fn apply(&self, logic: &mut Logic, target: BattlerId) -> BattleResult<()> {
        logic.damage_handler().heal(target, self.0).map(|_| ())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HealsPercent(pub u8);

impl Usable for HealsPercent {
    fn applies(&self, battler: &Battler) -> bool {
        can_heal(battler)
    }

    fn apply(&self, logic: &mut Logic, target: BattlerId) -> BattleResult<()> {
        let max_hp = logic.battler(target).max_hp() as u32;
        let amount = (max_hp * self.0 as u32 / 100).max(1) as u16;
        logic.damage_handler().heal(target, amount).map(|_| ())
    }
}

/// Cures the listed statuses, or any status when `statuses` is empty.
#[derive(Debug, Clone)]
pub struct HealsStatus {
    pub statuses: Vec<StatusType>,
}

impl HealsStatus {
    pub fn any() -> Self {
        Self { statuses: Vec::new() }
    }
}

impl Usable for HealsStatus {
    fn applies(&self, battler: &Battler) -> bool {
        battler.alive()
            && battler
                .status
                .is_some_and(|status| self.statuses.is_empty() || self.statuses.contains(&status.kind()))
    }

    fn apply(&self, logic: &mut Logic, target: BattlerId) -> BattleResult<()> {
        logic.status_handler().cure(target).map(|_| ())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BoostsStat {
    pub stat: StatType,
    pub stages: i8,
}

impl Usable for BoostsStat {
    fn applies(&self, battler: &Battler) -> bool {
        battler.alive() && battler.on_field() && battler.stage(self.stat) < MAX_STAGE
    }

    fn apply(&self, logic: &mut Logic, target: BattlerId) -> BattleResult<()> {
        logic
            .stat_change_handler()
            .stat_change(target, self.stat, self.stages, Some(target))
            .map(|_| ())
    }
}

#[derive(Debug)]
pub struct UsableItem {
    pub item: DbSymbol,
    capabilities: Vec<Box<dyn Usable>>,
}

impl UsableItem {
    /// `None` for items without a bag usage.
    pub fn from_data(data: &ItemData) -> Option<Self> {
        let usage = data.usage.as_ref()?;
        let mut capabilities: Vec<Box<dyn Usable>> = Vec::new();
        match usage.heal {
            Some(HealAmount::Fixed(amount)) => capabilities.push(Box::new(HealsFixedAmount(amount))),
            Some(HealAmount::Percent(percent)) => capabilities.push(Box::new(HealsPercent(percent))),
            None => {}
        }
        if usage.cure_all_status {
            capabilities.push(Box::new(HealsStatus::any()));
        } else if !usage.cure_status.is_empty() {
            capabilities.push(Box::new(HealsStatus {
                statuses: usage.cure_status.clone(),
            }));
        }
        if let Some(boost) = usage.stat_boost {
            capabilities.push(Box::new(BoostsStat {
                stat: boost.stat,
                stages: boost.stages,
            }));
        }
        if capabilities.is_empty() {
            return None;
        }
        Some(Self {
            item: data.db_symbol.clone(),
            capabilities,
        })
    }

    pub fn usable_on(&self, battler: &Battler) -> bool {
        self.capabilities.iter().any(|capability| capability.applies(battler))
    }

    /// Applies every capability that applies, in declaration order.
    pub fn use_on(&self, logic: &mut Logic, target: BattlerId) -> BattleResult<()> {
        for capability in &self.capabilities {
            if capability.applies(logic.battler(target)) {
                capability.apply(logic, target)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UsableItemRegistry {
    items: HashMap<DbSymbol, Arc<UsableItem>>,
}

impl UsableItemRegistry {
    pub fn from_database(db: &StaticDatabase) -> Self {
        let items = db
            .items()
            .filter_map(UsableItem::from_data)
            .map(|usable| (usable.item.clone(), Arc::new(usable)))
            .collect();
        Self { items }
    }

    pub fn get(&self, item: &DbSymbol) -> Option<Arc<UsableItem>> {
        self.items.get(item).cloned()
    }

    pub fn contains(&self, item: &DbSymbol) -> bool {
        self.items.contains_key(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn execute(logic: &mut Logic, bank: u8, item: &DbSymbol, target: BattlerId) -> BattleResult<()> {
    let Some(usable) = logic.registries().usable_items.get(item) else {
        logic.emit(BattleEvent::ItemHadNoEffect {
            bank,
            item: item.clone(),
        });
        return Ok(());
    };
    if !usable.usable_on(logic.battler(target)) {
        debug!(%item, ?target, "item rejected by usability check");
        logic.emit(BattleEvent::ItemHadNoEffect {
            bank,
            item: item.clone(),
        });
        return Ok(());
    }
    let taken = logic.bank_mut(bank).is_some_and(|b| b.take_item(item));
    if !taken {
        return Ok(());
    }
    logic.emit(BattleEvent::ItemUsed {
        bank,
        item: item.clone(),
        target,
    });
    usable.use_on(logic, target)
}
