//! Ordered registry of live effects.
//!
//! Effects are stored in creation order. Dispatch never iterates the
//! registry directly: it takes a snapshot of ids, then checks each one out,
//! runs the hook and puts it back. That keeps additions made during a pass
//! out of the pass, lets removals happen without skipping entries, and keeps
//! an effect from being re-entered while one of its own hooks is running.

use super::{downcast_mut, downcast_ref, Effect, EffectKind, EffectScope};

pub type EffectId = u64;

#[derive(Debug)]
struct Slot {
    id: EffectId,
    scope: EffectScope,
    kind: EffectKind,
    /// `None` while the effect is checked out by a dispatch.
    effect: Option<Box<dyn Effect>>,
    killed: bool,
}

impl Slot {
    fn alive(&self) -> bool {
        !self.killed && self.effect.as_ref().map_or(true, |effect| !effect.dead())
    }
}

#[derive(Debug, Default)]
pub struct EffectsHandler {
    slots: Vec<Slot>,
    next_id: EffectId,
}

impl EffectsHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an effect. No de-duplication happens here.
    pub fn add(&mut self, effect: Box<dyn Effect>) -> EffectId {
        let id = self.next_id;
        self.next_id += 1;
        self.slots.push(Slot {
            id,
            scope: effect.scope(),
            kind: effect.name(),
            effect: Some(effect),
            killed: false,
        });
        id
    }

    fn index_of(&self, id: EffectId) -> Option<usize> {
        self.slots.binary_search_by_key(&id, |slot| slot.id).ok()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_alive(&self, id: EffectId) -> bool {
        self.index_of(id).is_some_and(|index| self.slots[index].alive())
    }

    /// Marks an effect dead. It stays in place until the next purge.
    pub fn kill(&mut self, id: EffectId) {
        if let Some(index) = self.index_of(id) {
            self.slots[index].killed = true;
        }
    }

    /// Marks every effect matching `predicate` dead and returns how many were hit.
    pub fn kill_where(&mut self, mut predicate: impl FnMut(EffectScope, EffectKind) -> bool) -> usize {
        let mut count = 0;
        for slot in self.slots.iter_mut().filter(|slot| !slot.killed) {
            if predicate(slot.scope, slot.kind) {
                slot.killed = true;
                count += 1;
            }
        }
        count
    }

    pub fn has(&self, scope: EffectScope, kind: EffectKind) -> bool {
        self.find(scope, kind).is_some()
    }

    pub fn find(&self, scope: EffectScope, kind: EffectKind) -> Option<EffectId> {
        self.slots
            .iter()
            .find(|slot| slot.scope == scope && slot.kind == kind && slot.alive())
            .map(|slot| slot.id)
    }

    pub fn find_all(&self, scope: EffectScope, kind: EffectKind) -> Vec<EffectId> {
        self.slots
            .iter()
            .filter(|slot| slot.scope == scope && slot.kind == kind && slot.alive())
            .map(|slot| slot.id)
            .collect()
    }

    /// Live effects in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (EffectId, &dyn Effect)> + '_ {
        self.slots.iter().filter(|slot| slot.alive()).filter_map(|slot| {
            slot.effect
                .as_deref()
                .map(|effect| (slot.id, effect as &dyn Effect))
        })
    }

    pub fn get(&self, id: EffectId) -> Option<&(dyn Effect + 'static)> {
        let index = self.index_of(id)?;
        self.slots[index].effect.as_deref()
    }

    pub fn get_mut(&mut self, id: EffectId) -> Option<&mut (dyn Effect + 'static)> {
        let index = self.index_of(id)?;
        self.slots[index].effect.as_deref_mut()
    }

    /// First live effect of `kind` in `scope`, downcast to its concrete type.
    pub fn find_as<T: Effect>(&self, scope: EffectScope, kind: EffectKind) -> Option<&T> {
        let id = self.find(scope, kind)?;
        downcast_ref::<T>(self.get(id)?)
    }

    pub fn find_as_mut<T: Effect>(&mut self, scope: EffectScope, kind: EffectKind) -> Option<&mut T> {
        let id = self.find(scope, kind)?;
        downcast_mut::<T>(self.get_mut(id)?)
    }

    /// Ids of live effects, grouped by `scopes` in the order given and in
    /// registry order within each scope.
    pub fn snapshot(&self, scopes: &[EffectScope]) -> Vec<EffectId> {
        scopes
            .iter()
            .flat_map(|scope| {
                self.slots
                    .iter()
                    .filter(move |slot| slot.scope == *scope && slot.alive())
                    .map(|slot| slot.id)
            })
            .collect()
    }

    /// Checks an effect out for a hook call. `None` if it was killed, removed
    /// or is already checked out.
    pub(crate) fn take(&mut self, id: EffectId) -> Option<Box<dyn Effect>> {
        let index = self.index_of(id)?;
        let slot = &mut self.slots[index];
        if slot.killed {
            return None;
        }
        slot.effect.take()
    }

    pub(crate) fn restore(&mut self, id: EffectId, effect: Box<dyn Effect>) {
        if let Some(index) = self.index_of(id) {
            self.slots[index].effect = Some(effect);
        }
    }

    /// Removes every dead effect and returns them in registry order.
    /// Effects currently checked out are left alone.
    pub(crate) fn drain_dead(&mut self) -> Vec<Box<dyn Effect>> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.slots.len());
        for mut slot in self.slots.drain(..) {
            match slot.effect.take() {
                Some(effect) if slot.killed || effect.dead() => removed.push(effect),
                effect => {
                    slot.effect = effect;
                    kept.push(slot);
                }
            }
        }
        self.slots = kept;
        removed
    }
}
