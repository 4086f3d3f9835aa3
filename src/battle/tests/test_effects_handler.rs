use super::common::*;
use crate::battle::effects::{Effect, EffectId, EffectKind, EffectScope, Hook, Prevent, SwitchContext};
use crate::battle::logic::Logic;
use crate::battle::battler::Position;
use crate::errors::BattleResult;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<usize>>>;

#[derive(Debug)]
struct Probe {
    label: usize,
    scope: EffectScope,
    prevents: bool,
    dead: bool,
    spawns: bool,
    kills: Option<EffectId>,
    visits: Log,
    deletions: Log,
}

impl Probe {
    fn new(label: usize, visits: &Log, deletions: &Log) -> Self {
        Self {
            label,
            scope: EffectScope::Field,
            prevents: false,
            dead: false,
            spawns: false,
            kills: None,
            visits: Arc::clone(visits),
            deletions: Arc::clone(deletions),
        }
    }
}

impl Effect for Probe {
    fn name(&self) -> EffectKind {
        EffectKind::Mist
    }

    fn scope(&self) -> EffectScope {
        self.scope
    }

    fn dead(&self) -> bool {
        self.dead
    }

    fn on_delete(&mut self, _logic: &mut Logic) -> BattleResult<()> {
        self.deletions.lock().unwrap().push(self.label);
        Ok(())
    }

    fn on_switch_prevention(&mut self, _logic: &mut Logic, _ctx: &SwitchContext) -> BattleResult<Option<Prevent>> {
        self.visits.lock().unwrap().push(self.label);
        Ok(self.prevents.then_some(Prevent))
    }

    fn on_end_turn_event(&mut self, logic: &mut Logic) -> BattleResult<()> {
        self.visits.lock().unwrap().push(self.label);
        if self.spawns {
            self.spawns = false;
            logic.add_effect(Box::new(Probe::new(self.label + 100, &self.visits, &self.deletions)));
        }
        if let Some(id) = self.kills.take() {
            logic.kill_effect(id);
        }
        Ok(())
    }
}

fn logic() -> Logic {
    TestBattle::singles(
        vec![pokemon("snorlax", 50, &["tackle"])],
        vec![pokemon("snorlax", 50, &["tackle"])],
    )
    .build_logic()
}

fn switch_ctx() -> SwitchContext {
    SwitchContext {
        outgoing: Some(PLAYER_LEAD),
        incoming: PLAYER_LEAD,
        position: Position::new(0, 0),
        baton_pass: false,
    }
}

fn logs() -> (Log, Log) {
    (Arc::new(Mutex::new(Vec::new())), Arc::new(Mutex::new(Vec::new())))
}

#[test]
fn test_prevention_stops_at_first_verdict() {
    let mut logic = logic();
    let (visits, deletions) = logs();
    for label in 1..=5 {
        let mut probe = Probe::new(label, &visits, &deletions);
        probe.prevents = label == 3;
        logic.add_effect(Box::new(probe));
    }

    let ctx = switch_ctx();
    let verdict = logic
        .dispatch_prevention(Hook::OnSwitchPrevention, &[EffectScope::Field], |effect, logic| {
            effect.on_switch_prevention(logic, &ctx)
        })
        .unwrap();

    assert_eq!(verdict, Some(Prevent));
    assert_eq!(*visits.lock().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_notification_reaches_every_effect_once_in_order() {
    let mut logic = logic();
    let (visits, deletions) = logs();
    for label in 1..=5 {
        logic.add_effect(Box::new(Probe::new(label, &visits, &deletions)));
    }

    logic
        .dispatch_notification(Hook::OnEndTurnEvent, &[EffectScope::Field], |effect, logic| {
            effect.on_end_turn_event(logic)
        })
        .unwrap();

    assert_eq!(*visits.lock().unwrap(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_effects_added_mid_dispatch_wait_for_next_pass() {
    let mut logic = logic();
    let (visits, deletions) = logs();
    let mut spawner = Probe::new(1, &visits, &deletions);
    spawner.spawns = true;
    logic.add_effect(Box::new(spawner));
    logic.add_effect(Box::new(Probe::new(2, &visits, &deletions)));

    let end_turn = |logic: &mut Logic| {
        logic
            .dispatch_notification(Hook::OnEndTurnEvent, &[EffectScope::Field], |effect, logic| {
                effect.on_end_turn_event(logic)
            })
            .unwrap();
    };
    end_turn(&mut logic);
    assert_eq!(*visits.lock().unwrap(), vec![1, 2]);

    end_turn(&mut logic);
    assert_eq!(*visits.lock().unwrap(), vec![1, 2, 1, 2, 101]);
}

#[test]
fn test_effect_killed_mid_dispatch_is_skipped_without_disturbing_others() {
    let mut logic = logic();
    let (visits, deletions) = logs();
    let first = logic.add_effect(Box::new(Probe::new(1, &visits, &deletions)));
    let _second = logic.add_effect(Box::new(Probe::new(2, &visits, &deletions)));
    let third = logic.add_effect(Box::new(Probe::new(3, &visits, &deletions)));
    logic.add_effect(Box::new(Probe::new(4, &visits, &deletions)));
    if let Some(effect) = logic.effects.get_mut(first) {
        if let Some(probe) = crate::battle::effects::downcast_mut::<Probe>(effect) {
            probe.kills = Some(third);
        }
    }

    logic
        .dispatch_notification(Hook::OnEndTurnEvent, &[EffectScope::Field], |effect, logic| {
            effect.on_end_turn_event(logic)
        })
        .unwrap();

    assert_eq!(*visits.lock().unwrap(), vec![1, 2, 4]);
}

#[test]
fn test_purge_calls_on_delete_once_in_registry_order() {
    let mut logic = logic();
    let (visits, deletions) = logs();
    let before = logic.effects().len();
    for label in 1..=4 {
        let mut probe = Probe::new(label, &visits, &deletions);
        probe.dead = label % 2 == 0;
        logic.add_effect(Box::new(probe));
    }

    logic.purge_dead_effects().unwrap();
    logic.purge_dead_effects().unwrap();

    assert_eq!(*deletions.lock().unwrap(), vec![2, 4]);
    assert_eq!(logic.effects().len(), before + 2);
}

#[test]
fn test_pokemon_scope_is_visited_before_field_scope() {
    let mut logic = logic();
    let (visits, deletions) = logs();
    logic.add_effect(Box::new(Probe::new(1, &visits, &deletions)));
    let mut bound = Probe::new(2, &visits, &deletions);
    bound.scope = EffectScope::Pokemon(FOE_LEAD);
    logic.add_effect(Box::new(bound));

    let scopes = logic.scopes_for(&[FOE_LEAD]);
    logic
        .dispatch_notification(Hook::OnEndTurnEvent, &scopes, |effect, logic| {
            effect.on_end_turn_event(logic)
        })
        .unwrap();

    assert_eq!(*visits.lock().unwrap(), vec![2, 1]);
}
