use crate::battle::battler::{Battler, BattlerId};
use crate::battle::effects::MoveContext;
use crate::battle::logic::Logic;
use crate::pokemon::StatusCondition;
use schema::{MoveCategory, StatType};

/// Result of a damage calculation, before any prevention hook sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRoll {
    pub damage: u16,
    pub critical: bool,
    pub effectiveness: f32,
}

pub const PARALYSIS_SPEED_MULTIPLIER: f64 = 0.5;
pub const STAB_MULTIPLIER: f64 = 1.5;
pub const CRITICAL_MULTIPLIER: f64 = 1.5;
pub const SPREAD_MULTIPLIER: f64 = 0.75;
pub const BURN_MULTIPLIER: f64 = 0.5;

/// Speed after stages and paralysis.
pub fn effective_speed(battler: &Battler) -> u32 {
    let mut speed = battler.raw_stat(StatType::Speed) as f64 * battler.stat_modifier(StatType::Speed);
    if matches!(battler.status, Some(StatusCondition::Paralysis)) {
        speed *= PARALYSIS_SPEED_MULTIPLIER;
    }
    speed.floor() as u32
}

/// Attack or special attack for `category`. A critical hit ignores a
/// lowered stage.
pub fn effective_attack(battler: &Battler, category: MoveCategory, critical: bool) -> f64 {
    let stat = match category {
        MoveCategory::Special => StatType::SpecialAttack,
        _ => StatType::Attack,
    };
    let stage_modifier = if critical && battler.stage(stat) < 0 {
        1.0
    } else {
        battler.stat_modifier(stat)
    };
    battler.raw_stat(stat) as f64 * stage_modifier
}

/// Defense or special defense for `category`. A critical hit ignores a
/// raised stage.
pub fn effective_defense(battler: &Battler, category: MoveCategory, critical: bool) -> f64 {
    let stat = match category {
        MoveCategory::Special => StatType::SpecialDefense,
        _ => StatType::Defense,
    };
    let stage_modifier = if critical && battler.stage(stat) > 0 {
        1.0
    } else {
        battler.stat_modifier(stat)
    };
    (battler.raw_stat(stat) as f64 * stage_modifier).max(1.0)
}

/// Accuracy/evasion stages use a 3-based table rather than the 2-based one.
pub fn accuracy_stage_multiplier(stage: i8) -> f64 {
    let stage = stage.clamp(-6, 6) as f64;
    if stage >= 0.0 {
        (3.0 + stage) / 3.0
    } else {
        3.0 / (3.0 - stage)
    }
}

/// Hit chance in percent, or `None` when the move cannot miss.
pub fn hit_chance(move_accuracy: u8, user: &Battler, target: &Battler) -> Option<u8> {
    if move_accuracy == 0 || user.id == target.id {
        return None;
    }
    let stage = (user.stage(StatType::Accuracy) - target.stage(StatType::Evasion)).clamp(-6, 6);
    let chance = (move_accuracy as f64 * accuracy_stage_multiplier(stage)).round();
    if chance >= 100.0 {
        None
    } else {
        Some(chance.max(1.0) as u8)
    }
}

/// Rolls accuracy. Certain hits draw nothing from the RNG.
pub fn move_hits(logic: &mut Logic, ctx: &MoveContext, target: BattlerId) -> bool {
    let chance = hit_chance(ctx.move_data.accuracy, logic.battler(ctx.user), logic.battler(target));
    match chance {
        None => true,
        Some(chance) => logic.rng().chance(chance, "accuracy"),
    }
}

/// One-in-n critical odds by crit stage.
pub fn critical_odds(stage: u8) -> u32 {
    match stage {
        0 => 24,
        1 => 8,
        2 => 2,
        _ => 1,
    }
}

pub fn critical_hit(logic: &mut Logic, stage: u8) -> bool {
    let odds = critical_odds(stage);
    odds == 1 || logic.rng().range(odds, "critical hit") == 0
}

/// `((2L/5 + 2) * P * A / D) / 50 + 2`, before modifiers.
pub fn base_damage(level: u8, power: u16, attack: f64, defense: f64) -> f64 {
    let level_factor = (2 * level as u32 / 5 + 2) as f64;
    (level_factor * power as f64 * attack / defense).floor() / 50.0 + 2.0
}

/// Full damage calculation for one target of a damaging move.
///
/// Draws the critical roll, then the 85-100% random factor.
pub fn damage_roll(logic: &mut Logic, ctx: &MoveContext, target: BattlerId, target_count: usize) -> DamageRoll {
    let move_data = &ctx.move_data;
    let effectiveness = logic
        .db()
        .type_effectiveness(move_data.move_type, &logic.battler(target).types);
    if effectiveness == 0.0 {
        return DamageRoll {
            damage: 0,
            critical: false,
            effectiveness,
        };
    }

    let critical = critical_hit(logic, move_data.critical_rate);
    let random = (85 + logic.rng().range(16, "damage roll")) as f64 / 100.0;

    let user = logic.battler(ctx.user);
    let defender = logic.battler(target);
    let attack = effective_attack(user, move_data.category, critical);
    let defense = effective_defense(defender, move_data.category, critical);

    let mut damage = base_damage(user.level, move_data.power, attack, defense).floor();
    if target_count > 1 {
        damage = (damage * SPREAD_MULTIPLIER).floor();
    }
    if critical {
        damage = (damage * CRITICAL_MULTIPLIER).floor();
    }
    damage = (damage * random).floor();
    if user.has_type(move_data.move_type) {
        damage = (damage * STAB_MULTIPLIER).floor();
    }
    damage = (damage * effectiveness as f64).floor();
    if move_data.category == MoveCategory::Physical && matches!(user.status, Some(StatusCondition::Burn)) {
        damage = (damage * BURN_MULTIPLIER).floor();
    }

    DamageRoll {
        damage: (damage as u16).max(1),
        critical,
        effectiveness,
    }
}
