use crate::battle::logic::Logic;
use crate::battle::state::{BattleEvent, BattleOutcome};
use crate::errors::BattleResult;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Who is running away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FleeKind {
    /// The player's bank trying to escape a wild battle.
    Player,
    /// A roaming wild creature leaving at the end of the round.
    Roaming,
}

/// Escape odds out of 256, from the fastest battler on each side and the
/// number of attempts so far (this one included).
pub fn escape_odds(own_speed: u32, foe_speed: u32, attempts: u8) -> u32 {
    if foe_speed == 0 {
        return 256;
    }
    (own_speed * 128 / foe_speed + 30 * attempts as u32) % 256
}

fn fastest_speed(logic: &Logic, bank: u8, own: bool) -> u32 {
    logic
        .active_battlers()
        .into_iter()
        .filter(|id| (id.bank == bank) == own)
        .map(|id| logic.effective_speed(id))
        .max()
        .unwrap_or(0)
}

pub fn execute(logic: &mut Logic, bank: u8, kind: FleeKind) -> BattleResult<()> {
    let escaped = match kind {
        FleeKind::Roaming => true,
        FleeKind::Player if !logic.config().wild_battle => false,
        FleeKind::Player => {
            let own = fastest_speed(logic, bank, true);
            let foe = fastest_speed(logic, bank, false);
            let attempts = match logic.bank_mut(bank) {
                Some(b) => {
                    b.flee_attempts = b.flee_attempts.saturating_add(1);
                    b.flee_attempts
                }
                None => return Ok(()),
            };
            if own >= foe {
                true
            } else {
                let odds = escape_odds(own, foe, attempts);
                debug!(bank, own, foe, attempts, odds, "rolling escape");
                logic.rng().range(256, "flee") < odds
            }
        }
    };

    if escaped {
        logic.emit(BattleEvent::FleeSucceeded { bank });
        logic.end_battle(BattleOutcome::Flee);
    } else {
        logic.emit(BattleEvent::FleeFailed { bank });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(50, 100, 1, 94)]
    #[case(50, 100, 3, 154)]
    #[case(99, 100, 5, 20)]
    #[case(10, 0, 1, 256)]
    fn test_escape_odds(#[case] own: u32, #[case] foe: u32, #[case] attempts: u8, #[case] expected: u32) {
        assert_eq!(escape_odds(own, foe, attempts), expected);
    }
}
