use crate::battle::effects::Hook;
use crate::errors::{BattleEngineError, BattleResult, DataError, InvariantViolation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

/// Battle-wide settings, usually read from a RON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Active battlers per bank (1 = single, 2 = double battle)
    pub vs_type: u8,
    /// Seed for the battle RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Round limit for simulated battles
    pub max_turns: u32,
    /// Fleeing is only allowed against wild creatures
    pub wild_battle: bool,
    /// Hook names whose dispatches are logged per effect
    pub traced_hooks: Vec<String>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            vs_type: 1,
            seed: None,
            max_turns: 100,
            wild_battle: false,
            traced_hooks: Vec::new(),
        }
    }
}

impl BattleConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, DataError> {
        let config: BattleConfig = ron::from_str(text).map_err(|e| DataError::Parse {
            what: "battle config".to_string(),
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        Self::from_ron_str(&text)
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if !(1..=2).contains(&self.vs_type) {
            return Err(DataError::InvalidConfig(format!(
                "vs_type must be 1 or 2, got {}",
                self.vs_type
            )));
        }
        Ok(())
    }

    /// Resolves `traced_hooks` into hook identifiers.
    pub fn traced_hook_set(&self) -> BattleResult<HashSet<Hook>> {
        self.traced_hooks
            .iter()
            .map(|name| {
                Hook::from_str(name)
                    .map_err(|_| BattleEngineError::from(InvariantViolation::UnknownHook(name.clone())))
            })
            .collect()
    }
}
