//! A battle described in RON: the config plus every bank's setup.

use crate::battle::bank::BankSetup;
use crate::config::BattleConfig;
use crate::errors::DataError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: BattleConfig,
    pub banks: Vec<BankSetup>,
}

impl Scenario {
    pub fn from_ron_str(text: &str) -> Result<Self, DataError> {
        let scenario: Scenario = ron::from_str(text).map_err(|e| DataError::Parse {
            what: "scenario".to_string(),
            details: e.to_string(),
        })?;
        scenario.config.validate()?;
        if scenario.banks.len() < 2 {
            return Err(DataError::InvalidConfig(format!(
                "a scenario needs at least two banks, got {}",
                scenario.banks.len()
            )));
        }
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        Self::from_ron_str(&text)
    }
}
