use serde::{Deserialize, Serialize};
use std::fmt;

/// Data-driven key identifying a database entry (`:tackle`, `:leftovers`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DbSymbol(String);

impl DbSymbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DbSymbol {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

impl From<String> for DbSymbol {
    fn from(symbol: String) -> Self {
        Self(symbol)
    }
}

impl fmt::Display for DbSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
