//! Chain parameters

use serde::{Deserialize, Serialize};

use crate::constants::CUTOFF_AGE;
use crate::error::{LedgerError, Result};
use crate::types::Natural;

/// Parameters controlling how much fork history the chain keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Blocks at height ≤ max height − `cutoff_age` are never accepted; `cutoff_age + 1`
    /// height levels are retained.
    pub cutoff_age: Natural,
}

impl ChainConfig {
    /// Default retention window.
    pub const STANDARD: Self = Self {
        cutoff_age: CUTOFF_AGE,
    };

    /// Keeps the three tallest height levels.
    pub const SHALLOW: Self = Self { cutoff_age: 2 };

    pub const fn with_cutoff_age(cutoff_age: Natural) -> Self {
        Self { cutoff_age }
    }

    /// Parses a JSON object such as `{"cutoff_age": 6}`; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cutoff_age == 0 {
            return Err(LedgerError::InvalidConfig(
                "cutoff_age must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}
