use dsreg_ledger::LedgerConfig;
use serde::{Deserialize, Serialize};

use crate::error::ChaincodeResult;

/// A user created by [`crate::bootstrap::init`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedUser {
    pub id: String,
    pub name: String,
}

impl SeedUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaincodeConfig {
    pub seed_users: Vec<SeedUser>,
    pub ledger: LedgerConfig,
}

impl Default for ChaincodeConfig {
    fn default() -> Self {
        Self {
            seed_users: vec![
                SeedUser::new("user1", "User1"),
                SeedUser::new("user2", "User2"),
                SeedUser::new("admin", "Admin"),
            ],
            ledger: LedgerConfig::default(),
        }
    }
}

impl ChaincodeConfig {
    /// Parse configuration from a TOML string. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> ChaincodeResult<Self> {
        Ok(toml::from_str(content)?)
    }
}
