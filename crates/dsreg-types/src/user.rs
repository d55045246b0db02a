use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::{canonical_key_field, validate_user_id, validate_user_name};

/// A registry account.
///
/// The id is case-insensitive: `Alice` and `alice` name the same user. The
/// stored value keeps the casing it was created with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Check id and name against the identifier rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_id("user id", &self.id)?;
        validate_user_name(&self.name)
    }

    /// The lowercase id used in ledger keys.
    pub fn key_id(&self) -> String {
        canonical_key_field(&self.id)
    }
}
