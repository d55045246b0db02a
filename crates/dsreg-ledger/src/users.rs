use std::sync::Arc;

use dsreg_store::KeyValueLedger;
use dsreg_types::validation::{validate_user_id, validate_user_name};
use dsreg_types::User;
use tracing::info;

use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::schema::{user_key, Schema};

/// Registered users. Users are never deleted.
pub struct UserStore<L: ?Sized> {
    schema: Schema<L>,
}

impl<L: KeyValueLedger + ?Sized> UserStore<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self::from_schema(Schema::new(ledger))
    }

    pub(crate) fn from_schema(schema: Schema<L>) -> Self {
        Self { schema }
    }

    pub fn create_user(&self, id: &str, name: &str) -> LedgerResult<User> {
        let user = User::new(id, name);
        user.validate()?;

        let key = user_key(id);
        if self.schema.users.exists(&key)? {
            return Err(LedgerError::already_exists(EntityKind::User, id));
        }
        self.schema.users.put(&user, &key)?;
        info!(user = %id, "user created");
        Ok(user)
    }

    /// Replace the display name of an existing user.
    pub fn modify_user_name(&self, id: &str, new_name: &str) -> LedgerResult<User> {
        validate_user_id("user id", id)?;
        validate_user_name(new_name)?;

        let key = user_key(id);
        let mut user = self
            .schema
            .users
            .get(&key)?
            .ok_or_else(|| LedgerError::not_found(EntityKind::User, id))?;
        user.name = new_name.to_string();
        self.schema.users.put(&user, &key)?;
        info!(user = %id, "user renamed");
        Ok(user)
    }

    pub fn query_user(&self, id: &str) -> LedgerResult<User> {
        validate_user_id("user id", id)?;
        self.schema
            .users
            .get(&user_key(id))?
            .ok_or_else(|| LedgerError::not_found(EntityKind::User, id))
    }

    /// All users. Order unspecified.
    pub fn query_all_users(&self) -> LedgerResult<Vec<User>> {
        Ok(self.schema.users.query_all()?)
    }

    pub fn user_exists(&self, id: &str) -> LedgerResult<bool> {
        validate_user_id("user id", id)?;
        Ok(self.schema.users.exists(&user_key(id))?)
    }
}

impl<L: ?Sized> Clone for UserStore<L> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
        }
    }
}
