//! Stock session and role lookup collaborators.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Session, StoreConfig, UserIdentity, Value};
use crate::storage::{DataStore, RoleLookup, SessionProvider};

/// A session provider returning a fixed session.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    session: Option<Session>,
}

impl StaticSession {
    pub fn new(session: Option<Session>) -> Self {
        Self { session }
    }

    /// Nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Signed in as the given user id.
    pub fn user(id: impl Into<String>) -> Self {
        Self::new(Some(Session::for_user(UserIdentity::new(id))))
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.clone())
    }
}

/// Reads role labels from a user table keyed by identity.
pub struct TableRoleLookup {
    store: Arc<dyn DataStore>,
    table: String,
    identity_field: String,
    role_field: String,
}

impl TableRoleLookup {
    pub fn new(
        store: Arc<dyn DataStore>,
        table: impl Into<String>,
        identity_field: impl Into<String>,
        role_field: impl Into<String>,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            identity_field: identity_field.into(),
            role_field: role_field.into(),
        }
    }

    /// Lookup over the user table layout named in configuration.
    pub fn from_config(store: Arc<dyn DataStore>, config: &StoreConfig) -> Self {
        Self::new(
            store,
            &config.user_table,
            &config.identity_field,
            &config.role_field,
        )
    }
}

#[async_trait]
impl RoleLookup for TableRoleLookup {
    async fn get_role(&self, user: &UserIdentity) -> Result<Option<String>> {
        let row = self
            .store
            .get_by(&self.table, &self.identity_field, &Value::from(user.id.as_str()))
            .await?;
        Ok(row.and_then(|r| r.text(&self.role_field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use crate::storage::LocalStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_role_from_user_table() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        store
            .write_table(
                "usuarios",
                &[
                    Record::new().with("id", "u-1").with("rol", "Editor"),
                    Record::new().with("id", "u-2"),
                ],
            )
            .await
            .unwrap();

        let lookup = TableRoleLookup::from_config(Arc::new(store), &StoreConfig::default());

        let role = lookup.get_role(&UserIdentity::new("u-1")).await.unwrap();
        assert_eq!(role.as_deref(), Some("Editor"));

        // Row without a role column, and no row at all.
        assert!(lookup.get_role(&UserIdentity::new("u-2")).await.unwrap().is_none());
        assert!(lookup.get_role(&UserIdentity::new("u-3")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_static_session() {
        assert!(StaticSession::anonymous().current_user().await.unwrap().is_none());
        let user = StaticSession::user("u-1").current_user().await.unwrap().unwrap();
        assert_eq!(user.id, "u-1");
    }
}
