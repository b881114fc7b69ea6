//! Collaborator contracts for sessions, role lookups and table access.
//!
//! The reporting core never talks to a backend directly. Views receive these
//! traits at activation time:
//!
//! - `SessionProvider`: who is signed in
//! - `RoleLookup`: which role label that identity has
//! - `DataStore`: table queries, keyed lookups and mutations
//!
//! Implementations:
//!
//! ```text
//! LocalStore      # {root}/{table}.json, one JSON array per table
//! RestStore       # hosted backend over HTTP (feature "rest")
//! StaticSession   # fixed session, for the CLI and tests
//! TableRoleLookup # role column of a user table, through any DataStore
//! ```

pub mod auth;
pub mod local;
#[cfg(feature = "rest")]
pub mod rest;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Filter, Mutation, MutationOutcome, Record, Session, UserIdentity, Value};

// Re-export for convenience
pub use auth::{StaticSession, TableRoleLookup};
pub use local::LocalStore;
#[cfg(feature = "rest")]
pub use rest::RestStore;

/// Source of the current authenticated session.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current session, or `None` when nobody is signed in.
    async fn current_session(&self) -> Result<Option<Session>>;

    /// The current user, or `None` when nobody is signed in.
    async fn current_user(&self) -> Result<Option<UserIdentity>> {
        Ok(self.current_session().await?.map(|s| s.user))
    }
}

/// Resolves the role label of a user.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    /// `Ok(None)` when the user has no role row.
    async fn get_role(&self, user: &UserIdentity) -> Result<Option<String>>;
}

/// Table access of the backing store.
///
/// Failures are returned as `AppError::FetchFailed`, never panics.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// All rows of `table` passing every filter, in store order.
    async fn query(&self, table: &str, filters: &[Filter]) -> Result<Vec<Record>>;

    async fn mutate(&self, table: &str, mutation: Mutation) -> Result<MutationOutcome>;

    /// First row whose `field` equals `value`.
    async fn get_by(&self, table: &str, field: &str, value: &Value) -> Result<Option<Record>> {
        let filters = [Filter::eq(field, value.clone())];
        Ok(self.query(table, &filters).await?.into_iter().next())
    }
}
