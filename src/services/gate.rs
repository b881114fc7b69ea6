// src/services/gate.rs

//! Role-gated data loading.
//!
//! Every statistics and listing view goes through `RoleGatedLoader`: the
//! session is resolved first, then the role, and only when the role is in
//! the view's policy is the wrapped fetch invoked. Any lookup failure denies
//! access. There are no retries; a failed activation stays failed until the
//! user reloads.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{AccessPolicy, Role, Session};
use crate::storage::{RoleLookup, SessionProvider};

/// A session whose role passed a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    pub session: Session,
    pub role: Role,
}

/// Data fetched behind the gate, with who fetched it.
#[derive(Debug, Clone)]
pub struct Gated<T> {
    pub role: Role,
    pub data: T,
}

/// Authorization boundary of the reporting views.
pub struct RoleGatedLoader {
    sessions: Arc<dyn SessionProvider>,
    roles: Arc<dyn RoleLookup>,
}

impl RoleGatedLoader {
    pub fn new(sessions: Arc<dyn SessionProvider>, roles: Arc<dyn RoleLookup>) -> Self {
        Self { sessions, roles }
    }

    /// Resolve session and role and check them against `policy`.
    pub async fn authorize(&self, policy: &AccessPolicy) -> Result<Authorized> {
        let session = match self.sessions.current_session().await {
            Ok(Some(session)) if !session.is_expired(Utc::now()) => session,
            Ok(Some(session)) => {
                log::info!("Session of '{}' has expired", session.user.id);
                return Err(AppError::Unauthenticated);
            }
            Ok(None) => return Err(AppError::Unauthenticated),
            Err(e) => {
                log::warn!("Session lookup failed, treating as signed out: {}", e);
                return Err(AppError::Unauthenticated);
            }
        };

        let user_id = session.user.id.clone();
        let label = match self.roles.get_role(&session.user).await {
            Ok(Some(label)) => label,
            Ok(None) => {
                log::warn!("No role row for user '{}'", user_id);
                return Err(AppError::role_resolution(user_id, "no role assigned"));
            }
            Err(e) => {
                log::warn!("Role lookup failed for user '{}': {}", user_id, e);
                return Err(AppError::role_resolution(user_id, e));
            }
        };

        let Some(role) = Role::from_label(&label) else {
            log::warn!("User '{}' has unrecognised role '{}'", user_id, label);
            return Err(AppError::access_denied(label));
        };

        if !policy.permits(role) {
            log::info!(
                "Role {} of user '{}' not in {}",
                role,
                user_id,
                policy
            );
            return Err(AppError::access_denied(role.label()));
        }

        log::debug!("User '{}' authorized as {}", user_id, role);
        Ok(Authorized { session, role })
    }

    /// Run `fetch` only if the current role passes `policy`.
    pub async fn load<T, F, Fut>(&self, policy: &AccessPolicy, fetch: F) -> Result<Gated<T>>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let Authorized { session, role } = self.authorize(policy).await?;
        let data = fetch(session).await?;
        Ok(Gated { role, data })
    }
}
