//! Authenticated session data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Identity key used for role lookups
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserIdentity,

    /// Bearer token for the data store, when it has one
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn for_user(user: UserIdentity) -> Self {
        Self {
            user,
            access_token: None,
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_without_expiry_never_expires() {
        let session = Session::for_user(UserIdentity::new("u1"));
        assert!(!session.is_expired(Utc::now()));
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let mut session = Session::for_user(UserIdentity::new("u1"));
        session.expires_at = Some(now - Duration::seconds(1));
        assert!(session.is_expired(now));

        session.expires_at = Some(now + Duration::minutes(5));
        assert!(!session.is_expired(now));
    }
}
