//! Roles and access policies.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of the current session's user.
///
/// Serialized as its domain label (`"Lector"`), matching the user table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Role {
    Administrator,
    Editor,
    Reader,
    Unauthenticated,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Administrator,
        Role::Editor,
        Role::Reader,
        Role::Unauthenticated,
    ];

    /// Domain label stored in the user table.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Administrator => "Administrador",
            Role::Editor => "Editor",
            Role::Reader => "Lector",
            Role::Unauthenticated => "Anónimo",
        }
    }

    /// Parse a domain label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|role| role.label().to_lowercase() == wanted)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.label().to_string()
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        Role::from_label(&label).ok_or_else(|| format!("unknown role label '{label}'"))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Set of roles acceptable for a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed: BTreeSet<Role>,
}

impl AccessPolicy {
    /// Policy requiring exactly one role.
    pub fn only(role: Role) -> Self {
        Self {
            allowed: BTreeSet::from([role]),
        }
    }

    /// Policy accepting any of the given roles.
    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: roles.into_iter().collect(),
        }
    }

    /// Build a policy from domain labels; `None` if a label is unknown.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Option<Self> {
        labels
            .iter()
            .map(|l| Role::from_label(l.as_ref()))
            .collect::<Option<BTreeSet<_>>>()
            .map(|allowed| Self { allowed })
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.allowed.iter().copied()
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<_> = self.allowed.iter().map(Role::label).collect();
        write!(f, "{{{}}}", labels.join(", "))
    }
}
