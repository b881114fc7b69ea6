//! Query filters and mutations understood by data stores.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Record, Value};

/// A single-field row filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    Eq { field: String, value: Value },
    Neq { field: String, value: Value },
    NotNull { field: String },
    IsNull { field: String },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Neq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not_null(field: impl Into<String>) -> Self {
        Filter::NotNull {
            field: field.into(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Filter::IsNull {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Eq { field, .. }
            | Filter::Neq { field, .. }
            | Filter::NotNull { field }
            | Filter::IsNull { field } => field,
        }
    }

    /// Evaluate the filter against an in-memory record.
    ///
    /// Missing fields behave like null. `neq` follows SQL: null never
    /// compares unequal.
    pub fn matches(&self, record: &Record) -> bool {
        let current = record.get(self.field()).unwrap_or(&Value::Null);
        match self {
            Filter::Eq { value, .. } => !current.is_null() && same_value(current, value),
            Filter::Neq { value, .. } => !current.is_null() && !same_value(current, value),
            Filter::NotNull { .. } => !current.is_null(),
            Filter::IsNull { .. } => current.is_null(),
        }
    }
}

/// Compare by rendered label so `2019` and `"2019"` are equal, as they are
/// over the REST wire.
fn same_value(a: &Value, b: &Value) -> bool {
    a == b || a.as_label() == b.as_label()
}

/// Apply every filter (logical AND).
pub fn matches_all(filters: &[Filter], record: &Record) -> bool {
    filters.iter().all(|f| f.matches(record))
}

/// A write against a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Insert(Record),
    Update { filters: Vec<Filter>, patch: Record },
    Delete { filters: Vec<Filter> },
}

impl Mutation {
    /// Reject updates and deletes without filters; they would touch every row.
    pub fn ensure_targeted(&self) -> Result<()> {
        match self {
            Mutation::Update { filters, .. } | Mutation::Delete { filters } if filters.is_empty() => {
                Err(AppError::validation(
                    "update/delete without filters would touch every row",
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Rows affected by a mutation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MutationOutcome {
    pub affected: usize,
    pub rows: Vec<Record>,
}
