//! Statistics report and listing screen definitions.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::models::{AccessPolicy, Filter, Record};

/// How a grouping label is derived from a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyDerive {
    /// The field value itself
    #[default]
    Value,
    /// Year of a date field (`2024`)
    Year,
    /// Month of a date field (`2024-03`)
    Month,
}

/// Field reference used as a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    pub field: String,

    #[serde(default)]
    pub derive: KeyDerive,
}

impl KeySpec {
    pub fn value(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            derive: KeyDerive::Value,
        }
    }

    pub fn month(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            derive: KeyDerive::Month,
        }
    }

    /// Derive the raw label; `None` when the field is missing, null or not a date.
    pub fn label(&self, record: &Record) -> Option<String> {
        match self.derive {
            KeyDerive::Value => record.text(&self.field),
            KeyDerive::Year => record.date(&self.field).map(|d| d.year().to_string()),
            KeyDerive::Month => record
                .date(&self.field)
                .map(|d| format!("{:04}-{:02}", d.year(), d.month())),
        }
    }
}

/// Output ordering of a frequency report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum ReportOrder {
    /// Most frequent first; ties keep encounter order
    #[default]
    CountDesc,
    /// Numeric labels ascending, then text, sentinel last
    Natural,
    /// First-encounter order
    Encounter,
    /// `CountDesc` truncated to `limit` rows
    Top { limit: usize },
}

/// What a report computes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportKind {
    Frequency {
        key: KeySpec,
        sentinel: String,
        #[serde(default)]
        order: ReportOrder,
    },
    CrossTab {
        row: KeySpec,
        column: KeySpec,
        sentinel: String,
    },
}

/// A statistics dashboard definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSpec {
    /// Unique name used to request the report
    pub name: String,

    /// Human-readable chart title
    #[serde(default)]
    pub title: String,

    /// Source table
    pub table: String,

    /// Pre-filters applied by the store before aggregation
    #[serde(default)]
    pub filters: Vec<Filter>,

    /// Role labels allowed to see the report
    pub roles: Vec<String>,

    #[serde(flatten)]
    pub kind: ReportKind,
}

impl ReportSpec {
    /// Access policy for this report; `None` if a role label is unknown.
    pub fn policy(&self) -> Option<AccessPolicy> {
        AccessPolicy::from_labels(&self.roles)
    }
}

/// A listing screen definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSpec {
    pub name: String,

    #[serde(default)]
    pub title: String,

    pub table: String,

    #[serde(default)]
    pub filters: Vec<Filter>,

    /// Fields matched by the search box
    #[serde(default)]
    pub search_fields: Vec<String>,

    pub roles: Vec<String>,
}

impl ListingSpec {
    pub fn policy(&self) -> Option<AccessPolicy> {
        AccessPolicy::from_labels(&self.roles)
    }
}
