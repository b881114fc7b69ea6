//! Statistics report computation.

use serde::Serialize;

use crate::models::{AggregationRow, CrossTab, Record, ReportKind, ReportSpec, Role};
use crate::pipeline::{GroupKey, cross_tab, group_by_field, order_rows, sort_cross_tab_rows};

/// Aggregated data of one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportOutput {
    Frequency { rows: Vec<AggregationRow> },
    CrossTab(CrossTab),
}

impl ReportOutput {
    pub fn is_empty(&self) -> bool {
        match self {
            ReportOutput::Frequency { rows } => rows.is_empty(),
            ReportOutput::CrossTab(tab) => tab.is_empty(),
        }
    }

    /// Chart-ready rows for the rendering layer.
    pub fn chart_rows(&self) -> Vec<serde_json::Value> {
        match self {
            ReportOutput::Frequency { rows } => rows
                .iter()
                .map(|r| serde_json::json!({ "label": r.label, "count": r.count }))
                .collect(),
            ReportOutput::CrossTab(tab) => tab.to_chart_rows(),
        }
    }
}

/// A computed report with its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRun {
    pub name: String,
    pub title: String,
    /// Role that requested the report
    pub role: Role,
    /// Records fetched before aggregation
    pub source_rows: usize,
    pub output: ReportOutput,
}

/// Aggregate fetched records as described by `kind`.
pub fn aggregate_report(kind: &ReportKind, records: &[Record]) -> ReportOutput {
    match kind {
        ReportKind::Frequency {
            key,
            sentinel,
            order,
        } => {
            let key = GroupKey::from_spec(key, sentinel.as_str());
            let rows = order_rows(group_by_field(records, &key), *order, sentinel);
            ReportOutput::Frequency { rows }
        }
        ReportKind::CrossTab {
            row,
            column,
            sentinel,
        } => {
            let row_key = GroupKey::from_spec(row, sentinel.as_str());
            let col_key = GroupKey::from_spec(column, sentinel.as_str());
            let mut tab = cross_tab(records, &row_key, &col_key);
            sort_cross_tab_rows(&mut tab, sentinel);
            ReportOutput::CrossTab(tab)
        }
    }
}

impl ReportRun {
    pub fn new(spec: &ReportSpec, role: Role, records: &[Record]) -> Self {
        Self {
            name: spec.name.clone(),
            title: spec.title.clone(),
            role,
            source_rows: records.len(),
            output: aggregate_report(&spec.kind, records),
        }
    }
}
