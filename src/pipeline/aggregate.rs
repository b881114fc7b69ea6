//! Frequency tables and cross-tabulations for charts.
//!
//! All functions here are total: empty input gives empty output and a
//! missing, null or blank key is counted under the key's sentinel label
//! instead of being dropped.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{AggregationRow, CrossTab, CrossTabRow, KeySpec, Record, ReportOrder};

/// Derives a grouping label from a record.
pub struct GroupKey<'a, R> {
    derive: Box<dyn Fn(&R) -> Option<String> + 'a>,
    sentinel: String,
}

impl<'a, R> GroupKey<'a, R> {
    /// Key from an arbitrary derivation function.
    pub fn new(derive: impl Fn(&R) -> Option<String> + 'a, sentinel: impl Into<String>) -> Self {
        Self {
            derive: Box::new(derive),
            sentinel: sentinel.into(),
        }
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Label for a record, with sentinel substitution.
    pub fn label(&self, record: &R) -> String {
        match (self.derive)(record) {
            Some(label) if !label.trim().is_empty() => label,
            _ => self.sentinel.clone(),
        }
    }
}

impl GroupKey<'static, Record> {
    /// Key reading a single record field.
    pub fn field(name: impl Into<String>, sentinel: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |record: &Record| record.text(&name), sentinel)
    }

    /// Key described by configuration.
    pub fn from_spec(spec: &KeySpec, sentinel: impl Into<String>) -> Self {
        let spec = spec.clone();
        Self::new(move |record: &Record| spec.label(record), sentinel)
    }
}

/// Count records per label, in first-encounter order.
pub fn group_by_field<R>(records: &[R], key: &GroupKey<'_, R>) -> Vec<AggregationRow> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<AggregationRow> = Vec::new();

    for record in records {
        let label = key.label(record);
        match index.get(&label) {
            Some(&i) => rows[i].count += 1,
            None => {
                index.insert(label.clone(), rows.len());
                rows.push(AggregationRow::new(label, 1));
            }
        }
    }

    rows
}

/// Sort by count descending. The sort is stable, so ties keep encounter order.
pub fn sort_by_count_desc(rows: &mut [AggregationRow]) {
    rows.sort_by(|a, b| b.count.cmp(&a.count));
}

/// The `n` most frequent labels.
pub fn top_n(mut rows: Vec<AggregationRow>, n: usize) -> Vec<AggregationRow> {
    sort_by_count_desc(&mut rows);
    rows.truncate(n);
    rows
}

/// Natural key order: numeric labels by value, then text, then the sentinel.
fn natural_cmp(a: &str, b: &str, sentinel: &str) -> Ordering {
    let rank = |label: &str| -> (u8, Option<f64>) {
        if label == sentinel {
            return (2, None);
        }
        match label.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => (0, Some(n)),
            _ => (1, None),
        }
    };

    let (class_a, num_a) = rank(a);
    let (class_b, num_b) = rank(b);
    class_a.cmp(&class_b).then_with(|| match (num_a, num_b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    })
}

/// Sort frequency rows by natural key order.
pub fn sort_by_natural_key(rows: &mut [AggregationRow], sentinel: &str) {
    rows.sort_by(|a, b| natural_cmp(&a.label, &b.label, sentinel));
}

/// Sort cross-tab rows by natural key order (`2024-01` before `2024-02`).
///
/// Columns keep encounter order.
pub fn sort_cross_tab_rows(tab: &mut CrossTab, sentinel: &str) {
    tab.rows
        .sort_by(|a, b| natural_cmp(&a.label, &b.label, sentinel));
}

/// Apply a configured report ordering.
pub fn order_rows(
    mut rows: Vec<AggregationRow>,
    order: ReportOrder,
    sentinel: &str,
) -> Vec<AggregationRow> {
    match order {
        ReportOrder::CountDesc => sort_by_count_desc(&mut rows),
        ReportOrder::Natural => sort_by_natural_key(&mut rows, sentinel),
        ReportOrder::Encounter => {}
        ReportOrder::Top { limit } => return top_n(rows, limit),
    }
    rows
}

/// Cross-tabulate row keys against column keys.
///
/// The column set is the union over the whole input, so every row carries a
/// count for every column (0 where nothing intersects).
pub fn cross_tab<R>(
    records: &[R],
    row_key: &GroupKey<'_, R>,
    col_key: &GroupKey<'_, R>,
) -> CrossTab {
    let mut columns: Vec<String> = Vec::new();
    let mut col_index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<CrossTabRow> = Vec::new();
    let mut row_index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let col_label = col_key.label(record);
        let ci = *col_index.entry(col_label.clone()).or_insert_with(|| {
            columns.push(col_label);
            columns.len() - 1
        });

        let row_label = row_key.label(record);
        let ri = *row_index.entry(row_label.clone()).or_insert_with(|| {
            rows.push(CrossTabRow {
                label: row_label,
                counts: Vec::new(),
            });
            rows.len() - 1
        });

        let counts = &mut rows[ri].counts;
        if counts.len() <= ci {
            counts.resize(ci + 1, 0);
        }
        counts[ci] += 1;
    }

    for row in &mut rows {
        row.counts.resize(columns.len(), 0);
    }

    CrossTab { columns, rows }
}
