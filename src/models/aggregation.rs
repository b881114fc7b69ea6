//! Aggregation results handed to chart rendering.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

/// One bar/slice of a frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRow {
    pub label: String,
    pub count: usize,
}

impl AggregationRow {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// One row of a cross-tabulation; `counts` aligns with `CrossTab::columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTabRow {
    pub label: String,
    pub counts: Vec<usize>,
}

impl CrossTabRow {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Cross-tabulation of row keys against column keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrossTab {
    /// Every column key observed anywhere in the input
    pub columns: Vec<String>,
    pub rows: Vec<CrossTabRow>,
}

impl CrossTab {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count at a row/column intersection; 0 when either key is absent.
    pub fn get(&self, row: &str, column: &str) -> usize {
        let Some(col) = self.columns.iter().position(|c| c == column) else {
            return 0;
        };
        self.rows
            .iter()
            .find(|r| r.label == row)
            .and_then(|r| r.counts.get(col).copied())
            .unwrap_or(0)
    }

    /// Chart-ready rows: `{"label": .., "counts": {"<column>": n, ..}}`.
    ///
    /// Counts are nested so a column key can never shadow the row label.
    pub fn to_chart_rows(&self) -> Vec<JsonValue> {
        self.rows
            .iter()
            .map(|row| {
                let counts: Map<String, JsonValue> = self
                    .columns
                    .iter()
                    .zip(&row.counts)
                    .map(|(column, count)| (column.clone(), JsonValue::from(*count)))
                    .collect();
                json!({ "label": row.label, "counts": counts })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CrossTab {
        CrossTab {
            columns: vec!["Pendiente".into(), "Aprobada".into()],
            rows: vec![
                CrossTabRow {
                    label: "2024-01".into(),
                    counts: vec![2, 0],
                },
                CrossTabRow {
                    label: "2024-02".into(),
                    counts: vec![1, 3],
                },
            ],
        }
    }

    #[test]
    fn test_get_defaults_to_zero() {
        let tab = sample();
        assert_eq!(tab.get("2024-02", "Aprobada"), 3);
        assert_eq!(tab.get("2024-01", "Aprobada"), 0);
        assert_eq!(tab.get("2023-12", "Aprobada"), 0);
        assert_eq!(tab.get("2024-01", "Rechazada"), 0);
    }

    #[test]
    fn test_chart_rows_include_every_column() {
        let rows = sample().to_chart_rows();
        assert_eq!(
            rows[0],
            json!({"label": "2024-01", "counts": {"Pendiente": 2, "Aprobada": 0}})
        );
        assert_eq!(sample().rows[1].total(), 4);
    }

    #[test]
    fn test_column_named_label_keeps_row_label() {
        let tab = CrossTab {
            columns: vec!["label".into(), "counts".into()],
            rows: vec![CrossTabRow {
                label: "2024-01".into(),
                counts: vec![3, 1],
            }],
        };

        assert_eq!(
            tab.to_chart_rows(),
            vec![json!({"label": "2024-01", "counts": {"label": 3, "counts": 1}})]
        );
    }
}
