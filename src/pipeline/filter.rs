//! Client-side search box filtering.

use unicode_segmentation::UnicodeSegmentation;

use crate::models::Record;

/// Case-insensitive multi-word search over selected record fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    term: String,
    tokens: Vec<String>,
    fields: Vec<String>,
}

impl SearchFilter {
    pub fn new(term: impl Into<String>, fields: Vec<String>) -> Self {
        let term = term.into();
        let tokens = term
            .to_lowercase()
            .unicode_words()
            .map(String::from)
            .collect();
        Self {
            term,
            tokens,
            fields,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// A filter without words matches everything.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Every search word must occur in at least one of the fields.
    pub fn matches(&self, record: &Record) -> bool {
        if self.is_empty() {
            return true;
        }

        let haystacks: Vec<String> = self
            .fields
            .iter()
            .filter_map(|f| record.text(f))
            .map(|text| text.to_lowercase())
            .collect();

        self.tokens
            .iter()
            .all(|token| haystacks.iter().any(|h| h.contains(token.as_str())))
    }

    /// Matching records, in original order.
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}
