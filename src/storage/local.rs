//! Local filesystem data store.
//!
//! Every table is one JSON array of objects. Used for development, demos and
//! tests; production deployments talk to the hosted backend through
//! `RestStore`.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── libros.json
//! ├── autores.json
//! ├── solicitudes.json
//! └── usuarios.json       # identity -> role label
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Filter, Mutation, MutationOutcome, Record, matches_all, records_from_json};
use crate::storage::DataStore;

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the file path for a table.
    fn path(&self, table: &str) -> Result<PathBuf> {
        let valid = !table.is_empty()
            && table
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AppError::validation(format!("invalid table name '{table}'")));
        }
        Ok(self.root_dir.join(format!("{table}.json")))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &PathBuf, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &PathBuf) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read a table; a missing file is an empty table.
    async fn read_table(&self, table: &str) -> Result<Vec<Record>> {
        let path = self.path(table)?;
        match self.read_bytes(&path).await? {
            Some(bytes) => {
                let payload: serde_json::Value = serde_json::from_slice(&bytes)?;
                Ok(records_from_json(payload))
            }
            None => {
                log::debug!("No file for table '{}', treating as empty", table);
                Ok(Vec::new())
            }
        }
    }

    /// Replace a table's contents.
    pub async fn write_table(&self, table: &str, records: &[Record]) -> Result<()> {
        let path = self.path(table)?;
        let bytes = serde_json::to_vec_pretty(records)?;
        self.write_bytes(&path, &bytes).await
    }

    async fn apply(&self, table: &str, mutation: Mutation) -> Result<MutationOutcome> {
        mutation.ensure_targeted()?;
        let _guard = self.write_lock.lock().await;
        let mut rows = self.read_table(table).await?;

        let outcome = match mutation {
            Mutation::Insert(record) => {
                rows.push(record.clone());
                MutationOutcome {
                    affected: 1,
                    rows: vec![record],
                }
            }
            Mutation::Update { filters, patch } => {
                let mut changed = Vec::new();
                for row in rows.iter_mut().filter(|r| matches_all(&filters, r)) {
                    row.merge(&patch);
                    changed.push(row.clone());
                }
                MutationOutcome {
                    affected: changed.len(),
                    rows: changed,
                }
            }
            Mutation::Delete { filters } => {
                let (removed, kept): (Vec<_>, Vec<_>) =
                    rows.into_iter().partition(|r| matches_all(&filters, r));
                rows = kept;
                MutationOutcome {
                    affected: removed.len(),
                    rows: removed,
                }
            }
        };

        self.write_table(table, &rows).await?;
        log::info!(
            "Table '{}': {} row(s) affected",
            table,
            outcome.affected
        );
        Ok(outcome)
    }
}

#[async_trait]
impl DataStore for LocalStore {
    async fn query(&self, table: &str, filters: &[Filter]) -> Result<Vec<Record>> {
        let rows = self
            .read_table(table)
            .await
            .map_err(|e| AppError::fetch(table, e))?;
        Ok(rows
            .into_iter()
            .filter(|r| matches_all(filters, r))
            .collect())
    }

    async fn mutate(&self, table: &str, mutation: Mutation) -> Result<MutationOutcome> {
        self.apply(table, mutation)
            .await
            .map_err(|e| match e {
                invalid @ AppError::Validation(_) => invalid,
                other => AppError::fetch(table, other),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use tempfile::TempDir;

    fn book(id: i64, autor: &str) -> Record {
        Record::new().with("id", id).with("autor", autor)
    }

    #[tokio::test]
    async fn test_missing_table_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let rows = store.query("libros", &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_write_and_query_with_filters() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store
            .write_table("libros", &[book(1, "Borges"), book(2, "Cortázar"), book(3, "Borges")])
            .await
            .unwrap();

        let rows = store
            .query("libros", &[Filter::eq("autor", "Borges")])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].text("id").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_get_by_identity() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        store.write_table("libros", &[book(1, "Borges"), book(2, "Allende")]).await.unwrap();

        let found = store
            .get_by("libros", "id", &Value::from(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.text("autor").as_deref(), Some("Allende"));

        let missing = store.get_by("libros", "id", &Value::from(9)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_mutations() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.mutate("libros", Mutation::Insert(book(1, "Borges"))).await.unwrap();
        store.mutate("libros", Mutation::Insert(book(2, "Allende"))).await.unwrap();

        let updated = store
            .mutate(
                "libros",
                Mutation::Update {
                    filters: vec![Filter::eq("id", 2)],
                    patch: Record::new().with("autor", "Isabel Allende"),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.affected, 1);

        let deleted = store
            .mutate(
                "libros",
                Mutation::Delete {
                    filters: vec![Filter::eq("id", 1)],
                },
            )
            .await
            .unwrap();
        assert_eq!(deleted.affected, 1);

        let rows = store.query("libros", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("autor").as_deref(), Some("Isabel Allende"));
    }

    #[tokio::test]
    async fn test_unfiltered_delete_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let result = store
            .mutate("libros", Mutation::Delete { filters: vec![] })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_corrupt_table_is_fetch_failure() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("libros.json"), b"{not json").unwrap();
        let store = LocalStore::new(tmp.path());

        let result = store.query("libros", &[]).await;
        assert!(matches!(result, Err(AppError::FetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_table_name_cannot_escape_root() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        assert!(store.query("../etc/passwd", &[]).await.is_err());
    }
}
