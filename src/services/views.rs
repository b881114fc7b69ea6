// src/services/views.rs

//! Statistics and listing view service.
//!
//! Looks up a configured view by name, runs its fetch behind the role gate
//! and hands back either aggregated report data or a listing ready to page.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{AccessPolicy, Config, Filter, Record};
use crate::pipeline::Listing;
use crate::services::gate::{Gated, RoleGatedLoader};
use crate::services::reports::ReportRun;
use crate::services::view::ViewState;
use crate::storage::DataStore;

/// Entry point of the reporting views.
pub struct ViewService {
    config: Arc<Config>,
    loader: RoleGatedLoader,
    store: Arc<dyn DataStore>,
}

impl ViewService {
    pub fn new(config: Arc<Config>, loader: RoleGatedLoader, store: Arc<dyn DataStore>) -> Self {
        Self {
            config,
            loader,
            store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Names of the configured reports and listings.
    pub fn catalog(&self) -> (Vec<&str>, Vec<&str>) {
        let reports = self.config.reports.iter().map(|r| r.name.as_str()).collect();
        let listings = self.config.listings.iter().map(|l| l.name.as_str()).collect();
        (reports, listings)
    }

    /// Fetch and aggregate the named report.
    pub async fn run_report(&self, name: &str) -> Result<ReportRun> {
        let spec = self
            .config
            .report(name)
            .ok_or_else(|| AppError::config(format!("Unknown report '{name}'")))?;
        let policy = view_policy(name, spec.policy())?;

        let Gated { role, data } = self.gated_query(&policy, &spec.table, &spec.filters).await?;
        log::info!(
            "Report '{}': {} row(s) from '{}'",
            spec.name,
            data.len(),
            spec.table
        );

        Ok(ReportRun::new(spec, role, &data))
    }

    /// Fetch the named listing's snapshot and wrap it in a pager.
    pub async fn open_listing(&self, name: &str) -> Result<Listing> {
        let spec = self
            .config
            .listing_spec(name)
            .ok_or_else(|| AppError::config(format!("Unknown listing '{name}'")))?;
        let policy = view_policy(name, spec.policy())?;

        let Gated { data, .. } = self.gated_query(&policy, &spec.table, &spec.filters).await?;
        log::info!("Listing '{}': {} row(s)", spec.name, data.len());

        Ok(Listing::new(
            data,
            spec.search_fields.clone(),
            self.config.listing.page_size,
        ))
    }

    /// Re-run the named report into `state`.
    ///
    /// A run overtaken by a later refresh of the same state fails with
    /// `StaleGeneration` and leaves the newer result in place.
    pub async fn refresh_report(
        &self,
        name: &str,
        state: &Mutex<ViewState<ReportRun>>,
    ) -> Result<ReportRun> {
        let ticket = state.lock().await.begin();
        let run = self.run_report(name).await?;
        let mut state = state.lock().await;
        state.complete(ticket, run).cloned()
    }

    /// Re-fetch the named listing into `state`, keeping its filter and page.
    pub async fn refresh_listing(
        &self,
        name: &str,
        state: &Mutex<ViewState<Listing>>,
    ) -> Result<()> {
        let ticket = state.lock().await.begin();
        let fresh = self.open_listing(name).await?;
        let mut state = state.lock().await;
        state.complete_with(ticket, |previous| match previous {
            Some(mut listing) => {
                listing.replace_snapshot(fresh.into_snapshot());
                listing
            }
            None => fresh,
        })?;
        Ok(())
    }

    async fn gated_query(
        &self,
        policy: &AccessPolicy,
        table: &str,
        filters: &[Filter],
    ) -> Result<Gated<Vec<Record>>> {
        let store = Arc::clone(&self.store);
        self.loader
            .load(policy, move |_session| async move {
                store.query(table, filters).await
            })
            .await
    }
}

fn view_policy(name: &str, policy: Option<AccessPolicy>) -> Result<AccessPolicy> {
    policy.ok_or_else(|| AppError::config(format!("View '{name}' names an unknown role")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Barrier;

    use crate::models::{AggregationRow, Mutation, MutationOutcome, Role};
    use crate::services::reports::ReportOutput;
    use crate::storage::{LocalStore, StaticSession, TableRoleLookup};
    use tempfile::TempDir;

    async fn seeded_store(tmp: &TempDir) -> Arc<LocalStore> {
        let store = LocalStore::new(tmp.path());
        store
            .write_table(
                "usuarios",
                &[
                    Record::new()
                        .with("id", "admin")
                        .with("rol", "Administrador")
                        .with("cargo", "Director"),
                    Record::new()
                        .with("id", "ed")
                        .with("rol", "Editor")
                        .with("cargo", "Corrector"),
                    Record::new().with("id", "lec").with("rol", "Lector"),
                ],
            )
            .await
            .unwrap();

        let libros: Vec<Record> = (0..23)
            .map(|i| {
                let autor = match i % 4 {
                    0 => "Borges",
                    1 => "Cortázar",
                    2 => "Borges",
                    _ => "Mistral",
                };
                Record::new()
                    .with("id", i)
                    .with("titulo", format!("Libro {i}"))
                    .with("autor", autor)
                    .with("anioPublicacion", 1990 + (i % 3))
            })
            .collect();
        store.write_table("libros", &libros).await.unwrap();
        Arc::new(store)
    }

    fn service(store: Arc<LocalStore>, user: &str) -> ViewService {
        service_over(store, user)
    }

    fn service_over(store: Arc<dyn DataStore>, user: &str) -> ViewService {
        let config = Arc::new(Config::default());
        let roles = TableRoleLookup::from_config(Arc::clone(&store), &config.store);
        let loader = RoleGatedLoader::new(Arc::new(StaticSession::user(user)), Arc::new(roles));
        ViewService::new(config, loader, store)
    }

    /// Holds every `libros` query until two are in flight.
    struct PairedStore {
        inner: Arc<LocalStore>,
        barrier: Barrier,
    }

    #[async_trait]
    impl DataStore for PairedStore {
        async fn query(&self, table: &str, filters: &[Filter]) -> Result<Vec<Record>> {
            if table == "libros" {
                self.barrier.wait().await;
            }
            self.inner.query(table, filters).await
        }

        async fn mutate(&self, table: &str, mutation: Mutation) -> Result<MutationOutcome> {
            self.inner.mutate(table, mutation).await
        }
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_keep_latest() {
        let tmp = TempDir::new().unwrap();
        let store = PairedStore {
            inner: seeded_store(&tmp).await,
            barrier: Barrier::new(2),
        };
        let service = service_over(Arc::new(store), "ed");
        let state = Mutex::new(ViewState::new());

        let (a, b) = tokio::join!(
            service.refresh_report("autores_frecuentes", &state),
            service.refresh_report("autores_frecuentes", &state),
        );

        let stale = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(AppError::StaleGeneration { .. })))
            .count();
        assert_eq!(stale, 1);
        let fresh = a.or(b).unwrap();

        let state = state.lock().await;
        assert_eq!(state.current().map(|r| r.source_rows), Some(fresh.source_rows));
    }

    #[tokio::test]
    async fn test_listing_refresh_keeps_filter() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;
        let service = service(Arc::clone(&store), "lec");
        let state = Mutex::new(ViewState::new());

        service.refresh_listing("libros", &state).await.unwrap();
        state.lock().await.current_mut().unwrap().set_filter("mistral");

        let mut libros = store.query("libros", &[]).await.unwrap();
        libros.push(Record::new().with("id", 99).with("autor", "Mistral"));
        store.write_table("libros", &libros).await.unwrap();

        service.refresh_listing("libros", &state).await.unwrap();
        let state = state.lock().await;
        let listing = state.current().unwrap();
        assert_eq!(listing.filter_term(), "mistral");
        assert_eq!(listing.visible_len(), 6);
        assert_eq!(listing.snapshot_len(), 24);
    }

    #[tokio::test]
    async fn test_editor_runs_top_authors() {
        let tmp = TempDir::new().unwrap();
        let service = service(seeded_store(&tmp).await, "ed");

        let run = service.run_report("autores_frecuentes").await.unwrap();
        assert_eq!(run.role, Role::Editor);
        assert_eq!(run.source_rows, 23);
        assert_eq!(
            run.output,
            ReportOutput::Frequency {
                rows: vec![
                    AggregationRow::new("Borges", 12),
                    AggregationRow::new("Cortázar", 6),
                    AggregationRow::new("Mistral", 5),
                ]
            }
        );
    }

    #[tokio::test]
    async fn test_reader_denied_report() {
        let tmp = TempDir::new().unwrap();
        let service = service(seeded_store(&tmp).await, "lec");

        let result = service.run_report("libros_por_anio").await;
        assert!(matches!(result, Err(AppError::AccessDenied { ref role }) if role == "Lector"));
    }

    #[tokio::test]
    async fn test_admin_only_report() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;

        assert!(service(store.clone(), "ed").run_report("usuarios_por_cargo").await.is_err());

        let run = service(store, "admin")
            .run_report("usuarios_por_cargo")
            .await
            .unwrap();
        assert_eq!(
            run.output,
            ReportOutput::Frequency {
                rows: vec![
                    AggregationRow::new("Director", 1),
                    AggregationRow::new("Corrector", 1),
                    AggregationRow::new("Desconocido", 1),
                ]
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_user_fails_closed() {
        let tmp = TempDir::new().unwrap();
        let service = service(seeded_store(&tmp).await, "nadie");

        let err = service.run_report("libros_por_anio").await.unwrap_err();
        assert!(matches!(err, AppError::RoleResolutionFailed { .. }));
    }

    #[tokio::test]
    async fn test_reader_opens_book_listing() {
        let tmp = TempDir::new().unwrap();
        let service = service(seeded_store(&tmp).await, "lec");

        let mut listing = service.open_listing("libros").await.unwrap();
        let page = listing.go_to(4);
        assert_eq!(page.start_index, 18);
        assert_eq!(page.end_index, 23);
        assert_eq!(page.range_label(), "19–23 de 23");

        listing.set_filter("mistral");
        assert_eq!(listing.current_page().page_number, 1);
        assert_eq!(listing.visible_len(), 5);

        assert!(service.open_listing("autores").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_view_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let service = service(seeded_store(&tmp).await, "admin");

        assert!(matches!(
            service.run_report("inexistente").await,
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            service.open_listing("inexistente").await,
            Err(AppError::Config(_))
        ));
        let (reports, listings) = service.catalog();
        assert_eq!(reports.len(), 4);
        assert!(listings.contains(&"libros"));
    }
}
