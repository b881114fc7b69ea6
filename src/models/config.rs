//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{ListingSpec, ReportKind, ReportOrder, ReportSpec};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listing screen behavior
    #[serde(default)]
    pub listing: ListingConfig,

    /// Data store connection and role table layout
    #[serde(default)]
    pub store: StoreConfig,

    /// User-facing messages shown at the view boundary
    #[serde(default)]
    pub messages: Messages,

    /// Statistics dashboards
    #[serde(default = "defaults::reports")]
    pub reports: Vec<ReportSpec>,

    /// Listing screens
    #[serde(default = "defaults::listings")]
    pub listings: Vec<ListingSpec>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or the defaults when the file does not exist.
    ///
    /// A file that exists but does not parse is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(&path) {
            Err(AppError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!(
                    "Config file {:?} not found. Using defaults.",
                    path.as_ref()
                );
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Find a report by name.
    pub fn report(&self, name: &str) -> Option<&ReportSpec> {
        self.reports.iter().find(|r| r.name == name)
    }

    /// Find a listing by name.
    pub fn listing_spec(&self, name: &str) -> Option<&ListingSpec> {
        self.listings.iter().find(|l| l.name == name)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.listing.page_size == 0 {
            return Err(AppError::validation("listing.page_size must be > 0"));
        }
        if self.store.user_table.trim().is_empty() {
            return Err(AppError::validation("store.user_table is empty"));
        }
        if self.store.role_field.trim().is_empty() {
            return Err(AppError::validation("store.role_field is empty"));
        }

        let mut seen = HashSet::new();
        for report in &self.reports {
            check_view(&report.name, &report.table, &report.roles, &mut seen)?;
            if report.policy().is_none() {
                return Err(AppError::validation(format!(
                    "report '{}' names an unknown role",
                    report.name
                )));
            }
            let sentinel = match &report.kind {
                ReportKind::Frequency { sentinel, order, .. } => {
                    if matches!(order, ReportOrder::Top { limit: 0 }) {
                        return Err(AppError::validation(format!(
                            "report '{}': top limit must be > 0",
                            report.name
                        )));
                    }
                    sentinel
                }
                ReportKind::CrossTab { sentinel, .. } => sentinel,
            };
            if sentinel.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "report '{}': sentinel label is empty",
                    report.name
                )));
            }
        }

        seen.clear();
        for listing in &self.listings {
            check_view(&listing.name, &listing.table, &listing.roles, &mut seen)?;
            if listing.policy().is_none() {
                return Err(AppError::validation(format!(
                    "listing '{}' names an unknown role",
                    listing.name
                )));
            }
        }
        Ok(())
    }
}

fn check_view<'a>(
    name: &'a str,
    table: &str,
    roles: &[String],
    seen: &mut HashSet<&'a str>,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("view with empty name"));
    }
    if !seen.insert(name) {
        return Err(AppError::validation(format!("duplicate view name '{name}'")));
    }
    if table.trim().is_empty() {
        return Err(AppError::validation(format!("view '{name}' has no table")));
    }
    if roles.is_empty() {
        return Err(AppError::validation(format!(
            "view '{name}' allows no roles"
        )));
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listing: ListingConfig::default(),
            store: StoreConfig::default(),
            messages: Messages::default(),
            reports: defaults::reports(),
            listings: defaults::listings(),
        }
    }
}

/// Listing screen settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Items per page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
        }
    }
}

/// Data store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the hosted backend (remote mode)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Public API key sent with every request
    #[serde(default)]
    pub api_key: Option<String>,

    /// Access token of the signed-in user
    #[serde(default)]
    pub access_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Table holding one row per user with its role
    #[serde(default = "defaults::user_table")]
    pub user_table: String,

    /// Column matched against the session identity
    #[serde(default = "defaults::identity_field")]
    pub identity_field: String,

    /// Column holding the role label
    #[serde(default = "defaults::role_field")]
    pub role_field: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            access_token: None,
            timeout_secs: defaults::timeout(),
            user_table: defaults::user_table(),
            identity_field: defaults::identity_field(),
            role_field: defaults::role_field(),
        }
    }
}

/// Message strings shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Messages {
    #[serde(default = "defaults::msg_login_required")]
    pub login_required: String,
    #[serde(default = "defaults::msg_access_denied")]
    pub access_denied: String,
    #[serde(default = "defaults::msg_no_data")]
    pub no_data: String,
    /// `{error}` is replaced with the failure detail
    #[serde(default = "defaults::msg_fetch_failed")]
    pub fetch_failed: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            login_required: defaults::msg_login_required(),
            access_denied: defaults::msg_access_denied(),
            no_data: defaults::msg_no_data(),
            fetch_failed: defaults::msg_fetch_failed(),
        }
    }
}

mod defaults {
    use crate::models::{
        Filter, KeySpec, ListingSpec, ReportKind, ReportOrder, ReportSpec,
    };

    // Listing defaults
    pub fn page_size() -> usize {
        6
    }

    // Store defaults
    pub fn timeout() -> u64 {
        15
    }
    pub fn user_table() -> String {
        "usuarios".into()
    }
    pub fn identity_field() -> String {
        "id".into()
    }
    pub fn role_field() -> String {
        "rol".into()
    }

    fn staff() -> Vec<String> {
        vec!["Administrador".into(), "Editor".into()]
    }

    // Report defaults
    pub fn reports() -> Vec<ReportSpec> {
        vec![
            ReportSpec {
                name: "libros_por_anio".into(),
                title: "Libros por año de publicación".into(),
                table: "libros".into(),
                filters: vec![],
                roles: staff(),
                kind: ReportKind::Frequency {
                    key: KeySpec::value("anioPublicacion"),
                    sentinel: "Sin dato".into(),
                    order: ReportOrder::Natural,
                },
            },
            ReportSpec {
                name: "autores_frecuentes".into(),
                title: "Autores con más libros".into(),
                table: "libros".into(),
                filters: vec![],
                roles: staff(),
                kind: ReportKind::Frequency {
                    key: KeySpec::value("autor"),
                    sentinel: "Sin nombre".into(),
                    order: ReportOrder::Top { limit: 5 },
                },
            },
            ReportSpec {
                name: "usuarios_por_cargo".into(),
                title: "Usuarios por cargo".into(),
                table: "usuarios".into(),
                filters: vec![],
                roles: vec!["Administrador".into()],
                kind: ReportKind::Frequency {
                    key: KeySpec::value("cargo"),
                    sentinel: "Desconocido".into(),
                    order: ReportOrder::CountDesc,
                },
            },
            ReportSpec {
                name: "solicitudes_por_mes".into(),
                title: "Solicitudes por mes y estado".into(),
                table: "solicitudes".into(),
                filters: vec![Filter::not_null("fecha")],
                roles: staff(),
                kind: ReportKind::CrossTab {
                    row: KeySpec::month("fecha"),
                    column: KeySpec::value("estado"),
                    sentinel: "Sin dato".into(),
                },
            },
        ]
    }

    // Listing defaults
    pub fn listings() -> Vec<ListingSpec> {
        let listing = |name: &str, fields: &[&str], roles: Vec<String>| ListingSpec {
            name: name.into(),
            title: String::new(),
            table: name.into(),
            filters: vec![],
            search_fields: fields.iter().map(|f| f.to_string()).collect(),
            roles,
        };

        vec![
            listing(
                "libros",
                &["titulo", "autor", "editorial", "isbn"],
                vec!["Administrador".into(), "Editor".into(), "Lector".into()],
            ),
            listing("autores", &["nombre", "nacionalidad"], staff()),
            listing("lectores", &["nombre", "email"], staff()),
            listing("solicitudes", &["titulo", "estado", "solicitante"], staff()),
        ]
    }

    // Message defaults
    pub fn msg_login_required() -> String {
        "Debes iniciar sesión para continuar".into()
    }
    pub fn msg_access_denied() -> String {
        "Acceso denegado".into()
    }
    pub fn msg_no_data() -> String {
        "No hay datos disponibles".into()
    }
    pub fn msg_fetch_failed() -> String {
        "Error al cargar los datos: {error}".into()
    }
}
