// src/config.rs

//! Configuration loading utilities.
//!
//! Reads the TOML file (defaults only when it is missing), applies
//! environment overrides for the store connection and validates the result.

use std::path::Path;

use crate::error::Result;
use crate::models::Config;

/// Base URL of the hosted backend.
pub const ENV_STORE_URL: &str = "ARCHIVO_STORE_URL";
/// Public API key of the hosted backend.
pub const ENV_API_KEY: &str = "ARCHIVO_API_KEY";
/// Access token of the signed-in user.
pub const ENV_ACCESS_TOKEN: &str = "ARCHIVO_ACCESS_TOKEN";

/// Load, override and validate configuration.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::load_or_default(path)?;
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Overwrite store settings from `lookup` (normally the process environment).
///
/// Empty values are ignored.
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_STORE_URL) {
        log::debug!("Store URL taken from {}", ENV_STORE_URL);
        config.store.base_url = Some(url);
    }
    if let Some(key) = get(ENV_API_KEY) {
        config.store.api_key = Some(key);
    }
    if let Some(token) = get(ENV_ACCESS_TOKEN) {
        config.store.access_token = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_replace_store_settings() {
        let env: HashMap<&str, &str> = [
            (ENV_STORE_URL, "https://demo.example.com"),
            (ENV_API_KEY, "anon"),
            (ENV_ACCESS_TOKEN, "   "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.store.access_token = Some("from-file".into());
        apply_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.store.base_url.as_deref(), Some("https://demo.example.com"));
        assert_eq!(config.store.api_key.as_deref(), Some("anon"));
        assert_eq!(config.store.access_token.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_load_config_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [listing]
            page_size = 10

            [messages]
            access_denied = "Sin permiso"
            "#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.listing.page_size, 10);
        assert_eq!(config.messages.access_denied, "Sin permiso");
        assert_eq!(config.reports.len(), 4);
    }

    #[test]
    fn test_malformed_file_is_not_replaced_by_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[listing]\npage_size = 0\n[[reports]\nname = \"x\"\n",
        )
        .unwrap();

        assert!(matches!(load_config(&path), Err(AppError::Toml(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.listing.page_size, 6);
    }

    #[test]
    fn test_invalid_file_fails_validation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[listing]\npage_size = 0\n").unwrap();

        assert!(load_config(&path).is_err());
    }
}
