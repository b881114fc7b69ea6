//! Hosted backend REST adapter.
//!
//! Tables are served under `{base}/rest/v1/{table}` with filters encoded as
//! `field=op.value` query parameters; the signed-in user is resolved from
//! `{base}/auth/v1/user`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    Filter, Mutation, MutationOutcome, Record, Session, StoreConfig, UserIdentity, Value,
    records_from_json,
};
use crate::storage::{DataStore, SessionProvider};

/// REST data store and session provider.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: Url,
    api_key: String,
    access_token: Option<String>,
}

impl RestStore {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        // Keep the base path when joining relative endpoints.
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            access_token,
        })
    }

    /// Build from the `[store]` configuration section.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::config("store.base_url is required for remote mode"))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::config("store.api_key is required for remote mode"))?;

        Self::new(
            base_url,
            api_key,
            config.access_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// URL of a table endpoint with filters applied.
    fn table_url(&self, table: &str, filters: &[Filter]) -> Result<Url> {
        let mut url = self.base_url.join("rest/v1/")?.join(table)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            for filter in filters {
                let (field, expr) = filter_param(filter);
                pairs.append_pair(&field, &expr);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    /// Send a request and parse its JSON body; failures carry `context`.
    async fn send_json(&self, context: &str, builder: RequestBuilder) -> Result<serde_json::Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::fetch(context, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch(context, e))?;

        if !status.is_success() {
            return Err(AppError::fetch(context, format!("{status}: {body}")));
        }
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Array(Vec::new()));
        }
        serde_json::from_str(&body).map_err(|e| AppError::fetch(context, e))
    }
}

/// Encode a filter as a `field=op.value` query pair.
fn filter_param(filter: &Filter) -> (String, String) {
    let expr = match filter {
        Filter::Eq { value, .. } => match value.as_label() {
            Some(label) => format!("eq.{label}"),
            None => "is.null".to_string(),
        },
        Filter::Neq { value, .. } => match value.as_label() {
            Some(label) => format!("neq.{label}"),
            None => "not.is.null".to_string(),
        },
        Filter::NotNull { .. } => "not.is.null".to_string(),
        Filter::IsNull { .. } => "is.null".to_string(),
    };
    (filter.field().to_string(), expr)
}

#[async_trait]
impl DataStore for RestStore {
    async fn query(&self, table: &str, filters: &[Filter]) -> Result<Vec<Record>> {
        let url = self
            .table_url(table, filters)
            .map_err(|e| AppError::fetch(table, e))?;
        log::debug!("GET {}", url);

        let payload = self.send_json(table, self.request(Method::GET, url)).await?;
        Ok(records_from_json(payload))
    }

    async fn mutate(&self, table: &str, mutation: Mutation) -> Result<MutationOutcome> {
        mutation.ensure_targeted()?;
        let builder = match &mutation {
            Mutation::Insert(record) => {
                let url = self.table_url(table, &[])?;
                self.request(Method::POST, url).json(&[record])
            }
            Mutation::Update { filters, patch } => {
                let url = self.table_url(table, filters)?;
                self.request(Method::PATCH, url).json(patch)
            }
            Mutation::Delete { filters } => {
                let url = self.table_url(table, filters)?;
                self.request(Method::DELETE, url)
            }
        };

        let payload = self
            .send_json(table, builder.header("Prefer", "return=representation"))
            .await?;
        let rows = records_from_json(payload);
        log::info!("Table '{}': {} row(s) affected", table, rows.len());

        Ok(MutationOutcome {
            affected: rows.len(),
            rows,
        })
    }
}

#[async_trait]
impl SessionProvider for RestStore {
    async fn current_session(&self) -> Result<Option<Session>> {
        let Some(token) = self.access_token.clone() else {
            return Ok(None);
        };

        let url = self.base_url.join("auth/v1/user")?;
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(|e| AppError::fetch("auth", e))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                log::info!("Access token rejected; no session");
                return Ok(None);
            }
            status if !status.is_success() => {
                return Err(AppError::fetch("auth", format!("status {status}")));
            }
            _ => {}
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::fetch("auth", e))?;

        let Some(id) = body.get("id").and_then(|v| v.as_str()) else {
            return Ok(None);
        };
        let user = UserIdentity {
            id: id.to_string(),
            email: body.get("email").and_then(|v| v.as_str()).map(String::from),
        };

        Ok(Some(Session {
            user,
            access_token: Some(token),
            expires_at: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base: &str) -> RestStore {
        RestStore::new(base, "anon-key", None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_table_url_with_filters() {
        let store = store("https://demo.example.com");
        let url = store
            .table_url(
                "libros",
                &[
                    Filter::eq("anioPublicacion", 2019),
                    Filter::not_null("autor"),
                    Filter::neq("estado", "Baja"),
                ],
            )
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://demo.example.com/rest/v1/libros?select=*&anioPublicacion=eq.2019&autor=not.is.null&estado=neq.Baja"
        );
    }

    #[test]
    fn test_base_path_is_kept() {
        let store = store("https://gateway.example.com/archivo");
        let url = store.table_url("autores", &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gateway.example.com/archivo/rest/v1/autores?select=*"
        );
    }

    #[test]
    fn test_null_equality_filters() {
        assert_eq!(
            filter_param(&Filter::eq("cargo", Value::Null)),
            ("cargo".to_string(), "is.null".to_string())
        );
        assert_eq!(
            filter_param(&Filter::neq("cargo", Value::Null)),
            ("cargo".to_string(), "not.is.null".to_string())
        );
    }

    #[test]
    fn test_from_config_requires_base_url() {
        let config = StoreConfig::default();
        assert!(matches!(
            RestStore::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_unfiltered_delete_rejected_before_request() {
        // Nothing listens here; a sent request would fail as FetchFailed.
        let store = store("http://127.0.0.1:9");

        let result = store
            .mutate("libros", Mutation::Delete { filters: vec![] })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = store
            .mutate(
                "libros",
                Mutation::Update {
                    filters: vec![],
                    patch: Record::new().with("estado", "Baja"),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_no_token_means_no_session() {
        let store = store("https://demo.example.com");
        assert!(store.current_session().await.unwrap().is_none());
    }
}
