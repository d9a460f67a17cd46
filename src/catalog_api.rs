// Catalog query: request body built from the filter state and the HTTP client posting it

use futures::future::BoxFuture;
use reqwest::Client;
use reqwest::multipart::Form;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CatalogError;
use crate::models::{CatalogResponse, CategoricalKind, FieldId, FilterState};

/// Extra fields merged over the state-derived body (e.g. `page` for load more).
pub type RequestOverrides = BTreeMap<String, String>;

/// Ordered form fields of one catalog query. Always the whole state, never a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogRequest {
    fields: Vec<(String, String)>,
}

impl CatalogRequest {
    pub fn from_state(state: &FilterState) -> Self {
        let mut request = Self::default();
        let join = |ids: &std::collections::BTreeSet<u64>| {
            ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",")
        };

        request.set("category", state.category.clone().unwrap_or_default());
        request.set("view", state.view.as_str());
        request.set("perPage", state.per_page.to_string());
        request.set("sort", state.sort.clone());
        request.set("region_id", state.region_id.map(|id| id.to_string()).unwrap_or_default());
        request.set("marks_ids", join(&state.marks_ids));
        request.set("models_ids", join(&state.models_ids));
        if let Some(salon_id) = state.salon_id() {
            request.set("salon_id", salon_id.to_string());
        }
        if state.page > 1 {
            request.set("page", state.page.to_string());
        }
        for field in FieldId::all() {
            let value = state.ranges.get(field.range).get(field.bound);
            request.set(
                field.form_name(),
                value.map(|v| field.range.format_plain(v)).unwrap_or_default(),
            );
        }
        for kind in CategoricalKind::ALL {
            let value = state.categorical.get(&kind).map(|id| id.to_string());
            request.set(kind.form_key(), value.unwrap_or_default());
        }
        request
    }

    /// Replaces an existing field or appends a new one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Overrides win over state-derived values. Whitespace never reaches the wire.
    pub fn merge(&mut self, overrides: &RequestOverrides) {
        for (key, value) in overrides {
            let value: String = value.chars().filter(|c| !c.is_whitespace()).collect();
            self.set(key.clone(), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn into_multipart(self) -> Form {
        self.fields
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key, value))
    }
}

/// The single upstream RPC: filter state in, result fragments and facet data out.
pub trait CatalogClient: Send + Sync {
    fn query_catalog(&self, request: CatalogRequest) -> BoxFuture<'_, Result<CatalogResponse, CatalogError>>;
}

pub struct HttpCatalogClient {
    http_client: Arc<Client>,
    endpoint: String,
    csrf_token: Option<String>,
    timeout: Duration,
}

impl HttpCatalogClient {
    pub fn new(http_client: Arc<Client>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self { http_client, endpoint: endpoint.into(), csrf_token: None, timeout }
    }

    pub fn with_csrf_token(mut self, token: Option<String>) -> Self {
        self.csrf_token = token;
        self
    }
}

impl CatalogClient for HttpCatalogClient {
    fn query_catalog(&self, request: CatalogRequest) -> BoxFuture<'_, Result<CatalogResponse, CatalogError>> {
        Box::pin(async move {
            tracing::debug!(endpoint = %self.endpoint, ?request, "Posting catalog query");
            let mut builder = self
                .http_client
                .post(&self.endpoint)
                .timeout(self.timeout)
                .header("X-Requested-With", "XMLHttpRequest")
                .multipart(request.into_multipart());
            if let Some(token) = &self.csrf_token {
                builder = builder.header("X-CSRF-TOKEN", token);
            }

            let response = builder.send().await?;
            let status = response.status();
            if !status.is_success() {
                tracing::warn!(status = %status, "Catalog endpoint returned an error status");
                return Err(CatalogError::Status(status.as_u16()));
            }
            let body = response.json::<CatalogResponse>().await?;
            tracing::debug!(total_cars = body.total_cars, "Catalog query answered");
            Ok(body)
        })
    }
}
