// Shared fixtures for unit tests

use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::catalog_api::{CatalogClient, CatalogRequest};
use crate::error::CatalogError;
use crate::models::{
    CatalogResponse, FacetFilters, FacetOption, FilteredCount, MarkInfo, ModelInfo, PageMetadata,
};

/// BMW (7: X5 42, X3 43) and Audi (9: A6 90), categories `new` and `used`.
pub fn sample_metadata() -> PageMetadata {
    let mark = |id, title: &str, slug: &str| MarkInfo { id, title: title.into(), slug: Some(slug.into()) };
    let model = |id, mark_id, title: &str, slug: &str| ModelInfo {
        id,
        mark_id,
        title: title.into(),
        slug: Some(slug.into()),
    };
    PageMetadata {
        marks: vec![mark(7, "BMW", "bmw"), mark(9, "Audi", "audi")],
        models: vec![model(42, 7, "X5", "x5"), model(43, 7, "X3", "x3"), model(90, 9, "A6", "a6")],
        categories: vec!["new".into(), "used".into()],
    }
}

pub fn sample_response(total_cars: u64) -> CatalogResponse {
    CatalogResponse {
        html: format!("<div class=\"car\" data-total=\"{}\"></div>", total_cars),
        pagination: "<nav class=\"pagination\"></nav>".into(),
        filters: FacetFilters {
            min_year: Some(2008),
            max_year: Some(2024),
            min_price_formatted: Some("500 000".into()),
            max_price_formatted: Some("9 000 000".into()),
            years: (2008..=2024).collect(),
            gearbox: vec![FacetOption { id: 1, title: "Automatic".into(), is_active: true }],
            ..FacetFilters::default()
        },
        filtered_marks: vec![FilteredCount { id: 7, filtered_cars_count: total_cars }],
        filtered_models: vec![FilteredCount { id: 42, filtered_cars_count: total_cars }],
        filtered_models_html: "<div class=\"models\"></div>".into(),
        marks_html: None,
        total_cars,
        title: format!("{} cars", total_cars),
        meta_title: "Catalog".into(),
    }
}

/// Catalog double: records every request and answers from a queue, falling back
/// to `sample_response(40)`.
#[derive(Default)]
pub struct RecordingCatalog {
    requests: Mutex<Vec<CatalogRequest>>,
    replies: Mutex<VecDeque<Result<CatalogResponse, CatalogError>>>,
    latency: Option<Duration>,
}

impl RecordingCatalog {
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency: Some(latency), ..Self::default() }
    }

    pub fn push_reply(&self, reply: Result<CatalogResponse, CatalogError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<CatalogRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl CatalogClient for RecordingCatalog {
    fn query_catalog(&self, request: CatalogRequest) -> BoxFuture<'_, Result<CatalogResponse, CatalogError>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request);
            let reply = self.replies.lock().unwrap().pop_front();
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            reply.unwrap_or_else(|| Ok(sample_response(40)))
        })
    }
}
