// Debounce, request fencing and execution of catalog queries

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::catalog_api::{CatalogClient, CatalogRequest, RequestOverrides};
use crate::error::CatalogError;
use crate::models::CatalogResponse;
use crate::paginator::RenderMode;
use crate::store::FilterStateStore;
use crate::validation::ValidationEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Dropdowns, checkboxes, sort, view, pagination.
    Immediate,
    /// Free-text range typing.
    Debounced,
}

/// A query ready to run, stamped with what it was built from.
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    pub seq: u64,
    pub revision: u64,
    pub mode: RenderMode,
    /// Page the request asks for, after overrides.
    pub page: u32,
    pub request: CatalogRequest,
}

#[derive(Debug)]
pub struct Completion {
    pub seq: u64,
    pub revision: u64,
    pub mode: RenderMode,
    pub page: u32,
    pub result: Result<CatalogResponse, CatalogError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Current,
    Stale,
}

#[derive(Debug)]
pub struct RefreshOrchestrator {
    debounce: Duration,
    deadline: Option<Instant>,
    next_seq: u64,
    in_flight: Option<u64>,
}

impl RefreshOrchestrator {
    pub fn new(debounce: Duration) -> Self {
        Self { debounce, deadline: None, next_seq: 0, in_flight: None }
    }

    /// Debounced triggers (re)start the window; immediate ones drop it, since the
    /// request about to be sent already carries that state.
    pub fn schedule_refresh(&mut self, trigger: Trigger, now: Instant) {
        match trigger {
            Trigger::Debounced => {
                self.deadline = Some(now + self.debounce);
                tracing::debug!(debounce_ms = self.debounce.as_millis() as u64, "Refresh deferred");
            }
            Trigger::Immediate => self.deadline = None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the debounce window has elapsed; the deadline is consumed.
    pub fn poll_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Builds a request from the whole current state unless a validation error blocks it.
    pub fn refresh_now(
        &mut self,
        store: &FilterStateStore,
        validation: &ValidationEngine,
        mode: RenderMode,
        overrides: &RequestOverrides,
    ) -> Option<RefreshTicket> {
        self.deadline = None;
        if validation.has_errors() {
            tracing::debug!("Refresh blocked by validation errors");
            return None;
        }

        let mut request = CatalogRequest::from_state(store.get());
        request.merge(overrides);
        let page = request
            .get("page")
            .and_then(|page| page.parse().ok())
            .unwrap_or(store.get().page);
        self.next_seq += 1;
        self.in_flight = Some(self.next_seq);
        tracing::debug!(seq = self.next_seq, revision = store.revision(), ?mode, page, "Catalog refresh issued");
        Some(RefreshTicket { seq: self.next_seq, revision: store.revision(), mode, page, request })
    }

    /// A response is applied only if it answers the newest request and the state it
    /// was built from is still the current one.
    pub fn accept(&mut self, completion: &Completion, current_revision: u64) -> Freshness {
        if self.in_flight == Some(completion.seq) {
            self.in_flight = None;
        }
        if completion.seq == self.next_seq && completion.revision == current_revision {
            Freshness::Current
        } else {
            tracing::warn!(
                seq = completion.seq,
                latest = self.next_seq,
                revision = completion.revision,
                current_revision,
                "Discarding stale catalog response"
            );
            Freshness::Stale
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// Runs one query. Failures come back inside the completion, never as a panic or `Err`.
pub async fn execute(client: Arc<dyn CatalogClient>, ticket: RefreshTicket) -> Completion {
    let RefreshTicket { seq, revision, mode, page, request } = ticket;
    let result = client.query_catalog(request).await;
    if let Err(e) = &result {
        tracing::error!(seq, "Catalog query failed: {}", e);
    }
    Completion { seq, revision, mode, page, result }
}
