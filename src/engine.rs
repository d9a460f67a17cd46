//! Command layer of a filter session.
//!
//! [`FilterEngine`] owns every component for one page view. UI events come in as
//! [`FilterCommand`]s, mutate the canonical state, and either fire a catalog query
//! right away or arm the debounce timer. Everything the view has to change is sent
//! to a [`RenderSink`] as [`RenderInstruction`]s; nothing here touches a DOM.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::catalog_api::RequestOverrides;
use crate::facets::{FacetResolver, FacetSnapshot};
use crate::models::{
    placeholder, year_choices, CapacityOption, CatalogResponse, CategoricalKind, FacetCatalog, FacetFilters,
    FacetOption, FieldId, FilterState, Id, RangeKind, View, YearChoices,
};
use crate::orchestrator::{Completion, Freshness, RefreshOrchestrator, RefreshTicket, Trigger};
use crate::page::{parse_marks_fragment, InitialPage};
use crate::paginator::{EmptyStateChange, PaginationState, RenderMode, ResultsPaginator};
use crate::store::FilterStateStore;
use crate::url_sync::{HistorySink, UrlSynchronizer};
use crate::validation::{ValidationAnnotation, ValidationContext, ValidationEngine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterCommand {
    /// Free text typed into a range input.
    TypeRange { field: FieldId, text: String },
    /// Value picked from a range dropdown (`None` clears it).
    PickRange { field: FieldId, value: Option<String> },
    SelectOption { kind: CategoricalKind, id: Option<Id> },
    ToggleMark { mark_id: Id, checked: bool },
    SelectAllMarks,
    ToggleModel { model_id: Id, checked: bool },
    ShowModelTab { mark_id: Id },
    /// Make (and model) link under the filter: replaces the selection in one step.
    PickFromList { mark_id: Id, model_id: Option<Id> },
    SetCategory { category: Option<String> },
    SetSort { sort: String },
    SetView { view: View },
    SetPerPage { per_page: u32, page: Option<u32> },
    SetRegion { region_id: Id },
    GoToPage { page: u32 },
    LoadMore,
    ResetFilters,
    /// Back/forward navigation to a previously pushed URL.
    Navigate { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Error,
}

/// Non-blocking message shown after a failed refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    fn error(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Error, message: message.into(), raised_at: Utc::now() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderInstruction {
    ReplaceResults { html: String },
    AppendResults { html: String },
    ReplacePagination { html: String },
    ReplaceFilteredModels { html: String, visible: bool },
    ReplaceMarks { html: String },
    TotalCars { total: u64 },
    Title { title: String, meta_title: String },
    Placeholder { field: FieldId, text: String },
    FacetOptions { facet: CategoricalKind, options: Vec<FacetOption>, selected: Option<Id> },
    RangeOptions { years: Vec<i64>, capacities: Vec<CapacityOption> },
    YearOptions { choices: YearChoices },
    Facets { snapshot: FacetSnapshot },
    LoadMore { visible: bool, next_page: Option<u32> },
    EmptyState { visible: bool },
    Validation { annotations: Vec<ValidationAnnotation> },
    Notification { notification: Option<Notification> },
    Loading { active: bool },
}

/// Receives view updates in the order they were produced.
pub trait RenderSink {
    fn render(&mut self, instruction: RenderInstruction);
}

impl RenderSink for Vec<RenderInstruction> {
    fn render(&mut self, instruction: RenderInstruction) {
        self.push(instruction);
    }
}

pub struct FilterEngine<R: RenderSink, H: HistorySink> {
    store: FilterStateStore,
    facets: FacetResolver,
    validation: ValidationEngine,
    paginator: ResultsPaginator,
    urls: UrlSynchronizer,
    refresh: RefreshOrchestrator,
    render: R,
    history: H,
    notification: Option<Notification>,
}

impl<R: RenderSink, H: HistorySink> FilterEngine<R, H> {
    pub fn new(page: InitialPage, debounce: Duration, render: R, history: H) -> Self {
        let metadata = Arc::new(page.metadata);
        let mut facets = FacetResolver::new(Arc::clone(&metadata));
        let mut state = page.state;
        facets.sync_from_state(&mut state);

        let mut engine = Self {
            store: FilterStateStore::new(state, page.samples),
            facets,
            validation: ValidationEngine::new(),
            paginator: ResultsPaginator::new(page.total_cars),
            urls: UrlSynchronizer::new(metadata),
            refresh: RefreshOrchestrator::new(debounce),
            render,
            history,
            notification: None,
        };
        engine
            .validation
            .revalidate_all(&engine.store.get().ranges, engine.store.samples());
        engine.emit_placeholders();
        engine.emit_year_options();
        engine.emit_facets();
        engine.emit_validation();
        engine.emit_load_more();
        if engine.paginator.is_empty() {
            engine.render.render(RenderInstruction::EmptyState { visible: true });
        }
        engine
    }

    /// Applies one UI event. Returns the query to run now, if any.
    pub fn apply(&mut self, command: FilterCommand, now: Instant) -> Option<RefreshTicket> {
        tracing::debug!(?command, "Applying filter command");
        match command {
            FilterCommand::TypeRange { field, text } => {
                if !self.edit_range(field, &text) {
                    return None;
                }
                self.refresh.schedule_refresh(Trigger::Debounced, now);
                None
            }
            FilterCommand::PickRange { field, value } => {
                if !self.edit_range(field, value.as_deref().unwrap_or_default()) {
                    return None;
                }
                self.refresh_immediately(now, RequestOverrides::new())
            }
            FilterCommand::SelectOption { kind, id } => {
                let changed = self.mutate(|state, _, paginator| {
                    let previous = match id {
                        Some(id) => state.categorical.insert(kind, id),
                        None => state.categorical.remove(&kind),
                    };
                    let changed = previous != id;
                    if changed {
                        paginator.reset(state);
                    }
                    changed
                });
                self.refresh_if(changed, now)
            }
            FilterCommand::ToggleMark { mark_id, checked } => {
                let changed = self.mutate(|state, facets, paginator| {
                    let changed = facets.on_mark_toggled(state, mark_id, checked);
                    if changed {
                        paginator.reset(state);
                    }
                    changed
                });
                self.emit_facets();
                self.refresh_if(changed, now)
            }
            FilterCommand::SelectAllMarks => {
                let changed = self.mutate(|state, facets, paginator| {
                    let changed = facets.select_all_marks(state);
                    if changed {
                        paginator.reset(state);
                    }
                    changed
                });
                self.emit_facets();
                self.refresh_if(changed, now)
            }
            FilterCommand::ToggleModel { model_id, checked } => {
                let changed = self.mutate(|state, facets, paginator| {
                    let changed = facets.on_model_toggled(state, model_id, checked);
                    if changed {
                        paginator.reset(state);
                    }
                    changed
                });
                self.emit_facets();
                self.refresh_if(changed, now)
            }
            FilterCommand::ShowModelTab { mark_id } => {
                if self.facets.set_active_tab(mark_id) {
                    self.emit_facets();
                }
                None
            }
            FilterCommand::PickFromList { mark_id, model_id } => {
                let changed = self.mutate(|state, facets, paginator| {
                    let changed = facets.pick_exclusive(state, mark_id, model_id);
                    if changed {
                        paginator.reset(state);
                    }
                    changed
                });
                self.emit_facets();
                self.refresh_if(changed, now)
            }
            FilterCommand::SetCategory { category } => {
                let changed = self.mutate(|state, facets, paginator| {
                    let before = state.clone();
                    facets.on_category_changed(state, category);
                    paginator.reset(state);
                    *state != before
                });
                self.validation.clear();
                self.emit_validation();
                self.emit_facets();
                self.refresh_if(changed, now)
            }
            FilterCommand::SetSort { sort } => {
                let changed = self.mutate(|state, _, paginator| {
                    if state.sort == sort {
                        return false;
                    }
                    state.sort = sort;
                    paginator.reset(state);
                    true
                });
                self.refresh_if(changed, now)
            }
            FilterCommand::SetView { view } => {
                let changed = self.mutate(|state, _, paginator| {
                    if state.view == view {
                        return false;
                    }
                    state.view = view;
                    paginator.reset(state);
                    true
                });
                self.refresh_if(changed, now)
            }
            FilterCommand::SetPerPage { per_page, page } => {
                let changed = self.mutate(|state, _, paginator| {
                    let before = (state.per_page, state.page);
                    paginator.set_per_page(state, per_page, page);
                    (state.per_page, state.page) != before
                });
                self.refresh_if(changed, now)
            }
            FilterCommand::SetRegion { region_id } => {
                if self.store.get().region_id == Some(region_id) {
                    return None;
                }
                self.mutate(|state, facets, paginator| {
                    state.clear_filters();
                    facets.reset(state);
                    state.region_id = Some(region_id);
                    paginator.reset(state);
                    true
                });
                self.validation.clear();
                self.emit_validation();
                self.emit_facets();
                self.refresh_immediately(now, RequestOverrides::new())
            }
            FilterCommand::GoToPage { page } => {
                let changed = self.mutate(|state, _, paginator| {
                    let before = state.page;
                    paginator.go_to(state, page);
                    state.page != before
                });
                self.refresh_if(changed, now)
            }
            FilterCommand::LoadMore => {
                let Some(next_page) = self.paginator.next_page(self.store.get()) else {
                    tracing::debug!("No more results to load");
                    return None;
                };
                let overrides = RequestOverrides::from([("page".to_string(), next_page.to_string())]);
                self.refresh_immediately(now, overrides)
            }
            FilterCommand::ResetFilters => {
                self.store.reset();
                self.mutate(|state, facets, paginator| {
                    facets.reset(state);
                    paginator.reset(state);
                    false
                });
                self.validation.clear();
                self.emit_validation();
                self.emit_facets();
                self.refresh_immediately(now, RequestOverrides::new())
            }
            FilterCommand::Navigate { url } => {
                let mut state = match self.urls.parse(&url) {
                    Ok(state) => state,
                    Err(e) => {
                        tracing::warn!(%url, "Ignoring navigation: {}", e);
                        return None;
                    }
                };
                // The dealer scope belongs to the page, not to whatever URL was navigated to
                state.inherit_scope(self.store.get());
                state.page = self.paginator.clamp_page(state.page, state.per_page);
                self.facets.sync_from_state(&mut state);
                self.paginator.set_mode(RenderMode::Replace);
                self.store.set(state);
                self.validation
                    .revalidate_all(&self.store.get().ranges, self.store.samples());
                self.emit_validation();
                self.emit_facets();
                self.refresh_immediately(now, RequestOverrides::new())
            }
        }
    }

    /// Fires the debounced refresh once its window has elapsed.
    pub fn on_timer(&mut self, now: Instant) -> Option<RefreshTicket> {
        if !self.refresh.poll_due(now) {
            return None;
        }
        self.issue_refresh(RequestOverrides::new())
    }

    pub fn on_completion(&mut self, completion: Completion) {
        let freshness = self.refresh.accept(&completion, self.store.revision());
        self.render.render(RenderInstruction::Loading { active: self.refresh.is_loading() });
        if freshness == Freshness::Stale {
            return;
        }

        match completion.result {
            Ok(response) => self.apply_response(completion.mode, completion.page, response),
            Err(e) => {
                // Results, facets and state stay as they were; the user may retry by editing.
                let notification = Notification::error(format!("Could not update the results: {}", e));
                self.notification = Some(notification.clone());
                self.render.render(RenderInstruction::Notification { notification: Some(notification) });
                self.paginator.set_mode(RenderMode::Replace);
            }
        }
    }

    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.refresh.deadline()
    }

    pub fn state(&self) -> &FilterState {
        self.store.get()
    }

    pub fn location(&self) -> String {
        self.urls.serialize(self.store.get())
    }

    pub fn has_errors(&self) -> bool {
        self.validation.has_errors()
    }

    pub fn annotations(&self) -> Vec<ValidationAnnotation> {
        self.validation.annotations()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.paginator.is_empty()
    }

    pub fn pagination(&self) -> PaginationState {
        self.paginator.state(self.store.get())
    }

    pub fn render_sink(&mut self) -> &mut R {
        &mut self.render
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    fn mutate(
        &mut self,
        mutate: impl FnOnce(&mut FilterState, &mut FacetResolver, &mut ResultsPaginator) -> bool,
    ) -> bool {
        let facets = &mut self.facets;
        let paginator = &mut self.paginator;
        self.store.update(|state| mutate(state, facets, paginator))
    }

    // Returns false when the text is not a number or changes nothing.
    fn edit_range(&mut self, field: FieldId, text: &str) -> bool {
        let value = match field.range.parse_input(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(%field, "Ignoring range input: {}", e);
                return false;
            }
        };
        let changed = self.mutate(|state, _, paginator| {
            let range = state.ranges.get_mut(field.range);
            if range.get(field.bound) == value {
                return false;
            }
            range.set(field.bound, value);
            paginator.reset(state);
            true
        });

        let sample = self.store.samples().get(&field.range).copied().unwrap_or_default();
        self.validation.check(
            field.range,
            self.store.get().ranges.get(field.range),
            &ValidationContext::edited(field.bound, sample),
        );
        self.emit_validation();
        if changed && field.range == RangeKind::Year {
            self.emit_year_options();
        }
        changed
    }

    fn refresh_if(&mut self, changed: bool, now: Instant) -> Option<RefreshTicket> {
        if !changed {
            return None;
        }
        self.refresh_immediately(now, RequestOverrides::new())
    }

    fn refresh_immediately(&mut self, now: Instant, overrides: RequestOverrides) -> Option<RefreshTicket> {
        self.refresh.schedule_refresh(Trigger::Immediate, now);
        self.issue_refresh(overrides)
    }

    fn issue_refresh(&mut self, overrides: RequestOverrides) -> Option<RefreshTicket> {
        let ticket = self.refresh.refresh_now(&self.store, &self.validation, self.paginator.mode(), &overrides);
        if ticket.is_some() {
            self.render.render(RenderInstruction::Loading { active: true });
        } else {
            self.paginator.set_mode(RenderMode::Replace);
        }
        ticket
    }

    fn apply_response(&mut self, mode: RenderMode, page: u32, response: CatalogResponse) {
        let catalog = FacetCatalog::from_response(&response);
        let CatalogResponse {
            html,
            pagination,
            filtered_models_html,
            marks_html,
            total_cars,
            title,
            meta_title,
            ..
        } = response;

        match mode {
            RenderMode::Replace => self.render.render(RenderInstruction::ReplaceResults { html }),
            RenderMode::Append => {
                self.store.update(|state| {
                    let changed = state.page != page;
                    state.page = page;
                    changed
                });
                self.render.render(RenderInstruction::AppendResults { html });
            }
        }
        self.paginator.set_mode(RenderMode::Replace);
        self.render.render(RenderInstruction::ReplacePagination { html: pagination });

        match self.paginator.apply_total(total_cars) {
            EmptyStateChange::Entered => self.render.render(RenderInstruction::EmptyState { visible: true }),
            EmptyStateChange::Cleared => self.render.render(RenderInstruction::EmptyState { visible: false }),
            EmptyStateChange::Unchanged => {}
        }
        self.render.render(RenderInstruction::TotalCars { total: total_cars });
        self.render.render(RenderInstruction::Title { title, meta_title });

        if let Some(marks_html) = marks_html {
            self.replace_make_list(marks_html);
        }
        self.store.replace_facet_catalog(catalog);
        if let Some(catalog) = self.store.facet_catalog() {
            self.facets.apply_facet_catalog(catalog);
            let filters = catalog.filters.clone();
            self.emit_options(&filters);
        }
        self.emit_placeholders();
        self.emit_year_options();
        self.render.render(RenderInstruction::ReplaceFilteredModels {
            html: filtered_models_html,
            visible: total_cars > 0,
        });
        self.emit_facets();
        self.emit_load_more();

        let url = self.urls.push(self.store.get(), &mut self.history);
        tracing::info!(%url, total_cars, "Catalog results applied");

        self.validation
            .revalidate_all(&self.store.get().ranges, self.store.samples());
        self.emit_validation();

        if self.notification.take().is_some() {
            self.render.render(RenderInstruction::Notification { notification: None });
        }
    }

    fn replace_make_list(&mut self, html: String) {
        let metadata = match parse_marks_fragment(&html, self.urls.metadata()) {
            Ok(metadata) => Arc::new(metadata),
            Err(e) => {
                tracing::warn!("Keeping the current make list: {}", e);
                return;
            }
        };
        tracing::debug!(marks = metadata.marks.len(), "Make list replaced");
        self.facets.replace_metadata(Arc::clone(&metadata));
        self.urls.replace_metadata(metadata);
        self.render.render(RenderInstruction::ReplaceMarks { html });
    }

    fn emit_placeholders(&mut self) {
        for field in FieldId::all() {
            let sample = self.store.samples().get(&field.range).copied().unwrap_or_default();
            self.render.render(RenderInstruction::Placeholder { field, text: placeholder(field, &sample) });
        }
    }

    fn emit_options(&mut self, filters: &FacetFilters) {
        for facet in CategoricalKind::ALL {
            self.render.render(RenderInstruction::FacetOptions {
                facet,
                options: filters.options(facet).to_vec(),
                selected: self.store.get().categorical.get(&facet).copied(),
            });
        }
        self.render.render(RenderInstruction::RangeOptions {
            years: filters.years.clone(),
            capacities: filters.capacities.clone(),
        });
    }

    fn emit_year_options(&mut self) {
        let sample = self.store.samples().get(&RangeKind::Year).copied().unwrap_or_default();
        let current_year = i64::from(Utc::now().year());
        let choices = year_choices(&self.store.get().ranges.year, &sample, current_year);
        self.render.render(RenderInstruction::YearOptions { choices });
    }

    fn emit_facets(&mut self) {
        let snapshot = self.facets.snapshot(self.store.get());
        self.render.render(RenderInstruction::Facets { snapshot });
    }

    fn emit_validation(&mut self) {
        self.render.render(RenderInstruction::Validation { annotations: self.validation.annotations() });
    }

    fn emit_load_more(&mut self) {
        let state = self.store.get();
        let visible = self.paginator.has_more(state);
        let next_page = if visible { state.page.checked_add(1) } else { None };
        self.render.render(RenderInstruction::LoadMore { visible, next_page });
    }
}
