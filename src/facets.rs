//! Cascading make/model facets.
//!
//! Models hang off makes: a model can only be selected while its make is, each
//! selected make reveals its model tab, and dropping a make drops its models. Counts
//! come from the latest [`FacetCatalog`]; an entry the server did not list has no
//! matches under the current filters and is hidden.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::models::{FacetCatalog, FilterState, Id, PageMetadata};

const MARK_PLACEHOLDER: &str = "Mark";
const MODEL_PLACEHOLDER: &str = "Model";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FacetEntry {
    pub id: Id,
    pub visible: bool,
    pub count: Option<u64>,
}

/// Everything the view needs to draw the make and model pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetSnapshot {
    pub mark_label: String,
    pub model_label: String,
    pub mark_full: bool,
    pub model_full: bool,
    pub models_enabled: bool,
    pub shown_tabs: Vec<Id>,
    pub active_tab: Option<Id>,
    pub marks: Vec<FacetEntry>,
    pub models: Vec<FacetEntry>,
}

#[derive(Debug)]
pub struct FacetResolver {
    metadata: Arc<PageMetadata>,
    mark_entries: BTreeMap<Id, FacetEntry>,
    model_entries: BTreeMap<Id, FacetEntry>,
    shown_tabs: BTreeSet<Id>,
    active_tab: Option<Id>,
    models_enabled: bool,
}

impl FacetResolver {
    pub fn new(metadata: Arc<PageMetadata>) -> Self {
        let mut resolver = Self {
            metadata: Arc::new(PageMetadata::default()),
            mark_entries: BTreeMap::new(),
            model_entries: BTreeMap::new(),
            shown_tabs: BTreeSet::new(),
            active_tab: None,
            models_enabled: false,
        };
        resolver.replace_metadata(metadata);
        resolver
    }

    /// Swaps in the make/model tree of another category. Counts start over; tabs of
    /// makes that no longer exist are dropped.
    pub fn replace_metadata(&mut self, metadata: Arc<PageMetadata>) {
        let entry = |id| FacetEntry { id, visible: true, count: None };
        self.mark_entries = metadata.marks.iter().map(|mark| (mark.id, entry(mark.id))).collect();
        self.model_entries = metadata.models.iter().map(|model| (model.id, entry(model.id))).collect();
        self.metadata = metadata;
        let known = &self.mark_entries;
        self.shown_tabs.retain(|id| known.contains_key(id));
        if self.active_tab.is_some_and(|id| !self.shown_tabs.contains(&id)) {
            self.active_tab = self.first_shown_tab();
        }
    }

    /// Rebuilds tabs from an existing selection (page load, back/forward navigation).
    ///
    /// Drops model ids whose make is not selected so the state honours the cascade.
    pub fn sync_from_state(&mut self, state: &mut FilterState) {
        let metadata = Arc::clone(&self.metadata);
        let marks = state.marks_ids.clone();
        state.models_ids.retain(|model_id| {
            metadata
                .model(*model_id)
                .is_some_and(|model| marks.contains(&model.mark_id))
        });
        self.shown_tabs = state.marks_ids.iter().copied().collect();
        self.active_tab = self.first_shown_tab();
        self.models_enabled = !state.marks_ids.is_empty();
    }

    /// Returns whether the selection changed.
    pub fn on_mark_toggled(&mut self, state: &mut FilterState, mark_id: Id, checked: bool) -> bool {
        if checked {
            if self.metadata.mark(mark_id).is_none() {
                tracing::warn!(mark_id, "Ignoring unknown mark");
                return false;
            }
            let first = state.marks_ids.is_empty();
            if !state.marks_ids.insert(mark_id) {
                return false;
            }
            self.shown_tabs.insert(mark_id);
            if first || self.active_tab.is_none() {
                self.active_tab = Some(mark_id);
            }
            self.models_enabled = true;
            return true;
        }

        if !state.marks_ids.remove(&mark_id) {
            return false;
        }
        let orphaned: Vec<Id> = self.metadata.models_of(mark_id).map(|model| model.id).collect();
        state.models_ids.retain(|model_id| !orphaned.contains(model_id));
        self.shown_tabs.remove(&mark_id);
        if self.active_tab == Some(mark_id) {
            self.active_tab = self.first_shown_tab();
        }
        if state.marks_ids.is_empty() {
            state.models_ids.clear();
            self.models_enabled = false;
            self.active_tab = None;
        }
        true
    }

    /// Returns whether the selection changed. Models of unselected makes are refused.
    pub fn on_model_toggled(&mut self, state: &mut FilterState, model_id: Id, checked: bool) -> bool {
        if !checked {
            return state.models_ids.remove(&model_id);
        }
        let Some(model) = self.metadata.model(model_id) else {
            tracing::warn!(model_id, "Ignoring unknown model");
            return false;
        };
        if !self.models_enabled || !state.marks_ids.contains(&model.mark_id) {
            tracing::debug!(model_id, mark_id = model.mark_id, "Model picked without its mark selected");
            return false;
        }
        state.models_ids.insert(model_id)
    }

    /// "All" on the make facet: every make selected, every model tab revealed.
    pub fn select_all_marks(&mut self, state: &mut FilterState) -> bool {
        let before = state.marks_ids.len();
        state.marks_ids.extend(self.metadata.marks.iter().map(|mark| mark.id));
        self.shown_tabs = state.marks_ids.iter().copied().collect();
        if self.active_tab.is_none() {
            self.active_tab = self.metadata.marks.first().map(|mark| mark.id);
        }
        self.models_enabled = !state.marks_ids.is_empty();
        state.marks_ids.len() != before
    }

    /// Quick-pick link under the filter: exactly this make, and this model when given.
    /// Refuses unknown makes and models of another make without touching the selection.
    pub fn pick_exclusive(&mut self, state: &mut FilterState, mark_id: Id, model_id: Option<Id>) -> bool {
        if self.metadata.mark(mark_id).is_none() {
            tracing::warn!(mark_id, "Ignoring quick pick of an unknown mark");
            return false;
        }
        if let Some(model_id) = model_id {
            if !self.metadata.model(model_id).is_some_and(|model| model.mark_id == mark_id) {
                tracing::warn!(mark_id, model_id, "Ignoring quick pick of a model outside its mark");
                return false;
            }
        }

        let before = (state.marks_ids.clone(), state.models_ids.clone());
        self.reset(state);
        self.on_mark_toggled(state, mark_id, true);
        if let Some(model_id) = model_id {
            self.on_model_toggled(state, model_id, true);
        }
        (state.marks_ids.clone(), state.models_ids.clone()) != before
    }

    pub fn set_active_tab(&mut self, mark_id: Id) -> bool {
        if !self.shown_tabs.contains(&mark_id) {
            return false;
        }
        self.active_tab = Some(mark_id);
        true
    }

    pub fn on_category_changed(&mut self, state: &mut FilterState, category: Option<String>) {
        state.category = category.filter(|c| !c.is_empty());
        self.reset(state);
    }

    /// Clears make and model selection and disables the model picker.
    pub fn reset(&mut self, state: &mut FilterState) {
        state.marks_ids.clear();
        state.models_ids.clear();
        self.shown_tabs.clear();
        self.active_tab = None;
        self.models_enabled = false;
    }

    pub fn apply_facet_catalog(&mut self, catalog: &FacetCatalog) {
        for (id, entry) in self.mark_entries.iter_mut() {
            let count = catalog.mark_count(*id);
            entry.visible = count.is_some();
            entry.count = Some(count.unwrap_or(0));
        }
        for (id, entry) in self.model_entries.iter_mut() {
            let count = catalog.model_count(*id);
            entry.visible = count.is_some();
            entry.count = Some(count.unwrap_or(0));
        }
    }

    pub fn mark_label(&self, state: &FilterState) -> String {
        let titles = self
            .metadata
            .marks
            .iter()
            .filter(|mark| state.marks_ids.contains(&mark.id))
            .map(|mark| mark.title.as_str());
        selection_label(titles, MARK_PLACEHOLDER)
    }

    pub fn model_label(&self, state: &FilterState) -> String {
        let titles = self
            .metadata
            .models
            .iter()
            .filter(|model| state.models_ids.contains(&model.id))
            .map(|model| model.title.as_str());
        selection_label(titles, MODEL_PLACEHOLDER)
    }

    pub fn models_enabled(&self) -> bool {
        self.models_enabled
    }

    pub fn snapshot(&self, state: &FilterState) -> FacetSnapshot {
        FacetSnapshot {
            mark_label: self.mark_label(state),
            model_label: self.model_label(state),
            mark_full: !state.marks_ids.is_empty(),
            model_full: !state.models_ids.is_empty(),
            models_enabled: self.models_enabled,
            shown_tabs: self.shown_tabs.iter().copied().collect(),
            active_tab: self.active_tab,
            marks: self.mark_entries.values().copied().collect(),
            models: self.model_entries.values().copied().collect(),
        }
    }

    fn first_shown_tab(&self) -> Option<Id> {
        self.metadata
            .marks
            .iter()
            .map(|mark| mark.id)
            .find(|id| self.shown_tabs.contains(id))
    }
}

/// `First/Second/Third(3)`, or the placeholder when nothing is selected.
pub fn selection_label<'a>(titles: impl Iterator<Item = &'a str>, placeholder: &str) -> String {
    let mut label = String::new();
    let mut count = 0;
    for title in titles {
        if count > 0 {
            label.push('/');
        }
        label.push_str(title.trim());
        count += 1;
    }
    if count == 0 {
        return placeholder.to_string();
    }
    format!("{}({})", label, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilteredCount;
    use crate::test_support::sample_metadata;
    use pretty_assertions::assert_eq;

    fn resolver() -> FacetResolver {
        FacetResolver::new(Arc::new(sample_metadata()))
    }

    #[test]
    fn first_checked_mark_becomes_the_active_tab() {
        let mut facets = resolver();
        let mut state = FilterState::default();

        assert!(facets.on_mark_toggled(&mut state, 7, true));
        assert!(facets.on_mark_toggled(&mut state, 9, true));

        let snapshot = facets.snapshot(&state);
        assert_eq!(snapshot.active_tab, Some(7));
        assert_eq!(snapshot.shown_tabs, vec![7, 9]);
        assert!(snapshot.models_enabled);
        assert_eq!(snapshot.mark_label, "BMW/Audi(2)");
    }

    #[test]
    fn unchecking_a_mark_drops_its_models() {
        let mut facets = resolver();
        let mut state = FilterState::default();
        facets.on_mark_toggled(&mut state, 7, true);
        facets.on_mark_toggled(&mut state, 9, true);
        facets.on_model_toggled(&mut state, 42, true);
        facets.on_model_toggled(&mut state, 43, true);
        facets.on_model_toggled(&mut state, 90, true);

        facets.on_mark_toggled(&mut state, 7, false);

        assert_eq!(state.models_ids.iter().copied().collect::<Vec<_>>(), vec![90]);
        assert_eq!(facets.snapshot(&state).active_tab, Some(9));
        assert!(facets.models_enabled());
    }

    #[test]
    fn unchecking_the_last_mark_disables_models() {
        let mut facets = resolver();
        let mut state = FilterState::default();
        facets.on_mark_toggled(&mut state, 7, true);
        facets.on_model_toggled(&mut state, 42, true);

        facets.on_mark_toggled(&mut state, 7, false);

        assert!(state.marks_ids.is_empty());
        assert!(state.models_ids.is_empty());
        assert!(!facets.models_enabled());
        assert_eq!(facets.model_label(&state), "Model");
    }

    #[test]
    fn models_need_their_mark() {
        let mut facets = resolver();
        let mut state = FilterState::default();
        facets.on_mark_toggled(&mut state, 9, true);

        assert!(!facets.on_model_toggled(&mut state, 42, true));
        assert!(state.models_ids.is_empty());
    }

    #[test]
    fn select_all_reveals_every_tab() {
        let mut facets = resolver();
        let mut state = FilterState::default();

        assert!(facets.select_all_marks(&mut state));

        let snapshot = facets.snapshot(&state);
        assert_eq!(snapshot.shown_tabs, vec![7, 9]);
        assert_eq!(snapshot.active_tab, Some(7));
        assert!(snapshot.mark_full);
    }

    #[test]
    fn catalog_counts_hide_missing_entries() {
        let mut facets = resolver();
        let state = FilterState::default();
        let catalog = FacetCatalog {
            filtered_marks: vec![FilteredCount { id: 7, filtered_cars_count: 0 }],
            filtered_models: vec![FilteredCount { id: 42, filtered_cars_count: 3 }],
            ..FacetCatalog::default()
        };

        facets.apply_facet_catalog(&catalog);
        let snapshot = facets.snapshot(&state);

        let bmw = snapshot.marks.iter().find(|entry| entry.id == 7).copied();
        let audi = snapshot.marks.iter().find(|entry| entry.id == 9).copied();
        assert_eq!(bmw, Some(FacetEntry { id: 7, visible: true, count: Some(0) }));
        assert_eq!(audi, Some(FacetEntry { id: 9, visible: false, count: Some(0) }));
        let x5 = snapshot.models.iter().find(|entry| entry.id == 42).copied();
        assert_eq!(x5, Some(FacetEntry { id: 42, visible: true, count: Some(3) }));
    }

    #[test]
    fn sync_drops_orphaned_models() {
        let mut facets = resolver();
        let mut state = FilterState::default();
        state.marks_ids.insert(9);
        state.models_ids.extend([42, 90]);

        facets.sync_from_state(&mut state);

        assert_eq!(state.models_ids.iter().copied().collect::<Vec<_>>(), vec![90]);
        assert_eq!(facets.snapshot(&state).active_tab, Some(9));
    }

    #[test]
    fn category_change_clears_makes_and_disables_models() {
        let mut facets = resolver();
        let mut state = FilterState::default();
        facets.on_mark_toggled(&mut state, 7, true);
        facets.on_model_toggled(&mut state, 42, true);

        facets.on_category_changed(&mut state, Some("used".into()));

        assert_eq!(state.category.as_deref(), Some("used"));
        assert!(state.marks_ids.is_empty());
        assert!(state.models_ids.is_empty());
        let snapshot = facets.snapshot(&state);
        assert!(!snapshot.models_enabled);
        assert!(snapshot.shown_tabs.is_empty());
        assert_eq!(snapshot.active_tab, None);

        facets.on_category_changed(&mut state, Some(String::new()));
        assert_eq!(state.category, None);
    }

    #[test]
    fn only_revealed_tabs_can_be_activated() {
        let mut facets = resolver();
        let mut state = FilterState::default();
        facets.on_mark_toggled(&mut state, 7, true);
        facets.on_mark_toggled(&mut state, 9, true);

        assert!(facets.set_active_tab(9));
        assert_eq!(facets.snapshot(&state).active_tab, Some(9));
        assert!(!facets.set_active_tab(12));
        assert_eq!(facets.snapshot(&state).active_tab, Some(9));
    }

    #[test]
    fn quick_pick_replaces_the_whole_selection() {
        let mut facets = resolver();
        let mut state = FilterState::default();
        facets.on_mark_toggled(&mut state, 7, true);
        facets.on_model_toggled(&mut state, 43, true);

        assert!(facets.pick_exclusive(&mut state, 9, Some(90)));
        assert_eq!(state.marks_ids, BTreeSet::from([9]));
        assert_eq!(state.models_ids, BTreeSet::from([90]));
        assert_eq!(facets.snapshot(&state).active_tab, Some(9));

        assert!(!facets.pick_exclusive(&mut state, 9, Some(90)));
        assert!(!facets.pick_exclusive(&mut state, 7, Some(90)));
        assert!(!facets.pick_exclusive(&mut state, 12, None));
        assert_eq!(state.marks_ids, BTreeSet::from([9]));
    }

    #[test]
    fn new_make_list_drops_vanished_tabs() {
        let mut facets = resolver();
        let mut state = FilterState::default();
        facets.on_mark_toggled(&mut state, 7, true);
        facets.on_mark_toggled(&mut state, 9, true);
        let mut metadata = sample_metadata();
        metadata.marks.retain(|mark| mark.id == 9);
        metadata.models.retain(|model| model.mark_id == 9);

        facets.replace_metadata(Arc::new(metadata));

        let snapshot = facets.snapshot(&state);
        assert_eq!(snapshot.shown_tabs, vec![9]);
        assert_eq!(snapshot.active_tab, Some(9));
        assert_eq!(snapshot.marks.iter().map(|entry| entry.id).collect::<Vec<_>>(), vec![9]);
        assert_eq!(snapshot.models.iter().map(|entry| entry.id).collect::<Vec<_>>(), vec![90]);
    }

    #[test]
    fn label_falls_back_to_placeholder() {
        assert_eq!(selection_label(std::iter::empty(), "Mark"), "Mark");
        assert_eq!(selection_label(["X5"].into_iter(), "Model"), "X5(1)");
    }
}
