// Canonical filter state for one page view

use crate::models::{FacetCatalog, FilterState, SampleTable};

/// Owns the [`FilterState`] of a session plus the server-derived facet data.
///
/// Every user-visible change bumps `revision`; a response built from an older
/// revision no longer describes what the user is looking at.
#[derive(Debug)]
pub struct FilterStateStore {
    state: FilterState,
    revision: u64,
    facets: Option<FacetCatalog>,
    samples: SampleTable,
}

impl FilterStateStore {
    pub fn new(state: FilterState, samples: SampleTable) -> Self {
        Self { state, revision: 0, facets: None, samples }
    }

    pub fn get(&self) -> &FilterState {
        &self.state
    }

    /// Replaces the whole state (e.g. restored from a URL).
    pub fn set(&mut self, state: FilterState) {
        if self.state != state {
            self.state = state;
            self.revision += 1;
        }
    }

    /// Runs `mutate`; it reports whether it changed anything.
    pub fn update(&mut self, mutate: impl FnOnce(&mut FilterState) -> bool) -> bool {
        let changed = mutate(&mut self.state);
        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Clears every user filter, keeping category, view, page size, sort, region and salon.
    pub fn reset(&mut self) {
        let before = self.state.clone();
        self.state.clear_filters();
        if self.state != before {
            self.revision += 1;
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn facet_catalog(&self) -> Option<&FacetCatalog> {
        self.facets.as_ref()
    }

    /// Swaps in the facet data of the latest applied response. Not a user change.
    pub fn replace_facet_catalog(&mut self, catalog: FacetCatalog) {
        self.samples = catalog.sample_table();
        self.facets = Some(catalog);
    }

    pub fn samples(&self) -> &SampleTable {
        &self.samples
    }
}
