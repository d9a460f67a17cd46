// Two-way mapping between FilterState and the shareable catalog URL

use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::catalog_api::CatalogRequest;
use crate::error::UrlError;
use crate::models::{
    CategoricalKind, DEFAULT_PER_PAGE, FieldId, FilterState, Id, PageMetadata, View, MAX_PAGE,
};

const CATALOG_ROOT: &str = "/catalog";
// Only used to resolve relative locations; never leaves this module
const LOCAL_BASE: &str = "http://localhost";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("history API unavailable")]
pub struct HistoryUnavailable;

/// Non-reloading history replacement, i.e. the browser address bar.
pub trait HistorySink {
    fn replace_url(&mut self, url: &str) -> Result<(), HistoryUnavailable>;
}

/// Make/model selection split between path segments and query ids.
struct SelectionPlacement<'a> {
    mark_slug: Option<&'a str>,
    model_slug: Option<&'a str>,
    marks_ids: BTreeSet<Id>,
    models_ids: BTreeSet<Id>,
}

pub struct UrlSynchronizer {
    metadata: Arc<PageMetadata>,
}

impl UrlSynchronizer {
    pub fn new(metadata: Arc<PageMetadata>) -> Self {
        Self { metadata }
    }

    pub fn metadata(&self) -> &PageMetadata {
        &self.metadata
    }

    /// Slugs change with the make list of a new category.
    pub fn replace_metadata(&mut self, metadata: Arc<PageMetadata>) {
        self.metadata = metadata;
    }

    pub fn serialize(&self, state: &FilterState) -> String {
        let placement = self.place_selection(state);

        let mut path = String::from(CATALOG_ROOT);
        for segment in [state.category.as_deref(), placement.mark_slug, placement.model_slug]
            .into_iter()
            .flatten()
        {
            path.push('/');
            path.push_str(segment);
        }

        let mut query: Vec<String> = Vec::new();
        for (key, ids) in [("marks_ids", &placement.marks_ids), ("models_ids", &placement.models_ids)] {
            if !ids.is_empty() {
                let joined = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
                query.push(format!("{}={}", key, joined));
            }
        }

        let request = CatalogRequest::from_state(state);
        for (key, value) in request.fields() {
            if is_omitted(key, value) {
                continue;
            }
            query.push(format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)));
        }

        let url = if query.is_empty() { path } else { format!("{}?{}", path, query.join("&")) };
        url.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn place_selection<'a>(&'a self, state: &FilterState) -> SelectionPlacement<'a> {
        let mut placement = SelectionPlacement {
            mark_slug: None,
            model_slug: None,
            marks_ids: state.marks_ids.clone(),
            models_ids: state.models_ids.clone(),
        };

        let single_mark = match (state.marks_ids.len(), state.models_ids.len()) {
            (1, 0 | 1) => state.marks_ids.first().copied(),
            _ => None,
        };
        let Some(mark_id) = single_mark else {
            return placement;
        };
        let Some(mark_slug) = self.metadata.mark_slug(mark_id) else {
            return placement;
        };
        placement.mark_slug = Some(mark_slug);
        placement.marks_ids.clear();

        if let Some(model_id) = state.models_ids.first().copied() {
            let model_slug = self
                .metadata
                .model(model_id)
                .filter(|model| model.mark_id == mark_id)
                .and_then(|model| model.slug.as_deref());
            if let Some(model_slug) = model_slug {
                placement.model_slug = Some(model_slug);
                placement.models_ids.clear();
            }
        }
        placement
    }

    /// Restores a FilterState from a catalog location (absolute or path-relative).
    ///
    /// The dealer scope is read from `salon_id`; the page then owns it.
    pub fn parse(&self, location: &str) -> Result<FilterState, UrlError> {
        let url = match Url::parse(location) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(LOCAL_BASE)
                .and_then(|base| base.join(location))
                .map_err(|_| UrlError::Invalid(location.to_string()))?,
            Err(_) => return Err(UrlError::Invalid(location.to_string())),
        };

        let mut segments = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter();
        if segments.next() != Some(CATALOG_ROOT.trim_start_matches('/')) {
            return Err(UrlError::NotCatalog(location.to_string()));
        }

        let mut salon_id = None;
        for (key, value) in url.query_pairs() {
            if key == "salon_id" {
                salon_id = Some(parse_id(&value, location)?);
            }
        }
        let mut state = FilterState::for_salon(salon_id);

        let mut pending = segments.peekable();
        if let Some(first) = pending.peek().copied() {
            if self.metadata.is_category(first) || self.metadata.mark_by_slug(first).is_none() {
                state.category = Some(first.to_string());
                pending.next();
            }
        }
        if let Some(mark_slug) = pending.next() {
            let mark = self
                .metadata
                .mark_by_slug(mark_slug)
                .ok_or_else(|| UrlError::Invalid(location.to_string()))?;
            state.marks_ids.insert(mark.id);
            if let Some(model_slug) = pending.next() {
                let model = self
                    .metadata
                    .model_by_slug(mark.id, model_slug)
                    .ok_or_else(|| UrlError::UnknownModel(model_slug.to_string()))?;
                state.models_ids.insert(model.id);
            }
        }
        if pending.next().is_some() {
            return Err(UrlError::Invalid(location.to_string()));
        }

        for (key, value) in url.query_pairs() {
            apply_query_pair(&mut state, &key, &value, location)?;
        }
        Ok(state)
    }

    /// Serializes `state` and replaces the current history entry with it.
    pub fn push(&self, state: &FilterState, history: &mut impl HistorySink) -> String {
        let url = self.serialize(state);
        match history.replace_url(&url) {
            Ok(()) => tracing::debug!(%url, "History entry replaced"),
            Err(e) => tracing::warn!(%url, "Skipping URL update: {}", e),
        }
        url
    }
}

fn is_omitted(key: &str, value: &str) -> bool {
    match key {
        "category" | "marks_ids" | "models_ids" => true,
        "view" => value == View::List.as_str(),
        "perPage" => value == DEFAULT_PER_PAGE.to_string(),
        "page" => value == "1",
        _ => value.is_empty(),
    }
}

fn parse_id(value: &str, location: &str) -> Result<Id, UrlError> {
    value.trim().parse().map_err(|_| UrlError::Invalid(location.to_string()))
}

fn parse_ids(value: &str, location: &str) -> Result<BTreeSet<Id>, UrlError> {
    value
        .split(',')
        .filter(|id| !id.trim().is_empty())
        .map(|id| parse_id(id, location))
        .collect()
}

// Unknown keys are ignored.
fn apply_query_pair(state: &mut FilterState, key: &str, value: &str, location: &str) -> Result<(), UrlError> {
    let invalid = || UrlError::Invalid(location.to_string());
    match key {
        "marks_ids" => state.marks_ids.extend(parse_ids(value, location)?),
        "models_ids" => state.models_ids.extend(parse_ids(value, location)?),
        "view" => state.view = View::parse(value).ok_or_else(invalid)?,
        "perPage" => state.per_page = value.parse::<u32>().map_err(|_| invalid())?.max(1),
        "page" => state.page = value.parse::<u32>().map_err(|_| invalid())?.clamp(1, MAX_PAGE),
        "sort" => state.sort = value.to_string(),
        "region_id" => state.region_id = Some(parse_id(value, location)?),
        _ => {
            if let Some(field) = FieldId::from_form_name(key) {
                let parsed = field.range.parse_input(value).map_err(|_| invalid())?;
                state.ranges.get_mut(field.range).set(field.bound, parsed);
            } else if let Some(kind) = CategoricalKind::from_form_key(key) {
                state.categorical.insert(kind, parse_id(value, location)?);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_metadata;
    use pretty_assertions::assert_eq;

    fn synchronizer() -> UrlSynchronizer {
        UrlSynchronizer::new(Arc::new(sample_metadata()))
    }

    #[derive(Default)]
    struct RecordingHistory {
        entries: Vec<String>,
        available: bool,
    }

    impl HistorySink for RecordingHistory {
        fn replace_url(&mut self, url: &str) -> Result<(), HistoryUnavailable> {
            if !self.available {
                return Err(HistoryUnavailable);
            }
            self.entries.push(url.to_string());
            Ok(())
        }
    }

    #[test]
    fn single_make_and_model_fold_into_the_path() {
        let mut state = FilterState::default();
        state.marks_ids.insert(7);
        state.models_ids.insert(42);

        assert_eq!(synchronizer().serialize(&state), "/catalog/bmw/x5");
    }

    #[test]
    fn single_make_without_model() {
        let mut state = FilterState::default();
        state.category = Some("used".into());
        state.marks_ids.insert(9);

        assert_eq!(synchronizer().serialize(&state), "/catalog/used/audi");
    }

    #[test]
    fn several_makes_go_to_the_query() {
        let mut state = FilterState::default();
        state.marks_ids.extend([7, 9]);

        assert_eq!(synchronizer().serialize(&state), "/catalog?marks_ids=7,9");
    }

    #[test]
    fn several_models_keep_every_id_in_the_query() {
        let mut state = FilterState::default();
        state.marks_ids.insert(7);
        state.models_ids.extend([42, 43]);

        assert_eq!(synchronizer().serialize(&state), "/catalog?marks_ids=7&models_ids=42,43");
    }

    #[test]
    fn unknown_slug_falls_back_to_query_ids() {
        let mut state = FilterState::default();
        state.marks_ids.insert(404);

        assert_eq!(synchronizer().serialize(&state), "/catalog?marks_ids=404");
    }

    #[test]
    fn defaults_are_omitted() {
        let mut state = FilterState::default();
        assert_eq!(synchronizer().serialize(&state), "/catalog");

        state.view = View::Grid;
        state.per_page = 50;
        state.page = 2;
        state.ranges.price.min = Some(1_000_000);
        assert_eq!(
            synchronizer().serialize(&state),
            "/catalog?view=grid&perPage=50&page=2&price%5Bmin%5D=1000000"
        );
    }

    #[test]
    fn parse_restores_what_serialize_wrote() {
        let sync = synchronizer();
        let mut state = FilterState::for_salon(Some(5));
        state.category = Some("new".into());
        state.marks_ids.insert(7);
        state.models_ids.insert(43);
        state.sort = "price_asc".into();
        state.region_id = Some(2);
        state.ranges.capacity.min = Some(160);
        state.categorical.insert(CategoricalKind::BodyType, 3);

        let url = sync.serialize(&state);
        assert_eq!(sync.parse(&url), Ok(state.clone()));
        assert_eq!(sync.serialize(&sync.parse(&url).unwrap()), url);
    }

    #[test]
    fn parse_accepts_absolute_locations_and_rejects_others() {
        let sync = synchronizer();
        let state = sync.parse("https://cars.example/catalog/bmw?models_ids=42").unwrap();
        assert_eq!(state.marks_ids, BTreeSet::from([7]));
        assert_eq!(state.models_ids, BTreeSet::from([42]));
        assert_eq!(state.category, None);

        assert!(matches!(sync.parse("/dealers/5"), Err(UrlError::NotCatalog(_))));
        assert!(matches!(sync.parse("/catalog/bmw/q7"), Err(UrlError::UnknownModel(_))));
    }

    #[test]
    fn page_size_and_page_are_kept_in_bounds() {
        let sync = synchronizer();

        let state = sync.parse("/catalog?perPage=0&page=4294967295").unwrap();

        assert_eq!(state.per_page, 1);
        assert_eq!(state.page, MAX_PAGE);
        assert!(matches!(sync.parse("/catalog?perPage=-5"), Err(UrlError::Invalid(_))));
    }

    #[test]
    fn missing_history_is_a_logged_no_op() {
        let sync = synchronizer();
        let mut state = FilterState::default();
        state.marks_ids.insert(7);

        let mut gone = RecordingHistory::default();
        assert_eq!(sync.push(&state, &mut gone), "/catalog/bmw");
        assert!(gone.entries.is_empty());

        let mut history = RecordingHistory { available: true, ..RecordingHistory::default() };
        sync.push(&state, &mut history);
        assert_eq!(history.entries, vec!["/catalog/bmw".to_string()]);
    }
}
