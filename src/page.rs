// Bootstrap of a filter session from the server-rendered catalog page

use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use url::Url;

use crate::error::PageError;
use crate::models::{
    Bound, CategoricalKind, FieldId, FilterState, Id, MarkInfo, ModelInfo, PageMetadata, RangeKind,
    SampleBounds, SampleTable, View,
};

/// Everything a session starts from: the form as rendered, the make/model tree and
/// the sample bounds advertised in the range placeholders.
#[derive(Debug, Clone)]
pub struct InitialPage {
    pub state: FilterState,
    pub metadata: PageMetadata,
    pub samples: SampleTable,
    pub total_cars: Option<u64>,
    pub location: String,
}

fn selector(css: &str) -> Result<Selector, PageError> {
    Selector::parse(css).map_err(|_| PageError::Selector(css.to_string()))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_attr<T: std::str::FromStr>(element: ElementRef<'_>, name: &str) -> Option<T> {
    element.value().attr(name).and_then(|value| value.trim().parse().ok())
}

// Slugs are scattered over the page (`[data-mark-id][data-slug]`); first one wins.
fn slugs(document: &Html, id_attr: &str) -> Result<BTreeMap<Id, String>, PageError> {
    let mut slugs = BTreeMap::new();
    for element in document.select(&selector(&format!("[{}][data-slug]", id_attr))?) {
        let slug = element.value().attr("data-slug").unwrap_or_default().trim();
        if let (Some(id), false) = (parse_attr::<Id>(element, id_attr), slug.is_empty()) {
            slugs.entry(id).or_insert_with(|| slug.to_string());
        }
    }
    Ok(slugs)
}

/// `(id, title, checked)` for every checkbox item below `scope`.
fn check_items(scope: ElementRef<'_>) -> Result<Vec<(Id, String, bool)>, PageError> {
    let item_selector = selector(".check__item")?;
    let input_selector = selector("input")?;
    let label_selector = selector(".check__label")?;

    let mut items = Vec::new();
    for item in scope.select(&item_selector) {
        let Some(input) = item.select(&input_selector).next() else {
            continue;
        };
        let Some(id) = parse_attr::<Id>(input, "value") else {
            continue;
        };
        let title = item.select(&label_selector).next().map(text_of).unwrap_or_default();
        let checked = input.value().attr("checked").is_some();
        items.push((id, title, checked));
    }
    Ok(items)
}

fn read_marks(
    document: &Html,
    scope: ElementRef<'_>,
    metadata: &mut PageMetadata,
    state: &mut FilterState,
) -> Result<(), PageError> {
    let mark_slugs = slugs(document, "data-mark-id")?;
    for (id, title, checked) in check_items(scope)? {
        if metadata.mark(id).is_some() {
            continue;
        }
        metadata.marks.push(MarkInfo { id, title, slug: mark_slugs.get(&id).cloned() });
        if checked {
            state.marks_ids.insert(id);
        }
    }
    Ok(())
}

fn read_models(
    document: &Html,
    tabs: &str,
    metadata: &mut PageMetadata,
    state: &mut FilterState,
) -> Result<(), PageError> {
    let model_slugs = slugs(document, "data-model-id")?;
    for tab in document.select(&selector(tabs)?) {
        let Some(mark_id) = parse_attr::<Id>(tab, "data-tab") else {
            continue;
        };
        for (id, title, checked) in check_items(tab)? {
            metadata.models.push(ModelInfo { id, mark_id, title, slug: model_slugs.get(&id).cloned() });
            if checked {
                state.models_ids.insert(id);
            }
        }
    }
    Ok(())
}

/// Rebuilds the make/model tree from the `marks_html` of a category switch.
///
/// Categories and the slugs the fragment omits carry over from `current`. Models come
/// from the fragment's tabs when it has any, else the current models of makes that
/// are still listed.
pub fn parse_marks_fragment(html: &str, current: &PageMetadata) -> Result<PageMetadata, PageError> {
    let fragment = Html::parse_fragment(html);
    let mut metadata = PageMetadata { categories: current.categories.clone(), ..PageMetadata::default() };
    // Checked state in a fragment is presentation only; the category switch already cleared it
    let mut ignored = FilterState::default();

    read_marks(&fragment, fragment.root_element(), &mut metadata, &mut ignored)?;
    read_models(&fragment, ".js-tab-small-block[data-tab]", &mut metadata, &mut ignored)?;

    for mark in metadata.marks.iter_mut() {
        if mark.slug.is_none() {
            mark.slug = current.mark_slug(mark.id).map(str::to_string);
        }
    }
    if metadata.models.is_empty() {
        let listed: Vec<Id> = metadata.marks.iter().map(|mark| mark.id).collect();
        metadata.models = current
            .models
            .iter()
            .filter(|model| listed.contains(&model.mark_id))
            .cloned()
            .collect();
    }

    tracing::debug!(marks = metadata.marks.len(), models = metadata.models.len(), "Parsed make list");
    Ok(metadata)
}

fn salon_id(location: &str) -> Option<Id> {
    let url = Url::parse(location)
        .or_else(|_| Url::parse("http://localhost").and_then(|base| base.join(location)))
        .ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "salon_id")
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// Reads the initial filter state and page metadata out of the catalog page HTML.
pub fn parse_catalog_page(html: &str, location: &str, default_per_page: u32) -> Result<InitialPage, PageError> {
    let document = Html::parse_document(html);
    let root = document
        .select(&selector("#catalog-page")?)
        .next()
        .ok_or(PageError::MissingForm)?;

    let mut state = FilterState::for_salon(salon_id(location));
    state.per_page = default_per_page;
    state.category = root
        .value()
        .attr("data-category")
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .map(str::to_string);

    let mut metadata = PageMetadata::default();
    if let Some(marks) = document.select(&selector(".js-mark")?).next() {
        read_marks(&document, marks, &mut metadata, &mut state)?;
    }
    read_models(&document, ".js-model .js-tab-small-block[data-tab]", &mut metadata, &mut state)?;

    for tag in document.select(&selector(".filter__tag[data-category]")?) {
        if let Some(category) = tag.value().attr("data-category").map(str::trim) {
            if !category.is_empty() && !metadata.is_category(category) {
                metadata.categories.push(category.to_string());
            }
        }
    }
    if let Some(category) = &state.category {
        if !metadata.is_category(category) {
            metadata.categories.push(category.clone());
        }
    }

    let mut samples = SampleTable::new();
    for field in FieldId::all() {
        let css = format!("input[name=\"{}\"]", field.form_name());
        let Some(input) = document.select(&selector(&css)?).next() else {
            continue;
        };
        let value = input.value().attr("value").unwrap_or_default();
        let parsed = field.range.parse_input(value).ok().flatten();
        state.ranges.get_mut(field.range).set(field.bound, parsed);

        let advertised = input
            .value()
            .attr("placeholder")
            .and_then(|text| field.range.parse_advertised(text));
        let bounds = samples.entry(field.range).or_insert_with(SampleBounds::default);
        match field.bound {
            Bound::Min => bounds.min = advertised,
            Bound::Max => bounds.max = advertised,
        }
    }
    // Years without a sample are advertised as 0
    if let Some(bounds) = samples.get_mut(&RangeKind::Year) {
        bounds.min = bounds.min.filter(|year| *year > 0);
        bounds.max = bounds.max.filter(|year| *year > 0);
    }

    for kind in CategoricalKind::ALL {
        let css = format!("input[name=\"{}\"]", kind.form_key());
        if let Some(id) = document
            .select(&selector(&css)?)
            .next()
            .and_then(|input| parse_attr::<Id>(input, "value"))
        {
            state.categorical.insert(kind, id);
        }
    }

    if let Some(view) = document
        .select(&selector(".js-view-catalog.is-active[data-view]")?)
        .next()
        .and_then(|element| element.value().attr("data-view"))
        .and_then(View::parse)
    {
        state.view = view;
    }
    if let Some(per_page) = document
        .select(&selector(".js-perPage.is-active[data-per-page]")?)
        .next()
        .and_then(|element| parse_attr::<u32>(element, "data-per-page"))
    {
        state.per_page = per_page.max(1);
    }
    if let Some(sort) = document
        .select(&selector(".js-catalog-sort select option[selected]")?)
        .next()
        .and_then(|option| option.value().attr("value"))
    {
        state.sort = sort.trim().to_string();
    }
    state.region_id = document
        .select(&selector(".js-catalog-city.is-active[data-id]")?)
        .next()
        .and_then(|element| parse_attr::<Id>(element, "data-id"));
    if let Some(page) = document
        .select(&selector(".pagination__item.is-active[data-page]")?)
        .next()
        .and_then(|element| parse_attr::<u32>(element, "data-page"))
    {
        state.page = page.max(1);
    }

    let total_cars = document
        .select(&selector(".js-total-cars")?)
        .next()
        .map(text_of)
        .and_then(|text| {
            let digits: String = text.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        });

    tracing::debug!(
        marks = metadata.marks.len(),
        models = metadata.models.len(),
        ?total_cars,
        "Parsed catalog page"
    );

    Ok(InitialPage { state, metadata, samples, total_cars, location: location.to_string() })
}
