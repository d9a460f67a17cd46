// Data structures for filter state, page metadata and the catalog wire format

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::InvalidNumber;

pub type Id = u64;

pub const DEFAULT_PER_PAGE: u32 = 25;
/// Highest page number accepted from any input; `MAX_PAGE + 1` still fits a `u32`.
pub const MAX_PAGE: u32 = u32::MAX - 1;
/// Lower end of the year dropdowns when the sample advertises no minimum.
pub const EARLIEST_YEAR: i64 = 1980;

// --- Range fields ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    Year,
    Price,
    Mileage,
    Capacity,
}

impl RangeKind {
    pub const ALL: [RangeKind; 4] = [
        RangeKind::Year,
        RangeKind::Price,
        RangeKind::Mileage,
        RangeKind::Capacity,
    ];

    /// Prefix used in form field names, e.g. `price` in `price[min]`.
    pub fn form_key(self) -> &'static str {
        match self {
            RangeKind::Year => "year",
            RangeKind::Price => "price",
            RangeKind::Mileage => "mileage",
            RangeKind::Capacity => "capacity",
        }
    }

    pub fn from_form_key(key: &str) -> Option<Self> {
        RangeKind::ALL.into_iter().find(|kind| kind.form_key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            RangeKind::Year => "year",
            RangeKind::Price => "price",
            RangeKind::Mileage => "mileage",
            RangeKind::Capacity => "engine capacity",
        }
    }

    // Capacity is stored in hundredths of a litre so every value stays integral.
    fn scale(self) -> i64 {
        match self {
            RangeKind::Capacity => 100,
            _ => 1,
        }
    }

    /// Parses free text typed into a range input. `Ok(None)` means the field was cleared.
    ///
    /// Whitespace (thousands separators) is ignored. Capacity accepts `,` or `.` as the
    /// decimal separator and keeps at most two fraction digits.
    pub fn parse_input(self, raw: &str) -> Result<Option<i64>, InvalidNumber> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Ok(None);
        }
        let invalid = || InvalidNumber(raw.to_string());

        if self.scale() == 1 {
            if !compact.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            return compact.parse::<i64>().map(Some).map_err(|_| invalid());
        }

        let normalized = compact.replace(',', ".");
        let (whole, fraction) = match normalized.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (normalized.as_str(), ""),
        };
        let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !digits_only(whole) || !digits_only(fraction) {
            return Err(invalid());
        }
        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
        let mut hundredths = 0;
        for (position, digit) in fraction.chars().take(2).enumerate() {
            let digit = i64::from(digit.to_digit(10).unwrap_or(0));
            hundredths += if position == 0 { digit * 10 } else { digit };
        }
        whole
            .checked_mul(self.scale())
            .and_then(|v| v.checked_add(hundredths))
            .map(Some)
            .ok_or_else(invalid)
    }

    /// Pulls the first number out of a placeholder such as `Price from 500 000`.
    pub fn parse_advertised(self, text: &str) -> Option<i64> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let start = compact.find(|c: char| c.is_ascii_digit())?;
        let number: String = compact[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit() || (self.scale() > 1 && matches!(c, '.' | ',')))
            .collect();
        self.parse_input(number.trim_end_matches(['.', ','])).ok().flatten()
    }

    /// Wire representation: no grouping, no whitespace.
    pub fn format_plain(self, value: i64) -> String {
        if self.scale() == 1 {
            return value.to_string();
        }
        let whole = value / self.scale();
        let fraction = value % self.scale();
        if fraction == 0 {
            whole.to_string()
        } else {
            let digits = format!("{:02}", fraction);
            format!("{}.{}", whole, digits.trim_end_matches('0'))
        }
    }

    /// Display representation: price and mileage grouped by thousands with spaces.
    pub fn format_display(self, value: i64) -> String {
        match self {
            RangeKind::Price | RangeKind::Mileage => group_thousands(&value.to_string()),
            RangeKind::Year | RangeKind::Capacity => self.format_plain(value),
        }
    }

    pub(crate) fn from_capacity_litres(litres: f64) -> i64 {
        (litres * 100.0).round() as i64
    }
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    format!("{}{}", sign, grouped)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Min,
    Max,
}

impl Bound {
    pub fn key(self) -> &'static str {
        match self {
            Bound::Min => "min",
            Bound::Max => "max",
        }
    }
}

/// One side of a range pair, e.g. `price[max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldId {
    pub range: RangeKind,
    pub bound: Bound,
}

impl FieldId {
    pub fn new(range: RangeKind, bound: Bound) -> Self {
        Self { range, bound }
    }

    pub fn form_name(&self) -> String {
        format!("{}[{}]", self.range.form_key(), self.bound.key())
    }

    pub fn from_form_name(name: &str) -> Option<Self> {
        let (range, rest) = name.split_once('[')?;
        let bound = match rest.strip_suffix(']')? {
            "min" => Bound::Min,
            "max" => Bound::Max,
            _ => return None,
        };
        Some(Self::new(RangeKind::from_form_key(range)?, bound))
    }

    pub fn all() -> impl Iterator<Item = FieldId> {
        RangeKind::ALL
            .into_iter()
            .flat_map(|range| [FieldId::new(range, Bound::Min), FieldId::new(range, Bound::Max)])
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.range.form_key(), self.bound.key())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl Range {
    pub fn get(&self, bound: Bound) -> Option<i64> {
        match bound {
            Bound::Min => self.min,
            Bound::Max => self.max,
        }
    }

    pub fn set(&mut self, bound: Bound, value: Option<i64>) {
        match bound {
            Bound::Min => self.min = value,
            Bound::Max => self.max = value,
        }
    }

    /// Both bounds set and `max < min`.
    pub fn is_crossed(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if max < min)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranges {
    pub year: Range,
    pub price: Range,
    pub mileage: Range,
    pub capacity: Range,
}

impl Ranges {
    pub fn get(&self, kind: RangeKind) -> &Range {
        match kind {
            RangeKind::Year => &self.year,
            RangeKind::Price => &self.price,
            RangeKind::Mileage => &self.mileage,
            RangeKind::Capacity => &self.capacity,
        }
    }

    pub fn get_mut(&mut self, kind: RangeKind) -> &mut Range {
        match kind {
            RangeKind::Year => &mut self.year,
            RangeKind::Price => &mut self.price,
            RangeKind::Mileage => &mut self.mileage,
            RangeKind::Capacity => &mut self.capacity,
        }
    }
}

// --- Single-select facets ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalKind {
    BodyType,
    Gearbox,
    EngineType,
    DrivingGearType,
}

impl CategoricalKind {
    pub const ALL: [CategoricalKind; 4] = [
        CategoricalKind::BodyType,
        CategoricalKind::Gearbox,
        CategoricalKind::EngineType,
        CategoricalKind::DrivingGearType,
    ];

    pub fn form_key(self) -> &'static str {
        match self {
            CategoricalKind::BodyType => "car_body",
            CategoricalKind::Gearbox => "gearbox",
            CategoricalKind::EngineType => "engine_type",
            CategoricalKind::DrivingGearType => "driving_gear_type",
        }
    }

    pub fn from_form_key(key: &str) -> Option<Self> {
        CategoricalKind::ALL.into_iter().find(|kind| kind.form_key() == key)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    List,
    Grid,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::List => "list",
            View::Grid => "grid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "list" => Some(View::List),
            "grid" => Some(View::Grid),
            _ => None,
        }
    }
}

// --- Canonical filter state ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub category: Option<String>,
    pub marks_ids: BTreeSet<Id>,
    pub models_ids: BTreeSet<Id>,
    pub ranges: Ranges,
    pub categorical: BTreeMap<CategoricalKind, Id>,
    pub sort: String,
    pub view: View,
    pub per_page: u32,
    pub region_id: Option<Id>,
    pub page: u32,
    salon_id: Option<Id>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            category: None,
            marks_ids: BTreeSet::new(),
            models_ids: BTreeSet::new(),
            ranges: Ranges::default(),
            categorical: BTreeMap::new(),
            sort: String::new(),
            view: View::List,
            per_page: DEFAULT_PER_PAGE,
            region_id: None,
            page: 1,
            salon_id: None,
        }
    }
}

impl FilterState {
    pub fn for_salon(salon_id: Option<Id>) -> Self {
        Self { salon_id, ..Self::default() }
    }

    /// Dealer scope taken from the page URL; never user-editable.
    pub fn salon_id(&self) -> Option<Id> {
        self.salon_id
    }

    /// Carries the dealer scope of `current` over to a state restored from elsewhere.
    pub fn inherit_scope(&mut self, current: &FilterState) {
        self.salon_id = current.salon_id;
    }

    /// Clears every user filter. Category, view, page size, sort, region and salon survive.
    pub fn clear_filters(&mut self) {
        self.marks_ids.clear();
        self.models_ids.clear();
        self.ranges = Ranges::default();
        self.categorical.clear();
        self.page = 1;
    }
}

// --- Page metadata (server-rendered, read-only) ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkInfo {
    pub id: Id,
    pub title: String,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub id: Id,
    pub mark_id: Id,
    pub title: String,
    pub slug: Option<String>,
}

/// Makes, models and categories known to the page, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub marks: Vec<MarkInfo>,
    pub models: Vec<ModelInfo>,
    pub categories: Vec<String>,
}

impl PageMetadata {
    pub fn mark(&self, id: Id) -> Option<&MarkInfo> {
        self.marks.iter().find(|mark| mark.id == id)
    }

    pub fn model(&self, id: Id) -> Option<&ModelInfo> {
        self.models.iter().find(|model| model.id == id)
    }

    pub fn mark_slug(&self, id: Id) -> Option<&str> {
        self.mark(id).and_then(|mark| mark.slug.as_deref())
    }

    pub fn model_slug(&self, id: Id) -> Option<&str> {
        self.model(id).and_then(|model| model.slug.as_deref())
    }

    pub fn mark_by_slug(&self, slug: &str) -> Option<&MarkInfo> {
        self.marks.iter().find(|mark| mark.slug.as_deref() == Some(slug))
    }

    pub fn model_by_slug(&self, mark_id: Id, slug: &str) -> Option<&ModelInfo> {
        self.models
            .iter()
            .find(|model| model.mark_id == mark_id && model.slug.as_deref() == Some(slug))
    }

    pub fn models_of(&self, mark_id: Id) -> impl Iterator<Item = &ModelInfo> {
        self.models.iter().filter(move |model| model.mark_id == mark_id)
    }

    pub fn is_category(&self, slug: &str) -> bool {
        self.categories.iter().any(|category| category == slug)
    }
}

// --- Catalog response (wire format) ---

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetOption {
    pub id: Id,
    pub title: String,
    #[serde(rename = "isActive", default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityOption {
    pub value: f64,
    #[serde(rename = "isActive", default = "default_active")]
    pub is_active: bool,
}

/// The `filters` object of a catalog response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetFilters {
    pub min_year: Option<i64>,
    pub max_year: Option<i64>,
    pub min_mileage_formatted: Option<String>,
    pub max_mileage_formatted: Option<String>,
    pub min_price_formatted: Option<String>,
    pub max_price_formatted: Option<String>,
    pub years: Vec<i64>,
    pub capacities: Vec<CapacityOption>,
    pub car_body: Vec<FacetOption>,
    pub gearbox: Vec<FacetOption>,
    pub engine_type: Vec<FacetOption>,
    pub driving_gear_type: Vec<FacetOption>,
}

impl FacetFilters {
    pub fn options(&self, kind: CategoricalKind) -> &[FacetOption] {
        match kind {
            CategoricalKind::BodyType => &self.car_body,
            CategoricalKind::Gearbox => &self.gearbox,
            CategoricalKind::EngineType => &self.engine_type,
            CategoricalKind::DrivingGearType => &self.driving_gear_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredCount {
    pub id: Id,
    pub filtered_cars_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogResponse {
    pub html: String,
    pub pagination: String,
    pub filters: FacetFilters,
    pub filtered_marks: Vec<FilteredCount>,
    pub filtered_models: Vec<FilteredCount>,
    pub filtered_models_html: String,
    /// Make list for the requested category; only sent when it differs from the page's.
    pub marks_html: Option<String>,
    pub total_cars: u64,
    pub title: String,
    pub meta_title: String,
}

// --- Sample bounds & facet catalog ---

/// Lowest and highest value available in the current result sample for one range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SampleBounds {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

pub type SampleTable = BTreeMap<RangeKind, SampleBounds>;

/// Server-derived facet data for the filters that produced it. Always replaced whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetCatalog {
    pub filters: FacetFilters,
    pub filtered_marks: Vec<FilteredCount>,
    pub filtered_models: Vec<FilteredCount>,
}

impl FacetCatalog {
    pub fn from_response(response: &CatalogResponse) -> Self {
        Self {
            filters: response.filters.clone(),
            filtered_marks: response.filtered_marks.clone(),
            filtered_models: response.filtered_models.clone(),
        }
    }

    pub fn mark_count(&self, id: Id) -> Option<u64> {
        self.filtered_marks
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.filtered_cars_count)
    }

    pub fn model_count(&self, id: Id) -> Option<u64> {
        self.filtered_models
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.filtered_cars_count)
    }

    /// Inactive capacities never contribute to the advertised bounds.
    pub fn sample_bounds(&self, kind: RangeKind) -> SampleBounds {
        let filters = &self.filters;
        let formatted = |text: &Option<String>| text.as_deref().and_then(|t| kind.parse_advertised(t));
        match kind {
            RangeKind::Year => SampleBounds {
                min: filters.min_year.filter(|year| *year > 0),
                max: filters.max_year.filter(|year| *year > 0),
            },
            RangeKind::Price => SampleBounds {
                min: formatted(&filters.min_price_formatted),
                max: formatted(&filters.max_price_formatted),
            },
            RangeKind::Mileage => SampleBounds {
                min: formatted(&filters.min_mileage_formatted),
                max: formatted(&filters.max_mileage_formatted),
            },
            RangeKind::Capacity => {
                let active = filters
                    .capacities
                    .iter()
                    .filter(|option| option.is_active)
                    .map(|option| RangeKind::from_capacity_litres(option.value));
                let (min, max) = active.fold((None, None), |(min, max): (Option<i64>, Option<i64>), v| {
                    (Some(min.map_or(v, |m| m.min(v))), Some(max.map_or(v, |m| m.max(v))))
                });
                SampleBounds { min, max }
            }
        }
    }

    pub fn sample_table(&self) -> SampleTable {
        RangeKind::ALL
            .into_iter()
            .map(|kind| (kind, self.sample_bounds(kind)))
            .collect()
    }
}

/// Placeholder text advertising the sample bound of a range input.
pub fn placeholder(field: FieldId, sample: &SampleBounds) -> String {
    let kind = field.range;
    let value = sample.get(field.bound).map(|v| kind.format_display(v));
    let unit = match kind {
        RangeKind::Mileage => " km",
        RangeKind::Capacity => " l",
        RangeKind::Year | RangeKind::Price => "",
    };
    let prefix = match (field.bound, kind) {
        (Bound::Max, _) => "To".to_string(),
        (Bound::Min, RangeKind::Capacity) => "Capacity from".to_string(),
        (Bound::Min, _) => {
            let label = kind.label();
            let mut chars = label.chars();
            match chars.next() {
                Some(first) => format!("{}{} from", first.to_uppercase(), chars.as_str()),
                None => String::new(),
            }
        }
    };
    match value {
        Some(value) => format!("{} {}{}", prefix, value, unit),
        None => prefix,
    }
}

impl SampleBounds {
    pub fn get(&self, bound: Bound) -> Option<i64> {
        match bound {
            Bound::Min => self.min,
            Bound::Max => self.max,
        }
    }
}

/// Entries of the two year dropdowns, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct YearChoices {
    pub min: Vec<i64>,
    pub max: Vec<i64>,
}

/// Each year dropdown only offers years compatible with the other side: "to" starts at
/// the picked "from" year, "from" stops at the picked "to" year.
pub fn year_choices(selected: &Range, sample: &SampleBounds, current_year: i64) -> YearChoices {
    let lowest = sample.min.unwrap_or(EARLIEST_YEAR);
    let highest = sample.max.unwrap_or(current_year);
    YearChoices {
        min: (lowest..=selected.max.unwrap_or(highest)).collect(),
        max: (selected.min.unwrap_or(lowest)..=highest).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn integer_ranges_ignore_thousand_separators() {
        assert_eq!(RangeKind::Price.parse_input("1 500 000"), Ok(Some(1_500_000)));
        assert_eq!(RangeKind::Mileage.parse_input("   "), Ok(None));
        assert!(RangeKind::Year.parse_input("20x1").is_err());
    }

    #[test]
    fn capacity_keeps_two_fraction_digits() {
        assert_eq!(RangeKind::Capacity.parse_input("1,6"), Ok(Some(160)));
        assert_eq!(RangeKind::Capacity.parse_input("2.345"), Ok(Some(234)));
        assert_eq!(RangeKind::Capacity.parse_input("3"), Ok(Some(300)));
        assert!(RangeKind::Capacity.parse_input(".").is_err());
        assert_eq!(RangeKind::Capacity.format_plain(160), "1.6");
        assert_eq!(RangeKind::Capacity.format_plain(205), "2.05");
        assert_eq!(RangeKind::Capacity.format_plain(300), "3");
    }

    #[test]
    fn display_groups_price_and_mileage_only() {
        assert_eq!(RangeKind::Price.format_display(1_500_000), "1 500 000");
        assert_eq!(RangeKind::Mileage.format_display(950), "950");
        assert_eq!(RangeKind::Year.format_display(2015), "2015");
    }

    #[test]
    fn advertised_bounds_are_read_from_placeholders() {
        assert_eq!(RangeKind::Price.parse_advertised("Price from 500 000"), Some(500_000));
        assert_eq!(RangeKind::Mileage.parse_advertised("To 200 000 km"), Some(200_000));
        assert_eq!(RangeKind::Capacity.parse_advertised("Capacity from 1.4 l"), Some(140));
        assert_eq!(RangeKind::Year.parse_advertised("Year from"), None);
    }

    #[test]
    fn field_ids_round_trip_through_form_names() {
        for field in FieldId::all() {
            assert_eq!(FieldId::from_form_name(&field.form_name()), Some(field));
        }
        assert_eq!(FieldId::from_form_name("price[avg]"), None);
    }

    #[test]
    fn capacity_sample_skips_inactive_options() {
        let catalog = FacetCatalog {
            filters: FacetFilters {
                capacities: vec![
                    CapacityOption { value: 1.2, is_active: false },
                    CapacityOption { value: 1.6, is_active: true },
                    CapacityOption { value: 3.0, is_active: true },
                    CapacityOption { value: 5.0, is_active: false },
                ],
                ..FacetFilters::default()
            },
            ..FacetCatalog::default()
        };
        assert_eq!(
            catalog.sample_bounds(RangeKind::Capacity),
            SampleBounds { min: Some(160), max: Some(300) }
        );
    }

    #[test]
    fn year_dropdowns_narrow_each_other() {
        let sample = SampleBounds { min: Some(2015), max: Some(2020) };

        let open = year_choices(&Range::default(), &sample, 2026);
        assert_eq!(open.min, vec![2015, 2016, 2017, 2018, 2019, 2020]);
        assert_eq!(open.max, open.min);

        let picked = year_choices(&Range { min: Some(2018), max: Some(2019) }, &sample, 2026);
        assert_eq!(picked.min, vec![2015, 2016, 2017, 2018, 2019]);
        assert_eq!(picked.max, vec![2018, 2019, 2020]);
    }

    #[test]
    fn year_dropdowns_fall_back_without_a_sample() {
        let choices = year_choices(&Range { min: Some(2024), max: None }, &SampleBounds::default(), 2026);
        assert_eq!(choices.max, vec![2024, 2025, 2026]);
        assert_eq!(choices.min.first().copied(), Some(EARLIEST_YEAR));
        assert_eq!(choices.min.last().copied(), Some(2026));
    }

    #[test]
    fn placeholders_follow_sample_bounds() {
        let sample = SampleBounds { min: Some(500_000), max: Some(9_000_000) };
        assert_eq!(placeholder(FieldId::new(RangeKind::Price, Bound::Min), &sample), "Price from 500 000");
        assert_eq!(placeholder(FieldId::new(RangeKind::Price, Bound::Max), &sample), "To 9 000 000");
        assert_eq!(
            placeholder(FieldId::new(RangeKind::Year, Bound::Min), &SampleBounds::default()),
            "Year from"
        );
    }
}
