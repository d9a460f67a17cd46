//! Range-pair validation.
//!
//! Two independent checks run on every edit of a range bound:
//!
//! - a crossed pair (`max < min`) is an [`Severity::Error`] on the edited field and
//!   blocks every refresh until it is corrected;
//! - a bound outside the advertised sample is a [`Severity::Warning`], shown but never
//!   blocking.
//!
//! Messages share one container on the page, so they are deduplicated by their text
//! with digits stripped.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::models::{Bound, FieldId, Range, RangeKind, Ranges, SampleBounds, SampleTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationAnnotation {
    pub field_id: FieldId,
    pub severity: Severity,
    pub message: String,
}

impl ValidationAnnotation {
    fn error(field_id: FieldId, message: String) -> Self {
        Self { field_id, severity: Severity::Error, message }
    }

    fn warning(field_id: FieldId, message: String) -> Self {
        Self { field_id, severity: Severity::Warning, message }
    }

    /// Message text with digits removed and whitespace collapsed.
    pub fn dedup_key(&self) -> String {
        let without_digits: String = self.message.chars().filter(|c| !c.is_ascii_digit()).collect();
        without_digits.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext {
    pub edited: Option<Bound>,
    pub sample: SampleBounds,
}

impl ValidationContext {
    pub fn edited(bound: Bound, sample: SampleBounds) -> Self {
        Self { edited: Some(bound), sample }
    }
}

/// Annotations currently shown, keyed by the range pair they belong to.
#[derive(Debug, Default)]
pub struct ValidationEngine {
    report: BTreeMap<RangeKind, Vec<ValidationAnnotation>>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates one range pair after an edit of `context.edited`.
    pub fn validate(kind: RangeKind, range: &Range, context: &ValidationContext) -> Vec<ValidationAnnotation> {
        let Some(edited) = context.edited else {
            return Vec::new();
        };
        // Clearing a bound drops everything keyed to the pair
        let Some(value) = range.get(edited) else {
            return Vec::new();
        };
        let field = FieldId::new(kind, edited);
        let label = kind.label();
        let mut annotations = Vec::new();

        if range.is_crossed() {
            annotations.push(ValidationAnnotation::error(
                field,
                format!("Maximum {} must be greater than the minimum", label),
            ));
        }

        let sample = &context.sample;
        match edited {
            Bound::Min => {
                if let Some(sample_max) = sample.max.filter(|max| value > *max) {
                    annotations.push(ValidationAnnotation::warning(
                        field,
                        format!(
                            "Minimum {} cannot exceed {} in this sample",
                            label,
                            kind.format_display(sample_max)
                        ),
                    ));
                } else if let Some(sample_min) = sample.min.filter(|min| value < *min) {
                    annotations.push(ValidationAnnotation::warning(
                        field,
                        format!("Minimum {} in this sample is {}", label, kind.format_display(sample_min)),
                    ));
                }
            }
            Bound::Max => {
                if let Some(sample_min) = sample.min.filter(|min| value < *min) {
                    annotations.push(ValidationAnnotation::warning(
                        field,
                        format!(
                            "Maximum {} cannot be below {} in this sample",
                            label,
                            kind.format_display(sample_min)
                        ),
                    ));
                }
            }
        }

        dedup(annotations)
    }

    /// Validates a pair and replaces whatever was recorded for it.
    pub fn check(&mut self, kind: RangeKind, range: &Range, context: &ValidationContext) {
        let annotations = Self::validate(kind, range, context);
        if annotations.is_empty() {
            self.report.remove(&kind);
        } else {
            self.report.insert(kind, annotations);
        }
    }

    /// Re-runs every pair against fresh sample bounds, treating both sides as edited.
    pub fn revalidate_all(&mut self, ranges: &Ranges, samples: &SampleTable) {
        for kind in RangeKind::ALL {
            let range = ranges.get(kind);
            let sample = samples.get(&kind).copied().unwrap_or_default();
            let mut annotations = Self::validate(kind, range, &ValidationContext::edited(Bound::Max, sample));
            annotations.extend(Self::validate(kind, range, &ValidationContext::edited(Bound::Min, sample)));
            let annotations = dedup(annotations);
            if annotations.is_empty() {
                self.report.remove(&kind);
            } else {
                self.report.insert(kind, annotations);
            }
        }
    }

    pub fn clear(&mut self) {
        self.report.clear();
    }

    pub fn has_errors(&self) -> bool {
        self.report.values().flatten().any(ValidationAnnotation::is_error)
    }

    pub fn annotations_for(&self, kind: RangeKind) -> &[ValidationAnnotation] {
        self.report.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Everything in the shared message container, deduplicated across pairs.
    pub fn annotations(&self) -> Vec<ValidationAnnotation> {
        dedup(self.report.values().flatten().cloned().collect())
    }
}

fn dedup(annotations: Vec<ValidationAnnotation>) -> Vec<ValidationAnnotation> {
    let mut seen = HashSet::new();
    annotations
        .into_iter()
        .filter(|annotation| seen.insert(annotation.dedup_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn range(min: Option<i64>, max: Option<i64>) -> Range {
        Range { min, max }
    }

    #[test]
    fn crossed_price_range_is_one_error_on_the_edited_field() {
        let context = ValidationContext::edited(Bound::Max, SampleBounds::default());
        let annotations =
            ValidationEngine::validate(RangeKind::Price, &range(Some(2_000_000), Some(1_000_000)), &context);

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].field_id, FieldId::new(RangeKind::Price, Bound::Max));
        assert_eq!(annotations[0].severity, Severity::Error);
    }

    #[test]
    fn error_exists_iff_max_below_min() {
        let context = ValidationContext::edited(Bound::Min, SampleBounds::default());
        for (min, max) in [(1, 2), (2, 2), (3, 2), (0, 0), (10, 9)] {
            let annotations = ValidationEngine::validate(RangeKind::Mileage, &range(Some(min), Some(max)), &context);
            let has_error = annotations.iter().any(ValidationAnnotation::is_error);
            assert_eq!(has_error, max < min, "min={} max={}", min, max);
        }
    }

    #[test]
    fn clearing_a_bound_removes_the_pair_annotations() {
        let mut engine = ValidationEngine::new();
        let crossed = range(Some(2015), Some(2010));
        engine.check(RangeKind::Year, &crossed, &ValidationContext::edited(Bound::Max, SampleBounds::default()));
        assert!(engine.has_errors());

        let cleared = range(Some(2015), None);
        engine.check(RangeKind::Year, &cleared, &ValidationContext::edited(Bound::Max, SampleBounds::default()));
        assert!(!engine.has_errors());
        assert!(engine.annotations_for(RangeKind::Year).is_empty());
    }

    #[test]
    fn sample_bounds_only_warn() {
        let sample = SampleBounds { min: Some(500_000), max: Some(3_000_000) };
        let mut engine = ValidationEngine::new();
        engine.check(
            RangeKind::Price,
            &range(Some(4_000_000), None),
            &ValidationContext::edited(Bound::Min, sample),
        );

        let annotations = engine.annotations();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].severity, Severity::Warning);
        assert_eq!(annotations[0].message, "Minimum price cannot exceed 3 000 000 in this sample");
        assert!(!engine.has_errors());
    }

    #[test]
    fn max_below_sample_minimum_warns() {
        let sample = SampleBounds { min: Some(2005), max: Some(2024) };
        let annotations = ValidationEngine::validate(
            RangeKind::Year,
            &range(None, Some(2001)),
            &ValidationContext::edited(Bound::Max, sample),
        );
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].severity, Severity::Warning);
    }

    #[test]
    fn repeated_messages_differing_in_digits_collapse() {
        let first = ValidationAnnotation::warning(
            FieldId::new(RangeKind::Price, Bound::Min),
            "Minimum price in this sample is 500 000".into(),
        );
        let second = ValidationAnnotation::warning(
            FieldId::new(RangeKind::Price, Bound::Min),
            "Minimum price in this sample is 650 000".into(),
        );
        assert_eq!(first.dedup_key(), second.dedup_key());
        assert_eq!(dedup(vec![first.clone(), second]), vec![first]);
    }

    #[test]
    fn revalidation_uses_fresh_samples() {
        let mut engine = ValidationEngine::new();
        let mut ranges = Ranges::default();
        ranges.mileage = range(Some(10_000), None);

        let mut samples = SampleTable::new();
        engine.revalidate_all(&ranges, &samples);
        assert!(engine.annotations().is_empty());

        samples.insert(RangeKind::Mileage, SampleBounds { min: Some(0), max: Some(5_000) });
        engine.revalidate_all(&ranges, &samples);
        assert_eq!(engine.annotations_for(RangeKind::Mileage).len(), 1);
        assert!(!engine.has_errors());
    }
}
