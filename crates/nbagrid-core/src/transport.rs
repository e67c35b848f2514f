//! Export and import of grid assignments.
//!
//! ```json
//! {
//!   "title": "Bigs and scorers",
//!   "row": { "0": { "kind": "all_star", "label": "All-Star player", "config": {} }, ... },
//!   "col": { "0": { "kind": "career_ppg_at_least", "label": "Career points per game: 20+", "config": { "value": 20 } }, ... }
//! }
//! ```
//!
//! Imports are all-or-nothing: the first bad slot rejects the whole document.

use crate::error::{ConfigError, TransportError};
use crate::filter::{Filter, FilterCatalog, FilterConfig};
use crate::grid::{Axis, GridAssignment, Slot, GRID_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longest title a grid document may carry, in characters
pub const TITLE_MAX_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDocument {
    pub kind: String,
    pub label: String,
    pub config: serde_json::Value,
}

impl SlotDocument {
    pub fn from_filter(filter: &Filter) -> Self {
        Self {
            kind: filter.kind_id(),
            label: filter.label(),
            config: filter.config().to_json(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub row: Option<BTreeMap<usize, SlotDocument>>,
    #[serde(default)]
    pub col: Option<BTreeMap<usize, SlotDocument>>,
}

impl GridDocument {
    /// Pretty-printed JSON form
    pub fn to_json(&self) -> Result<String, TransportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, TransportError> {
        Ok(serde_json::from_str(json)?)
    }
}

pub(crate) fn check_title(title: Option<&str>) -> Result<(), TransportError> {
    if let Some(title) = title {
        let len = title.chars().count();
        if len > TITLE_MAX_LEN {
            return Err(TransportError::TitleTooLong {
                len,
                max: TITLE_MAX_LEN,
            });
        }
    }
    Ok(())
}

/// Serialize an assignment and optional title
pub fn export(assignment: &GridAssignment, title: Option<&str>) -> Result<GridDocument, TransportError> {
    check_title(title)?;
    let axis_doc = |filters: &[Filter; GRID_SIZE]| {
        filters
            .iter()
            .enumerate()
            .map(|(i, f)| (i, SlotDocument::from_filter(f)))
            .collect::<BTreeMap<_, _>>()
    };
    Ok(GridDocument {
        title: title.map(str::to_string),
        row: Some(axis_doc(&assignment.rows)),
        col: Some(axis_doc(&assignment.cols)),
    })
}

/// Rebuild an assignment from a document, checking every slot against `catalog`
pub fn import(
    document: &GridDocument,
    catalog: &FilterCatalog,
) -> Result<(GridAssignment, Option<String>), TransportError> {
    check_title(document.title.as_deref())?;
    let rows = import_axis(Axis::Row, document.row.as_ref(), catalog)?;
    let cols = import_axis(Axis::Col, document.col.as_ref(), catalog)?;
    Ok((GridAssignment::new(rows, cols), document.title.clone()))
}

fn import_axis(
    axis: Axis,
    slots: Option<&BTreeMap<usize, SlotDocument>>,
    catalog: &FilterCatalog,
) -> Result<[Filter; GRID_SIZE], TransportError> {
    let slots = slots.ok_or(TransportError::MissingAxis(axis))?;
    if let Some(&index) = slots.keys().find(|&&i| i >= GRID_SIZE) {
        return Err(TransportError::UnexpectedSlot { axis, index });
    }

    let mut filters = Vec::with_capacity(GRID_SIZE);
    for index in 0..GRID_SIZE {
        let slot = slots
            .get(&index)
            .ok_or(TransportError::MissingSlot { axis, index })?;
        filters.push(import_slot(Slot { axis, index }, slot, catalog)?);
    }
    match <[Filter; GRID_SIZE]>::try_from(filters) {
        Ok(filters) => Ok(filters),
        Err(_) => Err(TransportError::MissingAxis(axis)),
    }
}

fn import_slot(
    slot: Slot,
    document: &SlotDocument,
    catalog: &FilterCatalog,
) -> Result<Filter, TransportError> {
    let invalid = |source: ConfigError| TransportError::InvalidSlot {
        axis: slot.axis,
        index: slot.index,
        source,
    };
    let config = FilterConfig::from_json(&document.config).map_err(|reason| {
        invalid(ConfigError::MalformedConfig {
            kind: document.kind.clone(),
            reason,
        })
    })?;
    let filter = catalog
        .instantiate(&document.kind, &config)
        .map_err(invalid)?;
    let expected = filter.label();
    if expected != document.label {
        return Err(TransportError::LabelMismatch {
            axis: slot.axis,
            index: slot.index,
            expected,
            found: document.label.clone(),
        });
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ChoiceField, Comparison, FilterDescriptor, Flag, StatField, ThresholdSpec};

    fn ppg() -> ThresholdSpec {
        ThresholdSpec::new(StatField::CareerPpg, Comparison::AtLeast, 10, 28, 2, "Career points per game:")
    }

    fn catalog() -> FilterCatalog {
        FilterCatalog::new(vec![
            FilterDescriptor::flag(Flag::AllStar),
            FilterDescriptor::flag(Flag::AllNba),
            FilterDescriptor::flag(Flag::NbaChampion),
            FilterDescriptor::choice(ChoiceField::Position, vec!["Guard".into(), "Center".into()]),
            FilterDescriptor::choice(ChoiceField::Team, vec!["Boston Celtics".into()]),
            FilterDescriptor::threshold(ppg()),
        ])
        .unwrap()
    }

    fn assignment() -> GridAssignment {
        GridAssignment::new(
            [
                Filter::Flag(Flag::AllStar),
                Filter::Flag(Flag::AllNba),
                Filter::Flag(Flag::NbaChampion),
            ],
            [
                Filter::choice(ChoiceField::Position, "Center"),
                Filter::choice(ChoiceField::Team, "Boston Celtics"),
                Filter::threshold(ppg(), 20),
            ],
        )
    }

    #[test]
    fn test_round_trip() {
        let catalog = catalog();
        let doc = export(&assignment(), Some("Bigs")).unwrap();
        let json = doc.to_json().unwrap();
        let parsed = GridDocument::from_json(&json).unwrap();
        let (restored, title) = import(&parsed, &catalog).unwrap();
        assert_eq!(restored, assignment());
        assert_eq!(title.as_deref(), Some("Bigs"));
        assert_eq!(export(&restored, Some("Bigs")).unwrap(), doc);
    }

    #[test]
    fn test_document_shape() {
        let doc = export(&assignment(), None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert!(value.get("title").is_none());
        assert_eq!(value["row"]["0"]["kind"], "all_star");
        assert_eq!(value["row"]["0"]["config"], serde_json::json!({}));
        assert_eq!(value["col"]["2"]["label"], "Career points per game: 20+");
        assert_eq!(value["col"]["2"]["config"], serde_json::json!({"value": 20}));
        assert_eq!(value["col"]["0"]["config"], serde_json::json!({"value": "Center"}));
    }

    #[test]
    fn test_rejects_missing_axis() {
        let mut doc = export(&assignment(), None).unwrap();
        doc.col = None;
        assert!(matches!(
            import(&doc, &catalog()),
            Err(TransportError::MissingAxis(Axis::Col))
        ));
    }

    #[test]
    fn test_rejects_missing_and_extra_slots() {
        let mut doc = export(&assignment(), None).unwrap();
        doc.row.as_mut().unwrap().remove(&1);
        assert!(matches!(
            import(&doc, &catalog()),
            Err(TransportError::MissingSlot { axis: Axis::Row, index: 1 })
        ));

        let mut doc = export(&assignment(), None).unwrap();
        let extra = SlotDocument::from_filter(&Filter::Flag(Flag::AllStar));
        doc.col.as_mut().unwrap().insert(3, extra);
        assert!(matches!(
            import(&doc, &catalog()),
            Err(TransportError::UnexpectedSlot { axis: Axis::Col, index: 3 })
        ));
    }

    #[test]
    fn test_rejects_bad_slots() {
        let catalog = catalog();

        let mut doc = export(&assignment(), None).unwrap();
        doc.row.as_mut().unwrap().get_mut(&0).unwrap().kind = "mystery".into();
        assert!(matches!(
            import(&doc, &catalog),
            Err(TransportError::InvalidSlot { source: ConfigError::UnknownKind(_), .. })
        ));

        let mut doc = export(&assignment(), None).unwrap();
        doc.col.as_mut().unwrap().get_mut(&2).unwrap().config = serde_json::json!({"value": 99});
        assert!(matches!(
            import(&doc, &catalog),
            Err(TransportError::InvalidSlot { index: 2, source: ConfigError::OutOfRange { .. }, .. })
        ));

        let mut doc = export(&assignment(), None).unwrap();
        doc.col.as_mut().unwrap().get_mut(&2).unwrap().config = serde_json::json!([1]);
        assert!(matches!(
            import(&doc, &catalog),
            Err(TransportError::InvalidSlot { source: ConfigError::MalformedConfig { .. }, .. })
        ));

        let mut doc = export(&assignment(), None).unwrap();
        doc.col.as_mut().unwrap().get_mut(&2).unwrap().label = "Career points per game: 30+".into();
        assert!(matches!(
            import(&doc, &catalog),
            Err(TransportError::LabelMismatch { axis: Axis::Col, index: 2, .. })
        ));
    }

    #[test]
    fn test_title_length() {
        let long = "x".repeat(TITLE_MAX_LEN + 1);
        assert!(matches!(
            export(&assignment(), Some(&long)),
            Err(TransportError::TitleTooLong { len: 41, max: 40 })
        ));
        let exact = "é".repeat(TITLE_MAX_LEN);
        assert!(export(&assignment(), Some(&exact)).is_ok());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            GridDocument::from_json("{\"row\": 5"),
            Err(TransportError::Malformed(_))
        ));
        assert!(matches!(
            GridDocument::from_json(r#"{"row": {"zero": {}}}"#),
            Err(TransportError::Malformed(_))
        ));
    }
}
