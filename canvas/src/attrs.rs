//! Attribute edits over the current selection.
//!
//! Edit controls show a single value per attribute even when several points
//! are selected. That value comes from the first selected point (selection
//! insertion order) and is purely a display convenience. Committing a value
//! is a broadcast write: every selected point receives it, overwriting
//! whatever each one held before.

#[cfg(test)]
#[path = "attrs_test.rs"]
mod attrs_test;

use crate::doc::{AttributeKey, AttributeValue, Corner, PointId, Surface, TrackGraph, UnknownLabel};
use crate::input::Selection;

/// Error from turning raw control input into an attribute value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttributeError {
    /// The label is not a member of the attribute's enumeration.
    #[error(transparent)]
    UnknownValue(#[from] UnknownLabel),
    /// Incline must be a finite number of degrees.
    #[error("incline must be a finite number, got {0:?}")]
    InvalidIncline(String),
}

/// Value shown in the editor for `key`: the first selected point that still
/// exists. `None` when nothing (live) is selected.
#[must_use]
pub fn representative(graph: &TrackGraph, selection: &Selection, key: AttributeKey) -> Option<AttributeValue> {
    selection
        .iter()
        .find_map(|id| graph.get(id))
        .map(|point| point.attribute(key))
}

/// Write `value` to every selected point. Returns the ids written.
pub fn broadcast(graph: &mut TrackGraph, selection: &Selection, value: &AttributeValue) -> Vec<PointId> {
    graph.assign_attribute(selection.iter(), value)
}

/// Parse raw control input for `key`.
///
/// An empty string clears surface/corner and means zero incline. Labels
/// outside the fixed enumerations are rejected here, at assignment time.
///
/// # Errors
///
/// Returns [`AttributeError::UnknownValue`] for a label that is not in the
/// enumeration and [`AttributeError::InvalidIncline`] for non-numeric or
/// non-finite incline input.
pub fn parse_control_value(key: AttributeKey, raw: &str) -> Result<AttributeValue, AttributeError> {
    let raw = raw.trim();
    match key {
        AttributeKey::Surface if raw.is_empty() => Ok(AttributeValue::Surface(None)),
        AttributeKey::Surface => Ok(AttributeValue::Surface(Some(raw.parse::<Surface>()?))),
        AttributeKey::Corner if raw.is_empty() => Ok(AttributeValue::Corner(None)),
        AttributeKey::Corner => Ok(AttributeValue::Corner(Some(raw.parse::<Corner>()?))),
        AttributeKey::Incline if raw.is_empty() => Ok(AttributeValue::Incline(0.0)),
        AttributeKey::Incline => match raw.parse::<f64>() {
            Ok(deg) if deg.is_finite() => Ok(AttributeValue::Incline(deg)),
            _ => Err(AttributeError::InvalidIncline(raw.to_owned())),
        },
    }
}

/// Check a typed value before it is committed: enum values must be members of
/// their enumeration and incline must be finite.
///
/// # Errors
///
/// Same variants as [`parse_control_value`].
pub fn validate(value: &AttributeValue) -> Result<(), AttributeError> {
    match value {
        AttributeValue::Surface(Some(s)) if !s.is_known() => {
            Err(UnknownLabel { attribute: "surface", value: s.label().to_owned() }.into())
        }
        AttributeValue::Corner(Some(c)) if !c.is_known() => {
            Err(UnknownLabel { attribute: "corner", value: c.label().to_owned() }.into())
        }
        AttributeValue::Incline(deg) if !deg.is_finite() => Err(AttributeError::InvalidIncline(deg.to_string())),
        _ => Ok(()),
    }
}
