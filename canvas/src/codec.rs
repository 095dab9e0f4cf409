//! Layout document codec: encode the editor state, defensively decode untrusted input.
//!
//! DESIGN
//! ======
//! Encoding is a straight serde projection of the graph. Decoding is not:
//! documents are hand-edited, produced by older builds, or simply wrong, so
//! `decode` walks a loosely-typed `serde_json::Value` and coerces field by
//! field. Only a top-level shape problem is an error (`MalformedDocument`);
//! a bad field falls back to its default and is logged.
//!
//! Decoding is pure. It builds a fresh [`TrackGraph`] and hands it back, and
//! the engine swaps it in only on success, so a failed import can never leave
//! the in-memory model half-overwritten.

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

use crate::doc::{Corner, Edge, EdgeKey, PointId, RaceType, Surface, TrackGraph, TrackMeta, TrackPoint, sanitize_length};

/// Error returned by [`decode`] and [`decode_str`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The input is not JSON, is not an object, or has a collection of the wrong shape.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

// =============================================================
// Wire types
// =============================================================

/// Document metadata block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub track_length_km: f64,
    pub race_type: RaceType,
    /// RFC 3339 generation timestamp.
    pub created_at: String,
}

/// Self-describing snapshot of a traced layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub meta: DocumentMeta,
    pub points: Vec<TrackPoint>,
    pub edges: Vec<Edge>,
    /// Opaque reference-image payload, or `null`.
    pub image: Option<String>,
}

impl Document {
    /// Pretty-printed JSON text of this document.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialization failures.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Metadata fields present in a decoded document. Absent fields leave the
/// current in-memory metadata untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetaPatch {
    pub track_length_km: Option<f64>,
    pub race_type: Option<RaceType>,
}

impl MetaPatch {
    /// Apply present fields onto `meta`.
    pub fn apply(&self, meta: &mut TrackMeta) {
        if let Some(km) = self.track_length_km {
            meta.set_track_length_km(km);
        }
        if let Some(race_type) = self.race_type {
            meta.race_type = race_type;
        }
    }
}

/// Result of a successful decode, ready to be swapped into the engine.
#[derive(Debug, Clone, Default)]
pub struct Decoded {
    pub graph: TrackGraph,
    pub meta: MetaPatch,
    pub image: Option<String>,
    /// `meta.createdAt` as found in the document, informational only.
    pub created_at: Option<String>,
}

// =============================================================
// Encode
// =============================================================

/// Snapshot the model into a [`Document`].
///
/// Points keep sequence order. Dangling edges are left out, since every
/// consumer treats them as absent anyway.
#[must_use]
pub fn encode(graph: &TrackGraph, meta: &TrackMeta, image: Option<&str>, created_at: OffsetDateTime) -> Document {
    let created_at = created_at.format(&Rfc3339).unwrap_or_else(|e| {
        warn!(error = %e, "timestamp not representable as RFC 3339");
        String::new()
    });
    let edges: Vec<Edge> = graph.resolved_edges().map(|(edge, _, _)| edge.clone()).collect();
    let skipped = graph.edges().len() - edges.len();
    if skipped > 0 {
        debug!(skipped, "dangling edges omitted from export");
    }
    Document {
        meta: DocumentMeta { track_length_km: meta.track_length_km, race_type: meta.race_type, created_at },
        points: graph.points().cloned().collect(),
        edges,
        image: image.map(str::to_owned),
    }
}

// =============================================================
// Decode
// =============================================================

/// Parse JSON text and decode it.
///
/// # Errors
///
/// Returns [`DecodeError::MalformedDocument`] for unparseable JSON and for
/// every failure [`decode`] reports.
pub fn decode_str(raw: &str) -> Result<Decoded, DecodeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| DecodeError::MalformedDocument(format!("invalid JSON: {e}")))?;
    decode(&value)
}

/// Rebuild a model from a loosely-typed document value.
///
/// # Errors
///
/// Returns [`DecodeError::MalformedDocument`] when `raw` is not an object, or
/// when `points` / `edges` is present, truthy, and not an array.
pub fn decode(raw: &Value) -> Result<Decoded, DecodeError> {
    let Some(obj) = raw.as_object() else {
        return Err(DecodeError::MalformedDocument(format!("expected an object, got {}", json_kind(raw))));
    };

    let point_items = collection(obj, "points")?;
    let edge_items = collection(obj, "edges")?;

    let mut graph = TrackGraph::new();
    let mut seen: HashSet<PointId> = HashSet::new();
    for (index, item) in point_items.iter().enumerate() {
        let Some(fields) = item.as_object() else {
            warn!(index, kind = json_kind(item), "skipping non-object point");
            continue;
        };
        let point = decode_point(fields, &mut seen);
        graph.insert_point(point);
    }

    for (index, item) in edge_items.iter().enumerate() {
        let Some(fields) = item.as_object() else {
            warn!(index, kind = json_kind(item), "skipping non-object edge");
            continue;
        };
        graph.push_edge_unchecked(Edge {
            key: EdgeKey::raw(coerce_string(fields.get("key"))),
            a: PointId::new(coerce_string(fields.get("a"))),
            b: PointId::new(coerce_string(fields.get("b"))),
        });
    }

    let (meta, created_at) = decode_meta(obj.get("meta"));
    let image = match obj.get("image") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            warn!(kind = json_kind(other), "ignoring non-string image payload");
            None
        }
    };

    debug!(
        points = graph.len(),
        edges = graph.edges().len(),
        dangling = graph.dangling_edge_count(),
        "document decoded"
    );
    Ok(Decoded { graph, meta, image, created_at })
}

/// Items of an optional array field. Absent or falsy means empty; any other
/// non-array value is a shape error.
fn collection<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a [Value], DecodeError> {
    match obj.get(field) {
        Some(Value::Array(items)) => Ok(items),
        None => Ok(&[]),
        Some(v) if is_falsy(v) => Ok(&[]),
        Some(v) => Err(DecodeError::MalformedDocument(format!("`{field}` must be an array, got {}", json_kind(v)))),
    }
}

fn decode_point(fields: &Map<String, Value>, seen: &mut HashSet<PointId>) -> TrackPoint {
    let id = match fields.get("id").and_then(id_from_value) {
        Some(id) if !seen.contains(&id) => id,
        Some(dup) => {
            warn!(id = %dup, "duplicate point id; generating a fresh one");
            PointId::generate()
        }
        None => PointId::generate(),
    };
    seen.insert(id.clone());

    TrackPoint {
        id,
        x: coerce_f64(fields.get("x")),
        y: coerce_f64(fields.get("y")),
        surface: label_from_value(fields.get("surface")).map(Surface::from),
        corner: label_from_value(fields.get("corner")).map(Corner::from),
        incline: coerce_f64(fields.get("incline")),
    }
}

fn decode_meta(meta: Option<&Value>) -> (MetaPatch, Option<String>) {
    let Some(fields) = meta.and_then(Value::as_object) else {
        return (MetaPatch::default(), None);
    };

    let track_length_km = match fields.get("trackLengthKm") {
        None | Some(Value::Null) => None,
        value => Some(sanitize_length(coerce_f64(value))),
    };
    let race_type = match fields.get("raceType") {
        Some(Value::String(label)) => match label.parse::<RaceType>() {
            Ok(race_type) => Some(race_type),
            Err(e) => {
                warn!(error = %e, "ignoring race type");
                None
            }
        },
        _ => None,
    };
    let created_at = fields.get("createdAt").and_then(Value::as_str).map(str::to_owned);

    (MetaPatch { track_length_km, race_type }, created_at)
}

// =============================================================
// Coercion helpers
// =============================================================

/// Truthy id values are kept; falsy ones (missing, null, "", 0, false) are not.
fn id_from_value(value: &Value) -> Option<PointId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(PointId::new(s.as_str())),
        Value::Number(n) if n.as_f64().is_some_and(|v| v != 0.0 && v.is_finite()) => Some(PointId::new(n.to_string())),
        _ => None,
    }
}

/// Numeric coercion with "invalid becomes 0".
fn coerce_f64(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                match trimmed.parse::<f64>() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        debug!(raw = trimmed, error = %e, "non-numeric field coerced to 0");
                        None
                    }
                }
            }
        }
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Attribute labels pass through verbatim; null, missing, empty, and
/// structured values mean unset.
fn label_from_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Edge fields are copied as strings; anything else becomes empty, which
/// never resolves to a point.
fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_none_or(|v| v == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
