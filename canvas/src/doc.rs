//! Document model: track points, auxiliary edges, metadata, and the graph store.
//!
//! This module defines the data the editor manipulates (`TrackPoint`, `Edge`,
//! the attribute enums, `TrackMeta`) and the runtime store that owns it
//! (`TrackGraph`).
//!
//! DESIGN
//! ======
//! Points live in one `IndexMap` keyed by id: O(1) lookup for the input
//! handlers and an explicit insertion order that *is* the primary track path.
//! Nothing here ever sorts points by position.
//!
//! Edges are kept in a plain `Vec`. Removing a point never touches edges; an
//! edge whose endpoint is gone is "dangling" and consumers skip it through
//! [`TrackGraph::resolve_edge_endpoints`]. Every operation that names an
//! unknown id is a no-op rather than an error, so stale ids coming from the
//! host can never wedge the editor.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{EDGE_KEY_SEPARATOR, MIN_CIRCUIT_POINTS};

// =============================================================
// Identifiers
// =============================================================

/// Opaque, stable identifier of a track point.
///
/// Freshly created points get a UUID v4 string; imported points keep whatever
/// non-empty id the document carried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(String);

impl PointId {
    /// Wrap an existing id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, never-before-seen id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PointId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Order-independent identity of an unordered pair of point ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeKey(String);

impl EdgeKey {
    /// Derive the canonical key for the pair `(a, b)`; `(b, a)` yields the same key.
    #[must_use]
    pub fn canonical(a: &PointId, b: &PointId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{lo}{EDGE_KEY_SEPARATOR}{hi}"))
    }

    /// Wrap a key exactly as received, without re-deriving it.
    #[must_use]
    pub fn raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================
// Attribute enums
// =============================================================

/// A label that does not belong to the attribute's enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {attribute} value: {value:?}")]
pub struct UnknownLabel {
    pub attribute: &'static str,
    pub value: String,
}

/// Road surface under a waypoint.
///
/// `Other` holds a label from an imported document that is not part of the
/// enumeration; it is carried through untouched and never produced by edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Surface {
    Asphalt,
    Dirt,
    Gravel,
    Sand,
    Snow,
    Ice,
    Other(String),
}

impl Surface {
    pub const ALL: [Surface; 6] =
        [Surface::Asphalt, Surface::Dirt, Surface::Gravel, Surface::Sand, Surface::Snow, Surface::Ice];

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Asphalt => "Asphalt",
            Self::Dirt => "Dirt",
            Self::Gravel => "Gravel",
            Self::Sand => "Sand",
            Self::Snow => "Snow",
            Self::Ice => "Ice",
            Self::Other(raw) => raw,
        }
    }

    /// Whether this value is a member of the fixed enumeration.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Surface {
    fn from(raw: String) -> Self {
        Self::ALL.into_iter().find(|s| s.label() == raw).unwrap_or(Self::Other(raw))
    }
}

impl From<Surface> for String {
    fn from(s: Surface) -> Self {
        match s {
            Surface::Other(raw) => raw,
            known => known.label().to_owned(),
        }
    }
}

impl FromStr for Surface {
    type Err = UnknownLabel;

    /// Strict parse: only members of the enumeration are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.label() == s)
            .ok_or_else(|| UnknownLabel { attribute: "surface", value: s.to_owned() })
    }
}

/// Corner classification of a waypoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Corner {
    HighSpeed,
    MediumSpeed,
    LowSpeed,
    Other(String),
}

impl Corner {
    pub const ALL: [Corner; 3] = [Corner::HighSpeed, Corner::MediumSpeed, Corner::LowSpeed];

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::HighSpeed => "High speed",
            Self::MediumSpeed => "Medium speed",
            Self::LowSpeed => "Low speed",
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Corner {
    fn from(raw: String) -> Self {
        Self::ALL.into_iter().find(|c| c.label() == raw).unwrap_or(Self::Other(raw))
    }
}

impl From<Corner> for String {
    fn from(c: Corner) -> Self {
        match c {
            Corner::Other(raw) => raw,
            known => known.label().to_owned(),
        }
    }
}

impl FromStr for Corner {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.label() == s)
            .ok_or_else(|| UnknownLabel { attribute: "corner", value: s.to_owned() })
    }
}

/// Whether the track path is open or loops back to its first point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RaceType {
    #[default]
    #[serde(rename = "Point to point")]
    PointToPoint,
    #[serde(rename = "Circuit")]
    Circuit,
}

impl RaceType {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::PointToPoint => "Point to point",
            Self::Circuit => "Circuit",
        }
    }
}

impl FromStr for RaceType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Point to point" => Ok(Self::PointToPoint),
            "Circuit" => Ok(Self::Circuit),
            other => Err(UnknownLabel { attribute: "race type", value: other.to_owned() }),
        }
    }
}

// =============================================================
// Points, edges, metadata
// =============================================================

/// A waypoint on the traced track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub id: PointId,
    /// Model-space x coordinate.
    pub x: f64,
    /// Model-space y coordinate.
    pub y: f64,
    pub surface: Option<Surface>,
    pub corner: Option<Corner>,
    /// Incline in degrees.
    pub incline: f64,
}

impl TrackPoint {
    /// A point at `(x, y)` with unset surface/corner and zero incline.
    #[must_use]
    pub fn new(id: PointId, x: f64, y: f64) -> Self {
        Self { id, x, y, surface: None, corner: None, incline: 0.0 }
    }

    /// Current value of one attribute.
    #[must_use]
    pub fn attribute(&self, key: AttributeKey) -> AttributeValue {
        match key {
            AttributeKey::Surface => AttributeValue::Surface(self.surface.clone()),
            AttributeKey::Corner => AttributeValue::Corner(self.corner.clone()),
            AttributeKey::Incline => AttributeValue::Incline(self.incline),
        }
    }

    /// Overwrite exactly one attribute, leaving the others alone.
    pub fn set_attribute(&mut self, value: &AttributeValue) {
        match value {
            AttributeValue::Surface(s) => self.surface.clone_from(s),
            AttributeValue::Corner(c) => self.corner.clone_from(c),
            AttributeValue::Incline(deg) => self.incline = *deg,
        }
    }
}

/// Auxiliary undirected connection between two points, outside sequence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub key: EdgeKey,
    pub a: PointId,
    pub b: PointId,
}

impl Edge {
    /// Build an edge with its canonical key.
    #[must_use]
    pub fn between(a: PointId, b: PointId) -> Self {
        Self { key: EdgeKey::canonical(&a, &b), a, b }
    }
}

/// Which attribute an edit or display targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKey {
    Surface,
    Corner,
    Incline,
}

/// A value for one attribute; used both for display and for writes.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Surface(Option<Surface>),
    Corner(Option<Corner>),
    Incline(f64),
}

impl AttributeValue {
    #[must_use]
    pub fn key(&self) -> AttributeKey {
        match self {
            Self::Surface(_) => AttributeKey::Surface,
            Self::Corner(_) => AttributeKey::Corner,
            Self::Incline(_) => AttributeKey::Incline,
        }
    }
}

/// Track-level metadata edited alongside the points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackMeta {
    /// Real-world track length in kilometres; never negative.
    pub track_length_km: f64,
    pub race_type: RaceType,
}

impl TrackMeta {
    /// Set the track length, mapping negative or non-finite input to zero.
    pub fn set_track_length_km(&mut self, km: f64) {
        self.track_length_km = sanitize_length(km);
    }
}

/// Clamp a length to a finite non-negative value.
#[must_use]
pub fn sanitize_length(km: f64) -> f64 {
    if km.is_finite() && km > 0.0 { km } else { 0.0 }
}

// =============================================================
// TrackGraph
// =============================================================

/// Ordered point sequence plus auxiliary edge set.
#[derive(Debug, Clone, Default)]
pub struct TrackGraph {
    points: IndexMap<PointId, TrackPoint>,
    edges: Vec<Edge>,
}

impl TrackGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new point with a fresh id and default attributes.
    pub fn add_point(&mut self, x: f64, y: f64) -> TrackPoint {
        let point = TrackPoint::new(PointId::generate(), x, y);
        self.points.insert(point.id.clone(), point.clone());
        point
    }

    /// Append a fully-formed point. Returns false (and stores nothing) if the
    /// id is already present.
    pub fn insert_point(&mut self, point: TrackPoint) -> bool {
        if self.points.contains_key(&point.id) {
            return false;
        }
        self.points.insert(point.id.clone(), point);
        true
    }

    /// Reposition a point in place. Returns false for an unknown id.
    pub fn move_point(&mut self, id: &PointId, x: f64, y: f64) -> bool {
        let Some(point) = self.points.get_mut(id) else {
            return false;
        };
        point.x = x;
        point.y = y;
        true
    }

    /// Drop the last point in sequence order. Edges referencing it are kept.
    pub fn remove_last(&mut self) -> Option<TrackPoint> {
        self.points.pop().map(|(_, point)| point)
    }

    pub fn clear_points(&mut self) {
        self.points.clear();
    }

    pub fn clear_edges(&mut self) {
        self.edges.clear();
    }

    /// Move a point to `index` in the sequence (clamped to the last slot).
    /// Returns false for an unknown id.
    pub fn reorder(&mut self, id: &PointId, index: usize) -> bool {
        let Some(from) = self.points.get_index_of(id) else {
            return false;
        };
        let to = index.min(self.points.len() - 1);
        self.points.move_index(from, to);
        true
    }

    /// Set one attribute on every point whose id is in `ids`. Unknown ids are
    /// skipped. Returns the ids that were actually written.
    pub fn assign_attribute<'a, I>(&mut self, ids: I, value: &AttributeValue) -> Vec<PointId>
    where
        I: IntoIterator<Item = &'a PointId>,
    {
        let mut written = Vec::new();
        for id in ids {
            if let Some(point) = self.points.get_mut(id) {
                point.set_attribute(value);
                written.push(id.clone());
            }
        }
        written
    }

    /// Add an auxiliary edge between `a` and `b`.
    ///
    /// Idempotent on the canonical key: a second `add_edge(a, b)` or
    /// `add_edge(b, a)` returns `None` and stores nothing. Self-edges are
    /// refused the same way.
    pub fn add_edge(&mut self, a: &PointId, b: &PointId) -> Option<Edge> {
        if a == b {
            return None;
        }
        let edge = Edge::between(a.clone(), b.clone());
        if self.has_edge(&edge.key) {
            return None;
        }
        self.edges.push(edge.clone());
        Some(edge)
    }

    /// Append an edge exactly as given: no key derivation, no endpoint check.
    pub fn push_edge_unchecked(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    #[must_use]
    pub fn has_edge(&self, key: &EdgeKey) -> bool {
        self.edges.iter().any(|e| &e.key == key)
    }

    /// Look up both endpoints of `edge`; `None` when either is missing.
    #[must_use]
    pub fn resolve_edge_endpoints(&self, edge: &Edge) -> Option<(&TrackPoint, &TrackPoint)> {
        Some((self.points.get(&edge.a)?, self.points.get(&edge.b)?))
    }

    /// Edges whose endpoints both exist, paired with those endpoints.
    pub fn resolved_edges(&self) -> impl Iterator<Item = (&Edge, &TrackPoint, &TrackPoint)> {
        self.edges
            .iter()
            .filter_map(|e| self.resolve_edge_endpoints(e).map(|(a, b)| (e, a, b)))
    }

    /// Number of edges that reference a missing point.
    #[must_use]
    pub fn dangling_edge_count(&self) -> usize {
        self.edges.len() - self.resolved_edges().count()
    }

    /// Consecutive pairs along the primary path. Circuits with at least
    /// [`MIN_CIRCUIT_POINTS`] points also get the closing last-to-first pair.
    #[must_use]
    pub fn path_segments(&self, race_type: RaceType) -> Vec<(&TrackPoint, &TrackPoint)> {
        let ordered: Vec<&TrackPoint> = self.points.values().collect();
        let mut segments: Vec<(&TrackPoint, &TrackPoint)> = ordered.windows(2).map(|w| (w[0], w[1])).collect();
        if race_type == RaceType::Circuit && ordered.len() >= MIN_CIRCUIT_POINTS {
            if let (Some(last), Some(first)) = (ordered.last(), ordered.first()) {
                segments.push((*last, *first));
            }
        }
        segments
    }

    // --- Queries ---

    #[must_use]
    pub fn get(&self, id: &PointId) -> Option<&TrackPoint> {
        self.points.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &PointId) -> bool {
        self.points.contains_key(id)
    }

    /// Position of `id` in the sequence.
    #[must_use]
    pub fn index_of(&self, id: &PointId) -> Option<usize> {
        self.points.get_index_of(id)
    }

    /// Point at sequence position `index`.
    #[must_use]
    pub fn point_at(&self, index: usize) -> Option<&TrackPoint> {
        self.points.get_index(index).map(|(_, p)| p)
    }

    #[must_use]
    pub fn last(&self) -> Option<&TrackPoint> {
        self.points.last().map(|(_, p)| p)
    }

    /// Points in sequence order.
    pub fn points(&self) -> impl DoubleEndedIterator<Item = &TrackPoint> + ExactSizeIterator {
        self.points.values()
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if there are no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
