//! Scene description: what the drawing surface should paint.
//!
//! The engine does not draw. It hands the host a [`Scene`] built from
//! read-only views of the graph, metadata, and UI state; the host maps it
//! onto SVG, a 2D context, or whatever it renders with. Dangling edges never
//! reach the scene.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use serde::Serialize;

use crate::camera::Point;
use crate::consts::MIN_CIRCUIT_POINTS;
use crate::doc::{EdgeKey, PointId, RaceType, TrackGraph, TrackMeta, TrackPoint};
use crate::input::UiState;

/// A waypoint marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub id: PointId,
    /// Position in sequence order, for labelling.
    pub index: usize,
    pub at: Point,
    pub selected: bool,
    /// This marker is the pending connect-mode endpoint.
    pub pending: bool,
}

/// One segment of the primary track polyline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentView {
    pub from: Point,
    pub to: Point,
    /// The last-to-first segment of a circuit.
    pub closing: bool,
}

/// A resolved auxiliary edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeView {
    pub key: EdgeKey,
    pub from: Point,
    pub to: Point,
}

/// Everything the surface needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub markers: Vec<MarkerView>,
    pub path: Vec<SegmentView>,
    pub edges: Vec<EdgeView>,
    pub connect_mode: bool,
}

fn at(p: &TrackPoint) -> Point {
    Point::new(p.x, p.y)
}

/// Build the scene for the current state.
#[must_use]
pub fn build_scene(graph: &TrackGraph, meta: &TrackMeta, ui: &UiState) -> Scene {
    let pending = ui.interaction.pending();
    let markers = graph
        .points()
        .enumerate()
        .map(|(index, p)| MarkerView {
            id: p.id.clone(),
            index,
            at: at(p),
            selected: ui.selection.contains(&p.id),
            pending: pending == Some(&p.id),
        })
        .collect();

    let segments = graph.path_segments(meta.race_type);
    let last = segments.len().saturating_sub(1);
    let closes = meta.race_type == RaceType::Circuit && graph.len() >= MIN_CIRCUIT_POINTS;
    let path = segments
        .iter()
        .enumerate()
        .map(|(i, (from, to))| SegmentView { from: at(from), to: at(to), closing: closes && i == last })
        .collect();

    let edges = graph
        .resolved_edges()
        .map(|(edge, a, b)| EdgeView { key: edge.key.clone(), from: at(a), to: at(b) })
        .collect();

    Scene { markers, path, edges, connect_mode: ui.interaction.is_connect_mode() }
}
