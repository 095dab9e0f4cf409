//! Hit-testing pointer positions against waypoint markers.
//!
//! Browser hosts usually know the marker under the pointer from the DOM event
//! target and pass it straight to the engine. Hosts without a retained scene
//! (the headless replay driver, a raw canvas) resolve it here instead.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Affine, Camera, Point};
use crate::doc::{PointId, TrackGraph};

/// Closest marker within `radius` (model units) of `model_pt`.
///
/// On equal distance the later point in sequence wins, since it is drawn on top.
#[must_use]
pub fn marker_at(graph: &TrackGraph, model_pt: Point, radius: f64) -> Option<PointId> {
    let mut best: Option<(f64, &PointId)> = None;
    for point in graph.points().rev() {
        let dist = model_pt.distance(Point::new(point.x, point.y));
        if dist > radius {
            continue;
        }
        if best.is_none_or(|(d, _)| dist < d) {
            best = Some((dist, &point.id));
        }
    }
    best.map(|(_, id)| id.clone())
}

/// Convert a device-pixel hit radius into model units, through the mounted
/// `viewport` and then the `camera`.
///
/// Without a mounted surface, or with a degenerate viewport, device and
/// model units coincide.
#[must_use]
pub fn marker_radius(viewport: Option<&Affine>, camera: &Camera, radius_px: f64) -> f64 {
    match viewport.map(Affine::scale_factor) {
        Some(scale) if scale.is_finite() && scale > f64::EPSILON => {
            let radius = camera.screen_dist_to_world(radius_px / scale);
            if radius.is_finite() { radius } else { radius_px }
        }
        _ => radius_px,
    }
}
