//! Coordinate spaces: device (pointer) space and model (document) space.
//!
//! The drawing surface applies some affine transform to the model when it
//! paints it: pan and zoom from the [`Camera`], plus whatever viewport scaling
//! the host layout introduces. Pointer events arrive in device space, so every
//! position the engine stores must first go through [`to_model_space`], which
//! inverts that transform. When no surface is mounted the device point is used
//! as-is.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ZOOM, MIN_ZOOM};

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// A point in either device or model space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A 2-D affine transform in the SVG/DOM matrix convention.
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Self = Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    /// Uniform scale followed by a translation.
    #[must_use]
    pub fn scale_translate(scale: f64, tx: f64, ty: f64) -> Self {
        Self { a: scale, b: 0.0, c: 0.0, d: scale, e: tx, f: ty }
    }

    /// Map a point through this transform.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    /// `self * rhs`: the result applies `rhs` first, then `self`.
    #[must_use]
    pub fn multiply(&self, rhs: &Affine) -> Affine {
        Affine {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            e: self.a * rhs.e + self.c * rhs.f + self.e,
            f: self.b * rhs.e + self.d * rhs.f + self.f,
        }
    }

    /// Inverse transform, or `None` when the matrix is singular or not finite.
    #[must_use]
    pub fn invert(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let inv = Affine {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        };
        inv.is_finite().then_some(inv)
    }

    /// Uniform scale this transform applies to lengths (square root of |det|).
    #[must_use]
    pub fn scale_factor(&self) -> f64 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }

    fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.e, self.f].iter().all(|v| v.is_finite())
    }
}

/// Camera state for pan/zoom over the reference image.
///
/// `pan_x` / `pan_y` are in viewport pixels, before the mounted surface's
/// own transform is applied.
/// `zoom` is a scale factor (1.0 = no zoom).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a device-space point to model coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a model-space point to device coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.pan_x,
            y: world.y * self.zoom + self.pan_y,
        }
    }

    /// Convert a device-space distance (pixels) to model-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// The model-to-device transform this camera applies.
    #[must_use]
    pub fn to_affine(&self) -> Affine {
        Affine::scale_translate(self.zoom, self.pan_x, self.pan_y)
    }

    /// Multiply zoom by `factor` while keeping `anchor` (device space) over
    /// the same model point. Zoom is clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let world = self.screen_to_world(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let drifted = self.world_to_screen(world);
        self.pan_x += anchor.x - drifted.x;
        self.pan_y += anchor.y - drifted.y;
    }
}

/// Map a device-space point into model space by inverting the surface's
/// current model-to-device transform.
///
/// `surface` is `None` while the drawing surface is not mounted. In that case,
/// and when the transform cannot be inverted, the device point is returned
/// unchanged.
#[must_use]
pub fn to_model_space(surface: Option<&Affine>, device: Point) -> Point {
    match surface.and_then(Affine::invert) {
        Some(inverse) => inverse.apply(device),
        None => device,
    }
}
