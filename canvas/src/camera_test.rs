#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// --- Point ---

#[test]
fn point_distance() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(3.0, 4.0);
    assert!(approx_eq(a.distance(b), 5.0));
    assert!(approx_eq(b.distance(a), 5.0));
}

#[test]
fn point_default_is_origin() {
    assert_eq!(Point::default(), Point::new(0.0, 0.0));
}

// --- Camera ---

#[test]
fn camera_default_is_identity() {
    let cam = Camera::default();
    assert_eq!(cam.pan_x, 0.0);
    assert_eq!(cam.pan_y, 0.0);
    assert_eq!(cam.zoom, 1.0);
}

#[test]
fn screen_to_world_with_pan_and_zoom() {
    let cam = Camera { pan_x: 20.0, pan_y: 10.0, zoom: 2.0 };
    // (20-20)/2 = 0, (10-10)/2 = 0
    let world = cam.screen_to_world(Point::new(20.0, 10.0));
    assert!(point_approx_eq(world, Point::new(0.0, 0.0)));
}

#[test]
fn screen_to_world_origin() {
    let cam = Camera { pan_x: 50.0, pan_y: 30.0, zoom: 2.0 };
    let world = cam.screen_to_world(Point::new(0.0, 0.0));
    assert!(approx_eq(world.x, -25.0));
    assert!(approx_eq(world.y, -15.0));
}

#[test]
fn world_to_screen_with_pan_and_zoom() {
    let cam = Camera { pan_x: 20.0, pan_y: 10.0, zoom: 3.0 };
    let screen = cam.world_to_screen(Point::new(5.0, 5.0));
    // 5*3 + 20 = 35, 5*3 + 10 = 25
    assert!(approx_eq(screen.x, 35.0));
    assert!(approx_eq(screen.y, 25.0));
}

#[test]
fn camera_round_trip_fractional_zoom() {
    let cam = Camera { pan_x: 13.7, pan_y: -42.3, zoom: 0.75 };
    let world = Point::new(333.3, -999.9);
    let back = cam.screen_to_world(cam.world_to_screen(world));
    assert!(point_approx_eq(world, back));
}

#[test]
fn screen_dist_to_world_ignores_pan() {
    let cam = Camera { pan_x: 999.0, pan_y: -999.0, zoom: 4.0 };
    assert!(approx_eq(cam.screen_dist_to_world(8.0), 2.0));
}

#[test]
fn camera_affine_matches_world_to_screen() {
    let cam = Camera { pan_x: 7.0, pan_y: -3.0, zoom: 1.5 };
    let world = Point::new(12.0, 40.0);
    assert!(point_approx_eq(cam.to_affine().apply(world), cam.world_to_screen(world)));
}

#[test]
fn zoom_at_keeps_anchor_fixed() {
    let mut cam = Camera { pan_x: 30.0, pan_y: 10.0, zoom: 1.0 };
    let anchor = Point::new(200.0, 150.0);
    let before = cam.screen_to_world(anchor);
    cam.zoom_at(anchor, 2.0);
    assert!(approx_eq(cam.zoom, 2.0));
    assert!(point_approx_eq(cam.screen_to_world(anchor), before));
}

#[test]
fn zoom_at_clamps_to_limits() {
    let mut cam = Camera::default();
    cam.zoom_at(Point::new(0.0, 0.0), 1000.0);
    assert_eq!(cam.zoom, MAX_ZOOM);
    cam.zoom_at(Point::new(0.0, 0.0), 1e-9);
    assert_eq!(cam.zoom, MIN_ZOOM);
}

#[test]
fn zoom_at_ignores_non_positive_factor() {
    let mut cam = Camera { pan_x: 1.0, pan_y: 2.0, zoom: 3.0 };
    cam.zoom_at(Point::new(5.0, 5.0), 0.0);
    cam.zoom_at(Point::new(5.0, 5.0), -2.0);
    cam.zoom_at(Point::new(5.0, 5.0), f64::NAN);
    assert_eq!(cam, Camera { pan_x: 1.0, pan_y: 2.0, zoom: 3.0 });
}

// --- Affine ---

#[test]
fn affine_identity_apply_is_noop() {
    let p = Point::new(-4.5, 9.25);
    assert_eq!(Affine::IDENTITY.apply(p), p);
}

#[test]
fn affine_invert_round_trip() {
    let m = Affine { a: 2.0, b: 0.5, c: -0.25, d: 1.5, e: 30.0, f: -12.0 };
    let inv = m.invert().unwrap();
    let p = Point::new(17.0, -3.0);
    assert!(point_approx_eq(inv.apply(m.apply(p)), p));
    assert!(point_approx_eq(m.apply(inv.apply(p)), p));
}

#[test]
fn affine_invert_singular_is_none() {
    let m = Affine { a: 1.0, b: 2.0, c: 2.0, d: 4.0, e: 0.0, f: 0.0 };
    assert!(m.invert().is_none());
    assert!(Affine::scale_translate(0.0, 5.0, 5.0).invert().is_none());
}

#[test]
fn affine_invert_non_finite_is_none() {
    let m = Affine { a: f64::NAN, ..Affine::IDENTITY };
    assert!(m.invert().is_none());
}

#[test]
fn affine_multiply_applies_rhs_first() {
    let scale = Affine::scale_translate(2.0, 0.0, 0.0);
    let shift = Affine::scale_translate(1.0, 10.0, 0.0);
    // shift first, then scale: (1 + 10) * 2 = 22
    let p = scale.multiply(&shift).apply(Point::new(1.0, 0.0));
    assert!(approx_eq(p.x, 22.0));
    // scale first, then shift: 1 * 2 + 10 = 12
    let q = shift.multiply(&scale).apply(Point::new(1.0, 0.0));
    assert!(approx_eq(q.x, 12.0));
}

#[test]
fn affine_scale_factor() {
    assert!(approx_eq(Affine::scale_translate(3.0, 10.0, 10.0).scale_factor(), 3.0));
    assert!(approx_eq(Affine::IDENTITY.scale_factor(), 1.0));
}

// --- to_model_space ---

#[test]
fn to_model_space_passes_through_without_surface() {
    let p = Point::new(123.0, 456.0);
    assert_eq!(to_model_space(None, p), p);
}

#[test]
fn to_model_space_passes_through_on_singular_surface() {
    let singular = Affine::scale_translate(0.0, 1.0, 1.0);
    let p = Point::new(3.0, 4.0);
    assert_eq!(to_model_space(Some(&singular), p), p);
}

#[test]
fn to_model_space_inverts_camera_transform() {
    let cam = Camera { pan_x: 100.0, pan_y: 50.0, zoom: 2.0 };
    let ctm = cam.to_affine();
    let model = to_model_space(Some(&ctm), Point::new(140.0, 90.0));
    assert!(point_approx_eq(model, Point::new(20.0, 20.0)));
    assert!(point_approx_eq(model, cam.screen_to_world(Point::new(140.0, 90.0))));
}

#[test]
fn to_model_space_inverts_viewport_scaling_and_camera() {
    // Surface letterboxes a 1000-unit viewBox into 500 device pixels.
    let viewport = Affine::scale_translate(0.5, 0.0, 0.0);
    let cam = Camera { pan_x: 10.0, pan_y: 0.0, zoom: 4.0 };
    let ctm = viewport.multiply(&cam.to_affine());
    let model = Point::new(7.0, 3.0);
    let device = ctm.apply(model);
    assert!(point_approx_eq(to_model_space(Some(&ctm), device), model));
}
