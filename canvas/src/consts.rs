//! Shared constants for the canvas crate.

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space radius in pixels within which a pointer counts as "on" a marker.
pub const MARKER_HIT_RADIUS_PX: f64 = 8.0;

// ── Camera ──────────────────────────────────────────────────────

/// Smallest allowed camera zoom factor.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest allowed camera zoom factor.
pub const MAX_ZOOM: f64 = 10.0;

// ── Editing ─────────────────────────────────────────────────────

/// Key name (as reported by the browser) that removes the last waypoint.
pub const DEFAULT_UNDO_KEY: &str = "Backspace";

/// Key name that abandons a pending connect-mode endpoint.
pub const CANCEL_KEY: &str = "Escape";

// ── Documents ───────────────────────────────────────────────────

/// File name used for exported layout documents.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "track-layout.json";

/// Separator between the two ids inside a canonical edge key.
pub const EDGE_KEY_SEPARATOR: &str = "::";

/// Minimum number of points before a circuit's closing segment is drawn.
pub const MIN_CIRCUIT_POINTS: usize = 3;
