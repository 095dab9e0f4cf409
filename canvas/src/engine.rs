//! The editor engine: owns the model and UI state, turns input into mutations.
//!
//! DESIGN
//! ======
//! Every handler takes device-space input, runs it through
//! [`to_model_space`], advances the [`Interaction`] state machine, and returns
//! the list of [`Action`]s the host should react to (repaint, show a notice,
//! mirror a mutation elsewhere). The engine never draws and never touches the
//! file system; hosts call [`Engine::scene`] to paint and hand file contents
//! back through the read-ticket API.
//!
//! File reads are the only asynchronous boundary. A read starts with
//! [`Engine::begin_read`], which issues a [`ReadTicket`] for its slot. When a
//! completion arrives with anything but the newest ticket for that slot it is
//! dropped, so the most recently requested file wins regardless of which read
//! finishes last.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::attrs::{self, AttributeError};
use crate::camera::{Affine, Camera, Point, to_model_space};
use crate::codec::{self, Decoded, Document};
use crate::consts::{CANCEL_KEY, DEFAULT_EXPORT_FILE_NAME, DEFAULT_UNDO_KEY, MARKER_HIT_RADIUS_PX};
use crate::doc::{AttributeKey, AttributeValue, Edge, PointId, RaceType, TrackGraph, TrackMeta, TrackPoint};
use crate::hit;
use crate::input::{Interaction, Key, Modifiers, UiState};
use crate::render::{self, Scene};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    PointCreated(TrackPoint),
    PointMoved { id: PointId, x: f64, y: f64 },
    PointRemoved(TrackPoint),
    PointsCleared,
    EdgeCreated(Edge),
    EdgesCleared,
    AttributeAssigned { ids: Vec<PointId>, value: AttributeValue },
    SelectionChanged(Vec<PointId>),
    ConnectModeChanged(bool),
    MetaChanged(TrackMeta),
    ImageChanged,
    /// The whole model was replaced by an import.
    DocumentLoaded,
    Notice(Notice),
    RenderNeeded,
}

/// Whether a notice reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// A single user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, message: message.into() }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Failure, message: message.into() }
    }
}

/// Error returned by [`Engine::export`] and [`Engine::export_file`].
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export: the layout has no points")]
    Empty,
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A serialized document ready to be written out by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub contents: String,
}

/// Host-tunable engine behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Key name that removes the last point.
    pub undo_key: String,
    /// File name suggested for exported documents.
    pub export_file_name: String,
    /// Marker hit radius in device pixels.
    pub hit_radius_px: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            undo_key: DEFAULT_UNDO_KEY.to_owned(),
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_owned(),
            hit_radius_px: MARKER_HIT_RADIUS_PX,
        }
    }
}

// =============================================================
// Read tickets
// =============================================================

/// Which file read a ticket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadSlot {
    Document,
    Image,
}

/// Token identifying one requested file read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadTicket {
    slot: ReadSlot,
    seq: u64,
}

impl ReadTicket {
    #[must_use]
    pub fn slot(self) -> ReadSlot {
        self.slot
    }
}

#[derive(Debug, Default)]
struct ReadTickets {
    issued: u64,
    document: Option<u64>,
    image: Option<u64>,
}

impl ReadTickets {
    fn latest_mut(&mut self, slot: ReadSlot) -> &mut Option<u64> {
        match slot {
            ReadSlot::Document => &mut self.document,
            ReadSlot::Image => &mut self.image,
        }
    }

    fn issue(&mut self, slot: ReadSlot) -> ReadTicket {
        self.issued += 1;
        let seq = self.issued;
        *self.latest_mut(slot) = Some(seq);
        ReadTicket { slot, seq }
    }

    /// Consume `ticket` if it is the newest one for its slot.
    fn redeem(&mut self, ticket: ReadTicket) -> bool {
        let latest = self.latest_mut(ticket.slot);
        if *latest == Some(ticket.seq) {
            *latest = None;
            true
        } else {
            false
        }
    }
}

// =============================================================
// Engine
// =============================================================

/// Editor state: model, metadata, reference image, and UI state machine.
#[derive(Debug, Default)]
pub struct Engine {
    pub graph: TrackGraph,
    pub meta: TrackMeta,
    pub image: Option<String>,
    pub ui: UiState,
    pub camera: Camera,
    /// Viewport transform of the mounted surface; `None` while unmounted.
    surface: Option<Affine>,
    settings: EngineSettings,
    reads: ReadTickets,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(settings: EngineSettings) -> Self {
        Self { settings, ..Self::default() }
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // --- Surface ---

    /// Attach the drawing surface. `viewport` maps camera space to device pixels.
    pub fn mount_surface(&mut self, viewport: Affine) {
        self.surface = Some(viewport);
    }

    pub fn unmount_surface(&mut self) {
        self.surface = None;
    }

    /// Full model-to-device transform, or `None` while no surface is mounted.
    #[must_use]
    pub fn device_transform(&self) -> Option<Affine> {
        self.surface.map(|viewport| viewport.multiply(&self.camera.to_affine()))
    }

    /// Map a device point into model space.
    #[must_use]
    pub fn to_model(&self, device_pt: Point) -> Point {
        to_model_space(self.device_transform().as_ref(), device_pt)
    }

    /// Marker under a device-space point, if any.
    #[must_use]
    pub fn marker_at_device(&self, device_pt: Point) -> Option<PointId> {
        let radius = hit::marker_radius(self.surface.as_ref(), &self.camera, self.settings.hit_radius_px);
        hit::marker_at(&self.graph, self.to_model(device_pt), radius)
    }

    /// Map a device point into camera space, the space inside the mounted
    /// viewport. Unmounted, device and camera space coincide.
    fn to_camera_space(&self, device_pt: Point) -> Point {
        to_model_space(self.surface.as_ref(), device_pt)
    }

    /// Zoom around a device-space anchor.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) -> Vec<Action> {
        let anchor = self.to_camera_space(anchor);
        self.camera.zoom_at(anchor, factor);
        vec![Action::RenderNeeded]
    }

    /// Pan by a device-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        let origin = self.to_camera_space(Point::new(0.0, 0.0));
        let moved = self.to_camera_space(Point::new(dx, dy));
        self.camera.pan_x += moved.x - origin.x;
        self.camera.pan_y += moved.y - origin.y;
        vec![Action::RenderNeeded]
    }

    // --- Pointer input ---

    /// Pointer pressed anywhere on the surface; `marker` is the marker under
    /// the pointer, if the host resolved one.
    pub fn on_pointer_down(&mut self, device_pt: Point, marker: Option<&PointId>) -> Vec<Action> {
        self.ui.suppress_canvas_click = false;
        match marker {
            Some(id) => self.on_marker_down(id, device_pt),
            None => Vec::new(),
        }
    }

    /// Press on a marker. Starts a drag in normal mode.
    pub fn on_marker_down(&mut self, id: &PointId, _device_pt: Point) -> Vec<Action> {
        self.ui.suppress_canvas_click = false;
        if self.ui.interaction.is_connect_mode() || !self.graph.contains(id) {
            return Vec::new();
        }
        self.ui.interaction = Interaction::Dragging { id: id.clone(), moved: false };
        Vec::new()
    }

    /// Pointer moved. Repositions the dragged point, if any.
    pub fn on_pointer_move(&mut self, device_pt: Point) -> Vec<Action> {
        let p = self.to_model(device_pt);
        let Interaction::Dragging { id, moved } = &mut self.ui.interaction else {
            return Vec::new();
        };
        if !self.graph.move_point(id, p.x, p.y) {
            return Vec::new();
        }
        *moved = true;
        vec![Action::PointMoved { id: id.clone(), x: p.x, y: p.y }, Action::RenderNeeded]
    }

    /// Pointer released. Ends a drag; if the point moved, the click the
    /// release produces over empty canvas is swallowed.
    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        if let Interaction::Dragging { id, moved } = &self.ui.interaction {
            let moved = *moved;
            debug!(point = %id, moved, "drag ended");
            self.ui.interaction = Interaction::Idle;
            self.ui.suppress_canvas_click = moved;
        }
        Vec::new()
    }

    /// Pointer left the surface. Ends a drag without arming click suppression.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        if self.ui.interaction.is_dragging() {
            self.ui.interaction = Interaction::Idle;
        }
        Vec::new()
    }

    /// Click on empty canvas: append a point and select it exclusively.
    pub fn on_canvas_click(&mut self, device_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        if std::mem::take(&mut self.ui.suppress_canvas_click) {
            debug!("canvas click after drag suppressed");
            return Vec::new();
        }
        if self.ui.interaction.is_dragging() {
            return Vec::new();
        }
        let p = self.to_model(device_pt);
        let point = self.graph.add_point(p.x, p.y);
        self.ui.selection.select_only(point.id.clone());
        vec![
            Action::PointCreated(point),
            Action::SelectionChanged(self.ui.selection.to_vec()),
            Action::RenderNeeded,
        ]
    }

    /// Click on a marker: selection in normal mode, edge building in connect mode.
    pub fn on_marker_click(&mut self, id: &PointId, modifiers: Modifiers) -> Vec<Action> {
        if !self.graph.contains(id) {
            debug!(point = %id, "click on unknown marker ignored");
            return Vec::new();
        }
        match &self.ui.interaction {
            Interaction::Idle | Interaction::Dragging { .. } => {
                if modifiers.is_multi_select() {
                    self.ui.selection.toggle(id.clone());
                } else {
                    self.ui.selection.select_only(id.clone());
                }
                self.selection_changed()
            }
            Interaction::ConnectIdle => {
                self.ui.interaction = Interaction::ConnectPending { from: id.clone() };
                self.ui.selection.select_only(id.clone());
                self.selection_changed()
            }
            Interaction::ConnectPending { from } if from == id => {
                self.ui.interaction = Interaction::ConnectIdle;
                vec![Action::RenderNeeded]
            }
            Interaction::ConnectPending { from } => {
                let from = from.clone();
                self.ui.interaction = Interaction::ConnectIdle;
                self.ui.selection.select_only(id.clone());
                let mut actions = Vec::new();
                if let Some(edge) = self.graph.add_edge(&from, id) {
                    info!(key = edge.key.as_str(), "edge created");
                    actions.push(Action::EdgeCreated(edge));
                }
                actions.extend(self.selection_changed());
                actions
            }
        }
    }

    // --- Keyboard ---

    /// Key pressed. `text_focus` is true while a text-editing control owns
    /// the keyboard; shortcuts are ignored then.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, text_focus: bool) -> Vec<Action> {
        if text_focus {
            return Vec::new();
        }
        if key.is(&self.settings.undo_key) && !modifiers.is_command() {
            return self.undo();
        }
        if key.is(CANCEL_KEY) && self.ui.interaction.pending().is_some() {
            self.ui.interaction = Interaction::ConnectIdle;
            return vec![Action::RenderNeeded];
        }
        Vec::new()
    }

    /// Remove the last point and clear the selection.
    pub fn undo(&mut self) -> Vec<Action> {
        let removed = self.graph.remove_last();
        self.ui.selection.clear();
        let mut actions = Vec::new();
        if let Some(point) = removed {
            self.forget_interaction_target(&point.id);
            debug!(point = %point.id, "last point removed");
            actions.push(Action::PointRemoved(point));
        }
        actions.push(Action::SelectionChanged(Vec::new()));
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Controls ---

    /// Enter or leave connect mode. Any pending endpoint or drag is discarded.
    pub fn set_connect_mode(&mut self, on: bool) -> Vec<Action> {
        self.ui.interaction = Interaction::resting(on);
        vec![Action::ConnectModeChanged(on), Action::RenderNeeded]
    }

    #[must_use]
    pub fn connect_mode(&self) -> bool {
        self.ui.interaction.is_connect_mode()
    }

    /// Value the editor control for `key` should display.
    #[must_use]
    pub fn attribute_display(&self, key: AttributeKey) -> Option<AttributeValue> {
        attrs::representative(&self.graph, &self.ui.selection, key)
    }

    /// Write `value` to every selected point.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError`] for a label outside the enumeration or a
    /// non-finite incline; nothing is written in that case.
    pub fn commit_attribute(&mut self, value: AttributeValue) -> Result<Vec<Action>, AttributeError> {
        attrs::validate(&value)?;
        let ids = attrs::broadcast(&mut self.graph, &self.ui.selection, &value);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Action::AttributeAssigned { ids, value }, Action::RenderNeeded])
    }

    /// Parse raw control input for `key` and commit it.
    ///
    /// # Errors
    ///
    /// See [`attrs::parse_control_value`].
    pub fn commit_attribute_input(&mut self, key: AttributeKey, raw: &str) -> Result<Vec<Action>, AttributeError> {
        let value = attrs::parse_control_value(key, raw)?;
        self.commit_attribute(value)
    }

    pub fn set_track_length_km(&mut self, km: f64) -> Vec<Action> {
        self.meta.set_track_length_km(km);
        vec![Action::MetaChanged(self.meta)]
    }

    pub fn set_race_type(&mut self, race_type: RaceType) -> Vec<Action> {
        self.meta.race_type = race_type;
        vec![Action::MetaChanged(self.meta), Action::RenderNeeded]
    }

    /// Replace the reference image payload.
    pub fn set_image(&mut self, payload: Option<String>) -> Vec<Action> {
        self.image = payload;
        vec![Action::ImageChanged, Action::RenderNeeded]
    }

    /// Move `id` to `index` in the sequence.
    pub fn reorder_point(&mut self, id: &PointId, index: usize) -> Vec<Action> {
        if self.graph.reorder(id, index) {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    /// Drop every point. Edges stay and become dangling.
    pub fn clear_points(&mut self) -> Vec<Action> {
        self.graph.clear_points();
        self.ui.selection.clear();
        self.ui.interaction = Interaction::resting(self.connect_mode());
        vec![Action::PointsCleared, Action::SelectionChanged(Vec::new()), Action::RenderNeeded]
    }

    pub fn clear_edges(&mut self) -> Vec<Action> {
        self.graph.clear_edges();
        vec![Action::EdgesCleared, Action::RenderNeeded]
    }

    // --- Import / export ---

    /// Snapshot the current state as a [`Document`] stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Empty`] when there are no points.
    pub fn export(&self, now: OffsetDateTime) -> Result<Document, ExportError> {
        if self.graph.is_empty() {
            return Err(ExportError::Empty);
        }
        Ok(codec::encode(&self.graph, &self.meta, self.image.as_deref(), now))
    }

    /// Serialize the current state into a downloadable file.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Empty`] when there are no points, or
    /// [`ExportError::Serialize`] if JSON encoding fails.
    pub fn export_file(&self) -> Result<ExportedFile, ExportError> {
        let document = self.export(OffsetDateTime::now_utc())?;
        let contents = document.to_json_pretty()?;
        info!(
            points = document.points.len(),
            edges = document.edges.len(),
            file = %self.settings.export_file_name,
            "document exported"
        );
        Ok(ExportedFile { file_name: self.settings.export_file_name.clone(), contents })
    }

    /// Decode `raw` and swap it in. On failure the model is untouched and a
    /// failure notice is returned instead.
    pub fn import_str(&mut self, raw: &str) -> Vec<Action> {
        match codec::decode_str(raw) {
            Ok(decoded) => self.apply_decoded(decoded),
            Err(e) => {
                warn!(error = %e, "document import failed");
                vec![Action::Notice(Notice::failure(format!("Import failed: {e}")))]
            }
        }
    }

    fn apply_decoded(&mut self, decoded: Decoded) -> Vec<Action> {
        let Decoded { graph, meta, image, created_at } = decoded;
        self.graph = graph;
        meta.apply(&mut self.meta);
        self.image = image;
        self.ui.selection.clear();
        self.ui.interaction = Interaction::resting(self.connect_mode());
        self.ui.suppress_canvas_click = false;
        info!(
            points = self.graph.len(),
            edges = self.graph.edges().len(),
            dangling = self.graph.dangling_edge_count(),
            created_at = created_at.as_deref().unwrap_or("unknown"),
            "document imported"
        );
        vec![
            Action::DocumentLoaded,
            Action::SelectionChanged(Vec::new()),
            Action::Notice(Notice::success(format!("Imported {} points", self.graph.len()))),
            Action::RenderNeeded,
        ]
    }

    /// Record that the host started reading a file for `slot`.
    pub fn begin_read(&mut self, slot: ReadSlot) -> ReadTicket {
        self.reads.issue(slot)
    }

    /// Deliver a finished document read. `Err` carries the host's read error.
    pub fn complete_document_read(&mut self, ticket: ReadTicket, result: Result<String, String>) -> Vec<Action> {
        if ticket.slot != ReadSlot::Document || !self.reads.redeem(ticket) {
            debug!(seq = ticket.seq, "stale document read discarded");
            return Vec::new();
        }
        match result {
            Ok(text) => self.import_str(&text),
            Err(e) => {
                warn!(error = %e, "document read failed");
                vec![Action::Notice(Notice::failure(format!("Could not read document: {e}")))]
            }
        }
    }

    /// Deliver a finished image read. `Ok` carries the encoded payload.
    pub fn complete_image_read(&mut self, ticket: ReadTicket, result: Result<String, String>) -> Vec<Action> {
        if ticket.slot != ReadSlot::Image || !self.reads.redeem(ticket) {
            debug!(seq = ticket.seq, "stale image read discarded");
            return Vec::new();
        }
        match result {
            Ok(payload) => self.set_image(Some(payload)),
            Err(e) => {
                warn!(error = %e, "image read failed");
                vec![Action::Notice(Notice::failure(format!("Could not read image: {e}")))]
            }
        }
    }

    // --- Queries ---

    /// Scene for the drawing surface.
    #[must_use]
    pub fn scene(&self) -> Scene {
        render::build_scene(&self.graph, &self.meta, &self.ui)
    }

    #[must_use]
    pub fn selection(&self) -> Vec<PointId> {
        self.ui.selection.to_vec()
    }

    #[must_use]
    pub fn point(&self, id: &PointId) -> Option<&TrackPoint> {
        self.graph.get(id)
    }

    // --- Internal ---

    fn selection_changed(&self) -> Vec<Action> {
        vec![Action::SelectionChanged(self.ui.selection.to_vec()), Action::RenderNeeded]
    }

    /// Reset a drag or pending endpoint that references a removed point.
    fn forget_interaction_target(&mut self, removed: &PointId) {
        let stale = match &self.ui.interaction {
            Interaction::Dragging { id, .. } => id == removed,
            Interaction::ConnectPending { from } => from == removed,
            Interaction::Idle | Interaction::ConnectIdle => false,
        };
        if stale {
            self.ui.interaction = Interaction::resting(self.connect_mode());
        }
    }
}
