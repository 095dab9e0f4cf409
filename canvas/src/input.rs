//! Input model: modifier keys, the selection set, and the interaction state machine.
//!
//! `Modifiers` and `Key` capture what the host reports with each event.
//! `Interaction` is the single source of truth for what a pointer gesture
//! currently means; connect mode is not a separate flag but a property of the
//! active variant, so "dragging while connecting" cannot be represented.
//! `Selection` is the insertion-ordered set of selected point ids.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use indexmap::IndexSet;
use serde::Deserialize;

use crate::doc::PointId;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Whether the event should toggle membership instead of replacing the selection.
    #[must_use]
    pub fn is_multi_select(self) -> bool {
        self.shift || self.ctrl || self.meta
    }

    /// Whether a command chord (ctrl/meta) is held; such chords never trigger editing keys.
    #[must_use]
    pub fn is_command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"Backspace"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    /// Case-insensitive comparison against a key name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Interaction state machine.
///
/// `Idle`/`Dragging` form the normal-mode pair, `ConnectIdle`/`ConnectPending`
/// the connect-mode pair. Toggling connect mode moves between the pairs and
/// always lands in the idle member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Interaction {
    /// Normal mode, no gesture in progress.
    #[default]
    Idle,
    /// A marker is pressed and follows the pointer.
    Dragging {
        /// Point being dragged.
        id: PointId,
        /// Whether any pointer movement happened since the press.
        moved: bool,
    },
    /// Connect mode with no endpoint chosen yet.
    ConnectIdle,
    /// Connect mode with the "from" endpoint chosen.
    ConnectPending {
        /// First endpoint of the edge under construction.
        from: PointId,
    },
}

impl Interaction {
    #[must_use]
    pub fn is_connect_mode(&self) -> bool {
        matches!(self, Self::ConnectIdle | Self::ConnectPending { .. })
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    /// The pending connect-mode endpoint, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PointId> {
        match self {
            Self::ConnectPending { from } => Some(from),
            _ => None,
        }
    }

    /// The resting state of the requested mode.
    #[must_use]
    pub fn resting(connect_mode: bool) -> Self {
        if connect_mode { Self::ConnectIdle } else { Self::Idle }
    }
}

/// Insertion-ordered set of selected point ids.
///
/// Order only matters for picking the representative point whose attributes
/// the edit controls display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: IndexSet<PointId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with exactly `{id}`.
    pub fn select_only(&mut self, id: PointId) {
        self.ids.clear();
        self.ids.insert(id);
    }

    /// Add `id` if absent, remove it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, id: PointId) -> bool {
        if self.ids.shift_remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn contains(&self, id: &PointId) -> bool {
        self.ids.contains(id)
    }

    /// First-selected id.
    #[must_use]
    pub fn first(&self) -> Option<&PointId> {
        self.ids.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PointId> {
        self.ids.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids as an ordered `Vec`, for actions and snapshots.
    #[must_use]
    pub fn to_vec(&self) -> Vec<PointId> {
        self.ids.iter().cloned().collect()
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Current gesture / mode.
    pub interaction: Interaction,
    /// Currently selected points.
    pub selection: Selection,
    /// Set when a drag that moved ends; the next canvas click is swallowed so releasing a
    /// drag over empty canvas does not spawn a point.
    pub suppress_canvas_click: bool,
}
