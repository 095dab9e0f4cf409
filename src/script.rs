//! Replay scripts: JSON-lines input events driven through the engine.
//!
//! Each non-blank line is one object tagged by `"event"`. Positions are device
//! coordinates, exactly as a pointer would report them; markers are resolved by
//! hit-testing, or addressed by sequence index where a script needs a specific
//! point regardless of layout. Lines starting with `#` are comments.
//!
//! ```text
//! {"event":"click","x":120,"y":80}
//! {"event":"click","x":120,"y":80,"shift":true}
//! {"event":"drag","x":120,"y":80,"to_x":140,"to_y":90}
//! {"event":"key","key":"Backspace"}
//! {"event":"connect_mode","on":true}
//! {"event":"marker_click","index":0}
//! {"event":"set_attribute","attribute":"surface","value":"Gravel"}
//! {"event":"race_type","value":"Circuit"}
//! ```

use canvas::camera::{Affine, Point};
use canvas::doc::{AttributeKey, PointId, RaceType};
use canvas::engine::{Action, Engine, NoticeKind};
use canvas::input::{Key, Modifiers};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptAttribute {
    Surface,
    Corner,
    Incline,
}

impl From<ScriptAttribute> for AttributeKey {
    fn from(attr: ScriptAttribute) -> Self {
        match attr {
            ScriptAttribute::Surface => AttributeKey::Surface,
            ScriptAttribute::Corner => AttributeKey::Corner,
            ScriptAttribute::Incline => AttributeKey::Incline,
        }
    }
}

/// One scripted input event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    /// Press and release at a position: a marker click if a marker is hit,
    /// otherwise a canvas click.
    Click {
        x: f64,
        y: f64,
        #[serde(flatten)]
        modifiers: Modifiers,
    },
    /// Click the marker at a sequence index.
    MarkerClick {
        index: usize,
        #[serde(flatten)]
        modifiers: Modifiers,
    },
    /// Press at a position, move to the target, release.
    Drag { x: f64, y: f64, to_x: f64, to_y: f64 },
    /// Pointer leaves the surface mid-drag.
    Leave,
    Key {
        key: String,
        #[serde(flatten)]
        modifiers: Modifiers,
        #[serde(default)]
        text_focus: bool,
    },
    ConnectMode { on: bool },
    SetAttribute { attribute: ScriptAttribute, value: String },
    TrackLength { km: f64 },
    RaceType { value: String },
    Reorder { index: usize, to: usize },
    ClearPoints,
    ClearEdges,
    Zoom { x: f64, y: f64, factor: f64 },
    Pan { dx: f64, dy: f64 },
    Mount { viewport: Affine },
    Unmount,
}

/// Counters reported after a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub events: usize,
    pub actions: usize,
    pub rejected: usize,
}

/// Parse one script line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ScriptEvent>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}

/// Drive every event in `script` through `engine`.
///
/// Malformed lines abort the replay. Inputs the editor itself would refuse
/// (an unknown attribute label, a stale marker index) are logged and counted
/// as rejected, the way an interactive surface would show and move on.
pub fn replay(engine: &mut Engine, script: &str) -> Result<ReplayStats, AppError> {
    let mut stats = ReplayStats::default();
    for (idx, line) in script.lines().enumerate() {
        let line_no = idx + 1;
        let event = parse_line(line).map_err(|e| AppError::Script { line: line_no, message: e.to_string() })?;
        let Some(event) = event else {
            continue;
        };
        stats.events += 1;
        match apply(engine, &event) {
            Ok(actions) => {
                for notice in actions.iter().filter_map(|a| match a {
                    Action::Notice(n) if n.kind == NoticeKind::Failure => Some(n),
                    _ => None,
                }) {
                    warn!(line = line_no, message = %notice.message, "editor reported failure");
                }
                stats.actions += actions.len();
            }
            Err(reason) => {
                warn!(line = line_no, %reason, "event rejected");
                stats.rejected += 1;
            }
        }
    }
    debug!(events = stats.events, actions = stats.actions, rejected = stats.rejected, "replay finished");
    Ok(stats)
}

/// Apply one event. `Err` carries why the editor refused it.
pub fn apply(engine: &mut Engine, event: &ScriptEvent) -> Result<Vec<Action>, String> {
    let actions = match event {
        ScriptEvent::Click { x, y, modifiers } => {
            let at = Point::new(*x, *y);
            match engine.marker_at_device(at) {
                Some(id) => {
                    let mut actions = engine.on_pointer_down(at, Some(&id));
                    actions.extend(engine.on_pointer_up());
                    actions.extend(engine.on_marker_click(&id, *modifiers));
                    actions
                }
                None => {
                    let mut actions = engine.on_pointer_down(at, None);
                    actions.extend(engine.on_pointer_up());
                    actions.extend(engine.on_canvas_click(at, *modifiers));
                    actions
                }
            }
        }
        ScriptEvent::MarkerClick { index, modifiers } => {
            let id = point_id_at(engine, *index)?;
            engine.on_marker_click(&id, *modifiers)
        }
        ScriptEvent::Drag { x, y, to_x, to_y } => {
            let from = Point::new(*x, *y);
            let Some(id) = engine.marker_at_device(from) else {
                return Err(format!("no marker at ({x}, {y}) to drag"));
            };
            let mut actions = engine.on_pointer_down(from, Some(&id));
            actions.extend(engine.on_pointer_move(Point::new(*to_x, *to_y)));
            actions.extend(engine.on_pointer_up());
            actions
        }
        ScriptEvent::Leave => engine.on_pointer_leave(),
        ScriptEvent::Key { key, modifiers, text_focus } => {
            engine.on_key_down(&Key(key.clone()), *modifiers, *text_focus)
        }
        ScriptEvent::ConnectMode { on } => engine.set_connect_mode(*on),
        ScriptEvent::SetAttribute { attribute, value } => engine
            .commit_attribute_input((*attribute).into(), value)
            .map_err(|e| e.to_string())?,
        ScriptEvent::TrackLength { km } => engine.set_track_length_km(*km),
        ScriptEvent::RaceType { value } => {
            let race_type = value.parse::<RaceType>().map_err(|e| e.to_string())?;
            engine.set_race_type(race_type)
        }
        ScriptEvent::Reorder { index, to } => {
            let id = point_id_at(engine, *index)?;
            engine.reorder_point(&id, *to)
        }
        ScriptEvent::ClearPoints => engine.clear_points(),
        ScriptEvent::ClearEdges => engine.clear_edges(),
        ScriptEvent::Zoom { x, y, factor } => engine.zoom_at(Point::new(*x, *y), *factor),
        ScriptEvent::Pan { dx, dy } => engine.pan_by(*dx, *dy),
        ScriptEvent::Mount { viewport } => {
            engine.mount_surface(*viewport);
            vec![Action::RenderNeeded]
        }
        ScriptEvent::Unmount => {
            engine.unmount_surface();
            vec![Action::RenderNeeded]
        }
    };
    Ok(actions)
}

fn point_id_at(engine: &Engine, index: usize) -> Result<PointId, String> {
    engine
        .graph
        .point_at(index)
        .map(|p| p.id.clone())
        .ok_or_else(|| format!("no point at index {index} ({} points)", engine.graph.len()))
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
