//! Track tracing engine: the model and interaction core of the layout editor.
//!
//! The crate owns everything that must stay correct regardless of how the
//! editor is drawn: the ordered waypoint sequence and its auxiliary edges,
//! the mapping from pointer coordinates into model space, the selection and
//! connect-mode state machine, attribute edits over a selection, and the JSON
//! document codec. The host (a browser shell, or the `trackedit` binary)
//! feeds raw input events into [`engine::Engine`] and applies the returned
//! [`engine::Action`]s to its drawing surface.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine: input handlers, import/export, read tickets |
//! | [`doc`] | Track points, edges, metadata, and the [`doc::TrackGraph`] store |
//! | [`camera`] | Affine transforms, pan/zoom camera, device-to-model mapping |
//! | [`input`] | Modifier keys, selection set, and the interaction state machine |
//! | [`attrs`] | Representative values and broadcast writes over a selection |
//! | [`codec`] | Document encode and defensive decode |
//! | [`hit`] | Marker hit-testing in model space |
//! | [`render`] | Render-agnostic scene description for the drawing surface |
//! | [`consts`] | Shared constants (hit radius, zoom limits, defaults) |

pub mod attrs;
pub mod camera;
pub mod codec;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod render;
