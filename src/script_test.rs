#![allow(clippy::float_cmp)]

use canvas::doc::{Corner, Surface};
use canvas::input::Interaction;

use super::*;

fn run(engine: &mut Engine, lines: &[&str]) -> ReplayStats {
    replay(engine, &lines.join("\n")).unwrap()
}

#[test]
fn parse_line_skips_blank_and_comments() {
    assert_eq!(parse_line("   ").unwrap(), None);
    assert_eq!(parse_line("# a comment").unwrap(), None);
    assert_eq!(parse_line(r#"{"event":"leave"}"#).unwrap(), Some(ScriptEvent::Leave));
}

#[test]
fn parse_line_reads_flattened_modifiers() {
    let event = parse_line(r#"{"event":"click","x":1,"y":2,"shift":true}"#).unwrap().unwrap();
    assert_eq!(
        event,
        ScriptEvent::Click { x: 1.0, y: 2.0, modifiers: Modifiers { shift: true, ..Modifiers::default() } }
    );
}

#[test]
fn parse_line_rejects_unknown_event() {
    assert!(parse_line(r#"{"event":"explode"}"#).is_err());
    assert!(parse_line("not json").is_err());
}

#[test]
fn clicks_on_empty_canvas_add_points() {
    let mut engine = Engine::new();
    let stats = run(&mut engine, &[
        r#"{"event":"click","x":0,"y":0}"#,
        r#"{"event":"click","x":100,"y":0}"#,
        r#"{"event":"click","x":100,"y":100}"#,
    ]);
    assert_eq!(stats.events, 3);
    assert_eq!(engine.graph.len(), 3);
    assert_eq!(engine.selection(), vec![engine.graph.last().unwrap().id.clone()]);
}

#[test]
fn click_on_marker_selects_instead_of_adding() {
    let mut engine = Engine::new();
    run(&mut engine, &[
        r#"{"event":"click","x":0,"y":0}"#,
        r#"{"event":"click","x":100,"y":0}"#,
        r#"{"event":"click","x":3,"y":2}"#,
    ]);
    assert_eq!(engine.graph.len(), 2);
    assert_eq!(engine.selection(), vec![engine.graph.point_at(0).unwrap().id.clone()]);
}

#[test]
fn drag_moves_marker_without_adding_point() {
    let mut engine = Engine::new();
    run(&mut engine, &[
        r#"{"event":"click","x":0,"y":0}"#,
        r#"{"event":"drag","x":0,"y":0,"to_x":50,"to_y":60}"#,
        r#"{"event":"click","x":200,"y":200}"#,
    ]);
    let first = engine.graph.point_at(0).unwrap();
    assert_eq!((first.x, first.y), (50.0, 60.0));
    assert_eq!(engine.graph.len(), 2);
    assert_eq!(engine.ui.interaction, Interaction::Idle);
}

#[test]
fn drag_from_empty_space_is_rejected() {
    let mut engine = Engine::new();
    let stats = run(&mut engine, &[r#"{"event":"drag","x":0,"y":0,"to_x":5,"to_y":5}"#]);
    assert_eq!(stats.rejected, 1);
}

#[test]
fn connect_mode_builds_edge() {
    let mut engine = Engine::new();
    run(&mut engine, &[
        r#"{"event":"click","x":0,"y":0}"#,
        r#"{"event":"click","x":100,"y":0}"#,
        r#"{"event":"click","x":100,"y":100}"#,
        r#"{"event":"connect_mode","on":true}"#,
        r#"{"event":"marker_click","index":0}"#,
        r#"{"event":"marker_click","index":2}"#,
    ]);
    assert_eq!(engine.graph.edges().len(), 1);
    assert_eq!(engine.selection(), vec![engine.graph.point_at(2).unwrap().id.clone()]);
    assert!(engine.connect_mode());
}

#[test]
fn undo_key_and_text_focus() {
    let mut engine = Engine::new();
    run(&mut engine, &[
        r#"{"event":"click","x":0,"y":0}"#,
        r#"{"event":"click","x":100,"y":0}"#,
        r#"{"event":"key","key":"Backspace","text_focus":true}"#,
        r#"{"event":"key","key":"Backspace","ctrl":true}"#,
    ]);
    assert_eq!(engine.graph.len(), 2);

    run(&mut engine, &[r#"{"event":"key","key":"Backspace"}"#]);
    assert_eq!(engine.graph.len(), 1);
    assert!(engine.selection().is_empty());
}

#[test]
fn attributes_and_meta() {
    let mut engine = Engine::new();
    let stats = run(&mut engine, &[
        r#"{"event":"click","x":0,"y":0}"#,
        r#"{"event":"click","x":100,"y":0}"#,
        r#"{"event":"marker_click","index":0,"shift":true}"#,
        r#"{"event":"set_attribute","attribute":"surface","value":"Gravel"}"#,
        r#"{"event":"set_attribute","attribute":"corner","value":"Low speed"}"#,
        r#"{"event":"set_attribute","attribute":"incline","value":"2.5"}"#,
        r#"{"event":"set_attribute","attribute":"surface","value":"Lava"}"#,
        r#"{"event":"track_length","km":4.3}"#,
        r#"{"event":"race_type","value":"Circuit"}"#,
    ]);
    assert_eq!(stats.rejected, 1);
    for p in engine.graph.points() {
        assert_eq!(p.surface, Some(Surface::Gravel));
        assert_eq!(p.corner, Some(Corner::LowSpeed));
        assert_eq!(p.incline, 2.5);
    }
    assert_eq!(engine.meta.track_length_km, 4.3);
    assert_eq!(engine.meta.race_type, RaceType::Circuit);
}

#[test]
fn unknown_race_type_is_rejected() {
    let mut engine = Engine::new();
    let stats = run(&mut engine, &[r#"{"event":"race_type","value":"Rally"}"#]);
    assert_eq!(stats.rejected, 1);
    assert_eq!(engine.meta.race_type, RaceType::PointToPoint);
}

#[test]
fn stale_index_is_rejected_not_fatal() {
    let mut engine = Engine::new();
    let stats = run(&mut engine, &[r#"{"event":"marker_click","index":4}"#, r#"{"event":"click","x":1,"y":1}"#]);
    assert_eq!(stats, ReplayStats { events: 2, actions: 3, rejected: 1 });
}

#[test]
fn camera_events_change_mapping() {
    let mut engine = Engine::new();
    run(&mut engine, &[
        r#"{"event":"mount","viewport":{"a":1,"b":0,"c":0,"d":1,"e":0,"f":0}}"#,
        r#"{"event":"zoom","x":0,"y":0,"factor":2}"#,
        r#"{"event":"pan","dx":10,"dy":10}"#,
        r#"{"event":"click","x":30,"y":50}"#,
    ]);
    let p = engine.graph.last().unwrap();
    assert_eq!((p.x, p.y), (10.0, 20.0));
}

#[test]
fn reorder_and_clear() {
    let mut engine = Engine::new();
    run(&mut engine, &[
        r#"{"event":"click","x":0,"y":0}"#,
        r#"{"event":"click","x":100,"y":0}"#,
        r#"{"event":"reorder","index":1,"to":0}"#,
    ]);
    assert_eq!(engine.graph.point_at(0).unwrap().x, 100.0);

    run(&mut engine, &[r#"{"event":"clear_points"}"#, r#"{"event":"clear_edges"}"#]);
    assert!(engine.graph.is_empty());
}

#[test]
fn malformed_line_reports_line_number() {
    let mut engine = Engine::new();
    let err = replay(&mut engine, "{\"event\":\"leave\"}\n\n{oops").unwrap_err();
    assert!(matches!(err, AppError::Script { line: 3, .. }));
}
