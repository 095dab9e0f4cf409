#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn resolve_defaults() {
    let cfg = AppConfig::resolve(&ConfigOverrides::default()).unwrap();
    assert_eq!(cfg, AppConfig::default());
    assert_eq!(cfg.undo_key, "Backspace");
    assert_eq!(cfg.export_file_name, "track-layout.json");
    assert_eq!(cfg.hit_radius_px, 8.0);
}

#[test]
fn resolve_applies_overrides() {
    let raw = ConfigOverrides {
        undo_key: Some(" Delete ".into()),
        export_file: Some("spa.json".into()),
        hit_radius_px: Some(12.5),
    };
    let cfg = AppConfig::resolve(&raw).unwrap();
    assert_eq!(cfg.undo_key, "Delete");
    assert_eq!(cfg.export_file_name, "spa.json");
    assert_eq!(cfg.hit_radius_px, 12.5);
}

#[test]
fn resolve_rejects_empty_undo_key() {
    let raw = ConfigOverrides { undo_key: Some("   ".into()), ..Default::default() };
    assert_eq!(AppConfig::resolve(&raw), Err(ConfigError::Empty { var: "TRACKEDIT_UNDO_KEY" }));
}

#[test]
fn resolve_rejects_paths_as_file_name() {
    for name in ["out/track.json", "..\\track.json", ".."] {
        let raw = ConfigOverrides { export_file: Some(name.into()), ..Default::default() };
        assert!(matches!(AppConfig::resolve(&raw), Err(ConfigError::Invalid { .. })), "{name}");
    }
    let raw = ConfigOverrides { export_file: Some(String::new()), ..Default::default() };
    assert!(matches!(AppConfig::resolve(&raw), Err(ConfigError::Empty { .. })));
}

#[test]
fn resolve_rejects_bad_hit_radius() {
    for px in [0.0, -3.0, f64::NAN, f64::INFINITY] {
        let raw = ConfigOverrides { hit_radius_px: Some(px), ..Default::default() };
        assert!(AppConfig::resolve(&raw).is_err(), "{px}");
    }
}

#[test]
fn engine_settings_mirror_config() {
    let raw = ConfigOverrides { undo_key: Some("u".into()), ..Default::default() };
    let settings = AppConfig::resolve(&raw).unwrap().engine_settings();
    assert_eq!(settings.undo_key, "u");
    assert_eq!(settings.export_file_name, "track-layout.json");
}
