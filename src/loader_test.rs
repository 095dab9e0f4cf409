use std::path::PathBuf;

use canvas::doc::PointId;
use uuid::Uuid;

use super::*;

/// Fresh scratch directory under the system temp dir.
fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("trackedit-test-{}", Uuid::new_v4()))
}

async fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    tokio::fs::create_dir_all(dir).await.unwrap();
    let path = dir.join(name);
    tokio::fs::write(&path, contents).await.unwrap();
    path
}

#[test]
fn mime_for_known_extensions() {
    assert_eq!(mime_for(Path::new("track.png")), "image/png");
    assert_eq!(mime_for(Path::new("track.JPG")), "image/jpeg");
    assert_eq!(mime_for(Path::new("a/b/track.jpeg")), "image/jpeg");
    assert_eq!(mime_for(Path::new("track.svg")), "image/svg+xml");
    assert_eq!(mime_for(Path::new("track")), "application/octet-stream");
    assert_eq!(mime_for(Path::new("track.tiff")), "application/octet-stream");
}

#[test]
fn image_data_url_encodes_base64() {
    assert_eq!(image_data_url("image/png", b"hi!"), "data:image/png;base64,aGkh");
    assert_eq!(image_data_url("image/gif", b""), "data:image/gif;base64,");
}

#[tokio::test]
async fn read_image_builds_data_url() {
    let dir = scratch_dir();
    let path = write_file(&dir, "ref.png", &[0x89, b'P', b'N', b'G']).await;

    let payload = read_image(&path).await.unwrap();
    assert_eq!(payload, "data:image/png;base64,iVBORw==");
    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn read_document_reports_missing_file() {
    let path = scratch_dir().join("missing.json");
    let err = read_document(&path).await.unwrap_err();
    assert!(matches!(err, AppError::Read { .. }));
    assert!(err.to_string().contains("missing.json"));
}

#[tokio::test]
async fn load_sources_applies_document_then_image() {
    let dir = scratch_dir();
    let doc = write_file(&dir, "layout.json", br#"{"points":[{"id":"a","x":1,"y":2}],"image":"data:old"}"#).await;
    let img = write_file(&dir, "ref.gif", b"GIF89a").await;

    let mut engine = Engine::new();
    let actions = load_sources(&mut engine, Some(&doc), Some(&img)).await;

    ensure_no_failure(&actions).unwrap();
    assert!(engine.point(&PointId::new("a")).is_some());
    assert_eq!(engine.image.as_deref(), Some("data:image/gif;base64,R0lGODlh"));
    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn load_sources_failed_read_leaves_model() {
    let mut engine = Engine::new();
    engine.graph.add_point(5.0, 5.0);
    let missing = scratch_dir().join("nope.json");

    let actions = load_sources(&mut engine, Some(&missing), None).await;
    assert!(matches!(ensure_no_failure(&actions), Err(AppError::Load(_))));
    assert_eq!(engine.graph.len(), 1);
}

#[tokio::test]
async fn load_sources_malformed_document_is_a_failure() {
    let dir = scratch_dir();
    let doc = write_file(&dir, "bad.json", b"[1, 2, 3]").await;

    let mut engine = Engine::new();
    let actions = load_sources(&mut engine, Some(&doc), None).await;
    let err = ensure_no_failure(&actions).unwrap_err();
    assert!(err.to_string().contains("malformed document"));
    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn write_export_creates_directory() {
    let dir = scratch_dir().join("nested");
    let file = ExportedFile { file_name: "track-layout.json".into(), contents: "{}".into() };

    let path = write_export(&dir, &file).await.unwrap();
    assert_eq!(path, dir.join("track-layout.json"));
    assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "{}");
    tokio::fs::remove_dir_all(dir.parent().unwrap()).await.unwrap();
}
