//! File boundary: async reads into the engine, exports back out.
//!
//! DESIGN
//! ======
//! The engine never does I/O. Each read here is bracketed by a read ticket:
//! the ticket is issued before the read starts and the completion is handed
//! back with it, so when several reads for the same slot are in flight only
//! the most recently requested one is applied. Read failures are delivered to
//! the engine as error strings and surface as failure notices, never as a
//! half-updated model.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use canvas::engine::{Action, Engine, ExportedFile, NoticeKind, ReadSlot};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::error::AppError;

/// Script source meaning "read standard input".
pub const STDIN_SOURCE: &str = "-";

const FALLBACK_MIME: &str = "application/octet-stream";

/// MIME type for a reference image, from its file extension.
#[must_use]
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        _ => FALLBACK_MIME,
    }
}

/// Embed raw image bytes as a `data:` URL.
#[must_use]
pub fn image_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes))
}

pub async fn read_document(path: &Path) -> Result<String, AppError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AppError::Read { path: path.to_path_buf(), source })
}

pub async fn read_image(path: &Path) -> Result<String, AppError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| AppError::Read { path: path.to_path_buf(), source })?;
    let mime = mime_for(path);
    debug!(path = %path.display(), bytes = bytes.len(), mime, "image read");
    Ok(image_data_url(mime, &bytes))
}

/// Read a replay script from a file, or from stdin for [`STDIN_SOURCE`].
pub async fn read_script(source: &str) -> Result<String, AppError> {
    if source == STDIN_SOURCE {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await.map_err(AppError::Stdin)?;
        return Ok(text);
    }
    read_document(Path::new(source)).await
}

/// Read a document and/or reference image concurrently and hand both to the
/// engine. The document is applied first since an import replaces the image.
pub async fn load_sources(engine: &mut Engine, document: Option<&Path>, image: Option<&Path>) -> Vec<Action> {
    let doc_ticket = document.map(|_| engine.begin_read(ReadSlot::Document));
    let image_ticket = image.map(|_| engine.begin_read(ReadSlot::Image));

    let doc_read = async {
        match document {
            Some(path) => Some(read_document(path).await),
            None => None,
        }
    };
    let image_read = async {
        match image {
            Some(path) => Some(read_image(path).await),
            None => None,
        }
    };
    let (doc_result, image_result) = tokio::join!(doc_read, image_read);

    let mut actions = Vec::new();
    if let (Some(ticket), Some(result)) = (doc_ticket, doc_result) {
        actions.extend(engine.complete_document_read(ticket, result.map_err(|e| e.to_string())));
    }
    if let (Some(ticket), Some(result)) = (image_ticket, image_result) {
        actions.extend(engine.complete_image_read(ticket, result.map_err(|e| e.to_string())));
    }
    actions
}

/// First failure notice among `actions`, as an error.
pub fn ensure_no_failure(actions: &[Action]) -> Result<(), AppError> {
    match actions.iter().find_map(|a| match a {
        Action::Notice(n) if n.kind == NoticeKind::Failure => Some(n.message.clone()),
        _ => None,
    }) {
        Some(message) => Err(AppError::Load(message)),
        None => Ok(()),
    }
}

/// Write an exported document into `dir`, creating it if needed.
pub async fn write_export(dir: &Path, file: &ExportedFile) -> Result<PathBuf, AppError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| AppError::Write { path: dir.to_path_buf(), source })?;
    let path = dir.join(&file.file_name);
    tokio::fs::write(&path, &file.contents)
        .await
        .map_err(|source| AppError::Write { path: path.clone(), source })?;
    info!(path = %path.display(), bytes = file.contents.len(), "export written");
    Ok(path)
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
