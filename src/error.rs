use std::path::PathBuf;

use canvas::codec::DecodeError;
use canvas::engine::ExportError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("failed to read stdin: {0}")]
    Stdin(std::io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("{0}")]
    Load(String),
    #[error("script line {line}: {message}")]
    Script { line: usize, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
