//! Subcommand implementations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use canvas::codec::{self, Decoded};
use canvas::doc::RaceType;
use canvas::engine::Engine;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::loader;
use crate::script;

/// What `inspect` reports about a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub points: usize,
    pub edges: usize,
    pub dangling_edges: usize,
    pub track_length_km: Option<f64>,
    pub race_type: Option<RaceType>,
    pub created_at: Option<String>,
    pub has_image: bool,
    /// Point count per surface label; unset surfaces are counted under `"(none)"`.
    pub surfaces: BTreeMap<String, usize>,
}

impl Summary {
    #[must_use]
    pub fn of(decoded: &Decoded) -> Self {
        let mut surfaces = BTreeMap::new();
        for point in decoded.graph.points() {
            let label = point.surface.as_ref().map_or("(none)", |s| s.label());
            *surfaces.entry(label.to_owned()).or_insert(0) += 1;
        }
        let created_at = decoded.created_at.as_deref().map(|raw| match OffsetDateTime::parse(raw, &Rfc3339) {
            Ok(ts) => ts.format(&Rfc3339).unwrap_or_else(|_| raw.to_owned()),
            Err(e) => {
                warn!(value = raw, error = %e, "createdAt is not RFC 3339");
                raw.to_owned()
            }
        });
        Self {
            points: decoded.graph.len(),
            edges: decoded.graph.edges().len(),
            dangling_edges: decoded.graph.dangling_edge_count(),
            track_length_km: decoded.meta.track_length_km,
            race_type: decoded.meta.race_type,
            created_at,
            has_image: decoded.image.is_some(),
            surfaces,
        }
    }
}

pub async fn inspect(path: &Path) -> Result<Summary, AppError> {
    let raw = loader::read_document(path).await?;
    let decoded = codec::decode_str(&raw)?;
    Ok(Summary::of(&decoded))
}

/// Inputs for [`replay`].
#[derive(Debug, Clone)]
pub struct ReplayJob {
    pub script: String,
    pub document: Option<PathBuf>,
    pub image: Option<PathBuf>,
    pub out_dir: PathBuf,
}

/// Load the optional document and image, replay the script, export.
pub async fn replay(job: &ReplayJob, config: &AppConfig) -> Result<PathBuf, AppError> {
    let mut engine = Engine::with_settings(config.engine_settings());
    let actions = loader::load_sources(&mut engine, job.document.as_deref(), job.image.as_deref()).await;
    loader::ensure_no_failure(&actions)?;

    let text = loader::read_script(&job.script).await?;
    let stats = script::replay(&mut engine, &text)?;
    info!(
        events = stats.events,
        rejected = stats.rejected,
        points = engine.graph.len(),
        edges = engine.graph.edges().len(),
        "script replayed"
    );

    let file = engine.export_file()?;
    loader::write_export(&job.out_dir, &file).await
}

/// Attach a reference image to an existing document and re-export it.
pub async fn attach_image(document: &Path, image: &Path, out_dir: &Path, config: &AppConfig) -> Result<PathBuf, AppError> {
    let mut engine = Engine::with_settings(config.engine_settings());
    let actions = loader::load_sources(&mut engine, Some(document), Some(image)).await;
    loader::ensure_no_failure(&actions)?;

    let file = engine.export_file()?;
    loader::write_export(out_dir, &file).await
}

#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;
