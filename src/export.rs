//! JSON dossier export of a single process.

use anyhow::{Context as _, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::context::{build_context, Context};
use crate::db::Database;
use crate::error::PipelineError;
use crate::models::{Form, GeneratedDocument, Photo, Process};

/// Everything recorded about a process, as written by [`export_process`].
#[derive(Debug, Serialize)]
pub struct ProcessDossier {
    pub exported_at: String,
    pub process: Process,
    pub context: Context,
    pub photos: Vec<Photo>,
    pub form: Option<Form>,
    pub documents: Vec<GeneratedDocument>,
}

pub fn collect_dossier(db: &Database, process_id: i64) -> Result<ProcessDossier> {
    let process = db
        .get_process(process_id)?
        .ok_or(PipelineError::ProcessNotFound(process_id))?;

    Ok(ProcessDossier {
        exported_at: chrono::Local::now().to_rfc3339(),
        context: build_context(db, process_id)?,
        photos: db.list_photos(process_id)?,
        form: db.latest_form(process_id)?,
        documents: db.list_generated_documents(process_id)?,
        process,
    })
}

/// Write the dossier of a process as pretty JSON. Returns the number of
/// generated documents it lists.
pub fn export_process(db: &Database, process_id: i64, output_path: &Path) -> Result<usize> {
    let dossier = collect_dossier(db, process_id)?;
    let json = serde_json::to_string_pretty(&dossier)?;

    let mut file = File::create(output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    file.write_all(json.as_bytes())?;

    tracing::info!(process_id, path = %output_path.display(), "Process exported");
    Ok(dossier.documents.len())
}
