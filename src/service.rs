//! Prevention process workflow: create, capture photos, fill the form, check
//! readiness and generate fund documents.

use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::context::{build_context, parse_stored_context, Context};
use crate::db::Database;
use crate::docgen::{DocumentGenerator, FsTemplateRenderer, TemplateRenderer};
use crate::error::{PipelineError, PipelineResult};
use crate::funds::reference;
use crate::llm::vision::describe_photos;
use crate::llm::{LegalTextGenerator, LlmClient};
use crate::models::{FormInput, GeneratedDocument, NewGeneratedDocument, Photo, Process, ProcessStatus};
use crate::preflight::{self, PreflightReport};
use crate::storage::{Storage, UploadedFile};

const INVALID_CONTEXT_WARNING: &str = "invalid_context_payload";

/// A document produced by [`ProcessService::generate_documents`].
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSummary {
    pub id: i64,
    pub name: String,
    pub doc_type: String,
    pub mime: String,
    pub prompt_version: String,
    pub inputs_hash: String,
    pub path: PathBuf,
}

/// A stored document read back from disk.
#[derive(Debug, Clone)]
pub struct OpenedDocument {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: String,
}

pub struct ProcessService {
    db: Database,
    storage: Storage,
    llm: Option<LlmClient>,
    templates: Option<Box<dyn TemplateRenderer>>,
}

impl ProcessService {
    pub fn new(db: Database, storage: Storage) -> Self {
        Self {
            db,
            storage,
            llm: None,
            templates: None,
        }
    }

    pub fn with_llm(mut self, llm: Option<LlmClient>) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_templates(mut self, templates: Option<Box<dyn TemplateRenderer>>) -> Self {
        self.templates = templates;
        self
    }

    /// Open the database and storage from configuration and wire the optional
    /// AI client, templates and fund reference data.
    pub fn from_config(config: &Config) -> PipelineResult<Self> {
        let db = Database::open(&config.db_path)?;
        db.initialize()?;

        let storage = Storage::new(&config.storage.root);
        storage.init()?;

        reference::init(config.funds.data_dir.as_deref());

        let templates: Option<Box<dyn TemplateRenderer>> = if config.funds.templates_dir.is_dir() {
            Some(Box::new(FsTemplateRenderer::new(&config.funds.templates_dir)))
        } else {
            tracing::debug!(dir = %config.funds.templates_dir.display(), "No template directory");
            None
        };

        Ok(Self::new(db, storage)
            .with_llm(LlmClient::from_config(&config.llm))
            .with_templates(templates))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn require_process(&self, process_id: i64) -> PipelineResult<Process> {
        self.db
            .get_process(process_id)?
            .ok_or(PipelineError::ProcessNotFound(process_id))
    }

    /// Create a draft process. An unparseable context payload is replaced by a
    /// warning marker instead of being rejected.
    pub fn create_process(&self, zone_id: Option<i64>, context_json: Option<&str>) -> PipelineResult<Process> {
        let initial = match context_json.map(str::trim).filter(|s| !s.is_empty()) {
            None => json!({}),
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid context payload on process creation");
                    json!({ "_warning": INVALID_CONTEXT_WARNING })
                }
            },
        };

        let id = self.db.create_process(zone_id, &serde_json::to_string(&initial)?)?;
        tracing::info!(process_id = id, zone_id = ?zone_id, "Process created");
        self.require_process(id)
    }

    pub fn get_process(&self, process_id: i64) -> PipelineResult<Process> {
        self.require_process(process_id)
    }

    /// The consolidated context of a process.
    pub fn context(&self, process_id: i64) -> PipelineResult<Context> {
        build_context(&self.db, process_id)
    }

    fn stored_context(&self, process: &Process) -> Context {
        parse_stored_context(process.context_json.as_deref())
    }

    fn save_context(&self, process_id: i64, ctx: &Context) -> PipelineResult<()> {
        self.db
            .update_process_context(process_id, &serde_json::to_string(ctx)?)?;
        Ok(())
    }

    /// Store a batch of photos, describe them and record them on the process.
    pub fn upload_photos(&self, process_id: i64, files: &[UploadedFile]) -> PipelineResult<Vec<Photo>> {
        let process = self.require_process(process_id)?;
        if files.is_empty() {
            return Err(PipelineError::InvalidInput("no files in upload".to_string()));
        }

        let paths = self.storage.save_uploads(process_id, files)?;
        let mut photo_ids = Vec::with_capacity(paths.len());
        for path in &paths {
            photo_ids.push(self.db.insert_photo(process_id, &path_string(path), None)?);
        }

        let descriptions = describe_photos(self.llm.as_ref(), &paths);
        for (photo_id, description) in photo_ids.iter().zip(&descriptions) {
            self.db.save_photo_description(*photo_id, description)?;
        }

        let mut ctx = self.stored_context(&process);
        let mut photos = match ctx.remove("photos") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        for (path, description) in paths.iter().zip(&descriptions) {
            photos.push(json!({ "path": path_string(path), "description": description }));
        }
        ctx.insert("photos".to_string(), Value::Array(photos));
        self.save_context(process_id, &ctx)?;
        self.db
            .update_process_status(process_id, ProcessStatus::PhotosCaptured)?;

        tracing::info!(process_id, count = paths.len(), "Photos uploaded");

        let stored = self.db.list_photos(process_id)?;
        Ok(stored
            .into_iter()
            .filter(|p| photo_ids.contains(&p.id))
            .collect())
    }

    /// Record a form submission. Returns the new form id.
    pub fn submit_form(&self, process_id: i64, input: &FormInput) -> PipelineResult<i64> {
        let process = self.require_process(process_id)?;
        if input.responsavel.trim().is_empty() {
            return Err(PipelineError::InvalidInput("responsavel is required".to_string()));
        }
        if input.data_vistoria.trim().is_empty() {
            return Err(PipelineError::InvalidInput("data_vistoria is required".to_string()));
        }

        let form_id = self.db.insert_form(process_id, input)?;

        let mut ctx = self.stored_context(&process);
        ctx.insert("form".to_string(), input.to_context());
        self.save_context(process_id, &ctx)?;
        self.db
            .update_process_status(process_id, ProcessStatus::FormFilled)?;

        tracing::info!(process_id, form_id, "Form submitted");
        Ok(form_id)
    }

    /// Shallow-merge a JSON object into the stored context. Returns the
    /// stored context after the merge.
    pub fn update_context(&self, process_id: i64, patch: &Value) -> PipelineResult<Context> {
        let process = self.require_process(process_id)?;
        let Some(patch) = patch.as_object() else {
            return Err(PipelineError::InvalidInput(
                "context patch must be a JSON object".to_string(),
            ));
        };

        let mut ctx = self.stored_context(&process);
        for (key, value) in patch {
            ctx.insert(key.clone(), value.clone());
        }
        self.save_context(process_id, &ctx)?;

        tracing::debug!(process_id, keys = patch.len(), "Context updated");
        Ok(ctx)
    }

    pub fn preflight(&self, process_id: i64, fund_code: &str) -> PipelineResult<PreflightReport> {
        let ctx = build_context(&self.db, process_id)?;
        Ok(preflight::check(fund_code, &ctx))
    }

    /// Generate and record the documents a fund requires. Each call produces
    /// new files and rows; earlier ones are kept.
    pub fn generate_documents(&self, process_id: i64, fund_code: &str) -> PipelineResult<Vec<GeneratedSummary>> {
        let process = self.require_process(process_id)?;
        let ctx = build_context(&self.db, process_id)?;

        let form_data = match self.db.latest_form(process_id)? {
            Some(form) => form.to_context(),
            None => {
                tracing::warn!(process_id, "No form submitted, generating with an empty form");
                json!({})
            }
        };
        let photos: Vec<Value> = self
            .db
            .list_photos(process_id)?
            .into_iter()
            .map(|p| {
                json!({
                    "path": p.file_path,
                    "description": p.description.unwrap_or_default(),
                })
            })
            .collect();

        let legal = self.llm.as_ref().map(|c| c as &dyn LegalTextGenerator);
        let artifacts = DocumentGenerator::new(&self.storage)
            .with_legal_text(legal)
            .with_templates(self.templates.as_deref())
            .generate(fund_code, process_id, process.zone_id, &form_data, &photos, Some(&ctx))?;

        let mut out = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let file_path = path_string(&artifact.path);
            let size_bytes = std::fs::metadata(&artifact.path)
                .ok()
                .map(|m| m.len() as i64);
            let id = self.db.insert_generated_document(&NewGeneratedDocument {
                process_id,
                fund_code,
                document_type: &artifact.doc_type,
                file_path: &file_path,
                mime_type: &artifact.mime,
                size_bytes,
                prompt_version: &artifact.prompt_version,
                inputs_hash: &artifact.inputs_hash,
            })?;
            out.push(GeneratedSummary {
                id,
                name: artifact.name,
                doc_type: artifact.doc_type,
                mime: artifact.mime,
                prompt_version: artifact.prompt_version,
                inputs_hash: artifact.inputs_hash,
                path: artifact.path,
            });
        }

        self.db
            .update_process_status(process_id, ProcessStatus::DocumentsGenerated)?;
        tracing::info!(process_id, fund = fund_code, count = out.len(), "Documents generated");
        Ok(out)
    }

    pub fn open_document(&self, document_id: i64) -> PipelineResult<OpenedDocument> {
        let doc = self
            .db
            .get_generated_document(document_id)?
            .ok_or(PipelineError::DocumentNotFound(document_id))?;

        let (bytes, mime, filename) = self.storage.open_document(Path::new(&doc.file_path))?;
        Ok(OpenedDocument {
            bytes,
            mime,
            filename,
        })
    }

    pub fn list_documents(&self, process_id: i64) -> PipelineResult<Vec<GeneratedDocument>> {
        self.require_process(process_id)?;
        Ok(self.db.list_generated_documents(process_id)?)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::docgen::{PROMPT_VERSION_BASE, PROMPT_VERSION_LLM};
    use crate::llm::client::tests::{scripted_client, ScriptedProvider};
    use crate::preflight::CheckStatus;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn service() -> (TempDir, ProcessService) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path());
        storage.init().unwrap();
        (dir, ProcessService::new(test_db(), storage))
    }

    fn upload(name: &str) -> UploadedFile {
        UploadedFile {
            filename: Some(name.to_string()),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    fn form() -> FormInput {
        FormInput {
            responsavel: "Ana".to_string(),
            data_vistoria: "2024-01-01".to_string(),
            observacoes: "Trincas".to_string(),
            acao_imediata: "Interdição".to_string(),
        }
    }

    #[test]
    fn test_create_process_context_handling() {
        let (_dir, svc) = service();

        let p = svc.create_process(Some(3), Some(r#"{"zone":{"id":3}}"#)).unwrap();
        assert_eq!(p.status, ProcessStatus::Draft);
        assert_eq!(p.zone_id, Some(3));

        let bad = svc.create_process(None, Some("{oops")).unwrap();
        let stored: Value = serde_json::from_str(bad.context_json.as_deref().unwrap()).unwrap();
        assert_eq!(stored, json!({"_warning": "invalid_context_payload"}));

        let empty = svc.create_process(None, None).unwrap();
        assert_eq!(empty.context_json.as_deref(), Some("{}"));
    }

    #[test]
    fn test_upload_photos_offline() {
        let (_dir, svc) = service();
        let p = svc.create_process(None, None).unwrap();

        let photos = svc
            .upload_photos(p.id, &[upload("casa.jpg"), upload("rua.jpg")])
            .unwrap();
        assert_eq!(photos.len(), 2);
        assert!(photos[0].file_path.ends_with("0_casa.jpg"));
        assert!(photos[0]
            .description
            .as_deref()
            .unwrap()
            .starts_with("Descrição automática (offline)"));

        let process = svc.get_process(p.id).unwrap();
        assert_eq!(process.status, ProcessStatus::PhotosCaptured);
        let stored = parse_stored_context(process.context_json.as_deref());
        assert_eq!(stored["photos"].as_array().unwrap().len(), 2);

        let more = svc.upload_photos(p.id, &[upload("muro.jpg")]).unwrap();
        assert_eq!(more.len(), 1);
        assert!(more[0].file_path.ends_with("2_muro.jpg"));
        assert_eq!(svc.context(p.id).unwrap()["photos"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_upload_with_ai_descriptions() {
        let (_dir, svc) = service();
        let provider = Arc::new(ScriptedProvider::new(&["primary"], vec![]));
        let svc = svc.with_llm(Some(scripted_client(provider)));
        let p = svc.create_process(None, None).unwrap();

        let photos = svc.upload_photos(p.id, &[upload("encosta.jpg")]).unwrap();
        assert_eq!(photos[0].description.as_deref(), Some("descrição de 0_encosta.jpg"));
    }

    #[test]
    fn test_upload_rejects_empty_batch_and_missing_process() {
        let (_dir, svc) = service();
        let p = svc.create_process(None, None).unwrap();
        assert!(matches!(
            svc.upload_photos(p.id, &[]),
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.upload_photos(999, &[upload("a.jpg")]),
            Err(PipelineError::ProcessNotFound(999))
        ));
    }

    #[test]
    fn test_submit_form_validation_and_status() {
        let (_dir, svc) = service();
        let p = svc.create_process(None, None).unwrap();

        let mut blank = form();
        blank.responsavel = "  ".to_string();
        assert!(matches!(
            svc.submit_form(p.id, &blank),
            Err(PipelineError::InvalidInput(_))
        ));

        svc.submit_form(p.id, &form()).unwrap();
        let process = svc.get_process(p.id).unwrap();
        assert_eq!(process.status, ProcessStatus::FormFilled);
        assert_eq!(svc.context(p.id).unwrap()["form"]["acao_imediata"], "Interdição");
    }

    #[test]
    fn test_update_context_shallow_merge() {
        let (_dir, svc) = service();
        let p = svc
            .create_process(None, Some(r#"{"zone":{"id":1,"level":"ALTO"},"extra":true}"#))
            .unwrap();

        let ctx = svc
            .update_context(p.id, &json!({"zone": {"id": 2}, "financials": {"custo_prevencao_total": 10}}))
            .unwrap();
        assert_eq!(ctx["zone"], json!({"id": 2}));
        assert_eq!(ctx["extra"], json!(true));
        assert_eq!(ctx["financials"]["custo_prevencao_total"], 10);

        assert!(matches!(
            svc.update_context(p.id, &json!([1])),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_preflight_goes_ok_once_populated() {
        let (_dir, svc) = service();
        let p = svc.create_process(None, None).unwrap();
        assert_eq!(svc.preflight(p.id, "FNMC").unwrap().status, CheckStatus::Pending);

        svc.upload_photos(p.id, &[upload("a.jpg")]).unwrap();
        svc.submit_form(p.id, &form()).unwrap();
        svc.update_context(
            p.id,
            &json!({
                "zone": {"id": 1, "coordinates": {"lat": -23.5, "lon": -46.6}},
                "financials": {"custo_prevencao_total": 150000}
            }),
        )
        .unwrap();
        assert_eq!(svc.preflight(p.id, "FNMC").unwrap().status, CheckStatus::Ok);
    }

    #[test]
    fn test_generate_records_documents() {
        let (_dir, svc) = service();
        let p = svc.create_process(Some(4), None).unwrap();

        let docs = svc.generate_documents(p.id, "FEP-EXEMPLO").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(svc.get_process(p.id).unwrap().status, ProcessStatus::DocumentsGenerated);

        let rows = svc.list_documents(p.id).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fund_code, "FEP-EXEMPLO");
        assert_eq!(rows[0].prompt_version.as_deref(), Some(PROMPT_VERSION_BASE));
        assert!(rows[0].size_bytes.unwrap() > 0);

        let opened = svc.open_document(docs[0].id).unwrap();
        assert_eq!(opened.mime, "application/pdf");
        assert_eq!(opened.filename, "RelatorioFotografico_1.pdf");
        assert!(opened.bytes.starts_with(b"%PDF"));

        svc.generate_documents(p.id, "FEP-EXEMPLO").unwrap();
        assert_eq!(svc.list_documents(p.id).unwrap().len(), 4);
    }

    #[test]
    fn test_generate_with_ai_text() {
        let (_dir, svc) = service();
        let provider = Arc::new(ScriptedProvider::new(
            &["primary"],
            vec![Ok("Objeto\n\nTexto formal.".to_string())],
        ));
        let svc = svc.with_llm(Some(scripted_client(provider)));
        let p = svc.create_process(None, None).unwrap();

        let docs = svc.generate_documents(p.id, "FEP-EXEMPLO").unwrap();
        assert_eq!(docs[0].prompt_version, PROMPT_VERSION_LLM);
        assert_eq!(docs[1].prompt_version, PROMPT_VERSION_BASE);
    }

    #[test]
    fn test_errors_for_unknown_ids_and_funds() {
        let (_dir, svc) = service();
        let p = svc.create_process(None, None).unwrap();

        assert!(matches!(
            svc.generate_documents(p.id, "NOPE"),
            Err(PipelineError::UnsupportedFund(_))
        ));
        assert!(matches!(
            svc.generate_documents(77, "FNMC"),
            Err(PipelineError::ProcessNotFound(77))
        ));
        assert!(matches!(svc.open_document(5), Err(PipelineError::DocumentNotFound(5))));
        assert_eq!(svc.get_process(p.id).unwrap().status, ProcessStatus::Draft);
    }
}
