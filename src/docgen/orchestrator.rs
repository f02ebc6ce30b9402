use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use super::provenance::inputs_hash;
use super::stages::{
    render_fallback, Adapters, PdfRenderFn, Rendered, Stage, StageInput, StageOutcome,
    OPTIONAL_STAGES,
};
use super::template::TemplateRenderer;
use crate::context::Context;
use crate::error::{PipelineError, PipelineResult};
use crate::funds;
use crate::llm::LegalTextGenerator;
use crate::pdf;
use crate::storage::Storage;

/// One produced document, as returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentArtifact {
    pub name: String,
    pub doc_type: String,
    pub path: PathBuf,
    pub mime: String,
    pub prompt_version: String,
    pub inputs_hash: String,
}

/// Produces the required document set of a fund for one process.
pub struct DocumentGenerator<'a> {
    storage: &'a Storage,
    adapters: Adapters<'a>,
}

impl<'a> DocumentGenerator<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            adapters: Adapters {
                legal: None,
                templates: None,
                pdf: pdf::render,
            },
        }
    }

    pub fn with_legal_text(mut self, legal: Option<&'a dyn LegalTextGenerator>) -> Self {
        self.adapters.legal = legal;
        self
    }

    pub fn with_templates(mut self, templates: Option<&'a dyn TemplateRenderer>) -> Self {
        self.adapters.templates = templates;
        self
    }

    pub fn with_pdf_renderer(mut self, pdf: PdfRenderFn) -> Self {
        self.adapters.pdf = pdf;
        self
    }

    /// Generate one artifact per required document type of `fund_code`, in
    /// catalog order. Only storage write failures abort the run.
    pub fn generate(
        &self,
        fund_code: &str,
        process_id: i64,
        zone_id: Option<i64>,
        form_data: &Value,
        photos: &[Value],
        context: Option<&Context>,
    ) -> PipelineResult<Vec<DocumentArtifact>> {
        let fund = funds::get(fund_code)
            .ok_or_else(|| PipelineError::UnsupportedFund(fund_code.to_string()))?;

        let hash = inputs_hash(process_id, zone_id, form_data, photos, context);
        let minimal;
        let context = match context {
            Some(ctx) => ctx,
            None => {
                minimal = minimal_context(zone_id, form_data, photos);
                &minimal
            }
        };

        tracing::info!(
            process_id,
            fund = fund.code,
            documents = fund.required_documents.len(),
            "Generating documents"
        );

        let mut artifacts = Vec::with_capacity(fund.required_documents.len());
        for &doc_type in fund.required_documents {
            let title = format!("{} - {}", fund.name, doc_type);
            let input = StageInput {
                fund,
                doc_type,
                title: &title,
                context,
                form: form_data,
            };
            let rendered = self.run_cascade(process_id, &input);

            let filename = format!("{}_{}.{}", doc_type, process_id, rendered.extension);
            let path = self.storage.reserve_path(process_id, &filename)?;
            self.storage.write(&path, &rendered.bytes)?;

            tracing::debug!(process_id, doc_type, path = %path.display(), "Document written");

            artifacts.push(DocumentArtifact {
                name: title,
                doc_type: doc_type.to_string(),
                path,
                mime: rendered.mime.to_string(),
                prompt_version: rendered.prompt_version.to_string(),
                inputs_hash: hash.clone(),
            });
        }

        Ok(artifacts)
    }

    fn run_cascade(&self, process_id: i64, input: &StageInput<'_>) -> Rendered {
        for stage in OPTIONAL_STAGES {
            match stage.run(input, &self.adapters) {
                StageOutcome::Success(rendered) => {
                    log_rendered(process_id, input, stage, &rendered);
                    return rendered;
                }
                StageOutcome::Skip(reason) => {
                    tracing::info!(
                        process_id,
                        doc_type = input.doc_type,
                        stage = stage.name(),
                        reason = %reason,
                        "Stage skipped"
                    );
                }
            }
        }

        let rendered = render_fallback(input, &self.adapters);
        log_rendered(process_id, input, Stage::Fallback, &rendered);
        rendered
    }
}

fn log_rendered(process_id: i64, input: &StageInput<'_>, stage: Stage, rendered: &Rendered) {
    tracing::info!(
        process_id,
        doc_type = input.doc_type,
        stage = stage.name(),
        mime = rendered.mime,
        "Document rendered"
    );
}

/// Context used when the caller did not supply one.
fn minimal_context(zone_id: Option<i64>, form: &Value, photos: &[Value]) -> Context {
    let mut ctx = Context::new();
    let zone = match zone_id {
        Some(id) => json!({ "id": id }),
        None => json!({}),
    };
    ctx.insert("zone".to_string(), zone);
    ctx.insert("demographics".to_string(), json!({}));
    ctx.insert("financials".to_string(), json!({}));
    ctx.insert("photos".to_string(), Value::Array(photos.to_vec()));
    ctx.insert("form".to_string(), form.clone());
    ctx
}
