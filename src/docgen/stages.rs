//! The ordered generation cascade.
//!
//! Each stage either produces a rendered document or skips with a reason.
//! The fallback stage never skips: if its PDF cannot be rendered it degrades
//! to plain text.

use anyhow::Result;
use serde_json::Value;

use super::compose::compose_fallback_legal_text;
use super::provenance::{PROMPT_VERSION_BASE, PROMPT_VERSION_LLM};
use super::sections::sections_for;
use super::template::TemplateRenderer;
use crate::context::Context;
use crate::funds::FundDefinition;
use crate::llm::{LegalTextGenerator, LegalTextRequest};

pub const PDF_MIME: &str = "application/pdf";
pub const TEXT_MIME: &str = "text/plain; charset=utf-8";

/// Signature of the PDF renderer used by every stage.
pub type PdfRenderFn = fn(&str, &[String]) -> Result<Vec<u8>>;

/// Document bytes ready to be written.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub mime: &'static str,
    pub prompt_version: &'static str,
}

#[derive(Debug)]
pub enum StageOutcome {
    Success(Rendered),
    Skip(String),
}

/// Everything a stage needs to know about the document being produced.
pub struct StageInput<'a> {
    pub fund: &'a FundDefinition,
    pub doc_type: &'a str,
    pub title: &'a str,
    pub context: &'a Context,
    pub form: &'a Value,
}

/// Optional collaborators the stages call out to.
#[derive(Clone, Copy)]
pub struct Adapters<'a> {
    pub legal: Option<&'a dyn LegalTextGenerator>,
    pub templates: Option<&'a dyn TemplateRenderer>,
    pub pdf: PdfRenderFn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LegalText,
    Template,
    Fallback,
}

/// Stages tried in order before the fallback, which always produces output.
pub const OPTIONAL_STAGES: [Stage; 2] = [Stage::LegalText, Stage::Template];

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::LegalText => "legal_text",
            Stage::Template => "template",
            Stage::Fallback => "fallback",
        }
    }

    pub fn run(&self, input: &StageInput<'_>, adapters: &Adapters<'_>) -> StageOutcome {
        match self {
            Stage::LegalText => legal_text_stage(input, adapters),
            Stage::Template => template_stage(input, adapters),
            Stage::Fallback => StageOutcome::Success(render_fallback(input, adapters)),
        }
    }
}

fn render_pdf(
    input: &StageInput<'_>,
    adapters: &Adapters<'_>,
    text: String,
    prompt_version: &'static str,
) -> Result<Rendered> {
    let bytes = (adapters.pdf)(input.title, &[text])?;
    Ok(Rendered {
        bytes,
        extension: "pdf",
        mime: PDF_MIME,
        prompt_version,
    })
}

fn legal_text_stage(input: &StageInput<'_>, adapters: &Adapters<'_>) -> StageOutcome {
    let Some(generator) = adapters.legal else {
        return StageOutcome::Skip("legal text generator unavailable".to_string());
    };

    let sections = sections_for(input.fund.code, input.fund.name, input.doc_type);
    let request = LegalTextRequest {
        fund_name: input.fund.name,
        doc_type: input.doc_type,
        context: input.context,
        sections: &sections,
    };

    let text = match generator.generate_legal_text(&request) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => return StageOutcome::Skip("legal text generator returned empty text".to_string()),
        Err(e) => return StageOutcome::Skip(format!("legal text generation failed: {:#}", e)),
    };

    match render_pdf(input, adapters, text, PROMPT_VERSION_LLM) {
        Ok(rendered) => StageOutcome::Success(rendered),
        Err(e) => StageOutcome::Skip(format!("PDF rendering failed: {:#}", e)),
    }
}

fn template_stage(input: &StageInput<'_>, adapters: &Adapters<'_>) -> StageOutcome {
    let Some(renderer) = adapters.templates else {
        return StageOutcome::Skip("no template renderer configured".to_string());
    };

    let text = match renderer.render(input.fund.code, input.doc_type, input.context, input.fund.name) {
        Ok(Some(text)) if !text.trim().is_empty() => text,
        Ok(Some(_)) => return StageOutcome::Skip("template rendered empty text".to_string()),
        Ok(None) => return StageOutcome::Skip("template not found".to_string()),
        Err(e) => return StageOutcome::Skip(format!("template rendering failed: {:#}", e)),
    };

    match render_pdf(input, adapters, text, PROMPT_VERSION_BASE) {
        Ok(rendered) => StageOutcome::Success(rendered),
        Err(e) => StageOutcome::Skip(format!("PDF rendering failed: {:#}", e)),
    }
}

/// Locally composed text, as PDF or, failing that, plain text.
pub fn render_fallback(input: &StageInput<'_>, adapters: &Adapters<'_>) -> Rendered {
    let text = compose_fallback_legal_text(input.fund.name, input.doc_type, input.context, input.form);
    match render_pdf(input, adapters, text.clone(), PROMPT_VERSION_BASE) {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::warn!(
                doc_type = input.doc_type,
                error = %format!("{:#}", e),
                "PDF rendering failed, storing plain text"
            );
            plain_text(input.title, &text)
        }
    }
}

/// The degraded form of a document: title, blank line, body.
pub fn plain_text(title: &str, body: &str) -> Rendered {
    Rendered {
        bytes: format!("{title}\n\n{body}\n").into_bytes(),
        extension: "txt",
        mime: TEXT_MIME,
        prompt_version: PROMPT_VERSION_BASE,
    }
}
