//! AI-written legal prose for fund documents.

use anyhow::Result;

use super::client::LlmClient;
use crate::context::Context;

const LEGAL_MAX_TOKENS: u32 = 3000;

/// What the generator is asked to write.
#[derive(Debug, Clone, Copy)]
pub struct LegalTextRequest<'a> {
    pub fund_name: &'a str,
    pub doc_type: &'a str,
    pub context: &'a Context,
    pub sections: &'a [String],
}

/// Capability boundary for long-form legal text. Implementations may fail or
/// return empty text; callers treat both as "not available".
pub trait LegalTextGenerator: Send + Sync {
    fn generate_legal_text(&self, request: &LegalTextRequest<'_>) -> Result<String>;
}

impl LegalTextGenerator for LlmClient {
    fn generate_legal_text(&self, request: &LegalTextRequest<'_>) -> Result<String> {
        let prompt = build_legal_prompt(request)?;
        let text = self.generate_text(&prompt, LEGAL_MAX_TOKENS)?;
        Ok(strip_code_fences(&text))
    }
}

pub fn build_legal_prompt(request: &LegalTextRequest<'_>) -> Result<String> {
    let context_json = serde_json::to_string_pretty(request.context)?;
    let outline = request
        .sections
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "Você é um assessor jurídico de Defesa Civil municipal. Redija o documento \
         \"{doc_type}\" para submissão ao {fund_name}.\n\n\
         Use linguagem formal, impessoal e técnica, em português do Brasil. \
         Estruture o texto exatamente nas seções abaixo, nesta ordem, usando o nome \
         de cada seção como título:\n{outline}\n\n\
         Use apenas os dados do contexto a seguir. Quando um dado não estiver \
         disponível, escreva \"N/D\". Não reproduza o JSON nem listas de chaves e \
         valores; incorpore cada dado ao texto corrido. Separe parágrafos com uma \
         linha em branco e não use Markdown.\n\n\
         CONTEXTO:\n{context_json}\n",
        doc_type = request.doc_type,
        fund_name = request.fund_name,
        outline = outline,
        context_json = context_json,
    ))
}

/// Models sometimes wrap the whole answer in a Markdown code block.
fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();

    if trimmed.starts_with("```") {
        if let Some(start) = trimmed.find('\n') {
            let after_first_line = &trimmed[start + 1..];
            if let Some(end) = after_first_line.rfind("```") {
                return after_first_line[..end].trim().to_string();
            }
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::tests::{scripted_client, ScriptedProvider};
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> Context {
        json!({"zone": {"id": 3}, "form": {"responsavel": "Ana"}})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_prompt_lists_sections_in_order() {
        let ctx = context();
        let sections = vec!["Objeto".to_string(), "Fundamentação Legal".to_string()];
        let prompt = build_legal_prompt(&LegalTextRequest {
            fund_name: "Fundo Nacional sobre Mudança do Clima",
            doc_type: "OficioNotificacao",
            context: &ctx,
            sections: &sections,
        })
        .unwrap();

        assert!(prompt.contains("\"OficioNotificacao\""));
        assert!(prompt.contains("1. Objeto\n2. Fundamentação Legal"));
        assert!(prompt.contains("\"responsavel\": \"Ana\""));
    }

    #[test]
    fn test_code_fences_are_removed() {
        assert_eq!(strip_code_fences("```text\nCorpo\n```"), "Corpo");
        assert_eq!(strip_code_fences("  Corpo  "), "Corpo");
    }

    #[test]
    fn test_client_generates_legal_text() {
        let provider = Arc::new(ScriptedProvider::new(
            &["primary"],
            vec![Ok("```\nINTRODUÇÃO\n\nTexto.\n```".to_string())],
        ));
        let client = scripted_client(provider);
        let ctx = context();
        let text = client
            .generate_legal_text(&LegalTextRequest {
                fund_name: "F",
                doc_type: "D",
                context: &ctx,
                sections: &[],
            })
            .unwrap();
        assert_eq!(text, "INTRODUÇÃO\n\nTexto.");
    }
}
