//! Process-wide cache of optional fund reference data.
//!
//! Loaded once at startup with [`init`]; [`reset`] empties it again. A missing
//! or invalid file leaves its slot empty and is only logged.

use anyhow::{Context as _, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Arc, RwLock};

use super::schemas::{DocumentTemplate, DocumentTemplatesOutline, FundsOverview};

pub const OVERVIEW_FILE: &str = "funds_overview.json";
pub const TEMPLATES_FILE: &str = "document_templates_outline.json";

#[derive(Default)]
struct ReferenceData {
    overview: Option<Arc<FundsOverview>>,
    templates: Option<Arc<DocumentTemplatesOutline>>,
}

static CACHE: RwLock<ReferenceData> = RwLock::new(ReferenceData {
    overview: None,
    templates: None,
});

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn load_optional<T: DeserializeOwned>(path: &Path) -> Option<Arc<T>> {
    if !path.exists() {
        return None;
    }
    match read_json::<T>(path) {
        Ok(data) => Some(Arc::new(data)),
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Failed to load fund reference data");
            None
        }
    }
}

/// Load reference files from `dir`, replacing whatever was cached.
pub fn init(dir: Option<&Path>) {
    let (overview, templates) = match dir {
        Some(dir) => (
            load_optional::<FundsOverview>(&dir.join(OVERVIEW_FILE)),
            load_optional::<DocumentTemplatesOutline>(&dir.join(TEMPLATES_FILE)),
        ),
        None => (None, None),
    };

    tracing::info!(
        overview = overview.is_some(),
        templates = templates.is_some(),
        "Fund reference data initialized"
    );

    let mut cache = CACHE.write().unwrap_or_else(|e| e.into_inner());
    cache.overview = overview;
    cache.templates = templates;
}

pub fn reset() {
    let mut cache = CACHE.write().unwrap_or_else(|e| e.into_inner());
    *cache = ReferenceData::default();
}

pub fn overview() -> Option<Arc<FundsOverview>> {
    CACHE.read().unwrap_or_else(|e| e.into_inner()).overview.clone()
}

pub fn templates() -> Option<Arc<DocumentTemplatesOutline>> {
    CACHE.read().unwrap_or_else(|e| e.into_inner()).templates.clone()
}

fn matches_fund(template: &DocumentTemplate, fund_name: &str, fund_code: &str) -> bool {
    let name = template.fund_name.trim();
    name.eq_ignore_ascii_case(fund_name) || name.eq_ignore_ascii_case(fund_code)
}

/// Mandatory section names from the outline for this fund and document type.
pub fn mandatory_sections(fund_code: &str, fund_name: &str, doc_type: &str) -> Option<Vec<String>> {
    let outline = templates()?;
    let template = outline
        .document_templates
        .iter()
        .find(|t| t.doc_type == doc_type && matches_fund(t, fund_name, fund_code))?;

    let sections: Vec<String> = template
        .mandatory_sections
        .iter()
        .map(|s| s.section.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if sections.is_empty() {
        None
    } else {
        Some(sections)
    }
}

#[cfg(test)]
pub(crate) static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    const OUTLINE: &str = r#"{
        "document_templates": [{
            "fund_name": "Fundo Teste",
            "doc_type": "Oficio",
            "mandatory_sections": [
                {"section": "Cabeçalho"},
                {"section": "  "},
                {"section": "Pedido", "description": "o que se pede"}
            ]
        }]
    }"#;

    #[test]
    fn test_init_and_reset() {
        let _guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TEMPLATES_FILE), OUTLINE).unwrap();
        std::fs::write(dir.path().join(OVERVIEW_FILE), r#"{"funds":[{"fund_name":"Fundo Teste"}]}"#)
            .unwrap();

        init(Some(dir.path()));
        assert_eq!(overview().unwrap().funds[0].fund_name, "Fundo Teste");
        assert_eq!(
            mandatory_sections("FT", "fundo teste", "Oficio"),
            Some(vec!["Cabeçalho".to_string(), "Pedido".to_string()])
        );
        assert_eq!(mandatory_sections("FT", "Fundo Teste", "Outro"), None);

        reset();
        assert!(overview().is_none());
        assert!(templates().is_none());
    }

    #[test]
    fn test_invalid_file_is_not_fatal() {
        let _guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TEMPLATES_FILE), "{broken").unwrap();

        init(Some(dir.path()));
        assert!(templates().is_none());
        assert!(overview().is_none());
        reset();
    }
}
