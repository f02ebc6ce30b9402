//! Fund and document-type specific text templates.
//!
//! Templates are plain text files at `<dir>/<FUND_CODE>/<DocType>.txt` with
//! `{{dotted.path}}` placeholders resolved against the context. `{{fund_name}}`
//! is always available. Unresolved placeholders render as `N/D`.

use anyhow::{Context as _, Result};
use regex::{Captures, Regex};
use std::path::PathBuf;
use std::sync::LazyLock;

use super::compose::{display_value, MISSING};
use crate::context::{lookup, Context};

pub trait TemplateRenderer: Send + Sync {
    /// Render the template for a fund and document type. `Ok(None)` when no
    /// such template exists.
    fn render(
        &self,
        fund_code: &str,
        doc_type: &str,
        ctx: &Context,
        fund_name: &str,
    ) -> Result<Option<String>>;
}

pub struct FsTemplateRenderer {
    dir: PathBuf,
}

impl FsTemplateRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn template_path(&self, fund_code: &str, doc_type: &str) -> Option<PathBuf> {
        // Reject keys that would leave the template directory.
        let safe = |s: &str| !s.is_empty() && !s.contains(['/', '\\']) && s != "..";
        if !safe(fund_code) || !safe(doc_type) {
            return None;
        }
        Some(self.dir.join(fund_code).join(format!("{doc_type}.txt")))
    }
}

impl TemplateRenderer for FsTemplateRenderer {
    fn render(
        &self,
        fund_code: &str,
        doc_type: &str,
        ctx: &Context,
        fund_name: &str,
    ) -> Result<Option<String>> {
        let Some(path) = self.template_path(fund_code, doc_type) else {
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("reading template {}", path.display()))?;
        Ok(Some(substitute(&source, ctx, fund_name)))
    }
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").unwrap());

/// Replace every placeholder in `source`.
pub fn substitute(source: &str, ctx: &Context, fund_name: &str) -> String {
    PLACEHOLDER
        .replace_all(source, |caps: &Captures| {
            let key = &caps[1];
            if key == "fund_name" {
                return fund_name.to_string();
            }
            lookup(ctx, key)
                .and_then(display_value)
                .unwrap_or_else(|| MISSING.to_string())
        })
        .into_owned()
}
