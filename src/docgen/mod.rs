//! Fund document generation.
//!
//! For every document a fund requires, the cascade tries AI-written legal
//! text, then a fund template, then locally composed text. The first stage
//! that produces output wins; the result is rendered to PDF (or plain text if
//! rendering fails) and written to storage with its provenance.

pub mod compose;
pub mod orchestrator;
pub mod provenance;
pub mod sections;
pub mod stages;
pub mod template;

pub use compose::{compose_action_plan_text, compose_fallback_legal_text};
pub use orchestrator::{DocumentArtifact, DocumentGenerator};
pub use provenance::{inputs_hash, PROMPT_VERSION_BASE, PROMPT_VERSION_LLM};
pub use template::{FsTemplateRenderer, TemplateRenderer};
