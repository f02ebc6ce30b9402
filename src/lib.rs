//! Disaster-prevention process intake and grant document generation.
//!
//! A prevention process collects inspection photos and a form for a risk
//! zone. Its consolidated context feeds the document pipeline, which writes
//! the paperwork each grant fund requires.

pub mod config;
pub mod context;
pub mod db;
pub mod docgen;
pub mod error;
pub mod export;
pub mod funds;
pub mod llm;
pub mod logging;
pub mod models;
pub mod pdf;
pub mod preflight;
pub mod risk;
pub mod service;
pub mod storage;

pub use error::{PipelineError, PipelineResult};
pub use service::ProcessService;
