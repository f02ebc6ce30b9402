//! Shapes of the optional fund reference files.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConstraints {
    pub max_size_mb: Option<f64>,
    pub max_pages: Option<u32>,
    pub orientation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredDocument {
    pub doc_type: String,
    pub title_official: Option<String>,
    pub format: Option<String>,
    pub template_url: Option<String>,
    pub content_requirements: Option<Vec<String>>,
    pub signatures: Option<Vec<String>>,
    pub attachments_required: Option<Vec<String>>,
    pub file_constraints: Option<FileConstraints>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionChannel {
    pub platform: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionStep {
    pub step: Option<u32>,
    pub name: Option<String>,
    pub who: Option<String>,
    pub details: Option<String>,
    pub sla_days: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionTimeline {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundItem {
    pub fund_name: String,
    pub alias: Option<Vec<String>>,
    pub jurisdiction: Option<String>,
    pub managing_agency: Option<String>,
    pub legal_basis: Option<Vec<String>>,
    pub program_focus: Option<Vec<String>>,
    pub eligible_beneficiaries: Option<Vec<String>>,
    pub eligible_projects: Option<Vec<String>>,
    pub funding_modalities: Option<Vec<String>>,
    pub typical_ticket_range_brl: Option<TicketRange>,
    pub cofinancing_requirements: Option<String>,
    pub submission_channel: Option<SubmissionChannel>,
    pub required_documents: Option<Vec<RequiredDocument>>,
    pub submission_steps: Option<Vec<SubmissionStep>>,
    pub decision_timeline_days: Option<DecisionTimeline>,
    pub monitoring_reporting: Option<Vec<String>>,
    pub common_pitfalls: Option<Vec<String>>,
    pub sources: Option<Vec<String>>,
    pub last_verified_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsOverview {
    pub funds: Vec<FundItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MandatorySection {
    pub section: String,
    pub description: Option<String>,
    pub evidence: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormattingRules {
    pub file_type: Option<String>,
    pub font_min_size: Option<u32>,
    pub margins: Option<String>,
    pub max_pages: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTemplate {
    pub fund_name: String,
    pub doc_type: String,
    pub mandatory_sections: Vec<MandatorySection>,
    pub data_inputs_mapping: Option<serde_json::Value>,
    pub formatting_rules: Option<FormattingRules>,
    pub signature_requirements: Option<Vec<String>>,
    pub validation_checklist: Option<Vec<String>>,
    pub sources: Option<Vec<String>>,
    pub last_verified_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTemplatesOutline {
    pub document_templates: Vec<DocumentTemplate>,
}
