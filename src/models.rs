//! Records owned by the persistence layer.

use serde::{Deserialize, Serialize};

/// Lifecycle of a prevention process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Draft,
    PhotosCaptured,
    FormFilled,
    DocumentsGenerated,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Draft => "draft",
            ProcessStatus::PhotosCaptured => "photos_captured",
            ProcessStatus::FormFilled => "form_filled",
            ProcessStatus::DocumentsGenerated => "documents_generated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ProcessStatus::Draft),
            "photos_captured" => Some(ProcessStatus::PhotosCaptured),
            "form_filled" => Some(ProcessStatus::FormFilled),
            "documents_generated" => Some(ProcessStatus::DocumentsGenerated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Process {
    pub id: i64,
    pub zone_id: Option<i64>,
    pub status: ProcessStatus,
    /// Serialized context mapping. Not guaranteed to be valid JSON.
    pub context_json: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Photo {
    pub id: i64,
    pub process_id: i64,
    pub file_path: String,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Form {
    pub id: i64,
    pub process_id: i64,
    pub inspector_name: String,
    pub inspection_date: String,
    pub technical_notes: Option<String>,
    pub immediate_action: Option<String>,
    pub created_at: String,
}

impl Form {
    /// The form as it appears in the consolidated context.
    pub fn to_context(&self) -> serde_json::Value {
        serde_json::json!({
            "responsavel": self.inspector_name,
            "data_vistoria": self.inspection_date,
            "observacoes": self.technical_notes,
            "acao_imediata": self.immediate_action,
        })
    }
}

/// A form submission before it is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    pub responsavel: String,
    pub data_vistoria: String,
    #[serde(default)]
    pub observacoes: String,
    #[serde(default)]
    pub acao_imediata: String,
}

impl FormInput {
    pub fn to_context(&self) -> serde_json::Value {
        serde_json::json!({
            "responsavel": self.responsavel,
            "data_vistoria": self.data_vistoria,
            "observacoes": self.observacoes,
            "acao_imediata": self.acao_imediata,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub id: i64,
    pub process_id: i64,
    pub fund_code: String,
    pub document_type: String,
    pub file_path: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub prompt_version: Option<String>,
    pub inputs_hash: Option<String>,
    pub created_at: String,
}

/// Fields needed to insert a generated document row.
#[derive(Debug, Clone)]
pub struct NewGeneratedDocument<'a> {
    pub process_id: i64,
    pub fund_code: &'a str,
    pub document_type: &'a str,
    pub file_path: &'a str,
    pub mime_type: &'a str,
    pub size_bytes: Option<i64>,
    pub prompt_version: &'a str,
    pub inputs_hash: &'a str,
}
