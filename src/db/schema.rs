pub const SCHEMA: &str = r#"
-- Prevention processes: one case from intake to generated paperwork
CREATE TABLE IF NOT EXISTS prevention_process (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    zone_id INTEGER,
    status TEXT NOT NULL DEFAULT 'draft',  -- draft/photos_captured/form_filled/documents_generated
    context_json TEXT,                     -- consolidated context, serialized JSON
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT
);

-- Photos captured during inspection
CREATE TABLE IF NOT EXISTS process_photo (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    process_id INTEGER NOT NULL,
    file_path TEXT NOT NULL,
    description_ai TEXT,                   -- NULL until the description completes
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (process_id) REFERENCES prevention_process(id)
);

CREATE INDEX IF NOT EXISTS idx_process_photo_process ON process_photo(process_id);

-- Inspection forms; the most recent row per process wins
CREATE TABLE IF NOT EXISTS process_form (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    process_id INTEGER NOT NULL,
    inspector_name TEXT NOT NULL,
    inspection_date TEXT NOT NULL,
    technical_notes TEXT,
    immediate_action TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT,
    FOREIGN KEY (process_id) REFERENCES prevention_process(id)
);

CREATE INDEX IF NOT EXISTS idx_process_form_process ON process_form(process_id);

-- Generated documents, append-only
CREATE TABLE IF NOT EXISTS generated_document (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    process_id INTEGER NOT NULL,
    fund_code TEXT NOT NULL,
    document_type TEXT NOT NULL,
    file_path TEXT NOT NULL,
    mime_type TEXT,
    size_bytes INTEGER,
    -- Audit
    prompt_version TEXT,
    inputs_hash TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (process_id) REFERENCES prevention_process(id)
);

CREATE INDEX IF NOT EXISTS idx_generated_document_process ON generated_document(process_id);
CREATE INDEX IF NOT EXISTS idx_generated_document_hash ON generated_document(inputs_hash);
"#;

/// Column additions for databases created before the audit columns existed.
/// Each statement fails harmlessly when the column is already present.
pub const MIGRATIONS: &[&str] = &[
    "ALTER TABLE generated_document ADD COLUMN prompt_version TEXT",
    "ALTER TABLE generated_document ADD COLUMN inputs_hash TEXT",
    "ALTER TABLE process_form ADD COLUMN updated_at TEXT",
];

pub const DROP_ALL: &str = r#"
DROP TABLE IF EXISTS generated_document;
DROP TABLE IF EXISTS process_form;
DROP TABLE IF EXISTS process_photo;
DROP TABLE IF EXISTS prevention_process;
"#;
