//! Generated document rows. Rows are only ever appended.

use rusqlite::{params, OptionalExtension, Result, Row};

use super::Database;
use crate::models::{GeneratedDocument, NewGeneratedDocument};

const DOCUMENT_COLUMNS: &str = "id, process_id, fund_code, document_type, file_path, mime_type, \
                                size_bytes, prompt_version, inputs_hash, created_at";

fn document_from_row(row: &Row<'_>) -> Result<GeneratedDocument> {
    Ok(GeneratedDocument {
        id: row.get(0)?,
        process_id: row.get(1)?,
        fund_code: row.get(2)?,
        document_type: row.get(3)?,
        file_path: row.get(4)?,
        mime_type: row.get(5)?,
        size_bytes: row.get(6)?,
        prompt_version: row.get(7)?,
        inputs_hash: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl Database {
    pub fn insert_generated_document(&self, doc: &NewGeneratedDocument<'_>) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO generated_document
                (process_id, fund_code, document_type, file_path, mime_type,
                 size_bytes, prompt_version, inputs_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                doc.process_id,
                doc.fund_code,
                doc.document_type,
                doc.file_path,
                doc.mime_type,
                doc.size_bytes,
                doc.prompt_version,
                doc.inputs_hash,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_generated_document(&self, id: i64) -> Result<Option<GeneratedDocument>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM generated_document WHERE id = ?", DOCUMENT_COLUMNS),
                [id],
                document_from_row,
            )
            .optional()
    }

    pub fn list_generated_documents(&self, process_id: i64) -> Result<Vec<GeneratedDocument>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM generated_document WHERE process_id = ? ORDER BY id ASC",
            DOCUMENT_COLUMNS
        ))?;

        let docs = stmt
            .query_map([process_id], document_from_row)?
            .collect::<Result<Vec<_>>>()?;

        Ok(docs)
    }
}
