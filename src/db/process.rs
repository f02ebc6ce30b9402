//! Process rows.

use rusqlite::{params, OptionalExtension, Result};

use super::Database;
use crate::models::{Process, ProcessStatus};

impl Database {
    pub fn create_process(&self, zone_id: Option<i64>, context_json: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO prevention_process (zone_id, status, context_json) VALUES (?, ?, ?)",
            params![zone_id, ProcessStatus::Draft.as_str(), context_json],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_process(&self, id: i64) -> Result<Option<Process>> {
        self.conn
            .query_row(
                r#"
                SELECT id, zone_id, status, context_json, created_at, updated_at
                FROM prevention_process
                WHERE id = ?
                "#,
                [id],
                |row| {
                    let status: String = row.get(2)?;
                    Ok(Process {
                        id: row.get(0)?,
                        zone_id: row.get(1)?,
                        status: ProcessStatus::from_str(&status).unwrap_or(ProcessStatus::Draft),
                        context_json: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional()
    }

    pub fn update_process_context(&self, id: i64, context_json: &str) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE prevention_process
            SET context_json = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![context_json, id],
        )?;
        Ok(())
    }

    pub fn update_process_status(&self, id: i64, status: ProcessStatus) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE prevention_process
            SET status = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![status.as_str(), id],
        )?;
        Ok(())
    }
}
