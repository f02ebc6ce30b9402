//! Form rows. Several forms may exist per process; the newest one wins.

use rusqlite::{params, OptionalExtension, Result};

use super::Database;
use crate::models::{Form, FormInput};

impl Database {
    pub fn insert_form(&self, process_id: i64, input: &FormInput) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO process_form
                (process_id, inspector_name, inspection_date, technical_notes, immediate_action)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                process_id,
                input.responsavel,
                input.data_vistoria,
                input.observacoes,
                input.acao_imediata,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn latest_form(&self, process_id: i64) -> Result<Option<Form>> {
        self.conn
            .query_row(
                r#"
                SELECT id, process_id, inspector_name, inspection_date,
                       technical_notes, immediate_action, created_at
                FROM process_form
                WHERE process_id = ?
                ORDER BY id DESC
                LIMIT 1
                "#,
                [process_id],
                |row| {
                    Ok(Form {
                        id: row.get(0)?,
                        process_id: row.get(1)?,
                        inspector_name: row.get(2)?,
                        inspection_date: row.get(3)?,
                        technical_notes: row.get(4)?,
                        immediate_action: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            )
            .optional()
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_db;
    use crate::models::FormInput;

    fn input(name: &str) -> FormInput {
        FormInput {
            responsavel: name.to_string(),
            data_vistoria: "2024-01-01".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_latest_form_wins() {
        let db = test_db();
        let pid = db.create_process(None, "{}").unwrap();

        db.insert_form(pid, &input("Ana")).unwrap();
        db.insert_form(pid, &input("Bruno")).unwrap();

        let form = db.latest_form(pid).unwrap().unwrap();
        assert_eq!(form.inspector_name, "Bruno");
    }

    #[test]
    fn test_no_form() {
        let db = test_db();
        let pid = db.create_process(None, "{}").unwrap();
        assert!(db.latest_form(pid).unwrap().is_none());
    }
}
