mod schema;
pub mod document;
pub mod form;
pub mod photo;
pub mod process;

use rusqlite::Connection;
use std::path::Path;

pub use schema::{DROP_ALL, MIGRATIONS, SCHEMA};

use crate::error::PipelineResult;

/// SQLite-backed record store for processes, photos, forms and generated documents.
pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> PipelineResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> PipelineResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn initialize(&self) -> PipelineResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.run_migrations();
        Ok(())
    }

    fn run_migrations(&self) {
        for migration in MIGRATIONS {
            let _ = self.conn.execute(migration, []);
        }
    }

    /// Drop and recreate every table. Development use only.
    pub fn reset(&self) -> PipelineResult<()> {
        tracing::warn!("Dropping and recreating all tables");
        self.conn.execute_batch(DROP_ALL)?;
        self.initialize()
    }
}

#[cfg(test)]
pub(crate) fn test_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_is_idempotent() {
        let db = test_db();
        db.initialize().unwrap();
        db.initialize().unwrap();
    }

    #[test]
    fn test_reset_clears_rows() {
        let db = test_db();
        let id = db.create_process(None, "{}").unwrap();
        assert!(db.get_process(id).unwrap().is_some());

        db.reset().unwrap();
        assert!(db.get_process(id).unwrap().is_none());
    }

    #[test]
    fn test_open_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/climaseguro.db");
        let db = Database::open(&path).unwrap();
        db.initialize().unwrap();
        assert!(path.exists());
    }
}
