//! Photo rows.

use rusqlite::{params, Result};

use super::Database;
use crate::models::Photo;

impl Database {
    pub fn insert_photo(
        &self,
        process_id: i64,
        file_path: &str,
        description: Option<&str>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO process_photo (process_id, file_path, description_ai) VALUES (?, ?, ?)",
            params![process_id, file_path, description],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Back-fill the AI description of a photo.
    pub fn save_photo_description(&self, photo_id: i64, description: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE process_photo SET description_ai = ? WHERE id = ?",
            params![description, photo_id],
        )?;
        Ok(())
    }

    /// All photos of a process in creation order.
    pub fn list_photos(&self, process_id: i64) -> Result<Vec<Photo>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, process_id, file_path, description_ai, created_at
            FROM process_photo
            WHERE process_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )?;

        let photos = stmt
            .query_map([process_id], |row| {
                Ok(Photo {
                    id: row.get(0)?,
                    process_id: row.get(1)?,
                    file_path: row.get(2)?,
                    description: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(photos)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_db;

    #[test]
    fn test_photos_in_insertion_order() {
        let db = test_db();
        let pid = db.create_process(None, "{}").unwrap();
        let other = db.create_process(None, "{}").unwrap();

        db.insert_photo(pid, "/img/1/0_a.jpg", Some("first")).unwrap();
        db.insert_photo(other, "/img/2/0_x.jpg", None).unwrap();
        db.insert_photo(pid, "/img/1/1_b.jpg", None).unwrap();

        let photos = db.list_photos(pid).unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].file_path, "/img/1/0_a.jpg");
        assert_eq!(photos[0].description.as_deref(), Some("first"));
        assert_eq!(photos[1].file_path, "/img/1/1_b.jpg");
        assert!(photos[1].description.is_none());
    }

    #[test]
    fn test_description_backfill() {
        let db = test_db();
        let pid = db.create_process(None, "{}").unwrap();
        let photo_id = db.insert_photo(pid, "/img/1/0_a.jpg", None).unwrap();

        db.save_photo_description(photo_id, "encosta com trincas").unwrap();

        let photos = db.list_photos(pid).unwrap();
        assert_eq!(photos[0].description.as_deref(), Some("encosta com trincas"));
    }
}
