//! Consolidated process context.
//!
//! The stored context blob is free-form and may be stale or corrupted. Photos
//! and the form are always taken from their tables; the blob only contributes
//! the sections nothing else owns (zone, demographics, financials, extras).

use serde_json::{json, Map, Value};

use crate::db::Database;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Form, Photo};

/// A consolidated context: a JSON object with the sections `zone`,
/// `demographics`, `financials`, `photos` and (when a form exists) `form`.
pub type Context = Map<String, Value>;

const DEFAULT_SECTIONS: [&str; 3] = ["zone", "demographics", "financials"];

/// Build the consolidated context for a process.
pub fn build_context(db: &Database, process_id: i64) -> PipelineResult<Context> {
    let process = db
        .get_process(process_id)?
        .ok_or(PipelineError::ProcessNotFound(process_id))?;

    let photos = db.list_photos(process_id)?;
    let form = db.latest_form(process_id)?;

    let mut ctx = parse_stored_context(process.context_json.as_deref());
    merge_relational(&mut ctx, &photos, form.as_ref());
    Ok(ctx)
}

/// Parse a stored blob. Anything that is not a JSON object becomes an empty context.
pub fn parse_stored_context(raw: Option<&str>) -> Context {
    let raw = match raw.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return Context::new(),
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::warn!("Stored context is not a JSON object, ignoring it");
            Context::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Stored context is malformed, ignoring it");
            Context::new()
        }
    }
}

/// Overwrite `photos` and `form` from relational rows and fill default sections.
pub fn merge_relational(ctx: &mut Context, photos: &[Photo], form: Option<&Form>) {
    let photos: Vec<Value> = photos
        .iter()
        .map(|p| {
            json!({
                "path": p.file_path,
                "description": p.description.as_deref().unwrap_or(""),
            })
        })
        .collect();
    ctx.insert("photos".to_string(), Value::Array(photos));

    if let Some(form) = form {
        ctx.insert("form".to_string(), form.to_context());
    }

    for section in DEFAULT_SECTIONS {
        ctx.entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Look up a dotted path such as `zone.coordinates.lat`.
pub fn lookup<'a>(ctx: &'a Context, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = ctx.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::models::FormInput;

    #[test]
    fn test_photos_come_from_table_not_blob() {
        let db = test_db();
        let stale = r#"{"photos":[{"path":"/stale.jpg","description":"old"}],"zone":{"id":9}}"#;
        let pid = db.create_process(Some(9), stale).unwrap();
        db.insert_photo(pid, "/img/1/0_a.jpg", Some("encosta")).unwrap();
        db.insert_photo(pid, "/img/1/1_b.jpg", None).unwrap();

        let ctx = build_context(&db, pid).unwrap();
        assert_eq!(
            ctx["photos"],
            json!([
                {"path": "/img/1/0_a.jpg", "description": "encosta"},
                {"path": "/img/1/1_b.jpg", "description": ""},
            ])
        );
        assert_eq!(ctx["zone"]["id"], 9);
    }

    #[test]
    fn test_latest_form_overwrites_blob() {
        let db = test_db();
        let pid = db
            .create_process(None, r#"{"form":{"responsavel":"Antigo"}}"#)
            .unwrap();
        db.insert_form(
            pid,
            &FormInput {
                responsavel: "Ana".to_string(),
                data_vistoria: "2024-01-01".to_string(),
                observacoes: "Trincas no muro".to_string(),
                acao_imediata: String::new(),
            },
        )
        .unwrap();

        let ctx = build_context(&db, pid).unwrap();
        assert_eq!(ctx["form"]["responsavel"], "Ana");
        assert_eq!(ctx["form"]["observacoes"], "Trincas no muro");
    }

    #[test]
    fn test_blob_form_kept_without_form_rows() {
        let db = test_db();
        let pid = db
            .create_process(None, r#"{"form":{"responsavel":"Rascunho"}}"#)
            .unwrap();
        let ctx = build_context(&db, pid).unwrap();
        assert_eq!(ctx["form"]["responsavel"], "Rascunho");
    }

    #[test]
    fn test_malformed_blob_is_empty_with_defaults() {
        let db = test_db();
        let pid = db.create_process(None, "{not json").unwrap();

        let ctx = build_context(&db, pid).unwrap();
        assert_eq!(ctx["zone"], json!({}));
        assert_eq!(ctx["demographics"], json!({}));
        assert_eq!(ctx["financials"], json!({}));
        assert_eq!(ctx["photos"], json!([]));
        assert!(!ctx.contains_key("form"));
    }

    #[test]
    fn test_non_object_blob_is_empty() {
        assert!(parse_stored_context(Some("[1,2]")).is_empty());
        assert!(parse_stored_context(Some("   ")).is_empty());
        assert!(parse_stored_context(None).is_empty());
    }

    #[test]
    fn test_missing_process() {
        let db = test_db();
        let err = build_context(&db, 404).unwrap_err();
        assert!(matches!(err, PipelineError::ProcessNotFound(404)));
    }

    #[test]
    fn test_lookup_dotted_paths() {
        let ctx = parse_stored_context(Some(r#"{"zone":{"coordinates":{"lat":-23.5}}}"#));
        assert_eq!(lookup(&ctx, "zone.coordinates.lat"), Some(&json!(-23.5)));
        assert_eq!(lookup(&ctx, "zone.coordinates.lon"), None);
        assert_eq!(lookup(&ctx, "zone.coordinates.lat.deg"), None);
        assert_eq!(lookup(&ctx, "missing"), None);
    }
}
