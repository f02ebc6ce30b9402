use climaseguro::db::Database;
use climaseguro::models::{FormInput, ProcessStatus};
use climaseguro::preflight::CheckStatus;
use climaseguro::storage::{Storage, UploadedFile};
use climaseguro::ProcessService;
use tempfile::TempDir;

fn service(dir: &TempDir) -> ProcessService {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    let storage = Storage::new(dir.path());
    storage.init().unwrap();
    ProcessService::new(db, storage)
}

fn photo(name: &str) -> UploadedFile {
    UploadedFile {
        filename: Some(name.to_string()),
        bytes: b"fake jpeg".to_vec(),
    }
}

#[test]
fn test_offline_process_to_fnmc_documents() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir);

    let process = svc.create_process(None, None).unwrap();
    assert_eq!(process.status, ProcessStatus::Draft);

    let photos = svc
        .upload_photos(process.id, &[photo("encosta.jpg"), photo("casas.jpg")])
        .unwrap();
    assert_eq!(photos.len(), 2);
    for p in &photos {
        assert!(p
            .description
            .as_deref()
            .unwrap()
            .starts_with("Descrição automática (offline)"));
    }

    svc.submit_form(
        process.id,
        &FormInput {
            responsavel: "Ana".to_string(),
            data_vistoria: "2024-01-01".to_string(),
            ..Default::default()
        },
    )
    .unwrap();

    let report = svc.preflight(process.id, "FNMC").unwrap();
    assert_eq!(report.status, CheckStatus::Pending);
    let missing: Vec<&str> = report
        .documents
        .iter()
        .flat_map(|d| d.missing.iter().map(String::as_str))
        .collect();
    for field in [
        "zone.id",
        "zone.coordinates.lat",
        "zone.coordinates.lon",
        "financials.custo_prevencao_total",
    ] {
        assert!(missing.contains(&field), "{field} should be missing");
    }
    assert!(!missing.contains(&"form.responsavel"));
    assert!(!missing.contains(&"photos"));

    let docs = svc.generate_documents(process.id, "FNMC").unwrap();
    assert_eq!(docs.len(), 4);
    for doc in &docs {
        assert!(doc.mime == "application/pdf" || doc.mime.starts_with("text/plain"));
        assert!(!doc.inputs_hash.is_empty());
        assert!(doc.path.exists());
    }
    assert_eq!(
        svc.get_process(process.id).unwrap().status,
        ProcessStatus::DocumentsGenerated
    );

    let stored = svc.list_documents(process.id).unwrap();
    assert_eq!(stored.len(), 4);
    let opened = svc.open_document(stored[3].id).unwrap();
    assert_eq!(opened.filename, format!("OrcamentoIntervencoes_{}.pdf", process.id));
}

#[test]
fn test_fully_populated_context_passes_preflight() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir);
    let process = svc
        .create_process(
            Some(11),
            Some(r#"{"zone":{"id":11,"coordinates":{"lat":-23.55,"lon":-46.63},"score":82}}"#),
        )
        .unwrap();

    svc.upload_photos(process.id, &[photo("muro.jpg")]).unwrap();
    svc.submit_form(
        process.id,
        &FormInput {
            responsavel: "Ana".to_string(),
            data_vistoria: "2024-01-01".to_string(),
            observacoes: "Muro de arrimo com trincas".to_string(),
            acao_imediata: "Interdição parcial".to_string(),
        },
    )
    .unwrap();
    svc.update_context(
        process.id,
        &serde_json::json!({"financials": {"custo_prevencao_total": 450000}}),
    )
    .unwrap();

    let report = svc.preflight(process.id, "FNMC").unwrap();
    assert_eq!(report.status, CheckStatus::Ok);
    assert!(report.documents.iter().all(|d| d.missing.is_empty()));

    let docs = svc.generate_documents(process.id, "FNMC").unwrap();
    assert_eq!(docs.len(), 4);
    assert!(docs.iter().all(|d| d.inputs_hash == docs[0].inputs_hash));
}
