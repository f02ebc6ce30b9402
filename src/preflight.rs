//! Advisory checks run before document generation.
//!
//! Reports which context fields each document of a fund still lacks. The
//! result is informational only; generation never consults it.

use serde::Serialize;
use serde_json::Value;

use crate::context::{lookup, Context};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Pending,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentCheck {
    pub doc_type: String,
    pub missing: Vec<String>,
    pub status: CheckStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub fund_code: String,
    pub documents: Vec<DocumentCheck>,
    pub status: CheckStatus,
}

type Requirements = &'static [(&'static str, &'static [&'static str])];

const FNMC: Requirements = &[
    (
        "OficioNotificacao",
        &["form.responsavel", "form.data_vistoria", "zone.id"],
    ),
    (
        "RelatorioTecnicoRisco",
        &[
            "form.observacoes",
            "photos",
            "zone.coordinates.lat",
            "zone.coordinates.lon",
        ],
    ),
    ("PlanoAcaoEmergencial", &["form.acao_imediata"]),
    ("OrcamentoIntervencoes", &["financials.custo_prevencao_total"]),
];

const MDR: Requirements = &[(
    "PlanoTrabalhoPrevencao",
    &[
        "zone.id",
        "zone.coordinates.lat",
        "zone.coordinates.lon",
        "financials.custo_prevencao_total",
        "form.responsavel",
        "photos",
    ],
)];

const GENERIC: Requirements = &[("Generic", &["zone.id"])];

fn requirements_for(fund_code: &str) -> Requirements {
    match fund_code {
        "FNMC" => FNMC,
        "MDR" => MDR,
        _ => GENERIC,
    }
}

/// A path is present when it resolves to a non-null value; strings and
/// lists must also be non-empty.
pub fn is_present(ctx: &Context, path: &str) -> bool {
    match lookup(ctx, path) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(_) => true,
    }
}

pub fn check(fund_code: &str, ctx: &Context) -> PreflightReport {
    let documents: Vec<DocumentCheck> = requirements_for(fund_code)
        .iter()
        .map(|(doc_type, fields)| {
            let missing: Vec<String> = fields
                .iter()
                .filter(|f| !is_present(ctx, f))
                .map(|f| f.to_string())
                .collect();
            let status = if missing.is_empty() {
                CheckStatus::Ok
            } else {
                CheckStatus::Pending
            };
            DocumentCheck {
                doc_type: doc_type.to_string(),
                missing,
                status,
            }
        })
        .collect();

    let status = if documents.iter().all(|d| d.status == CheckStatus::Ok) {
        CheckStatus::Ok
    } else {
        CheckStatus::Pending
    };

    PreflightReport {
        fund_code: fund_code.to_string(),
        documents,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: Value) -> Context {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn full_context() -> Context {
        ctx(json!({
            "zone": {"id": 12, "coordinates": {"lat": -23.55, "lon": -46.63}},
            "financials": {"custo_prevencao_total": 150000.0},
            "photos": [{"path": "/a.jpg", "description": ""}],
            "form": {
                "responsavel": "Ana",
                "data_vistoria": "2024-01-01",
                "observacoes": "Trincas",
                "acao_imediata": "Evacuar"
            }
        }))
    }

    #[test]
    fn test_empty_context_is_all_pending() {
        let report = check("FNMC", &Context::new());
        assert_eq!(report.status, CheckStatus::Pending);
        assert_eq!(report.documents.len(), 4);
        for (doc, (doc_type, fields)) in report.documents.iter().zip(FNMC) {
            assert_eq!(doc.doc_type, *doc_type);
            assert_eq!(doc.status, CheckStatus::Pending);
            assert_eq!(doc.missing, fields.iter().map(|f| f.to_string()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_full_context_is_ok() {
        let report = check("FNMC", &full_context());
        assert_eq!(report.status, CheckStatus::Ok);
        assert!(report.documents.iter().all(|d| d.missing.is_empty()));
    }

    #[test]
    fn test_empty_string_and_list_are_missing() {
        let mut c = full_context();
        c.insert("photos".to_string(), json!([]));
        c["form"]["acao_imediata"] = json!("");

        let report = check("FNMC", &c);
        assert_eq!(report.status, CheckStatus::Pending);
        assert_eq!(report.documents[1].missing, vec!["photos"]);
        assert_eq!(report.documents[2].missing, vec!["form.acao_imediata"]);
        assert_eq!(report.documents[0].status, CheckStatus::Ok);
    }

    #[test]
    fn test_zero_and_false_count_as_present() {
        let c = ctx(json!({"zone": {"id": 0, "flag": false, "none": null}}));
        assert!(is_present(&c, "zone.id"));
        assert!(is_present(&c, "zone.flag"));
        assert!(!is_present(&c, "zone.none"));
    }

    #[test]
    fn test_unknown_fund_degrades_to_generic() {
        let report = check("XYZ", &Context::new());
        assert_eq!(report.fund_code, "XYZ");
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.documents[0].doc_type, "Generic");
        assert_eq!(report.documents[0].missing, vec!["zone.id"]);

        let ok = check("XYZ", &ctx(json!({"zone": {"id": "Z-1"}})));
        assert_eq!(ok.status, CheckStatus::Ok);
    }

    #[test]
    fn test_mdr_rules() {
        let report = check("MDR", &full_context());
        assert_eq!(report.documents[0].doc_type, "PlanoTrabalhoPrevencao");
        assert_eq!(report.status, CheckStatus::Ok);
    }

    #[test]
    fn test_report_serializes_lowercase_status() {
        let report = check("FNMC", &Context::new());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["documents"][0]["status"], "pending");
    }
}
