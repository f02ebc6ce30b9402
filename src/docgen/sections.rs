//! Section headings per document type.

use crate::funds::reference;

/// Headings for document types without a dedicated outline.
pub const GENERIC_SECTIONS: &[&str] = &["Introdução", "Contexto", "Análise", "Conclusão"];

/// Outline of the locally composed fallback text.
pub const FALLBACK_OUTLINE: [&str; 6] = [
    "Introdução",
    "Contexto da Área",
    "Fundamentação Técnica",
    "Análise Financeira",
    "Medidas Propostas",
    "Conclusão",
];

/// Built-in headings for a document type.
pub fn builtin_sections(doc_type: &str) -> &'static [&'static str] {
    match doc_type {
        "OficioNotificacao" => &[
            "Identificação do Órgão Emissor",
            "Destinatário",
            "Objeto",
            "Fundamentação Legal",
            "Descrição da Situação de Risco",
            "Providências Solicitadas",
            "Encerramento",
        ],
        "RelatorioTecnicoRisco" => &[
            "Introdução",
            "Caracterização da Área",
            "Metodologia da Vistoria",
            "Diagnóstico de Risco",
            "Registro Fotográfico",
            "Conclusões e Recomendações",
        ],
        "PlanoAcaoEmergencial" => &[
            "Objetivo",
            "Área de Abrangência",
            "Ações Imediatas",
            "Responsabilidades",
            "Cronograma",
            "Monitoramento",
        ],
        "OrcamentoIntervencoes" => &[
            "Apresentação",
            "Intervenções Propostas",
            "Composição de Custos",
            "Análise Custo-Benefício",
            "Cronograma Físico-Financeiro",
        ],
        "RelatorioFotografico" => &[
            "Identificação",
            "Registros Fotográficos",
            "Análise das Imagens",
            "Conclusão",
        ],
        "TermoResponsabilidadeTecnica" => &[
            "Identificação do Responsável Técnico",
            "Objeto",
            "Declaração de Responsabilidade",
            "Local e Data",
        ],
        _ => GENERIC_SECTIONS,
    }
}

/// Headings handed to the legal text generator. Mandatory sections from the
/// fund reference outline win over the built-in ones.
pub fn sections_for(fund_code: &str, fund_name: &str, doc_type: &str) -> Vec<String> {
    if let Some(sections) = reference::mandatory_sections(fund_code, fund_name, doc_type) {
        return sections;
    }
    builtin_sections(doc_type)
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funds::reference::{self, TEST_LOCK, TEMPLATES_FILE};

    #[test]
    fn test_known_and_unknown_types() {
        assert_eq!(builtin_sections("OficioNotificacao")[2], "Objeto");
        assert_eq!(builtin_sections("Desconhecido"), GENERIC_SECTIONS);
    }

    #[test]
    fn test_reference_outline_overrides_builtin() {
        let _guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        reference::reset();
        assert_eq!(
            sections_for("FNMC", "Fundo Nacional sobre Mudança do Clima", "Desconhecido"),
            vec!["Introdução", "Contexto", "Análise", "Conclusão"]
        );

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TEMPLATES_FILE),
            r#"{"document_templates":[{"fund_name":"FNMC","doc_type":"OficioNotificacao",
                "mandatory_sections":[{"section":"Preâmbulo"},{"section":"Pedido"}]}]}"#,
        )
        .unwrap();
        reference::init(Some(dir.path()));

        assert_eq!(
            sections_for("FNMC", "Fundo Nacional sobre Mudança do Clima", "OficioNotificacao"),
            vec!["Preâmbulo", "Pedido"]
        );
        reference::reset();
    }
}
