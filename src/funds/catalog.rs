//! Built-in fund registry.

use serde::Serialize;

/// A grant program and the documents it requires, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundDefinition {
    pub code: &'static str,
    pub name: &'static str,
    pub required_documents: &'static [&'static str],
}

static FUNDS: &[FundDefinition] = &[
    FundDefinition {
        code: "FNMC",
        name: "Fundo Nacional sobre Mudança do Clima",
        required_documents: &[
            "OficioNotificacao",
            "RelatorioTecnicoRisco",
            "PlanoAcaoEmergencial",
            "OrcamentoIntervencoes",
        ],
    },
    FundDefinition {
        code: "FEP-EXEMPLO",
        name: "Fundo Estadual de Proteção (exemplo)",
        required_documents: &["RelatorioFotografico", "TermoResponsabilidadeTecnica"],
    },
];

pub fn list() -> &'static [FundDefinition] {
    FUNDS
}

/// Exact-match lookup by fund code.
pub fn get(code: &str) -> Option<&'static FundDefinition> {
    FUNDS.iter().find(|f| f.code == code)
}
