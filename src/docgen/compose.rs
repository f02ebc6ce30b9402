//! Locally composed formal text, used when neither AI nor a template produced
//! a document.
//!
//! Every field is named and interpolated on its own; structured values are
//! never dumped. Missing data renders as `N/D` and the output never contains
//! curly braces.

use serde_json::Value;

use super::sections::FALLBACK_OUTLINE;
use crate::context::{lookup, Context};
use crate::risk::{classify_risk, humanize_level};

pub const MISSING: &str = "N/D";

/// Text form of a scalar value, or `None` for null, empty or structured values.
pub(crate) fn display_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "sim".to_string(),
        Value::Bool(false) => "não".to_string(),
        _ => return None,
    };
    let text = strip_braces(&text);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn strip_braces(text: &str) -> String {
    text.chars().filter(|c| *c != '{' && *c != '}').collect()
}

fn field(ctx: &Context, path: &str) -> String {
    lookup(ctx, path)
        .and_then(display_value)
        .unwrap_or_else(|| MISSING.to_string())
}

fn number(ctx: &Context, path: &str) -> Option<f64> {
    match lookup(ctx, path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Reads amounts written the Brazilian way (`1.500.000,00`, `R$ 1.500`) as
/// well as plain decimals (`1500.5`).
fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim();
    let text = text.strip_prefix("R$").unwrap_or(text).trim();
    let normalized = if text.contains(',') {
        text.replace('.', "").replace(',', ".")
    } else if is_grouped_thousands(text) {
        text.replace('.', "")
    } else {
        text.to_string()
    };
    normalized.parse().ok()
}

/// `1.500` or `-12.345.678`: dot-separated groups of exactly three digits.
fn is_grouped_thousands(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut groups = digits.split('.');
    let head_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()));
    let mut rest = groups.peekable();
    head_ok
        && rest.peek().is_some()
        && rest.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

/// Form fields come from the explicit submission first, then the context.
fn form_field(form: &Value, ctx: &Context, key: &str) -> String {
    form.get(key)
        .and_then(display_value)
        .unwrap_or_else(|| field(ctx, &format!("form.{key}")))
}

/// Brazilian currency, e.g. `R$ 1.234.567,89`.
pub fn format_brl(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{:02}", cents % 100)
}

/// Formatted amount; a value that is present but not numeric is shown as written.
fn money(ctx: &Context, path: &str) -> String {
    number(ctx, path)
        .map(format_brl)
        .unwrap_or_else(|| field(ctx, path))
}

fn risk_level(ctx: &Context) -> String {
    if let Some(level) = lookup(ctx, "zone.level").and_then(display_value) {
        return humanize_level(&level);
    }
    number(ctx, "zone.score")
        .and_then(classify_risk)
        .map(str::to_string)
        .unwrap_or_else(|| MISSING.to_string())
}

fn population(ctx: &Context) -> String {
    ["zone.populacao_estimada", "demographics.populacao_estimada", "demographics.populacao"]
        .iter()
        .find_map(|path| lookup(ctx, path).and_then(display_value))
        .unwrap_or_else(|| MISSING.to_string())
}

fn photo_paragraphs(ctx: &Context) -> Vec<String> {
    let photos = match lookup(ctx, "photos") {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return vec!["Não foram anexados registros fotográficos ao processo.".to_string()],
    };

    let mut paragraphs = vec![format!(
        "Foram anexados {} registros fotográficos ao processo, descritos a seguir.",
        photos.len()
    )];
    paragraphs.extend(photos.iter().enumerate().map(|(i, photo)| {
        let description = photo
            .get("description")
            .and_then(display_value)
            .unwrap_or_else(|| MISSING.to_string());
        format!("Registro {}: {}", i + 1, description)
    }));
    paragraphs
}

/// Proposed measures, derived from the form and the financial data.
pub fn compose_action_plan_text(ctx: &Context) -> String {
    [
        format!("Ações imediatas: {}.", field(ctx, "form.acao_imediata")),
        format!(
            "Intervenções estruturais: execução das obras de prevenção estimadas em {}, \
             priorizando os pontos apontados na vistoria técnica.",
            money(ctx, "financials.custo_prevencao_total")
        ),
        format!(
            "Comunicação: notificação dos ocupantes dos {} imóveis da área e orientação \
             sobre rotas de evacuação e pontos de apoio.",
            field(ctx, "zone.total_imoveis")
        ),
        format!(
            "Monitoramento: acompanhamento periódico pela Defesa Civil, compatível com o \
             nível de risco {}, com nova vistoria após a conclusão das intervenções.",
            risk_level(ctx)
        ),
    ]
    .join("\n\n")
}

/// Full six-section document text. Headings and paragraphs are separated by
/// blank lines.
pub fn compose_fallback_legal_text(
    fund_name: &str,
    doc_type: &str,
    ctx: &Context,
    form: &Value,
) -> String {
    let fund_name = strip_braces(fund_name);
    let doc_type = strip_braces(doc_type);
    let responsavel = form_field(form, ctx, "responsavel");

    let introduction = vec![format!(
        "O Município, por intermédio de sua Coordenadoria de Defesa Civil, apresenta ao \
         {fund_name} o documento \"{doc_type}\", referente ao processo de prevenção de \
         desastres instaurado para a zona {}. O conteúdo foi consolidado a partir dos \
         dados registrados no processo.",
        field(ctx, "zone.id"),
    )];

    let area = vec![
        format!(
            "A área de interesse situa-se nas coordenadas latitude {} e longitude {}, com \
             classificação de risco {} e pontuação {}.",
            field(ctx, "zone.coordinates.lat"),
            field(ctx, "zone.coordinates.lon"),
            risk_level(ctx),
            field(ctx, "zone.score"),
        ),
        format!(
            "Estima-se a existência de {} imóveis expostos e uma população estimada de {} \
             habitantes.",
            field(ctx, "zone.total_imoveis"),
            population(ctx),
        ),
    ];

    let mut technical = vec![
        format!(
            "A vistoria técnica foi realizada em {} sob a responsabilidade de {}.",
            form_field(form, ctx, "data_vistoria"),
            responsavel,
        ),
        format!(
            "Observações técnicas registradas: {}.",
            form_field(form, ctx, "observacoes")
        ),
    ];
    technical.extend(photo_paragraphs(ctx));

    let mut financial = vec![
        format!(
            "O custo total estimado das medidas de prevenção é de {}.",
            money(ctx, "financials.custo_prevencao_total")
        ),
        format!(
            "O custo estimado de resposta e reconstrução em caso de desastre é de {}.",
            money(ctx, "financials.custo_desastre_total")
        ),
    ];
    if let (Some(prevention), Some(disaster)) = (
        number(ctx, "financials.custo_prevencao_total"),
        number(ctx, "financials.custo_desastre_total"),
    ) {
        financial.push(format!(
            "A economia estimada com a adoção das medidas preventivas é de {}.",
            format_brl(disaster - prevention)
        ));
    }

    let measures = vec![compose_action_plan_text(ctx)];

    let conclusion = vec![
        format!(
            "Diante do exposto, submete-se o presente documento à apreciação do {fund_name}, \
             solicitando o apoio às medidas de prevenção descritas."
        ),
        format!("Responsável técnico: {responsavel}."),
    ];

    let bodies = [introduction, area, technical, financial, measures, conclusion];
    FALLBACK_OUTLINE
        .iter()
        .zip(bodies)
        .map(|(heading, paragraphs)| {
            let mut block = vec![heading.to_uppercase()];
            block.extend(paragraphs);
            block.join("\n\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
