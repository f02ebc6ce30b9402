//! Photo descriptions for uploaded inspection images.

use std::path::{Path, PathBuf};

use super::client::LlmClient;

const VISION_PROMPT: &str = "Descreva a imagem com foco em: número de moradias, tipologia, \
     estado aparente, indícios de risco (encosta, drenagem) e referências geográficas. \
     Seja objetivo e técnico.";

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

pub fn offline_description(path: &Path) -> String {
    format!(
        "Descrição automática (offline): evidências visuais para análise técnica – arquivo '{}'.",
        file_label(path)
    )
}

fn failed_description(path: &Path) -> String {
    format!(
        "Descrição indisponível: a análise automática falhou – arquivo '{}'.",
        file_label(path)
    )
}

/// One description per path, in order. Each image falls back independently;
/// this never fails as a whole.
pub fn describe_photos(client: Option<&LlmClient>, paths: &[PathBuf]) -> Vec<String> {
    let Some(client) = client else {
        return paths.iter().map(|p| offline_description(p)).collect();
    };

    paths
        .iter()
        .map(|path| match client.describe_image(VISION_PROMPT, path) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!(path = %path.display(), "Empty image description");
                failed_description(path)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Image description failed");
                failed_description(path)
            }
        })
        .collect()
}
