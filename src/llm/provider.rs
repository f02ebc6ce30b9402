use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::GenericImageView;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use crate::config::{LlmConfig, LlmProviderType};

/// Trait for AI providers that can describe images and write text
pub trait LlmProvider: Send + Sync {
    /// Describe an image at the given path
    fn describe_image(&self, model: &str, prompt: &str, image_path: &Path) -> Result<String>;

    /// Complete a text-only prompt
    fn generate_text(&self, model: &str, prompt: &str, max_tokens: u32) -> Result<String>;

    /// Model identifiers the provider currently serves
    fn list_models(&self) -> Result<Vec<String>>;

    /// Get the provider name for logs
    fn provider_name(&self) -> &'static str;
}

fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

// ============================================================================
// OpenAI-compatible provider (works with LM Studio, OpenAI, and compatible APIs)
// ============================================================================

pub struct OpenAICompatibleProvider {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: Vec<OpenAIContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum OpenAIContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

impl OpenAICompatibleProvider {
    pub fn new(endpoint: &str, api_key: Option<&str>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.map(|s| s.to_string()),
            timeout,
        }
    }

    fn chat(&self, request: &OpenAIChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);

        let mut req = agent(self.timeout)
            .post(&url)
            .set("Content-Type", "application/json");

        if let Some(ref api_key) = self.api_key {
            req = req.set("Authorization", &format!("Bearer {}", api_key));
        }

        let response = req
            .send_json(request)
            .map_err(|e| anyhow!("LLM request failed: {}", e))?;

        let chat_response: OpenAIChatResponse = response
            .into_json()
            .map_err(|e| anyhow!("Failed to parse LLM response: {}", e))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("No response from LLM"))
    }
}

impl LlmProvider for OpenAICompatibleProvider {
    fn describe_image(&self, model: &str, prompt: &str, image_path: &Path) -> Result<String> {
        let (base64_image, mime_type) = load_and_encode_image(image_path, 1024)?;
        let data_url = format!("data:{};base64,{}", mime_type, base64_image);

        self.chat(&OpenAIChatRequest {
            model: model.to_string(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: vec![
                    OpenAIContentPart::Text {
                        text: prompt.to_string(),
                    },
                    OpenAIContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: 500,
            temperature: 0.4,
        })
    }

    fn generate_text(&self, model: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        self.chat(&OpenAIChatRequest {
            model: model.to_string(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: vec![OpenAIContentPart::Text {
                    text: prompt.to_string(),
                }],
            }],
            max_tokens,
            temperature: 0.2,
        })
    }

    fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.endpoint);
        let mut req = agent(self.timeout).get(&url);
        if let Some(ref api_key) = self.api_key {
            req = req.set("Authorization", &format!("Bearer {}", api_key));
        }

        let list: ModelList = req
            .call()
            .map_err(|e| anyhow!("Model listing failed: {}", e))?
            .into_json()
            .map_err(|e| anyhow!("Failed to parse model list: {}", e))?;

        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    fn provider_name(&self) -> &'static str {
        "OpenAI-compatible"
    }
}

/// Load an image, resize if either dimension exceeds `max_dimension`, re-encode as JPEG,
/// and return the base64-encoded string along with the MIME type.
fn load_and_encode_image(image_path: &Path, max_dimension: u32) -> Result<(String, &'static str)> {
    let img = image::open(image_path)
        .map_err(|e| anyhow!("Failed to open image {}: {}", image_path.display(), e))?;

    let (width, height) = img.dimensions();
    let img = if width > max_dimension || height > max_dimension {
        img.resize(
            max_dimension,
            max_dimension,
            image::imageops::FilterType::Triangle,
        )
    } else {
        img
    };

    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, 85);
    img.into_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| anyhow!("Failed to encode image as JPEG: {}", e))?;

    let base64_image = BASE64.encode(buf.into_inner());
    Ok((base64_image, "image/jpeg"))
}

// ============================================================================
// Anthropic Claude provider
// ============================================================================

const ANTHROPIC_API: &str = "https://api.anthropic.com/v1";

pub struct AnthropicProvider {
    api_key: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum AnthropicContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image { source: AnthropicImageSource },
}

#[derive(Debug, Serialize)]
struct AnthropicImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicResponseContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponseContent {
    text: Option<String>,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            timeout,
        }
    }

    fn messages(&self, request: &AnthropicRequest) -> Result<String> {
        let response = agent(self.timeout)
            .post(&format!("{}/messages", ANTHROPIC_API))
            .set("Content-Type", "application/json")
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", "2023-06-01")
            .send_json(request)
            .map_err(|e| anyhow!("Anthropic request failed: {}", e))?;

        let anthropic_response: AnthropicResponse = response
            .into_json()
            .map_err(|e| anyhow!("Failed to parse Anthropic response: {}", e))?;

        let text: String = anthropic_response
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            Err(anyhow!("No response from Anthropic"))
        } else {
            Ok(text)
        }
    }
}

impl LlmProvider for AnthropicProvider {
    fn describe_image(&self, model: &str, prompt: &str, image_path: &Path) -> Result<String> {
        let (base64_image, media_type) = load_and_encode_image(image_path, 1024)?;

        self.messages(&AnthropicRequest {
            model: model.to_string(),
            max_tokens: 500,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: vec![
                    AnthropicContent::Image {
                        source: AnthropicImageSource {
                            source_type: "base64".to_string(),
                            media_type: media_type.to_string(),
                            data: base64_image,
                        },
                    },
                    AnthropicContent::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        })
    }

    fn generate_text(&self, model: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        self.messages(&AnthropicRequest {
            model: model.to_string(),
            max_tokens,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: vec![AnthropicContent::Text {
                    text: prompt.to_string(),
                }],
            }],
        })
    }

    fn list_models(&self) -> Result<Vec<String>> {
        let list: ModelList = agent(self.timeout)
            .get(&format!("{}/models", ANTHROPIC_API))
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", "2023-06-01")
            .call()
            .map_err(|e| anyhow!("Anthropic model listing failed: {}", e))?
            .into_json()
            .map_err(|e| anyhow!("Failed to parse Anthropic model list: {}", e))?;

        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    fn provider_name(&self) -> &'static str {
        "Anthropic Claude"
    }
}

// ============================================================================
// Ollama provider
// ============================================================================

pub struct OllamaProvider {
    endpoint: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    images: Vec<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    models: Vec<OllamaTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaTag {
    name: String,
}

impl OllamaProvider {
    pub fn new(endpoint: Option<&str>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint
                .unwrap_or("http://localhost:11434")
                .trim_end_matches('/')
                .to_string(),
            timeout,
        }
    }

    fn generate(&self, request: &OllamaRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.endpoint);

        let response = agent(self.timeout)
            .post(&url)
            .set("Content-Type", "application/json")
            .send_json(request)
            .map_err(|e| anyhow!("Ollama request failed: {}", e))?;

        let ollama_response: OllamaResponse = response
            .into_json()
            .map_err(|e| anyhow!("Failed to parse Ollama response: {}", e))?;

        Ok(ollama_response.response)
    }
}

impl LlmProvider for OllamaProvider {
    fn describe_image(&self, model: &str, prompt: &str, image_path: &Path) -> Result<String> {
        let (base64_image, _mime_type) = load_and_encode_image(image_path, 1024)?;

        self.generate(&OllamaRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            images: vec![base64_image],
            stream: false,
            options: None,
        })
    }

    fn generate_text(&self, model: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        self.generate(&OllamaRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            images: Vec::new(),
            stream: false,
            options: Some(OllamaOptions {
                num_predict: max_tokens,
            }),
        })
    }

    fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.endpoint);
        let tags: OllamaTags = agent(self.timeout)
            .get(&url)
            .call()
            .map_err(|e| anyhow!("Ollama model listing failed: {}", e))?
            .into_json()
            .map_err(|e| anyhow!("Failed to parse Ollama model list: {}", e))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn provider_name(&self) -> &'static str {
        "Ollama"
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an LLM provider based on configuration
pub fn create_provider(config: &LlmConfig) -> Box<dyn LlmProvider> {
    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    let api_key = config.resolved_api_key();

    match config.provider {
        LlmProviderType::LmStudio => Box::new(OpenAICompatibleProvider::new(
            &config.endpoint,
            api_key.as_deref(),
            timeout,
        )),
        LlmProviderType::OpenAI => Box::new(OpenAICompatibleProvider::new(
            "https://api.openai.com/v1",
            api_key.as_deref(),
            timeout,
        )),
        LlmProviderType::Anthropic => Box::new(AnthropicProvider::new(
            api_key.as_deref().unwrap_or(""),
            timeout,
        )),
        LlmProviderType::Ollama => Box::new(OllamaProvider::new(Some(&config.endpoint), timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_picks_provider() {
        let mut config = LlmConfig::default();
        assert_eq!(create_provider(&config).provider_name(), "OpenAI-compatible");

        config.provider = LlmProviderType::Ollama;
        assert_eq!(create_provider(&config).provider_name(), "Ollama");

        config.provider = LlmProviderType::Anthropic;
        assert_eq!(create_provider(&config).provider_name(), "Anthropic Claude");
    }

    #[test]
    fn test_unreadable_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-an-image.jpg");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(load_and_encode_image(&path, 1024).is_err());
    }
}
