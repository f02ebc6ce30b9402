use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::provider::{create_provider, LlmProvider};
use super::resolver::ModelResolver;
use crate::config::LlmConfig;

/// How many ranked models a text request walks through before giving up.
const MAX_MODEL_ATTEMPTS: usize = 2;

/// LLM client that wraps a provider implementation and its model resolver
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn LlmProvider>,
    resolver: Arc<ModelResolver>,
}

impl LlmClient {
    /// Create a client from configuration, or `None` when AI is disabled.
    pub fn from_config(config: &LlmConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let provider = create_provider(config);
        let resolver = ModelResolver::new(
            &config.model,
            &config.preferred_models,
            Duration::from_secs(config.model_cache_secs),
        );
        tracing::info!(provider = provider.provider_name(), model = %config.model, "AI client enabled");
        Some(Self {
            provider: Arc::from(provider),
            resolver: Arc::new(resolver),
        })
    }

    pub fn with_provider(provider: Arc<dyn LlmProvider>, resolver: ModelResolver) -> Self {
        Self {
            provider,
            resolver: Arc::new(resolver),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Describe an image with the best available model
    pub fn describe_image(&self, prompt: &str, image_path: &Path) -> Result<String> {
        let model = self.resolver.best(self.provider.as_ref());
        self.provider.describe_image(&model, prompt, image_path)
    }

    /// Complete a prompt, moving to the next ranked model on error or empty output
    pub fn generate_text(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let mut last_error = anyhow!("no model available");

        for model in self
            .resolver
            .ranked(self.provider.as_ref())
            .into_iter()
            .take(MAX_MODEL_ATTEMPTS)
        {
            match self.provider.generate_text(&model, prompt, max_tokens) {
                Ok(text) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => {
                    tracing::warn!(model = %model, "Model returned empty text");
                    last_error = anyhow!("model {} returned empty text", model);
                }
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "Text generation failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted provider: every text call pops the next reply.
    pub(crate) struct ScriptedProvider {
        pub models: Vec<String>,
        pub replies: Mutex<Vec<Result<String>>>,
        pub seen_models: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub fn new(models: &[&str], replies: Vec<Result<String>>) -> Self {
            Self {
                models: models.iter().map(|m| m.to_string()).collect(),
                replies: Mutex::new(replies),
                seen_models: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmProvider for ScriptedProvider {
        fn describe_image(&self, model: &str, _: &str, image_path: &Path) -> Result<String> {
            self.seen_models.lock().unwrap().push(model.to_string());
            let name = image_path.file_name().unwrap().to_string_lossy().to_string();
            if name.starts_with("bad") {
                Err(anyhow!("vision failed"))
            } else {
                Ok(format!("descrição de {}", name))
            }
        }
        fn generate_text(&self, model: &str, _: &str, _: u32) -> Result<String> {
            self.seen_models.lock().unwrap().push(model.to_string());
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Err(anyhow!("script exhausted"))
            } else {
                replies.remove(0)
            }
        }
        fn list_models(&self) -> Result<Vec<String>> {
            Ok(self.models.clone())
        }
        fn provider_name(&self) -> &'static str {
            "scripted"
        }
    }

    pub(crate) fn scripted_client(provider: Arc<ScriptedProvider>) -> LlmClient {
        LlmClient::with_provider(
            provider,
            ModelResolver::new("primary", &["secondary".to_string()], Duration::from_secs(60)),
        )
    }

    #[test]
    fn test_disabled_config_has_no_client() {
        assert!(LlmClient::from_config(&LlmConfig::default()).is_none());
    }

    #[test]
    fn test_second_model_after_failure() {
        let provider = Arc::new(ScriptedProvider::new(
            &["primary", "secondary"],
            vec![Err(anyhow!("timeout")), Ok("Texto jurídico".to_string())],
        ));
        let client = scripted_client(provider.clone());

        assert_eq!(client.generate_text("p", 100).unwrap(), "Texto jurídico");
        assert_eq!(*provider.seen_models.lock().unwrap(), vec!["primary", "secondary"]);
    }

    #[test]
    fn test_empty_replies_are_errors() {
        let provider = Arc::new(ScriptedProvider::new(
            &["primary", "secondary"],
            vec![Ok("   ".to_string()), Ok(String::new()), Ok("never reached".to_string())],
        ));
        let client = scripted_client(provider.clone());

        assert!(client.generate_text("p", 100).is_err());
        assert_eq!(provider.seen_models.lock().unwrap().len(), MAX_MODEL_ATTEMPTS);
    }
}
