//! Picks which model identifiers to use from what the provider reports.
//!
//! Providers rename and retire models; all knowledge of that lives here so the
//! document pipeline only ever asks for "the best models right now".

use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::provider::LlmProvider;

struct CachedModels {
    fetched_at: Instant,
    ranked: Vec<String>,
}

pub struct ModelResolver {
    configured: String,
    preferred: Vec<String>,
    ttl: Duration,
    cache: Mutex<Option<CachedModels>>,
}

impl ModelResolver {
    pub fn new(configured: &str, preferred: &[String], ttl: Duration) -> Self {
        Self {
            configured: configured.to_string(),
            preferred: preferred.to_vec(),
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// Usable model ids, best first. Never empty.
    pub fn ranked(&self, provider: &dyn LlmProvider) -> Vec<String> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return cached.ranked.clone();
            }
        }

        match provider.list_models() {
            Ok(available) => {
                let ranked = rank_models(&self.configured, &self.preferred, &available);
                tracing::debug!(
                    provider = provider.provider_name(),
                    available = available.len(),
                    best = %ranked[0],
                    "Resolved models"
                );
                *cache = Some(CachedModels {
                    fetched_at: Instant::now(),
                    ranked: ranked.clone(),
                });
                ranked
            }
            Err(e) => {
                // Not cached: the next call probes again.
                tracing::warn!(
                    provider = provider.provider_name(),
                    error = %e,
                    "Model listing failed, using configured model"
                );
                vec![self.configured.clone()]
            }
        }
    }

    pub fn best(&self, provider: &dyn LlmProvider) -> String {
        self.ranked(provider)
            .into_iter()
            .next()
            .unwrap_or_else(|| self.configured.clone())
    }

    pub fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Order `available` by preference: the configured model, then the preferred
/// list. A candidate matches an id equal to it or tagged from it
/// (`llama3` matches `llama3:latest`). Unmatched providers fall back to their
/// own listing order, and an empty listing to the configured model.
pub fn rank_models(configured: &str, preferred: &[String], available: &[String]) -> Vec<String> {
    let mut ranked: Vec<String> = Vec::new();

    let candidates = std::iter::once(configured).chain(preferred.iter().map(String::as_str));
    for candidate in candidates {
        let found = available.iter().find(|id| {
            id.as_str() == candidate
                || id
                    .strip_prefix(candidate)
                    .is_some_and(|rest| rest.starts_with(':'))
        });
        if let Some(id) = found {
            if !ranked.contains(id) {
                ranked.push(id.clone());
            }
        }
    }

    if ranked.is_empty() {
        ranked = available.iter().take(3).cloned().collect();
    }
    if ranked.is_empty() {
        ranked.push(configured.to_string());
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_configured_first_then_preferred() {
        let ranked = rank_models(
            "gemma-3-4b",
            &ids(&["qwen2.5", "llama3"]),
            &ids(&["llama3:latest", "gemma-3-4b", "mistral"]),
        );
        assert_eq!(ranked, ids(&["gemma-3-4b", "llama3:latest"]));
    }

    #[test]
    fn test_prefix_needs_tag_separator() {
        let ranked = rank_models("llama3", &[], &ids(&["llama3.1:8b", "llama3:8b"]));
        assert_eq!(ranked, ids(&["llama3:8b"]));
    }

    #[test]
    fn test_no_match_uses_provider_order() {
        let ranked = rank_models("gone", &[], &ids(&["a", "b", "c", "d"]));
        assert_eq!(ranked, ids(&["a", "b", "c"]));
        assert_eq!(rank_models("gone", &[], &[]), ids(&["gone"]));
    }

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl LlmProvider for CountingProvider {
        fn describe_image(&self, _: &str, _: &str, _: &Path) -> Result<String> {
            Err(anyhow!("unused"))
        }
        fn generate_text(&self, _: &str, _: &str, _: u32) -> Result<String> {
            Err(anyhow!("unused"))
        }
        fn list_models(&self) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(anyhow!("connection refused"))
            } else {
                Ok(vec!["m1".to_string()])
            }
        }
        fn provider_name(&self) -> &'static str {
            "counting"
        }
    }

    #[test]
    fn test_listing_is_cached() {
        let provider = CountingProvider { calls: AtomicUsize::new(0), fail: false };
        let resolver = ModelResolver::new("m1", &[], Duration::from_secs(60));

        assert_eq!(resolver.best(&provider), "m1");
        assert_eq!(resolver.best(&provider), "m1");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        resolver.invalidate();
        resolver.best(&provider);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_listing_falls_back_and_retries() {
        let provider = CountingProvider { calls: AtomicUsize::new(0), fail: true };
        let resolver = ModelResolver::new("configured", &[], Duration::from_secs(60));

        assert_eq!(resolver.ranked(&provider), vec!["configured".to_string()]);
        resolver.ranked(&provider);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
