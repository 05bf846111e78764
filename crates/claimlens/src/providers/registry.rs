use std::sync::Arc;

use anyhow::Result;

use super::anthropic::AnthropicProvider;
use super::base::Provider;
use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use super::xai::XaiProvider;
use crate::error::AnalysisError;

/// In-memory set of analysis backends.
///
/// Populated once at startup and read-only afterwards, so concurrent reads
/// across requests need no synchronization. Insertion order is preserved and
/// breaks ties during selection.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. A duplicate id fails fast.
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Result<(), AnalysisError> {
        let id = &provider.descriptor().id;
        if self.providers.iter().any(|p| p.descriptor().id == *id) {
            return Err(AnalysisError::DuplicateProvider(id.clone()));
        }
        self.providers.push(provider);
        Ok(())
    }

    pub fn list_all(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Build a registry from the environment. Each built-in provider is
    /// registered only when its API key is present, so a provider without
    /// credentials is never selectable.
    pub fn from_env() -> Result<Self> {
        type Builder = fn() -> Result<Arc<dyn Provider>>;
        let builtins: &[(&str, Builder)] = &[
            ("openai", || {
                let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::from_env()?);
                Ok(provider)
            }),
            ("gemini", || {
                let provider: Arc<dyn Provider> = Arc::new(GeminiProvider::from_env()?);
                Ok(provider)
            }),
            ("anthropic", || {
                let provider: Arc<dyn Provider> = Arc::new(AnthropicProvider::from_env()?);
                Ok(provider)
            }),
            ("xai", || {
                let provider: Arc<dyn Provider> = Arc::new(XaiProvider::from_env()?);
                Ok(provider)
            }),
        ];

        let mut registry = Self::new();
        for (id, build) in builtins {
            match build() {
                Ok(provider) => registry.register(provider)?,
                Err(reason) => tracing::debug!("provider {} not registered: {}", id, reason),
            }
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;

    #[test]
    fn register_preserves_insertion_order() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(MockProvider::succeeding("a", 0.1, vec![], Default::default())))
            .unwrap();
        registry
            .register(Arc::new(MockProvider::succeeding("b", 0.9, vec![], Default::default())))
            .unwrap();

        let ids: Vec<&str> = registry
            .list_all()
            .iter()
            .map(|p| p.descriptor().id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn duplicate_id_fails_fast() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(MockProvider::succeeding("a", 0.1, vec![], Default::default())))
            .unwrap();
        let duplicate =
            registry.register(Arc::new(MockProvider::succeeding("a", 0.5, vec![], Default::default())));
        assert_eq!(
            duplicate,
            Err(AnalysisError::DuplicateProvider("a".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }
}
