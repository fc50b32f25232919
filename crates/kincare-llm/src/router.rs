//! LLM Router - Selects and manages LLM providers

use std::sync::Arc;

use crate::providers::*;
use crate::types::*;

/// The LLM Router selects and manages providers based on configuration
#[derive(Clone)]
pub struct LlmRouter {
    provider: Arc<dyn LlmProvider>,
    kind: ProviderKind,
}

impl LlmRouter {
    /// Create a router with a specific provider
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        let kind = provider.kind();
        Self { provider, kind }
    }

    /// Create a router from environment variables
    ///
    /// Reads `KINCARE_LLM_PROVIDER` to select the provider:
    /// - `openai`: OpenAI API (needs `OPENAI_API_KEY`)
    /// - `openai_compat`: OpenAI-compatible server
    /// - `deterministic`: No LLM
    ///
    /// When unset, OpenAI is used if `OPENAI_API_KEY` is present and the
    /// deterministic provider otherwise.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let kind = std::env::var("KINCARE_LLM_PROVIDER")
            .ok()
            .and_then(|name| ProviderKind::from_str(&name))
            .unwrap_or_else(|| {
                if OpenAIConfig::from_env().is_some() {
                    ProviderKind::OpenAI
                } else {
                    ProviderKind::Deterministic
                }
            });

        Self::from_kind(kind)
    }

    /// Create a router for a specific provider kind
    pub fn from_kind(kind: ProviderKind) -> Self {
        let provider: Arc<dyn LlmProvider> = match kind {
            ProviderKind::OpenAI => {
                if let Some(p) = OpenAIProvider::from_env() {
                    Arc::new(p)
                } else {
                    tracing::warn!("OpenAI API key not found, using deterministic fallback");
                    Arc::new(DeterministicProvider::new())
                }
            }
            ProviderKind::OpenAICompat => Arc::new(OpenAICompatProvider::from_env()),
            ProviderKind::Deterministic => Arc::new(DeterministicProvider::new()),
        };

        Self::new(provider)
    }

    /// Get the current provider
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Get the provider kind
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// True when a real model answers, false for the deterministic fallback
    pub fn is_live(&self) -> bool {
        self.kind != ProviderKind::Deterministic
    }

    /// Check if the provider is available
    pub async fn is_available(&self) -> bool {
        self.provider.is_available().await
    }

    /// Complete a request using the current provider
    pub async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        tracing::debug!(provider = self.provider.name(), "LLM completion");
        self.provider.complete(request).await
    }
}

impl Default for LlmRouter {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Builder for LLM router with explicit configuration
#[derive(Default)]
pub struct LlmRouterBuilder {
    kind: Option<ProviderKind>,
    openai_config: Option<OpenAIConfig>,
    openai_compat_config: Option<OpenAICompatConfig>,
}

impl LlmRouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: ProviderKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_openai(mut self, config: OpenAIConfig) -> Self {
        self.openai_config = Some(config);
        self.kind = Some(ProviderKind::OpenAI);
        self
    }

    pub fn with_openai_compat(mut self, config: OpenAICompatConfig) -> Self {
        self.openai_compat_config = Some(config);
        self.kind = Some(ProviderKind::OpenAICompat);
        self
    }

    pub fn build(self) -> LlmRouter {
        let kind = self.kind.unwrap_or(ProviderKind::Deterministic);

        let provider: Arc<dyn LlmProvider> = match kind {
            ProviderKind::OpenAI => match self.openai_config.or_else(OpenAIConfig::from_env) {
                Some(config) => Arc::new(OpenAIProvider::new(config)),
                None => {
                    tracing::warn!("OpenAI API key not found, using deterministic fallback");
                    Arc::new(DeterministicProvider::new())
                }
            },
            ProviderKind::OpenAICompat => {
                let config = self.openai_compat_config.unwrap_or_default();
                Arc::new(OpenAICompatProvider::new(config))
            }
            ProviderKind::Deterministic => Arc::new(DeterministicProvider::new()),
        };

        LlmRouter::new(provider)
    }
}
