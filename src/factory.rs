use std::env;
use std::sync::Arc;

use crate::provider::ChatProvider;
use crate::providers::{AnthropicProvider, OpenAIProvider};
use crate::registry::ProviderFactory;
use crate::types::ProviderOptions;
use crate::Error;

/// Built-in providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    Gemini,
    Groq,
    SambaNova,
}

impl ProviderType {
    /// Every built-in provider, in registration order.
    pub const ALL: [ProviderType; 5] = [
        ProviderType::OpenAI,
        ProviderType::Anthropic,
        ProviderType::Gemini,
        ProviderType::Groq,
        ProviderType::SambaNova,
    ];

    /// Name used as the `<provider>` part of a model string.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Gemini => "gemini",
            ProviderType::Groq => "groq",
            ProviderType::SambaNova => "sambanova",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Environment variable consulted when no explicit key is given.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "OPENAI_API_KEY",
            ProviderType::Anthropic => "ANTHROPIC_API_KEY",
            ProviderType::Gemini => "GEMINI_API_KEY",
            ProviderType::Groq => "GROQ_API_KEY",
            ProviderType::SambaNova => "SAMBANOVA_API_KEY",
        }
    }

    /// Base URL the client passes for hosts that reuse the OpenAI wire format.
    pub fn base_url_override(&self) -> Option<&'static str> {
        match self {
            ProviderType::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/openai/"),
            ProviderType::Groq => Some("https://api.groq.com/openai/v1/"),
            ProviderType::SambaNova => Some("https://api.sambanova.ai/v1/"),
            ProviderType::OpenAI | ProviderType::Anthropic => None,
        }
    }

    /// Factory building this provider's adapter from options.
    pub fn factory(self) -> ProviderFactory {
        Arc::new(move |options: ProviderOptions| self.create(options))
    }

    /// Build the adapter, resolving the credential first.
    pub fn create(&self, options: ProviderOptions) -> Result<Arc<dyn ChatProvider>, Error> {
        let token = resolve_token(self.name(), self.env_var(), options.token.as_deref())?;
        tracing::debug!(
            provider = %self.name(),
            base_url = ?options.base_url,
            "creating provider"
        );

        let provider: Arc<dyn ChatProvider> = match self {
            ProviderType::Anthropic => Arc::new(match options.base_url {
                Some(base_url) => AnthropicProvider::new_with_base_url(token, base_url)?,
                None => AnthropicProvider::new(token)?,
            }),
            ProviderType::OpenAI
            | ProviderType::Gemini
            | ProviderType::Groq
            | ProviderType::SambaNova => {
                let base_url = options
                    .base_url
                    .or_else(|| self.base_url_override().map(str::to_string));
                let provider = match base_url {
                    Some(base_url) => OpenAIProvider::new_with_base_url(token, base_url)?,
                    None => OpenAIProvider::new(token)?,
                };
                Arc::new(provider.named(self.name()))
            }
        };
        Ok(provider)
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Pick the explicit token, else the environment variable.
///
/// Empty values count as absent in both places.
pub fn resolve_token(
    provider: &str,
    env_var: &str,
    explicit: Option<&str>,
) -> Result<String, Error> {
    if let Some(token) = explicit.filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }
    match env::var(env_var) {
        Ok(token) if !token.is_empty() => {
            tracing::debug!(provider = %provider, env_var = %env_var, "using credential from environment");
            Ok(token)
        }
        _ => Err(Error::missing_credential(provider, env_var)),
    }
}
