/// Options a provider factory builds an adapter from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderOptions {
    /// Explicit API token. When absent the factory falls back to the
    /// provider's environment variable.
    pub token: Option<String>,
    /// Endpoint override, for vendors reached through an OpenAI-compatible host.
    pub base_url: Option<String>,
}

impl ProviderOptions {
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Explicit per-provider API keys handed to the [`Client`](crate::Client).
///
/// Any key left unset (or empty) is read from the provider's conventional
/// environment variable when the provider is first used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub gemini: Option<String>,
    pub groq: Option<String>,
    pub sambanova: Option<String>,
}

impl ApiKeys {
    /// Explicit key for a provider name, ignoring empty strings.
    pub fn for_provider(&self, provider: &str) -> Option<&str> {
        let key = match provider {
            "openai" => self.openai.as_deref(),
            "anthropic" => self.anthropic.as_deref(),
            "gemini" => self.gemini.as_deref(),
            "groq" => self.groq.as_deref(),
            "sambanova" => self.sambanova.as_deref(),
            _ => None,
        };
        key.filter(|k| !k.is_empty())
    }
}
