//! The `provider:model` dispatcher.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio_util::sync::CancellationToken;

use crate::factory::ProviderType;
use crate::provider::ChatProvider;
use crate::registry::ProviderRegistry;
use crate::types::{ApiKeys, ProviderOptions};
use crate::{ChatRequest, ChatResponse, ChatStream, Error};

/// Split `"<provider>:<model>"` on the first colon.
///
/// The model part may itself contain colons (`openai:ft:gpt-4:org:abc123`).
pub fn split_model(model: &str) -> Result<(&str, &str), Error> {
    match model.split_once(':') {
        Some((provider, name)) if !provider.is_empty() && !name.is_empty() => Ok((provider, name)),
        _ => Err(Error::MalformedModel(model.to_string())),
    }
}

/// Entry point: routes each request to the adapter named by its model prefix.
///
/// Adapters are built on first use and reused for the client's lifetime.
pub struct Client {
    registry: Arc<ProviderRegistry>,
    api_keys: ApiKeys,
    base_urls: HashMap<String, String>,
    adapters: RwLock<HashMap<String, Arc<dyn ChatProvider>>>,
}

impl Client {
    /// A client over the built-in providers.
    pub fn new(api_keys: ApiKeys) -> Self {
        Self::with_registry(api_keys, ProviderRegistry::with_defaults())
    }

    /// A client over a caller-assembled registry.
    pub fn with_registry(api_keys: ApiKeys, registry: ProviderRegistry) -> Self {
        let base_urls = ProviderType::ALL
            .iter()
            .filter_map(|p| {
                p.base_url_override()
                    .map(|url| (p.name().to_string(), url.to_string()))
            })
            .collect();
        Self {
            registry: Arc::new(registry),
            api_keys,
            base_urls,
            adapters: RwLock::new(HashMap::new()),
        }
    }

    /// Send `provider`'s traffic to `base_url` instead of its default host.
    pub fn with_base_url(mut self, provider: impl Into<String>, base_url: impl Into<String>) -> Self {
        let provider = provider.into();
        self.adapters
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&provider);
        self.base_urls.insert(provider, base_url.into());
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse, Error> {
        self.chat_completion_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`chat_completion`](Self::chat_completion), aborted when `cancel` fires.
    pub async fn chat_completion_with_cancel(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse, Error> {
        let (provider, model) = self.resolve(&request.model)?;
        tracing::debug!(provider = %provider.name(), model = %model, "dispatching chat completion");
        provider
            .chat_completion(&request.with_model(model), cancel)
            .await
    }

    /// Open a streamed completion; resolves once the vendor accepts the request.
    pub async fn stream_chat_completion(&self, request: &ChatRequest) -> Result<ChatStream, Error> {
        self.stream_chat_completion_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`stream_chat_completion`](Self::stream_chat_completion); `cancel` also
    /// interrupts any pending [`ChatStream::next`].
    pub async fn stream_chat_completion_with_cancel(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatStream, Error> {
        let (provider, model) = self.resolve(&request.model)?;
        tracing::debug!(provider = %provider.name(), model = %model, "dispatching streamed chat completion");
        let mut request = request.with_model(model);
        request.stream = true;
        provider.stream_chat_completion(&request, cancel).await
    }

    /// Look up (or build and cache) the adapter for `model`'s provider.
    fn resolve<'m>(&self, model: &'m str) -> Result<(Arc<dyn ChatProvider>, &'m str), Error> {
        let (name, bare_model) = split_model(model)?;

        let cached = self
            .adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        if let Some(provider) = cached {
            return Ok((provider, bare_model));
        }

        let factory = self
            .registry
            .resolve(name)
            .ok_or_else(|| Error::UnknownProvider(name.to_string()))?;
        let options = ProviderOptions {
            token: self.api_keys.for_provider(name).map(str::to_string),
            base_url: self.base_urls.get(name).cloned(),
        };
        let built = factory(options)?;

        // A concurrent caller may have cached one first; keep theirs.
        let provider = self
            .adapters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_insert(built)
            .clone();
        Ok((provider, bare_model))
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(ApiKeys::default())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("registry", &self.registry)
            .field("base_urls", &self.base_urls)
            .finish_non_exhaustive()
    }
}
