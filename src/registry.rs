//! Name-to-factory table consulted by the [`Client`](crate::Client).

use std::sync::Arc;

use crate::factory::ProviderType;
use crate::provider::ChatProvider;
use crate::types::ProviderOptions;
use crate::Error;

/// Builds an adapter bound to one credential and base URL.
pub type ProviderFactory =
    Arc<dyn Fn(ProviderOptions) -> Result<Arc<dyn ChatProvider>, Error> + Send + Sync>;

/// Registered provider factories, kept in registration order.
///
/// Mutated only while being assembled; the client holds it behind an `Arc`
/// afterwards, so lookups need no locking.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    entries: Vec<(String, ProviderFactory)>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in providers: openai, anthropic, gemini, groq, sambanova.
    pub fn with_defaults() -> Self {
        ProviderType::ALL
            .iter()
            .fold(Self::new(), |registry, provider| {
                registry.with(provider.name(), provider.factory())
            })
    }

    /// Register `factory` under `name`. A later registration for the same name wins.
    pub fn register(&mut self, name: impl Into<String>, factory: ProviderFactory) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => {
                tracing::debug!(provider = %name, "replacing registered provider");
                entry.1 = factory;
            }
            None => {
                tracing::debug!(provider = %name, "registering provider");
                self.entries.push((name, factory));
            }
        }
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, factory: ProviderFactory) -> Self {
        self.register(name, factory);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<ProviderFactory> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, factory)| Arc::clone(factory))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
