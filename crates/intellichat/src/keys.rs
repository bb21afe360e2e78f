//! Server-side API keys and the key precedence chain.
//!
//! A request's key is the first of:
//! 1. the `apiKey` in the request's own settings for the provider,
//! 2. the server key for the provider (`OPENAI_API_KEY`, ...),
//! 3. the server default key for the provider (`DEFAULT_OPENAI_API_KEY`, ...),
//!    offered only to callers presenting the server's shared one-key.

use std::collections::{BTreeMap, HashMap};

use intellichat_types::{ProviderConfig, ProviderName};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

pub type ApiKey = SecretString;

/// Environment variable holding the shared one-key.
pub const ONE_KEY_VAR: &str = "INTELLI_ONE_KEY";

/// Read-only key configuration shared by all requests.
#[derive(Debug, Default)]
pub struct KeyStore {
    provider_keys: HashMap<ProviderName, SecretString>,
    default_keys: HashMap<ProviderName, SecretString>,
    one_key: Option<SecretString>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load keys from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load keys through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: String| lookup(name.as_str()).filter(|v| !v.trim().is_empty());
        let mut store = Self::new();

        for provider in ProviderName::ALL {
            if let Some(key) = read(provider_key_var(provider)) {
                store = store.with_provider_key(provider, key);
                info!("Registered {provider} provider key");
            }
            if let Some(key) = read(default_key_var(provider)) {
                store = store.with_default_key(provider, key);
                info!("Registered {provider} default key");
            }
        }

        if let Some(one_key) = read(ONE_KEY_VAR.to_string()) {
            store = store.with_one_key(one_key);
            info!("Shared one-key configured");
        }

        if store.provider_keys.is_empty() && store.default_keys.is_empty() {
            warn!(
                "No server-side provider keys configured. \
                Callers must send apiKey in their provider settings."
            );
        }

        store
    }

    pub fn with_provider_key(mut self, provider: ProviderName, key: impl Into<String>) -> Self {
        self.provider_keys
            .insert(provider, SecretString::new(key.into()));
        self
    }

    pub fn with_default_key(mut self, provider: ProviderName, key: impl Into<String>) -> Self {
        self.default_keys
            .insert(provider, SecretString::new(key.into()));
        self
    }

    pub fn with_one_key(mut self, key: impl Into<String>) -> Self {
        self.one_key = Some(SecretString::new(key.into()));
        self
    }

    /// Providers with a server key, in name order.
    pub fn configured_providers(&self) -> Vec<ProviderName> {
        let mut providers: Vec<ProviderName> = self.provider_keys.keys().copied().collect();
        providers.sort();
        providers
    }

    pub fn has_one_key(&self) -> bool {
        self.one_key.is_some()
    }

    /// Server key registered for `provider`.
    pub fn provider_key(&self, provider: ProviderName) -> Option<ApiKey> {
        self.provider_keys.get(&provider).map(copy_secret)
    }

    /// Server default key for `provider`, released only for the shared one-key.
    pub fn default_key(&self, provider: ProviderName, one_key: Option<&str>) -> Option<ApiKey> {
        if !self.accepts_one_key(one_key?) {
            return None;
        }
        self.default_keys.get(&provider).map(copy_secret)
    }

    fn accepts_one_key(&self, candidate: &str) -> bool {
        self.one_key.as_ref().is_some_and(|expected| {
            expected
                .expose_secret()
                .as_bytes()
                .ct_eq(candidate.as_bytes())
                .into()
        })
    }
}

/// Resolve the key for `provider`; first match wins.
pub fn resolve_api_key(
    providers: &BTreeMap<ProviderName, ProviderConfig>,
    provider: ProviderName,
    one_key: Option<&str>,
    store: &KeyStore,
) -> Option<ApiKey> {
    request_key(providers, provider)
        .or_else(|| store.provider_key(provider))
        .or_else(|| store.default_key(provider, one_key))
}

/// Resolve the key used for context augmentation, always from the OpenAI slot.
pub fn resolve_context_key(
    providers: &BTreeMap<ProviderName, ProviderConfig>,
    store: &KeyStore,
) -> Option<ApiKey> {
    request_key(providers, ProviderName::OpenAI)
        .or_else(|| store.provider_key(ProviderName::OpenAI))
}

fn request_key(
    providers: &BTreeMap<ProviderName, ProviderConfig>,
    provider: ProviderName,
) -> Option<ApiKey> {
    providers
        .get(&provider)
        .and_then(ProviderConfig::api_key)
        .map(|k| SecretString::new(k.to_string()))
}

fn copy_secret(secret: &SecretString) -> ApiKey {
    SecretString::new(secret.expose_secret().clone())
}

fn provider_key_var(provider: ProviderName) -> String {
    format!("{}_API_KEY", provider.as_str().to_uppercase())
}

fn default_key_var(provider: ProviderName) -> String {
    format!("DEFAULT_{}_API_KEY", provider.as_str().to_uppercase())
}

#[cfg(test)]
mod tests {
    use intellichat_types::RemoteConfig;

    use super::*;

    fn exposed(key: Option<ApiKey>) -> Option<String> {
        key.map(|k| k.expose_secret().clone())
    }

    fn request_providers(key: &str) -> BTreeMap<ProviderName, ProviderConfig> {
        BTreeMap::from([(
            ProviderName::OpenAI,
            ProviderConfig::OpenAI(RemoteConfig {
                api_key: Some(key.to_string()),
                model: None,
            }),
        )])
    }

    fn full_store() -> KeyStore {
        KeyStore::new()
            .with_provider_key(ProviderName::OpenAI, "server")
            .with_default_key(ProviderName::OpenAI, "default")
            .with_one_key("shared")
    }

    #[test]
    fn request_key_wins() {
        let key = resolve_api_key(
            &request_providers("request"),
            ProviderName::OpenAI,
            Some("shared"),
            &full_store(),
        );
        assert_eq!(exposed(key).as_deref(), Some("request"));
    }

    #[test]
    fn server_key_is_second() {
        let key = resolve_api_key(
            &BTreeMap::new(),
            ProviderName::OpenAI,
            Some("shared"),
            &full_store(),
        );
        assert_eq!(exposed(key).as_deref(), Some("server"));
    }

    #[test]
    fn blank_request_key_falls_through() {
        let key = resolve_api_key(
            &request_providers("  "),
            ProviderName::OpenAI,
            None,
            &full_store(),
        );
        assert_eq!(exposed(key).as_deref(), Some("server"));
    }

    #[test]
    fn default_key_requires_matching_one_key() {
        let store = KeyStore::new()
            .with_default_key(ProviderName::Mistral, "default")
            .with_one_key("shared");
        let providers = BTreeMap::new();

        let with_match = resolve_api_key(&providers, ProviderName::Mistral, Some("shared"), &store);
        assert_eq!(exposed(with_match).as_deref(), Some("default"));

        let wrong = resolve_api_key(&providers, ProviderName::Mistral, Some("guess"), &store);
        assert!(wrong.is_none());

        let absent = resolve_api_key(&providers, ProviderName::Mistral, None, &store);
        assert!(absent.is_none());
    }

    #[test]
    fn default_key_unavailable_without_server_one_key() {
        let store = KeyStore::new().with_default_key(ProviderName::Cohere, "default");
        let key = resolve_api_key(&BTreeMap::new(), ProviderName::Cohere, Some("any"), &store);
        assert!(key.is_none());
    }

    #[test]
    fn keys_do_not_leak_across_providers() {
        let key = resolve_api_key(
            &request_providers("request"),
            ProviderName::Anthropic,
            None,
            &full_store(),
        );
        assert!(key.is_none());
    }

    #[test]
    fn context_key_always_uses_openai_slot() {
        let store = KeyStore::new().with_provider_key(ProviderName::Azure, "azure");
        assert!(resolve_context_key(&BTreeMap::new(), &store).is_none());

        let key = resolve_context_key(&request_providers("ctx"), &store);
        assert_eq!(exposed(key).as_deref(), Some("ctx"));

        let store = store.with_provider_key(ProviderName::OpenAI, "server");
        let key = resolve_context_key(&BTreeMap::new(), &store);
        assert_eq!(exposed(key).as_deref(), Some("server"));
    }

    #[test]
    fn from_lookup_reads_expected_variables() {
        let store = KeyStore::from_lookup(|name| match name {
            "OPENAI_API_KEY" => Some("sk-env".to_string()),
            "ANTHROPIC_API_KEY" => Some("".to_string()),
            "DEFAULT_COHERE_API_KEY" => Some("co-default".to_string()),
            "INTELLI_ONE_KEY" => Some("one".to_string()),
            _ => None,
        });

        assert_eq!(
            exposed(store.provider_key(ProviderName::OpenAI)).as_deref(),
            Some("sk-env")
        );
        assert!(store.provider_key(ProviderName::Anthropic).is_none());
        assert_eq!(store.configured_providers(), vec![ProviderName::OpenAI]);
        assert!(store.has_one_key());
        assert_eq!(
            exposed(store.default_key(ProviderName::Cohere, Some("one"))).as_deref(),
            Some("co-default")
        );
    }
}
