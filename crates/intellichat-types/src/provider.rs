use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    #[serde(rename = "openai")]
    OpenAI,
    Azure,
    Mistral,
    Anthropic,
    Cohere,
}

impl ProviderName {
    pub const ALL: [ProviderName; 5] = [
        ProviderName::OpenAI,
        ProviderName::Azure,
        ProviderName::Mistral,
        ProviderName::Anthropic,
        ProviderName::Cohere,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::OpenAI => "openai",
            ProviderName::Azure => "azure",
            ProviderName::Mistral => "mistral",
            ProviderName::Anthropic => "anthropic",
            ProviderName::Cohere => "cohere",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderName::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown provider: {s}"))
    }
}

/// Per-provider settings supplied by the caller, discriminated by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum ProviderConfig {
    #[serde(rename = "openai")]
    OpenAI(RemoteConfig),
    Azure(AzureConfig),
    Mistral(RemoteConfig),
    Anthropic(RemoteConfig),
    Cohere(RemoteConfig),
}

/// Settings shared by providers that only need a key and a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Azure OpenAI settings. `model` names the chat deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Wire shape of one entry in a request's `providers` map.
///
/// `name` may be omitted, in which case the map key names the provider.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct ProviderEntry {
    #[serde(default)]
    name: Option<ProviderName>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    resource_name: Option<String>,
    #[serde(default)]
    embedding_name: Option<String>,
    #[serde(default)]
    api_version: Option<String>,
}

impl ProviderEntry {
    /// Resolve the entry for `slot`. Azure-only fields are rejected on other providers.
    pub(crate) fn into_config(self, slot: ProviderName) -> Result<ProviderConfig, String> {
        let name = self.name.unwrap_or(slot);
        if name != ProviderName::Azure {
            let azure_only = [
                ("resourceName", self.resource_name.is_some()),
                ("embeddingName", self.embedding_name.is_some()),
                ("apiVersion", self.api_version.is_some()),
            ];
            if let Some((field, _)) = azure_only.into_iter().find(|(_, present)| *present) {
                return Err(format!("`{field}` is only valid for azure, not {name}"));
            }
        }

        let remote = RemoteConfig {
            api_key: self.api_key,
            model: self.model,
        };
        Ok(match name {
            ProviderName::OpenAI => ProviderConfig::OpenAI(remote),
            ProviderName::Mistral => ProviderConfig::Mistral(remote),
            ProviderName::Anthropic => ProviderConfig::Anthropic(remote),
            ProviderName::Cohere => ProviderConfig::Cohere(remote),
            ProviderName::Azure => ProviderConfig::Azure(AzureConfig {
                api_key: remote.api_key,
                model: remote.model,
                resource_name: self.resource_name,
                embedding_name: self.embedding_name,
                api_version: self.api_version,
            }),
        })
    }
}

impl ProviderConfig {
    /// An empty config for `name`, used when the caller supplied none.
    pub fn default_for(name: ProviderName) -> Self {
        match name {
            ProviderName::OpenAI => ProviderConfig::OpenAI(RemoteConfig::default()),
            ProviderName::Azure => ProviderConfig::Azure(AzureConfig::default()),
            ProviderName::Mistral => ProviderConfig::Mistral(RemoteConfig::default()),
            ProviderName::Anthropic => ProviderConfig::Anthropic(RemoteConfig::default()),
            ProviderName::Cohere => ProviderConfig::Cohere(RemoteConfig::default()),
        }
    }

    pub fn name(&self) -> ProviderName {
        match self {
            ProviderConfig::OpenAI(_) => ProviderName::OpenAI,
            ProviderConfig::Azure(_) => ProviderName::Azure,
            ProviderConfig::Mistral(_) => ProviderName::Mistral,
            ProviderConfig::Anthropic(_) => ProviderName::Anthropic,
            ProviderConfig::Cohere(_) => ProviderName::Cohere,
        }
    }

    /// The caller-supplied key, ignoring blank strings.
    pub fn api_key(&self) -> Option<&str> {
        let key = match self {
            ProviderConfig::Azure(c) => c.api_key.as_deref(),
            ProviderConfig::OpenAI(c)
            | ProviderConfig::Mistral(c)
            | ProviderConfig::Anthropic(c)
            | ProviderConfig::Cohere(c) => c.api_key.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            ProviderConfig::Azure(c) => c.model.as_deref(),
            ProviderConfig::OpenAI(c)
            | ProviderConfig::Mistral(c)
            | ProviderConfig::Anthropic(c)
            | ProviderConfig::Cohere(c) => c.model.as_deref(),
        }
    }

    /// Replace the key, keeping every other field.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = Some(key.into());
        match &mut self {
            ProviderConfig::Azure(c) => c.api_key = key,
            ProviderConfig::OpenAI(c)
            | ProviderConfig::Mistral(c)
            | ProviderConfig::Anthropic(c)
            | ProviderConfig::Cohere(c) => c.api_key = key,
        }
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = Some(model.into());
        match &mut self {
            ProviderConfig::Azure(c) => c.model = model,
            ProviderConfig::OpenAI(c)
            | ProviderConfig::Mistral(c)
            | ProviderConfig::Anthropic(c)
            | ProviderConfig::Cohere(c) => c.model = model,
        }
        self
    }
}
