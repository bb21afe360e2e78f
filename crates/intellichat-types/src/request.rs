use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::provider::ProviderEntry;
use crate::{ChatMessage, ProviderConfig, ProviderName};

/// Body of `POST /api/chat`.
///
/// Unknown fields are rejected so that typos in client code surface as
/// validation errors instead of being silently ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default, deserialize_with = "deserialize_providers")]
    pub providers: BTreeMap<ProviderName, ProviderConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    /// Number of candidate responses to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(default)]
    pub with_context: bool,
    #[serde(default)]
    pub intellinode_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_key: Option<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            providers: BTreeMap::new(),
            provider: None,
            system_message: None,
            n: None,
            with_context: false,
            intellinode_data: false,
            one_key: None,
        }
    }
}

fn deserialize_providers<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<ProviderName, ProviderConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = BTreeMap::<ProviderName, ProviderEntry>::deserialize(deserializer)?;
    entries
        .into_iter()
        .map(|(slot, entry)| entry.into_config(slot).map(|config| (slot, config)))
        .collect::<Result<_, _>>()
        .map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn minimal_request_applies_serde_defaults() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"messages":[{"role":"user","content":"hi"}]}"#).unwrap();
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
        assert!(request.providers.is_empty());
        assert!(request.provider.is_none());
        assert!(request.n.is_none());
        assert!(!request.with_context);
        assert!(!request.intellinode_data);
    }

    #[test]
    fn full_request_deserializes() {
        let request: ChatRequest = serde_json::from_str(
            r#"{
                "messages": [{"id": "m1", "role": "user", "content": "hi"}],
                "providers": {"openai": {"name": "openai", "apiKey": "sk-x"}},
                "provider": "openai",
                "systemMessage": "be brief",
                "n": 3,
                "withContext": true,
                "intellinodeData": true,
                "oneKey": "one"
            }"#,
        )
        .unwrap();
        assert_eq!(request.provider, Some(ProviderName::OpenAI));
        assert_eq!(
            request.providers[&ProviderName::OpenAI].api_key(),
            Some("sk-x")
        );
        assert_eq!(request.system_message.as_deref(), Some("be brief"));
        assert_eq!(request.n, Some(3));
        assert!(request.with_context);
        assert!(request.intellinode_data);
        assert_eq!(request.one_key.as_deref(), Some("one"));
    }

    #[test]
    fn unknown_top_level_field_is_rejected() {
        let err = serde_json::from_str::<ChatRequest>(
            r#"{"messages":[],"temperature":0.2}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown field `temperature`"));
    }

    #[test]
    fn provider_name_defaults_to_its_slot() {
        let request: ChatRequest = serde_json::from_str(
            r#"{
                "messages": [{"role": "user", "content": "hi"}],
                "providers": {
                    "openai": {"apiKey": "sk-x"},
                    "azure": {"apiKey": "az", "resourceName": "acme"}
                }
            }"#,
        )
        .unwrap();
        let openai = &request.providers[&ProviderName::OpenAI];
        assert_eq!(openai.name(), ProviderName::OpenAI);
        assert_eq!(openai.api_key(), Some("sk-x"));
        let ProviderConfig::Azure(azure) = &request.providers[&ProviderName::Azure] else {
            panic!("expected azure config");
        };
        assert_eq!(azure.resource_name.as_deref(), Some("acme"));
    }

    #[test]
    fn explicit_name_overrides_slot() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"messages":[],"providers":{"openai":{"name":"mistral","apiKey":"m"}}}"#,
        )
        .unwrap();
        assert_eq!(
            request.providers[&ProviderName::OpenAI].name(),
            ProviderName::Mistral
        );
    }

    #[test]
    fn unknown_provider_key_is_rejected() {
        let result = serde_json::from_str::<ChatRequest>(
            r#"{"messages":[],"providers":{"replicate":{"name":"openai"}}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn misspelled_provider_field_is_rejected() {
        let err = serde_json::from_str::<ChatRequest>(
            r#"{"messages":[],"providers":{"openai":{"apiKey":"sk-x","temprature":1}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown field `temprature`"));
    }

    #[test]
    fn azure_fields_on_other_providers_are_rejected() {
        let err = serde_json::from_str::<ChatRequest>(
            r#"{"messages":[],"providers":{"openai":{"apiKey":"sk-x","resourceName":"x"}}}"#,
        )
        .unwrap_err();
        assert!(
            err.to_string()
                .contains("`resourceName` is only valid for azure, not openai")
        );

        let err = serde_json::from_str::<ChatRequest>(
            r#"{"messages":[],"providers":{"azure":{"name":"cohere","apiVersion":"2024-02-01"}}}"#,
        )
        .unwrap_err();
        assert!(
            err.to_string()
                .contains("`apiVersion` is only valid for azure, not cohere")
        );
    }

    #[test]
    fn missing_messages_is_rejected() {
        let err = serde_json::from_str::<ChatRequest>(r#"{"provider":"openai"}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `messages`"));
    }

    #[test]
    fn serialization_omits_unset_options() {
        let json = serde_json::to_value(ChatRequest::new(vec![ChatMessage::user("hi")])).unwrap();
        assert!(json.get("provider").is_none());
        assert!(json.get("oneKey").is_none());
        assert_eq!(json["withContext"], false);
    }
}
