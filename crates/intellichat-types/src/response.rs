use serde::{Deserialize, Serialize};

use crate::Reference;

/// Successful body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: ResponseText,
    /// Present on the generic provider path, absent on the Azure path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
}

/// A single reply or one reply per requested candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseText {
    Text(String),
    Choices(Vec<String>),
}

impl ResponseText {
    /// The first (primary) reply, if any.
    pub fn primary(&self) -> Option<&str> {
        match self {
            ResponseText::Text(text) => Some(text),
            ResponseText::Choices(choices) => choices.first().map(String::as_str),
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            ResponseText::Text(text) => vec![text],
            ResponseText::Choices(choices) => choices,
        }
    }
}

/// Failure body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn azure_style_response_omits_references() {
        let response = ChatResponse {
            response: ResponseText::Text("hello".to_string()),
            references: None,
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"response":"hello"}"#
        );
    }

    #[test]
    fn generic_response_keeps_empty_references() {
        let response = ChatResponse {
            response: ResponseText::Choices(vec!["a".to_string(), "b".to_string()]),
            references: Some(vec![]),
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"response":["a","b"],"references":[]}"#
        );
    }

    #[test]
    fn response_text_accepts_both_shapes() {
        let single: ResponseText = serde_json::from_str(r#""hi""#).unwrap();
        let many: ResponseText = serde_json::from_str(r#"["hi","hey"]"#).unwrap();
        assert_eq!(single.primary(), Some("hi"));
        assert_eq!(many.primary(), Some("hi"));
        assert_eq!(many.into_vec().len(), 2);
    }

    #[test]
    fn empty_choices_have_no_primary() {
        assert_eq!(ResponseText::Choices(vec![]).primary(), None);
    }
}
