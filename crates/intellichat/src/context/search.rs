//! Document search for one-key callers.

use intellichat_types::Reference;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::llm::{LLMError, check_status};

/// A document chunk returned by the search service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    pub document_name: String,
    pub text: String,
    #[serde(default)]
    pub score: Option<f32>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

/// Client for the semantic search service behind the one-key.
#[derive(Clone)]
pub struct DocumentSearch {
    client: Client,
    base_url: String,
}

impl DocumentSearch {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Top `k` chunks matching `query` in the documents owned by `one_key`.
    pub async fn search(
        &self,
        one_key: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, LLMError> {
        let url = format!("{}/semanticsearch/search", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("X-API-KEY", one_key)
            .json(&SearchRequest { query, k })
            .send()
            .await?;

        let mut hits = check_status(response)
            .await?
            .json::<SearchResponse>()
            .await?
            .data;
        hits.truncate(k);
        Ok(hits)
    }
}

/// Append the retrieved chunks to the system message.
pub fn augment_system_message(system_message: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return system_message.to_string();
    }

    let mut out = String::from(system_message);
    out.push_str("\n\nUse the following document excerpts when they are relevant:\n");
    for hit in hits {
        out.push_str(&format!("\n[{}]\n{}\n", hit.document_name, hit.text.trim()));
    }
    out
}

/// One reference per document, keeping the first (best) chunk of each.
pub fn references_from_hits(hits: &[SearchHit]) -> Vec<Reference> {
    let mut references: Vec<Reference> = Vec::new();
    for hit in hits {
        if references
            .iter()
            .any(|r| r.document_name == hit.document_name)
        {
            continue;
        }
        let mut reference = Reference::new(hit.document_name.clone());
        reference.excerpt = Some(hit.text.clone());
        reference.score = hit.score;
        references.push(reference);
    }
    references
}
