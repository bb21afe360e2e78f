//! Context augmentation.
//!
//! Two sources of extra material for the model:
//! - [`select_relevant`] trims the conversation to the prior messages most
//!   similar to the latest one, by embedding similarity.
//! - [`DocumentSearch`] fetches document chunks for one-key callers.

mod search;

use intellichat_types::ChatMessage;

use crate::llm::{EmbeddingProvider, LLMError};

pub use search::{DocumentSearch, SearchHit, augment_system_message, references_from_hits};

/// Keep the `window` prior messages most similar to the latest message.
///
/// The result keeps the original order and always ends with the latest
/// message. Conversations that already fit the window are returned as-is
/// without calling the embedder.
pub async fn select_relevant(
    embedder: &dyn EmbeddingProvider,
    messages: &[ChatMessage],
    window: usize,
) -> Result<Vec<ChatMessage>, LLMError> {
    let Some((latest, history)) = messages.split_last() else {
        return Ok(Vec::new());
    };
    if history.len() <= window {
        return Ok(messages.to_vec());
    }

    let inputs: Vec<String> = std::iter::once(latest)
        .chain(history)
        .map(|m| m.content.clone())
        .collect();
    let mut vectors = embedder.embed(inputs).await?;
    let candidates = vectors.split_off(1);
    let query = &vectors[0];

    let mut selected: Vec<ChatMessage> = top_k_indices(query, &candidates, window)
        .into_iter()
        .map(|i| history[i].clone())
        .collect();
    selected.push(latest.clone());
    Ok(selected)
}

/// Indices of the `k` candidates most similar to `query`, in ascending index order.
pub fn top_k_indices(query: &[f32], candidates: &[Vec<f32>], k: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f32)> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, cosine_similarity(query, c)))
        .collect();
    // Stable sort keeps earlier messages first on ties.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut picked: Vec<usize> = scored.into_iter().take(k).map(|(i, _)| i).collect();
    picked.sort_unstable();
    picked
}

/// Cosine similarity; 0.0 when either vector has zero length or they differ in size.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Embeds a message as a one-hot vector keyed on its first word.
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    impl KeywordEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(inputs
                .iter()
                .map(|text| match text.split_whitespace().next() {
                    Some("rust") => vec![1.0, 0.0, 0.0],
                    Some("cooking") => vec![0.0, 1.0, 0.0],
                    _ => vec![0.0, 0.0, 1.0],
                })
                .collect())
        }
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn top_k_returns_indices_in_original_order() {
        let candidates = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.9, 0.1], vec![0.0, 1.0]];
        assert_eq!(top_k_indices(&[1.0, 0.0], &candidates, 2), vec![1, 2]);
        assert_eq!(top_k_indices(&[1.0, 0.0], &candidates, 10), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn short_conversations_skip_embedding() {
        let embedder = KeywordEmbedder::new();
        let messages = vec![ChatMessage::user("rust a"), ChatMessage::user("rust b")];
        let selected = select_relevant(&embedder, &messages, 4).await.unwrap();
        assert_eq!(selected, messages);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn keeps_most_similar_history_and_latest() {
        let embedder = KeywordEmbedder::new();
        let messages = vec![
            ChatMessage::user("rust ownership?"),
            ChatMessage::assistant("cooking pasta takes ten minutes"),
            ChatMessage::user("weather today"),
            ChatMessage::assistant("rust borrows are checked at compile time"),
            ChatMessage::user("rust lifetimes?"),
        ];

        let selected = select_relevant(&embedder, &messages, 2).await.unwrap();
        let contents: Vec<&str> = selected.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "rust ownership?",
                "rust borrows are checked at compile time",
                "rust lifetimes?"
            ]
        );
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_conversation_selects_nothing() {
        let embedder = KeywordEmbedder::new();
        let selected = select_relevant(&embedder, &[], 2).await.unwrap();
        assert!(selected.is_empty());
    }
}
