//! Keyword retrieval and prompt augmentation for `/rag/retrieve`.

use amp_types::{MemoryRecord, RagSource};
use std::collections::HashSet;

/// Lowercased alphanumeric runs of `text`.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Rank `memories` (oldest first) against `query` and keep the best `top_k`.
///
/// Score is the share of distinct query tokens found in the memory. Ties
/// break on importance, then on recency.
pub fn rank(memories: &[MemoryRecord], query: &str, top_k: usize) -> Vec<RagSource> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return Vec::new();
    }
    let mut scored: Vec<(usize, f64)> = memories
        .iter()
        .enumerate()
        .filter_map(|(idx, m)| {
            let tokens = tokenize(&m.content);
            let hits = query_tokens.iter().filter(|t| tokens.contains(*t)).count();
            if hits == 0 {
                None
            } else {
                Some((idx, hits as f64 / query_tokens.len() as f64))
            }
        })
        .collect();
    scored.sort_by(|(ia, sa), (ib, sb)| {
        sb.total_cmp(sa)
            .then_with(|| memories[*ib].importance.cmp(&memories[*ia].importance))
            .then_with(|| ib.cmp(ia))
    });
    scored
        .into_iter()
        .take(top_k)
        .map(|(idx, score)| {
            let m = &memories[idx];
            RagSource {
                id: m.id.clone(),
                content: m.content.clone(),
                score,
                importance: m.importance,
                timestamp: m.created_at.clone(),
            }
        })
        .collect()
}

/// Wrap `query` with numbered context blocks; the bare query when nothing matched.
pub fn build_augmented_prompt(query: &str, sources: &[RagSource]) -> String {
    if sources.is_empty() {
        return query.to_string();
    }
    let context = sources
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[{}] {}", i + 1, s.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Context information is below:\n---\n{}\n---\n\nGiven the context information above, please answer the following question:\n{}\n\nIf the context doesn't contain relevant information to answer the question, please say so.",
        context, query
    )
}
