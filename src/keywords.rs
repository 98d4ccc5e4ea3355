//! Keyword re-ranking with entity/relation boosts.
//!
//! The keyphrase extractor overfetches candidates (typically 3x the desired
//! count); re-ranking folds in what the entity merger found, and the caller
//! truncates to its top-N afterward.

use serde::Serialize;
use tracing::debug;

use crate::entity::Entity;
use crate::text::normalize_phrase;

/// A scored keyphrase from the extraction capability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordCandidate {
    pub phrase: String,
    pub score: f32,
}

impl KeywordCandidate {
    pub fn new(phrase: impl Into<String>, score: f32) -> Self {
        Self {
            phrase: phrase.into(),
            score,
        }
    }
}

/// Relation-like Korean terms that make a keyphrase more quotable: talks,
/// negotiations, announcements and the like.
pub const RELATION_TERMS: [&str; 16] = [
    "회담", "협력", "관계", "회의", "발표", "대화", "담화", "중재", "교섭", "협상", "동맹", "문제",
    "논란", "비판", "우려", "방침",
];

pub const DEFAULT_ALPHA: f32 = 0.7;
pub const DEFAULT_BETA: f32 = 0.3;

/// Rescore candidates as `alpha * score + beta * bonus` where the bonus is
/// 1.0 when the normalized phrase contains both an entity and a relation
/// term, 0.6 when it contains either, and 0.0 otherwise. The result is
/// sorted descending (ties keep extraction order) and deduplicated by
/// normalized phrase, keeping the highest-scored occurrence.
pub fn rerank(
    candidates: &[KeywordCandidate],
    entities: &[Entity],
    alpha: f32,
    beta: f32,
    relation_terms: &[&str],
) -> Vec<KeywordCandidate> {
    let entity_terms: Vec<String> = entities
        .iter()
        .map(|e| normalize_phrase(&e.surface))
        .filter(|t| !t.is_empty())
        .collect();
    let rel_terms: Vec<String> = relation_terms
        .iter()
        .map(|t| normalize_phrase(t))
        .filter(|t| !t.is_empty())
        .collect();

    let mut rescored: Vec<KeywordCandidate> = candidates
        .iter()
        .map(|kw| {
            let normalized = normalize_phrase(&kw.phrase);
            let has_entity = entity_terms.iter().any(|t| normalized.contains(t.as_str()));
            let has_relation = rel_terms.iter().any(|t| normalized.contains(t.as_str()));
            let bonus = match (has_entity, has_relation) {
                (true, true) => 1.0,
                (true, false) | (false, true) => 0.6,
                (false, false) => 0.0,
            };
            KeywordCandidate::new(kw.phrase.clone(), alpha * kw.score + beta * bonus)
        })
        .collect();

    // Stable sort: candidates with equal scores keep their extraction order.
    rescored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut seen = std::collections::HashSet::new();
    let deduped: Vec<KeywordCandidate> = rescored
        .into_iter()
        .filter(|kw| seen.insert(normalize_phrase(&kw.phrase)))
        .collect();

    debug!(kept = deduped.len(), "keywords reranked");
    deduped
}
