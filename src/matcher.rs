//! Contextual span matching: find the window of sentences inside each
//! candidate snippet that best matches the quote, by embedding cosine
//! similarity, and rank all windows across all candidates.

use serde::Serialize;
use tracing::{debug, warn};

use crate::capability::SentenceEncoder;
use crate::search::SearchCandidate;
use crate::text::{clean_text, contains_korean};

/// Minimum sentence length (in characters) kept during snippet splitting.
/// Korean runs denser, so shorter sentences survive there.
const MIN_LEN_KO: usize = 10;
const MIN_LEN_EN: usize = 20;

/// Best-matching window for one candidate snippet.
#[derive(Debug, Clone, Serialize)]
pub struct SpanMatch {
    pub url: String,
    /// Center sentence the winning window was built around.
    pub center_sentence: String,
    /// Cosine similarity between the quote span and this window, in [-1, 1].
    pub best_score: f32,
    pub span_text: String,
    pub span_start: usize,
    pub span_end: usize,
}

/// Split a snippet into sentences with language-aware minimum-length
/// filtering. When `is_korean` is `None` the language is sniffed from the
/// text itself.
pub fn split_snippet_sentences(text: &str, is_korean: Option<bool>) -> Vec<String> {
    let is_korean = is_korean.unwrap_or_else(|| contains_korean(text));
    let min_len = if is_korean { MIN_LEN_KO } else { MIN_LEN_EN };

    crate::text::split_sentences(text)
        .into_iter()
        .map(|s| clean_text(&s))
        .filter(|s| !s.is_empty() && s.chars().count() >= min_len)
        .collect()
}

/// Join `before`/`after` context sentences around a center index with single
/// spaces. Returns the span text and its inclusive sentence range.
pub fn extract_span(
    sentences: &[String],
    center: usize,
    before: usize,
    after: usize,
) -> Option<(String, usize, usize)> {
    if sentences.is_empty() || center >= sentences.len() {
        return None;
    }
    let start = center.saturating_sub(before);
    let end = (center + after).min(sentences.len() - 1);
    Some((sentences[start..=end].join(" "), start, end))
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    // Encoder vectors are already L2-normalized.
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Build the single representative quote span: a window of the same shape
/// centered on the quote's middle sentence. An unsplittable quote is used
/// whole.
fn quote_span(quote: &str, before: usize, after: usize) -> String {
    // The quote reaching this stage is already in the snippet language
    // (translated), so split with the non-Korean threshold.
    let sentences = split_snippet_sentences(quote, Some(false));
    if sentences.is_empty() {
        return clean_text(quote);
    }
    let center = sentences.len() / 2;
    extract_span(&sentences, center, before, after)
        .map(|(text, _, _)| text)
        .unwrap_or_else(|| clean_text(quote))
}

/// Find the best-matching span per candidate snippet, then pool and rank all
/// of them by score descending. The first entry is the primary result.
///
/// Snippets that do not segment into sentences, and snippets whose encoding
/// call fails, are skipped without aborting the batch.
pub fn find_best_span(
    quote: &str,
    candidates: &[SearchCandidate],
    before: usize,
    after: usize,
    encoder: &impl SentenceEncoder,
) -> Vec<SpanMatch> {
    let quote_span_text = quote_span(quote, before, after);
    if quote_span_text.is_empty() {
        return Vec::new();
    }

    let quote_emb = match encoder.encode(&[&quote_span_text]) {
        Ok(mut embs) if !embs.is_empty() => embs.remove(0),
        Ok(_) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "quote embedding failed, skipping span matching");
            return Vec::new();
        }
    };

    let mut pooled: Vec<SpanMatch> = Vec::new();

    for candidate in candidates {
        if candidate.url.is_empty() || candidate.snippet.is_empty() {
            continue;
        }
        let sentences = split_snippet_sentences(&candidate.snippet, Some(false));
        if sentences.is_empty() {
            debug!(url = %candidate.url, "snippet did not segment, skipping");
            continue;
        }

        let mut spans = Vec::with_capacity(sentences.len());
        let mut meta = Vec::with_capacity(sentences.len());
        for center in 0..sentences.len() {
            if let Some((text, start, end)) = extract_span(&sentences, center, before, after) {
                spans.push(text);
                meta.push((center, start, end));
            }
        }

        let span_refs: Vec<&str> = spans.iter().map(String::as_str).collect();
        let embeddings = match encoder.encode(&span_refs) {
            Ok(embs) if embs.len() == spans.len() => embs,
            Ok(_) => {
                warn!(url = %candidate.url, "encoder returned wrong batch size, skipping");
                continue;
            }
            Err(e) => {
                warn!(url = %candidate.url, error = %e, "snippet embedding failed, skipping");
                continue;
            }
        };

        let best = embeddings
            .iter()
            .map(|emb| cosine(&quote_emb, emb))
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let Some((best_idx, best_score)) = best else {
            continue;
        };
        let (center, start, end) = meta[best_idx];

        pooled.push(SpanMatch {
            url: candidate.url.clone(),
            center_sentence: sentences[center].clone(),
            best_score,
            span_text: spans[best_idx].clone(),
            span_start: start,
            span_end: end,
        });
    }

    pooled.sort_by(|a, b| {
        b.best_score
            .partial_cmp(&a.best_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    pooled
}
