//! End-to-end attribution: article text in, ranked source spans out.
//!
//! Every external capability and backend can fail independently; each stage
//! degrades to an empty result and the later stages carry on, so the worst
//! outcome is a mostly-empty report, never an error.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::capability::{
    KeyphraseExtractor, NameLookup, NerTagger, SentenceEncoder, Translator,
};
use crate::context::is_special_context;
use crate::entity::{merge_tokens, Entity, EntityIndex};
use crate::keywords::{rerank, KeywordCandidate, DEFAULT_ALPHA, DEFAULT_BETA, RELATION_TERMS};
use crate::matcher::{find_best_span, SpanMatch};
use crate::query::{self, QueryOptions, QueryPair};
use crate::search::{
    search, FocusedBackend, GeneralBackend, PageValidator, SearchCandidate,
};
use crate::text::{clean_text, extract_quotes, split_sentences};

/// Shortest quotation worth attributing when none is supplied explicitly.
const QUOTE_MIN_LENGTH: usize = 10;
/// Keyphrase overfetch multiplier ahead of re-ranking.
const KEYWORD_OVERFETCH: usize = 3;
const KEYPHRASE_NGRAM_RANGE: (usize, usize) = (1, 3);
const KEYPHRASE_DIVERSITY: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct AttributionRequest {
    pub article_text: String,
    /// Quote to attribute; when absent the longest-first quotation mark scan
    /// over the article supplies one.
    pub quote: Option<String>,
    /// Article date as `YYYY-MM-DD`; enables the focused query mode.
    pub article_date: Option<String>,
    pub focused: bool,
    pub top_k_keywords: usize,
    pub max_results: usize,
    /// Context sentences kept around a span's center during matching.
    pub span_before: usize,
    pub span_after: usize,
}

impl AttributionRequest {
    pub fn new(article_text: impl Into<String>) -> Self {
        Self {
            article_text: article_text.into(),
            quote: None,
            article_date: None,
            focused: false,
            top_k_keywords: 3,
            max_results: 6,
            span_before: 1,
            span_after: 1,
        }
    }
}

/// Everything the pipeline produced, stage by stage. Empty collections mean
/// the stage ran but found nothing (or its capability failed and was skipped).
#[derive(Debug, Serialize)]
pub struct AttributionReport {
    pub entities: Vec<Entity>,
    pub entities_by_type: BTreeMap<String, Vec<String>>,
    pub keywords: Vec<KeywordCandidate>,
    pub queries: QueryPair,
    pub is_special_context: bool,
    pub candidates: Vec<SearchCandidate>,
    pub best_span: Option<SpanMatch>,
    pub ranked_spans: Vec<SpanMatch>,
}

/// Run the full attribution pipeline for one article/quote pair.
#[allow(clippy::too_many_arguments)]
pub async fn attribute(
    request: &AttributionRequest,
    tagger: &impl NerTagger,
    extractor: &impl KeyphraseExtractor,
    translator: &impl Translator,
    lookup: &impl NameLookup,
    encoder: &impl SentenceEncoder,
    focused: Option<&impl FocusedBackend>,
    general: Option<&impl GeneralBackend>,
    validator: &impl PageValidator,
) -> AttributionReport {
    let article = clean_text(&request.article_text);

    let quote = request
        .quote
        .as_deref()
        .map(clean_text)
        .filter(|q| !q.is_empty())
        .or_else(|| extract_quotes(&article, QUOTE_MIN_LENGTH).into_iter().next());

    // Sentence-wise tagging: a sentence the tagger chokes on is skipped, the
    // rest of the article still contributes entities.
    let mut entities: Vec<Entity> = Vec::new();
    for sentence in split_sentences(&article) {
        match tagger.tag(&sentence) {
            Ok(tokens) => entities.extend(merge_tokens(&tokens)),
            Err(e) => {
                warn!(error = %e, "tagging failed for one sentence, skipping it");
            }
        }
    }
    let index = EntityIndex::build(&entities);
    debug!(merged = entities.len(), "entity pass complete");

    let keywords = extract_keywords(extractor, &article, &entities, request.top_k_keywords);

    let opts = QueryOptions {
        top_k: request.top_k_keywords,
        quote_sentence: quote.clone(),
        article_date: request.article_date.clone(),
        focused: request.focused,
        resolve_names: true,
    };
    let queries = query::build(&index, &entities, &keywords, &opts, lookup, translator).await;

    let special = is_special_context(&article, quote.as_deref(), &index);

    let search_query = queries.en.as_deref().or(queries.ko.as_deref());
    let candidates = match search_query {
        Some(q) => {
            info!(query = %q, special, "running search");
            // The archive is only preferred when the caller asked for the
            // focused mode; a special-context default run stays on the
            // general backend unless the query itself carries a name hint.
            search(
                focused,
                general,
                validator,
                q,
                special,
                request.focused,
                request.max_results,
            )
            .await
        }
        None => {
            warn!("no query could be built, skipping search");
            Vec::new()
        }
    };

    let ranked_spans = match match_quote(&quote, &queries, translator).await {
        Some(quote_en) => find_best_span(
            &quote_en,
            &candidates,
            request.span_before,
            request.span_after,
            encoder,
        ),
        None => Vec::new(),
    };
    let best_span = ranked_spans.first().cloned();

    AttributionReport {
        entities,
        entities_by_type: index
            .iter()
            .map(|(label, surfaces)| (label.as_label().to_string(), surfaces.to_vec()))
            .collect(),
        keywords,
        queries,
        is_special_context: special,
        candidates,
        best_span,
        ranked_spans,
    }
}

fn extract_keywords(
    extractor: &impl KeyphraseExtractor,
    article: &str,
    entities: &[Entity],
    top_k: usize,
) -> Vec<KeywordCandidate> {
    let overfetch = top_k.max(1) * KEYWORD_OVERFETCH;
    let candidates = match extractor.extract(
        article,
        KEYPHRASE_NGRAM_RANGE,
        overfetch,
        KEYPHRASE_DIVERSITY,
    ) {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(error = %e, "keyphrase extraction failed, continuing without keywords");
            return Vec::new();
        }
    };
    let mut reranked = rerank(&candidates, entities, DEFAULT_ALPHA, DEFAULT_BETA, &RELATION_TERMS);
    reranked.truncate(top_k);
    reranked
}

/// The matching text: the quote translated into the snippet language, falling
/// back to the English query when translation fails, `None` when there is
/// nothing to match with.
async fn match_quote(
    quote: &Option<String>,
    queries: &QueryPair,
    translator: &impl Translator,
) -> Option<String> {
    let quote = quote.as_deref()?;
    match translator.translate(quote).await {
        Ok(en) if !en.trim().is_empty() => Some(en),
        _ => {
            warn!("quote translation failed, matching against the query instead");
            queries.en.clone()
        }
    }
}
