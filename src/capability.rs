//! Contracts for the externally-provided model and lookup capabilities.
//!
//! The pipeline never loads models itself; callers hand in one handle per
//! process (loaded once, read-only afterward) implementing these traits.
//! Production implementations wrap the NER tagger, keyphrase extractor,
//! machine translator, entity-lookup service and sentence encoder; tests use
//! in-memory mocks.

use thiserror::Error;

use crate::entity::Token;
use crate::keywords::KeywordCandidate;

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("capability unavailable: {0}")]
    Unavailable(String),

    #[error("capability call failed: {0}")]
    Failed(String),
}

/// Token-level named-entity tagging for one sentence.
pub trait NerTagger {
    fn tag(&self, sentence: &str) -> Result<Vec<Token>, CapabilityError>;
}

/// Scored keyphrase extraction over the whole article text.
pub trait KeyphraseExtractor {
    fn extract(
        &self,
        text: &str,
        ngram_range: (usize, usize),
        top_n: usize,
        diversity: f32,
    ) -> Result<Vec<KeywordCandidate>, CapabilityError>;
}

/// Korean-to-English machine translation. May fail; every call site falls
/// back to the original text or skips the token.
pub trait Translator {
    async fn translate(&self, korean: &str) -> Result<String, CapabilityError>;
}

/// External entity lookup: Korean name in, English label out (when the
/// knowledge base has one).
pub trait NameLookup {
    async fn lookup(&self, korean_name: &str) -> Result<Option<String>, CapabilityError>;
}

/// Batched sentence embedding. Returned vectors are L2-normalized, so cosine
/// similarity reduces to a dot product.
pub trait SentenceEncoder {
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, CapabilityError>;
}
