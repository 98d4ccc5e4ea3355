//! quotetrace: attribute quoted sentences in Korean news articles to their
//! most plausible original-source passage on the web.
//!
//! The pipeline runs entity merging, keyword re-ranking, bilingual query
//! construction, context-gated search over a transcript archive and a
//! whitelisted general backend, and embedding-based span matching. Model
//! capabilities (tagger, keyphrase extractor, translator, entity lookup,
//! sentence encoder) are supplied by the caller through the traits in
//! [`capability`].

pub mod capability;
pub mod context;
pub mod entity;
pub mod keywords;
pub mod matcher;
pub mod pipeline;
pub mod query;
pub mod resolve;
pub mod search;
pub mod text;

pub const USER_AGENT: &str = concat!("quotetrace/", env!("CARGO_PKG_VERSION"));

pub use pipeline::{attribute, AttributionReport, AttributionRequest};
pub use search::SearchCandidate;
