//! Heuristic gate deciding whether the specialized transcript archive should
//! be tried before the general whitelisted-domain search. Pure string and
//! entity matching, no model calls.

use crate::entity::{EntityIndex, EntityLabel};

/// Name variants (Korean and English spellings) that route a request to the
/// transcript archive. Matched case-insensitively as substrings.
pub const NAME_VARIANTS: [&str; 6] = [
    "트럼프",
    "도널드 트럼프",
    "donald trump",
    "donald j. trump",
    "president trump",
    "trump",
];

/// Institutional cue terms that also flip the gate.
pub const INSTITUTION_CUES: [&str; 2] = ["백악관", "white house"];

fn matches_variant(text: &str) -> bool {
    let lowered = text.to_lowercase();
    NAME_VARIANTS.iter().any(|v| lowered.contains(v))
}

fn has_institution_cue(text: &str) -> bool {
    let lowered = text.to_lowercase();
    INSTITUTION_CUES.iter().any(|c| lowered.contains(c))
}

/// True when the query string itself carries a name-variant hint; the
/// orchestrator uses this as a belt-and-braces check in case the caller
/// forgot the context flag.
pub fn query_has_variant_hint(query: &str) -> bool {
    matches_variant(query)
}

/// Decide from entities and raw text whether this article/quote pair belongs
/// to the specialized transcript context.
pub fn is_special_context(article_text: &str, quote_text: Option<&str>, index: &EntityIndex) -> bool {
    if index
        .get(EntityLabel::Person)
        .iter()
        .any(|p| matches_variant(p))
    {
        return true;
    }

    if matches_variant(article_text) || quote_text.is_some_and(matches_variant) {
        return true;
    }

    has_institution_cue(article_text) || quote_text.is_some_and(has_institution_cue)
}
