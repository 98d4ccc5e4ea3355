//! Named-entity handling: BIO tag parsing and token merging.
//!
//! The upstream tagger emits per-token predictions whose labels arrive in
//! several shapes (`B-PER`, `PER-B`, bare `PER`). [`parse_tag`] folds those
//! into one tagged variant, and [`merge_tokens`] rebuilds full entities from
//! the token stream, recovering from malformed sequences instead of failing.

pub mod index;

pub use index::EntityIndex;

use serde::Serialize;
use tracing::debug;

use crate::text::normalize_phrase;

/// Closed label set kept from the tagger's output. Anything else is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EntityLabel {
    Person,
    Organization,
    Location,
    Date,
    Artifact,
}

impl EntityLabel {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_uppercase().as_str() {
            "PER" | "PERSON" | "PS" => Some(EntityLabel::Person),
            "ORG" | "ORGANIZATION" | "OG" => Some(EntityLabel::Organization),
            "LOC" | "LOCATION" | "LC" => Some(EntityLabel::Location),
            "DAT" | "DATE" | "DT" => Some(EntityLabel::Date),
            "AFW" | "ARTIFACT" => Some(EntityLabel::Artifact),
            _ => None,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            EntityLabel::Person => "PER",
            EntityLabel::Organization => "ORG",
            EntityLabel::Location => "LOC",
            EntityLabel::Date => "DAT",
            EntityLabel::Artifact => "AFW",
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One tagger prediction: a text fragment with its raw label and character
/// offsets within the sentence.
#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    pub tag: String,
    pub start: usize,
    pub end: usize,
}

/// A merged named entity. Offsets do not survive past the merge; downstream
/// stages only care about the label and surface form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub label: EntityLabel,
    pub surface: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Begin,
    Inside,
}

/// Outcome of parsing one raw tag string.
///
/// `OtherMarker` covers a known label with a boundary marker outside `B`/`I`
/// (for example `PER-E` from a BIOES-style model); the merger flushes and
/// resets on those. A tag whose label is outside the fixed set parses to
/// `Unrecognized` and its token is dropped without disturbing the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagParse {
    Tagged { boundary: Boundary, label: EntityLabel },
    OtherMarker(EntityLabel),
    Unrecognized,
}

fn boundary_from(marker: &str) -> Option<Boundary> {
    match marker {
        "B" => Some(Boundary::Begin),
        "I" => Some(Boundary::Inside),
        _ => None,
    }
}

/// Parse a raw tag in any of the observed shapes into `(boundary, label)`.
/// A bare label (`PER`) counts as a begin marker.
pub fn parse_tag(raw: &str) -> TagParse {
    let parts: Vec<&str> = raw.split('-').collect();
    match parts.as_slice() {
        [left, right] => {
            if let (Some(boundary), Some(label)) = (boundary_from(left), EntityLabel::from_label(right)) {
                return TagParse::Tagged { boundary, label };
            }
            if let (Some(boundary), Some(label)) = (boundary_from(right), EntityLabel::from_label(left)) {
                return TagParse::Tagged { boundary, label };
            }
            match (EntityLabel::from_label(left), EntityLabel::from_label(right)) {
                (Some(label), _) | (_, Some(label)) => TagParse::OtherMarker(label),
                _ => TagParse::Unrecognized,
            }
        }
        [bare] => match EntityLabel::from_label(bare) {
            Some(label) => TagParse::Tagged {
                boundary: Boundary::Begin,
                label,
            },
            None => TagParse::Unrecognized,
        },
        _ => TagParse::Unrecognized,
    }
}

const PUNCTUATION_FORMS: [&str; 12] = [
    "\"", "'", "(", ")", "[", "]", "{", "}", ",", ".", "!", "?",
];

/// Flush a buffered token group into an entity surface form, dropping junk:
/// sub-word markers are stripped, forms shorter than two characters or that
/// normalize to nothing are discarded.
fn flush_group(group: &[(EntityLabel, Token)], out: &mut Vec<Entity>) {
    let Some((label, _)) = group.first() else {
        return;
    };
    let surface: String = group
        .iter()
        .map(|(_, t)| t.text.replace("##", ""))
        .collect::<String>()
        .trim()
        .to_string();

    if surface.chars().count() < 2 {
        return;
    }
    if PUNCTUATION_FORMS.contains(&surface.as_str()) {
        return;
    }
    if normalize_phrase(&surface).is_empty() {
        return;
    }

    debug!(label = %label, surface = %surface, "merged entity");
    out.push(Entity {
        label: *label,
        surface,
    });
}

/// Merge BIO-tagged tokens from one sentence into full entities.
///
/// A begin marker flushes any pending buffer and starts a new one. An inside
/// marker extends the buffer only when its label matches and its start offset
/// is adjacent (gap of at most one character); otherwise it starts a fresh
/// buffer rather than erroring on a malformed sequence. A known label with
/// any other marker flushes and resets; tokens with labels outside the fixed
/// set are dropped without touching the buffer.
pub fn merge_tokens(tokens: &[Token]) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut buffer: Vec<(EntityLabel, Token)> = Vec::new();

    for token in tokens {
        match parse_tag(&token.tag) {
            TagParse::Tagged { boundary, label } => match boundary {
                Boundary::Begin => {
                    flush_group(&buffer, &mut entities);
                    buffer = vec![(label, token.clone())];
                }
                Boundary::Inside => {
                    let extends = buffer
                        .last()
                        .is_some_and(|(prev, t)| *prev == label && token.start <= t.end + 1);
                    if extends {
                        buffer.push((label, token.clone()));
                    } else {
                        flush_group(&buffer, &mut entities);
                        buffer = vec![(label, token.clone())];
                    }
                }
            },
            TagParse::OtherMarker(_) => {
                flush_group(&buffer, &mut entities);
                buffer.clear();
            }
            TagParse::Unrecognized => {
                debug!(tag = %token.tag, "skipping non-target tag");
            }
        }
    }

    flush_group(&buffer, &mut entities);
    entities
}
