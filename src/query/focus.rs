//! Focus-entity selection for focused (date-anchored) queries.
//!
//! The priority weights and the particle-suffix list are policy tuned on
//! Korean political news, not domain law; both are plain constants so they
//! can be adjusted without touching the selection logic.

use std::collections::HashMap;

use crate::entity::{Entity, EntityLabel};
use crate::keywords::KeywordCandidate;

fn label_priority(label: EntityLabel) -> u8 {
    match label {
        EntityLabel::Location => 3,
        EntityLabel::Organization => 2,
        EntityLabel::Person => 1,
        _ => 0,
    }
}

/// Pick one focus entity from the raw merged-entity list: priority
/// Location > Organization > Person-other-than-speaker, scored by
/// (label priority, occurrence count, longest surface). Persons whose text
/// overlaps the speaker's name are excluded.
pub fn select_focus_entity(entities: &[Entity], speaker_ko: &str) -> Option<String> {
    struct Stat {
        label: EntityLabel,
        count: usize,
        len: usize,
        order: usize,
    }

    let mut stats: HashMap<&str, Stat> = HashMap::new();
    let mut order = 0usize;

    for entity in entities {
        let text = entity.surface.trim();
        if text.is_empty() || label_priority(entity.label) == 0 {
            continue;
        }
        if entity.label == EntityLabel::Person
            && !speaker_ko.is_empty()
            && (text.contains(speaker_ko) || speaker_ko.contains(text))
        {
            continue;
        }

        let len = text.chars().count();
        stats
            .entry(text)
            .and_modify(|s| {
                s.count += 1;
                s.len = s.len.max(len);
            })
            .or_insert_with(|| {
                order += 1;
                Stat {
                    label: entity.label,
                    count: 1,
                    len,
                    order,
                }
            });
    }

    stats
        .into_iter()
        .max_by_key(|(_, s)| {
            (
                label_priority(s.label),
                s.count,
                s.len,
                std::cmp::Reverse(s.order),
            )
        })
        .map(|(text, _)| text.to_string())
}

/// Trailing case particles and similar suffixes, longest first so compound
/// particles strip before their tails.
const PARTICLE_SUFFIXES: [&str; 28] = [
    "으로써", "으로서", "만큼", "조차", "마저", "마다", "처럼", "같이", "보다", "께서", "라고",
    "하고", "이랑", "에서", "에게", "부터", "까지", "으로", "은", "는", "이", "가", "을", "를",
    "의", "와", "과", "랑",
];

/// Strip one trailing particle suffix from a Hangul token.
pub fn strip_particle(token: &str) -> &str {
    for suffix in PARTICLE_SUFFIXES {
        if let Some(stem) = token.strip_suffix(suffix) {
            return stem;
        }
    }
    token
}

/// Last-resort focus token from the keyword list: skip phrases mentioning
/// the speaker, then look for a clean Hangul-only token (no digits, length
/// at least two after particle stripping).
pub fn focus_token_from_keywords(keywords: &[KeywordCandidate], speaker_ko: &str) -> Option<String> {
    for kw in keywords {
        let phrase = kw.phrase.trim();
        if phrase.is_empty() {
            continue;
        }
        if !speaker_ko.is_empty() && phrase.contains(speaker_ko) {
            continue;
        }

        for raw in phrase.split_whitespace() {
            if !speaker_ko.is_empty() && raw.contains(speaker_ko) {
                continue;
            }
            if raw.chars().count() < 2 {
                continue;
            }
            if raw.chars().any(|c| c.is_ascii_digit()) {
                continue;
            }
            if !raw.chars().all(|c| matches!(c, '가'..='힣')) {
                continue;
            }

            let stem = strip_particle(raw);
            if stem.chars().count() >= 2 {
                return Some(stem.to_string());
            }
        }
    }
    None
}
