//! Bilingual search-query construction from entities and keywords.
//!
//! Two policies: the default mode assembles speaker + locations + keywords
//! (+ translated quote) for broad web search; focused mode anchors on
//! speaker + date + a single focus entity for the narrow transcript archive.
//! Construction fails closed — no Person entity means no query at all.

mod focus;

pub use focus::{focus_token_from_keywords, select_focus_entity, strip_particle};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::capability::{NameLookup, Translator};
use crate::entity::{Entity, EntityIndex, EntityLabel};
use crate::keywords::KeywordCandidate;
use crate::resolve::resolve_person_name;
use crate::text::dedupe_preserve;

/// Parallel Korean/English queries. `None` means construction produced
/// nothing usable for that language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryPair {
    pub ko: Option<String>,
    pub en: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Keyword tokens to include in default mode.
    pub top_k: usize,
    /// Quote sentence to append (translated) in default mode.
    pub quote_sentence: Option<String>,
    /// Article date as `YYYY-MM-DD`; required for focused mode.
    pub article_date: Option<String>,
    /// Build the narrow date-anchored query instead of the default one.
    pub focused: bool,
    /// Resolve the speaker through the name-resolution chain; when false the
    /// speaker is translated directly.
    pub resolve_names: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            quote_sentence: None,
            article_date: None,
            focused: false,
            resolve_names: true,
        }
    }
}

/// `2024-11-29` → `November 29, 2024`; anything unparseable passes through.
fn format_date_en(date: &str) -> String {
    match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(d) => d.format("%B %-d, %Y").to_string(),
        Err(_) => date.trim().to_string(),
    }
}

/// Translate and keep the first `max_words` words; on failure keep the
/// original token so the query stays usable.
async fn translate_token(translator: &impl Translator, token: &str, max_words: usize) -> String {
    match translator.translate(token).await {
        Ok(en) => {
            let trimmed: Vec<&str> = en.split_whitespace().take(max_words).collect();
            if trimmed.is_empty() {
                token.to_string()
            } else {
                trimmed.join(" ")
            }
        }
        Err(e) => {
            warn!(token = %token, error = %e, "translation failed, falling back to original");
            token.to_string()
        }
    }
}

/// Build the Korean/English query pair.
///
/// `entities` is the raw merged-entity list (with repetitions) used for
/// focus-entity frequency scoring; `index` is the collapsed per-label view.
pub async fn build(
    index: &EntityIndex,
    entities: &[Entity],
    keywords: &[KeywordCandidate],
    opts: &QueryOptions,
    lookup: &impl NameLookup,
    translator: &impl Translator,
) -> QueryPair {
    let Some(speaker_ko) = index.first(EntityLabel::Person).map(str::to_string) else {
        debug!("no person entity, skipping query construction");
        return QueryPair::default();
    };

    let speaker_en = if opts.resolve_names {
        resolve_person_name(&speaker_ko, lookup, translator).await
    } else {
        translate_token(translator, &speaker_ko, usize::MAX).await
    };

    if opts.focused && opts.article_date.is_some() {
        return build_focused(
            index, entities, keywords, opts, translator, &speaker_ko, &speaker_en,
        )
        .await;
    }

    // Locations: at most two, each translated and cut down to the part
    // before the first comma, then its first two words.
    let locations: Vec<String> = dedupe_preserve(index.get(EntityLabel::Location))
        .into_iter()
        .take(2)
        .collect();
    let mut locations_en = Vec::with_capacity(locations.len());
    for loc in &locations {
        let en = translate_token(translator, loc, usize::MAX).await;
        let first_part = en.split(',').next().unwrap_or("").trim();
        let short: Vec<&str> = first_part.split_whitespace().take(2).collect();
        if !short.is_empty() {
            locations_en.push(short.join(" "));
        }
    }

    let keywords_ko: Vec<String> = dedupe_preserve(
        &keywords
            .iter()
            .take(opts.top_k)
            .map(|k| k.phrase.clone())
            .collect::<Vec<_>>(),
    );
    let mut keywords_en = Vec::with_capacity(keywords_ko.len());
    for kw in &keywords_ko {
        keywords_en.push(translate_token(translator, kw, 3).await);
    }

    let quote_en = match &opts.quote_sentence {
        Some(quote) => match translator.translate(quote).await {
            Ok(en) if !en.trim().is_empty() => Some(en),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "quote translation failed, omitting from query");
                None
            }
        },
        None => None,
    };

    let mut en_tokens: Vec<String> = vec![speaker_en];
    en_tokens.extend(locations_en);
    en_tokens.extend(keywords_en);
    let mut en_tokens = dedupe_preserve(&en_tokens);
    if let Some(quote) = quote_en {
        en_tokens.push(quote);
    }
    let en = Some(en_tokens.join(" ").trim().to_string()).filter(|q| !q.is_empty());

    let mut ko_parts: Vec<String> = vec![speaker_ko];
    if !locations.is_empty() {
        ko_parts.push(locations.join(" "));
    }
    if !keywords_ko.is_empty() {
        ko_parts.push(keywords_ko.join(" "));
    }
    if let Some(quote) = &opts.quote_sentence {
        ko_parts.push(quote.clone());
    }
    let ko_words: Vec<&str> = ko_parts
        .iter()
        .flat_map(|p| p.split_whitespace())
        .collect();
    let ko = Some(dedupe_preserve(&ko_words).join(" ").trim().to_string()).filter(|q| !q.is_empty());

    QueryPair { ko, en }
}

async fn build_focused(
    index: &EntityIndex,
    entities: &[Entity],
    keywords: &[KeywordCandidate],
    opts: &QueryOptions,
    translator: &impl Translator,
    speaker_ko: &str,
    speaker_en: &str,
) -> QueryPair {
    // article_date presence is checked by the caller.
    let date_ko = opts.article_date.as_deref().unwrap_or_default().trim().to_string();
    let date_en = format_date_en(&date_ko);

    let mut focus_ko = select_focus_entity(entities, speaker_ko);

    if focus_ko.is_none() {
        focus_ko = index
            .first(EntityLabel::Location)
            .or_else(|| index.first(EntityLabel::Organization))
            .map(str::to_string);
    }
    if focus_ko.is_none() {
        focus_ko = focus_token_from_keywords(keywords, speaker_ko);
    }

    let focus_en = match &focus_ko {
        Some(ko) => Some(translate_token(translator, ko, 3).await),
        None => None,
    };

    let mut en_parts: Vec<&str> = Vec::new();
    if !speaker_en.is_empty() {
        en_parts.push(speaker_en);
    }
    if !date_en.is_empty() {
        en_parts.push(&date_en);
    }
    if let Some(focus) = &focus_en {
        en_parts.push(focus);
    }
    let en = Some(en_parts.join(" ").trim().to_string()).filter(|q| !q.is_empty());

    let mut ko_parts: Vec<&str> = Vec::new();
    if !speaker_ko.is_empty() {
        ko_parts.push(speaker_ko);
    }
    if !date_ko.is_empty() {
        ko_parts.push(&date_ko);
    }
    if let Some(focus) = &focus_ko {
        ko_parts.push(focus);
    }
    let ko = Some(ko_parts.join(" ").trim().to_string()).filter(|q| !q.is_empty());

    debug!(ko = ?ko, en = ?en, "focused query built");
    QueryPair { ko, en }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityError;
    use crate::entity::Entity;

    struct NoLookup;

    impl NameLookup for NoLookup {
        async fn lookup(&self, _name: &str) -> Result<Option<String>, CapabilityError> {
            Ok(None)
        }
    }

    /// Dictionary-backed fake translator; unknown inputs fail.
    struct FakeTranslator(Vec<(&'static str, &'static str)>);

    impl Translator for FakeTranslator {
        async fn translate(&self, korean: &str) -> Result<String, CapabilityError> {
            self.0
                .iter()
                .find(|(ko, _)| *ko == korean)
                .map(|(_, en)| en.to_string())
                .ok_or_else(|| CapabilityError::Failed(format!("no translation for {korean}")))
        }
    }

    fn ent(label: EntityLabel, surface: &str) -> Entity {
        Entity {
            label,
            surface: surface.into(),
        }
    }

    fn index_of(entities: &[Entity]) -> EntityIndex {
        EntityIndex::build(entities)
    }

    #[tokio::test]
    async fn no_person_entity_yields_no_queries() {
        let entities = [ent(EntityLabel::Location, "베네수엘라")];
        let pair = build(
            &index_of(&entities),
            &entities,
            &[KeywordCandidate::new("전면폐쇄", 0.9)],
            &QueryOptions::default(),
            &NoLookup,
            &FakeTranslator(vec![]),
        )
        .await;
        assert_eq!(pair, QueryPair { ko: None, en: None });
    }

    #[tokio::test]
    async fn default_mode_assembles_speaker_location_keyword() {
        let entities = [
            ent(EntityLabel::Person, "트럼프"),
            ent(EntityLabel::Location, "베네수엘라"),
        ];
        let pair = build(
            &index_of(&entities),
            &entities,
            &[KeywordCandidate::new("전면폐쇄", 0.9)],
            &QueryOptions::default(),
            &NoLookup,
            &FakeTranslator(vec![
                ("베네수엘라", "Venezuela"),
                ("전면폐쇄", "complete shutdown"),
            ]),
        )
        .await;

        let en = pair.en.unwrap();
        assert_eq!(en, "Donald Trump Venezuela complete shutdown");
        let ko = pair.ko.unwrap();
        assert!(ko.starts_with("트럼프"));
        assert!(ko.contains("베네수엘라"));
        assert!(ko.contains("전면폐쇄"));
    }

    #[tokio::test]
    async fn default_mode_appends_translated_quote() {
        let entities = [ent(EntityLabel::Person, "트럼프")];
        let opts = QueryOptions {
            quote_sentence: Some("국경을 폐쇄하겠다".into()),
            ..QueryOptions::default()
        };
        let pair = build(
            &index_of(&entities),
            &entities,
            &[],
            &opts,
            &NoLookup,
            &FakeTranslator(vec![("국경을 폐쇄하겠다", "We will close the border")]),
        )
        .await;

        let en = pair.en.unwrap();
        assert!(en.starts_with("Donald Trump"));
        assert!(en.ends_with("We will close the border"));
        assert!(pair.ko.unwrap().contains("국경을"));
    }

    #[tokio::test]
    async fn default_mode_deduplicates_tokens() {
        let entities = [
            ent(EntityLabel::Person, "트럼프"),
            ent(EntityLabel::Location, "베네수엘라"),
        ];
        // Keyword translating to a token already present must not repeat.
        let pair = build(
            &index_of(&entities),
            &entities,
            &[KeywordCandidate::new("베네수엘라 위기", 0.9)],
            &QueryOptions::default(),
            &NoLookup,
            &FakeTranslator(vec![
                ("베네수엘라", "Venezuela"),
                ("베네수엘라 위기", "Venezuela"),
            ]),
        )
        .await;

        let en = pair.en.unwrap();
        assert_eq!(en.matches("Venezuela").count(), 1);
    }

    #[tokio::test]
    async fn translation_failure_falls_back_to_korean_token() {
        let entities = [
            ent(EntityLabel::Person, "트럼프"),
            ent(EntityLabel::Location, "평양"),
        ];
        let pair = build(
            &index_of(&entities),
            &entities,
            &[],
            &QueryOptions::default(),
            &NoLookup,
            &FakeTranslator(vec![]),
        )
        .await;

        assert!(pair.en.unwrap().contains("평양"));
    }

    #[tokio::test]
    async fn focused_mode_is_speaker_date_focus() {
        let entities = [
            ent(EntityLabel::Person, "트럼프"),
            ent(EntityLabel::Location, "베네수엘라"),
        ];
        let opts = QueryOptions {
            focused: true,
            article_date: Some("2024-11-29".into()),
            ..QueryOptions::default()
        };
        let pair = build(
            &index_of(&entities),
            &entities,
            &[KeywordCandidate::new("전면폐쇄", 0.9)],
            &opts,
            &NoLookup,
            &FakeTranslator(vec![("베네수엘라", "Venezuela")]),
        )
        .await;

        assert_eq!(
            pair.en.unwrap(),
            "Donald Trump November 29, 2024 Venezuela"
        );
        assert_eq!(pair.ko.unwrap(), "트럼프 2024-11-29 베네수엘라");
    }

    #[tokio::test]
    async fn focused_mode_falls_back_to_keyword_token() {
        let entities = [ent(EntityLabel::Person, "트럼프")];
        let opts = QueryOptions {
            focused: true,
            article_date: Some("2024-11-29".into()),
            ..QueryOptions::default()
        };
        let pair = build(
            &index_of(&entities),
            &entities,
            &[KeywordCandidate::new("국경에서 발표", 0.9)],
            &opts,
            &NoLookup,
            &FakeTranslator(vec![("국경", "border")]),
        )
        .await;

        assert_eq!(pair.en.unwrap(), "Donald Trump November 29, 2024 border");
        assert!(pair.ko.unwrap().ends_with("국경"));
    }

    #[tokio::test]
    async fn focused_mode_without_date_builds_default_query() {
        let entities = [ent(EntityLabel::Person, "트럼프")];
        let opts = QueryOptions {
            focused: true,
            ..QueryOptions::default()
        };
        let pair = build(
            &index_of(&entities),
            &entities,
            &[],
            &opts,
            &NoLookup,
            &FakeTranslator(vec![]),
        )
        .await;

        // Degrades to the default construction rather than failing.
        assert_eq!(pair.en.as_deref(), Some("Donald Trump"));
    }

    #[test]
    fn date_formats_to_month_day_year() {
        assert_eq!(format_date_en("2024-11-29"), "November 29, 2024");
        assert_eq!(format_date_en("2025-03-05"), "March 5, 2025");
        assert_eq!(format_date_en("not-a-date"), "not-a-date");
    }
}
