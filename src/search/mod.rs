//! Search orchestration: backend selection, whitelisted-domain fan-out,
//! pagination, URL validation and session-wide deduplication.

pub mod focused;
pub mod general;
pub mod validate;

pub use focused::{FocusedBackend, TranscriptClient};
pub use general::{CseClient, GeneralBackend, GeneralHit};
pub use validate::{HttpPageValidator, PageValidator};

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::query_has_variant_hint;
use crate::text::contains_korean;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("GOOGLE_API_KEY / GOOGLE_CSE_CX not set")]
    CredentialsNotSet,

    #[error("backend rate limited")]
    RateLimited,

    #[error("backend error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// One retrieved web result. `url` is the identity key: no two candidates in
/// a session share one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCandidate {
    pub domain: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Domains the general backend is allowed to draw from, one sub-query each.
pub const BASE_DOMAINS: [&str; 11] = [
    "whitehouse.gov",
    "congress.gov",
    "rollcall.com",
    "millercenter.org",
    "un.org",
    "factba.se",
    "foxnews.com",
    "c-span.org",
    "abcnews.go.com",
    "nbcnews.com",
    "cnn.com",
];

/// API page-size ceiling per request.
const PAGE_SIZE_CEILING: usize = 10;
/// Highest start offset the API accepts.
const START_CEILING: usize = 91;
/// Pause between paginated requests to one domain.
const PAGE_PAUSE: Duration = Duration::from_millis(200);

/// Select and sequence backends for one query.
///
/// Special context (or a name-variant hint in the query itself) tries the
/// focused transcript backend first; an empty or failed result falls back to
/// the whitelisted general backend. A backend passed as `None` was not
/// configured and is skipped with a warning. No error escapes: the worst
/// outcome is an empty candidate list.
pub async fn search(
    focused: Option<&impl FocusedBackend>,
    general: Option<&impl GeneralBackend>,
    validator: &impl PageValidator,
    query: &str,
    is_special_context: bool,
    prefer_focused: bool,
    max_results: usize,
) -> Vec<SearchCandidate> {
    let focused_first =
        (is_special_context && prefer_focused) || query_has_variant_hint(query);

    if focused_first {
        info!("special context detected, trying transcript backend first");
        let links = match focused {
            Some(backend) => match backend.search(query, max_results).await {
                Ok(links) => links,
                Err(e) => {
                    warn!(error = %e, "transcript search failed, falling back to general backend");
                    Vec::new()
                }
            },
            None => {
                warn!("transcript backend not configured");
                Vec::new()
            }
        };

        if !links.is_empty() {
            return links
                .into_iter()
                .filter(|url| !url.is_empty())
                .map(|url| SearchCandidate {
                    domain: domain_of(&url),
                    title: String::new(),
                    url,
                    snippet: String::new(),
                })
                .collect();
        }
        info!("no transcript results, falling back to whitelisted general search");
    }

    match general {
        Some(backend) => {
            let top_per_domain = (max_results / 2).max(1);
            collect_general(backend, validator, query, top_per_domain, &BASE_DOMAINS).await
        }
        None => {
            warn!("general backend not configured, skipping web search");
            Vec::new()
        }
    }
}

/// One sub-query per whitelisted domain, paginated in bounded batches. Each
/// returned URL must pass the page validator before it becomes a candidate;
/// URLs are repeat-proofed across the whole session. A failing domain yields
/// nothing and the remaining domains still run.
async fn collect_general(
    backend: &impl GeneralBackend,
    validator: &impl PageValidator,
    query: &str,
    top_per_domain: usize,
    domains: &[&str],
) -> Vec<SearchCandidate> {
    let korean = contains_korean(query);
    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();

    for domain in domains {
        let sub_query = format!("{query} site:{domain}");
        let mut remaining = top_per_domain;
        let mut start = 1;

        while remaining > 0 {
            let per_req = remaining.min(PAGE_SIZE_CEILING);
            let hits = match backend.search_page(&sub_query, per_req, start, korean).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(domain = %domain, error = %e, "domain search failed, continuing");
                    break;
                }
            };
            if hits.is_empty() {
                break;
            }

            for hit in hits {
                if hit.url.is_empty() || seen.contains(&hit.url) {
                    continue;
                }
                if !validator.is_fetchable(&hit.url).await {
                    debug!(url = %hit.url, "candidate failed page validation");
                    continue;
                }
                seen.insert(hit.url.clone());
                candidates.push(SearchCandidate {
                    domain: (*domain).to_string(),
                    title: hit.title,
                    url: hit.url,
                    snippet: hit.snippet,
                });
                remaining -= 1;
                if remaining == 0 {
                    break;
                }
            }

            start += per_req;
            if start > START_CEILING {
                break;
            }
            tokio::time::sleep(PAGE_PAUSE).await;
        }
    }

    debug!(count = candidates.len(), "general search collected candidates");
    candidates
}

fn domain_of(raw: &str) -> String {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FailingFocused;

    impl FocusedBackend for FailingFocused {
        async fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<String>, SearchError> {
            Err(SearchError::Api {
                code: 500,
                message: "boom".into(),
            })
        }
    }

    struct FixedFocused(Vec<String>);

    impl FocusedBackend for FixedFocused {
        async fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<String>, SearchError> {
            Ok(self.0.clone())
        }
    }

    /// Serves one fixed page of hits for every sub-query, then empty pages.
    struct FixedGeneral {
        hits: Vec<GeneralHit>,
        calls: Mutex<Vec<String>>,
    }

    impl FixedGeneral {
        fn new(hits: Vec<GeneralHit>) -> Self {
            Self {
                hits,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl GeneralBackend for FixedGeneral {
        async fn search_page(
            &self,
            query: &str,
            _num: usize,
            start: usize,
            _korean: bool,
        ) -> Result<Vec<GeneralHit>, SearchError> {
            self.calls.lock().unwrap().push(query.to_string());
            if start > 1 {
                return Ok(Vec::new());
            }
            Ok(self.hits.clone())
        }
    }

    struct AcceptAll;

    impl PageValidator for AcceptAll {
        async fn is_fetchable(&self, _url: &str) -> bool {
            true
        }
    }

    struct RejectAll;

    impl PageValidator for RejectAll {
        async fn is_fetchable(&self, _url: &str) -> bool {
            false
        }
    }

    fn hit(url: &str) -> GeneralHit {
        GeneralHit {
            url: url.into(),
            title: "t".into(),
            snippet: "s".into(),
        }
    }

    #[tokio::test]
    async fn failing_focused_falls_back_to_general() {
        let general = FixedGeneral::new(vec![hit("https://example.com/a")]);
        let candidates = search(
            Some(&FailingFocused),
            Some(&general),
            &AcceptAll,
            "Donald Trump November 29, 2024",
            true,
            true,
            4,
        )
        .await;

        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|c| c.url.contains("example.com")));
    }

    #[tokio::test]
    async fn focused_results_shortcut_general() {
        let general = FixedGeneral::new(vec![hit("https://example.com/a")]);
        let candidates = search(
            Some(&FixedFocused(vec![
                "https://rollcall.com/factbase/trump/transcript/x".into(),
            ])),
            Some(&general),
            &AcceptAll,
            "Donald Trump remarks",
            true,
            true,
            4,
        )
        .await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].domain, "rollcall.com");
        assert!(general.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ordinary_context_goes_straight_to_general() {
        let general = FixedGeneral::new(vec![hit("https://example.com/a")]);
        let candidates = search(
            Some(&FixedFocused(vec!["https://rollcall.com/transcript/x".into()])),
            Some(&general),
            &AcceptAll,
            "Lee Jae-myung summit",
            false,
            true,
            4,
        )
        .await;

        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|c| c.url.contains("example.com")));
        assert!(!general.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unconfigured_backends_yield_empty() {
        let candidates = search(
            None::<&FixedFocused>,
            None::<&FixedGeneral>,
            &AcceptAll,
            "anything",
            false,
            false,
            4,
        )
        .await;
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn deduplicates_urls_across_pages() {
        let general = FixedGeneral::new(vec![
            hit("https://example.com/same"),
            hit("https://example.com/same"),
            hit("https://example.com/other"),
        ]);
        let candidates = search(
            None::<&FixedFocused>,
            Some(&general),
            &AcceptAll,
            "query",
            false,
            false,
            10,
        )
        .await;

        let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();
        let unique: HashSet<&str> = urls.iter().copied().collect();
        assert_eq!(urls.len(), unique.len());
    }

    #[tokio::test]
    async fn invalid_pages_are_filtered_out() {
        let general = FixedGeneral::new(vec![hit("https://example.com/dead")]);
        let candidates = search(
            None::<&FixedFocused>,
            Some(&general),
            &RejectAll,
            "query",
            false,
            false,
            4,
        )
        .await;
        assert!(candidates.is_empty());
    }

    #[test]
    fn domain_extraction() {
        assert_eq!(domain_of("https://rollcall.com/x/y"), "rollcall.com");
        assert_eq!(domain_of("not a url"), "");
    }
}
