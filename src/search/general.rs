//! Whitelisted-domain general search client (Google Custom Search API).

use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::SearchError;

const API_BASE: &str = "https://www.googleapis.com/customsearch/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;

/// One page of results from the general backend.
#[derive(Debug, Clone)]
pub struct GeneralHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Abstraction over the whitelisted general web search; implemented by
/// `CseClient` for production, mocked in tests.
pub trait GeneralBackend {
    async fn search_page(
        &self,
        query: &str,
        num: usize,
        start: usize,
        korean: bool,
    ) -> Result<Vec<GeneralHit>, SearchError>;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Clone)]
pub struct CseClient {
    http: Client,
    api_key: ApiKey,
    cx: String,
    base_url: String,
}

impl CseClient {
    /// Read credentials from `GOOGLE_API_KEY` / `GOOGLE_CSE_CX`. A missing
    /// credential disables this backend only, never the whole pipeline.
    pub fn from_env(http: Client) -> Result<Self, SearchError> {
        let api_key = env::var("GOOGLE_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(SearchError::CredentialsNotSet)?;
        let cx = env::var("GOOGLE_CSE_CX")
            .ok()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(SearchError::CredentialsNotSet)?;
        Ok(Self {
            http,
            api_key: ApiKey(api_key),
            cx,
            base_url: API_BASE.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            cx: "test-cx".to_string(),
            base_url: base_url.to_string(),
        }
    }

    async fn request_page(
        &self,
        query: &str,
        num: usize,
        start: usize,
        korean: bool,
    ) -> Result<Vec<GeneralHit>, SearchError> {
        let num = num.clamp(1, 10).to_string();
        let start = start.clamp(1, 91).to_string();
        let (hl, gl) = if korean { ("ko", "kr") } else { ("en", "us") };

        let mut params: Vec<(&str, &str)> = vec![
            ("key", &self.api_key.0),
            ("cx", &self.cx),
            ("q", query),
            ("num", &num),
            ("start", &start),
            ("hl", hl),
            ("gl", gl),
        ];
        if korean {
            params.push(("lr", "lang_ko"));
        }

        let response = self
            .http
            .get(&self.base_url)
            .query(&params)
            .header("User-Agent", crate::USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("general search rate limited");
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // Truncate on char boundaries; the body may be multibyte text.
            let snippet: String = text.chars().take(200).collect();
            return Err(SearchError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        let body: CseResponse = response.json().await?;
        let hits: Vec<GeneralHit> = body
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                let url = item.link.or(item.formatted_url)?;
                Some(GeneralHit {
                    url,
                    title: item.title.unwrap_or_default(),
                    snippet: item.snippet.unwrap_or_default(),
                })
            })
            .collect();
        debug!(count = hits.len(), "general search page fetched");
        Ok(hits)
    }
}

impl GeneralBackend for CseClient {
    async fn search_page(
        &self,
        query: &str,
        num: usize,
        start: usize,
        korean: bool,
    ) -> Result<Vec<GeneralHit>, SearchError> {
        let mut last_err = None;
        for attempt in 0..MAX_RETRIES {
            match self.request_page(query, num, start, korean).await {
                Ok(hits) => return Ok(hits),
                Err(e) if is_retriable(&e) => {
                    last_err = Some(e);
                    if attempt + 1 < MAX_RETRIES {
                        let delay_ms = jittered_backoff(attempt);
                        debug!(
                            attempt = attempt + 1,
                            delay_ms, "retrying after transient error"
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or(SearchError::RateLimited))
    }
}

fn is_retriable(e: &SearchError) -> bool {
    matches!(
        e,
        SearchError::RateLimited
            | SearchError::Network(_)
            | SearchError::Api {
                code: 500..=599,
                ..
            }
    )
}

/// Equal jitter backoff: base/2 + rand(0, base/2).
fn jittered_backoff(attempt: u32) -> u64 {
    let base = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
    let half = base / 2;
    half + fastrand::u64(..half.max(1))
}

#[derive(Deserialize)]
struct CseResponse {
    items: Option<Vec<CseItem>>,
}

#[derive(Deserialize)]
struct CseItem {
    link: Option<String>,
    #[serde(rename = "formattedUrl")]
    formatted_url: Option<String>,
    title: Option<String>,
    snippet: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_classification() {
        assert!(is_retriable(&SearchError::RateLimited));
        assert!(is_retriable(&SearchError::Api {
            code: 503,
            message: "unavailable".into()
        }));
        assert!(!is_retriable(&SearchError::Api {
            code: 403,
            message: "quota".into()
        }));
        assert!(!is_retriable(&SearchError::CredentialsNotSet));
    }

    #[test]
    fn backoff_grows_with_attempts_and_stays_bounded() {
        for attempt in 0..3 {
            let base = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
            let delay = jittered_backoff(attempt);
            assert!(delay >= base / 2);
            assert!(delay < base);
        }
    }
}
