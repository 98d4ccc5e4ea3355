//! Focused transcript-archive backend: a public JSON search endpoint over a
//! speech/remarks archive, queried with the date-anchored query and sorted
//! newest first.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::SearchError;

const API_BASE: &str = "https://rollcall.com/wp-json/factbase/v1/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Abstraction over the narrow transcript-archive search; returns bare URLs.
pub trait FocusedBackend {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>, SearchError>;
}

#[derive(Clone)]
pub struct TranscriptClient {
    http: Client,
    base_url: String,
}

impl TranscriptClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }
}

impl FocusedBackend for TranscriptClient {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        // The endpoint expects spaces as '+' inside q; everything else is
        // ordinary query-string encoding.
        let q = query.replace(' ', "+");
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", q.as_str()),
                ("media", ""),
                ("type", ""),
                ("sort", "date"),
                ("location", "all"),
                ("place", "all"),
                ("page", "1"),
                ("format", "json"),
            ])
            .header("User-Agent", crate::USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Api {
                code: status.as_u16(),
                message: format!("transcript archive returned HTTP {status}"),
            });
        }

        let data: Value = response.json().await?;
        let links = transcript_links(&data, top_k);
        debug!(count = links.len(), "transcript search complete");
        Ok(links)
    }
}

/// The payload shape varies: either a bare list or an object carrying
/// `results` / `items`. Items are sorted newest first (date-less items sink
/// to the bottom) and only transcript page URLs survive.
fn transcript_links(data: &Value, top_k: usize) -> Vec<String> {
    let items: Vec<&Value> = match data {
        Value::Array(list) => list.iter().filter(|v| v.is_object()).collect(),
        Value::Object(map) => map
            .get("results")
            .or_else(|| map.get("items"))
            .and_then(Value::as_array)
            .map(|list| list.iter().filter(|v| v.is_object()).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let mut dated: Vec<(Option<NaiveDateTime>, &Value)> =
        items.into_iter().map(|v| (item_date(v), v)).collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    let mut links = Vec::new();
    for (_, item) in dated {
        let Some(url) = item_url(item) else { continue };
        if !url.contains("transcript") {
            continue;
        }
        links.push(url);
        if links.len() >= top_k.max(1) {
            break;
        }
    }
    links
}

fn item_date(item: &Value) -> Option<NaiveDateTime> {
    let raw = ["date", "post_date", "post_date_gmt"]
        .iter()
        .find_map(|k| item.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())?;

    let normalized: String = raw.replace('T', " ").chars().take(19).collect();
    if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn item_url(item: &Value) -> Option<String> {
    ["permalink", "link", "url"]
        .iter()
        .find_map(|k| item.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: &str, date: &str) -> Value {
        serde_json::json!({"permalink": url, "date": date})
    }

    #[test]
    fn sorts_newest_first_and_keeps_only_transcripts() {
        let data = Value::Array(vec![
            item("https://a.com/transcript/old", "2024-01-01 10:00:00"),
            item("https://a.com/video/skip", "2024-06-01 10:00:00"),
            item("https://a.com/transcript/new", "2024-03-01T09:30:00"),
        ]);
        let links = transcript_links(&data, 5);
        assert_eq!(
            links,
            vec![
                "https://a.com/transcript/new",
                "https://a.com/transcript/old"
            ]
        );
    }

    #[test]
    fn handles_object_payload_with_results_key() {
        let data = serde_json::json!({
            "results": [item("https://a.com/transcript/x", "2024-01-01")]
        });
        assert_eq!(transcript_links(&data, 5), vec!["https://a.com/transcript/x"]);
    }

    #[test]
    fn handles_object_payload_with_items_key() {
        let data = serde_json::json!({
            "items": [item("https://a.com/transcript/y", "2024-01-02")]
        });
        assert_eq!(transcript_links(&data, 5), vec!["https://a.com/transcript/y"]);
    }

    #[test]
    fn dateless_items_sort_last() {
        let data = Value::Array(vec![
            serde_json::json!({"link": "https://a.com/transcript/undated"}),
            item("https://a.com/transcript/dated", "2023-01-01"),
        ]);
        let links = transcript_links(&data, 5);
        assert_eq!(links[0], "https://a.com/transcript/dated");
        assert_eq!(links[1], "https://a.com/transcript/undated");
    }

    #[test]
    fn caps_at_top_k() {
        let data = Value::Array(vec![
            item("https://a.com/transcript/1", "2024-01-03"),
            item("https://a.com/transcript/2", "2024-01-02"),
            item("https://a.com/transcript/3", "2024-01-01"),
        ]);
        assert_eq!(transcript_links(&data, 2).len(), 2);
    }

    #[test]
    fn unexpected_payload_yields_empty() {
        assert!(transcript_links(&Value::String("oops".into()), 5).is_empty());
        assert!(transcript_links(&serde_json::json!({"weird": 1}), 5).is_empty());
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn search_returns_transcript_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "Donald+Trump+November+29,+2024"))
            .and(query_param("sort", "date"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"permalink": "https://rollcall.com/factbase/trump/transcript/a", "date": "2024-11-29 12:00:00"}
            ])))
            .mount(&server)
            .await;

        let client = TranscriptClient::with_base_url(Client::new(), &server.uri());
        let links = client
            .search("Donald Trump November 29, 2024", 5)
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
        assert!(links[0].contains("/transcript/"));
    }

    #[tokio::test]
    async fn http_error_surfaces_as_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = TranscriptClient::with_base_url(Client::new(), &server.uri());
        let result = client.search("query", 5).await;
        assert!(matches!(result, Err(SearchError::Api { code: 503, .. })));
    }

    #[tokio::test]
    async fn empty_query_short_circuits() {
        let client = TranscriptClient::with_base_url(Client::new(), "http://127.0.0.1:1");
        let links = client.search("   ", 5).await.unwrap();
        assert!(links.is_empty());
    }
}
