//! Candidate page validation: a URL only becomes a search candidate if it
//! actually serves a non-trivial HTML page.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);
/// Pages with less body than this are parked/error shells, not articles.
const HTML_MIN_LENGTH: usize = 500;

/// Reachability check for a candidate URL. Failures of any kind mean "not
/// fetchable", never an error.
pub trait PageValidator {
    async fn is_fetchable(&self, url: &str) -> bool;
}

#[derive(Clone)]
pub struct HttpPageValidator {
    http: Client,
}

impl HttpPageValidator {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl PageValidator for HttpPageValidator {
    async fn is_fetchable(&self, url: &str) -> bool {
        let response = match self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(url = %url, error = %e, "validation request failed");
                return false;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            return false;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.contains("text/html") && !content_type.contains("application/xhtml+xml") {
            return false;
        }

        match response.text().await {
            Ok(body) => body.trim().len() > HTML_MIN_LENGTH,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn long_html() -> String {
        format!("<html><body>{}</body></html>", "quote text ".repeat(100))
    }

    #[tokio::test]
    async fn accepts_long_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(
                // set_body_raw keeps the mime; set_body_string would reset it
                // to text/plain.
                ResponseTemplate::new(200)
                    .set_body_raw(long_html(), "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let validator = HttpPageValidator::new(Client::new());
        assert!(validator.is_fetchable(&format!("{}/article", server.uri())).await);
    }

    #[tokio::test]
    async fn rejects_non_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let validator = HttpPageValidator::new(Client::new());
        assert!(!validator.is_fetchable(&server.uri()).await);
    }

    #[tokio::test]
    async fn rejects_non_html_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(long_html(), "application/pdf"))
            .mount(&server)
            .await;

        let validator = HttpPageValidator::new(Client::new());
        assert!(!validator.is_fetchable(&server.uri()).await);
    }

    #[tokio::test]
    async fn rejects_short_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .mount(&server)
            .await;

        let validator = HttpPageValidator::new(Client::new());
        assert!(!validator.is_fetchable(&server.uri()).await);
    }

    #[tokio::test]
    async fn unreachable_host_is_not_fetchable() {
        let validator = HttpPageValidator::new(Client::new());
        assert!(!validator.is_fetchable("http://127.0.0.1:1/nope").await);
    }
}
