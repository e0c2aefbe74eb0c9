//! HTTP implementation of [`ReportSource`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use super::{ApiError, ReportSource};
use crate::models::Report;

/// Path of the verification-report endpoints, relative to the backend root.
const REPORT_ENDPOINTS: &str = "mmapi/media/verificationreport/";

/// Client for the analysis backend's report API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, name: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(REPORT_ENDPOINTS)?.join(name)?)
    }

    /// Fetch the report for `hash`. `None` when the backend has no report.
    pub async fn get_report(&self, hash: &str) -> Result<Option<Report>, ApiError> {
        let url = self.endpoint("getreport")?;
        debug!("Fetching report {} from {}", hash, url);

        let response = self.client.get(url).query(&[("hash", hash)]).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(trimmed)?))
    }

    /// Ask the backend to download an image by URL. Returns the image hash.
    pub async fn add_url(&self, image_url: &str) -> Result<String, ApiError> {
        self.get_text("addurl", &[("url", image_url)]).await
    }

    /// Start the analyses for a previously added image. Returns the backend's message.
    pub async fn generate_report(&self, hash: &str) -> Result<String, ApiError> {
        self.get_text("generatereport", &[("hash", hash)]).await
    }

    async fn get_text(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String, ApiError> {
        let url = self.endpoint(endpoint)?;
        debug!("GET {}", url);

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }
        Ok(unquote(&body))
    }
}

#[async_trait]
impl ReportSource for ApiClient {
    async fn fetch_report(&self, hash: &str) -> Result<Option<Report>, ApiError> {
        self.get_report(hash).await
    }
}

/// Plain-text endpoints sometimes answer with a JSON string literal.
fn unquote(body: &str) -> String {
    let trimmed = body.trim();
    serde_json::from_str::<String>(trimmed).unwrap_or_else(|_| trimmed.to_string())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let client =
            ApiClient::new("http://backend:8080/reveal", Duration::from_secs(5), "test").unwrap();
        assert_eq!(
            client.endpoint("getreport").unwrap().as_str(),
            "http://backend:8080/reveal/mmapi/media/verificationreport/getreport"
        );

        let client = ApiClient::new("http://localhost:8080", Duration::from_secs(5), "test").unwrap();
        assert_eq!(
            client.endpoint("addurl").unwrap().as_str(),
            "http://localhost:8080/mmapi/media/verificationreport/addurl"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(5), "test"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"abc123\"\n"), "abc123");
        assert_eq!(unquote("  plain text "), "plain text");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
