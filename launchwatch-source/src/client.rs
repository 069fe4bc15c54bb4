//! HTTP event source backed by the rocketlaunch.live JSON feed.

use async_trait::async_trait;
use launchwatch_core::{EventSource, LaunchRecord, SourceError};
use tracing::debug;

use crate::retry::{RetryPolicy, with_retry};
use crate::wire::decode_launches;

pub const DEFAULT_BASE_URL: &str = "https://www.rocketlaunch.live";

#[derive(Debug, Clone)]
pub struct RocketLaunchClient {
    base_url: String,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl Default for RocketLaunchClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl RocketLaunchClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn upcoming_url(&self, count: usize) -> String {
        format!("{}/json/launch/next/{count}", self.base_url)
    }

    /// Upcoming launches narrowed by a free-text filter (rocket, provider or pad).
    pub fn filtered_url(&self, count: usize, filter: &str) -> String {
        format!("{}/{}", self.upcoming_url(count), filter.trim())
    }

    pub fn slug_url(&self, slug: &str) -> String {
        format!("{}/json/launch/{slug}", self.base_url)
    }

    /// The next `count` launches, optionally narrowed by `filter`. A blank filter is ignored.
    pub async fn fetch_matching(
        &self,
        count: usize,
        filter: Option<&str>,
    ) -> Result<Vec<LaunchRecord>, SourceError> {
        match filter.map(str::trim).filter(|f| !f.is_empty()) {
            Some(filter) => self.get_launches(&self.filtered_url(count, filter)).await,
            None => self.fetch_upcoming(count).await,
        }
    }

    async fn get_launches(&self, url: &str) -> Result<Vec<LaunchRecord>, SourceError> {
        with_retry(&self.retry, url, || self.get_once(url)).await
    }

    async fn get_once(&self, url: &str) -> Result<Vec<LaunchRecord>, SourceError> {
        debug!(url, "fetching launches");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;
        decode_launches(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl EventSource for RocketLaunchClient {
    async fn fetch_upcoming(&self, count: usize) -> Result<Vec<LaunchRecord>, SourceError> {
        self.get_launches(&self.upcoming_url(count)).await
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<LaunchRecord>, SourceError> {
        let launches = self.get_launches(&self.slug_url(slug)).await?;
        Ok(launches.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls() {
        let client = RocketLaunchClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.upcoming_url(5), "http://localhost:8080/json/launch/next/5");
        assert_eq!(client.slug_url("falcon-heavy"), "http://localhost:8080/json/launch/falcon-heavy");
        assert_eq!(RocketLaunchClient::default().base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn filtered_urls() {
        let client = RocketLaunchClient::new("http://localhost:8080");
        assert_eq!(
            client.filtered_url(3, "falcon"),
            "http://localhost:8080/json/launch/next/3/falcon"
        );
        assert_eq!(
            client.filtered_url(5, " spacex "),
            "http://localhost:8080/json/launch/next/5/spacex"
        );
    }

    #[tokio::test]
    async fn filtered_fetch_goes_over_http() {
        let client = RocketLaunchClient::new("http://127.0.0.1:9").with_retry_policy(RetryPolicy::none());
        let err = client.fetch_matching(5, Some("falcon")).await.unwrap_err();
        assert!(matches!(err, SourceError::Http(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_an_http_error() {
        let client = RocketLaunchClient::new("http://127.0.0.1:9").with_retry_policy(RetryPolicy::none());
        let err = client.fetch_upcoming(5).await.unwrap_err();
        assert!(matches!(err, SourceError::Http(_)));
    }
}
