use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::models::{
    Credentials, FilteredUsageRequest, FilteredUsageResponse, UsageResponse,
    UsageSummaryResponse,
};

pub const BASE_URL: &str = "https://cursor.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SESSION_COOKIE: &str = "WorkosCursorSessionToken";
const ORIGIN: &str = "https://cursor.com";
const REFERER: &str = "https://cursor.com/dashboard";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const USAGE_PATH: &str = "/api/usage";
const USAGE_SUMMARY_PATH: &str = "/api/usage-summary";
const FILTERED_EVENTS_PATH: &str = "/api/dashboard/get-filtered-usage-events";

/// Read-only client for the dashboard endpoints, authenticated by session cookie
pub struct UsageClient {
    credentials: Credentials,
    base_url: Url,
    http_client: Client,
}

impl UsageClient {
    pub fn new(credentials: Credentials, proxy_url: Option<&str>) -> AppResult<Self> {
        Self::with_base_url(credentials, BASE_URL, proxy_url)
    }

    pub fn with_base_url(
        credentials: Credentials,
        base_url: &str,
        proxy_url: Option<&str>,
    ) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid base URL {}: {}", base_url, e)))?;

        Ok(Self {
            credentials,
            base_url,
            http_client: crate::utils::http::create_client(REQUEST_TIMEOUT, proxy_url)?,
        })
    }

    fn build_url(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Config(format!("Invalid endpoint {}: {}", path, e)))
    }

    /// Headers the dashboard expects from a same-origin browser fetch
    fn browser_headers(&self) -> AppResult<HeaderMap> {
        let cookie = format!("{}={}", SESSION_COOKIE, self.credentials.token);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&cookie)
                .map_err(|e| AppError::Config(format!("Invalid session token: {}", e)))?,
        );
        headers.insert(header::ORIGIN, HeaderValue::from_static(ORIGIN));
        headers.insert(header::REFERER, HeaderValue::from_static(REFERER));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en"));
        Ok(headers)
    }

    /// Request counters and billing cycle start
    pub async fn get_usage(&self) -> AppResult<UsageResponse> {
        let url = self.build_url(USAGE_PATH)?;
        let response = self
            .http_client
            .get(url)
            .headers(self.browser_headers()?)
            .query(&[("user", self.credentials.user_id.as_str())])
            .send()
            .await?;

        decode(response).await
    }

    /// On-demand spend for the current billing cycle
    pub async fn get_usage_summary(&self) -> AppResult<UsageSummaryResponse> {
        let url = self.build_url(USAGE_SUMMARY_PATH)?;
        let response = self
            .http_client
            .get(url)
            .headers(self.browser_headers()?)
            .query(&[("user", self.credentials.user_id.as_str())])
            .send()
            .await?;

        decode(response).await
    }

    /// One page of billable events between `start` and `end`, newest first
    pub async fn get_filtered_usage_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: u32,
        page_size: u32,
    ) -> AppResult<FilteredUsageResponse> {
        let url = self.build_url(FILTERED_EVENTS_PATH)?;
        let body = FilteredUsageRequest::new(start, end, page, page_size);
        let response = self
            .http_client
            .post(url)
            .headers(self.browser_headers()?)
            .json(&body)
            .send()
            .await?;

        decode(response).await
    }

    /// Check the credentials by issuing a usage request
    pub async fn validate_token(&self) -> AppResult<()> {
        self.get_usage().await.map(|_| ())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}
