//! reqwest-backed [`WebClient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use super::{FetchError, RequestCookie, WebClient};

/// HTTP client with a bounded per-request timeout.
pub struct ReqwestWebClient {
    client: Client,
}

impl ReqwestWebClient {
    /// Create a client with the given user agent and timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    fn with_cookies(request: RequestBuilder, cookies: &[RequestCookie]) -> RequestBuilder {
        if cookies.is_empty() {
            request
        } else {
            request.header(COOKIE, RequestCookie::header_value(cookies))
        }
    }
}

#[async_trait]
impl WebClient for ReqwestWebClient {
    async fn get_html(&self, url: &str, cookies: &[RequestCookie]) -> Result<String, FetchError> {
        debug!("GET {}", url);

        let response = Self::with_cookies(self.client.get(url), cookies)
            .send()
            .await?;

        // Error pages are returned as-is; scraping them finds nothing.
        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Non-success status for {}", url);
        }

        Ok(response.text().await?)
    }

    async fn final_url(&self, url: &str, cookies: &[RequestCookie]) -> Result<String, FetchError> {
        debug!("HEAD {}", url);

        // reqwest follows redirects by default; the response URL is the last hop.
        let response = Self::with_cookies(self.client.head(url), cookies)
            .send()
            .await?;

        Ok(response.url().to_string())
    }
}
