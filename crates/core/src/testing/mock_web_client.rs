//! Mock HTTP transport for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::Gate;
use crate::web::{FetchError, RequestCookie, WebClient};

/// A request seen by the mock, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// "GET" or "HEAD".
    pub method: String,
    pub url: String,
    /// Rendered `Cookie` header value.
    pub cookies: String,
}

/// Mock implementation of the WebClient trait.
///
/// - GET of a registered URL returns its HTML. Unknown URLs return an empty
///   body, like an error page without content.
/// - GET of a URL registered with [`MockWebClient::fail`] returns a transport
///   error.
/// - HEAD of a URL with a registered redirect returns the target; otherwise
///   the URL itself (no redirect).
#[derive(Debug, Default)]
pub struct MockWebClient {
    pages: Arc<RwLock<HashMap<String, String>>>,
    failures: Arc<RwLock<HashMap<String, String>>>,
    redirects: Arc<RwLock<HashMap<String, String>>>,
    holds: Arc<RwLock<HashMap<String, Gate>>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl MockWebClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for GET `url`.
    pub async fn add_page(&self, url: &str, html: &str) {
        self.pages
            .write()
            .await
            .insert(url.to_string(), html.to_string());
    }

    /// Fail GET `url` as if the connection broke.
    pub async fn fail(&self, url: &str, message: &str) {
        self.failures
            .write()
            .await
            .insert(url.to_string(), message.to_string());
    }

    /// Hold GET `url` after recording it, until the returned gate releases it.
    pub async fn hold(&self, url: &str) -> Gate {
        let gate = Gate::closed();
        self.holds
            .write()
            .await
            .insert(url.to_string(), gate.clone());
        gate
    }

    /// Make HEAD `url` end at `target`.
    pub async fn add_redirect(&self, url: &str, target: &str) {
        self.redirects
            .write()
            .await
            .insert(url.to_string(), target.to_string());
    }

    /// All requests received so far.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    async fn record(&self, method: &str, url: &str, cookies: &[RequestCookie]) {
        self.requests.write().await.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            cookies: RequestCookie::header_value(cookies),
        });
    }
}

#[async_trait]
impl WebClient for MockWebClient {
    async fn get_html(&self, url: &str, cookies: &[RequestCookie]) -> Result<String, FetchError> {
        self.record("GET", url, cookies).await;

        let hold = self.holds.read().await.get(url).cloned();
        if let Some(gate) = hold {
            gate.pass().await;
        }

        if let Some(message) = self.failures.read().await.get(url) {
            return Err(FetchError::Http(message.clone()));
        }

        Ok(self.pages.read().await.get(url).cloned().unwrap_or_default())
    }

    async fn final_url(&self, url: &str, cookies: &[RequestCookie]) -> Result<String, FetchError> {
        self.record("HEAD", url, cookies).await;

        Ok(self
            .redirects
            .read()
            .await
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string()))
    }
}
