//! HTTP transport for detail pages, landing pages and redirect checks.
//!
//! Everything the pipeline scrapes goes through [`WebClient`], which keeps
//! the scraping code independent of the HTTP stack and lets tests serve
//! fixed HTML fixtures.

mod reqwest_client;

pub use reqwest_client::ReqwestWebClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from fetching a remote page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connection, timeout, TLS, ...).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Http(e.to_string())
    }
}

/// A cookie sent with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCookie {
    pub name: String,
    pub value: String,
}

impl RequestCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Render a `Cookie` header value for a set of cookies.
    pub fn header_value(cookies: &[RequestCookie]) -> String {
        cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Trait for fetching remote HTML and probing redirect targets.
#[async_trait]
pub trait WebClient: Send + Sync {
    /// GET `url` and return the response body as text, whatever the HTTP
    /// status. Only transport failures (connection, timeout, TLS) are errors.
    async fn get_html(&self, url: &str, cookies: &[RequestCookie]) -> Result<String, FetchError>;

    /// Issue a HEAD request following redirects and return the final URL.
    async fn final_url(&self, url: &str, cookies: &[RequestCookie]) -> Result<String, FetchError>;
}
