//! Resolution of edition links into direct asset (PDF) URLs.
//!
//! Each edition link on a detail page points at an internal redirector. The
//! landing page behind it is fetched with the disclaimer cookie and handed to
//! an ordered list of [`AssetStrategy`] implementations; the first strategy
//! that produces URLs wins. Candidates no strategy accepts are dropped, which
//! filters interstitials, ads and wiki pages the redirector may land on.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::metrics::{ASSETS_RESOLVED, LANDING_CANDIDATES_DISCARDED};
use crate::web::{FetchError, RequestCookie, WebClient};

/// Id of the element carrying the direct download link on a landing page.
pub const DIRECT_DOWNLOAD_MARKER_ID: &str = "sm_dl_wait";

/// Attribute holding the asset URL on the marker element.
pub const DIRECT_DOWNLOAD_ATTR: &str = "data-id";

/// A fetched landing page.
#[derive(Debug, Clone)]
pub struct LandingCandidate {
    /// Absolute URL of the edition link.
    pub url: String,
    /// Landing page body.
    pub html: String,
}

/// One step of the resolution chain.
#[async_trait]
pub trait AssetStrategy: Send + Sync {
    /// Strategy name (used in logs and metrics).
    fn name(&self) -> &'static str;

    /// Return `Some(urls)` to accept the candidate, `None` to pass it on.
    async fn resolve(
        &self,
        candidate: &LandingCandidate,
        client: &dyn WebClient,
        cookies: &[RequestCookie],
    ) -> Option<Vec<String>>;
}

/// Accepts a landing page exposing the direct-download marker element.
#[derive(Debug, Clone)]
pub struct DirectDownloadMarker {
    marker_id: String,
    attribute: String,
}

impl Default for DirectDownloadMarker {
    fn default() -> Self {
        Self {
            marker_id: DIRECT_DOWNLOAD_MARKER_ID.to_string(),
            attribute: DIRECT_DOWNLOAD_ATTR.to_string(),
        }
    }
}

impl DirectDownloadMarker {
    /// Attribute values of every marker element on the page.
    pub fn marker_urls(&self, html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        let Ok(selector) = Selector::parse(&format!("span[id=\"{}\"]", self.marker_id)) else {
            return Vec::new();
        };

        doc.select(&selector)
            .filter_map(|el| el.value().attr(&self.attribute))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl AssetStrategy for DirectDownloadMarker {
    fn name(&self) -> &'static str {
        "direct_marker"
    }

    async fn resolve(
        &self,
        candidate: &LandingCandidate,
        _client: &dyn WebClient,
        _cookies: &[RequestCookie],
    ) -> Option<Vec<String>> {
        let urls = self.marker_urls(&candidate.html);
        (!urls.is_empty()).then_some(urls)
    }
}

/// Follows the edition link's redirects and accepts a `.pdf` target.
#[derive(Debug, Clone, Default)]
pub struct PdfRedirect;

#[async_trait]
impl AssetStrategy for PdfRedirect {
    fn name(&self) -> &'static str {
        "pdf_redirect"
    }

    async fn resolve(
        &self,
        candidate: &LandingCandidate,
        client: &dyn WebClient,
        cookies: &[RequestCookie],
    ) -> Option<Vec<String>> {
        match client.final_url(&candidate.url, cookies).await {
            Ok(target) if is_pdf_url(&target) => Some(vec![target]),
            Ok(target) => {
                debug!("Redirect target is not a PDF: {}", target);
                None
            }
            Err(e) => {
                warn!("Redirect check failed for {}: {}", candidate.url, e);
                None
            }
        }
    }
}

/// Whether the URL path ends in `.pdf` (case-sensitive).
pub fn is_pdf_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().ends_with(".pdf"),
        Err(_) => url.split(['?', '#']).next().unwrap_or("").ends_with(".pdf"),
    }
}

/// Settings for [`AssetResolver`].
#[derive(Debug, Clone)]
pub struct AssetResolverSettings {
    /// Base for relative edition links.
    pub wiki_base_url: String,
    /// Substring identifying redirector links.
    pub landing_link_pattern: String,
    /// Cookies sent to landing pages and redirect checks.
    pub cookies: Vec<RequestCookie>,
}

/// Resolves a detail page into direct asset URLs.
pub struct AssetResolver {
    client: Arc<dyn WebClient>,
    base_url: Url,
    landing_link_pattern: String,
    cookies: Vec<RequestCookie>,
    strategies: Vec<Box<dyn AssetStrategy>>,
}

impl AssetResolver {
    /// Create a resolver with the default chain: direct marker, then PDF redirect.
    pub fn new(
        client: Arc<dyn WebClient>,
        settings: AssetResolverSettings,
    ) -> Result<Self, FetchError> {
        let base_url = Url::parse(&settings.wiki_base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", settings.wiki_base_url, e)))?;

        Ok(Self {
            client,
            base_url,
            landing_link_pattern: settings.landing_link_pattern,
            cookies: settings.cookies,
            strategies: vec![Box::new(DirectDownloadMarker::default()), Box::new(PdfRedirect)],
        })
    }

    /// Replace the strategy chain.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn AssetStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Absolute redirector links on a detail page, deduplicated, in document order.
    pub fn landing_links(&self, detail_html: &str) -> Vec<String> {
        let doc = Html::parse_document(detail_html);
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        doc.select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| href.contains(&self.landing_link_pattern))
            .filter_map(|href| resolve_href(&self.base_url, href))
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }

    /// Resolve every edition link on the page. Never fails; unresolvable
    /// candidates are skipped.
    ///
    /// A landing page reaches the strategy chain whatever its HTTP status, so
    /// an error page can still resolve through its redirect. Only a transport
    /// failure drops the candidate before the chain runs.
    pub async fn resolve_assets(&self, detail_html: &str) -> Vec<String> {
        let mut assets = Vec::new();

        for url in self.landing_links(detail_html) {
            let html = match self.client.get_html(&url, &self.cookies).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Failed to fetch landing page {}: {}", url, e);
                    LANDING_CANDIDATES_DISCARDED.inc();
                    continue;
                }
            };

            let candidate = LandingCandidate { url, html };
            let mut accepted = false;

            for strategy in &self.strategies {
                if let Some(found) = strategy
                    .resolve(&candidate, self.client.as_ref(), &self.cookies)
                    .await
                {
                    debug!(
                        "{} resolved {} asset(s) from {}",
                        strategy.name(),
                        found.len(),
                        candidate.url
                    );
                    ASSETS_RESOLVED
                        .with_label_values(&[strategy.name()])
                        .inc_by(found.len() as u64);
                    assets.extend(found);
                    accepted = true;
                    break;
                }
            }

            if !accepted {
                debug!("Discarding landing candidate {}", candidate.url);
                LANDING_CANDIDATES_DISCARDED.inc();
            }
        }

        assets
    }
}

/// Make an href absolute against the wiki base.
///
/// Wiki links such as `Special:ImagefromIndex/123` look like a URL scheme to
/// a parser, so only `http(s)` URLs are taken as absolute.
fn resolve_href(base: &Url, href: &str) -> Option<String> {
    if let Ok(url) = Url::parse(href) {
        if matches!(url.scheme(), "http" | "https") {
            return Some(url.to_string());
        }
    }

    let joined = if href.starts_with(['/', '.', '?', '#']) {
        base.join(href)
    } else {
        base.join(&format!("./{}", href))
    };

    joined.ok().map(|u| u.to_string())
}
