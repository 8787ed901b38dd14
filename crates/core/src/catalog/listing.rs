//! HTTP client for the paged worklist endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::debug;

use super::types::{ExternalWorkRef, ListingPage, RawListingItem, PAGE_SIZE};
use super::{CatalogSourceError, PageFetcher};

/// Envelope key carrying opaque listing metadata.
const METADATA_KEY: &str = "metadata";

/// Fetches listing pages from the worklist script.
pub struct HttpPageFetcher {
    client: Client,
    listing_url: String,
}

impl HttpPageFetcher {
    /// Create a fetcher for `listing_url` (without query string).
    pub fn new(
        listing_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, CatalogSourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            listing_url: listing_url.into(),
        })
    }

    /// Build the request URL for a page starting at `offset`.
    fn page_url(&self, offset: u64) -> String {
        format!(
            "{}?account=worklist/disclaimer=accepted/sort=id/type=2/start={}",
            self.listing_url, offset
        )
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, offset: u64) -> Result<ListingPage, CatalogSourceError> {
        let url = self.page_url(offset);
        debug!("Fetching listing page: offset={}, page_size={}", offset, PAGE_SIZE);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogSourceError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| CatalogSourceError::ParseError(format!("invalid listing JSON: {}", e)))?;

        parse_listing(envelope, offset)
    }
}

/// Turn a raw listing envelope into a page of work references.
///
/// The `metadata` key is dropped; every other key must be a small integer
/// index. An empty result (after dropping `metadata`) means the catalog is
/// exhausted.
pub fn parse_listing(envelope: Value, offset: u64) -> Result<ListingPage, CatalogSourceError> {
    let mut items: Map<String, Value> = match envelope {
        Value::Object(map) => map,
        // The script answers an out-of-range offset with an empty array.
        Value::Array(arr) if arr.is_empty() => return Ok(ListingPage::new()),
        Value::Null => return Ok(ListingPage::new()),
        other => {
            return Err(CatalogSourceError::ParseError(format!(
                "expected listing object, got {}",
                other
            )))
        }
    };
    items.remove(METADATA_KEY);

    let mut page = ListingPage::new();
    for (key, value) in items {
        let index: u32 = key.parse().map_err(|_| {
            CatalogSourceError::ParseError(format!("unexpected listing key '{}'", key))
        })?;

        let raw: RawListingItem = serde_json::from_value(value).map_err(|e| {
            CatalogSourceError::ParseError(format!("invalid listing item '{}': {}", key, e))
        })?;

        page.insert(
            index,
            ExternalWorkRef {
                id: (offset + index as u64) as i64,
                permalink: raw.permlink,
                fallback_title: raw.intvals.worktitle,
                fallback_composer: raw.intvals.composer,
            },
        );
    }

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_listing_strips_metadata() {
        let envelope = json!({
            "metadata": {"moreresultsavailable": true, "timestamp": 123},
            "0": {
                "permlink": "https://imslp.org/wiki/Symphony_No.5_(Beethoven,_Ludwig_van)",
                "intvals": {"worktitle": "Symphony No.5", "composer": "Beethoven, Ludwig van"}
            }
        });

        let page = parse_listing(envelope, 0).unwrap();
        assert_eq!(page.len(), 1);

        let work = &page[&0];
        assert_eq!(work.id, 0);
        assert_eq!(work.fallback_title, "Symphony No.5");
        assert_eq!(work.fallback_composer, "Beethoven, Ludwig van");
    }

    #[test]
    fn test_parse_listing_ids_are_offset_based_and_ordered() {
        let envelope = json!({
            "metadata": {},
            "10": {"permlink": "https://imslp.org/wiki/B", "intvals": {}},
            "2": {"permlink": "https://imslp.org/wiki/A", "intvals": {}}
        });

        let page = parse_listing(envelope, 3000).unwrap();
        let ids: Vec<_> = page.values().map(|w| w.id).collect();
        assert_eq!(ids, vec![3002, 3010]);
        assert_eq!(page[&2].fallback_title, "");
    }

    #[test]
    fn test_parse_listing_only_metadata_is_empty() {
        let page = parse_listing(json!({"metadata": {"x": 1}}), 5000).unwrap();
        assert!(page.is_empty());

        assert!(parse_listing(json!([]), 0).unwrap().is_empty());
    }

    #[test]
    fn test_parse_listing_rejects_unexpected_shapes() {
        let result = parse_listing(json!({"metadata": {}, "abc": {"permlink": "x"}}), 0);
        assert!(matches!(result, Err(CatalogSourceError::ParseError(_))));

        let result = parse_listing(json!({"0": {"intvals": {}}}), 0);
        assert!(matches!(result, Err(CatalogSourceError::ParseError(_))));

        let result = parse_listing(json!("nope"), 0);
        assert!(matches!(result, Err(CatalogSourceError::ParseError(_))));
    }

    #[test]
    fn test_page_url() {
        let fetcher = HttpPageFetcher::new(
            "https://imslp.org/imslpscripts/API.ISCR.php",
            "test-agent",
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(
            fetcher.page_url(2000),
            "https://imslp.org/imslpscripts/API.ISCR.php?account=worklist/disclaimer=accepted/sort=id/type=2/start=2000"
        );
    }
}
