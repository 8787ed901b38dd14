//! Types for the remote catalog listing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::WorkId;

/// Number of works per listing page. Fixed by the upstream script.
pub const PAGE_SIZE: u64 = 1000;

/// A work reference as returned by one listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalWorkRef {
    /// External id (`offset + local index`).
    pub id: WorkId,
    /// Detail page URL.
    pub permalink: String,
    /// Inline title, used when the detail page yields nothing.
    pub fallback_title: String,
    /// Inline composer, used when the detail page yields nothing.
    pub fallback_composer: String,
}

/// One listing page, keyed by local index in page order.
pub type ListingPage = BTreeMap<u32, ExternalWorkRef>;

/// Raw item shape inside the listing envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawListingItem {
    pub permlink: String,
    #[serde(default)]
    pub intvals: RawIntvals,
}

/// Inline values attached to a listing item.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawIntvals {
    #[serde(default)]
    pub worktitle: String,
    #[serde(default)]
    pub composer: String,
}
