//! Detail page scraping.
//!
//! Both halves degrade gracefully: a page without the expected structure
//! yields an empty metadata map or an empty asset list, never an error.

mod assets;
mod fields;
mod metadata;

pub use assets::{
    is_pdf_url, AssetResolver, AssetResolverSettings, AssetStrategy, DirectDownloadMarker,
    LandingCandidate, PdfRedirect, DIRECT_DOWNLOAD_ATTR, DIRECT_DOWNLOAD_MARKER_ID,
};
pub use fields::{
    map_fields, LABEL_COMPOSER, LABEL_INSTRUMENTATION, LABEL_KEY, LABEL_PERIOD, LABEL_STYLE,
    LABEL_TITLE, LABEL_YEAR,
};
pub use metadata::{normalized_text, MetadataExtractor, GENERAL_INFO_ANCHOR};
