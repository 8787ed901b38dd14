//! Mapping from source table labels onto canonical work attributes.

use crate::catalog::ExternalWorkRef;
use crate::store::{WorkFields, WorkMetadata};

pub const LABEL_TITLE: &str = "Work Title";
pub const LABEL_COMPOSER: &str = "Composer";
pub const LABEL_INSTRUMENTATION: &str = "Instrumentation";
pub const LABEL_STYLE: &str = "Piece Style";
pub const LABEL_PERIOD: &str = "Composer Time Period Comp. Period";
pub const LABEL_YEAR: &str = "Year/Date of Composition Y/D of Comp.";
pub const LABEL_KEY: &str = "Key";

/// Build canonical attributes from scraped metadata.
///
/// Detail-page values win over the listing's inline title/composer. Unknown
/// labels are ignored here (they survive in `raw_metadata`).
pub fn map_fields(metadata: &WorkMetadata, work: &ExternalWorkRef) -> WorkFields {
    let get = |label: &str| metadata.get(label).cloned().unwrap_or_default();

    WorkFields {
        title: metadata
            .get(LABEL_TITLE)
            .cloned()
            .unwrap_or_else(|| work.fallback_title.clone()),
        composer: metadata
            .get(LABEL_COMPOSER)
            .cloned()
            .unwrap_or_else(|| work.fallback_composer.clone()),
        instrumentation: get(LABEL_INSTRUMENTATION),
        style: get(LABEL_STYLE),
        period: get(LABEL_PERIOD),
        year: get(LABEL_YEAR),
        key: get(LABEL_KEY),
    }
}
