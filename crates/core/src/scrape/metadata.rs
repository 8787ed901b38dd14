//! "General Information" table extraction.

use scraper::{ElementRef, Html, Selector};

use crate::store::WorkMetadata;

/// Id of the heading anchor that precedes the metadata table.
pub const GENERAL_INFO_ANCHOR: &str = "General_Information";

/// Extracts the label/value table from a work's detail page.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    anchor_id: String,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(GENERAL_INFO_ANCHOR)
    }
}

impl MetadataExtractor {
    pub fn new(anchor_id: impl Into<String>) -> Self {
        Self {
            anchor_id: anchor_id.into(),
        }
    }

    /// Extract `label -> value` pairs from the first table following the anchor.
    ///
    /// Returns an empty map when `bypass` is set, when the anchor is missing,
    /// or when no table follows it. Rows without both a header and a value
    /// cell are skipped; a repeated label keeps its last value.
    pub fn extract(&self, html: &str, bypass: bool) -> WorkMetadata {
        let mut data = WorkMetadata::new();
        if bypass {
            return data;
        }

        let doc = Html::parse_document(html);
        let Some(table) = self.table_after_anchor(&doc) else {
            return data;
        };

        let (Ok(row_sel), Ok(th_sel), Ok(td_sel)) = (
            Selector::parse("tr"),
            Selector::parse("th"),
            Selector::parse("td"),
        ) else {
            return data;
        };

        for row in table.select(&row_sel) {
            let header = row.select(&th_sel).next();
            let value = row.select(&td_sel).next();
            if let (Some(header), Some(value)) = (header, value) {
                data.insert(normalized_text(header), normalized_text(value));
            }
        }

        data
    }

    /// The first `<table>` after the anchor span, in document order.
    fn table_after_anchor<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        let mut elements = doc.root_element().descendants().filter_map(ElementRef::wrap);

        elements.find(|el| {
            el.value().name() == "span" && el.value().id() == Some(self.anchor_id.as_str())
        })?;

        elements.find(|el| el.value().name() == "table")
    }
}

/// Text content with tags stripped and whitespace collapsed.
pub fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_PAGE: &str = r#"
        <html><body>
            <h2><span class="mw-headline" id="General_Information">General Information</span></h2>
            <table>
                <tr><th>Work Title</th><td>Symphony No. 5</td></tr>
                <tr><th>Composer</th><td><a href="/wiki/Category:Beethoven">Beethoven,
                    Ludwig   van</a></td></tr>
                <tr><th>Key</th><td>C minor</td></tr>
                <tr><td>orphan value</td></tr>
                <tr><th>Header only</th></tr>
            </table>
            <table><tr><th>Ignored</th><td>second table</td></tr></table>
        </body></html>
    "#;

    #[test]
    fn test_extracts_rows_with_header_and_value() {
        let data = MetadataExtractor::default().extract(DETAIL_PAGE, false);

        assert_eq!(data.len(), 3);
        assert_eq!(data["Work Title"], "Symphony No. 5");
        assert_eq!(data["Composer"], "Beethoven, Ludwig van");
        assert_eq!(data["Key"], "C minor");
        assert!(!data.contains_key("Ignored"));
        assert!(!data.contains_key("Header only"));
    }

    #[test]
    fn test_bypass_returns_empty() {
        assert!(MetadataExtractor::default()
            .extract(DETAIL_PAGE, true)
            .is_empty());
    }

    #[test]
    fn test_missing_anchor_returns_empty() {
        let html = "<html><table><tr><th>Work Title</th><td>X</td></tr></table></html>";
        assert!(MetadataExtractor::default().extract(html, false).is_empty());
        assert!(MetadataExtractor::default()
            .extract("<html></html>", false)
            .is_empty());
    }

    #[test]
    fn test_anchor_without_following_table_returns_empty() {
        let html = r#"
            <table><tr><th>Before</th><td>anchor</td></tr></table>
            <span id="General_Information"></span>
            <p>No table here</p>
        "#;
        assert!(MetadataExtractor::default().extract(html, false).is_empty());
    }

    #[test]
    fn test_duplicate_label_keeps_last_value() {
        let html = r#"
            <span id="General_Information"></span>
            <table>
                <tr><th>Key</th><td>C major</td></tr>
                <tr><th>Key</th><td>A minor</td></tr>
            </table>
        "#;
        let data = MetadataExtractor::default().extract(html, false);
        assert_eq!(data.len(), 1);
        assert_eq!(data["Key"], "A minor");
    }

    #[test]
    fn test_label_markup_is_normalized() {
        let html = r#"
            <span id="General_Information"></span>
            <table>
                <tr><th>Composer Time Period<br><span>Comp. Period</span></th><td>Romantic</td></tr>
            </table>
        "#;
        let data = MetadataExtractor::default().extract(html, false);
        assert_eq!(data["Composer Time Period Comp. Period"], "Romantic");
    }
}
