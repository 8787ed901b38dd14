//! LLM-backed record enricher.
//!
//! Sends the partially-filled record to a language model and reads back a
//! JSON object with the same attribute names. Anything that goes wrong
//! (transport, API error, unparseable answer) yields the input unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::llm::{EnrichmentPrompt, LlmClient};
use super::RecordEnricher;
use crate::metrics::ENRICHMENT_RESULTS;
use crate::store::{CatalogEntry, WorkFields};

const SYSTEM_PROMPT: &str = r#"You are a music librarian completing catalog records for public-domain sheet music.

You receive one work as JSON: its canonical attributes (some may be empty), the
detail page URL and the raw label/value table scraped from that page.

Fill in empty attributes only when you are confident. Keep existing values unless
they are clearly wrong. Use short catalog-style values:
- period: e.g. "Baroque", "Classical", "Romantic", "Early 20th century"
- year: the year or range of composition, e.g. "1807-08"
- key: e.g. "C minor"

Respond with JSON only, using exactly these keys (omit a key or use null when unknown):
{"title": "...", "composer": "...", "instrumentation": "...", "style": "...", "period": "...", "year": "...", "key": "..."}"#;

/// Enricher that asks an LLM to complete a record.
pub struct LlmEnricher {
    client: Arc<dyn LlmClient>,
}

impl LlmEnricher {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    fn build_prompt(entry: &CatalogEntry) -> EnrichmentPrompt {
        let record = serde_json::json!({
            "id": entry.id,
            "title": entry.fields.title,
            "composer": entry.fields.composer,
            "instrumentation": entry.fields.instrumentation,
            "style": entry.fields.style,
            "period": entry.fields.period,
            "year": entry.fields.year,
            "key": entry.fields.key,
            "permalink": entry.permalink,
            "raw_metadata": entry.raw_metadata,
        });

        EnrichmentPrompt {
            system: SYSTEM_PROMPT.to_string(),
            record: format!("Complete this record:\n{}", record),
        }
    }
}

/// Fields the model may return. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct LlmFieldsResponse {
    title: Option<String>,
    composer: Option<String>,
    instrumentation: Option<String>,
    style: Option<String>,
    period: Option<String>,
    year: Option<String>,
    key: Option<String>,
}

/// Parse a model answer onto `base`.
///
/// Tolerates prose or code fences around the object. Null, missing and blank
/// values leave the corresponding attribute of `base` untouched.
pub(crate) fn parse_fields_response(text: &str, base: &WorkFields) -> Result<WorkFields, String> {
    let json_str = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Err(format!("no JSON object in response: {}", text)),
    };

    let parsed: LlmFieldsResponse =
        serde_json::from_str(json_str).map_err(|e| format!("{} - Response: {}", e, text))?;

    let mut fields = base.clone();
    let answers = [
        parsed.title,
        parsed.composer,
        parsed.instrumentation,
        parsed.style,
        parsed.period,
        parsed.year,
        parsed.key,
    ];

    for ((_, slot), answer) in fields.fields_mut().into_iter().zip(answers) {
        if let Some(value) = answer.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            *slot = value;
        }
    }

    Ok(fields)
}

#[async_trait]
impl RecordEnricher for LlmEnricher {
    fn name(&self) -> &str {
        "llm"
    }

    async fn enrich(&self, entry: &CatalogEntry) -> WorkFields {
        let prompt = Self::build_prompt(entry);

        let answer = match self.client.complete(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(work_id = entry.id, "Enrichment request failed: {}", e);
                ENRICHMENT_RESULTS.with_label_values(&["error"]).inc();
                return entry.fields.clone();
            }
        };

        match parse_fields_response(&answer, &entry.fields) {
            Ok(fields) => {
                debug!(
                    work_id = entry.id,
                    model = self.client.model(),
                    "Enrichment completed"
                );
                ENRICHMENT_RESULTS.with_label_values(&["ok"]).inc();
                fields
            }
            Err(e) => {
                warn!(work_id = entry.id, "Unparseable enrichment response: {}", e);
                ENRICHMENT_RESULTS.with_label_values(&["error"]).inc();
                entry.fields.clone()
            }
        }
    }
}
