use super::{types::Config, ConfigError};
use crate::enrich::{EnrichmentMode, LlmProvider};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Catalog request timeout is not 0
/// - Ingest backoff range is ordered
/// - LLM enrichment has a usable `[enrichment.llm]` section
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.catalog.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.ingest.backoff_min_ms > config.ingest.backoff_max_ms {
        return Err(ConfigError::ValidationError(format!(
            "ingest.backoff_min_ms ({}) exceeds ingest.backoff_max_ms ({})",
            config.ingest.backoff_min_ms, config.ingest.backoff_max_ms
        )));
    }

    if config.enrichment.mode == EnrichmentMode::Llm {
        let Some(llm) = &config.enrichment.llm else {
            return Err(ConfigError::ValidationError(
                "enrichment.mode = \"llm\" requires an [enrichment.llm] section".to_string(),
            ));
        };

        if llm.provider == LlmProvider::Anthropic
            && llm.api_key.as_ref().map_or(true, |k| k.is_empty())
        {
            return Err(ConfigError::ValidationError(
                "enrichment.llm.api_key is required for the anthropic provider".to_string(),
            ));
        }
    }

    Ok(())
}
