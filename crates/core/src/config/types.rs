use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::enrich::{EnrichmentConfig, EnrichmentMode, LlmProvider, OverwritePolicy};
use crate::ingest::IngestConfig;
use crate::scrape::AssetResolverSettings;
use crate::web::RequestCookie;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("partitura.db")
}

/// Remote catalog configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Worklist script URL (without query string).
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Base for relative edition links on detail pages.
    #[serde(default = "default_wiki_base_url")]
    pub wiki_base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for each individual HTTP request.
    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,

    /// Cookie accepting the download disclaimer on landing pages.
    #[serde(default = "default_disclaimer_cookie_name")]
    pub disclaimer_cookie_name: String,

    #[serde(default = "default_disclaimer_cookie_value")]
    pub disclaimer_cookie_value: String,

    /// Substring identifying edition (redirector) links.
    #[serde(default = "default_landing_link_pattern")]
    pub landing_link_pattern: String,
}

fn default_listing_url() -> String {
    "https://imslp.org/imslpscripts/API.ISCR.php".to_string()
}

fn default_wiki_base_url() -> String {
    "https://imslp.org/wiki/".to_string()
}

fn default_user_agent() -> String {
    format!("partitura/{}", env!("CARGO_PKG_VERSION"))
}

fn default_catalog_timeout() -> u64 {
    60
}

fn default_disclaimer_cookie_name() -> String {
    "imslpdisclaimeraccepted".to_string()
}

fn default_disclaimer_cookie_value() -> String {
    "yes".to_string()
}

fn default_landing_link_pattern() -> String {
    "Special:ImagefromIndex".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            wiki_base_url: default_wiki_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_catalog_timeout(),
            disclaimer_cookie_name: default_disclaimer_cookie_name(),
            disclaimer_cookie_value: default_disclaimer_cookie_value(),
            landing_link_pattern: default_landing_link_pattern(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Cookies sent to landing pages.
    pub fn cookies(&self) -> Vec<RequestCookie> {
        vec![RequestCookie::new(
            &self.disclaimer_cookie_name,
            &self.disclaimer_cookie_value,
        )]
    }

    pub fn resolver_settings(&self) -> AssetResolverSettings {
        AssetResolverSettings {
            wiki_base_url: self.wiki_base_url.clone(),
            landing_link_pattern: self.landing_link_pattern.clone(),
            cookies: self.cookies(),
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub ingest: IngestConfig,
    pub enrichment: SanitizedEnrichmentConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEnrichmentConfig {
    pub mode: EnrichmentMode,
    pub overwrite: OverwritePolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<SanitizedLlmConfig>,
}

/// Sanitized LLM config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub max_tokens: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            catalog: config.catalog.clone(),
            ingest: config.ingest.clone(),
            enrichment: SanitizedEnrichmentConfig {
                mode: config.enrichment.mode,
                overwrite: config.enrichment.overwrite,
                llm: config.enrichment.llm.as_ref().map(|l| SanitizedLlmConfig {
                    provider: l.provider.clone(),
                    model: l.model.clone(),
                    api_base: l.api_base.clone(),
                    api_key_configured: l.api_key.as_ref().is_some_and(|k| !k.is_empty()),
                    timeout_secs: l.timeout_secs,
                    max_tokens: l.max_tokens,
                }),
            },
        }
    }
}
