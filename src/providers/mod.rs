//! GIF backends. Each one turns keywords into exactly one previewable URL.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::async_trait;

use crate::config::{Config, ProviderKind};
use crate::errors::ProviderError;

mod gfycat;
pub use gfycat::GfycatProvider;

mod giphy;
pub use giphy::GiphyProvider;

/// File suffixes the chat host can't preview inline.
const VIDEO_SUFFIXES: &[&str] = &[".webm", ".mp4"];

/// One search result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaCandidate {
    pub url: String,
}

#[async_trait]
pub trait GifProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Find a GIF for `keywords`. `attempt` is a hint: the same keywords with a
    /// higher attempt should *probably* come back with something else, but no
    /// backend promises that.
    async fn search(&self, keywords: &str, attempt: u32) -> Result<MediaCandidate, ProviderError>;
}

/// Prefer the configured rendition unless it's missing or a video container.
pub fn resolve_url(preferred: &str, generic: &str) -> String {
    if preferred.is_empty() || VIDEO_SUFFIXES.iter().any(|suffix| preferred.ends_with(suffix)) {
        generic.to_string()
    } else {
        preferred.to_string()
    }
}

/// Build the backend named in the configuration. Called once at startup.
pub fn from_config(config: &Config) -> Result<Arc<dyn GifProvider>> {
    let http = http_client(config.provider_timeout)?;
    let provider: Arc<dyn GifProvider> = match config.provider {
        ProviderKind::Gfycat => {
            let mut gfycat = GfycatProvider::new(http, config.rendition.clone());
            if let Some(url) = &config.provider_url {
                gfycat = gfycat.with_base_url(url.as_str());
            }
            Arc::new(gfycat)
        }
        ProviderKind::Giphy => {
            let api_key = config
                .giphy_api_key
                .clone()
                .context("GIPHY_API_KEY is required when GIF_PROVIDER is giphy")?;
            let mut giphy = GiphyProvider::new(
                http,
                api_key,
                config.rendition.clone(),
                config.giphy_rating.clone(),
                config.giphy_language.clone(),
            );
            if let Some(url) = &config.provider_url {
                giphy = giphy.with_base_url(url.as_str());
            }
            Arc::new(giphy)
        }
    };
    Ok(provider)
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("gifshuffle/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .context("Unable to build the GIF provider HTTP client")
}

/// Shared tail of every provider call: check the status and parse the body.
async fn read_json<T: serde::de::DeserializeOwned>(
    backend: &str,
    response: std::result::Result<reqwest::Response, reqwest::Error>,
) -> Result<T, ProviderError> {
    let response = response.map_err(|e| {
        ProviderError::with_source(format!("Error calling the {backend} search API"), e)
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::new(format!(
            "Error calling the {backend} search API (HTTP Status: {status})"
        )));
    }
    let body = response.bytes().await.map_err(|e| {
        ProviderError::with_source(format!("Could not read {backend} search response body"), e)
    })?;
    serde_json::from_slice(&body).map_err(|e| {
        ProviderError::with_source(format!("Could not parse {backend} search response body"), e)
    })
}

fn require_keywords(keywords: &str) -> Result<(), ProviderError> {
    if keywords.trim().is_empty() {
        Err(ProviderError::new("No keywords to search for"))
    } else {
        Ok(())
    }
}
