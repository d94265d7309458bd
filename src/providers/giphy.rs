use std::collections::HashMap;

use axum::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{read_json, require_keywords, resolve_url, GifProvider, MediaCandidate};
use crate::errors::ProviderError;

pub const GIPHY_BASE_URL: &str = "https://api.giphy.com/v1";

/// The rendition Giphy always has.
const GENERIC_RENDITION: &str = "original";

/// Searches GIPHY. The attempt counter is used as the result offset, so every
/// shuffle moves one hit further down the result list.
pub struct GiphyProvider {
    http: Client,
    base_url: String,
    api_key: String,
    rendition: String,
    rating: String,
    language: String,
}

#[derive(Deserialize, Debug)]
struct GiphySearchResult {
    #[serde(default)]
    data: Vec<GiphyGif>,
}

#[derive(Deserialize, Debug)]
struct GiphyGif {
    #[serde(default)]
    images: HashMap<String, GiphyImage>,
}

#[derive(Deserialize, Debug)]
struct GiphyImage {
    #[serde(default)]
    url: String,
}

impl GiphyProvider {
    pub fn new(
        http: Client,
        api_key: String,
        rendition: String,
        rating: String,
        language: String,
    ) -> Self {
        Self {
            http,
            base_url: GIPHY_BASE_URL.to_string(),
            api_key,
            rendition,
            rating,
            language,
        }
    }

    /// Search somewhere other than the public API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn pick(&self, result: GiphySearchResult) -> Result<MediaCandidate, ProviderError> {
        let gif = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::new("An empty list of GIFs was returned"))?;
        let url = resolve_url(
            image_url(&gif.images, &self.rendition),
            image_url(&gif.images, GENERIC_RENDITION),
        );
        if url.is_empty() {
            return Err(ProviderError::new("GIPHY returned a GIF without any URL"));
        }
        Ok(MediaCandidate { url })
    }
}

fn image_url<'a>(images: &'a HashMap<String, GiphyImage>, rendition: &str) -> &'a str {
    images.get(rendition).map(|i| i.url.as_str()).unwrap_or_default()
}

#[async_trait]
impl GifProvider for GiphyProvider {
    fn name(&self) -> &'static str {
        "GIPHY"
    }

    async fn search(&self, keywords: &str, attempt: u32) -> Result<MediaCandidate, ProviderError> {
        require_keywords(keywords)?;
        log::debug!("GIPHY search for `{keywords}` (offset {attempt})");
        let offset = attempt.to_string();
        let response = self
            .http
            .get(format!("{}/gifs/search", self.base_url))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("q", keywords),
                ("limit", "1"),
                ("offset", offset.as_str()),
                ("rating", self.rating.as_str()),
                ("lang", self.language.as_str()),
            ])
            .send()
            .await;
        let result: GiphySearchResult = read_json("GIPHY", response).await?;
        self.pick(result)
    }
}
