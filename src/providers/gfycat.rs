use std::collections::HashMap;

use axum::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{read_json, require_keywords, resolve_url, GifProvider, MediaCandidate};
use crate::errors::ProviderError;

pub const GFYCAT_BASE_URL: &str = "https://api.gfycat.com/v1";

/// Searches GfyCat. Needs no API key.
pub struct GfycatProvider {
    http: Client,
    base_url: String,
    rendition: String,
}

#[derive(Deserialize, Debug)]
struct GfySearchResult {
    #[serde(default)]
    gfycats: Vec<GfyGif>,
}

#[derive(Deserialize, Debug)]
struct GfyGif {
    #[serde(rename = "gifUrl", default)]
    gif_url: String,
    #[serde(default)]
    content_urls: HashMap<String, GfyContentUrl>,
}

#[derive(Deserialize, Debug)]
struct GfyContentUrl {
    #[serde(default)]
    url: String,
}

impl GfycatProvider {
    pub fn new(http: Client, rendition: String) -> Self {
        Self {
            http,
            base_url: GFYCAT_BASE_URL.to_string(),
            rendition,
        }
    }

    /// Search somewhere other than the public API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn pick(&self, result: GfySearchResult) -> Result<MediaCandidate, ProviderError> {
        let gif = result
            .gfycats
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::new("An empty list of GIFs was returned"))?;
        let preferred = gif
            .content_urls
            .get(&self.rendition)
            .map(|c| c.url.as_str())
            .unwrap_or_default();
        let url = resolve_url(preferred, &gif.gif_url);
        if url.is_empty() {
            return Err(ProviderError::new("GfyCat returned a GIF without any URL"));
        }
        Ok(MediaCandidate { url })
    }
}

#[async_trait]
impl GifProvider for GfycatProvider {
    fn name(&self) -> &'static str {
        "GfyCat"
    }

    async fn search(&self, keywords: &str, attempt: u32) -> Result<MediaCandidate, ProviderError> {
        require_keywords(keywords)?;
        // TODO: carry the search `cursor` in the action context so shuffles page
        // through results; until then every attempt asks for the first hit.
        log::debug!("GfyCat search for `{keywords}` (attempt {attempt})");
        let response = self
            .http
            .get(format!("{}/gfycats/search", self.base_url))
            .query(&[("search_text", keywords), ("count", "1")])
            .header("Accept", "application/json")
            .send()
            .await;
        let result: GfySearchResult = read_json("GfyCat", response).await?;
        self.pick(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dead_url, serve};
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};

    fn provider(rendition: &str) -> GfycatProvider {
        GfycatProvider::new(Client::new(), rendition.to_string())
    }

    fn parse(body: &str) -> GfySearchResult {
        serde_json::from_str(body).expect("fixture should parse")
    }

    #[test]
    fn picks_the_configured_rendition() {
        let body = r#"{
            "cursor": "abc",
            "gfycats": [{
                "gifUrl": "https://giant.gfycat.com/Cat.gif",
                "content_urls": {
                    "max2mbGif": { "url": "https://thumbs.gfycat.com/Cat-small.gif" },
                    "mp4": { "url": "https://thumbs.gfycat.com/Cat.mp4" }
                }
            }]
        }"#;
        let candidate = provider("max2mbGif").pick(parse(body)).unwrap();
        assert_eq!(candidate.url, "https://thumbs.gfycat.com/Cat-small.gif");
    }

    #[test]
    fn video_renditions_fall_back_to_the_gif() {
        let body = r#"{
            "gfycats": [{
                "gifUrl": "https://giant.gfycat.com/Cat.gif",
                "content_urls": { "webm": { "url": "https://thumbs.gfycat.com/Cat.webm" } }
            }]
        }"#;
        assert_eq!(
            provider("webm").pick(parse(body)).unwrap().url,
            "https://giant.gfycat.com/Cat.gif"
        );
        assert_eq!(
            provider("missing").pick(parse(body)).unwrap().url,
            "https://giant.gfycat.com/Cat.gif"
        );
    }

    #[test]
    fn an_empty_result_set_is_an_error() {
        let err = provider("max2mbGif")
            .pick(parse(r#"{"cursor": "", "gfycats": []}"#))
            .unwrap_err();
        assert_eq!(err.cause(), "An empty list of GIFs was returned");
    }

    #[tokio::test]
    async fn searches_over_http() {
        let app = Router::new().route(
            "/gfycats/search",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let text = q.get("search_text").cloned().unwrap_or_default();
                Json(json!({
                    "gfycats": [{"gifUrl": format!("https://giant.gfycat.com/{text}.gif")}]
                }))
            }),
        );
        let candidate = provider("max2mbGif")
            .with_base_url(serve(app))
            .search("cat nap", 3)
            .await
            .unwrap();
        assert_eq!(candidate.url, "https://giant.gfycat.com/cat nap.gif");
    }

    #[tokio::test]
    async fn server_errors_are_provider_errors() {
        let app = Router::new().route(
            "/gfycats/search",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let err = provider("max2mbGif")
            .with_base_url(serve(app))
            .search("cat", 0)
            .await
            .unwrap_err();
        assert_eq!(
            err.cause(),
            "Error calling the GfyCat search API (HTTP Status: 500 Internal Server Error)"
        );
    }

    #[tokio::test]
    async fn garbage_bodies_are_provider_errors() {
        let app = Router::new().route("/gfycats/search", get(|| async { "<html>nope</html>" }));
        let err = provider("max2mbGif")
            .with_base_url(serve(app))
            .search("cat", 0)
            .await
            .unwrap_err();
        assert_eq!(err.cause(), "Could not parse GfyCat search response body");
    }

    #[tokio::test]
    async fn unreachable_servers_are_provider_errors() {
        let err = provider("max2mbGif")
            .with_base_url(dead_url())
            .search("cat", 0)
            .await
            .unwrap_err();
        assert_eq!(err.cause(), "Error calling the GfyCat search API");
    }

    #[tokio::test]
    async fn an_empty_answer_over_http_is_an_error() {
        let app = Router::new().route(
            "/gfycats/search",
            get(|| async { Json(json!({"cursor": "", "gfycats": Value::Array(vec![])})) }),
        );
        let err = provider("max2mbGif")
            .with_base_url(serve(app))
            .search("cat", 0)
            .await
            .unwrap_err();
        assert_eq!(err.cause(), "An empty list of GIFs was returned");
    }

    #[tokio::test]
    async fn no_keywords_no_request() {
        let err = provider("max2mbGif").search("  ", 0).await.unwrap_err();
        assert_eq!(err.cause(), "No keywords to search for");
    }
}
