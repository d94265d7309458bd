//! Runtime configuration. Read once from the environment at startup and then
//! handed to whoever needs it; nothing here is global.
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Url;

/// Which GIF backend to search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Gfycat,
    Giphy,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "gfycat" => Some(ProviderKind::Gfycat),
            "giphy" => Some(ProviderKind::Giphy),
            _ => None,
        }
    }

    /// The rendition we ask for if nobody said otherwise.
    pub fn default_rendition(&self) -> &'static str {
        match self {
            ProviderKind::Gfycat => "max2mbGif",
            ProviderKind::Giphy => "fixed_height_small",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Prepended to every route we serve.
    pub route_prefix: String,
    /// Where the chat host can reach us; button integrations point here.
    pub public_url: String,
    pub mattermost_url: String,
    pub mattermost_token: String,
    /// Slash commands must carry this token if set.
    pub command_token: Option<String>,
    /// Button clicks must carry this token if set.
    pub action_token: Option<String>,
    pub gif_trigger: String,
    pub shuffle_trigger: String,
    pub provider: ProviderKind,
    pub rendition: String,
    pub giphy_api_key: Option<String>,
    pub giphy_rating: String,
    pub giphy_language: String,
    /// Overrides the provider's API root, e.g. for a caching proxy.
    pub provider_url: Option<String>,
    pub provider_timeout: Duration,
}

const DEFAULT_TIMEOUT_SECS: u64 = 10;

impl Config {
    /// Read everything from the process environment.
    pub fn from_env() -> Result<Self> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = match get("PORT") {
            Some(p) => p
                .parse()
                .with_context(|| format!("PORT must be a port number, not `{p}`"))?,
            None => 5000,
        };
        let route_prefix = get("ROUTE_PREFIX")
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .map(|p| format!("/{p}"))
            .unwrap_or_default();
        let public_url = match get("PUBLIC_URL") {
            Some(u) => {
                Url::parse(&u).with_context(|| format!("PUBLIC_URL must be a URL, not `{u}`"))?;
                u.trim_end_matches('/').to_string()
            }
            None if host.contains(':') => format!("http://[{host}]:{port}"),
            None => format!("http://{host}:{port}"),
        };

        let mattermost_url = get("MATTERMOST_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .context("You must provide the chat server address in the env var MATTERMOST_URL.")?;
        let mattermost_token = get("MATTERMOST_TOKEN")
            .context("You must provide a bot access token in the env var MATTERMOST_TOKEN.")?;

        let provider = match get("GIF_PROVIDER") {
            Some(name) => ProviderKind::parse(&name)
                .ok_or_else(|| anyhow!("GIF_PROVIDER must be `gfycat` or `giphy`, not `{name}`"))?,
            None => ProviderKind::Gfycat,
        };
        let rendition = get("RENDITION")
            .unwrap_or_else(|| provider.default_rendition().to_string());

        let provider_timeout = match get("PROVIDER_TIMEOUT_SECS") {
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                Ok(_) => {
                    log::warn!(
                        "PROVIDER_TIMEOUT_SECS must be positive; falling back to {}s",
                        DEFAULT_TIMEOUT_SECS
                    );
                    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse PROVIDER_TIMEOUT_SECS as u64; falling back to {}s; {:?}",
                        DEFAULT_TIMEOUT_SECS,
                        e
                    );
                    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Config {
            host,
            port,
            route_prefix,
            public_url,
            mattermost_url,
            mattermost_token,
            command_token: get("COMMAND_TOKEN"),
            action_token: get("ACTION_TOKEN"),
            gif_trigger: get("GIF_TRIGGER").unwrap_or_else(|| "gif".to_string()),
            shuffle_trigger: get("SHUFFLE_TRIGGER").unwrap_or_else(|| "gifshuffle".to_string()),
            provider,
            rendition,
            giphy_api_key: get("GIPHY_API_KEY"),
            giphy_rating: get("GIPHY_RATING").unwrap_or_else(|| "g".to_string()),
            giphy_language: get("GIPHY_LANGUAGE").unwrap_or_else(|| "en".to_string()),
            provider_url: get("PROVIDER_URL").map(|u| u.trim_end_matches('/').to_string()),
            provider_timeout,
        })
    }

    /// The URL a button of the given action kind should call. The token, if
    /// any, is query-encoded so it survives the trip back intact.
    pub fn action_url(&self, action: &str) -> String {
        let url = format!("{}{}/actions/{action}", self.public_url, self.route_prefix);
        let Some(token) = &self.action_token else {
            return url;
        };
        match Url::parse_with_params(&url, &[("token", token)]) {
            Ok(with_token) => with_token.into(),
            Err(e) => {
                log::error!("cannot put the action token on `{url}`: {e}");
                url
            }
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config::from_lookup(|key| match key {
            "MATTERMOST_URL" => Some("https://chat.example.com".to_string()),
            "MATTERMOST_TOKEN" => Some("bot-token".to_string()),
            "PUBLIC_URL" => Some("https://bot.example.com".to_string()),
            _ => None,
        })
        .expect("test config is complete")
    }
}
