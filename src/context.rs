//! The state a shuffle session carries around in its buttons. The host hands
//! it back to us untouched on every click, so this is the only memory a
//! session has.
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::MalformedContextError;

pub const KEYWORDS: &str = "keywords";
pub const GIF_URL: &str = "gif_url";
pub const COUNTER: &str = "counter";

/// The decoded action context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionContext {
    /// The search the session started with; never changes.
    pub keywords: String,
    /// The candidate currently on screen.
    pub media_url: String,
    /// How many times this session has shuffled.
    pub attempt: u32,
}

impl ActionContext {
    pub fn new(keywords: impl Into<String>, media_url: impl Into<String>, attempt: u32) -> Self {
        Self {
            keywords: keywords.into(),
            media_url: media_url.into(),
            attempt,
        }
    }

    /// The attempt number the next shuffle should ask the provider for.
    pub fn next_attempt(&self) -> u32 {
        self.attempt.saturating_add(1)
    }

    /// The context after a successful shuffle landed on `media_url`.
    pub fn reshuffled(&self, media_url: impl Into<String>) -> Self {
        Self {
            keywords: self.keywords.clone(),
            media_url: media_url.into(),
            attempt: self.next_attempt(),
        }
    }

    pub fn encode(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(KEYWORDS.to_string(), Value::from(self.keywords.as_str()));
        map.insert(GIF_URL.to_string(), Value::from(self.media_url.as_str()));
        map.insert(COUNTER.to_string(), Value::from(self.attempt));
        map
    }

    /// Every key is mandatory. Keys we don't know about are ignored so that
    /// contexts minted by an older build still decode.
    pub fn decode(map: &Map<String, Value>) -> Result<Self, MalformedContextError> {
        Ok(Self {
            keywords: string_field(map, KEYWORDS)?,
            media_url: string_field(map, GIF_URL)?,
            attempt: counter_field(map, COUNTER)?,
        })
    }
}

/// What the host POSTs to us when someone clicks a button.
#[derive(Deserialize, Debug, Clone)]
pub struct ActionRequest {
    pub post_id: String,
    pub channel_id: String,
    pub user_id: String,
    /// The context we put on the button, handed back untouched.
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl ActionRequest {
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// The acting user and the post they clicked on; without them there is
    /// nothing to act on.
    pub fn is_addressable(&self) -> bool {
        !self.user_id.is_empty() && !self.post_id.is_empty()
    }

    pub fn action_context(&self) -> Result<ActionContext, MalformedContextError> {
        ActionContext::decode(&self.context)
    }
}

fn string_field(
    map: &Map<String, Value>,
    key: &'static str,
) -> Result<String, MalformedContextError> {
    match map.get(key) {
        None | Some(Value::Null) => Err(MalformedContextError::Missing(key)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(MalformedContextError::WrongType {
            key,
            expected: "a string",
        }),
    }
}

// Hosts written in languages without integers hand the counter back as a
// float, so `1.0` is as good as `1`.
fn counter_field(
    map: &Map<String, Value>,
    key: &'static str,
) -> Result<u32, MalformedContextError> {
    let wrong_type = MalformedContextError::WrongType {
        key,
        expected: "a non-negative integer",
    };
    match map.get(key) {
        None | Some(Value::Null) => Err(MalformedContextError::Missing(key)),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                u32::try_from(v).map_err(|_| wrong_type)
            } else {
                match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Ok(f as u32),
                    _ => Err(wrong_type),
                }
            }
        }
        Some(_) => Err(wrong_type),
    }
}
