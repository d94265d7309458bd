//! The chat host side of things: the posts we put in front of people, and
//! the operations the shuffle workflow needs the host to perform on them.
use axum::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::HostOperationError;

mod mattermost;
pub use mattermost::MattermostFace;

/// A chat post, in the shape the host's API speaks.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Post {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "PostProps::is_empty")]
    pub props: PostProps,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub create_at: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub update_at: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PostProps {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl PostProps {
    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Attachment {
    #[serde(default)]
    pub actions: Vec<PostAction>,
}

/// A button. Clicking it makes the host POST `integration.context` to
/// `integration.url`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PostAction {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub integration: Integration,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Integration {
    pub url: String,
    pub context: Map<String, Value>,
}

/// Who gets to see a slash command's answer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Ephemeral,
    InChannel,
}

/// What we answer a slash command with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommandResponse {
    pub response_type: ResponseType,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl CommandResponse {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            text: text.into(),
            attachments: Vec::new(),
        }
    }
}

/// The body the host expects back from a successful button click.
#[derive(Serialize, Debug, Default)]
pub struct ActionAck {}

/// The post operations the shuffle workflow needs. Ephemeral posts are only
/// visible to `user_id`.
#[async_trait]
pub trait MessagingHost: Send + Sync {
    async fn send_ephemeral_post(
        &self,
        user_id: &str,
        post: &Post,
    ) -> Result<(), HostOperationError>;
    /// Replace an existing ephemeral post in place; `post.id` says which.
    async fn update_ephemeral_post(
        &self,
        user_id: &str,
        post: &Post,
    ) -> Result<(), HostOperationError>;
    /// Fails if the host refuses; an ephemeral post that is still on screen
    /// must never be reported as gone.
    async fn delete_ephemeral_post(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> Result<(), HostOperationError>;
    /// Create a normal post everyone in the channel can see.
    async fn create_post(&self, post: &Post) -> Result<Post, HostOperationError>;
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// Milliseconds since the epoch, the host's timestamp format.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
