//! THE SHUFFLING ENGINE. A shuffle session is an ephemeral post with three
//! buttons on it. The session has no memory of its own: everything it knows
//! rides along in the buttons' action context, so any click can be served by
//! any process.
//!
//! Two quick Shuffle clicks on the same post race each other to update it;
//! whichever update lands last is what the user sees. That's acceptable.
use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::context::{ActionContext, ActionRequest};
use crate::errors::ActionError;
use crate::faces::{
    now_millis, Attachment, CommandResponse, Integration, MessagingHost, Post, PostAction,
    PostProps,
};
use crate::providers::GifProvider;
use crate::triggers::{Flow, Triggers};

/// The three buttons on a shuffle post.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Cancel,
    Shuffle,
    Send,
}

impl ActionKind {
    /// Button order on the post.
    pub const ALL: [ActionKind; 3] = [ActionKind::Cancel, ActionKind::Shuffle, ActionKind::Send];

    pub fn id(&self) -> &'static str {
        match self {
            ActionKind::Cancel => "cancel",
            ActionKind::Shuffle => "shuffle",
            ActionKind::Send => "send",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Cancel => "Cancel",
            ActionKind::Shuffle => "Shuffle",
            ActionKind::Send => "Send",
        }
    }
}

/// The text of a GIF post. Pure, so the same GIF always reads the same way.
pub fn caption(keywords: &str, media_url: &str) -> String {
    format!("**{keywords}**\n\n![GIF for '{keywords}']({media_url})")
}

/// Drives shuffle sessions from the first command to the final click.
pub struct Shuffler {
    config: Arc<Config>,
    provider: Arc<dyn GifProvider>,
    host: Arc<dyn MessagingHost>,
    triggers: Triggers,
}

impl Shuffler {
    pub fn new(
        config: Arc<Config>,
        provider: Arc<dyn GifProvider>,
        host: Arc<dyn MessagingHost>,
    ) -> Result<Self> {
        let triggers = Triggers::new(&config.gif_trigger, &config.shuffle_trigger)?;
        Ok(Self {
            config,
            provider,
            host,
            triggers,
        })
    }

    /// Answer a slash command such as `/gifshuffle cat nap`.
    pub async fn execute_command(&self, raw: &str) -> CommandResponse {
        let Some(trigger) = self.triggers.find(raw) else {
            log::debug!("no trigger matches `{raw}`");
            return CommandResponse::ephemeral(self.usage());
        };
        let keywords = trigger.keywords(raw);
        if keywords.is_empty() {
            return CommandResponse::ephemeral(format!("Usage: `/{} <keywords>`", trigger.word()));
        }
        match trigger.flow() {
            Flow::Direct => self.execute_command_gif(&keywords).await,
            Flow::Shuffle => self.execute_command_gif_shuffle(&keywords).await,
        }
    }

    /// Post one GIF straight to the channel.
    async fn execute_command_gif(&self, keywords: &str) -> CommandResponse {
        match self.provider.search(keywords, 0).await {
            Ok(candidate) => CommandResponse::in_channel(caption(keywords, &candidate.url)),
            Err(e) => {
                log::warn!("Unable to get GIF URL for `{keywords}`: {e}");
                CommandResponse::ephemeral(format!("Unable to get GIF URL: {e}"))
            }
        }
    }

    /// Show the caller, and only the caller, a first candidate with buttons.
    async fn execute_command_gif_shuffle(&self, keywords: &str) -> CommandResponse {
        let candidate = match self.provider.search(keywords, 0).await {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Unable to get GIF URL for `{keywords}`: {e}");
                return CommandResponse::ephemeral(format!("Unable to get GIF URL: {e}"));
            }
        };
        let context = ActionContext::new(keywords, candidate.url, 0);
        let text = caption(&context.keywords, &context.media_url);
        let mut response = CommandResponse::ephemeral(text);
        response.attachments = self.shuffle_attachments(&context);
        response
    }

    fn usage(&self) -> String {
        format!(
            "Usage: `/{} <keywords>` to post a GIF, or `/{} <keywords>` to pick one first",
            self.triggers.word_for(Flow::Direct),
            self.triggers.word_for(Flow::Shuffle)
        )
    }

    /// Cancel, Shuffle and Send buttons, all carrying the same context.
    pub fn shuffle_attachments(&self, context: &ActionContext) -> Vec<Attachment> {
        let encoded = context.encode();
        let actions = ActionKind::ALL
            .iter()
            .map(|kind| PostAction {
                id: kind.id().to_string(),
                name: kind.label().to_string(),
                kind: "button".to_string(),
                integration: Integration {
                    url: self.config.action_url(kind.id()),
                    context: encoded.clone(),
                },
            })
            .collect();
        vec![Attachment { actions }]
    }

    /// Route a decoded button click to its handler.
    pub async fn handle(
        &self,
        kind: ActionKind,
        request: &ActionRequest,
        context: ActionContext,
    ) -> Result<(), ActionError> {
        match kind {
            ActionKind::Cancel => self.handle_cancel(request, &context).await,
            ActionKind::Shuffle => self.handle_shuffle(request, &context).await,
            ActionKind::Send => self.handle_send(request, &context).await,
        }
    }

    /// Throw the ephemeral post away.
    pub async fn handle_cancel(
        &self,
        request: &ActionRequest,
        context: &ActionContext,
    ) -> Result<(), ActionError> {
        self.host
            .delete_ephemeral_post(&request.user_id, &request.post_id)
            .await
            .map_err(|e| ActionError::host("Unable to delete the shuffle post", e))?;
        log::info!("{} gave up on `{}`", request.user_id, context.keywords);
        Ok(())
    }

    /// Swap the GIF on the ephemeral post for a new one. If the provider
    /// fails, the post is left exactly as it was.
    pub async fn handle_shuffle(
        &self,
        request: &ActionRequest,
        context: &ActionContext,
    ) -> Result<(), ActionError> {
        let candidate = self
            .provider
            .search(&context.keywords, context.next_attempt())
            .await
            .map_err(ActionError::Provider)?;
        let next = context.reshuffled(candidate.url);

        let now = now_millis();
        let post = Post {
            id: request.post_id.clone(),
            channel_id: request.channel_id.clone(),
            user_id: request.user_id.clone(),
            message: caption(&next.keywords, &next.media_url),
            props: PostProps {
                attachments: self.shuffle_attachments(&next),
            },
            create_at: now,
            update_at: now,
        };
        self.host
            .update_ephemeral_post(&request.user_id, &post)
            .await
            .map_err(|e| ActionError::host("Unable to update the shuffle post", e))?;
        log::debug!("shuffled `{}` to attempt {}", next.keywords, next.attempt);
        Ok(())
    }

    /// Publish the current GIF to the channel and drop the ephemeral post.
    /// The ephemeral post goes first; if that fails nothing is published.
    pub async fn handle_send(
        &self,
        request: &ActionRequest,
        context: &ActionContext,
    ) -> Result<(), ActionError> {
        self.host
            .delete_ephemeral_post(&request.user_id, &request.post_id)
            .await
            .map_err(|e| ActionError::host("Unable to delete the shuffle post", e))?;

        let post = Post {
            channel_id: request.channel_id.clone(),
            user_id: request.user_id.clone(),
            message: caption(&context.keywords, &context.media_url),
            ..Post::default()
        };
        let created = self
            .host
            .create_post(&post)
            .await
            .map_err(|e| ActionError::host("Unable to create post", e))?;
        log::info!("{} sent `{}` as post {}", request.user_id, context.keywords, created.id);
        Ok(())
    }
}
