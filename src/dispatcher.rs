//! The HTTP face of the bot: one endpoint for slash commands and one per
//! button. Every request stands alone; whatever state a click needs arrives
//! in its body.
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Form, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::config::Config;
use crate::context::ActionRequest;
use crate::errors::ActionError;
use crate::faces::{ActionAck, CommandResponse, MessagingHost, Post};
use crate::shuffler::{ActionKind, Shuffler};

/// A slash command as the host POSTs it. We only read what we need.
#[derive(Deserialize, Debug, Default)]
pub struct SlashCommand {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub channel_id: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// How a button click went, ready to go back over the wire.
#[derive(Debug, PartialEq, Eq)]
pub struct ActionReply {
    pub status: StatusCode,
}

impl ActionReply {
    fn ok() -> Self {
        Self { status: StatusCode::OK }
    }

    fn status(status: StatusCode) -> Self {
        Self { status }
    }
}

impl IntoResponse for ActionReply {
    fn into_response(self) -> Response {
        if self.status == StatusCode::OK {
            // The host wants a JSON body back when we say yes.
            (self.status, Json(ActionAck::default())).into_response()
        } else {
            self.status.into_response()
        }
    }
}

pub struct Dispatcher {
    shuffler: Shuffler,
    host: Arc<dyn MessagingHost>,
    command_token: Option<String>,
    action_token: Option<String>,
}

impl Dispatcher {
    pub fn new(config: &Config, shuffler: Shuffler, host: Arc<dyn MessagingHost>) -> Self {
        Self {
            shuffler,
            host,
            command_token: config.command_token.clone(),
            action_token: config.action_token.clone(),
        }
    }

    /// Handle a slash command.
    pub async fn command(&self, command: SlashCommand) -> Result<CommandResponse, StatusCode> {
        if let Some(expected) = &self.command_token {
            if command.token != *expected {
                log::warn!("rejecting slash command from {} with a bad token", command.user_id);
                return Err(StatusCode::UNAUTHORIZED);
            }
        }
        let raw = format!("{} {}", command.command, command.text);
        log::debug!("{} in {}: `{}`", command.user_id, command.channel_id, raw.trim());
        Ok(self.shuffler.execute_command(&raw).await)
    }

    /// Handle one button click. Nothing reaches the workflow unless the
    /// request parses and its context decodes completely.
    pub async fn dispatch(
        &self,
        kind: ActionKind,
        token: Option<&str>,
        body: &[u8],
    ) -> ActionReply {
        if let Some(expected) = &self.action_token {
            if token != Some(expected.as_str()) {
                log::warn!("rejecting {} action with a bad token", kind.id());
                return ActionReply::status(StatusCode::UNAUTHORIZED);
            }
        }

        let request = match ActionRequest::parse(body) {
            Ok(r) if r.is_addressable() => r,
            Ok(_) => {
                log::warn!("{} action request names no user or post", kind.id());
                return ActionReply::status(StatusCode::BAD_REQUEST);
            }
            Err(e) => {
                log::warn!("unparseable {} action request: {e}", kind.id());
                return ActionReply::status(StatusCode::BAD_REQUEST);
            }
        };

        let result = match request.action_context() {
            Ok(context) => self.shuffler.handle(kind, &request, context).await,
            Err(e) => Err(ActionError::from(e)),
        };

        match result {
            Ok(()) => ActionReply::ok(),
            Err(err) => {
                self.report(kind, &request, &err).await;
                ActionReply::status(err.status())
            }
        }
    }

    /// Tell the user what broke and write it down. The user decides whether
    /// to try again.
    async fn report(&self, kind: ActionKind, request: &ActionRequest, err: &ActionError) {
        log::warn!(
            "{} action failed for user {} on post {}: {err}",
            kind.id(),
            request.user_id,
            request.post_id
        );
        let notice = Post {
            channel_id: request.channel_id.clone(),
            message: format!("GIF Shuffle: {err}"),
            ..Post::default()
        };
        if let Err(e) = self.host.send_ephemeral_post(&request.user_id, &notice).await {
            log::error!("could not tell {} about a failed {}: {e}", request.user_id, kind.id());
        }
    }
}

/// Mount every route under `prefix` (which is empty or starts with `/`).
pub fn router(dispatcher: Arc<Dispatcher>, prefix: &str) -> Router {
    Router::new()
        .route(&format!("{prefix}/ping"), get(ping))
        .route(&format!("{prefix}/command"), post(command))
        .route(&format!("{prefix}/actions/cancel"), post(cancel))
        .route(&format!("{prefix}/actions/shuffle"), post(shuffle))
        .route(&format!("{prefix}/actions/send"), post(send))
        .layer(Extension(dispatcher))
}

async fn ping() -> &'static str {
    "ok"
}

async fn command(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    Form(form): Form<SlashCommand>,
) -> Result<Json<CommandResponse>, StatusCode> {
    dispatcher.command(form).await.map(Json)
}

async fn cancel(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    Query(query): Query<TokenQuery>,
    body: Bytes,
) -> ActionReply {
    dispatcher.dispatch(ActionKind::Cancel, query.token.as_deref(), &body).await
}

async fn shuffle(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    Query(query): Query<TokenQuery>,
    body: Bytes,
) -> ActionReply {
    dispatcher.dispatch(ActionKind::Shuffle, query.token.as_deref(), &body).await
}

async fn send(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    Query(query): Query<TokenQuery>,
    body: Bytes,
) -> ActionReply {
    dispatcher.dispatch(ActionKind::Send, query.token.as_deref(), &body).await
}
