use axum::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

use super::{MessagingHost, Post};
use crate::errors::HostOperationError;

/// Talks to a Mattermost server over its v4 REST API as a bot account.
pub struct MattermostFace {
    http: Client,
    /// e.g. `https://chat.example.com`, no trailing slash
    base_url: String,
    /// the bot access token we must send to the server
    token: String,
}

#[derive(Serialize)]
struct EphemeralRequest<'a> {
    user_id: &'a str,
    post: &'a Post,
}

impl MattermostFace {
    pub fn new(base_url: String, token: String) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("gifshuffle/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base_url, token })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v4{path}", self.base_url)
    }

    async fn send(
        &self,
        what: &str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, HostOperationError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| HostOperationError::with_source(format!("Unable to {what}"), e))?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            log::error!("error trying to {what}: HTTP {status}: {body}");
            Err(HostOperationError::new(format!("Unable to {what} (HTTP Status: {status})")))
        }
    }
}

#[async_trait]
impl MessagingHost for MattermostFace {
    async fn send_ephemeral_post(
        &self,
        user_id: &str,
        post: &Post,
    ) -> Result<(), HostOperationError> {
        let body = EphemeralRequest { user_id, post };
        let request = self.http.post(self.url("/posts/ephemeral")).json(&body);
        self.send("send ephemeral post", request).await?;
        Ok(())
    }

    // The server treats an ephemeral post carrying a known id as a replacement.
    async fn update_ephemeral_post(
        &self,
        user_id: &str,
        post: &Post,
    ) -> Result<(), HostOperationError> {
        let body = EphemeralRequest { user_id, post };
        let request = self.http.post(self.url("/posts/ephemeral")).json(&body);
        self.send("update ephemeral post", request).await?;
        Ok(())
    }

    async fn delete_ephemeral_post(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> Result<(), HostOperationError> {
        log::debug!("deleting post {post_id} shown to {user_id}");
        let request = self.http.delete(self.url(&format!("/posts/{post_id}")));
        self.send("delete ephemeral post", request).await?;
        Ok(())
    }

    async fn create_post(&self, post: &Post) -> Result<Post, HostOperationError> {
        let response = self
            .send("create post", self.http.post(self.url("/posts")).json(post))
            .await?;
        response
            .json::<Post>()
            .await
            .map_err(|e| HostOperationError::with_source("Could not parse the created post", e))
    }
}
