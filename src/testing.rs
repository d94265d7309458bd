//! Test doubles: a provider that plays back a script, and a chat host that
//! writes down everything it was asked to do.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::{async_trait, Router};

use crate::config::Config;
use crate::errors::{HostOperationError, ProviderError};
use crate::faces::{MessagingHost, Post};
use crate::providers::{GifProvider, MediaCandidate};
use crate::shuffler::Shuffler;

/// Each search pops the next scripted result: `Ok(url)` or `Err(cause)`.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<&str, &str>>) -> Arc<Self> {
        let script = script
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Arc::new(Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every `(keywords, attempt)` we were asked for, in order.
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GifProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn search(&self, keywords: &str, attempt: u32) -> Result<MediaCandidate, ProviderError> {
        self.calls.lock().unwrap().push((keywords.to_string(), attempt));
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(url)) => Ok(MediaCandidate { url }),
            Some(Err(cause)) => Err(ProviderError::new(cause)),
            None => Err(ProviderError::new("the script ran out")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    SendEphemeral { user_id: String, post: Post },
    UpdateEphemeral { user_id: String, post: Post },
    DeleteEphemeral { user_id: String, post_id: String },
    Create(Post),
}

#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
    fail_creates: AtomicBool,
    fail_deletes: AtomicBool,
}

impl RecordingHost {
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MessagingHost for RecordingHost {
    async fn send_ephemeral_post(
        &self,
        user_id: &str,
        post: &Post,
    ) -> Result<(), HostOperationError> {
        self.record(HostCall::SendEphemeral {
            user_id: user_id.to_string(),
            post: post.clone(),
        });
        Ok(())
    }

    async fn update_ephemeral_post(
        &self,
        user_id: &str,
        post: &Post,
    ) -> Result<(), HostOperationError> {
        self.record(HostCall::UpdateEphemeral {
            user_id: user_id.to_string(),
            post: post.clone(),
        });
        Ok(())
    }

    async fn delete_ephemeral_post(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> Result<(), HostOperationError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(HostOperationError::new("HTTP Status: 500"));
        }
        self.record(HostCall::DeleteEphemeral {
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
        });
        Ok(())
    }

    async fn create_post(&self, post: &Post) -> Result<Post, HostOperationError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(HostOperationError::new("HTTP Status: 403"));
        }
        self.record(HostCall::Create(post.clone()));
        Ok(Post {
            id: "created1".to_string(),
            ..post.clone()
        })
    }
}

/// A shuffler wired to fakes, with the fakes handed back for inspection.
pub fn harness(
    script: Vec<Result<&str, &str>>,
) -> (Shuffler, Arc<ScriptedProvider>, Arc<RecordingHost>) {
    let provider = ScriptedProvider::new(script);
    let host = Arc::new(RecordingHost::default());
    let shuffler = Shuffler::new(Arc::new(Config::for_tests()), provider.clone(), host.clone())
        .expect("test triggers are valid");
    (shuffler, provider, host)
}

/// Serve `app` on a free local port and hand back its base URL.
pub fn serve(app: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("a free local port");
    let addr = listener.local_addr().expect("a bound address");
    let server = axum::Server::from_tcp(listener)
        .expect("a listening socket")
        .serve(app.into_make_service());
    tokio::spawn(server);
    format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("a free local port");
    let addr = listener.local_addr().expect("a bound address");
    drop(listener);
    format!("http://{addr}")
}
