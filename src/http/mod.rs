//! Purpose: Blocking HTTP helpers for talking to the remote data API.
//! Exports: `HttpClient`, `PostOutcome`, progress types, default-client free functions.
//! Role: Owns the `ureq` agent and the notice sink used by best-effort requests.
//! Invariants: Clients are cheap to clone and hold no per-request state.
//! Invariants: Library code never installs a tracing subscriber; it only emits events.

mod download;
mod post;
pub mod progress;

use crate::core::error::Error;
use crate::notice::{Notice, NoticeSink, TracingSink};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub use download::CHUNK_SIZE;
pub use post::PostOutcome;
pub use progress::{Hidden, Progress, ProgressBar};

pub const DEFAULT_USER_AGENT: &str = concat!("numerapi/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    agent: ureq::Agent,
    sink: Arc<dyn NoticeSink>,
}

impl HttpClient {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(DEFAULT_USER_AGENT)
            .build();
        Self {
            inner: Arc::new(HttpClientInner {
                agent,
                sink: Arc::new(TracingSink),
            }),
        }
    }

    pub fn with_agent(mut self, agent: ureq::Agent) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.agent = agent;
        } else {
            self.inner = Arc::new(HttpClientInner {
                agent,
                sink: self.inner.sink.clone(),
            });
        }
        self
    }

    pub fn with_user_agent(self, user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new().user_agent(user_agent).build();
        self.with_agent(agent)
    }

    /// Routes absorbed request failures to `sink` instead of `tracing`.
    pub fn with_notice_sink(mut self, sink: Arc<dyn NoticeSink>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.sink = sink;
        } else {
            self.inner = Arc::new(HttpClientInner {
                agent: self.inner.agent.clone(),
                sink,
            });
        }
        self
    }

    fn agent(&self) -> &ureq::Agent {
        &self.inner.agent
    }

    fn emit(&self, notice: Notice) {
        self.inner.sink.emit(&notice);
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// [`HttpClient::download_file`] with a default client.
pub fn download_file(
    url: &str,
    dest_path: impl AsRef<Path>,
    show_progress: bool,
) -> Result<u64, Error> {
    HttpClient::new().download_file(url, dest_path, show_progress)
}

/// [`HttpClient::post_with_err_handling`] with a default client (notices go to `tracing`).
pub fn post_with_err_handling<T, I, K, V>(
    url: &str,
    body: &T,
    headers: I,
    timeout: Option<Duration>,
) -> PostOutcome
where
    T: Serialize + ?Sized,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    HttpClient::new().post_with_err_handling(url, body, headers, timeout)
}

fn status_message(code: u16, status_text: &str) -> String {
    let class = if (400..500).contains(&code) {
        "client"
    } else {
        "server"
    };
    format!("{code} {class} error: {status_text}")
}
