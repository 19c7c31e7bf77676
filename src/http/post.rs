//! Purpose: Best-effort JSON POST that records failures instead of returning them.
//! Exports: `PostOutcome`, `HttpClient::post_with_err_handling`.
//! Role: Fire-and-inspect calls where the caller only wants whatever JSON came back.
//! Invariants: Never returns an error; every absorbed failure emits exactly one notice.
//! Invariants: Error-status responses still have their body parsed.
//! Notes: `Body` does not tell success from an error status carrying JSON.

use super::{HttpClient, status_message};
use crate::notice::{Notice, NoticeKind};
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::io::Read;
use std::time::Duration;

const OP: &str = "post";

#[derive(Clone, Debug, PartialEq)]
pub enum PostOutcome {
    /// No response exists (nothing sent, or the exchange never completed).
    NotSent,
    /// A response arrived but its body was not valid JSON.
    InvalidJson,
    Body(Value),
}

impl PostOutcome {
    pub fn body(&self) -> Option<&Value> {
        match self {
            PostOutcome::Body(value) => Some(value),
            _ => None,
        }
    }

    /// Historic shape: nothing, an empty object, or the parsed body.
    pub fn into_legacy(self) -> Option<Value> {
        match self {
            PostOutcome::NotSent => None,
            PostOutcome::InvalidJson => Some(Value::Object(Map::new())),
            PostOutcome::Body(value) => Some(value),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostOutcome::NotSent => "not-sent",
            PostOutcome::InvalidJson => "invalid-json",
            PostOutcome::Body(_) => "body",
        }
    }
}

impl HttpClient {
    /// POSTs `body` as JSON with the given headers and optional overall timeout.
    pub fn post_with_err_handling<T, I, K, V>(
        &self,
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
        let payload = match serde_json::to_string(body) {
            Ok(payload) => payload,
            Err(err) => {
                self.emit(Notice::new(
                    NoticeKind::Encode,
                    OP,
                    url,
                    format!("failed to encode request json: {err}"),
                ));
                return PostOutcome::NotSent;
            }
        };

        let mut request = self
            .agent()
            .post(url)
            .set("Content-Type", "application/json");
        for (name, value) in headers {
            request = request.set(name.as_ref(), value.as_ref());
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = match request.send_string(&payload) {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                self.emit(
                    Notice::new(
                        NoticeKind::Http,
                        OP,
                        url,
                        format!("http error: {}", status_message(code, resp.status_text())),
                    )
                    .with_detail("status", code),
                );
                resp
            }
            Err(ureq::Error::Transport(err)) => {
                let kind = classify_transport(&err);
                let label = match kind {
                    NoticeKind::Connect => "error connecting",
                    NoticeKind::Timeout => "timeout error",
                    _ => "request failed",
                };
                self.emit(Notice::new(kind, OP, url, format!("{label}: {err}")));
                return PostOutcome::NotSent;
            }
        };

        // Raw bytes: undecodable text is a JSON problem, not a transport one.
        let mut raw = Vec::new();
        if let Err(err) = response.into_reader().read_to_end(&mut raw) {
            let kind = if is_timeout(&err) {
                NoticeKind::Timeout
            } else {
                NoticeKind::Request
            };
            self.emit(Notice::new(
                kind,
                OP,
                url,
                format!("failed to read response body: {err}"),
            ));
            return PostOutcome::NotSent;
        }

        match serde_json::from_slice(&raw) {
            Ok(value) => PostOutcome::Body(value),
            Err(err) => {
                self.emit(
                    Notice::new(
                        NoticeKind::InvalidJson,
                        OP,
                        url,
                        format!("did not receive valid json: {err}"),
                    )
                    .with_detail("body_bytes", raw.len()),
                );
                PostOutcome::InvalidJson
            }
        }
    }
}

fn classify_transport(err: &ureq::Transport) -> NoticeKind {
    let timed_out = err
        .source()
        .and_then(|source| source.downcast_ref::<std::io::Error>())
        .is_some_and(is_timeout);
    if timed_out {
        return NoticeKind::Timeout;
    }
    match err.kind() {
        ureq::ErrorKind::Dns | ureq::ErrorKind::ConnectionFailed => NoticeKind::Connect,
        _ => NoticeKind::Request,
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
    )
}
