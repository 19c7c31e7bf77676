//! Purpose: Structured, non-fatal diagnostics emitted by best-effort operations.
//! Exports: `Notice`, `NoticeKind`, `NoticeSink`, `TracingSink`, `notice_json`.
//! Role: Injectable logging port; callers choose where absorbed failures are recorded.
//! Invariants: Emitting a notice never fails and never alters an operation's result.
//! Invariants: JSON schema is additive-only (`notice.{kind,time,op,url,message,details}`).

use serde_json::{Map, Value, json};
use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeKind {
    /// Server answered with a 4xx/5xx status.
    Http,
    Connect,
    Timeout,
    /// Any other request failure (bad url, tls, protocol).
    Request,
    /// The request body could not be serialized; nothing was sent.
    Encode,
    InvalidJson,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Http => "http",
            NoticeKind::Connect => "connect",
            NoticeKind::Timeout => "timeout",
            NoticeKind::Request => "request",
            NoticeKind::Encode => "encode",
            NoticeKind::InvalidJson => "invalid-json",
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub time: String,
    pub op: String,
    pub url: String,
    pub message: String,
    pub details: Map<String, Value>,
}

impl Notice {
    pub fn new(
        kind: NoticeKind,
        op: impl Into<String>,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            time: now_rfc3339(),
            op: op.into(),
            url: url.into(),
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Receives absorbed failures. Implementations must not panic.
pub trait NoticeSink: Send + Sync {
    fn emit(&self, notice: &Notice);
}

/// Default sink: one `tracing` error event per notice.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl NoticeSink for TracingSink {
    fn emit(&self, notice: &Notice) {
        tracing::error!(
            kind = notice.kind.as_str(),
            op = %notice.op,
            url = %notice.url,
            "{}",
            notice.message
        );
    }
}

pub fn notice_json(notice: &Notice) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(notice.kind.as_str()));
    inner.insert("time".to_string(), json!(notice.time));
    inner.insert("op".to_string(), json!(notice.op));
    inner.insert("url".to_string(), json!(notice.url));
    inner.insert("message".to_string(), json!(notice.message));
    inner.insert("details".to_string(), Value::Object(notice.details.clone()));

    let mut outer = Map::new();
    outer.insert("notice".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{Notice, NoticeKind, NoticeSink, TracingSink, notice_json};

    #[test]
    fn notice_json_has_required_fields() {
        let notice = Notice::new(
            NoticeKind::Http,
            "post",
            "http://localhost:8080/graphql",
            "Http Error: status code 500",
        )
        .with_detail("status", 500);

        let value = notice_json(&notice);
        let obj = value
            .get("notice")
            .and_then(|v| v.as_object())
            .expect("notice object");

        assert_eq!(obj.get("kind").and_then(|v| v.as_str()), Some("http"));
        assert_eq!(obj.get("op").and_then(|v| v.as_str()), Some("post"));
        assert_eq!(
            obj.get("url").and_then(|v| v.as_str()),
            Some("http://localhost:8080/graphql")
        );
        assert_eq!(
            obj.get("message").and_then(|v| v.as_str()),
            Some("Http Error: status code 500")
        );
        assert_eq!(obj["details"]["status"], 500);
        let time = obj.get("time").and_then(|v| v.as_str()).expect("time");
        assert!(time.ends_with('Z'));
    }

    #[test]
    fn kind_labels_are_stable() {
        let cases = [
            (NoticeKind::Http, "http"),
            (NoticeKind::Connect, "connect"),
            (NoticeKind::Timeout, "timeout"),
            (NoticeKind::Request, "request"),
            (NoticeKind::Encode, "encode"),
            (NoticeKind::InvalidJson, "invalid-json"),
        ];
        for (kind, label) in cases {
            assert_eq!(kind.to_string(), label);
        }
    }

    #[test]
    fn tracing_sink_without_subscriber_is_silent() {
        TracingSink.emit(&Notice::new(NoticeKind::Connect, "post", "http://x", "refused"));
    }
}
