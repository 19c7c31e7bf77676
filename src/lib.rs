//! Purpose: Helper library for a remote data API wrapper.
//! Exports: `core` (errors), `parse`, `record`, `paths`, `http`, `notice`.
//! Role: Stateless utilities shared by the `numerapi` CLI and API callers.
//! Invariants: Each operation is independent; no hidden global state.
//! Invariants: Best-effort paths report through an injected `NoticeSink`, not a global logger.
pub mod core;
pub mod http;
pub mod notice;
pub mod parse;
pub mod paths;
pub mod record;

pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use crate::http::{HttpClient, PostOutcome, download_file, post_with_err_handling};
pub use crate::parse::{Timestamp, parse_datetime_string, parse_float_string};
pub use crate::paths::ensure_directory_exists;
pub use crate::record::replace;
