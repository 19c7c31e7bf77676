//! Purpose: Hold top-level CLI command dispatch for `numerapi`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Each command maps onto exactly one library helper (download may create its parent first).
//! Invariants: `post` never fails the process; its outcome is reported in the JSON output.

use super::*;
use numerapi::HttpClient;
use numerapi::{ensure_directory_exists, parse_datetime_string, parse_float_string};
use std::sync::Arc;
use std::time::Duration;

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::ParseDate { value } => {
            // Present input never yields `None`.
            let timestamp = parse_datetime_string(Some(value.as_str()))?.ok_or_else(|| {
                Error::new(ErrorKind::Internal).with_message("parser returned no value")
            })?;
            emit_json(json!({
                "input": value,
                "value": timestamp,
                "date": timestamp.date().to_string(),
                "zoned": timestamp.is_zoned(),
            }));
            Ok(RunOutcome::ok())
        }
        Command::ParseNumber { value } => {
            let parsed = parse_float_string(Some(value.as_str())).map(|decimal| decimal.to_string());
            emit_json(json!({ "input": value, "value": parsed }));
            Ok(RunOutcome::ok())
        }
        Command::Mkdir { path } => {
            let existed = path.is_dir();
            ensure_directory_exists(&path)?;
            emit_json(json!({
                "path": path.display().to_string(),
                "created": !existed,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Download {
            url,
            dest,
            no_progress,
            mkdir,
        } => {
            if mkdir {
                if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
                    ensure_directory_exists(parent)?;
                }
            }
            let show_progress = !no_progress && io::stderr().is_terminal();
            let bytes = HttpClient::new().download_file(url.as_str(), &dest, show_progress)?;
            emit_json(json!({
                "url": url.as_str(),
                "path": dest.display().to_string(),
                "bytes": bytes,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Post {
            url,
            data_json,
            headers,
            timeout_ms,
        } => {
            let body: Value = serde_json::from_str(&data_json).map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message("invalid --data-json")
                    .with_hint("Pass a JSON document, e.g. --data-json '{\"query\":\"...\"}'.")
                    .with_source(err)
            })?;
            let client = HttpClient::new().with_notice_sink(Arc::new(StderrNotices));
            let outcome = client.post_with_err_handling(
                url.as_str(),
                &body,
                headers,
                timeout_ms.map(Duration::from_millis),
            );
            emit_json(json!({
                "url": url.as_str(),
                "outcome": outcome.as_str(),
                "body": outcome.body(),
            }));
            Ok(RunOutcome::ok())
        }
    }
}
