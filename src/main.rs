//! Purpose: `numerapi` CLI entry point exposing the helper library from a shell.
//! Role: Binary crate root; parses args, runs one helper, emits JSON on stdout.
//! Invariants: Successful commands print exactly one JSON document on stdout.
//! Invariants: Errors are emitted on stderr (JSON when stderr is not a terminal).
//! Invariants: Process exit code is derived from `to_exit_code`.
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;
use url::Url;

mod command_dispatch;

use numerapi::notice::{Notice, NoticeSink, notice_json};
use numerapi::{Error, ErrorKind, to_exit_code};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome { exit_code });
            }
            _ => {
                let message = err.kind().as_str().unwrap_or("invalid arguments");
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(message)
                    .with_hint(clap_error_hint(&err)));
            }
        },
    };

    command_dispatch::dispatch_command(cli.command)
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    rendered
        .lines()
        .find(|line| line.trim_start().starts_with("error:"))
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| "Run `numerapi --help` for usage.".to_string())
}

#[derive(Parser)]
#[command(
    name = "numerapi",
    version,
    about = "Helpers for working with the Numerai data API",
    long_about = None,
    after_help = r#"EXAMPLES
  $ numerapi parse-date "2021-03-04T12:30:00Z"
  $ numerapi parse-number "1,234.5"
  $ numerapi mkdir ./datasets/round_300
  $ numerapi download https://example.com/train.parquet ./datasets/train.parquet
  $ numerapi post https://api-tournament.numer.ai --data-json '{"query":"{ rounds { number } }"}'

Logging is controlled with RUST_LOG (default: warn)."#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Parse a loosely formatted date/time")]
    ParseDate { value: String },
    #[command(about = "Parse a number that may contain thousands separators")]
    ParseNumber { value: String },
    #[command(about = "Create a directory and its parents (no error if it exists)")]
    Mkdir {
        #[arg(value_hint = ValueHint::DirPath)]
        path: PathBuf,
    },
    #[command(about = "Stream a URL to a local file")]
    Download {
        url: Url,
        #[arg(value_hint = ValueHint::FilePath)]
        dest: PathBuf,
        #[arg(long, help = "Do not draw a progress bar on stderr")]
        no_progress: bool,
        #[arg(long, help = "Create the destination's parent directory first")]
        mkdir: bool,
    },
    #[command(about = "POST a JSON body; failures are reported as notices on stderr")]
    Post {
        url: Url,
        #[arg(long = "data-json", help = "Request body as inline JSON")]
        data_json: String,
        #[arg(
            long = "header",
            value_name = "NAME:VALUE",
            value_parser = parse_header,
            help = "Extra request header (repeatable)"
        )]
        headers: Vec<(String, String)>,
        #[arg(long, help = "Overall request timeout in milliseconds")]
        timeout_ms: Option<u64>,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("header {raw:?} must look like NAME:VALUE"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header {raw:?} has an empty name"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Writes notices to stderr: text on a terminal, one JSON line otherwise.
struct StderrNotices;

impl NoticeSink for StderrNotices {
    fn emit(&self, notice: &Notice) {
        if io::stderr().is_terminal() {
            eprintln!("notice: {} ({})", notice.message, notice.url);
            return;
        }
        let json = serde_json::to_string(&notice_json(notice))
            .unwrap_or_else(|_| "{\"notice\":{\"kind\":\"internal\"}}".to_string());
        eprintln!("{json}");
    }
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    println!(
        "{}",
        json.unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    );
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {}", error_message(err));
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
        for cause in error_causes(err) {
            eprintln!("caused by: {cause}");
        }
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::AlreadyExists => "already exists".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Parse => "parse error".to_string(),
        ErrorKind::Http => "http error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(url) = err.url() {
        inner.insert("url".to_string(), json!(url));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

#[cfg(test)]
mod tests {
    use super::{error_json, parse_header};
    use numerapi::{Error, ErrorKind};

    #[test]
    fn parse_header_trims_parts() {
        assert_eq!(
            parse_header("Authorization: Token abc:def").expect("header"),
            ("Authorization".to_string(), "Token abc:def".to_string())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(" :value").is_err());
    }

    #[test]
    fn error_json_includes_http_context() {
        let err = Error::new(ErrorKind::Http)
            .with_message("404 client error: Not Found")
            .with_status(404)
            .with_url("http://localhost/x");
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "Http");
        assert_eq!(value["error"]["status"], 404);
        assert_eq!(value["error"]["url"], "http://localhost/x");
        assert!(value["error"].get("causes").is_none());
    }
}
