//! Purpose: Stream an HTTP GET response body into a local file.
//! Exports: `HttpClient::download_file`, `HttpClient::download_file_with_progress`, `CHUNK_SIZE`.
//! Role: Dataset download path; fail-fast on HTTP status and io errors.
//! Invariants: The destination is created/truncated only after a success status.
//! Invariants: Partial output is left on disk when the stream fails midway.
//! Invariants: Progress totals come from `Content-Length`; missing or malformed means 0.

use super::progress::{Hidden, Progress, ProgressBar};
use super::{HttpClient, status_message};
use crate::core::error::{Error, ErrorKind, kind_from_io};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub const CHUNK_SIZE: usize = 1024;

impl HttpClient {
    /// Downloads `url` to `dest_path`, returning the number of bytes written.
    ///
    /// With `show_progress` a bar labelled with the destination is drawn on stderr.
    pub fn download_file(
        &self,
        url: &str,
        dest_path: impl AsRef<Path>,
        show_progress: bool,
    ) -> Result<u64, Error> {
        if show_progress {
            self.download_file_with_progress(url, dest_path, &mut ProgressBar::stderr())
        } else {
            self.download_file_with_progress(url, dest_path, &mut Hidden)
        }
    }

    pub fn download_file_with_progress(
        &self,
        url: &str,
        dest_path: impl AsRef<Path>,
        progress: &mut dyn Progress,
    ) -> Result<u64, Error> {
        let dest_path = dest_path.as_ref();
        let response = match self.agent().get(url).call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                return Err(Error::new(ErrorKind::Http)
                    .with_message(status_message(code, resp.status_text()))
                    .with_status(code)
                    .with_url(url));
            }
            Err(ureq::Error::Transport(err)) => {
                let kind = match err.kind() {
                    ureq::ErrorKind::InvalidUrl | ureq::ErrorKind::UnknownScheme => {
                        ErrorKind::Usage
                    }
                    _ => ErrorKind::Io,
                };
                return Err(Error::new(kind)
                    .with_message("request failed")
                    .with_url(url)
                    .with_source(err));
            }
        };
        let total = content_length(&response);
        tracing::debug!(url, path = %dest_path.display(), total, "download started");

        let mut file = File::create(dest_path).map_err(|err| {
            Error::new(kind_from_io(&err))
                .with_message("failed to create destination file")
                .with_path(dest_path)
                .with_source(err)
        })?;
        let mut reader = response.into_reader();

        progress.start(&dest_path.display().to_string(), total);
        let copied = copy_chunks(&mut reader, &mut file, progress);
        progress.finish();

        let written = copied.map_err(|err| err.with_url(url).with_path(dest_path))?;
        tracing::debug!(url, path = %dest_path.display(), written, "download finished");
        Ok(written)
    }
}

fn content_length(response: &ureq::Response) -> u64 {
    response
        .header("Content-Length")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

fn copy_chunks(
    reader: &mut dyn Read,
    file: &mut File,
    progress: &mut dyn Progress,
) -> Result<u64, Error> {
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                return Err(Error::new(ErrorKind::Io)
                    .with_message("failed to read response body")
                    .with_source(err));
            }
        };
        file.write_all(&chunk[..read]).map_err(|err| {
            Error::new(kind_from_io(&err))
                .with_message("failed to write destination file")
                .with_source(err)
        })?;
        written += read as u64;
        progress.advance(read as u64);
    }
    file.flush().map_err(|err| {
        Error::new(kind_from_io(&err))
            .with_message("failed to flush destination file")
            .with_source(err)
    })?;
    Ok(written)
}
