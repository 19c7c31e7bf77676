//! Purpose: Filesystem path helpers shared by downloads and the CLI.
//! Exports: `ensure_directory_exists`.
//! Role: Idempotent directory preparation before files are written.
//! Invariants: An existing directory is success; an existing non-directory is an error.
//! Invariants: Errors carry the offending path and the underlying io error.

use crate::core::error::{Error, ErrorKind, kind_from_io};
use std::path::Path;

/// Creates `path` and any missing parents.
pub fn ensure_directory_exists(path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        // Lost a race with another creator.
        Err(_) if path.is_dir() => Ok(()),
        Err(err) => {
            let kind = kind_from_io(&err);
            let mut error = Error::new(kind)
                .with_message("failed to create directory")
                .with_path(path);
            if kind == ErrorKind::AlreadyExists {
                error = error.with_hint("The path exists but is not a directory.");
            }
            Err(error.with_source(err))
        }
    }
}
