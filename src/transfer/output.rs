//! Transfer destination: an output file or stdout.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use url::Url;

use super::error::TransferError;

/// Where the response body goes.
#[derive(Debug)]
pub enum Destination {
    /// Process standard output.
    Stdout(tokio::io::Stdout),
    /// A created (or truncated) file.
    File {
        /// The output path.
        path: PathBuf,
        /// The open file.
        file: tokio::fs::File,
    },
}

impl Destination {
    /// Opens `path` for writing, creating it if absent; `None` means stdout.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Output`] if the file cannot be created.
    pub async fn open(path: Option<&Path>) -> Result<Self, TransferError> {
        match path {
            None => Ok(Self::Stdout(tokio::io::stdout())),
            Some(path) => {
                let file = tokio::fs::File::create(path)
                    .await
                    .map_err(|e| TransferError::output(path, e))?;
                Ok(Self::File {
                    path: path.to_path_buf(),
                    file,
                })
            }
        }
    }

    /// The output path, if writing to a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Stdout(_) => None,
            Self::File { path, .. } => Some(path),
        }
    }

    /// The writer to copy into.
    pub fn writer(&mut self) -> &mut (dyn AsyncWrite + Unpin + Send) {
        match self {
            Self::Stdout(stdout) => stdout,
            Self::File { file, .. } => file,
        }
    }

    /// Flushes and closes the destination.
    ///
    /// # Errors
    ///
    /// Returns the IO error from the final flush or sync.
    pub async fn close(self) -> std::io::Result<()> {
        match self {
            Self::Stdout(mut stdout) => stdout.flush().await,
            Self::File { mut file, .. } => {
                file.flush().await?;
                file.sync_all().await
            }
        }
    }
}

/// File name for `--remote-name`.
///
/// Uses the last non-empty path segment, percent-decoded; falls back to the
/// host when the path has none.
#[must_use]
pub fn remote_name(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(|s| {
            urlencoding::decode(s)
                .map(std::borrow::Cow::into_owned)
                .unwrap_or_else(|_| s.to_string())
        })
        .map(|s| s.replace(['/', '\\'], "_"))
        .filter(|s| !s.is_empty() && s != "." && s != "..");

    segment.unwrap_or_else(|| url.host_str().unwrap_or("index").to_string())
}
