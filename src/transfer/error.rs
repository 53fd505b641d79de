//! Error types for the transfer module.
//!
//! Every failure the engine can hit is fatal for the invocation. The variants
//! are grouped into [`ErrorCategory`] so the CLI can pick an exit status
//! without matching on individual variants.

use std::path::PathBuf;

use thiserror::Error;

use crate::cookies::CookieError;

/// Broad classification of a [`TransferError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input detected before or while building the request.
    Configuration,
    /// Connection, protocol, or streaming failure.
    Transport,
    /// The `--max-time` watchdog expired.
    Timeout,
}

/// Errors that can occur while building or executing a transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The target could not be parsed as a URL, even with a default scheme.
    #[error("{target} does not parse correctly as a URL")]
    InvalidUrl {
        /// The raw target string.
        target: String,
    },

    /// The request method is not a valid HTTP token.
    #[error("unable to create http {method} request; invalid method")]
    InvalidMethod {
        /// The rejected method string.
        method: String,
    },

    /// A header name or value cannot be sent on the wire.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as given by the user.
        name: String,
        /// Why the header was rejected.
        reason: String,
    },

    /// Both an upload file and data inputs were supplied.
    #[error("--upload-file cannot be combined with --data options; choose one request body")]
    ConflictingBody,

    /// A `key=@file` data reference could not be read.
    #[error("unable to read file {path} for data element {key}: {source}")]
    DataFile {
        /// The data element key.
        key: String,
        /// The referenced file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The upload file could not be opened or inspected.
    #[error("unable to open {path} for upload: {source}")]
    Upload {
        /// The upload file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The output file could not be created.
    #[error("unable to create file '{path}' for output: {source}")]
    Output {
        /// The output file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Cookie source could not be loaded or the jar could not be written.
    #[error(transparent)]
    Cookie(#[from] CookieError),

    /// The HTTP client could not be constructed.
    #[error("unable to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("unable to get URL {url}: {source}")]
    Network {
        /// The URL being transferred.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The transport gave up waiting on the server.
    #[error("timeout transferring {url}")]
    Timeout {
        /// The URL being transferred.
        url: String,
    },

    /// Reading the source or writing the destination failed mid-copy.
    #[error("failed to copy URL content from {url}: {source}")]
    Copy {
        /// The URL being transferred.
        url: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The `--max-time` budget elapsed before the transfer completed.
    #[error("maximum operation time of {seconds} seconds expired, aborting")]
    MaxTimeExpired {
        /// The configured budget in seconds.
        seconds: u64,
    },
}

impl TransferError {
    /// Creates an invalid URL error.
    pub fn invalid_url(target: impl Into<String>) -> Self {
        Self::InvalidUrl {
            target: target.into(),
        }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a data file read error.
    pub fn data_file(
        key: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::DataFile {
            key: key.into(),
            path: path.into(),
            source,
        }
    }

    /// Creates an upload file error.
    pub fn upload(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Upload {
            path: path.into(),
            source,
        }
    }

    /// Creates an output file error.
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }

    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates a copy error.
    pub fn copy(url: impl Into<String>, source: std::io::Error) -> Self {
        Self::Copy {
            url: url.into(),
            source,
        }
    }

    /// Returns the broad category used to pick the process exit status.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUrl { .. }
            | Self::InvalidMethod { .. }
            | Self::InvalidHeader { .. }
            | Self::ConflictingBody
            | Self::DataFile { .. }
            | Self::Upload { .. }
            | Self::Output { .. }
            | Self::Cookie(_) => ErrorCategory::Configuration,
            Self::Client { .. }
            | Self::Network { .. }
            | Self::Timeout { .. }
            | Self::Copy { .. } => ErrorCategory::Transport,
            Self::MaxTimeExpired { .. } => ErrorCategory::Timeout,
        }
    }
}
