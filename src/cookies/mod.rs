//! Cookie state for one transfer.
//!
//! Cookies are loaded before the request from a literal `name=value` list or a
//! JSON file, handed to the HTTP client as its cookie store, and optionally
//! written back as JSON after the response.

mod jar;
mod persist;

use std::path::{Path, PathBuf};

pub use jar::{Cookie, CookieJar, parse_set_cookie};
pub use persist::{
    CookieSource, load_cookie_jar, parse_cookie_literal, read_cookie_file, save_cookie_jar,
};

/// Errors that can occur while loading or persisting cookies.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// The cookie file could not be read.
    #[error("unable to read cookie file '{path}': {source}")]
    Read {
        /// The cookie file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The cookie file is not a JSON array of cookie objects.
    #[error("unable to decode cookie file '{path}': {source}")]
    Decode {
        /// The cookie file path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The jar could not be serialized.
    #[error("unable to encode cookies: {0}")]
    Encode(#[source] serde_json::Error),

    /// The cookie jar file could not be written.
    #[error("unable to write cookie jar '{path}': {source}")]
    Write {
        /// The cookie jar path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl CookieError {
    /// Creates a read error.
    pub fn read(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a decode error.
    pub fn decode(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Decode {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a write error.
    pub fn write(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
