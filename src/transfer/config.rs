//! Transfer configuration.
//!
//! [`TransferConfig`] is the fully resolved input to the engine. It is built
//! with [`TransferConfig::builder`], which normalizes the target URL, resolves
//! the output path and forces the request method implied by the body inputs.

use std::path::PathBuf;

use tracing::debug;
use url::Url;

use super::body::DataInputs;
use super::constants::{
    DEFAULT_EXPECT_CONTINUE_TIMEOUT_SECS, DEFAULT_MAX_REDIRECTS, DEFAULT_METHOD,
    DEFAULT_USER_AGENT,
};
use super::error::TransferError;
use super::output::remote_name;

/// Resolved configuration for one transfer.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Normalized target URL.
    pub url: Url,
    /// Output file; `None` writes to stdout.
    pub output: Option<PathBuf>,
    /// Request method after upload/data forcing.
    pub method: String,
    /// Raw `-H` arguments in command-line order.
    pub header_directives: Vec<String>,
    /// Categorized `--data*` inputs.
    pub data: DataInputs,
    /// File to `PUT`.
    pub upload_file: Option<PathBuf>,
    /// Follow `3xx` responses.
    pub follow_redirects: bool,
    /// Maximum redirects followed when `follow_redirects` is set.
    pub max_redirects: u32,
    /// Raw `--cookie` argument.
    pub cookie_source: Option<String>,
    /// Where to write the cookie jar after the transfer.
    pub cookie_jar_path: Option<PathBuf>,
    /// Wall-clock budget in seconds; `0` disables it.
    pub max_time_secs: u64,
    /// Requested `100 Continue` wait for uploads. Recorded and logged only:
    /// the HTTP client has no setting for it, so it is not applied.
    pub expect_continue_timeout_secs: u64,
    /// Suppress progress output.
    pub silent: bool,
    /// Echo request and response headers to stderr.
    pub verbose: bool,
    /// Set the output file's mtime from `Last-Modified`.
    pub preserve_remote_time: bool,
    /// Ask for and decode a gzip response.
    pub compressed: bool,
    /// Default `User-Agent` header value.
    pub user_agent: String,
}

impl TransferConfig {
    /// Starts building a configuration for `target`.
    #[must_use]
    pub fn builder(target: impl Into<String>) -> TransferConfigBuilder {
        TransferConfigBuilder::new(target)
    }

    /// Returns the `host[:port]` authority used for the `Host` header.
    #[must_use]
    pub fn host_header(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}

/// Builder for [`TransferConfig`].
#[derive(Debug, Clone)]
pub struct TransferConfigBuilder {
    target: String,
    output: Option<PathBuf>,
    remote_name: bool,
    method: String,
    header_directives: Vec<String>,
    data: DataInputs,
    upload_file: Option<PathBuf>,
    follow_redirects: bool,
    max_redirects: u32,
    cookie_source: Option<String>,
    cookie_jar_path: Option<PathBuf>,
    max_time_secs: u64,
    expect_continue_timeout_secs: u64,
    silent: bool,
    verbose: bool,
    preserve_remote_time: bool,
    compressed: bool,
    user_agent: String,
}

impl TransferConfigBuilder {
    fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            output: None,
            remote_name: false,
            method: DEFAULT_METHOD.to_string(),
            header_directives: Vec::new(),
            data: DataInputs::default(),
            upload_file: None,
            follow_redirects: false,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            cookie_source: None,
            cookie_jar_path: None,
            max_time_secs: 0,
            expect_continue_timeout_secs: DEFAULT_EXPECT_CONTINUE_TIMEOUT_SECS,
            silent: false,
            verbose: false,
            preserve_remote_time: false,
            compressed: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Output file; `None` or an empty path writes to stdout.
    #[must_use]
    pub fn output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    /// Derive the output file name from the URL. Overrides [`Self::output`].
    #[must_use]
    pub fn remote_name(mut self, remote_name: bool) -> Self {
        self.remote_name = remote_name;
        self
    }

    /// Request method used when no body forces one.
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Header directives in command-line order.
    #[must_use]
    pub fn header_directives(mut self, directives: Vec<String>) -> Self {
        self.header_directives = directives;
        self
    }

    /// Form data inputs.
    #[must_use]
    pub fn data(mut self, data: DataInputs) -> Self {
        self.data = data;
        self
    }

    /// File to upload with `PUT`.
    #[must_use]
    pub fn upload_file(mut self, path: Option<PathBuf>) -> Self {
        self.upload_file = path;
        self
    }

    /// Follow redirects.
    #[must_use]
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Redirect limit.
    #[must_use]
    pub fn max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = max;
        self
    }

    /// Raw `--cookie` argument.
    #[must_use]
    pub fn cookie_source(mut self, source: Option<String>) -> Self {
        self.cookie_source = source;
        self
    }

    /// Cookie jar output path.
    #[must_use]
    pub fn cookie_jar_path(mut self, path: Option<PathBuf>) -> Self {
        self.cookie_jar_path = path;
        self
    }

    /// Wall-clock budget in seconds.
    #[must_use]
    pub fn max_time_secs(mut self, secs: u64) -> Self {
        self.max_time_secs = secs;
        self
    }

    /// Requested `100 Continue` wait in seconds (recorded, not applied).
    #[must_use]
    pub fn expect_continue_timeout_secs(mut self, secs: u64) -> Self {
        self.expect_continue_timeout_secs = secs;
        self
    }

    /// Suppress progress output.
    #[must_use]
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Echo headers.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Stamp the output file with the remote `Last-Modified` time.
    #[must_use]
    pub fn preserve_remote_time(mut self, preserve: bool) -> Self {
        self.preserve_remote_time = preserve;
        self
    }

    /// Request and decode gzip.
    #[must_use]
    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Default `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Validates and resolves the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidUrl`] when the target is not an
    /// `http`/`https` URL, [`TransferError::ConflictingBody`] when both an
    /// upload file and data are set, and [`TransferError::InvalidMethod`] for a
    /// method that is not an HTTP token.
    pub fn build(self) -> Result<TransferConfig, TransferError> {
        let url = normalize_url(&self.target)?;

        if self.upload_file.is_some() && !self.data.is_empty() {
            return Err(TransferError::ConflictingBody);
        }

        let method = if self.upload_file.is_some() {
            "PUT".to_string()
        } else if !self.data.is_empty() {
            "POST".to_string()
        } else {
            self.method
        };
        if reqwest::Method::from_bytes(method.as_bytes()).is_err() {
            return Err(TransferError::InvalidMethod { method });
        }

        let output = if self.remote_name {
            Some(PathBuf::from(remote_name(&url)))
        } else {
            self.output.filter(|path| !path.as_os_str().is_empty())
        };

        debug!(
            url = %url,
            method = %method,
            output = ?output,
            "resolved transfer configuration"
        );

        Ok(TransferConfig {
            url,
            output,
            method,
            header_directives: self.header_directives,
            data: self.data,
            upload_file: self.upload_file,
            follow_redirects: self.follow_redirects,
            max_redirects: self.max_redirects,
            cookie_source: self.cookie_source,
            cookie_jar_path: self.cookie_jar_path,
            max_time_secs: self.max_time_secs,
            expect_continue_timeout_secs: self.expect_continue_timeout_secs,
            silent: self.silent,
            verbose: self.verbose,
            preserve_remote_time: self.preserve_remote_time,
            compressed: self.compressed,
            user_agent: self.user_agent,
        })
    }
}

/// Parses `target`, defaulting the scheme to `http`.
///
/// # Errors
///
/// Returns [`TransferError::InvalidUrl`] when the target does not parse or
/// uses a scheme other than `http`/`https`.
pub fn normalize_url(target: &str) -> Result<Url, TransferError> {
    let trimmed = target.trim();
    // `host:port` parses as a URL with scheme `host`, so test for "://".
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|_| TransferError::invalid_url(target))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        _ => Err(TransferError::invalid_url(target)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_adds_http_scheme() {
        let url = normalize_url("example.com/file.txt").unwrap();
        assert_eq!(url.as_str(), "http://example.com/file.txt");
    }

    #[test]
    fn test_normalize_url_host_port_without_scheme() {
        let url = normalize_url("localhost:8080/x").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.port(), Some(8080));
    }

    #[test]
    fn test_normalize_url_keeps_https() {
        let url = normalize_url("https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_normalize_url_rejects_garbage() {
        let result = normalize_url("http://[::1");
        match result {
            Err(TransferError::InvalidUrl { target }) => assert_eq!(target, "http://[::1"),
            other => panic!("Expected InvalidUrl, got: {other:?}"),
        }
    }

    #[test]
    fn test_normalize_url_rejects_other_schemes() {
        assert!(normalize_url("ftp://example.com/file").is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let config = TransferConfig::builder("http://example.com/").build().unwrap();
        assert_eq!(config.method, "GET");
        assert_eq!(config.max_redirects, 10);
        assert_eq!(config.expect_continue_timeout_secs, 1);
        assert_eq!(config.user_agent, "Curly_Fries/1.0");
        assert!(config.output.is_none());
        assert!(!config.follow_redirects);
        assert!(!config.compressed);
    }

    #[test]
    fn test_builder_upload_forces_put() {
        let config = TransferConfig::builder("http://example.com/")
            .method("DELETE")
            .upload_file(Some(PathBuf::from("file.bin")))
            .build()
            .unwrap();
        assert_eq!(config.method, "PUT");
    }

    #[test]
    fn test_builder_data_forces_post() {
        let config = TransferConfig::builder("http://example.com/")
            .data(DataInputs {
                raw: vec!["a=1".to_string()],
                ..DataInputs::default()
            })
            .build()
            .unwrap();
        assert_eq!(config.method, "POST");
    }

    #[test]
    fn test_builder_upload_and_data_conflict() {
        let result = TransferConfig::builder("http://example.com/")
            .upload_file(Some(PathBuf::from("file.bin")))
            .data(DataInputs {
                ascii: vec!["a=1".to_string()],
                ..DataInputs::default()
            })
            .build();
        assert!(matches!(result, Err(TransferError::ConflictingBody)));
    }

    #[test]
    fn test_builder_rejects_invalid_method() {
        let result = TransferConfig::builder("http://example.com/")
            .method("BAD METHOD")
            .build();
        assert!(matches!(result, Err(TransferError::InvalidMethod { .. })));
    }

    #[test]
    fn test_builder_custom_method_kept_without_body() {
        let config = TransferConfig::builder("http://example.com/")
            .method("DELETE")
            .build()
            .unwrap();
        assert_eq!(config.method, "DELETE");
    }

    #[test]
    fn test_builder_remote_name_overrides_output() {
        let config = TransferConfig::builder("http://example.com/dir/report%20v2.pdf")
            .output(Some(PathBuf::from("explicit.bin")))
            .remote_name(true)
            .build()
            .unwrap();
        assert_eq!(config.output, Some(PathBuf::from("report v2.pdf")));
    }

    #[test]
    fn test_builder_empty_output_means_stdout() {
        let config = TransferConfig::builder("http://example.com/")
            .output(Some(PathBuf::new()))
            .build()
            .unwrap();
        assert!(config.output.is_none());
    }

    #[test]
    fn test_host_header_includes_explicit_port() {
        let config = TransferConfig::builder("http://127.0.0.1:8080/x").build().unwrap();
        assert_eq!(config.host_header(), "127.0.0.1:8080");

        let config = TransferConfig::builder("http://example.com/x").build().unwrap();
        assert_eq!(config.host_header(), "example.com");
    }
}
