//! Transfer execution.
//!
//! [`TransferSession`] owns the HTTP client for one invocation together with
//! the redirect policy and cookie jar the client consults. [`TransferSession::execute`]
//! runs the whole request/response cycle and its post-transfer side effects.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::TryStreamExt;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use tokio_util::io::StreamReader;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::body::{BodyPlan, plan_body};
use super::config::TransferConfig;
use super::constants::CONNECT_TIMEOUT_SECS;
use super::error::TransferError;
use super::headers::{HeaderDirective, HeaderSet, apply_directives};
use super::output::Destination;
use super::progress::{Direction, SourceReader, copy_to};
use super::redirect::RedirectPolicy;
use super::timestamp::apply_remote_time;
use super::verbose::{write_request_echo, write_response_echo};
use crate::cookies::{CookieJar, load_cookie_jar, save_cookie_jar};

/// Summary of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Status of the final response (a surfaced redirect included).
    pub status: StatusCode,
    /// URL of the final response.
    pub final_url: Url,
    /// Body bytes written to the destination.
    pub bytes_written: u64,
    /// Redirects followed.
    pub redirects_taken: u32,
    /// Output file, or `None` for stdout.
    pub output_path: Option<PathBuf>,
}

/// HTTP client plus per-invocation redirect and cookie state.
#[derive(Debug)]
pub struct TransferSession {
    client: Client,
    cookie_jar: Option<Arc<CookieJar>>,
    redirect: Arc<RedirectPolicy>,
}

impl TransferSession {
    /// Loads cookies and builds the HTTP client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Cookie`] when the cookie source cannot be
    /// loaded and [`TransferError::Client`] when the client cannot be built.
    #[instrument(level = "debug", skip(config), fields(url = %config.url))]
    pub async fn new(config: &TransferConfig) -> Result<Self, TransferError> {
        let cookie_jar = load_cookie_jar(
            config.cookie_source.as_deref(),
            config.cookie_jar_path.as_deref(),
            &config.url,
        )
        .await?;
        let redirect = Arc::new(RedirectPolicy::new(
            config.follow_redirects,
            config.max_redirects,
        ));

        let client = build_client(config, cookie_jar.as_ref(), &redirect)
            .map_err(|source| TransferError::Client { source })?;

        Ok(Self {
            client,
            cookie_jar,
            redirect,
        })
    }

    /// Redirects followed so far.
    #[must_use]
    pub fn redirects_taken(&self) -> u32 {
        self.redirect.redirects_taken()
    }

    /// The cookie jar, when cookies are in play.
    #[must_use]
    pub fn cookie_jar(&self) -> Option<&Arc<CookieJar>> {
        self.cookie_jar.as_ref()
    }

    /// Runs the transfer described by `config`.
    ///
    /// Opens the destination, builds and sends the request, streams the
    /// response body into the destination, then persists cookies and stamps
    /// the output file's mtime when configured. Non-2xx responses are written
    /// like any other.
    ///
    /// # Errors
    ///
    /// Returns the first configuration, transport, or copy failure.
    #[instrument(skip(self, config), fields(method = %config.method, url = %config.url))]
    pub async fn execute(&self, config: &TransferConfig) -> Result<TransferOutcome, TransferError> {
        let url = config.url.as_str();
        let mut destination = Destination::open(config.output.as_deref()).await?;
        let plan = plan_body(config).await?;
        let headers = request_headers(config, &plan);

        if config.upload_file.is_some() {
            debug!(
                expect_continue_timeout_secs = config.expect_continue_timeout_secs,
                "upload announces Expect: 100-continue; the client does not apply a wait timeout"
            );
        }

        if config.verbose {
            let mut stderr = io::stderr().lock();
            if let Err(error) =
                write_request_echo(&mut stderr, &config.method, config.url.path(), &headers)
            {
                warn!(error = %error, "failed to write request echo");
            }
        }

        let method = Method::from_bytes(config.method.as_bytes()).map_err(|_| {
            TransferError::InvalidMethod {
                method: config.method.clone(),
            }
        })?;
        let mut request = self
            .client
            .request(method, config.url.clone())
            .headers(wire_headers(config, &headers)?);
        if let Some(body) = plan.into_reqwest_body(config.silent) {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransferError::network(url, e))?;

        let status = response.status();
        let final_url = response.url().clone();
        if config.verbose {
            let mut stderr = io::stderr().lock();
            let echoed =
                write_response_echo(&mut stderr, response.version(), status, response.headers())
                    .and_then(|()| stderr.flush());
            if let Err(error) = echoed {
                warn!(error = %error, "failed to write response echo");
            }
        }
        if !status.is_success() {
            debug!(status = %status, "non-success status; writing body anyway");
        }

        let response_headers = response.headers().clone();
        let total_bytes = response.content_length();
        let stream = Box::pin(response.bytes_stream().map_err(io::Error::other));
        let mut source = SourceReader::new(
            StreamReader::new(stream),
            Direction::Download,
            total_bytes,
            config.silent,
        );

        let bytes_written = copy_to(&mut source, destination.writer())
            .await
            .map_err(|e| TransferError::copy(url, e))?;
        drop(source);

        let output_path = destination.path().map(std::path::Path::to_path_buf);
        destination
            .close()
            .await
            .map_err(|e| TransferError::copy(url, e))?;

        if let (Some(jar), Some(jar_path)) = (&self.cookie_jar, &config.cookie_jar_path) {
            save_cookie_jar(jar, &config.url, jar_path).await?;
        }

        if config.preserve_remote_time {
            match &output_path {
                Some(path) => {
                    apply_remote_time(path, &response_headers);
                }
                None => debug!("remote time requested but writing to stdout; skipping"),
            }
        }

        let outcome = TransferOutcome {
            status,
            final_url,
            bytes_written,
            redirects_taken: self.redirects_taken(),
            output_path,
        };
        info!(
            status = %outcome.status,
            bytes = outcome.bytes_written,
            redirects = outcome.redirects_taken,
            final_url = %outcome.final_url,
            "Transfer complete"
        );
        Ok(outcome)
    }
}

/// Builds the outgoing header set.
///
/// Defaults first (`User-Agent`, `Accept`, `Host`, and `Content-Length` for a
/// body), then the directives implied by the body, then the user's directives
/// in command-line order. Later writes win.
#[must_use]
pub fn request_headers(config: &TransferConfig, plan: &BodyPlan) -> HeaderSet {
    let mut headers = HeaderSet::new();
    headers.set("User-Agent", config.user_agent.as_str());
    headers.set("Accept", "*/*");
    headers.set("Host", config.host_header());
    if let Some(len) = plan.content_length() {
        headers.set("Content-Length", len.to_string());
    }

    apply_directives(&mut headers, &plan.directives);
    apply_directives(&mut headers, &config.header_directives);
    headers
}

/// Converts the echoed header set into the headers handed to the client.
///
/// The default `Host` is left to the transport, which derives it from each
/// hop's URL; the client would otherwise replay the first hop's authority on
/// every redirect. A `Host` the user set with `-H` is sent as given.
///
/// # Errors
///
/// Returns [`TransferError::InvalidHeader`] for names or values that cannot
/// be sent.
pub fn wire_headers(
    config: &TransferConfig,
    headers: &HeaderSet,
) -> Result<HeaderMap, TransferError> {
    if user_sets_host(&config.header_directives) {
        return headers.to_header_map();
    }
    let mut wire = headers.clone();
    wire.remove("Host");
    wire.to_header_map()
}

fn user_sets_host(directives: &[String]) -> bool {
    directives
        .iter()
        .map(|raw| HeaderDirective::parse(raw))
        .fold(false, |set, directive| match directive {
            HeaderDirective::Set { name, .. } if name.eq_ignore_ascii_case("host") => true,
            HeaderDirective::Delete { name } if name.eq_ignore_ascii_case("host") => false,
            _ => set,
        })
}

fn build_client(
    config: &TransferConfig,
    cookie_jar: Option<&Arc<CookieJar>>,
    redirect: &Arc<RedirectPolicy>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .gzip(config.compressed)
        .redirect(redirect.to_reqwest());
    if let Some(jar) = cookie_jar {
        builder = builder.cookie_provider(Arc::clone(jar));
    }
    builder.build()
}
