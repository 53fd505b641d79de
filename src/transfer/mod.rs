//! HTTP transfer engine.
//!
//! Turns a [`TransferConfig`] into one HTTP request, streams the response
//! body to a file or stdout, and runs the post-transfer side effects.
//!
//! # Features
//!
//! - Header directives (`Name: value`, `Name;` for empty, `Name:` to delete)
//! - Form data assembly from `--data*` inputs, or streamed file upload
//! - Opt-in, bounded redirect following
//! - Cookie loading and JSON cookie jar persistence
//! - Progress bar on stderr for uploads and downloads
//! - `--max-time` watchdog over the whole invocation
//!
//! # Example
//!
//! ```no_run
//! use curly_core::transfer::{TransferConfig, TransferSession};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TransferConfig::builder("https://example.com/file.txt")
//!     .output(Some(PathBuf::from("file.txt")))
//!     .follow_redirects(true)
//!     .build()?;
//! let session = TransferSession::new(&config).await?;
//! let outcome = session.execute(&config).await?;
//! println!("{} bytes, status {}", outcome.bytes_written, outcome.status);
//! # Ok(())
//! # }
//! ```

mod body;
mod config;
mod constants;
mod error;
mod headers;
mod output;
pub mod progress;
mod redirect;
mod session;
mod timestamp;
mod verbose;
mod watchdog;

pub use body::{
    BodyPlan, DataInputs, RequestPayload, UploadSource, assemble_data, data_fragments, plan_body,
};
pub use config::{TransferConfig, TransferConfigBuilder, normalize_url};
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_EXPECT_CONTINUE_TIMEOUT_SECS, DEFAULT_MAX_REDIRECTS,
    DEFAULT_METHOD, DEFAULT_USER_AGENT,
};
pub use error::{ErrorCategory, TransferError};
pub use headers::{HeaderDirective, HeaderSet, apply_directives};
pub use output::{Destination, remote_name};
pub use redirect::{RedirectDecision, RedirectPolicy};
pub use session::{TransferOutcome, TransferSession, request_headers, wire_headers};
pub use timestamp::{apply_remote_time, parse_last_modified};
pub use verbose::{write_request_echo, write_response_echo};
pub use watchdog::Watchdog;
