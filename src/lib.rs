//! Curly Core Library
//!
//! This library provides the transfer engine behind the `curly` command-line
//! HTTP client: request assembly from header and body options, redirect and
//! timeout policy, cookie persistence, and streaming with progress output.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`transfer`] - Request building, execution, and response streaming
//! - [`cookies`] - Cookie store shared with the HTTP client, plus JSON persistence

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cookies;
pub mod transfer;

// Re-export commonly used types
pub use cookies::{Cookie, CookieError, CookieJar};
pub use transfer::{
    DataInputs, ErrorCategory, HeaderDirective, HeaderSet, RedirectPolicy, TransferConfig,
    TransferError, TransferOutcome, TransferSession, Watchdog,
};
