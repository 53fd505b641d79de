//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use curly_core::transfer::{
    DEFAULT_EXPECT_CONTINUE_TIMEOUT_SECS, DEFAULT_MAX_REDIRECTS, DEFAULT_METHOD,
    DEFAULT_USER_AGENT,
};
use curly_core::{DataInputs, TransferConfig, TransferError};

/// Transfer a URL.
///
/// Curly issues one HTTP request and writes the response body to stdout or a
/// file, with a progress bar on stderr.
#[derive(Parser, Debug)]
#[command(name = "curly")]
#[command(author, version, about)]
#[command(override_usage = "curly [options] URL")]
pub struct Args {
    /// URL to transfer
    pub url: Option<String>,

    /// Write output to <file> instead of stdout
    #[arg(short = 'o', long = "output", value_name = "file")]
    pub output: Option<PathBuf>,

    /// Transfer <file> to the URL with PUT
    #[arg(short = 'T', long = "upload-file", value_name = "file")]
    pub upload_file: Option<PathBuf>,

    /// Write output to a file named like the remote file
    #[arg(short = 'O', long = "remote-name")]
    pub remote_name: bool,

    /// Echo request and response headers to stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Maximum time allowed for the whole transfer, in seconds (0 disables)
    #[arg(short = 'm', long = "max-time", value_name = "seconds", default_value_t = 0)]
    pub max_time: u64,

    /// Set the timestamp of the local file to that of the remote file, if available
    #[arg(short = 'R', long = "remote-time")]
    pub remote_time: bool,

    /// Follow redirects
    #[arg(short = 'L', long = "location")]
    pub location: bool,

    /// Maximum number of redirects allowed
    #[arg(long = "max-redirs", value_name = "num", default_value_t = DEFAULT_MAX_REDIRECTS)]
    pub max_redirs: u32,

    /// Silent mode (no progress output)
    #[arg(short = 's', long)]
    pub silent: bool,

    /// Request method to use
    #[arg(short = 'X', long = "request", value_name = "method", default_value = DEFAULT_METHOD)]
    pub request: String,

    /// User-Agent to send to the server
    #[arg(short = 'A', long = "user-agent", value_name = "agent", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Custom header: "Name: value", "Name;" for an empty value, "Name:" to remove
    #[arg(short = 'H', long = "header", value_name = "header", allow_hyphen_values = true)]
    pub header: Vec<String>,

    /// Accepted for compatibility; the 100-continue wait is not applied
    #[arg(long = "expect100-timeout", value_name = "seconds", default_value_t = DEFAULT_EXPECT_CONTINUE_TIMEOUT_SECS)]
    pub expect100_timeout: u64,

    /// HTTP POST data; "key=@file" reads the value from a file
    #[arg(short = 'd', long = "data", value_name = "data", allow_hyphen_values = true)]
    pub data: Vec<String>,

    /// HTTP POST ASCII data
    #[arg(long = "data-ascii", value_name = "data", allow_hyphen_values = true)]
    pub data_ascii: Vec<String>,

    /// HTTP POST data, '@' allowed
    #[arg(long = "data-raw", value_name = "data", allow_hyphen_values = true)]
    pub data_raw: Vec<String>,

    /// HTTP POST binary data
    #[arg(long = "data-binary", value_name = "data", allow_hyphen_values = true)]
    pub data_binary: Vec<String>,

    /// HTTP POST data, URL-encoded
    #[arg(long = "data-urlencode", value_name = "data", allow_hyphen_values = true)]
    pub data_urlencode: Vec<String>,

    /// Send cookies from "name=value;..." or a JSON cookie file
    #[arg(short = 'b', long = "cookie", value_name = "data|file")]
    pub cookie: Option<String>,

    /// Write cookies for the target host to <file> after the transfer
    #[arg(short = 'c', long = "cookie-jar", value_name = "file")]
    pub cookie_jar: Option<PathBuf>,

    /// Request a compressed response and decode it
    #[arg(long)]
    pub compressed: bool,
}

impl Args {
    /// Data inputs grouped by category; `-d` values precede `--data-ascii`.
    #[must_use]
    pub fn data_inputs(&self) -> DataInputs {
        DataInputs {
            ascii: self
                .data
                .iter()
                .chain(&self.data_ascii)
                .cloned()
                .collect(),
            raw: self.data_raw.clone(),
            binary: self.data_binary.clone(),
            url_encode: self.data_urlencode.clone(),
        }
    }

    /// Builds the transfer configuration for `target`.
    pub fn to_config(&self, target: &str) -> Result<TransferConfig, TransferError> {
        TransferConfig::builder(target)
            .output(self.output.clone())
            .remote_name(self.remote_name)
            .method(self.request.as_str())
            .header_directives(self.header.clone())
            .data(self.data_inputs())
            .upload_file(self.upload_file.clone())
            .follow_redirects(self.location)
            .max_redirects(self.max_redirs)
            .cookie_source(self.cookie.clone())
            .cookie_jar_path(self.cookie_jar.clone())
            .max_time_secs(self.max_time)
            .expect_continue_timeout_secs(self.expect100_timeout)
            .silent(self.silent)
            .verbose(self.verbose)
            .preserve_remote_time(self.remote_time)
            .compressed(self.compressed)
            .user_agent(self.user_agent.as_str())
            .build()
    }
}
