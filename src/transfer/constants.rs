//! Constants for the transfer module (defaults, timeouts, progress rendering).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default request method when no body forces one.
pub const DEFAULT_METHOD: &str = "GET";

/// Default maximum number of redirects followed with `--location`.
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Default `--expect100-timeout` value. Recorded only; see `TransferConfig`.
pub const DEFAULT_EXPECT_CONTINUE_TIMEOUT_SECS: u64 = 1;

/// Default User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Curly_Fries/1.0";

/// Content type declared for assembled `--data*` payloads.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Width of the progress bar in terminal cells.
pub const PROGRESS_BAR_WIDTH: usize = 40;

/// Minimum interval between two progress redraws.
pub const PROGRESS_DRAW_INTERVAL: Duration = Duration::from_millis(100);
