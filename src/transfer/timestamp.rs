//! `--remote-time`: stamp the output file with the response's `Last-Modified`.

use std::path::Path;
use std::time::SystemTime;

use filetime::FileTime;
use reqwest::header::{HeaderMap, LAST_MODIFIED};
use tracing::{debug, warn};

/// Parses a `Last-Modified` value in the `Mon, 02 Jan 2006 15:04:05 MST`
/// layout, such as `Wed, 21 Oct 2015 07:28:00 GMT`.
///
/// The zone may be any alphabetic abbreviation (`GMT`, `UTC`, `EST`, ...).
/// Abbreviations carry no offset of their own, so every zone reads as UTC.
/// RFC 850 and asctime dates do not match the layout and are rejected.
#[must_use]
pub fn parse_last_modified(value: &str) -> Option<SystemTime> {
    let (stamp, zone) = value.trim().rsplit_once(' ')?;
    if !is_rfc1123_stamp(stamp) || !is_zone_abbreviation(zone) {
        return None;
    }
    httpdate::parse_http_date(&format!("{stamp} GMT")).ok()
}

// `Wed, 21 Oct 2015 07:28:00`
fn is_rfc1123_stamp(stamp: &str) -> bool {
    stamp.len() == 25 && stamp.as_bytes()[3] == b','
}

fn is_zone_abbreviation(zone: &str) -> bool {
    (3..=5).contains(&zone.len()) && zone.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Sets the access and modification times of `path` from the `Last-Modified`
/// header. A missing or unparseable header leaves the file untouched.
///
/// Returns true when the file times were updated.
pub fn apply_remote_time(path: &Path, headers: &HeaderMap) -> bool {
    let Some(raw) = headers.get(LAST_MODIFIED).and_then(|v| v.to_str().ok()) else {
        debug!("no Last-Modified header; mtime left untouched");
        return false;
    };
    let Some(modified) = parse_last_modified(raw) else {
        debug!(value = raw, "unparseable Last-Modified header; mtime left untouched");
        return false;
    };

    let stamp = FileTime::from_system_time(modified);
    match filetime::set_file_times(path, stamp, stamp) {
        Ok(()) => {
            debug!(path = %path.display(), value = raw, "applied remote time");
            true
        }
        Err(error) => {
            warn!(path = %path.display(), error = %error, "failed to set file times");
            false
        }
    }
}
