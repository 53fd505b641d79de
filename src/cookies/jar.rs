//! In-memory cookie jar that can be plugged into reqwest and dumped to JSON.
//!
//! `reqwest::cookie::Jar` cannot enumerate its contents, so the jar keeps its
//! own cookie list and implements [`CookieStore`] directly. Cookies are keyed
//! by `(domain, path, name)`.

use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

/// A single cookie as stored in the jar and in jar files.
///
/// The value field is redacted in Debug output to prevent accidental logging
/// of session tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value. Sensitive, never log it.
    value: String,
    /// Domain without a leading dot; empty means "the target host".
    #[serde(default)]
    pub domain: String,
    /// URL path scope.
    #[serde(default = "default_path")]
    pub path: String,
    /// Only send over HTTPS.
    #[serde(default)]
    pub secure: bool,
    /// Not exposed to scripts; kept for fidelity with `Set-Cookie`.
    #[serde(default)]
    pub http_only: bool,
    /// Exact host match only (no `Domain` attribute was given).
    #[serde(default)]
    pub host_only: bool,
    /// Unix timestamp for expiry (0 = session cookie).
    #[serde(default)]
    pub expires: u64,
}

fn default_path() -> String {
    "/".to_string()
}

impl Cookie {
    /// Creates a host-only session cookie scoped to `host` and path `/`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: host.into().to_ascii_lowercase(),
            path: default_path(),
            secure: false,
            http_only: false,
            host_only: true,
            expires: 0,
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive; avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true if the cookie has an expiry in the past.
    #[must_use]
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires > 0 && UNIX_EPOCH + Duration::from_secs(self.expires) <= now
    }

    /// Returns true if this cookie belongs to `host` (domain match only).
    #[must_use]
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        let domain = self.domain.trim_start_matches('.').to_ascii_lowercase();
        if host == domain {
            return true;
        }
        !self.host_only && host.ends_with(&format!(".{domain}"))
    }

    /// Returns true if this cookie should be sent with a request to `url`.
    #[must_use]
    pub fn matches_url(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        if self.secure && url.scheme() != "https" {
            return false;
        }
        self.matches_host(host) && path_matches(&self.path, url.path())
    }

    fn same_key(&self, other: &Self) -> bool {
        self.name == other.name
            && self.path == other.path
            && self.domain.eq_ignore_ascii_case(&other.domain)
    }
}

// Custom Debug impl that redacts the cookie value.
impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("host_only", &self.host_only)
            .field("expires", &self.expires)
            .finish()
    }
}

/// RFC 6265 path-match.
fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/')
            || request_path[cookie_path.len()..].starts_with('/'))
}

/// RFC 6265 default-path: the request path up to, not including, its last `/`.
fn default_cookie_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => default_path(),
        Some(idx) => path[..idx].to_string(),
    }
}

/// Parses one `Set-Cookie` header received from `url`.
///
/// Returns `None` for malformed headers and for cookies whose `Domain`
/// does not cover the responding host.
#[must_use]
pub fn parse_set_cookie(header: &str, url: &Url) -> Option<Cookie> {
    let host = url.host_str()?.to_ascii_lowercase();
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie::new(name, value.trim(), host.clone());
    cookie.path = default_cookie_path(url);
    let mut max_age: Option<i64> = None;
    let mut expires: Option<SystemTime> = None;

    for attribute in parts {
        let (key, attr_value) = attribute
            .split_once('=')
            .map_or((attribute.trim(), ""), |(k, v)| (k.trim(), v.trim()));
        match key.to_ascii_lowercase().as_str() {
            "domain" if !attr_value.is_empty() => {
                let domain = attr_value.trim_start_matches('.').to_ascii_lowercase();
                if host != domain && !host.ends_with(&format!(".{domain}")) {
                    debug!(domain = %domain, host = %host, "rejecting cookie for foreign domain");
                    return None;
                }
                cookie.domain = domain;
                cookie.host_only = false;
            }
            "path" if attr_value.starts_with('/') => cookie.path = attr_value.to_string(),
            "secure" => cookie.secure = true,
            "httponly" => cookie.http_only = true,
            "max-age" => max_age = attr_value.parse().ok(),
            "expires" => expires = httpdate::parse_http_date(attr_value).ok(),
            _ => {}
        }
    }

    // Max-Age wins over Expires.
    let now = SystemTime::now();
    cookie.expires = match (max_age, expires) {
        (Some(secs), _) if secs <= 0 => 1,
        (Some(secs), _) => unix_secs(now + Duration::from_secs(secs.unsigned_abs())),
        (None, Some(at)) => unix_secs(at).max(1),
        (None, None) => 0,
    };
    Some(cookie)
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Cookie jar shared with the reqwest client for one transfer session.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: RwLock<Vec<Cookie>>,
}

impl CookieJar {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `cookie`, replacing any cookie with the same domain/path/name.
    ///
    /// An already-expired cookie removes its counterpart instead.
    pub fn insert(&self, cookie: Cookie) {
        let mut cookies = self.cookies.write().unwrap_or_else(PoisonError::into_inner);
        cookies.retain(|existing| !existing.same_key(&cookie));
        if cookie.is_expired(SystemTime::now()) {
            debug!(name = %cookie.name, domain = %cookie.domain, "removed expired cookie");
        } else {
            cookies.push(cookie);
        }
    }

    /// Number of cookies held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true when the jar holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unexpired cookies whose domain covers `host`, in insertion order.
    #[must_use]
    pub fn cookies_for_host(&self, host: &str) -> Vec<Cookie> {
        let now = SystemTime::now();
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|cookie| cookie.matches_host(host) && !cookie.is_expired(now))
            .cloned()
            .collect()
    }

    /// Unexpired cookies to send with a request to `url`.
    #[must_use]
    pub fn cookies_for_url(&self, url: &Url) -> Vec<Cookie> {
        let now = SystemTime::now();
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|cookie| cookie.matches_url(url) && !cookie.is_expired(now))
            .cloned()
            .collect()
    }
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else {
                warn!(url = %url, "ignoring non-text Set-Cookie header");
                continue;
            };
            match parse_set_cookie(raw, url) {
                Some(cookie) => {
                    debug!(name = %cookie.name, domain = %cookie.domain, "stored cookie from response");
                    self.insert(cookie);
                }
                None => debug!(url = %url, "ignoring malformed Set-Cookie header"),
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self
            .cookies_for_url(url)
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value()))
            .collect::<Vec<_>>()
            .join("; ");
        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}
