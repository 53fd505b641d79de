//! Cookie jar loading (`--cookie`) and persistence (`--cookie-jar`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use url::Url;

use super::CookieError;
use super::jar::{Cookie, CookieJar};

/// Where `--cookie` input comes from.
///
/// Any `=` in the argument marks it as a literal `name=value` list, so a file
/// path that contains `=` is misread as a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSource {
    /// `name=value;name2=value2`.
    Literal(String),
    /// Path to a JSON array of cookie objects.
    File(PathBuf),
}

impl CookieSource {
    /// Classifies a raw `--cookie` argument.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        if raw.contains('=') {
            Self::Literal(raw.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }
}

/// Parses a literal `name=value;name2=value2` list into host-scoped cookies.
///
/// Each pair splits on its first `=`; pairs without one are skipped.
#[must_use]
pub fn parse_cookie_literal(literal: &str, host: &str) -> Vec<Cookie> {
    literal
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| match pair.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Some(Cookie::new(name.trim(), value.trim(), host))
            }
            _ => {
                warn!(pair = %pair, "skipping cookie pair without a name");
                None
            }
        })
        .collect()
}

/// Reads a JSON cookie file.
///
/// # Errors
///
/// Returns [`CookieError::Read`] if the file cannot be read and
/// [`CookieError::Decode`] if it is not a JSON array of cookie objects.
pub async fn read_cookie_file(path: &Path) -> Result<Vec<Cookie>, CookieError> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|e| CookieError::read(path, e))?;
    serde_json::from_slice(&contents).map_err(|e| CookieError::decode(path, e))
}

/// Builds the session cookie jar.
///
/// Returns `None` when neither a cookie source nor a jar path is configured,
/// so the client runs without a cookie store.
///
/// # Errors
///
/// Returns an error when a cookie file cannot be read or decoded.
#[instrument(level = "debug", skip(source), fields(target = %target))]
pub async fn load_cookie_jar(
    source: Option<&str>,
    jar_path: Option<&Path>,
    target: &Url,
) -> Result<Option<Arc<CookieJar>>, CookieError> {
    if source.is_none() && jar_path.is_none() {
        return Ok(None);
    }

    let jar = Arc::new(CookieJar::new());
    let host = target.host_str().unwrap_or_default();

    let cookies = match source.map(CookieSource::classify) {
        None => Vec::new(),
        Some(CookieSource::Literal(literal)) => parse_cookie_literal(&literal, host),
        Some(CookieSource::File(path)) => {
            let mut cookies = read_cookie_file(&path).await?;
            for cookie in &mut cookies {
                if cookie.domain.is_empty() {
                    cookie.domain = host.to_ascii_lowercase();
                    cookie.host_only = true;
                }
            }
            debug!(path = %path.display(), count = cookies.len(), "decoded cookie file");
            cookies
        }
    };

    let count = cookies.len();
    for cookie in cookies {
        jar.insert(cookie);
    }
    if count > 0 {
        info!(count, "Loaded cookies");
    }

    Ok(Some(jar))
}

/// Writes the jar's cookies for the target host to `path` as indented JSON.
///
/// Returns the number of cookies written. With no cookies for the host the
/// file is left untouched and `0` is returned.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
#[instrument(level = "debug", skip(jar), fields(target = %target, path = %path.display()))]
pub async fn save_cookie_jar(
    jar: &CookieJar,
    target: &Url,
    path: &Path,
) -> Result<usize, CookieError> {
    let host = target.host_str().unwrap_or_default();
    let cookies = jar.cookies_for_host(host);
    if cookies.is_empty() {
        debug!("no cookies for target host; leaving cookie jar file untouched");
        return Ok(0);
    }

    let json = serde_json::to_string_pretty(&cookies).map_err(CookieError::Encode)?;
    write_atomically(path, json.as_bytes())
        .await
        .map_err(|e| CookieError::write(path, e))?;
    info!(count = cookies.len(), path = %path.display(), "Saved cookie jar");
    Ok(cookies.len())
}

/// Writes via a sibling temp file and a rename.
async fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cookies".to_string());
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&temp_path, contents).await?;
    if let Err(error) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn target() -> Url {
        Url::parse("http://example.com/path").unwrap()
    }

    #[test]
    fn test_cookie_source_classify_heuristic() {
        assert_eq!(
            CookieSource::classify("a=1;b=2"),
            CookieSource::Literal("a=1;b=2".to_string())
        );
        assert_eq!(
            CookieSource::classify("cookies.json"),
            CookieSource::File(PathBuf::from("cookies.json"))
        );
        // Known limitation: a file name with '=' reads as a literal.
        assert!(matches!(
            CookieSource::classify("jar=1.json"),
            CookieSource::Literal(_)
        ));
    }

    #[test]
    fn test_parse_cookie_literal_splits_pairs_on_first_equals() {
        let cookies = parse_cookie_literal("a=1; b=x=y;;flag", "example.com");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, "a");
        assert_eq!(cookies[0].value(), "1");
        assert_eq!(cookies[1].name, "b");
        assert_eq!(cookies[1].value(), "x=y");
        assert_eq!(cookies[1].domain, "example.com");
        assert!(cookies[1].host_only);
    }

    #[tokio::test]
    async fn test_load_cookie_jar_none_when_unconfigured() {
        assert!(load_cookie_jar(None, None, &target()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_cookie_jar_empty_when_only_jar_path() {
        let jar = load_cookie_jar(None, Some(Path::new("out.json")), &target())
            .await
            .unwrap()
            .unwrap();
        assert!(jar.is_empty());
    }

    #[tokio::test]
    async fn test_load_cookie_jar_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cookies.json");
        std::fs::write(
            &path,
            r#"[
  {"name": "session", "value": "abc", "domain": "example.com", "path": "/"},
  {"name": "pref", "value": "dark"}
]"#,
        )
        .unwrap();

        let jar = load_cookie_jar(Some(path.to_str().unwrap()), None, &target())
            .await
            .unwrap()
            .unwrap();
        let cookies = jar.cookies_for_host("example.com");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[1].domain, "example.com", "empty domain scoped to target");
    }

    #[tokio::test]
    async fn test_load_cookie_jar_undecodable_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cookies.json");
        std::fs::write(&path, "not json").unwrap();

        let result = load_cookie_jar(Some(path.to_str().unwrap()), None, &target()).await;
        assert!(matches!(result, Err(CookieError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_load_cookie_jar_missing_file_is_error() {
        let result =
            load_cookie_jar(Some("/nonexistent/curly/cookies.json"), None, &target()).await;
        assert!(matches!(result, Err(CookieError::Read { .. })));
    }

    #[tokio::test]
    async fn test_save_cookie_jar_round_trips_literal_cookies() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jar.json");
        let jar = load_cookie_jar(Some("a=1;b=2"), Some(&path), &target())
            .await
            .unwrap()
            .unwrap();

        let written = save_cookie_jar(&jar, &target(), &path).await.unwrap();
        assert_eq!(written, 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("[\n  {"), "two-space indented: {contents}");
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed[0]["name"], "a");
        assert_eq!(parsed[0]["value"], "1");
        assert_eq!(parsed[1]["name"], "b");
        assert_eq!(parsed[1]["value"], "2");
        assert_eq!(parsed[1]["domain"], "example.com");

        let reloaded = read_cookie_file(&path).await.unwrap();
        assert_eq!(reloaded.len(), 2);
    }

    #[tokio::test]
    async fn test_save_cookie_jar_empty_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jar.json");
        let jar = CookieJar::new();

        let written = save_cookie_jar(&jar, &target(), &path).await.unwrap();
        assert_eq!(written, 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_save_cookie_jar_skips_other_hosts() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jar.json");
        let jar = CookieJar::new();
        jar.insert(Cookie::new("a", "1", "other.com"));

        assert_eq!(save_cookie_jar(&jar, &target(), &path).await.unwrap(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_save_cookie_jar_replaces_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jar.json");
        std::fs::write(&path, "old").unwrap();
        let jar = CookieJar::new();
        jar.insert(Cookie::new("a", "1", "example.com"));

        save_cookie_jar(&jar, &target(), &path).await.unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"name\": \"a\""));
        assert!(!temp_dir.path().join(".jar.json.tmp").exists());
    }
}
