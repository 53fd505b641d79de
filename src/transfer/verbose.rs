//! `-v` request/response header echo.

use std::io::{self, Write};

use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Version};

use super::headers::HeaderSet;

/// Writes `> METHOD PATH HTTP/1.1` followed by one `> Name Value` line per header.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_request_echo<W: Write + ?Sized>(
    out: &mut W,
    method: &str,
    path: &str,
    headers: &HeaderSet,
) -> io::Result<()> {
    writeln!(out, "> {method} {path} HTTP/1.1")?;
    for (name, value) in headers.iter() {
        writeln!(out, "> {name} {value}")?;
    }
    Ok(())
}

/// Writes `< HTTP/x STATUS` followed by one `< Name Value` line per header.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_response_echo<W: Write + ?Sized>(
    out: &mut W,
    version: Version,
    status: StatusCode,
    headers: &HeaderMap,
) -> io::Result<()> {
    writeln!(out, "< {version:?} {status}")?;
    for (name, value) in headers {
        writeln!(out, "< {} {}", name, String::from_utf8_lossy(value.as_bytes()))?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_request_echo_lists_headers_in_order() {
        let mut headers = HeaderSet::new();
        headers.set("User-Agent", "Curly_Fries/1.0");
        headers.set("Accept", "*/*");

        let mut out = Vec::new();
        write_request_echo(&mut out, "GET", "/file.txt", &headers).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "> GET /file.txt HTTP/1.1\n> User-Agent Curly_Fries/1.0\n> Accept */*\n"
        );
    }

    #[test]
    fn test_response_echo_status_line_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", HeaderValue::from_static("5"));

        let mut out = Vec::new();
        write_response_echo(&mut out, Version::HTTP_11, StatusCode::OK, &headers).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "< HTTP/1.1 200 OK\n< content-length 5\n"
        );
    }
}
