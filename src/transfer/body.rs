//! Request body assembly.
//!
//! Merges the four `--data*` categories into one form payload, or opens the
//! `--upload-file` source. The two are mutually exclusive.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

use super::config::TransferConfig;
use super::constants::FORM_CONTENT_TYPE;
use super::error::TransferError;
use super::progress::{Direction, SourceReader};

/// Data inputs grouped by category, each in command-line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataInputs {
    /// `-d`/`--data`/`--data-ascii`: `key=@path` reads a file.
    pub ascii: Vec<String>,
    /// `--data-raw`: `@` is literal.
    pub raw: Vec<String>,
    /// `--data-binary`: `@` is literal.
    pub binary: Vec<String>,
    /// `--data-urlencode`: values are form-encoded.
    pub url_encode: Vec<String>,
}

impl DataInputs {
    /// Returns true when no category holds any token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ascii.is_empty()
            && self.raw.is_empty()
            && self.binary.is_empty()
            && self.url_encode.is_empty()
    }
}

/// Produces the data fragments in category order: ascii, raw, binary, then
/// one combined url-encoded fragment.
///
/// Fragments are raw bytes: file contents pulled in by `key=@path` are kept
/// as-is apart from dropped `\r` and `\n`.
///
/// # Errors
///
/// Returns [`TransferError::DataFile`] when a `key=@path` reference cannot be read.
pub async fn data_fragments(inputs: &DataInputs) -> Result<Vec<Vec<u8>>, TransferError> {
    let mut fragments = Vec::with_capacity(
        inputs.ascii.len() + inputs.raw.len() + inputs.binary.len() + 1,
    );

    for token in &inputs.ascii {
        fragments.push(ascii_fragment(token).await?);
    }

    fragments.extend(inputs.raw.iter().map(|token| literal_fragment(token)));
    fragments.extend(inputs.binary.iter().map(|token| literal_fragment(token)));

    if let Some(encoded) = url_encoded_fragment(&inputs.url_encode) {
        fragments.push(encoded.into_bytes());
    }

    Ok(fragments)
}

/// Joins all data fragments with `&` into the request payload.
///
/// Returns `None` when there is no data at all.
///
/// # Errors
///
/// Returns [`TransferError::DataFile`] when a `key=@path` reference cannot be read.
pub async fn assemble_data(inputs: &DataInputs) -> Result<Option<Vec<u8>>, TransferError> {
    if inputs.is_empty() {
        return Ok(None);
    }
    let fragments = data_fragments(inputs).await?;
    Ok(Some(fragments.join(&b'&')))
}

async fn ascii_fragment(token: &str) -> Result<Vec<u8>, TransferError> {
    let Some((key, value)) = token.split_once('=') else {
        return Ok(token.as_bytes().to_vec());
    };
    let Some(path) = value.strip_prefix('@') else {
        return Ok(token.as_bytes().to_vec());
    };

    let contents = tokio::fs::read(path)
        .await
        .map_err(|e| TransferError::data_file(key, Path::new(path), e))?;
    let mut fragment = Vec::with_capacity(key.len() + 1 + contents.len());
    fragment.extend_from_slice(key.as_bytes());
    fragment.push(b'=');
    fragment.extend(contents.into_iter().filter(|b| *b != b'\r' && *b != b'\n'));
    debug!(key, path, bytes = fragment.len() - key.len() - 1, "loaded data element from file");
    Ok(fragment)
}

fn literal_fragment(token: &str) -> Vec<u8> {
    token.as_bytes().to_vec()
}

fn url_encoded_fragment(tokens: &[String]) -> Option<String> {
    if tokens.is_empty() {
        return None;
    }

    // Keys are emitted sorted; values under one key keep input order.
    let mut values: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for token in tokens {
        let (key, value) = token.split_once('=').unwrap_or((token.as_str(), ""));
        values.entry(key).or_default().push(value);
    }

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, entries) in values {
        for value in entries {
            serializer.append_pair(key, value);
        }
    }
    Some(serializer.finish())
}

/// An opened upload file.
#[derive(Debug)]
pub struct UploadSource {
    /// Path given with `--upload-file`.
    pub path: PathBuf,
    /// The open file handle.
    pub file: tokio::fs::File,
    /// File size in bytes.
    pub len: u64,
}

/// The payload half of a [`BodyPlan`]. Consumed once by the transport.
#[derive(Debug)]
pub enum RequestPayload {
    /// No request body.
    Empty,
    /// Assembled form data.
    Data(Vec<u8>),
    /// Streamed upload file.
    Upload(UploadSource),
}

/// Request body plus the header directives it implies.
#[derive(Debug)]
pub struct BodyPlan {
    /// The body source.
    pub payload: RequestPayload,
    /// Implicit directives (`Content-Type`, `Expect`) to apply before the user's.
    pub directives: Vec<String>,
}

impl BodyPlan {
    /// Known body length, used for `Content-Length`.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        match &self.payload {
            RequestPayload::Empty => None,
            RequestPayload::Data(bytes) => Some(bytes.len() as u64),
            RequestPayload::Upload(upload) => Some(upload.len),
        }
    }

    /// Converts the payload into a reqwest body.
    ///
    /// Upload files are streamed; unless `silent`, the stream reports upload
    /// progress on stderr.
    #[must_use]
    pub fn into_reqwest_body(self, silent: bool) -> Option<reqwest::Body> {
        match self.payload {
            RequestPayload::Empty => None,
            RequestPayload::Data(bytes) => Some(reqwest::Body::from(bytes)),
            RequestPayload::Upload(upload) => {
                let reader =
                    SourceReader::new(upload.file, Direction::Upload, Some(upload.len), silent);
                Some(reqwest::Body::wrap_stream(ReaderStream::new(reader)))
            }
        }
    }
}

/// Decides the request body for `config`.
///
/// # Errors
///
/// Returns [`TransferError::ConflictingBody`] when both an upload file and
/// data are configured, [`TransferError::DataFile`] for unreadable `@file`
/// references, and [`TransferError::Upload`] when the upload file cannot be
/// opened.
#[instrument(level = "debug", skip(config))]
pub async fn plan_body(config: &TransferConfig) -> Result<BodyPlan, TransferError> {
    if config.upload_file.is_some() && !config.data.is_empty() {
        return Err(TransferError::ConflictingBody);
    }

    if let Some(path) = &config.upload_file {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| TransferError::upload(path, e))?;
        let len = file
            .metadata()
            .await
            .map_err(|e| TransferError::upload(path, e))?
            .len();
        debug!(path = %path.display(), len, "opened upload file");
        return Ok(BodyPlan {
            payload: RequestPayload::Upload(UploadSource {
                path: path.clone(),
                file,
                len,
            }),
            directives: vec!["Expect: 100-continue".to_string()],
        });
    }

    match assemble_data(&config.data).await? {
        Some(bytes) => {
            debug!(len = bytes.len(), "assembled form payload");
            Ok(BodyPlan {
                payload: RequestPayload::Data(bytes),
                directives: vec![format!("Content-Type: {FORM_CONTENT_TYPE}")],
            })
        }
        None => Ok(BodyPlan {
            payload: RequestPayload::Empty,
            directives: Vec::new(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn inputs(ascii: &[&str], raw: &[&str], binary: &[&str], url_encode: &[&str]) -> DataInputs {
        let owned = |items: &[&str]| items.iter().map(ToString::to_string).collect();
        DataInputs {
            ascii: owned(ascii),
            raw: owned(raw),
            binary: owned(binary),
            url_encode: owned(url_encode),
        }
    }

    fn text(fragments: Vec<Vec<u8>>) -> Vec<String> {
        fragments
            .into_iter()
            .map(|fragment| String::from_utf8(fragment).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_ascii_file_reference_strips_line_breaks() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.txt");
        std::fs::write(&path, "line1\r\nline2\n").unwrap();

        let token = format!("key=@{}", path.display());
        let fragments = data_fragments(&inputs(&[&token], &[], &[], &[])).await.unwrap();

        assert_eq!(text(fragments), vec!["key=line1line2".to_string()]);
    }

    #[tokio::test]
    async fn test_ascii_file_reference_keeps_non_utf8_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.bin");
        std::fs::write(&path, [0xff, 0xfe, b'\n', b'a']).unwrap();

        let token = format!("k=@{}", path.display());
        let payload = assemble_data(&inputs(&[&token], &["r=1"], &[], &[]))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(payload, b"k=\xff\xfea&r=1".to_vec());
    }

    #[tokio::test]
    async fn test_ascii_missing_file_is_error() {
        let result =
            data_fragments(&inputs(&["key=@/nonexistent/curly/data.txt"], &[], &[], &[])).await;
        match result {
            Err(TransferError::DataFile { key, .. }) => assert_eq!(key, "key"),
            other => panic!("Expected DataFile error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ascii_token_without_equals_is_verbatim() {
        let fragments = data_fragments(&inputs(&["just-text"], &[], &[], &[])).await.unwrap();
        assert_eq!(text(fragments), vec!["just-text".to_string()]);
    }

    #[tokio::test]
    async fn test_ascii_splits_on_first_equals_only() {
        let fragments = data_fragments(&inputs(&["a=b=c"], &[], &[], &[])).await.unwrap();
        assert_eq!(text(fragments), vec!["a=b=c".to_string()]);
    }

    #[tokio::test]
    async fn test_raw_and_binary_treat_at_sign_literally() {
        let fragments = data_fragments(&inputs(&[], &["r=@notafile"], &["b=@alsonot"], &[]))
            .await
            .unwrap();
        assert_eq!(
            text(fragments),
            vec!["r=@notafile".to_string(), "b=@alsonot".to_string()]
        );
    }

    #[tokio::test]
    async fn test_url_encode_escapes_and_sorts_keys() {
        let fragments = data_fragments(&inputs(&[], &[], &[], &["z=a b", "a=x&y", "z=2"]))
            .await
            .unwrap();
        assert_eq!(text(fragments), vec!["a=x%26y&z=a+b&z=2".to_string()]);
    }

    #[tokio::test]
    async fn test_url_encode_key_without_value() {
        let fragments = data_fragments(&inputs(&[], &[], &[], &["flag"])).await.unwrap();
        assert_eq!(text(fragments), vec!["flag=".to_string()]);
    }

    #[tokio::test]
    async fn test_assemble_data_uses_category_order() {
        let data = inputs(&["a=1", "a2=2"], &["r=3"], &["b=4"], &["u=5"]);
        let payload = assemble_data(&data).await.unwrap().unwrap();
        assert_eq!(String::from_utf8(payload).unwrap(), "a=1&a2=2&r=3&b=4&u=5");
    }

    #[tokio::test]
    async fn test_assemble_data_empty_is_none() {
        assert!(assemble_data(&DataInputs::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_plan_body_data_adds_form_content_type() {
        let config = TransferConfig::builder("http://example.com/")
            .data(inputs(&["a=1"], &[], &[], &[]))
            .build()
            .unwrap();
        let plan = plan_body(&config).await.unwrap();

        assert_eq!(plan.content_length(), Some(3));
        assert_eq!(
            plan.directives,
            vec!["Content-Type: application/x-www-form-urlencoded".to_string()]
        );
        assert!(matches!(plan.payload, RequestPayload::Data(ref b) if b == b"a=1"));
    }

    #[tokio::test]
    async fn test_plan_body_upload_uses_file_size_and_expect() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("upload.bin");
        std::fs::write(&path, vec![7u8; 1234]).unwrap();

        let config = TransferConfig::builder("http://example.com/put")
            .upload_file(Some(path.clone()))
            .build()
            .unwrap();
        let plan = plan_body(&config).await.unwrap();

        assert_eq!(plan.content_length(), Some(1234));
        assert_eq!(plan.directives, vec!["Expect: 100-continue".to_string()]);
    }

    #[tokio::test]
    async fn test_plan_body_missing_upload_file_is_error() {
        let config = TransferConfig::builder("http://example.com/put")
            .upload_file(Some(PathBuf::from("/nonexistent/curly/upload.bin")))
            .build()
            .unwrap();
        let result = plan_body(&config).await;
        assert!(matches!(result, Err(TransferError::Upload { .. })));
    }

    #[tokio::test]
    async fn test_plan_body_without_inputs_is_empty() {
        let config = TransferConfig::builder("http://example.com/").build().unwrap();
        let plan = plan_body(&config).await.unwrap();
        assert!(matches!(plan.payload, RequestPayload::Empty));
        assert!(plan.directives.is_empty());
        assert_eq!(plan.content_length(), None);
    }
}
