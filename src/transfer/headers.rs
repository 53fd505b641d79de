//! Header directive processing.
//!
//! A directive is one raw `-H` token. It either sets a header (`Name: Value`),
//! sets it to an explicitly empty value (`Name;`), or deletes it (`Name:`).
//! Directives never append duplicates: the last write for a name wins.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Ordered collection of request headers with at most one value per name.
///
/// Names compare case-insensitively. A header keeps the position of its first
/// insertion when overwritten, so the verbose echo stays stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Creates an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, overwriting any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx] = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Removes `name` entirely, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name)
            .map(|idx| self.entries.remove(idx).1)
    }

    /// Returns the current value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .map(|idx| self.entries[idx].1.as_str())
    }

    /// Returns true when `name` is present (possibly with an empty value).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of headers in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the set holds no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Converts the set into a reqwest header map.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidHeader`](super::TransferError::InvalidHeader)
    /// when a name or value cannot be sent on the wire.
    pub fn to_header_map(&self) -> Result<HeaderMap, super::TransferError> {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| super::TransferError::invalid_header(name, e.to_string()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| super::TransferError::invalid_header(name, e.to_string()))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

/// One parsed header directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderDirective {
    /// Overwrite the header with a value (possibly empty).
    Set {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
    },
    /// Remove the header.
    Delete {
        /// Header name.
        name: String,
    },
    /// Nothing to do.
    Ignore,
}

impl HeaderDirective {
    /// Parses a raw directive token.
    ///
    /// The token is split on the first `": "`; everything after it, including
    /// further `": "` sequences, is the value.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::Ignore;
        }

        if let Some((name, value)) = raw.split_once(": ") {
            return Self::Set {
                name: name.to_string(),
                value: value.to_string(),
            };
        }

        if let Some(name) = raw.strip_suffix(';') {
            Self::Set {
                name: name.to_string(),
                value: String::new(),
            }
        } else if let Some(name) = raw.strip_suffix(':') {
            Self::Delete {
                name: name.to_string(),
            }
        } else {
            Self::Ignore
        }
    }

    /// Applies this directive to a header set.
    pub fn apply(&self, headers: &mut HeaderSet) {
        match self {
            Self::Set { name, value } => headers.set(name.clone(), value.clone()),
            Self::Delete { name } => {
                headers.remove(name);
            }
            Self::Ignore => {}
        }
    }
}

/// Applies raw directives to `headers` in order.
pub fn apply_directives<S: AsRef<str>>(headers: &mut HeaderSet, directives: &[S]) {
    for raw in directives {
        HeaderDirective::parse(raw.as_ref()).apply(headers);
    }
}
