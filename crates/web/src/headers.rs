//! Case-insensitive header map which can be frozen.
//!
//! Header names are normalized by [`http::HeaderName`], so `Content-Type` and `content-type`
//! address the same entry. Once [`Headers::freeze`] has been called every mutating method
//! fails with [`HeaderError::Frozen`]. Request headers are frozen when the request is built and
//! response headers when the response is built.

use crate::error::HeaderError;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: HeaderMap,
    frozen: bool,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds headers from `(name, value)` pairs, names may use any case.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, HeaderError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.insert(name.as_ref(), value.as_ref())?;
        }
        Ok(headers)
    }

    /// Headers holding only a `content-type`.
    pub(crate) fn with_content_type(content_type: &'static str) -> Self {
        let mut inner = HeaderMap::with_capacity(1);
        inner.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self { inner, frozen: false }
    }

    /// Returns the value of `name` if it is present and valid visible ASCII.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.ensure_mutable()?;
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HeaderError::InvalidName { name: name.to_owned(), reason: e.to_string() })?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| HeaderError::InvalidValue { name: name.to_owned(), reason: e.to_string() })?;
        self.inner.insert(header_name, header_value);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Option<String>, HeaderError> {
        self.ensure_mutable()?;
        Ok(self.inner.remove(name).and_then(|value| value.to_str().ok().map(str::to_owned)))
    }

    pub fn clear(&mut self) -> Result<(), HeaderError> {
        self.ensure_mutable()?;
        self.inner.clear();
        Ok(())
    }

    /// Copies every entry of `other` into `self`, replacing entries with the same name.
    pub fn extend(&mut self, other: &Headers) -> Result<(), HeaderError> {
        self.ensure_mutable()?;
        for (name, value) in &other.inner {
            self.inner.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// A mutable copy of these headers, the frozen flag is not carried over.
    #[must_use]
    pub fn copy(&self) -> Headers {
        Self { inner: self.inner.clone(), frozen: false }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates `(lowercase name, value)` pairs, skipping values which are not visible ASCII.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)))
    }

    pub fn into_header_map(self) -> HeaderMap {
        self.inner
    }

    /// Typed insertion that skips the frozen check, only for headers still being assembled.
    pub(crate) fn insert_typed(&mut self, name: HeaderName, value: HeaderValue) {
        self.inner.insert(name, value);
    }

    fn ensure_mutable(&self) -> Result<(), HeaderError> {
        if self.frozen { Err(HeaderError::Frozen) } else { Ok(()) }
    }
}

impl From<HeaderMap> for Headers {
    fn from(inner: HeaderMap) -> Self {
        Self { inner, frozen: false }
    }
}

impl PartialEq for Headers {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_headers() -> Headers {
        Headers::from_pairs([("Content-Type", "application/json")]).unwrap()
    }

    #[test]
    fn test_frozen() {
        let mut headers = json_headers();
        headers.freeze();

        assert_eq!(headers.clear(), Err(HeaderError::Frozen));
        assert_eq!(headers.insert("Content-Type", "text/html"), Err(HeaderError::Frozen));
        assert_eq!(headers.extend(&json_headers()), Err(HeaderError::Frozen));
        assert_eq!(headers.remove("Content-Type"), Err(HeaderError::Frozen));
        assert_eq!(headers.get("content-type"), Some("application/json"));
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let headers = json_headers();
        assert_eq!(headers.get("Content-Type"), Some("application/json"));
        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(headers.get("Content-Length"), None);
    }

    #[test]
    fn test_contains() {
        let headers = json_headers();
        assert!(headers.contains("Content-Type"));
        assert!(headers.contains("content-type"));
        assert!(!headers.contains("Content-Length"));
    }

    #[test]
    fn test_clear_and_is_empty() {
        let mut headers = json_headers();
        assert!(!headers.is_empty());
        headers.clear().unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_eq() {
        let headers = json_headers();
        assert_eq!(headers, json_headers());
        assert_ne!(headers, Headers::from_pairs([("Content-Type", "text/html")]).unwrap());
        assert_ne!(headers, Headers::from_pairs([("Content-Length", "application/json")]).unwrap());
    }

    #[test]
    fn test_copy_is_mutable() {
        let mut headers = json_headers();
        headers.freeze();

        let mut copy = headers.copy();
        assert!(!copy.is_frozen());
        copy.insert("x-api-key", "123").unwrap();
        assert_eq!(copy.len(), 2);
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_invalid_name() {
        let mut headers = Headers::new();
        let result = headers.insert("bad header", "x");
        assert!(matches!(result, Err(HeaderError::InvalidName { .. })));
    }
}
