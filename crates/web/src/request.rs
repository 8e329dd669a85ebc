//! Request value object handed to the dispatch pipeline by the transport adapter.
//!
//! This module contains:
//! - `Request`: method, path, headers, query, path params and body of one inbound call
//! - `RequestBuilder`: builds a `Request`, accepting the method in any case
//! - `PathParams`: named segments captured by the router, e.g. `id` in `/users/{id}`

use crate::error::{BindingError, RequestError};
use crate::headers::Headers;
use crate::mapper::{QueryParam, TypeMapper};
use bytes::Bytes;
use http::Method;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// One inbound call.
///
/// Headers are frozen and query/params are only exposed by shared reference, so handler code
/// sees a read-only view. The only mutation after construction is the dispatcher assigning the
/// path params right before the matched endpoint runs.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: Headers,
    query: HashMap<String, String>,
    params: PathParams,
    body: Option<Bytes>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Path parameters, empty until the router has matched the request.
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(http::header::CONTENT_TYPE.as_str())
    }

    /// Returns the body, refusing to do so for `GET` requests.
    pub fn body(&self) -> Result<Option<&Bytes>, BindingError> {
        if self.method == Method::GET {
            return Err(BindingError::BodyNotAllowed { method: self.method.clone() });
        }
        Ok(self.body.as_ref())
    }

    /// Returns the body without the method check.
    pub fn raw_body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Looks up a path param and converts it with `T::from_str`.
    pub fn param<T>(&self, name: &str) -> Result<T, BindingError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.params.get(name).ok_or_else(|| BindingError::missing(name))?;
        raw.parse::<T>().map_err(|e| BindingError::invalid_param(name, e))
    }

    /// Looks up a query param and converts it with `T::from_str`.
    pub fn query_param<T>(&self, name: &str) -> Result<T, BindingError>
    where
        T: FromStr,
        T::Err: Display,
    {
        QueryParam::new(name).map(self)
    }

    /// A builder pre-filled with every part of this request, for middleware that replaces it.
    ///
    /// Header values that are not visible ASCII are dropped.
    pub fn to_builder(&self) -> RequestBuilder {
        RequestBuilder {
            method: self.method.as_str().to_owned(),
            path: self.path.clone(),
            headers: self.headers.iter().map(|(name, value)| (name.to_owned(), value.to_owned())).collect(),
            query: self.query.clone(),
            params: self.params.clone(),
            body: self.body.clone(),
        }
    }

    pub(crate) fn set_params(&mut self, params: PathParams) {
        self.params = params;
    }
}

/// Decodes a request coming from the transport adapter.
impl TryFrom<http::Request<Bytes>> for Request {
    type Error = RequestError;

    fn try_from(request: http::Request<Bytes>) -> Result<Self, Self::Error> {
        let (parts, body) = request.into_parts();

        let query = match parts.uri.query() {
            Some(raw) => serde_urlencoded::from_str::<Vec<(String, String)>>(raw)
                .map_err(|e| RequestError::InvalidQuery { reason: e.to_string() })?
                .into_iter()
                .collect(),
            None => HashMap::new(),
        };

        let mut headers = Headers::from(parts.headers);
        headers.freeze();

        Ok(Request {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            headers,
            query,
            params: PathParams::empty(),
            body: if body.is_empty() { None } else { Some(body) },
        })
    }
}

#[derive(Debug)]
pub struct RequestBuilder {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    query: HashMap<String, String>,
    params: PathParams,
    body: Option<Bytes>,
}

impl RequestBuilder {
    fn new() -> Self {
        Self {
            method: Method::GET.to_string(),
            path: "/".to_owned(),
            headers: vec![],
            query: HashMap::new(),
            params: PathParams::empty(),
            body: None,
        }
    }

    #[must_use]
    pub fn method(mut self, method: impl AsRef<str>) -> Self {
        method.as_ref().clone_into(&mut self.method);
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Pre-populates a path param, the router overwrites them on dispatch.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> Result<Request, RequestError> {
        let method = parse_method(&self.method)?;
        let mut headers = Headers::from_pairs(self.headers)?;
        headers.freeze();

        Ok(Request { method, path: self.path, headers, query: self.query, params: self.params, body: self.body })
    }
}

/// Parses a method name case-insensitively, `get` and `GET` are the same method.
pub fn parse_method(method: &str) -> Result<Method, RequestError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_e| RequestError::InvalidMethod(method.to_owned()))
}

/// Path parameters extracted from the URL path of a request.
///
/// Path parameters are named segments in the route template. For example, in the template
/// `/users/{id}`, `id` is a path parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    inner: HashMap<String, String>,
}

impl PathParams {
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Gets the value of a path parameter by its name
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        self.inner.get(key.as_ref()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn as_map(&self) -> &HashMap<String, String> {
        &self.inner
    }

    pub(crate) fn insert(&mut self, key: String, value: String) {
        self.inner.insert(key, value);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}
