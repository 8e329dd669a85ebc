//! Type mappers: strategies that extract one typed value from a [`Request`].
//!
//! A mapper is an explicit capability, `map(request) -> T`, the target type being the trait's
//! type parameter. The built-in mappers are:
//!
//! - [`JsonMapper`]: the body as JSON, requires an `application/json` content type
//! - [`FormMapper`]: the body as `application/x-www-form-urlencoded`
//! - [`QueryMapper`]: the whole query as one object, with optional defaults
//! - [`QueryParam`]: one named query parameter, with an optional default
//! - [`PathMapper`]: the path params captured by the router as one object
//!
//! The extractors in [`crate::extract`] delegate to these mappers, handlers can also call them
//! directly on an injected [`Request`].

use crate::error::BindingError;
use crate::request::Request;
use bytes::Bytes;
use mime::Mime;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

pub trait TypeMapper<T> {
    fn map(&self, req: &Request) -> Result<T, BindingError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonMapper;

impl<T: DeserializeOwned> TypeMapper<T> for JsonMapper {
    fn map(&self, req: &Request) -> Result<T, BindingError> {
        ensure_content_type(req, "application/json")?;
        let body = non_empty_body(req)?;
        Ok(serde_json::from_slice::<T>(body)?)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FormMapper;

impl<T: DeserializeOwned> TypeMapper<T> for FormMapper {
    fn map(&self, req: &Request) -> Result<T, BindingError> {
        ensure_content_type(req, "application/x-www-form-urlencoded")?;
        let body = non_empty_body(req)?;
        serde_urlencoded::from_bytes::<T>(body).map_err(BindingError::invalid_form)
    }
}

/// Maps the whole query onto `T`, request values take precedence over the defaults.
#[derive(Debug, Default, Clone)]
pub struct QueryMapper {
    defaults: HashMap<String, String>,
}

impl QueryMapper {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }
}

impl<T: DeserializeOwned> TypeMapper<T> for QueryMapper {
    fn map(&self, req: &Request) -> Result<T, BindingError> {
        let mut merged = self.defaults.clone();
        merged.extend(req.query().iter().map(|(k, v)| (k.clone(), v.clone())));

        let encoded = serde_qs::to_string(&merged).map_err(BindingError::invalid_query)?;
        serde_qs::from_str::<T>(&encoded).map_err(BindingError::invalid_query)
    }
}

/// Maps a single named query parameter, converting it with `T::from_str`.
#[derive(Debug, Clone)]
pub struct QueryParam {
    name: String,
    default: Option<String>,
}

impl QueryParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), default: None }
    }

    /// Value used when the parameter is absent; it must parse as the target type too.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> TypeMapper<T> for QueryParam
where
    T: FromStr,
    T::Err: Display,
{
    fn map(&self, req: &Request) -> Result<T, BindingError> {
        let raw = req
            .query()
            .get(&self.name)
            .or(self.default.as_ref())
            .ok_or_else(|| BindingError::missing(&self.name))?;
        raw.parse::<T>().map_err(|e| BindingError::invalid_param(&self.name, e))
    }
}

/// Maps the router's path params onto `T`, field names are param names.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathMapper;

impl<T: DeserializeOwned> TypeMapper<T> for PathMapper {
    fn map(&self, req: &Request) -> Result<T, BindingError> {
        let encoded = serde_urlencoded::to_string(req.params().as_map()).map_err(BindingError::invalid_path)?;
        serde_urlencoded::from_str::<T>(&encoded).map_err(BindingError::invalid_path)
    }
}

/// Compares the essence of the request content type, so parameters like `charset` are ignored.
fn ensure_content_type(req: &Request, expected: &'static str) -> Result<(), BindingError> {
    let actual = req.content_type();
    let matches = actual
        .and_then(|value| value.parse::<Mime>().ok())
        .is_some_and(|mime| mime.essence_str() == expected);

    if matches { Ok(()) } else { Err(BindingError::wrong_content_type(expected, actual)) }
}

fn non_empty_body(req: &Request) -> Result<&Bytes, BindingError> {
    req.body()?.filter(|body| !body.is_empty()).ok_or(BindingError::EmptyBody)
}
