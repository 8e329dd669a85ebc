//! Error taxonomy of the dispatch pipeline.
//!
//! Every failure that can happen between receiving a [`Request`](crate::Request) and producing a
//! [`Response`](crate::Response) is modelled here:
//!
//! - [`RoutingError`]: no endpoint matches the method and path
//! - [`BindingError`]: a handler argument could not be built from the request
//! - [`SerializationError`]: a handler's return value has no serializer
//! - [`DependencyError`]: the DI container could not build a dependency
//! - [`HttpException`]: an error raised on purpose by application code, carrying a status
//!
//! All of them travel through the pipeline as a [`HandlerError`], which is what the
//! [`Application`](crate::Application) exception handlers get to see.

use http::{Method, StatusCode};
use std::any::type_name;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("no route matches {method} {path}")]
    NotFound { method: Method, path: String },
}

impl RoutingError {
    pub fn not_found<S: ToString>(method: &Method, path: S) -> Self {
        Self::NotFound { method: method.clone(), path: path.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum BindingError {
    #[error("wrong mimetype for converter: expected {expected}, got {actual:?}")]
    WrongContentType { expected: &'static str, actual: Option<String> },

    #[error("empty body")]
    EmptyBody,

    #[error("{method} request can't have a body")]
    BodyNotAllowed { method: Method },

    #[error("parameter {name} not found in request")]
    MissingParam { name: String },

    #[error("invalid value for parameter {name}: {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("invalid json body: {source}")]
    InvalidJson {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    #[error("invalid form body: {reason}")]
    InvalidForm { reason: String },

    #[error("invalid path params: {reason}")]
    InvalidPath { reason: String },
}

impl BindingError {
    pub fn wrong_content_type(expected: &'static str, actual: Option<&str>) -> Self {
        Self::WrongContentType { expected, actual: actual.map(str::to_owned) }
    }

    pub fn missing<S: ToString>(name: S) -> Self {
        Self::MissingParam { name: name.to_string() }
    }

    pub fn invalid_param<N: ToString, R: ToString>(name: N, reason: R) -> Self {
        Self::InvalidParam { name: name.to_string(), reason: reason.to_string() }
    }

    pub fn invalid_query<S: ToString>(reason: S) -> Self {
        Self::InvalidQuery { reason: reason.to_string() }
    }

    pub fn invalid_form<S: ToString>(reason: S) -> Self {
        Self::InvalidForm { reason: reason.to_string() }
    }

    pub fn invalid_path<S: ToString>(reason: S) -> Self {
        Self::InvalidPath { reason: reason.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("could not serialize value of type {type_name}")]
    Unsupported { type_name: &'static str },

    #[error("bytes are not valid utf-8: {source}")]
    InvalidUtf8 {
        #[from]
        source: std::string::FromUtf8Error,
    },

    #[error("json encoding failed: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl SerializationError {
    pub fn unsupported(type_name: &'static str) -> Self {
        Self::Unsupported { type_name }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("undefined dependency: {0}")]
    Undefined(&'static str),

    #[error("cyclic dependency detected: {0}")]
    Cyclic(String),

    #[error("dependency {0} produced an instance of an unexpected type")]
    Mismatch(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("headers are frozen")]
    Frozen,

    #[error("invalid header name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid header value for {name:?}: {reason}")]
    InvalidValue { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("invalid http method {0:?}")]
    InvalidMethod(String),

    #[error("invalid header: {source}")]
    InvalidHeader {
        #[from]
        source: HeaderError,
    },

    #[error("invalid query string: {reason}")]
    InvalidQuery { reason: String },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiddlewareError {
    #[error("{stage} middleware returned no value")]
    EmptyResult { stage: &'static str },
}

/// An error raised by application code on purpose, mapped to a response with its own status.
///
/// ```
/// use micro_dispatch::HttpException;
///
/// let e = HttpException::not_found().with_detail("Client not found");
/// assert_eq!(e.status().as_u16(), 404);
/// assert_eq!(e.to_string(), "404 - Client not found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpException {
    status: StatusCode,
    title: Cow<'static, str>,
    detail: Option<String>,
}

impl HttpException {
    pub fn new(status: StatusCode, title: impl Into<Cow<'static, str>>) -> Self {
        Self { status, title: title.into(), detail: None }
    }

    #[must_use]
    pub fn with_detail<S: ToString>(mut self, detail: S) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

macro_rules! defined_exception {
    ($name:ident, $status:ident, $title:literal) => {
        #[doc = concat!("`", stringify!($status), "` with the title \"", $title, "\".")]
        pub fn $name() -> Self {
            Self::new(StatusCode::$status, $title)
        }
    };
}

impl HttpException {
    defined_exception!(bad_request, BAD_REQUEST, "Bad request");
    defined_exception!(unauthorized, UNAUTHORIZED, "Unauthorized");
    defined_exception!(forbidden, FORBIDDEN, "Forbidden");
    defined_exception!(not_found, NOT_FOUND, "Resource not found");
    defined_exception!(internal_server_error, INTERNAL_SERVER_ERROR, "Internal server error");
    defined_exception!(not_implemented, NOT_IMPLEMENTED, "Not implemented");
    defined_exception!(bad_gateway, BAD_GATEWAY, "Bad gateway");
}

impl fmt::Display for HttpException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.status.as_u16(), self.detail.as_deref().unwrap_or(&self.title))
    }
}

impl StdError for HttpException {}

/// The type-erased error that flows out of middleware, binding and handler callbacks.
///
/// Any `std::error::Error + Send + Sync + 'static` converts into it, so handlers can use `?`
/// freely. The concrete type name is captured at conversion time, since the fallback
/// response reports it.
pub struct HandlerError {
    type_name: &'static str,
    inner: Box<dyn StdError + Send + Sync>,
}

impl<E> From<E> for HandlerError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self { type_name: type_name::<E>(), inner: Box::new(error) }
    }
}

impl HandlerError {
    pub fn new<E: StdError + Send + Sync + 'static>(error: E) -> Self {
        Self::from(error)
    }

    /// Full path of the concrete error type, e.g. `micro_dispatch::error::BindingError`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The concrete error type without module path or generic arguments, e.g. `BindingError`.
    pub fn short_name(&self) -> &'static str {
        let without_generics = self.type_name.split('<').next().unwrap_or(self.type_name);
        without_generics.rsplit("::").next().unwrap_or(without_generics)
    }

    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.inner.is::<E>()
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Iterates the error itself followed by its `source()` chain.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        let head: &(dyn StdError + 'static) = self.inner.as_ref();
        std::iter::successors(Some(head), |e: &&(dyn StdError + 'static)| (*e).source())
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError").field("type_name", &self.type_name).field("inner", &self.inner).finish()
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}
