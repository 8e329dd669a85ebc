//! Converts handler results into [`Reply`] values.
//!
//! A handler may return a ready [`Response`], which is passed through untouched, or a value
//! that still has to be serialized, optionally paired with a status and extra headers:
//!
//! - `body`
//! - `(body,)`
//! - `(body, status)` or `(status, body)`
//! - `(body, status, headers)`
//!
//! Missing parts fall back to the endpoint's declared status and headers.

use crate::error::HandlerError;
use crate::extract::Json;
use crate::headers::Headers;
use crate::payload::{IntoPayload, Payload};
use crate::response::Response;
use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// What a handler produced, as seen by post middleware.
#[derive(Debug)]
pub enum Reply {
    Response(Response),
    Value { payload: Payload, status: Option<StatusCode>, headers: Option<Headers> },
}

impl Reply {
    pub fn value(payload: Payload) -> Self {
        Self::Value { payload, status: None, headers: None }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Response(response) => Some(response.status()),
            Self::Value { status, .. } => *status,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Response(_) => None,
            Self::Value { payload, .. } => Some(payload),
        }
    }

    /// `true` for a value reply whose payload is falsy: nothing, `""`, `0`, `false`, or an empty
    /// list, map or record. A [`Response`] is never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Response(_) => false,
            Self::Value { payload, .. } => payload.is_falsy(),
        }
    }
}

/// A trait for types that can be returned from request handlers.
pub trait Responder {
    fn into_reply(self) -> Result<Reply, HandlerError>;
}

impl Responder for Reply {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(self)
    }
}

impl Responder for Response {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Response(self))
    }
}

/// The error half is routed to the application's exception handlers.
impl<T, E> Responder for Result<T, E>
where
    T: Responder,
    E: Into<HandlerError>,
{
    fn into_reply(self) -> Result<Reply, HandlerError> {
        self.map_err(Into::into)?.into_reply()
    }
}

impl<T: IntoPayload> Responder for (T,) {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::value(self.0.into_payload()?))
    }
}

impl<T: IntoPayload> Responder for (T, StatusCode) {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        let (body, status) = self;
        Ok(Reply::Value { payload: body.into_payload()?, status: Some(status), headers: None })
    }
}

impl<T: IntoPayload> Responder for (StatusCode, T) {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        let (status, body) = self;
        (body, status).into_reply()
    }
}

impl<T: IntoPayload> Responder for (T, StatusCode, Headers) {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        let (body, status, headers) = self;
        Ok(Reply::Value { payload: body.into_payload()?, status: Some(status), headers: Some(headers) })
    }
}

macro_rules! impl_responder_for_payload {
    ($($ty:ty),* $(,)?) => {
        $(
        impl Responder for $ty {
            fn into_reply(self) -> Result<Reply, HandlerError> {
                Ok(Reply::value(self.into_payload()?))
            }
        }
        )*
    };
}

impl_responder_for_payload! {
    Payload, (), String, &'static str, Bytes, bool,
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64,
    Value, Map<String, Value>,
}

impl<T: IntoPayload> Responder for Option<T> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::value(self.into_payload()?))
    }
}

impl<T: IntoPayload> Responder for Vec<T> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::value(self.into_payload()?))
    }
}

impl<T: Serialize> Responder for Json<T> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::value(self.into_payload()?))
    }
}

impl<V: Serialize, S> Responder for HashMap<String, V, S> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::value(self.into_payload()?))
    }
}

impl<V: Serialize> Responder for BTreeMap<String, V> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::value(self.into_payload()?))
    }
}
