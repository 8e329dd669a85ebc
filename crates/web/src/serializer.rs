//! Content-negotiating serializer: turns a [`Payload`] into `(body, content type)`.
//!
//! Resolution order:
//!
//! 1. lists: every element on its own, collected into a json array
//! 2. text, numbers, booleans and empty values: their string form as `text/html`
//! 3. records and maps: a json document as `application/json`
//! 4. objects: the callback registered for the exact type, then the first
//!    [`ObjectSerializer`] whose `matches` accepts the value
//!
//! Anything left fails with [`SerializationError::Unsupported`]. Serialization is pure, the
//! same payload and registry always give the same output.

use crate::error::SerializationError;
use crate::payload::{Opaque, Payload};
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::io;

pub const TEXT_HTML: &str = "text/html";
pub const APPLICATION_JSON: &str = "application/json";

/// What a type or object serializer produces for one value.
#[derive(Debug, Clone, PartialEq)]
pub enum Serialized {
    /// Sent as `text/html`.
    Text(String),
    /// Json encoded and sent as `application/json`.
    Map(Map<String, Value>),
    /// Sent verbatim with its own content type.
    Typed { body: String, content_type: Cow<'static, str> },
}

impl Serialized {
    pub fn typed(body: impl Into<String>, content_type: impl Into<Cow<'static, str>>) -> Self {
        Self::Typed { body: body.into(), content_type: content_type.into() }
    }
}

/// Extension point for values no type callback claims.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectSerializer: Send + Sync {
    fn matches(&self, value: &dyn Any) -> bool;

    fn serialize(&self, value: &dyn Any) -> Serialized;
}

type TypeCallback = Box<dyn Fn(&dyn Any) -> Option<Serialized> + Send + Sync>;

#[derive(Default)]
pub struct Serializer {
    types: HashMap<TypeId, TypeCallback>,
    object_serializers: Vec<Box<dyn ObjectSerializer>>,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the callback for values of exactly type `T`, replacing a previous one.
    pub fn add_serializer<T, F>(&mut self, callback: F)
    where
        T: Any,
        F: Fn(&T) -> Serialized + Send + Sync + 'static,
    {
        let erased: TypeCallback = Box::new(move |value: &dyn Any| value.downcast_ref::<T>().map(&callback));
        self.types.insert(TypeId::of::<T>(), erased);
    }

    /// Appends an object serializer, earlier ones win.
    pub fn add_object_serializer<S: ObjectSerializer + 'static>(&mut self, serializer: S) {
        self.object_serializers.push(Box::new(serializer));
    }

    pub fn serialize(&self, payload: &Payload) -> Result<(String, Cow<'static, str>), SerializationError> {
        let html = |body: String| (body, Cow::Borrowed(TEXT_HTML));
        let json = |body: String| (body, Cow::Borrowed(APPLICATION_JSON));

        Ok(match payload {
            Payload::Empty => html(String::new()),
            Payload::Text(text) => html(text.clone()),
            Payload::Number(number) => html(number.to_string()),
            Payload::Bool(b) => html(b.to_string()),
            Payload::Record(value) => json(to_json(value)?),
            Payload::Map(map) => json(to_json(map)?),
            Payload::List(items) => {
                let values = items.iter().map(|item| self.to_value(item)).collect::<Result<Vec<_>, _>>()?;
                json(to_json(&values)?)
            }
            Payload::Object(object) => match self.serialize_object(object)? {
                Serialized::Text(text) => html(text),
                Serialized::Map(map) => json(to_json(&map)?),
                Serialized::Typed { body, content_type } => (body, content_type),
            },
        })
    }

    fn serialize_object(&self, object: &Opaque) -> Result<Serialized, SerializationError> {
        if let Some(serialized) = self.types.get(&object.type_id()).and_then(|callback| callback(object.value())) {
            return Ok(serialized);
        }

        self.object_serializers
            .iter()
            .find(|serializer| serializer.matches(object.value()))
            .map(|serializer| serializer.serialize(object.value()))
            .ok_or_else(|| SerializationError::unsupported(object.type_name()))
    }

    /// A list element as a json value; its own content type is dropped.
    fn to_value(&self, payload: &Payload) -> Result<Value, SerializationError> {
        Ok(match payload {
            Payload::Empty => Value::Null,
            Payload::Text(text) => Value::String(text.clone()),
            Payload::Number(number) => Value::Number(number.clone()),
            Payload::Bool(b) => Value::Bool(*b),
            Payload::Record(value) => value.clone(),
            Payload::Map(map) => Value::Object(map.clone()),
            Payload::List(items) => {
                Value::Array(items.iter().map(|item| self.to_value(item)).collect::<Result<_, _>>()?)
            }
            Payload::Object(object) => match self.serialize_object(object)? {
                Serialized::Text(text) | Serialized::Typed { body: text, .. } => Value::String(text),
                Serialized::Map(map) => Value::Object(map),
            },
        })
    }
}

impl std::fmt::Debug for Serializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Serializer")
            .field("types", &self.types.len())
            .field("object_serializers", &self.object_serializers.len())
            .finish()
    }
}

/// Json with `", "` and `": "` separators, e.g. `{"k": "v"}` and `[1, 2, 3]`.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, SerializationError> {
    let mut buf = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf)?)
}

struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}
