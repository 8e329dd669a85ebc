//! Handler return values before serialization.
//!
//! A [`Payload`] is the closed set of shapes the [`Serializer`](crate::Serializer) knows how to
//! encode: scalars, records and maps, lists, and opaque objects which need a registered
//! serializer. [`IntoPayload`] converts plain Rust values into it.

use crate::error::SerializationError;
use crate::extract::Json;
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::any::{Any, TypeId, type_name};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug)]
pub enum Payload {
    /// No value, e.g. a handler returning `()` or `None`.
    Empty,
    Text(String),
    Number(Number),
    Bool(bool),
    /// A struct-like value already converted field by field.
    Record(Value),
    Map(Map<String, Value>),
    /// Each element is serialized on its own, the results form a json array.
    List(Vec<Payload>),
    /// A value only a registered serializer understands.
    Object(Opaque),
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Converts any serializable value into a record.
    pub fn record<T: Serialize + ?Sized>(value: &T) -> Result<Self, SerializationError> {
        Ok(Self::Record(serde_json::to_value(value)?))
    }

    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self::Object(Opaque::new(value))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Empty, or a zero, `false`, empty text or empty collection.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            Self::Number(number) => number.as_f64().is_some_and(|n| n.abs() < f64::EPSILON),
            Self::Bool(b) => !b,
            Self::Record(Value::Array(items)) => items.is_empty(),
            Self::Record(Value::Object(fields)) | Self::Map(fields) => fields.is_empty(),
            Self::Record(Value::Null) => true,
            Self::Record(_) | Self::Object(_) => false,
            Self::List(items) => items.is_empty(),
        }
    }
}

/// A type-erased value waiting for a type or object serializer.
pub struct Opaque {
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self { type_id: TypeId::of::<T>(), type_name: type_name::<T>(), value: Box::new(value) }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn value(&self) -> &dyn Any {
        self.value.as_ref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque").field("type_name", &self.type_name).finish_non_exhaustive()
    }
}

pub trait IntoPayload {
    fn into_payload(self) -> Result<Payload, SerializationError>;
}

impl IntoPayload for Payload {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        Ok(self)
    }
}

impl IntoPayload for () {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        Ok(Payload::Empty)
    }
}

impl IntoPayload for String {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        Ok(Payload::Text(self))
    }
}

impl IntoPayload for &'static str {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        Ok(Payload::Text(self.to_owned()))
    }
}

/// Bytes are decoded as utf-8 text.
impl IntoPayload for Bytes {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        Ok(Payload::Text(String::from_utf8(self.into())?))
    }
}

impl IntoPayload for bool {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        Ok(Payload::Bool(self))
    }
}

macro_rules! impl_into_payload_for_integer {
    ($($ty:ty),* $(,)?) => {
        $(
        impl IntoPayload for $ty {
            fn into_payload(self) -> Result<Payload, SerializationError> {
                Ok(Payload::Number(Number::from(self)))
            }
        }
        )*
    };
}

impl_into_payload_for_integer! { i8, i16, i32, i64, isize, u8, u16, u32, u64, usize }

macro_rules! impl_into_payload_for_float {
    ($($ty:ty),* $(,)?) => {
        $(
        /// Non-finite values have no json number form and are rendered as text.
        impl IntoPayload for $ty {
            fn into_payload(self) -> Result<Payload, SerializationError> {
                Ok(Number::from_f64(f64::from(self)).map_or_else(|| Payload::Text(self.to_string()), Payload::Number))
            }
        }
        )*
    };
}

impl_into_payload_for_float! { f32, f64 }

impl<T: IntoPayload> IntoPayload for Option<T> {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        self.map_or(Ok(Payload::Empty), IntoPayload::into_payload)
    }
}

impl<T: IntoPayload> IntoPayload for Vec<T> {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        self.into_iter().map(IntoPayload::into_payload).collect::<Result<Vec<_>, _>>().map(Payload::List)
    }
}

impl<T: Serialize> IntoPayload for Json<T> {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        Payload::record(&self.0)
    }
}

impl IntoPayload for Value {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        Ok(match self {
            Value::Null => Payload::Empty,
            Value::Bool(b) => Payload::Bool(b),
            Value::Number(n) => Payload::Number(n),
            Value::String(s) => Payload::Text(s),
            Value::Object(map) => Payload::Map(map),
            array @ Value::Array(_) => Payload::Record(array),
        })
    }
}

impl IntoPayload for Map<String, Value> {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        Ok(Payload::Map(self))
    }
}

impl<V: Serialize, S> IntoPayload for HashMap<String, V, S> {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        into_map(self)
    }
}

impl<V: Serialize> IntoPayload for BTreeMap<String, V> {
    fn into_payload(self) -> Result<Payload, SerializationError> {
        into_map(self)
    }
}

fn into_map<I, V>(entries: I) -> Result<Payload, SerializationError>
where
    I: IntoIterator<Item = (String, V)>,
    V: Serialize,
{
    entries
        .into_iter()
        .map(|(key, value)| serde_json::to_value(value).map(|value| (key, value)))
        .collect::<Result<Map<_, _>, _>>()
        .map(Payload::Map)
        .map_err(SerializationError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Client {
        name: &'static str,
        age: u8,
    }

    #[test]
    fn test_scalars() {
        assert!(matches!(().into_payload().unwrap(), Payload::Empty));
        assert!(matches!(None::<String>.into_payload().unwrap(), Payload::Empty));
        assert!(matches!(true.into_payload().unwrap(), Payload::Bool(true)));
        assert!(matches!(Bytes::from_static(b"x").into_payload().unwrap(), Payload::Text(s) if s == "x"));
        assert!(matches!(f64::NAN.into_payload().unwrap(), Payload::Text(s) if s == "NaN"));
    }

    #[test]
    fn test_invalid_utf8() {
        let result = Bytes::from_static(&[0xff, 0xfe]).into_payload();
        assert!(matches!(result, Err(SerializationError::InvalidUtf8 { .. })));
    }

    #[test]
    fn test_record_is_field_by_field() {
        let payload = Json(Client { name: "Ana", age: 3 }).into_payload().unwrap();
        assert!(matches!(payload, Payload::Record(value) if value == json!({"name": "Ana", "age": 3})));
    }

    #[test]
    fn test_object_keeps_type() {
        let payload = Payload::object(42_u16);
        let Payload::Object(opaque) = payload else { panic!("expected an object payload") };
        assert_eq!(opaque.type_id(), TypeId::of::<u16>());
        assert_eq!(opaque.downcast_ref::<u16>(), Some(&42));
    }
}
