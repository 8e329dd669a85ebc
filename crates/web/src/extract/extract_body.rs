use crate::error::BindingError;
use crate::extract::from_request::FromRequest;
use crate::extract::{Form, Json};
use crate::mapper::{FormMapper, JsonMapper, TypeMapper};
use crate::request::Request;
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;

/// The raw body, empty when the request carries none.
#[async_trait]
impl FromRequest for Bytes {
    async fn from_request(req: &Request) -> Result<Self, BindingError> {
        Ok(req.body()?.cloned().unwrap_or_default())
    }
}

#[async_trait]
impl FromRequest for String {
    async fn from_request(req: &Request) -> Result<Self, BindingError> {
        let bytes = Bytes::from_request(req).await?;
        String::from_utf8(bytes.into()).map_err(|_e| BindingError::invalid_param("body", "request body is not utf8"))
    }
}

#[async_trait]
impl<T> FromRequest for Json<T>
where
    T: DeserializeOwned + Send,
{
    async fn from_request(req: &Request) -> Result<Self, BindingError> {
        JsonMapper.map(req).map(Json)
    }
}

#[async_trait]
impl<T> FromRequest for Form<T>
where
    T: DeserializeOwned + Send,
{
    async fn from_request(req: &Request) -> Result<Self, BindingError> {
        FormMapper.map(req).map(Form)
    }
}
