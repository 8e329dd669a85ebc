use crate::error::BindingError;
use crate::request::Request;
use async_trait::async_trait;

/// Builds one handler argument from the request.
///
/// Extraction only borrows the request, so several arguments can read the same body.
#[async_trait]
pub trait FromRequest: Sized + Send {
    async fn from_request(req: &Request) -> Result<Self, BindingError>;
}

/// Optional argument: any binding failure becomes `None`.
#[async_trait]
impl<T> FromRequest for Option<T>
where
    T: FromRequest,
{
    async fn from_request(req: &Request) -> Result<Self, BindingError> {
        Ok(T::from_request(req).await.ok())
    }
}

/// Lets the handler inspect the binding failure itself.
#[async_trait]
impl<T> FromRequest for Result<T, BindingError>
where
    T: FromRequest,
{
    async fn from_request(req: &Request) -> Result<Self, BindingError> {
        Ok(T::from_request(req).await)
    }
}

#[async_trait]
impl FromRequest for () {
    async fn from_request(_req: &Request) -> Result<Self, BindingError> {
        Ok(())
    }
}
