use crate::error::BindingError;
use crate::extract::from_request::FromRequest;
use crate::headers::Headers;
use crate::request::{PathParams, Request};
use async_trait::async_trait;
use http::Method;

#[async_trait]
impl FromRequest for Request {
    async fn from_request(req: &Request) -> Result<Self, BindingError> {
        Ok(req.clone())
    }
}

#[async_trait]
impl FromRequest for Method {
    async fn from_request(req: &Request) -> Result<Self, BindingError> {
        Ok(req.method().clone())
    }
}

#[async_trait]
impl FromRequest for Headers {
    async fn from_request(req: &Request) -> Result<Self, BindingError> {
        Ok(req.headers().clone())
    }
}

#[async_trait]
impl FromRequest for PathParams {
    async fn from_request(req: &Request) -> Result<Self, BindingError> {
        Ok(req.params().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_is_injected_whole() {
        let req = Request::builder().method("put").path("/clients/1").param("id", "1").build().unwrap();
        let injected = Request::from_request(&req).await.unwrap();

        assert_eq!(injected.method(), Method::PUT);
        assert_eq!(injected.path(), "/clients/1");
        assert_eq!(injected.params().get("id"), Some("1"));
    }

    #[tokio::test]
    async fn test_injected_headers_stay_frozen() {
        let req = Request::builder().header("Accept", "text/html").build().unwrap();
        let headers = Headers::from_request(&req).await.unwrap();
        assert!(headers.is_frozen());
        assert_eq!(headers.get("accept"), Some("text/html"));
    }
}
