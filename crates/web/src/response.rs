//! The wire-ready result of one dispatch.

use crate::headers::Headers;
use bytes::Bytes;
use http::StatusCode;
use http::header::CONTENT_TYPE;

/// Status, body and frozen headers of one outbound call.
///
/// A response built with [`Response::new`] carries `content-type: text/html` unless the
/// headers say otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    body: Bytes,
    headers: Headers,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::with_headers(status, body, Headers::with_content_type("text/html"))
    }

    /// Builds a response with exactly these headers, they are frozen afterwards.
    pub fn with_headers(status: StatusCode, body: impl Into<Bytes>, mut headers: Headers) -> Self {
        headers.freeze();
        Self { status, body: body.into(), headers }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as text, invalid utf-8 sequences are replaced.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE.as_str())
    }

    pub fn into_http(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.into_header_map();
        response
    }
}

impl From<Response> for http::Response<Bytes> {
    fn from(response: Response) -> Self {
        response.into_http()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_content_type_is_html() {
        let response = Response::new(StatusCode::IM_A_TEAPOT, "I'm a teapot");
        assert_eq!(response.status().as_u16(), 418);
        assert_eq!(response.content_type(), Some("text/html"));
        assert_eq!(response.text(), "I'm a teapot");
        assert!(response.headers().is_frozen());
    }

    #[test]
    fn test_into_http() {
        let headers = Headers::from_pairs([("Content-Type", "application/json"), ("X-Id", "7")]).unwrap();
        let response = Response::with_headers(StatusCode::CREATED, "{}", headers).into_http();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-id"], "7");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.body().as_ref(), b"{}");
    }
}
