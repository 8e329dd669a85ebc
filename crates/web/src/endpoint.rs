//! Endpoints: a handler bound to a path template and a method.
//!
//! An endpoint owns the handler's default status and headers and its middleware lists. Running
//! an endpoint means running its pre middleware, binding and invoking the handler, then running
//! its post middleware.

use crate::error::HandlerError;
use crate::handler::RequestHandler;
use crate::headers::Headers;
use crate::middleware::{self, NONE_RESULT_POLICY, PostMiddleware, PreMiddleware};
use crate::request::Request;
use crate::responder::Reply;
use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode};
use std::fmt;
use std::sync::Arc;

/// Where merged middleware goes relative to the endpoint's own list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

pub struct Endpoint {
    path: String,
    method: Method,
    status: StatusCode,
    headers: Headers,
    pre_middleware: Vec<Arc<dyn PreMiddleware>>,
    post_middleware: Vec<Arc<dyn PostMiddleware>>,
    handler: Box<dyn RequestHandler>,
}

impl Endpoint {
    /// Path segments written as `{name}` are captured as path params.
    pub fn new<H: RequestHandler + 'static>(method: Method, path: impl Into<String>, handler: H) -> Self {
        Self {
            path: path.into(),
            method,
            status: StatusCode::OK,
            headers: Headers::new(),
            pre_middleware: vec![],
            post_middleware: vec![],
            handler: Box::new(handler),
        }
    }

    /// Status used when the handler returns a bare value.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert_typed(name, value);
        self
    }

    #[must_use]
    pub fn with_pre<M: PreMiddleware + 'static>(mut self, middleware: M) -> Self {
        self.pre_middleware.push(Arc::new(middleware));
        self
    }

    #[must_use]
    pub fn with_post<M: PostMiddleware + 'static>(mut self, middleware: M) -> Self {
        self.post_middleware.push(Arc::new(middleware));
        self
    }

    pub fn add_pre_middlewares(&mut self, middlewares: &[Arc<dyn PreMiddleware>], placement: Placement) {
        merge(&mut self.pre_middleware, middlewares, placement);
    }

    pub fn add_post_middlewares(&mut self, middlewares: &[Arc<dyn PostMiddleware>], placement: Placement) {
        merge(&mut self.post_middleware, middlewares, placement);
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn pre_middleware(&self) -> &[Arc<dyn PreMiddleware>] {
        &self.pre_middleware
    }

    pub fn post_middleware(&self) -> &[Arc<dyn PostMiddleware>] {
        &self.post_middleware
    }

    pub(crate) fn set_path(&mut self, path: String) {
        self.path = path;
    }

    /// Runs pre middleware, the handler and post middleware. Errors are returned untouched.
    ///
    /// The path params of the incoming request survive a request replaced by pre middleware.
    pub async fn call(&self, req: Request) -> Result<Reply, HandlerError> {
        let params = req.params().clone();
        let mut req = middleware::run_pre_chain(&self.pre_middleware, req, NONE_RESULT_POLICY).await?;
        req.set_params(params);
        let reply = self.handler.invoke(req).await?;
        middleware::run_post_chain(&self.post_middleware, reply, NONE_RESULT_POLICY).await
    }
}

fn merge<T: ?Sized>(own: &mut Vec<Arc<T>>, other: &[Arc<T>], placement: Placement) {
    match placement {
        Placement::Before => {
            own.splice(0..0, other.iter().cloned());
        }
        Placement::After => own.extend(other.iter().cloned()),
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("pre_middleware", &self.pre_middleware.len())
            .field("post_middleware", &self.post_middleware.len())
            .finish_non_exhaustive()
    }
}

macro_rules! method_endpoint {
    ($name:ident, $method:ident) => {
        #[doc = concat!("An endpoint answering `", stringify!($method), "` requests on `path`.")]
        pub fn $name<H: RequestHandler + 'static>(path: impl Into<String>, handler: H) -> Endpoint {
            Endpoint::new(Method::$method, path, handler)
        }
    };
}

method_endpoint!(get, GET);
method_endpoint!(post, POST);
method_endpoint!(put, PUT);
method_endpoint!(delete, DELETE);
method_endpoint!(patch, PATCH);
method_endpoint!(head, HEAD);
method_endpoint!(options, OPTIONS);
