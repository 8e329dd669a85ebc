//! The application: turns one [`Request`] into one [`Response`].
//!
//! [`Application::builder`] collects endpoints, controllers, application middleware, the
//! serializer, exception handlers and the DI container. [`ApplicationBuilder::build`] is the
//! single initialization phase: application middleware is merged into every endpoint and the
//! routes are inserted into the trie and cached dependencies of the container are built. The
//! built application is immutable and can be shared between tasks behind an `Arc`.

use crate::controller::Controller;
use crate::di::Container;
use crate::endpoint::{Endpoint, Placement};
use crate::error::{BindingError, HandlerError, HttpException};
use crate::headers::Headers;
use crate::middleware::{PostMiddleware, PreMiddleware};
use crate::request::Request;
use crate::responder::{Reply, Responder};
use crate::response::Response;
use crate::router::Router;
use crate::serializer::{ObjectSerializer, Serialized, Serializer};
use bytes::Bytes;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use std::any::{Any, TypeId, type_name};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

type ExceptionCallback = Box<dyn Fn(&(dyn StdError + 'static)) -> Option<Result<Reply, HandlerError>> + Send + Sync>;

struct ExceptionHandler {
    type_id: TypeId,
    name: &'static str,
    callback: ExceptionCallback,
}

pub struct ApplicationBuilder {
    endpoints: Vec<Endpoint>,
    pre_middleware: Vec<Arc<dyn PreMiddleware>>,
    post_middleware: Vec<Arc<dyn PostMiddleware>>,
    serializer: Serializer,
    container: Container,
    exception_handlers: Vec<ExceptionHandler>,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self {
            endpoints: vec![],
            pre_middleware: vec![],
            post_middleware: vec![],
            serializer: Serializer::new(),
            container: Container::new(),
            exception_handlers: vec![],
        }
        .exception_handler(|e: &HttpException| plain_text(e.status(), e.to_string()))
        .exception_handler(|e: &BindingError| {
            let exception = HttpException::bad_request().with_detail(e);
            plain_text(exception.status(), exception.to_string())
        })
    }

    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    #[must_use]
    pub fn controller(mut self, controller: Controller) -> Self {
        self.endpoints.extend(controller.into_endpoints());
        self
    }

    /// Application pre middleware runs before controller and endpoint pre middleware.
    #[must_use]
    pub fn pre_middleware<M: PreMiddleware + 'static>(mut self, middleware: M) -> Self {
        self.pre_middleware.push(Arc::new(middleware));
        self
    }

    /// Application post middleware runs after endpoint and controller post middleware.
    #[must_use]
    pub fn post_middleware<M: PostMiddleware + 'static>(mut self, middleware: M) -> Self {
        self.post_middleware.push(Arc::new(middleware));
        self
    }

    #[must_use]
    pub fn serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = serializer;
        self
    }

    #[must_use]
    pub fn add_serializer<T, F>(mut self, callback: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> Serialized + Send + Sync + 'static,
    {
        self.serializer.add_serializer(callback);
        self
    }

    #[must_use]
    pub fn add_object_serializer<S: ObjectSerializer + 'static>(mut self, serializer: S) -> Self {
        self.serializer.add_object_serializer(serializer);
        self
    }

    #[must_use]
    pub fn container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Maps errors of type `E` to a reply, replacing an earlier handler for the same type.
    ///
    /// A reply that is not a [`Response`] is rendered with status 500 unless it carries its own.
    #[must_use]
    pub fn exception_handler<E, F, R>(mut self, callback: F) -> Self
    where
        E: StdError + 'static,
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: Responder,
    {
        let handler = ExceptionHandler {
            type_id: TypeId::of::<E>(),
            name: type_name::<E>(),
            callback: Box::new(move |error: &(dyn StdError + 'static)| {
                error.downcast_ref::<E>().map(|e| callback(e).into_reply())
            }),
        };

        match self.exception_handlers.iter_mut().find(|existing| existing.type_id == handler.type_id) {
            Some(existing) => *existing = handler,
            None => self.exception_handlers.push(handler),
        }
        self
    }

    pub fn build(self) -> Application {
        let Self { endpoints, pre_middleware, post_middleware, serializer, container, exception_handlers } = self;

        let mut router = Router::new();
        for mut endpoint in endpoints {
            endpoint.add_pre_middlewares(&pre_middleware, Placement::Before);
            endpoint.add_post_middlewares(&post_middleware, Placement::After);
            router.add_route(endpoint);
        }

        if let Err(e) = container.warm_up() {
            warn!(cause = %e, "cached dependencies could not be built ahead of time");
        }

        info!(routes = router.len(), exception_handlers = exception_handlers.len(), "application built");
        Application { router, serializer, container, exception_handlers }
    }
}

pub struct Application {
    router: Router,
    serializer: Serializer,
    container: Container,
    exception_handlers: Vec<ExceptionHandler>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Dispatches one request. Every failure is turned into a response, this never errors.
    pub async fn run(&self, req: Request) -> Response {
        match self.dispatch(req).await {
            Ok(response) => response,
            Err(e) => self.handle_error(&e),
        }
    }

    /// Transport boundary: same as [`Application::run`] on `http` types.
    pub async fn run_http(&self, req: http::Request<Bytes>) -> http::Response<Bytes> {
        match Request::try_from(req) {
            Ok(req) => self.run(req).await.into_http(),
            Err(e) => {
                warn!(cause = %e, "rejecting undecodable request");
                plain_text(StatusCode::BAD_REQUEST, format!("400 - {e}")).into_http()
            }
        }
    }

    async fn dispatch(&self, mut req: Request) -> Result<Response, HandlerError> {
        let (endpoint, params) = match self.router.at(req.path(), req.method()) {
            Ok(matched) => matched.into_parts(),
            Err(e) => {
                debug!(cause = %e, "no endpoint");
                return Err(HttpException::not_found().into());
            }
        };

        req.set_params(params);
        let reply = endpoint.call(req).await?;
        self.render(reply, endpoint.status(), endpoint.headers())
    }

    fn render(&self, reply: Reply, status: StatusCode, headers: &Headers) -> Result<Response, HandlerError> {
        match reply {
            Reply::Response(response) => Ok(response),
            Reply::Value { payload, status: reply_status, headers: reply_headers } => {
                let (body, content_type) = self.serializer.serialize(&payload)?;

                let mut merged = headers.copy();
                if let Some(reply_headers) = reply_headers {
                    merged.extend(&reply_headers)?;
                }
                merged.insert(CONTENT_TYPE.as_str(), &content_type)?;

                Ok(Response::with_headers(reply_status.unwrap_or(status), body, merged))
            }
        }
    }

    /// Looks for a handler for the error itself, then for each of its sources in turn.
    fn handle_error(&self, e: &HandlerError) -> Response {
        for cause in e.chain() {
            let Some((handler, result)) =
                self.exception_handlers.iter().find_map(|handler| (handler.callback)(cause).map(|r| (handler, r)))
            else {
                continue;
            };

            let rendered = result.and_then(|reply| self.render(reply, StatusCode::INTERNAL_SERVER_ERROR, &Headers::new()));
            return match rendered {
                Ok(response) => {
                    warn!(cause = %e, handler = handler.name, status = response.status().as_u16(), "handled error");
                    response
                }
                Err(render_error) => {
                    error!(cause = %e, handler = handler.name, render_error = %render_error, "exception handler failed");
                    internal_error(e)
                }
            };
        }

        error!(cause = %e, error_type = e.type_name(), "unhandled error");
        internal_error(e)
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("routes", &self.router.len())
            .field("serializer", &self.serializer)
            .field("container", &self.container)
            .field("exception_handlers", &self.exception_handlers.iter().map(|h| h.name).collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("endpoints", &self.endpoints)
            .field("pre_middleware", &self.pre_middleware.len())
            .field("post_middleware", &self.post_middleware.len())
            .finish_non_exhaustive()
    }
}

fn plain_text(status: StatusCode, body: String) -> Response {
    Response::with_headers(status, body, Headers::with_content_type("text/plain"))
}

fn internal_error(e: &HandlerError) -> Response {
    plain_text(StatusCode::INTERNAL_SERVER_ERROR, format!("500 - Internal Server Error: {}({e})", e.short_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::get;
    use crate::handler::handler_fn;

    #[derive(thiserror::Error, Debug)]
    #[error("boom")]
    struct Boom;

    async fn boom() -> Result<String, Boom> {
        Err(Boom)
    }

    async fn hello() -> &'static str {
        "hello"
    }

    #[tokio::test]
    async fn test_run() {
        let app = Application::builder().endpoint(get("/", handler_fn(hello))).build();
        let response = app.run(Request::builder().build().unwrap()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text(), "hello");
        assert_eq!(response.content_type(), Some("text/html"));
    }

    #[tokio::test]
    async fn test_replacing_exception_handler() {
        let app = Application::builder()
            .endpoint(get("/", handler_fn(boom)))
            .exception_handler(|_e: &Boom| "first")
            .exception_handler(|_e: &Boom| (StatusCode::SERVICE_UNAVAILABLE, "second"))
            .build();

        let response = app.run(Request::builder().build().unwrap()).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.text(), "second");
    }

    #[tokio::test]
    async fn test_run_http() {
        let app = Application::builder().endpoint(get("/hello", handler_fn(hello))).build();
        let req = http::Request::builder().uri("/hello?x=1").body(Bytes::new()).unwrap();

        let response = app.run_http(req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html");
        assert_eq!(response.body().as_ref(), b"hello");
    }
}
