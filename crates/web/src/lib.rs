//! A small request dispatch framework.
//!
//! An [`Application`] takes a [`Request`] handed over by a transport adapter and produces a
//! [`Response`]:
//!
//! 1. the trie [`Router`] finds the [`Endpoint`] for the method and path and captures path
//!    params
//! 2. the endpoint runs its pre middleware, binds the handler arguments through
//!    [`FromRequest`] and the [type mappers](mapper), calls the handler and runs its post
//!    middleware
//! 3. the [`Serializer`] turns the returned value into a body and a content type
//! 4. any error on the way is mapped by the registered exception handlers, or turned into a
//!    plain 500 response
//!
//! ```
//! use micro_dispatch::extract::Path;
//! use micro_dispatch::{Application, Request, get, handler_fn};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Id {
//!     id: u32,
//! }
//!
//! async fn client(Path(Id { id }): Path<Id>) -> String {
//!     format!("client {id}")
//! }
//!
//! let app = Application::builder().endpoint(get("/clients/{id}", handler_fn(client))).build();
//! let req = Request::builder().path("/clients/7").build().unwrap();
//!
//! let response = tokio::runtime::Runtime::new().unwrap().block_on(app.run(req));
//! assert_eq!(response.text(), "client 7");
//! ```

mod application;
mod controller;
mod endpoint;
mod fn_trait;
mod handler;
mod headers;
mod payload;
mod request;
mod responder;
mod response;

pub mod di;
pub mod error;
pub mod extract;
pub mod mapper;
pub mod middleware;
pub mod router;
pub mod serializer;

pub use application::Application;
pub use application::ApplicationBuilder;
pub use controller::Controller;
pub use endpoint::Endpoint;
pub use endpoint::Placement;
pub use endpoint::{delete, get, head, options, patch, post, put};
pub use error::{
    BindingError, DependencyError, HandlerError, HeaderError, HttpException, MiddlewareError, RequestError,
    RoutingError, SerializationError,
};
pub use extract::FromRequest;
pub use fn_trait::FnTrait;
pub use handler::FnHandler;
pub use handler::RequestHandler;
pub use handler::handler_fn;
pub use headers::Headers;
pub use payload::{IntoPayload, Opaque, Payload};
pub use request::{PathParams, Request, RequestBuilder, parse_method};
pub use responder::{Reply, Responder};
pub use response::Response;
pub use router::Router;
pub use serializer::Serializer;
