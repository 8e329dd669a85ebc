//! Typed handler arguments.
//!
//! Every handler argument implements [`FromRequest`]. The wrappers declared here delegate to
//! the [type mappers](crate::mapper), other implementations inject parts of the request
//! directly:
//!
//! - [`Request`](crate::Request): the whole request
//! - [`Method`](http::Method), [`Headers`](crate::Headers), [`PathParams`](crate::PathParams)
//! - [`Json`], [`Form`], [`Query`], [`Path`]: mapper backed arguments
//! - `Bytes` and `String`: the raw body
//! - `Option<T>` and `Result<T, BindingError>` to make an argument optional
//! - tuples of up to 12 extractors

mod extract_body;
mod extract_request;
mod extract_tuple;
mod extract_url;
mod from_request;

pub use from_request::FromRequest;

use std::ops::Deref;

/// Represented as form data
///
/// when `post` as a `application/x-www-form-urlencoded`, we can using this struct to inject data,
/// note: the struct must impl [`serde::Deserialize`] and [`Send`]
///
/// # Example
/// ```
/// # use serde::Deserialize;
/// # use micro_dispatch::extract::Form;
/// # #[allow(dead_code)]
/// #[derive(Deserialize, Debug)]
/// struct Params {
///     name: String,
///     zip: String,
/// }
///
/// pub async fn handle(Form(params) : Form<Params>) -> String {
///     format!("received params: {:?}", params)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form<T>(pub T);

/// Represented as json data
///
/// when `post` as a `application/json`, we can using this struct to inject data. As a return
/// value it serializes `T` to a json document.
///
/// # Example
/// ```
/// # use serde::Deserialize;
/// # use micro_dispatch::extract::Json;
/// # #[allow(dead_code)]
/// #[derive(Deserialize, Debug)]
/// struct Params {
///     name: String,
///     zip: String,
/// }
///
/// pub async fn handle(Json(params) : Json<Params>) -> String {
///     format!("received params: {:?}", params)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

/// Represented as url query data
///
/// # Example
/// ```
/// # use serde::Deserialize;
/// # use micro_dispatch::extract::Query;
/// # #[allow(dead_code)]
/// #[derive(Deserialize, Debug)]
/// struct Params {
///     name: String,
///     zip: String,
/// }
///
/// pub async fn handle(Query(params) : Query<Params>) -> String {
///     format!("received params: {:?}", params)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<T>(pub T);

/// Represented as the path params captured by the router
///
/// Each field is looked up by name and coerced to the field's type, fields marked with
/// `#[serde(default)]` fall back to their default when the param is absent.
///
/// # Example
/// ```
/// # use serde::Deserialize;
/// # use micro_dispatch::extract::Path;
/// # #[allow(dead_code)]
/// #[derive(Deserialize, Debug)]
/// struct ClientId {
///     id: u64,
/// }
///
/// pub async fn handle(Path(client) : Path<ClientId>) -> String {
///     format!("client {}", client.id)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path<T>(pub T);

macro_rules! impl_wrapper {
    ($($wrapper:ident)*) => {
        $(
        impl<T> $wrapper<T> {
            pub fn into_inner(self) -> T {
                self.0
            }
        }

        impl<T> Deref for $wrapper<T> {
            type Target = T;

            fn deref(&self) -> &T {
                &self.0
            }
        }
        )*
    };
}

impl_wrapper! { Form Json Query Path }
