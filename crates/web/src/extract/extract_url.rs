//! URL extraction: the query string and the path params captured by the router.
//!
//! # Example
//! ```no_run
//! # use serde::Deserialize;
//! # use micro_dispatch::extract::{Path, Query};
//!
//! #[derive(Deserialize)]
//! struct Params {
//!     name: String,
//!     age: u32,
//! }
//!
//! #[derive(Deserialize)]
//! struct Id {
//!     id: u64,
//! }
//!
//! async fn handler(Path(id): Path<Id>, Query(params): Query<Params>) {
//!     println!("{}: Name: {}, Age: {}", id.id, params.name, params.age);
//! }
//! ```

use crate::error::BindingError;
use crate::extract::{FromRequest, Path, Query};
use crate::mapper::{PathMapper, QueryMapper, TypeMapper};
use crate::request::Request;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

#[async_trait]
impl<T> FromRequest for Query<T>
where
    T: DeserializeOwned + Send,
{
    async fn from_request(req: &Request) -> Result<Self, BindingError> {
        QueryMapper::new().map(req).map(Query)
    }
}

#[async_trait]
impl<T> FromRequest for Path<T>
where
    T: DeserializeOwned + Send,
{
    async fn from_request(req: &Request) -> Result<Self, BindingError> {
        PathMapper.map(req).map(Path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Args {
        a: i32,
        b: String,
    }

    #[tokio::test]
    async fn test_path_binding_coerces_declared_types() {
        let req = Request::builder().param("a", "1").param("b", "x").build().unwrap();
        let Path(args) = Path::<Args>::from_request(&req).await.unwrap();
        assert_eq!(args.a, 1);
        assert_eq!(args.b, "x");
    }

    #[tokio::test]
    async fn test_path_binding_rejects_bad_value() {
        let req = Request::builder().param("a", "one").param("b", "x").build().unwrap();
        let result = Path::<Args>::from_request(&req).await;
        assert!(matches!(result, Err(BindingError::InvalidPath { .. })));
    }
}
