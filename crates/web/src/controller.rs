//! Groups endpoints under a shared path prefix and shared middleware.

use crate::endpoint::{Endpoint, Placement};
use crate::middleware::{PostMiddleware, PreMiddleware};
use std::fmt;
use std::sync::Arc;

/// A set of endpoints mounted under `/{prefix}`.
///
/// Controller pre middleware runs before each endpoint's own pre middleware, controller post
/// middleware after each endpoint's own post middleware.
///
/// ```
/// use micro_dispatch::{Controller, get, handler_fn};
///
/// async fn all() -> &'static str {
///     "[]"
/// }
///
/// let endpoints = Controller::new("clients").endpoint(get("/", handler_fn(all))).into_endpoints();
/// assert_eq!(endpoints[0].path(), "/clients/");
/// ```
pub struct Controller {
    prefix: String,
    pre_middleware: Vec<Arc<dyn PreMiddleware>>,
    post_middleware: Vec<Arc<dyn PostMiddleware>>,
    endpoints: Vec<Endpoint>,
}

impl Controller {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), pre_middleware: vec![], post_middleware: vec![], endpoints: vec![] }
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

    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The endpoints with prefixed paths and controller middleware merged in.
    pub fn into_endpoints(self) -> Vec<Endpoint> {
        let Self { prefix, pre_middleware, post_middleware, endpoints } = self;
        let prefix = prefix.trim_matches('/');

        endpoints
            .into_iter()
            .map(|mut endpoint| {
                if !prefix.is_empty() {
                    let path = format!("/{prefix}/{}", endpoint.path().trim_start_matches('/'));
                    endpoint.set_path(path);
                }
                endpoint.add_post_middlewares(&post_middleware, Placement::After);
                endpoint.add_pre_middlewares(&pre_middleware, Placement::Before);
                endpoint
            })
            .collect()
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("prefix", &self.prefix)
            .field("pre_middleware", &self.pre_middleware.len())
            .field("post_middleware", &self.post_middleware.len())
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{get, put};
    use crate::handler::handler_fn;
    use crate::middleware::{post_fn, pre_fn};
    use crate::request::Request;
    use crate::responder::Reply;

    async fn noop() {}

    #[test]
    fn test_prefix_is_joined() {
        let endpoints = Controller::new("/clients/")
            .endpoint(get("", handler_fn(noop)))
            .endpoint(get("/{id}", handler_fn(noop)))
            .endpoint(put("{id}", handler_fn(noop)))
            .into_endpoints();

        let paths = endpoints.iter().map(Endpoint::path).collect::<Vec<_>>();
        assert_eq!(paths, vec!["/clients/", "/clients/{id}", "/clients/{id}"]);
    }

    #[test]
    fn test_empty_prefix_keeps_path() {
        let endpoints = Controller::new("").endpoint(get("/status", handler_fn(noop))).into_endpoints();
        assert_eq!(endpoints[0].path(), "/status");
    }

    #[test]
    fn test_middleware_is_merged() {
        let endpoints = Controller::new("c")
            .with_pre(pre_fn(|_req: &Request| Ok(None)))
            .with_post(post_fn(|_reply: &Reply| Ok(None)))
            .endpoint(get("/", handler_fn(noop)).with_pre(pre_fn(|_req: &Request| Ok(None))))
            .into_endpoints();

        assert_eq!(endpoints[0].pre_middleware().len(), 2);
        assert_eq!(endpoints[0].post_middleware().len(), 1);
    }
}
