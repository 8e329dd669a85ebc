//! Segment trie that maps `(method, path)` to an [`Endpoint`].
//!
//! Paths are split on `/` and empty segments are dropped, so `/a/b/`, `a/b` and `/a//b` are the
//! same route. A segment written as `{name}` matches any single segment and captures it.
//!
//! Matching walks one segment at a time and prefers the literal child over the param child.
//! Once a literal child has been taken the walk never comes back to try the param sibling, so
//! with `/a/b/c` and `/a/{x}/d` registered, `/a/b/d` is not found.

use crate::endpoint::Endpoint;
use crate::error::RoutingError;
use crate::request::PathParams;
use http::Method;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct RouteNode {
    children: HashMap<String, RouteNode>,
    param_child: Option<Box<RouteNode>>,
    /// Only set on a param node.
    param_name: Option<String>,
    endpoints: HashMap<Method, Endpoint>,
}

impl RouteNode {
    fn is_terminal(&self) -> bool {
        !self.endpoints.is_empty()
    }
}

/// Main router structure that handles request routing
#[derive(Debug, Default)]
pub struct Router {
    root: RouteNode,
    len: usize,
}

/// Result of matching a route: the endpoint and the captured path parameters
#[derive(Debug)]
pub struct RouteMatch<'router> {
    endpoint: &'router Endpoint,
    params: PathParams,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the endpoint under its path and method, replacing an endpoint registered
    /// for the same pair.
    pub fn add_route(&mut self, endpoint: Endpoint) {
        let mut node = &mut self.root;

        for segment in segments(endpoint.path()) {
            node = match param_name(segment) {
                Some(name) => {
                    let child = node.param_child.get_or_insert_with(Box::default);
                    if let Some(previous) = child.param_name.as_deref().filter(|previous| *previous != name) {
                        warn!(previous, name, path = endpoint.path(), "path param renamed, last registration wins");
                    }
                    child.param_name = Some(name.to_owned());
                    child.as_mut()
                }
                None => node.children.entry(segment.to_owned()).or_default(),
            };
        }

        debug!(method = %endpoint.method(), path = endpoint.path(), "route registered");
        let method = endpoint.method().clone();
        if node.endpoints.insert(method, endpoint).is_some() {
            warn!("route registered twice, the previous endpoint was replaced");
        } else {
            self.len += 1;
        }
    }

    /// Matches a path against the router's routes
    ///
    /// A path that exists but has no endpoint for `method` is reported exactly like an
    /// unknown path.
    pub fn at(&self, path: &str, method: &Method) -> Result<RouteMatch<'_>, RoutingError> {
        let mut node = &self.root;
        let mut params = PathParams::empty();

        for segment in segments(path) {
            if let Some(child) = node.children.get(segment) {
                node = child;
            } else if let Some(child) = node.param_child.as_deref() {
                if let Some(name) = &child.param_name {
                    params.insert(name.clone(), segment.to_owned());
                }
                node = child;
            } else {
                return Err(RoutingError::not_found(method, path));
            }
        }

        match node.endpoints.get(method) {
            Some(endpoint) if node.is_terminal() => Ok(RouteMatch { endpoint, params }),
            _ => Err(RoutingError::not_found(method, path)),
        }
    }

    /// Number of registered `(method, path)` pairs.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<'router> RouteMatch<'router> {
    pub fn endpoint(&self) -> &'router Endpoint {
        self.endpoint
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn into_parts(self) -> (&'router Endpoint, PathParams) {
        (self.endpoint, self.params)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn param_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{').and_then(|rest| rest.strip_suffix('}'))
}
