//! Pre and post middleware around a handler call.
//!
//! Pre middleware sees the request before binding and may replace it, post middleware sees the
//! handler's [`Reply`] and may replace that. Either kind aborts the call by returning an error,
//! which propagates to the [`Application`](crate::Application) unchanged.
//!
//! A middleware that yields no value keeps the previous value under the default
//! [`NONE_RESULT_POLICY`]. For pre middleware that is `None`; for post middleware it is `None`
//! or a falsy reply as defined by [`Reply::is_empty`].

use crate::error::{HandlerError, MiddlewareError};
use crate::request::Request;
use crate::responder::Reply;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

#[async_trait]
pub trait PreMiddleware: Send + Sync {
    async fn before(&self, req: &Request) -> Result<Option<Request>, HandlerError>;
}

#[async_trait]
pub trait PostMiddleware: Send + Sync {
    async fn after(&self, reply: &Reply) -> Result<Option<Reply>, HandlerError>;
}

/// What to do when a middleware yields no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonePolicy {
    /// The previous request or reply stays in place.
    KeepPrevious,
    /// The chain fails with [`MiddlewareError::EmptyResult`].
    Reject,
}

impl NonePolicy {
    fn on_empty(self, stage: &'static str) -> Result<(), MiddlewareError> {
        match self {
            Self::KeepPrevious => Ok(()),
            Self::Reject => Err(MiddlewareError::EmptyResult { stage }),
        }
    }
}

/// Applied by endpoints to both chains. A post middleware returning `""`, `0`, `false` or an
/// empty collection is treated like one returning `None`.
pub const NONE_RESULT_POLICY: NonePolicy = NonePolicy::KeepPrevious;

pub struct PreFn<F> {
    f: F,
}

/// Wraps a synchronous closure as [`PreMiddleware`].
pub fn pre_fn<F>(f: F) -> PreFn<F>
where
    F: Fn(&Request) -> Result<Option<Request>, HandlerError> + Send + Sync,
{
    PreFn { f }
}

impl<F> fmt::Debug for PreFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> PreMiddleware for PreFn<F>
where
    F: Fn(&Request) -> Result<Option<Request>, HandlerError> + Send + Sync,
{
    async fn before(&self, req: &Request) -> Result<Option<Request>, HandlerError> {
        (self.f)(req)
    }
}

pub struct PostFn<F> {
    f: F,
}

/// Wraps a synchronous closure as [`PostMiddleware`].
pub fn post_fn<F>(f: F) -> PostFn<F>
where
    F: Fn(&Reply) -> Result<Option<Reply>, HandlerError> + Send + Sync,
{
    PostFn { f }
}

impl<F> fmt::Debug for PostFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> PostMiddleware for PostFn<F>
where
    F: Fn(&Reply) -> Result<Option<Reply>, HandlerError> + Send + Sync,
{
    async fn after(&self, reply: &Reply) -> Result<Option<Reply>, HandlerError> {
        (self.f)(reply)
    }
}

pub async fn run_pre_chain(
    chain: &[Arc<dyn PreMiddleware>],
    req: Request,
    policy: NonePolicy,
) -> Result<Request, HandlerError> {
    let mut current = req;
    for (index, middleware) in chain.iter().enumerate() {
        match middleware.before(&current).await? {
            Some(next) => current = next,
            None => {
                trace!(index, "pre middleware returned no request");
                policy.on_empty("pre")?;
            }
        }
    }
    Ok(current)
}

pub async fn run_post_chain(
    chain: &[Arc<dyn PostMiddleware>],
    reply: Reply,
    policy: NonePolicy,
) -> Result<Reply, HandlerError> {
    let mut current = reply;
    for (index, middleware) in chain.iter().enumerate() {
        match middleware.after(&current).await? {
            Some(next) if !next.is_empty() => current = next,
            _ => {
                trace!(index, "post middleware returned no reply");
                policy.on_empty("post")?;
            }
        }
    }
    Ok(current)
}
