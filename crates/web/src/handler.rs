//! Request handlers: the callback at the heart of an [`Endpoint`](crate::Endpoint).

use crate::error::HandlerError;
use crate::extract::FromRequest;
use crate::fn_trait::FnTrait;
use crate::request::Request;
use crate::responder::{Reply, Responder};
use async_trait::async_trait;
use std::fmt;
use std::marker::PhantomData;

#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, req: Request) -> Result<Reply, HandlerError>;
}

/// Adapts an async function whose arguments all implement [`FromRequest`] into a [`RequestHandler`].
pub struct FnHandler<F, Args> {
    f: F,
    _phantom: PhantomData<fn(Args)>,
}

impl<F, Args> fmt::Debug for FnHandler<F, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("args", &std::any::type_name::<Args>()).finish_non_exhaustive()
    }
}

impl<F, Args> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    fn new(f: F) -> Self {
        Self { f, _phantom: PhantomData }
    }
}

pub fn handler_fn<F, Args>(f: F) -> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    FnHandler::new(f)
}

/// Binds every argument from the request, then calls the function.
///
/// A binding failure never reaches the function, it is returned as the handler's error.
#[async_trait]
impl<F, Args> RequestHandler for FnHandler<F, Args>
where
    F: FnTrait<Args>,
    F::Output: Responder,
    Args: FromRequest + 'static,
{
    async fn invoke(&self, req: Request) -> Result<Reply, HandlerError> {
        let args = Args::from_request(&req).await?;
        self.f.call(args).await.into_reply()
    }
}
