//! A uniform calling convention for async handler functions.

use std::future::Future;

/// An async function called with its arguments packed in a tuple.
///
/// Packing lets a handler of any arity sit behind one generic parameter. The returned future is
/// `Send`, so handlers can run on a multi-threaded runtime.
pub trait FnTrait<Args>: Send + Sync {
    type Output;
    fn call(&self, args: Args) -> impl Future<Output = Self::Output> + Send;
}

/// Implements [`FnTrait`] for every `Fn` of arity 0 to 12 returning a `Send` future.
macro_rules! impl_fn_trait_for_fn ({ $($param:ident)* } => {
    impl<Func, Fut, $($param,)*> FnTrait<($($param,)*)> for Func
    where
        Func: Fn($($param),*) -> Fut + Send + Sync,
        Fut: Future + Send,
    {
        type Output = Fut::Output;

        #[inline]
        #[allow(non_snake_case, reason = "the type parameters double as argument bindings")]
        fn call(&self, ($($param,)*): ($($param,)*)) -> impl Future<Output = Self::Output> + Send {
            (self)($($param,)*)
        }
    }
});

impl_fn_trait_for_fn! {}
impl_fn_trait_for_fn! { A }
impl_fn_trait_for_fn! { A B }
impl_fn_trait_for_fn! { A B C }
impl_fn_trait_for_fn! { A B C D }
impl_fn_trait_for_fn! { A B C D E }
impl_fn_trait_for_fn! { A B C D E F }
impl_fn_trait_for_fn! { A B C D E F G }
impl_fn_trait_for_fn! { A B C D E F G H }
impl_fn_trait_for_fn! { A B C D E F G H I }
impl_fn_trait_for_fn! { A B C D E F G H I J }
impl_fn_trait_for_fn! { A B C D E F G H I J K }
impl_fn_trait_for_fn! { A B C D E F G H I J K L }
