use crate::error::BindingError;
use crate::extract::from_request::FromRequest;
use crate::request::Request;
use async_trait::async_trait;

// Arguments bind left to right, the first failure aborts the call.
macro_rules! impl_from_request_for_tuple {
    ($($param:ident)*) => {
        #[async_trait]
        impl<$($param,)*> FromRequest for ($($param,)*)
        where
            $($param: FromRequest,)*
        {
            async fn from_request(req: &Request) -> Result<Self, BindingError> {
                Ok(($($param::from_request(req).await?,)*))
            }
        }
    }
}

impl_from_request_for_tuple! { A }
impl_from_request_for_tuple! { A B }
impl_from_request_for_tuple! { A B C }
impl_from_request_for_tuple! { A B C D }
impl_from_request_for_tuple! { A B C D E }
impl_from_request_for_tuple! { A B C D E F }
impl_from_request_for_tuple! { A B C D E F G }
impl_from_request_for_tuple! { A B C D E F G H }
impl_from_request_for_tuple! { A B C D E F G H I }
impl_from_request_for_tuple! { A B C D E F G H I J }
impl_from_request_for_tuple! { A B C D E F G H I J K }
impl_from_request_for_tuple! { A B C D E F G H I J K L }
