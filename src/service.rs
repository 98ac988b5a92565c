//! Request handler.
use std::future::ready;

use crate::http::{Request, Response};

/// Request handler driven by a connection, once per framed request.
///
/// The handler populates the response in place, and returns `true` if the connection should be
/// closed after the response is sent. A `Connection: close` request header closes the connection
/// regardless.
///
/// Plain functions and closures are handlers:
///
/// ```
/// use arena_h1::http::{Request, Response, StatusCode};
///
/// fn handle(_: &Request<'_>, res: &mut Response) -> bool {
///     res.set_body(StatusCode::OK, "text/plain", "hello");
///     false
/// }
/// # fn assert_service<S: arena_h1::HttpService>(_: S) {}
/// # assert_service(handle);
/// ```
pub trait HttpService: Send + Sync + 'static {
    /// Handle `request`, writing into `response`.
    fn call(
        &self,
        request: &Request<'_>,
        response: &mut Response,
    ) -> impl Future<Output = bool> + Send;
}

impl<F> HttpService for F
where
    F: Fn(&Request<'_>, &mut Response) -> bool + Send + Sync + 'static,
{
    #[inline]
    fn call(
        &self,
        request: &Request<'_>,
        response: &mut Response,
    ) -> impl Future<Output = bool> + Send {
        ready(self(request, response))
    }
}
