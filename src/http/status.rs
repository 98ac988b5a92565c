/// HTTP [Status Code][rfc].
///
/// Any three digit code can be represented, only the ones in the reason table have a known
/// reason phrase. Others render as `"Unknown Status"`.
///
/// [rfc]: <https://datatracker.ietf.org/doc/html/rfc9110#name-status-codes>
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl Default for StatusCode {
    #[inline]
    fn default() -> Self {
        Self::OK
    }
}

/// Reason phrase for codes missing from the table.
pub const UNKNOWN_REASON: &str = "Unknown Status";

macro_rules! status_code {
    (
        $(
            $(#[$doc:meta])*
            $int:literal $id:ident $msg:literal;
        )*
    ) => {
        impl StatusCode {
            $(
                $(#[$doc])*
                pub const $id: Self = Self($int);
            )*

            /// Returns status message, e.g: `"OK"`.
            #[inline]
            pub const fn message(&self) -> &'static str {
                match self.0 {
                    $(
                        $int => $msg,
                    )*
                    _ => UNKNOWN_REASON,
                }
            }
        }
    };
}

status_code! {
    /// `200`. The request succeeded.
    200 OK "OK";
    /// `201`. The request succeeded, and a new resource was created as a result.
    201 CREATED "Created";
    /// `400`. The server cannot or will not process the request due to something that is perceived to be
    /// a client error.
    400 BAD_REQUEST "Bad Request";
    /// `404`. The server cannot find the requested resource.
    404 NOT_FOUND "Not Found";
    /// `500`. The server has encountered a situation it does not know how to handle.
    500 INTERNAL_SERVER_ERROR "Internal Server Error";
}

impl StatusCode {
    /// Create status code from its numeric value.
    #[inline]
    pub const fn from_u16(code: u16) -> Self {
        Self(code)
    }

    /// Returns status code value, e.g: `200`.
    #[inline]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for StatusCode {
    #[inline]
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.message())
    }
}

impl std::fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_tuple("StatusCode").field(&self.0).finish()
    }
}
