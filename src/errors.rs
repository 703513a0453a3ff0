use crate::{query, StatusCode};
use std::{error, fmt};

/// Reasons a raw request, a value or a status code was rejected.
///
/// Transport failures are not represented here: they keep the transport's
/// own error type and reach the caller unchanged.
///
/// Every kind maps onto the status the server should answer with. The
/// caller decides whether to answer at all; [`as_http`](ErrorKind::as_http)
/// provides a ready-made response for the common case.
///
/// ```
/// use micro_web::{method, ErrorKind, StatusCode};
///
/// let err = method(b"get / HTTP/1.0\r\n\r\n").unwrap_err();
///
/// assert_eq!(err, ErrorKind::InvalidMethod);
/// assert_eq!(err.status(), StatusCode::BadRequest);
/// assert!(err.as_http(false).starts_with(b"HTTP/1.0 400 Bad request\r\n"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request line does not start with an uppercase method token.
    InvalidMethod,
    /// The method is not followed by whitespace and a path starting with `/`.
    InvalidUrl,
    /// Too many query or form parameters.
    Query(query::Error),
    /// The request line, a body or a decoded value is not valid UTF-8.
    InvalidEncoding,
    /// The request line is longer than [`ReqLimits::first_line_size`](crate::limits::ReqLimits::first_line_size).
    FirstLineTooLarge,
    /// The body is longer than [`ReqLimits::body_size`](crate::limits::ReqLimits::body_size).
    BodyTooLarge,
    /// A raw status code is not in the status table.
    UnknownStatus(u16),
}

macro_rules! http_errors {
    ($($name:ident: $status:ident, $first_line:literal, $len:literal => $json:literal; )*) => {
        /// Returns the status code to answer with.
        pub const fn status(&self) -> StatusCode {
            match self { $(
                Self::$name { .. } => StatusCode::$status,
            )* }
        }

        /// Returns a complete HTTP/1.0 error response.
        ///
        /// With `json` the body is a small JSON object naming the error,
        /// otherwise the response has no body. Send it with
        /// [`Transport::send_binary`](crate::Transport::send_binary).
        pub const fn as_http(&self, json: bool) -> &'static [u8] {
            match (json, self) { $(
                (true, Self::$name { .. }) => concat!(
                    $first_line, "\r\n",
                    "Content-Type:application/json\r\n",
                    "Content-Length:", $len, "\r\n",
                    "\r\n",
                    $json
                ),
                (false, Self::$name { .. }) => concat!(
                    $first_line, "\r\n",
                    "Content-Length:0\r\n",
                    "\r\n",
                ),
            )* }.as_bytes()
        }
    };
}

impl ErrorKind {
    http_errors! {
        InvalidMethod: BadRequest, "HTTP/1.0 400 Bad request", "55"
            => r#"{"error":"Invalid HTTP method","code":"INVALID_METHOD"}"#;
        InvalidUrl: BadRequest, "HTTP/1.0 400 Bad request", "51"
            => r#"{"error":"Invalid URL format","code":"INVALID_URL"}"#;
        Query: BadRequest, "HTTP/1.0 400 Bad request", "55"
            => r#"{"error":"Invalid query string","code":"INVALID_QUERY"}"#;
        InvalidEncoding: BadRequest, "HTTP/1.0 400 Bad request", "60"
            => r#"{"error":"Invalid UTF-8 encoding","code":"INVALID_ENCODING"}"#;

        FirstLineTooLarge: RequestUriTooLong, "HTTP/1.0 414 Request uri too long", "55"
            => r#"{"error":"Request line too long","code":"URI_TOO_LONG"}"#;
        BodyTooLarge: RequestEntityTooLarge, "HTTP/1.0 413 Request entity too large", "58"
            => r#"{"error":"Request body too large","code":"BODY_TOO_LARGE"}"#;

        UnknownStatus: InternalServerError, "HTTP/1.0 500 Internal server error", "55"
            => r#"{"error":"Unknown status code","code":"UNKNOWN_STATUS"}"#;
    }
}

impl error::Error for ErrorKind {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ErrorKind::Query(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidMethod => f.write_str("invalid request method"),
            ErrorKind::InvalidUrl => f.write_str("invalid request path"),
            ErrorKind::Query(err) => write!(f, "invalid parameters: {}", err),
            ErrorKind::InvalidEncoding => f.write_str("invalid UTF-8"),
            ErrorKind::FirstLineTooLarge => f.write_str("request line too large"),
            ErrorKind::BodyTooLarge => f.write_str("request body too large"),
            ErrorKind::UnknownStatus(code) => write!(f, "unknown status code: {}", code),
        }
    }
}

impl From<query::Error> for ErrorKind {
    fn from(err: query::Error) -> Self {
        ErrorKind::Query(err)
    }
}
