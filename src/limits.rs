//! Parsing limits and response buffer sizing
//!
//! Embedded targets have little memory to spare, so the parser refuses
//! requests that would need more of it than configured instead of growing
//! without bounds. The defaults fit a typical device-configuration page:
//! short URLs, a handful of form fields and small bodies.
//!
//! # Examples
//!
//! ```
//! use micro_web::{limits::ReqLimits, Request};
//!
//! let limits = ReqLimits {
//!     query_params: 4,
//!     body_size: 512,
//!     ..ReqLimits::default()
//! };
//!
//! let raw = b"POST /wifi HTTP/1.0\r\n\r\nssid=home&psk=secret";
//! let req = Request::parse_with(raw, &limits).unwrap();
//!
//! assert_eq!(req.post_params("POST").unwrap().unwrap()["ssid"], "home");
//! ```

/// Request parsing limits.
///
/// Violations are reported as errors that map onto a status code, see
/// [`ErrorKind::status`](crate::ErrorKind::status):
///
/// | Limit              | Error                                                          | Status |
/// |--------------------|----------------------------------------------------------------|--------|
/// | `first_line_size`  | [`FirstLineTooLarge`](crate::ErrorKind::FirstLineTooLarge)     | `414`  |
/// | `query_params`     | [`Query`](crate::ErrorKind::Query)                             | `400`  |
/// | `header_count`     | header lookup stops, later headers are not found               | -      |
/// | `body_size`        | [`BodyTooLarge`](crate::ErrorKind::BodyTooLarge)               | `413`  |
#[derive(Debug, Clone)]
pub struct ReqLimits {
    /// Maximum length of the request line in bytes, without the CRLF
    /// (default: `512 B`)
    ///
    /// `METHOD SP PATH[?QUERY] SP VERSION`. The path and query string of
    /// a request live entirely in this line.
    pub first_line_size: usize,

    /// Maximum number of query or form parameters (default: `32`)
    ///
    /// Applies separately to the URL query and to the body parameters.
    pub query_params: usize,

    /// Maximum number of header lines scanned by header lookups (default: `32`)
    pub header_count: usize,

    /// Maximum body size in bytes (default: `4 KB`)
    pub body_size: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            first_line_size: 512,
            query_params: 32,
            header_count: 32,
            body_size: 4 * 1024,
            _priv: (),
        }
    }
}

impl ReqLimits {
    /// No limit on anything.
    ///
    /// The free functions reading a single field of a raw request
    /// ([`method`](crate::method), [`query_params`](crate::query_params), ...)
    /// use these, so any well-formed request is accepted whatever its size.
    pub const fn unbounded() -> Self {
        Self {
            first_line_size: usize::MAX,
            query_params: usize::MAX,
            header_count: usize::MAX,
            body_size: usize::MAX,
            _priv: (),
        }
    }
}

/// Response buffer sizing.
///
/// The status line and header block of a response are assembled in one
/// buffer and handed to the transport in a single `send`. The body is
/// never copied into it.
#[derive(Debug, Clone)]
pub struct RespLimits {
    /// Initial capacity of the header buffer (default: `128 B`)
    ///
    /// Large enough for the status line, `Content-Type`, `Content-Length`
    /// and a couple of short extra headers without reallocation.
    pub head_capacity: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for RespLimits {
    fn default() -> Self {
        Self {
            head_capacity: 128,
            _priv: (),
        }
    }
}
