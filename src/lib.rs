//! micro_web - Minimal HTTP/1.0 request parsing and response formatting
//!
//! Built for the embedded web servers found on microcontroller-class
//! devices: configuration pages, status endpoints, small JSON APIs. The
//! crate owns no sockets and spawns nothing. You hand it the bytes of one
//! complete request and get borrowed views back; you hand it a
//! [`Transport`] and it writes a response into it.
//!
//! # Request side
//!
//! - **Zero-copy** - method, path, query string and body borrow from the raw buffer
//! - **Bounded** - every size and count is capped by [`limits::ReqLimits`]
//! - **Lenient** - malformed percent escapes are kept, never fatal
//!
//! # Response side
//!
//! - **Two writes per response** - the header block, then the body
//! - **Binary safe** - binary bodies get an exact `Content-Length`
//! - **Transport errors pass through** - the caller's error type, unchanged
//!
//! # Examples
//!
//! A complete handler over any `io::Write`:
//! ```
//! use micro_web::{IoTransport, MimeType, Request, Response, StatusCode, Transport};
//!
//! fn handle(raw: &[u8], out: &mut IoTransport<Vec<u8>>) -> std::io::Result<()> {
//!     let req = match Request::parse(raw) {
//!         Ok(req) => req,
//!         Err(err) => return out.send_binary(err.as_http(false)),
//!     };
//!
//!     match (req.method(), req.path()) {
//!         ("GET", "/") => Response::text("<h1>Device</h1>").send(out),
//!         ("GET", "/status") => Response::text(r#"{"uptime":42}"#)
//!             .mime(MimeType::Json)
//!             .send(out),
//!         _ => Response::text("not here").status(StatusCode::NotFound).send(out),
//!     }
//! }
//!
//! let mut out = IoTransport::new(Vec::new());
//! handle(b"GET /status HTTP/1.0\r\n\r\n", &mut out).unwrap();
//!
//! assert_eq!(
//!     out.into_inner(),
//!     b"HTTP/1.0 200 Ok\r\nContent-Type:application/json\r\n\r\n{\"uptime\":42}"
//! );
//! ```
//! Handling a form submission:
//! ```
//! use micro_web::{post_params, unquote, ErrorKind, DEFAULT_POST_METHOD};
//!
//! let raw = b"POST /wifi HTTP/1.0\r\n\r\nssid=My%20Home&psk=p%40ss";
//!
//! let form = post_params(raw, DEFAULT_POST_METHOD)?.unwrap_or_default();
//! let ssid = unquote(form["ssid"].as_bytes())?;
//! let psk = unquote(form["psk"].as_bytes())?;
//!
//! assert_eq!((&*ssid, &*psk), ("My Home", "p@ss"));
//! # Ok::<(), ErrorKind>(())
//! ```
//!
//! # Logging
//!
//! Rejected requests and malformed escapes are reported at `debug`, sent
//! responses at `trace`, through [`tracing`]. Without a subscriber
//! installed this costs nothing.

pub(crate) mod http {
    pub mod query;
    pub(crate) mod decode;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}
pub(crate) mod errors;
pub mod limits;

pub use crate::{
    errors::ErrorKind,
    http::{
        decode::{unquote, unquote_lossy},
        query::{self, parse_query_string},
        request::{
            body, header, method, path, post_params, post_params_default, query_params, query_string,
            Request,
            DEFAULT_POST_METHOD,
        },
        response::{
            send_binary_response, send_response, Body, IoTransport, Response, Transport,
            DEFAULT_BINARY_CONTENT_TYPE, DEFAULT_CONTENT_TYPE,
        },
        types::{mime_type, reason_phrase, MimeType, StatusCode},
    },
};

#[cfg(test)]
pub mod tools {
    use std::str::from_utf8;

    #[inline]
    pub fn str_op(value: &[u8]) -> &str {
        from_utf8(value).unwrap()
    }
}
