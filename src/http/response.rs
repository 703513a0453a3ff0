//! HTTP/1.0 response formatting over a caller-supplied transport.

use crate::{
    http::types::{MimeType, StatusCode},
    limits::RespLimits,
};
use std::io;

/// `Content-Type` used by [`Response::text`].
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// `Content-Type` used by [`Response::binary`].
pub const DEFAULT_BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Byte sink owned by the caller, usually a socket.
///
/// Both methods are expected to block until everything is written, retrying
/// partial writes themselves. Errors are passed through to the caller of
/// [`send_response`] unchanged; nothing here retries or cleans up.
///
/// # Examples
/// ```
/// use micro_web::Transport;
///
/// /// Counts bytes instead of sending them.
/// struct Counter(usize);
///
/// impl Transport for Counter {
///     type Error = std::convert::Infallible;
///
///     fn send(&mut self, text: &str) -> Result<(), Self::Error> {
///         self.0 += text.len();
///         Ok(())
///     }
///
///     fn send_binary(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
///         self.0 += bytes.len();
///         Ok(())
///     }
/// }
///
/// let mut counter = Counter(0);
/// micro_web::Response::text("hi").send(&mut counter).unwrap();
/// assert_eq!(counter.0, "HTTP/1.0 200 Ok\r\nContent-Type:text/html\r\n\r\nhi".len());
/// ```
pub trait Transport {
    /// Error reported by a failed write.
    type Error;

    /// Writes text: the header block and text bodies.
    fn send(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Writes raw bytes, without any re-encoding or newline translation.
    fn send_binary(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    #[inline(always)]
    fn send(&mut self, text: &str) -> Result<(), Self::Error> {
        (**self).send(text)
    }

    #[inline(always)]
    fn send_binary(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).send_binary(bytes)
    }
}

/// [`Transport`] over any [`io::Write`], e.g. a `TcpStream`.
///
/// Both methods use [`write_all`](io::Write::write_all). Nothing is flushed.
///
/// ```
/// use micro_web::{IoTransport, Response, StatusCode};
///
/// let mut transport = IoTransport::new(Vec::new());
/// Response::text("gone").status(StatusCode::Gone).send(&mut transport).unwrap();
///
/// assert_eq!(
///     transport.into_inner(),
///     b"HTTP/1.0 410 Gone\r\nContent-Type:text/html\r\n\r\ngone"
/// );
/// ```
#[derive(Debug, Default)]
pub struct IoTransport<W>(W);

impl<W> IoTransport<W> {
    #[inline(always)]
    pub const fn new(writer: W) -> Self {
        IoTransport(writer)
    }

    #[inline(always)]
    pub const fn get_ref(&self) -> &W {
        &self.0
    }

    #[inline(always)]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.0
    }

    #[inline(always)]
    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: io::Write> Transport for IoTransport<W> {
    type Error = io::Error;

    #[inline]
    fn send(&mut self, text: &str) -> Result<(), Self::Error> {
        self.0.write_all(text.as_bytes())
    }

    #[inline]
    fn send_binary(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.0.write_all(bytes)
    }
}

/// Sends a text response.
///
/// Writes, in order: the status line `HTTP/1.0 {code} {reason}`,
/// `Content-Type:{content_type}`, every `extra_headers` line as given,
/// a blank line and `body`. The header block goes out in one
/// [`Transport::send`] call, the body in a second one.
///
/// [`Response`] offers the same with defaults for status and content type.
///
/// ```
/// use micro_web::{send_response, IoTransport, StatusCode};
///
/// let mut transport = IoTransport::new(Vec::new());
/// send_response(&mut transport, "hi", StatusCode::NotFound, "text/html", &[]).unwrap();
///
/// assert_eq!(
///     transport.into_inner(),
///     b"HTTP/1.0 404 Not found\r\nContent-Type:text/html\r\n\r\nhi"
/// );
/// ```
///
/// # Panics
/// In `debug` mode, if a header line contains a line break.
#[inline]
pub fn send_response<T: Transport + ?Sized>(
    transport: &mut T,
    body: &str,
    status: StatusCode,
    content_type: &str,
    extra_headers: &[&str],
) -> Result<(), T::Error> {
    let mut head = String::with_capacity(RespLimits::default().head_capacity);
    write_head(&mut head, status, content_type, None, extra_headers);

    send_parts(transport, &head, Body::Text(body))
}

/// Sends a binary response.
///
/// Same as [`send_response`], plus a `Content-Length` line with the exact
/// byte length of `body`, placed right after `Content-Type`. The body goes
/// through [`Transport::send_binary`].
///
/// ```
/// use micro_web::{send_binary_response, IoTransport, MimeType, StatusCode};
///
/// let png = [0x89, b'P', b'N', b'G'];
/// let mut transport = IoTransport::new(Vec::new());
/// send_binary_response(
///     &mut transport,
///     &png,
///     StatusCode::Ok,
///     MimeType::Png.as_str(),
///     &["Cache-Control: max-age=3600"],
/// )
/// .unwrap();
///
/// assert_eq!(
///     transport.into_inner(),
///     b"HTTP/1.0 200 Ok\r\n\
///       Content-Type:image/png\r\n\
///       Content-Length:4\r\n\
///       Cache-Control: max-age=3600\r\n\
///       \r\n\
///       \x89PNG"
/// );
/// ```
///
/// # Panics
/// In `debug` mode, if a header line contains a line break.
#[inline]
pub fn send_binary_response<T: Transport + ?Sized>(
    transport: &mut T,
    body: &[u8],
    status: StatusCode,
    content_type: &str,
    extra_headers: &[&str],
) -> Result<(), T::Error> {
    let mut head = String::with_capacity(RespLimits::default().head_capacity);
    write_head(&mut head, status, content_type, Some(body.len()), extra_headers);

    send_parts(transport, &head, Body::Binary(body))
}

/// Response body and the send path it takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body<'b> {
    /// Sent with [`Transport::send`], no `Content-Length`.
    Text(&'b str),
    /// Sent with [`Transport::send_binary`], with `Content-Length`.
    Binary(&'b [u8]),
}

impl Body<'_> {
    /// Returns the body length in bytes.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        match self {
            Body::Text(text) => text.len(),
            Body::Binary(bytes) => bytes.len(),
        }
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Response builder with the usual defaults.
///
/// | Constructor                  | Status   | Content type                    | `Content-Length` |
/// |------------------------------|----------|---------------------------------|------------------|
/// | [`text`](Response::text)     | `200 Ok` | [`DEFAULT_CONTENT_TYPE`]        | no               |
/// | [`binary`](Response::binary) | `200 Ok` | [`DEFAULT_BINARY_CONTENT_TYPE`] | yes              |
///
/// Nothing is written until [`send`](Response::send), so the setters can
/// be called in any order. Extra headers keep the order they were added in.
///
/// # Examples
/// ```
/// use micro_web::{IoTransport, Response, StatusCode};
///
/// let mut transport = IoTransport::new(Vec::new());
///
/// Response::text("")
///     .status(StatusCode::Found)
///     .header("Location: /setup")
///     .send(&mut transport)
///     .unwrap();
///
/// assert_eq!(
///     transport.into_inner(),
///     b"HTTP/1.0 302 Found\r\nContent-Type:text/html\r\nLocation: /setup\r\n\r\n"
/// );
/// ```
/// Serving a file picked by extension:
/// ```
/// use micro_web::{IoTransport, MimeType, Response};
///
/// let path = "/style.css";
/// let content = b"body{margin:0}";
///
/// let mut transport = IoTransport::new(Vec::new());
/// let mut response = Response::binary(content);
/// if let Some(mime) = MimeType::from_path(path) {
///     response = response.mime(mime);
/// }
/// response.send(&mut transport).unwrap();
///
/// let sent = transport.into_inner();
/// assert!(sent.starts_with(b"HTTP/1.0 200 Ok\r\nContent-Type:text/css\r\nContent-Length:14\r\n"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response<'b> {
    status: StatusCode,
    content_type: &'b str,
    headers: Vec<&'b str>,
    body: Body<'b>,
    head_capacity: usize,
}

impl<'b> Response<'b> {
    #[inline]
    fn new(body: Body<'b>, content_type: &'b str) -> Self {
        Response {
            status: StatusCode::Ok,
            content_type,
            headers: Vec::new(),
            body,
            head_capacity: RespLimits::default().head_capacity,
        }
    }

    /// Text response, `200 Ok`, `text/html`.
    #[inline]
    pub fn text(body: &'b str) -> Self {
        Self::new(Body::Text(body), DEFAULT_CONTENT_TYPE)
    }

    /// Binary response, `200 Ok`, `application/octet-stream`.
    #[inline]
    pub fn binary(body: &'b [u8]) -> Self {
        Self::new(Body::Binary(body), DEFAULT_BINARY_CONTENT_TYPE)
    }

    #[inline]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[inline]
    pub fn content_type(mut self, content_type: &'b str) -> Self {
        self.content_type = content_type;
        self
    }

    /// Sets the content type from the MIME table.
    #[inline]
    pub fn mime(self, mime: MimeType) -> Self {
        self.content_type(mime.as_str())
    }

    /// Appends a complete header line, e.g. `"Location: /"`, without the CRLF.
    ///
    /// Don't add `Content-Type` or `Content-Length` here, they are
    /// always written by the response itself.
    ///
    /// # Panics
    /// In `debug` mode, if `line` contains a line break.
    #[inline]
    #[track_caller]
    pub fn header(mut self, line: &'b str) -> Self {
        debug_assert!(
            !line.contains(['\r', '\n']),
            "Header line must not contain a line break"
        );

        self.headers.push(line);
        self
    }

    #[inline]
    pub fn limits(mut self, limits: &RespLimits) -> Self {
        self.head_capacity = limits.head_capacity;
        self
    }

    #[inline(always)]
    pub const fn body(&self) -> Body<'b> {
        self.body
    }

    /// Writes the response to `transport`.
    #[inline]
    pub fn send<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<(), T::Error> {
        let mut head = String::with_capacity(self.head_capacity);
        self.send_buffered(transport, &mut head)
    }

    /// Writes the response, assembling the header block in `head`.
    ///
    /// `head` is cleared first. Reusing one buffer across requests keeps
    /// the server loop free of per-response allocations.
    ///
    /// ```
    /// use micro_web::{IoTransport, Response};
    ///
    /// let mut head = String::with_capacity(128);
    /// let mut transport = IoTransport::new(Vec::new());
    ///
    /// for body in ["one", "two"] {
    ///     Response::text(body).send_buffered(&mut transport, &mut head).unwrap();
    /// }
    ///
    /// assert!(transport.into_inner().ends_with(b"\r\n\r\ntwo"));
    /// ```
    pub fn send_buffered<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        head: &mut String,
    ) -> Result<(), T::Error> {
        let content_length = match self.body {
            Body::Text(_) => None,
            Body::Binary(bytes) => Some(bytes.len()),
        };

        head.clear();
        write_head(
            head,
            self.status,
            self.content_type,
            content_length,
            &self.headers,
        );

        send_parts(transport, head, self.body)
    }
}

#[inline]
#[track_caller]
fn write_head(
    head: &mut String,
    status: StatusCode,
    content_type: &str,
    content_length: Option<usize>,
    extra_headers: &[&str],
) {
    head.push_str(status.status_line());

    head.push_str("Content-Type:");
    head.push_str(content_type);
    head.push_str("\r\n");

    if let Some(len) = content_length {
        let (digits, start) = number_to_bytes(len);

        head.push_str("Content-Length:");
        head.extend(digits[start..].iter().map(|&digit| digit as char));
        head.push_str("\r\n");
    }

    for line in extra_headers {
        debug_assert!(
            !line.contains(['\r', '\n']),
            "Header line must not contain a line break"
        );

        head.push_str(line);
        head.push_str("\r\n");
    }

    head.push_str("\r\n");
}

#[inline]
fn send_parts<T: Transport + ?Sized>(
    transport: &mut T,
    head: &str,
    body: Body<'_>,
) -> Result<(), T::Error> {
    tracing::trace!(head_len = head.len(), body_len = body.len(), "sending response");

    transport.send(head)?;
    match body {
        Body::Text(text) => transport.send(text),
        Body::Binary(bytes) => transport.send_binary(bytes),
    }
}

// Decimal digits of `n`, right-aligned; the number starts at the returned index
#[inline]
const fn number_to_bytes(mut n: usize) -> ([u8; 20], usize) {
    let mut buffer = [b'0'; 20];
    let mut i = 20;

    if n == 0 {
        return (buffer, 19);
    }

    while n > 0 {
        i -= 1;
        buffer[i] = b'0' + (n % 10) as u8;
        n /= 10;
    }

    (buffer, i)
}

#[cfg(test)]
mod tests_tools {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(super) enum Call {
        Text(String),
        Binary(Vec<u8>),
    }

    /// Records every call, fails on call number `fail_at` (1-based).
    #[derive(Debug, Default)]
    pub(super) struct Recorder {
        pub(super) calls: Vec<Call>,
        pub(super) fail_at: Option<usize>,
    }

    impl Recorder {
        pub(super) fn failing_at(call: usize) -> Self {
            Recorder {
                calls: Vec::new(),
                fail_at: Some(call),
            }
        }

        pub(super) fn bytes(&self) -> Vec<u8> {
            self.calls
                .iter()
                .flat_map(|call| match call {
                    Call::Text(text) => text.as_bytes().to_vec(),
                    Call::Binary(bytes) => bytes.clone(),
                })
                .collect()
        }

        fn check(&self) -> Result<(), &'static str> {
            match self.fail_at {
                Some(at) if self.calls.len() + 1 == at => Err("connection reset"),
                _ => Ok(()),
            }
        }
    }

    impl Transport for Recorder {
        type Error = &'static str;

        fn send(&mut self, text: &str) -> Result<(), Self::Error> {
            self.check()?;
            self.calls.push(Call::Text(text.to_owned()));
            Ok(())
        }

        fn send_binary(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
            self.check()?;
            self.calls.push(Call::Binary(bytes.to_vec()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod send_tests {
    use super::{tests_tools::*, *};

    #[test]
    fn text_response() {
        let mut t = Recorder::default();
        send_response(&mut t, "hi", StatusCode::NotFound, DEFAULT_CONTENT_TYPE, &[]).unwrap();

        assert_eq!(
            t.calls,
            [
                Call::Text("HTTP/1.0 404 Not found\r\nContent-Type:text/html\r\n\r\n".into()),
                Call::Text("hi".into()),
            ]
        );
    }

    #[test]
    fn extra_headers_in_order() {
        let mut t = Recorder::default();
        let headers = ["Location: /a", "X-Second: 2", "X-Third:"];
        send_response(&mut t, "", StatusCode::SeeOther, "text/plain", &headers).unwrap();

        assert_eq!(
            t.bytes(),
            b"HTTP/1.0 303 See other\r\n\
              Content-Type:text/plain\r\n\
              Location: /a\r\n\
              X-Second: 2\r\n\
              X-Third:\r\n\
              \r\n"
        );
    }

    #[test]
    fn binary_response() {
        let body = [0u8, 159, 146, 150, b'\r', b'\n', 0];
        let mut t = Recorder::default();
        send_binary_response(&mut t, &body, StatusCode::Ok, "image/webp", &["X-A: 1"]).unwrap();

        assert_eq!(
            t.calls,
            [
                Call::Text(
                    "HTTP/1.0 200 Ok\r\nContent-Type:image/webp\r\nContent-Length:7\r\nX-A: 1\r\n\r\n"
                        .into()
                ),
                Call::Binary(body.to_vec()),
            ]
        );
    }

    #[test]
    fn content_length_matches_body() {
        for len in [0, 1, 9, 10, 99, 100, 1024, 65_537] {
            let body = vec![b'x'; len];
            let mut t = Recorder::default();
            send_binary_response(&mut t, &body, StatusCode::Ok, DEFAULT_BINARY_CONTENT_TYPE, &[])
                .unwrap();

            let Call::Text(head) = &t.calls[0] else {
                panic!("head must be text");
            };
            let Call::Binary(sent) = &t.calls[1] else {
                panic!("body must be binary");
            };

            assert!(head.contains(&format!("\r\nContent-Length:{}\r\n", len)), "{head:?}");
            assert_eq!(sent.len(), len);
        }
    }

    #[test]
    fn transport_error_propagates() {
        let mut t = Recorder::failing_at(1);
        assert_eq!(
            send_response(&mut t, "x", StatusCode::Ok, "text/html", &[]),
            Err("connection reset")
        );
        assert!(t.calls.is_empty());

        // Head written, body fails: no retry
        let mut t = Recorder::failing_at(2);
        assert_eq!(
            send_binary_response(&mut t, b"x", StatusCode::Ok, "text/html", &[]),
            Err("connection reset")
        );
        assert_eq!(t.calls.len(), 1);
    }

    #[test]
    fn io_transport() {
        let mut t = IoTransport::new(Vec::new());
        send_binary_response(&mut t, b"\x00\x01", StatusCode::Created, "a/b", &[]).unwrap();
        send_response(&mut t, "ok", StatusCode::Accepted, "c/d", &[]).unwrap();

        assert_eq!(
            t.get_ref().as_slice(),
            b"HTTP/1.0 201 Created\r\nContent-Type:a/b\r\nContent-Length:2\r\n\r\n\x00\x01\
              HTTP/1.0 202 Accepted\r\nContent-Type:c/d\r\n\r\nok"
        );
    }

    #[test]
    fn io_transport_error() {
        struct Broken;

        impl io::Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = Response::text("x").send(&mut IoTransport::new(Broken)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn number_to_bytes() {
        for n in [0, 7, 10, 12_345, usize::MAX] {
            let (digits, start) = super::number_to_bytes(n);
            assert_eq!(&digits[start..], n.to_string().as_bytes());
        }
    }
}
