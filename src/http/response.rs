//! HTTP response building module
//!
//! Provides builders for every response the server sends, decoupled from
//! request routing. Build failures fall back to a bare response and are logged.

use crate::storage::FsError;
use futures_util::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header::{self, HeaderValue};
use hyper::Response;
use std::path::PathBuf;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Body type shared by every response
pub type ResponseBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// Methods this server routes
pub const ALLOWED_METHODS: &str = "GET, HEAD, PUT, DELETE, OPTIONS";

/// Methods advertised in CORS preflight answers
const CORS_METHODS: &str = "GET,HEAD,PUT,DELETE,OPTIONS";

/// Wrap bytes in a response body
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Empty response body
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Error page with the message embedded verbatim
pub fn error_page(message: &str) -> String {
    format!("<html><body><h1>Error</h1><p>{message}</p></body></html>")
}

/// Map a filesystem error onto its status and HTML error page
pub fn build_error_response(err: &FsError) -> Response<ResponseBody> {
    build_status_html(err.status(), error_page(&err.to_string()))
}

/// Build 400 Bad Request response with an error page
pub fn build_bad_request_response(message: &str) -> Response<ResponseBody> {
    build_status_html(400, error_page(message))
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    build_status_html(404, "Not Found".to_string())
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    Response::builder()
        .status(405)
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::ALLOW, ALLOWED_METHODS)
        .body(full("405 Method Not Allowed"))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(full("405 Method Not Allowed"))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response(max_body_size: u64) -> Response<ResponseBody> {
    build_status_html(
        413,
        error_page(&format!(
            "Request body exceeds the limit of {max_body_size} bytes"
        )),
    )
}

/// Build CORS preflight response
///
/// Requested headers are echoed back, or `*` when none were named.
pub fn build_options_response(requested_headers: Option<&str>) -> Response<ResponseBody> {
    Response::builder()
        .status(204)
        .header(header::ALLOW, ALLOWED_METHODS)
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, CORS_METHODS)
        .header(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            requested_headers.unwrap_or("*"),
        )
        .header(header::CONTENT_LENGTH, 0)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(empty())
        })
}

/// Build 200 response carrying a short confirmation message
pub fn build_ok_response(message: &'static str) -> Response<ResponseBody> {
    build_status_html(200, message.to_string())
}

/// Build 200 HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<ResponseBody> {
    let content_length = content.len();
    let body = if is_head { empty() } else { full(content) };

    Response::builder()
        .status(200)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(header::CONTENT_LENGTH, content_length)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(empty())
        })
}

/// Build 200 response streaming a file
///
/// `len` is declared up front. A read error mid-transfer is logged and
/// ends the body with that error, which aborts the connection after the
/// headers have gone out.
pub fn build_file_response<R>(
    file: R,
    path: PathBuf,
    len: u64,
    content_type: &str,
    is_head: bool,
) -> Response<ResponseBody>
where
    R: AsyncRead + Send + 'static,
{
    let body = if is_head {
        empty()
    } else {
        let stream = ReaderStream::new(file)
            .map_ok(Frame::data)
            .inspect_err(move |e| {
                crate::logger::log_error(&format!(
                    "Stream failed for '{}': {e}",
                    path.display()
                ));
            });
        StreamBody::new(stream).boxed_unsync()
    };

    Response::builder()
        .status(200)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, len)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(empty())
        })
}

/// Stamp headers that every response carries
pub fn apply_common_headers(
    response: &mut Response<ResponseBody>,
    server_name: &str,
    enable_cors: bool,
) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(server_name) {
        headers.insert(header::SERVER, value);
    }
    if enable_cors {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
    }
}

fn build_status_html(status: u16, content: String) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(header::CONTENT_LENGTH, content.len())
        .body(full(content))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            Response::new(empty())
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncReadExt, ReadBuf};

    /// Every read fails, like a file on a disk that went away
    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk went away")))
        }
    }

    async fn body_string(resp: Response<ResponseBody>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_error_response_embeds_message() {
        let err = FsError::not_found(
            Path::new("/srv/x"),
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        let resp = build_error_response(&err);
        assert_eq!(resp.status(), 500);
        let body = body_string(resp).await;
        assert!(body.starts_with("<html><body><h1>Error</h1><p>"));
        assert!(body.contains("No such file or directory"));
    }

    #[tokio::test]
    async fn test_directory_delete_page() {
        let err = FsError::IsDirectory {
            path: PathBuf::from("/srv/d"),
        };
        let resp = build_error_response(&err);
        assert_eq!(resp.status(), 400);
        assert_eq!(
            body_string(resp).await,
            "<html><body><h1>Error</h1><p>Cannot delete a directory</p></body></html>"
        );
    }

    #[test]
    fn test_options_echoes_requested_headers() {
        let resp = build_options_response(Some("x-custom"));
        assert_eq!(resp.status(), 204);
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "x-custom"
        );
        let resp = build_options_response(None);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
    }

    #[test]
    fn test_common_headers() {
        let mut resp = build_404_response();
        apply_common_headers(&mut resp, "test-server", true);
        assert_eq!(resp.headers()[header::SERVER], "test-server");
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let mut resp = build_404_response();
        apply_common_headers(&mut resp, "test-server", false);
        assert!(resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_head_html_has_length_but_no_body() {
        let resp = build_html_response("<p>hi</p>".to_string(), true);
        assert_eq!(resp.headers()[header::CONTENT_LENGTH], "9");
        assert!(body_string(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_file_stream_error_aborts_body() {
        let reader = (&b"partial"[..]).chain(FailingReader);
        let resp = build_file_response(
            reader,
            PathBuf::from("/srv/big.bin"),
            100,
            "application/octet-stream",
            false,
        );
        assert_eq!(resp.headers()[header::CONTENT_LENGTH], "100");

        let mut body = resp.into_body();
        let first = body.frame().await.unwrap().unwrap();
        assert_eq!(first.into_data().unwrap(), Bytes::from_static(b"partial"));

        let err = body.frame().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "disk went away");
    }

    #[tokio::test]
    async fn test_file_stream_error_fails_collect() {
        let resp = build_file_response(
            FailingReader,
            PathBuf::from("/srv/gone.txt"),
            5,
            "text/plain; charset=utf-8",
            false,
        );
        assert!(resp.into_body().collect().await.is_err());
    }

    #[tokio::test]
    async fn test_file_head_skips_reader() {
        let resp = build_file_response(
            FailingReader,
            PathBuf::from("/srv/gone.txt"),
            5,
            "text/plain; charset=utf-8",
            true,
        );
        assert_eq!(resp.headers()[header::CONTENT_LENGTH], "5");
        assert!(body_string(resp).await.is_empty());
    }
}
