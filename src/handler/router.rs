//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method dispatch, body limits,
//! error conversion, common headers and access logging.

use crate::config::AppState;
use crate::handler::files;
use crate::http::{self, response, ResponseBody};
use crate::logger::{self, AccessRecord};
use crate::storage::FsError;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Answered with 404 without touching the filesystem
const FAVICON_PATH: &str = "/favicon.ico";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main entry point for HTTP request handling
///
/// Generic over the request body so tests can drive it without a socket.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    logger::log_request(&method, &path);

    let access_record = state
        .config
        .logging
        .access_log
        .then(|| AccessRecord::open(&req, peer_addr));

    let mut response = route_request(req, &state, &method, &path).await;

    http::apply_common_headers(
        &mut response,
        &state.config.http.server_name,
        state.config.http.enable_cors,
    );

    if let Some(mut record) = access_record {
        let bytes = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        record.close(response.status(), bytes, started.elapsed());
        logger::log_access(&record, state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Dispatch on method and path
async fn route_request<B>(
    req: Request<B>,
    state: &AppState,
    method: &Method,
    path: &str,
) -> Response<ResponseBody>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BoxError>,
{
    let result = match *method {
        Method::GET | Method::HEAD if is_favicon(path) => {
            return http::build_404_response();
        }
        Method::GET | Method::HEAD => {
            files::serve_get(state, path, *method == Method::HEAD).await
        }
        Method::PUT => {
            let max_body_size = state.config.storage.max_body_size;
            if let Some(resp) = check_body_size(&req, max_body_size) {
                return resp;
            }
            let body = match read_body(req.into_body(), max_body_size).await {
                Ok(body) => body,
                Err(resp) => return resp,
            };
            files::serve_put(state, path, body).await
        }
        Method::DELETE => files::serve_delete(state, path).await,
        Method::OPTIONS => {
            let requested = req
                .headers()
                .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
                .and_then(|v| v.to_str().ok());
            return http::build_options_response(requested);
        }
        _ => {
            logger::log_warning(&format!("Method not allowed: {method} {path}"));
            return http::build_405_response();
        }
    };

    result.unwrap_or_else(|err| error_response(method, path, &err))
}

/// Case-insensitive, tolerates one trailing slash
fn is_favicon(path: &str) -> bool {
    path.strip_suffix('/')
        .unwrap_or(path)
        .eq_ignore_ascii_case(FAVICON_PATH)
}

/// Log a filesystem error and convert it to its response
fn error_response(method: &Method, path: &str, err: &FsError) -> Response<ResponseBody> {
    logger::log_error(&format!("{method} {path}: {err}"));
    http::build_error_response(err)
}

/// Reject a declared Content-Length above the limit before reading anything
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<ResponseBody>> {
    let content_length = req.headers().get(header::CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response(max_body_size))
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Collect the whole body, enforcing the limit for chunked uploads too
async fn read_body<B>(body: B, max_body_size: u64) -> Result<Bytes, Response<ResponseBody>>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BoxError>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_error(&format!(
                "Request body exceeded {max_body_size} bytes while reading"
            ));
            Err(http::build_413_response(max_body_size))
        }
        Err(err) => {
            logger::log_error(&format!("Failed to read request body: {err}"));
            Err(response::build_bad_request_response(&format!(
                "Failed to read request body: {err}"
            )))
        }
    }
}
