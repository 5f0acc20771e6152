//! File operation handlers
//!
//! Resolve the request path, run the matching storage operation, and turn
//! its outcome into a response. Errors are returned to the router, which
//! logs them and renders the error page.

use crate::config::AppState;
use crate::http::{self, mime, ResponseBody};
use crate::storage::{listing, ops, FsError, ReadOutcome};
use hyper::body::Bytes;
use hyper::Response;

/// GET/HEAD: list a directory or stream a file
pub async fn serve_get(
    state: &AppState,
    request_path: &str,
    is_head: bool,
) -> Result<Response<ResponseBody>, FsError> {
    let path = state.resolver.resolve(request_path)?;

    match ops::read_or_list(&path).await? {
        ReadOutcome::Directory(entries) => {
            let html = listing::render(request_path, &entries);
            Ok(http::build_html_response(html, is_head))
        }
        ReadOutcome::File { file, path, len } => {
            let content_type = mime::content_type_for(&path);
            Ok(http::build_file_response(
                file,
                path,
                len,
                content_type,
                is_head,
            ))
        }
    }
}

/// PUT: store the body at the resolved path
pub async fn serve_put(
    state: &AppState,
    request_path: &str,
    body: Bytes,
) -> Result<Response<ResponseBody>, FsError> {
    let path = state.resolver.resolve(request_path)?;
    if path == state.resolver.root() {
        return Err(ops::is_a_directory("open", &path));
    }
    ops::write_file(&path, body).await?;
    Ok(http::build_ok_response("File uploaded successfully"))
}

/// DELETE: remove a single file
pub async fn serve_delete(
    state: &AppState,
    request_path: &str,
) -> Result<Response<ResponseBody>, FsError> {
    let path = state.resolver.resolve(request_path)?;
    ops::delete_file(&path).await?;
    Ok(http::build_ok_response("File deleted successfully"))
}
