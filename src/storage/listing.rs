//! Directory listing generation

use super::FsError;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::io;
use std::path::Path;
use tokio::fs;

/// Bytes escaped when a child name becomes one URL path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\');

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    /// Own type, symlinks not followed
    pub is_dir: bool,
}

/// Enumerate the immediate children of `dir` in filesystem order
pub async fn read_entries(dir: &Path) -> Result<Vec<ListingEntry>, FsError> {
    let mut reader = fs::read_dir(dir)
        .await
        .map_err(|e| FsError::io("scandir", dir, e))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| FsError::io("scandir", dir, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| FsError::io("lstat", &entry.path(), e))?;
        let name = entry.file_name().into_string().map_err(|raw| {
            FsError::io(
                "scandir",
                dir,
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("file name {raw:?} is not valid UTF-8"),
                ),
            )
        })?;
        entries.push(ListingEntry {
            name,
            is_dir: file_type.is_dir(),
        });
    }
    Ok(entries)
}

/// Render the HTML listing page
///
/// `request_path` is the raw URL path; links are built from it so they
/// round-trip through the browser unchanged.
pub fn render(request_path: &str, entries: &[ListingEntry]) -> String {
    let mut html = String::from("<html><body><h1>Directory Listing</h1><ul>");

    if let Some(parent) = parent_link(request_path) {
        html.push_str(&format!(
            "<li><a href=\"{}\">.. (parent directory)</a></li>",
            escape_html(parent)
        ));
    }

    let base = request_path.trim_end_matches('/');
    for entry in entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        let href = format!("{base}/{}{suffix}", utf8_percent_encode(&entry.name, SEGMENT));
        html.push_str(&format!(
            "<li><a href=\"{}\">{}{suffix}</a></li>",
            escape_html(&href),
            escape_html(&entry.name)
        ));
    }

    html.push_str("</ul></body></html>");
    html
}

/// Parent of a request path, or `None` at the root
fn parent_link(request_path: &str) -> Option<&str> {
    if request_path == "/" || request_path.is_empty() {
        return None;
    }
    let trimmed = request_path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => Some("/"),
        Some(idx) => Some(&trimmed[..idx]),
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
