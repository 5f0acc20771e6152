//! HTTP protocol layer module
//!
//! Response builders and MIME detection, decoupled from routing and storage.

pub mod mime;
pub mod response;

// Re-export commonly used types
pub use response::{
    apply_common_headers, build_404_response, build_405_response, build_413_response,
    build_error_response, build_file_response, build_html_response, build_ok_response,
    build_options_response, ResponseBody,
};
