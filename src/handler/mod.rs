//! Request handler module
//!
//! Responsible for request routing dispatch and the file operations behind
//! each HTTP verb.

mod files;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
