//! Storage module
//!
//! Path resolution, directory listings and the filesystem operations
//! behind each HTTP verb. Nothing here knows about HTTP beyond
//! [`FsError::status`].

mod error;
pub mod listing;
pub mod ops;
mod resolver;

pub use error::FsError;
pub use ops::ReadOutcome;
pub use resolver::PathResolver;
