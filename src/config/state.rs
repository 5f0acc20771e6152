// Application state module
// Immutable per-process state shared by every connection

use std::sync::atomic::AtomicUsize;

use super::types::Config;
use crate::storage::PathResolver;

/// Application state
pub struct AppState {
    pub config: Config,
    pub resolver: PathResolver,
    /// Connections currently being served
    pub active_connections: AtomicUsize,
}

impl AppState {
    /// Build state from a loaded config, resolving the root directory once
    pub fn new(config: Config) -> std::io::Result<Self> {
        let root = config.root_dir()?;
        let resolver = PathResolver::new(root, config.storage.path_policy);
        Ok(Self {
            config,
            resolver,
            active_connections: AtomicUsize::new(0),
        })
    }
}
