// Configuration module entry point
// Merges CLI arguments, config file, environment and defaults into one immutable value

mod cli;
mod state;
mod types;

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

// Re-export public types
pub use cli::Cli;
pub use state::AppState;
pub use types::{AccessLogFormat, Config, PathPolicy};

/// Default request body cap: 50MB
pub const DEFAULT_MAX_BODY_SIZE: u64 = 52_428_800;

impl Config {
    /// Load configuration with CLI arguments taking precedence
    ///
    /// Order (highest first): CLI, `FILESERVER_*` environment, config file, defaults.
    /// The config file named by `--config` is optional.
    pub fn load(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(&cli.config).required(false))
            .add_source(
                config::Environment::with_prefix("FILESERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("storage.root", ".")?
            .set_default("storage.path_policy", "confined")?
            .set_default("storage.max_body_size", DEFAULT_MAX_BODY_SIZE)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("http.server_name", "rust_fileserver")?
            .set_default("http.enable_cors", true)?
            .set_override("storage.root", cli.directory.as_str())?
            .set_override_option("server.port", cli.port.map(i64::from))?
            .set_override_option("server.host", cli.host.clone())?;

        if cli.allow_traversal {
            builder = builder.set_override("storage.path_policy", "join")?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Absolute, lexically normalized root directory
    ///
    /// Relative roots are resolved against the process working directory.
    /// Symlinks are left alone and the directory need not exist.
    pub fn root_dir(&self) -> std::io::Result<PathBuf> {
        let absolute = std::path::absolute(&self.storage.root)?;
        Ok(normalize(&absolute))
    }
}

/// Collapse `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
