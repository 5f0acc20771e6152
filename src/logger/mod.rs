//! Logger module
//!
//! Provides logging utilities for the file server including:
//! - Server lifecycle logging
//! - Per-request logging and combined/JSON access logs
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessRecord;
pub use writer::Level;

use crate::config::{AccessLogFormat, Config};
use std::net::SocketAddr;
use std::path::Path;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        Level::parse(&config.logging.level),
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: Level) -> bool {
    writer::get().map_or(true, |w| w.enabled(level))
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, root: &Path, config: &Config) {
    if !enabled(Level::Info) {
        return;
    }
    write_info("======================================");
    write_info(&format!("Server is running: http://{addr}"));
    write_info(&format!("Serving files from: {}", root.display()));
    write_info(&format!("Path policy: {:?}", config.storage.path_policy));
    write_info(&format!(
        "Max body size: {} bytes",
        config.storage.max_body_size
    ));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================");
}

pub fn log_shutdown(active_connections: usize) {
    if enabled(Level::Info) {
        write_info(&format!(
            "[Shutdown] Stopped accepting connections ({active_connections} still active)"
        ));
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    if enabled(Level::Debug) {
        write_info(&format!("[Connection] Accepted from: {peer_addr}"));
    }
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

/// Request line, logged before the request is handled
pub fn log_request(method: &hyper::Method, path: &str) {
    if enabled(Level::Info) {
        write_info(&format!("[Request] {method} {path}"));
    }
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    if enabled(Level::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_access(record: &AccessRecord, format: AccessLogFormat) {
    write_access(&record.render(format));
}
