//! Access log records
//!
//! A record is opened from the request head, closed once the response head
//! is known, and rendered as one line in the configured
//! [`AccessLogFormat`].

use crate::config::AccessLogFormat;
use chrono::{DateTime, Local};
use hyper::{header, Method, Request, StatusCode, Version};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Timestamp layout of the combined format, e.g. `10/Oct/2026:13:55:36 +0200`
const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One served request
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub peer: IpAddr,
    pub received: DateTime<Local>,
    pub method: Method,
    /// Raw request target, path plus query, still percent-encoded
    pub target: String,
    pub version: Version,
    pub status: StatusCode,
    /// Declared response length; 0 when the response carries none
    pub bytes: u64,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub elapsed: Duration,
}

/// Field layout of a `json` line
#[derive(Serialize)]
struct JsonLine<'a> {
    time: String,
    peer: String,
    method: &'a str,
    target: &'a str,
    version: &'static str,
    status: u16,
    bytes: u64,
    referer: Option<&'a str>,
    user_agent: Option<&'a str>,
    duration_ms: f64,
}

impl AccessRecord {
    /// Capture everything the log needs from the request head
    pub fn open<B>(req: &Request<B>, peer: SocketAddr) -> Self {
        let header_string = |name: header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            peer: peer.ip(),
            received: Local::now(),
            method: req.method().clone(),
            target: req
                .uri()
                .path_and_query()
                .map_or_else(|| req.uri().path().to_string(), ToString::to_string),
            version: req.version(),
            status: StatusCode::OK,
            bytes: 0,
            referer: header_string(header::REFERER),
            user_agent: header_string(header::USER_AGENT),
            elapsed: Duration::ZERO,
        }
    }

    /// Record the outcome
    pub fn close(&mut self, status: StatusCode, bytes: u64, elapsed: Duration) {
        self.status = status;
        self.bytes = bytes;
        self.elapsed = elapsed;
    }

    pub fn render(&self, format: AccessLogFormat) -> String {
        match format {
            AccessLogFormat::Combined => self.combined(),
            AccessLogFormat::Json => self.json(),
        }
    }

    fn combined(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/{}\" {} {} \"{}\" \"{}\"",
            self.peer,
            self.received.format(CLF_TIME),
            self.method,
            self.target,
            version_label(self.version),
            self.status.as_u16(),
            self.bytes,
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    fn json(&self) -> String {
        let line = JsonLine {
            time: self.received.to_rfc3339(),
            peer: self.peer.to_string(),
            method: self.method.as_str(),
            target: &self.target,
            version: version_label(self.version),
            status: self.status.as_u16(),
            bytes: self.bytes,
            referer: self.referer.as_deref(),
            user_agent: self.user_agent.as_deref(),
            duration_ms: f64::from(u32::try_from(self.elapsed.as_micros()).unwrap_or(u32::MAX))
                / 1000.0,
        };
        // serializing plain strings and numbers cannot fail
        serde_json::to_string(&line).unwrap_or_default()
    }
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
