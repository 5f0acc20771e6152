// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing the connection limit.
///
/// The counter is incremented before the limit check so two racing
/// accepts cannot both slip under it.
pub fn accept_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, state: &Arc<AppState>) {
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    if let Err(e) = stream.set_nodelay(true) {
        logger::log_warning(&format!("Failed to set TCP_NODELAY for {peer_addr}: {e}"));
    }
    handle_connection(stream, peer_addr, Arc::clone(state));
}

/// Serve one connection in a spawned task.
///
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive
/// 3. Bounds how long a request head may take to arrive
/// 4. Serves requests through the router
/// 5. Decrements the connection counter when done
///
/// Only the head is timed. A slow upload or a long download keeps its
/// connection for as long as bytes keep moving.
fn handle_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let perf = &state.config.performance;

        let mut builder = http1::Builder::new();
        builder.keep_alive(perf.keep_alive_timeout > 0);
        if perf.read_timeout > 0 {
            builder
                .timer(TokioTimer::new())
                .header_read_timeout(Duration::from_secs(perf.read_timeout));
        }

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), peer_addr)),
        );

        if let Err(err) = conn.await {
            if err.is_timeout() {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} sent no request head within {} seconds",
                    perf.read_timeout
                ));
            } else {
                logger::log_connection_error(&err);
            }
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}
