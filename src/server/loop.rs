// Server loop module
// Accepts connections until a shutdown signal arrives

use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept loop.
///
/// Each connection is handed to its own task; the loop itself never
/// waits on request handling. Returns once `shutdown` is notified.
/// Connections already in flight keep running on their tasks.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = shutdown.notified() => {
                logger::log_shutdown(state.active_connections.load(Ordering::SeqCst));
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Cli, Config};
    use crate::server::create_listener;
    use std::net::SocketAddr;
    use std::path::Path;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn spawn_server(
        root: &Path,
        read_timeout: u64,
    ) -> (SocketAddr, Arc<Notify>, tokio::task::JoinHandle<std::io::Result<()>>) {
        let cli = Cli {
            directory: root.to_str().unwrap().to_string(),
            config: "this-config-file-does-not-exist".to_string(),
            ..Cli::default()
        };
        let mut config = Config::load(&cli).unwrap();
        config.logging.access_log = false;
        config.performance.read_timeout = read_timeout;
        let state = Arc::new(AppState::new(config).unwrap());

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(listener, state, Arc::clone(&shutdown)));
        (addr, shutdown, server)
    }

    #[tokio::test]
    async fn test_serves_over_tcp_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), b"over the wire").unwrap();
        let (addr, shutdown, server) = spawn_server(dir.path(), 30).await;

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /hello.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let text = String::from_utf8_lossy(&raw);
        assert!(text.starts_with("HTTP/1.1 200 OK"));
        assert!(text.to_ascii_lowercase().contains("access-control-allow-origin: *"));
        assert!(text.ends_with("over the wire"));

        shutdown.notify_one();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_slow_upload_outlives_read_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let (addr, shutdown, server) = spawn_server(dir.path(), 1).await;

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                b"PUT /slow.txt HTTP/1.1\r\nHost: localhost\r\nContent-Length: 6\r\nConnection: close\r\n\r\n",
            )
            .await
            .unwrap();
        // 6 x 300ms: the body takes well past the 1s head timeout
        for byte in b"trickl" {
            tokio::time::sleep(Duration::from_millis(300)).await;
            stream.write_all(&[*byte]).await.unwrap();
        }

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let text = String::from_utf8_lossy(&raw);
        assert!(text.starts_with("HTTP/1.1 200 OK"), "{text}");
        assert_eq!(std::fs::read(dir.path().join("slow.txt")).unwrap(), b"trickl");

        shutdown.notify_one();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_stalled_request_head_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (addr, shutdown, server) = spawn_server(dir.path(), 1).await;

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"GET /never-finished HTTP/1.1\r\nHost: ").await.unwrap();

        let mut raw = Vec::new();
        let closed = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut raw)).await;
        assert!(closed.is_ok(), "connection still open after head timeout");
        assert!(!String::from_utf8_lossy(&raw).contains("200 OK"));

        shutdown.notify_one();
        server.await.unwrap().unwrap();
    }
}
