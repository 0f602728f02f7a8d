//! Liveness listener.
//!
//! A tiny axum app that answers every request with `200 OK`. It exists so a
//! process supervisor sees an open port; it shares nothing with the
//! pipeline, and a port that cannot be bound never stops the relay.

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

async fn ok() -> &'static str {
    "OK"
}

/// Every path and method answers `OK`.
pub fn router() -> Router {
    Router::new().fallback(ok)
}

/// Serve [`router`] on `listener` until the process exits.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router()).await
}

/// Start the liveness listener on `0.0.0.0:port` in the background.
///
/// # Arguments
///
/// * `port` - TCP port to bind
///
/// # Returns
///
/// The handle of the background task. When the port cannot be bound the
/// error is logged and the task ends straight away; the caller carries on
/// without a listener.
pub fn spawn(port: u16) -> JoinHandle<()> {
    tokio::spawn(async move {
        let listener = match TcpListener::bind(("0.0.0.0", port)).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(port, error = %e, "Could not bind liveness listener; continuing without it");
                return;
            }
        };
        match listener.local_addr() {
            Ok(addr) => info!(%addr, "Liveness listener started"),
            Err(_) => info!(port, "Liveness listener started"),
        }
        if let Err(e) = serve(listener).await {
            error!(error = %e, "Liveness listener stopped");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn get(addr: std::net::SocketAddr, path: &str) -> String {
        let mut client = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        client.write_all(request.as_bytes()).await.unwrap();
        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        String::from_utf8(reply).unwrap()
    }

    #[tokio::test]
    async fn test_answers_every_request_with_ok() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(listener));

        for path in ["/", "/healthz"] {
            let reply = get(addr, path).await;
            assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "{reply}");
            assert!(reply.ends_with("\r\n\r\nOK"), "{reply}");
        }

        server.abort();
    }

    #[tokio::test]
    async fn test_bind_failure_ends_task_quietly() {
        let taken = std::net::TcpListener::bind(("0.0.0.0", 0)).unwrap();
        let port = taken.local_addr().unwrap().port();

        let handle = spawn(port);

        let joined = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("task should end once the bind fails");
        assert!(joined.is_ok());
        drop(taken);
    }
}
