//! TCP listener with a cap on concurrently handled connections.
//!
//! A permit is taken before each accept. When all permits are in use the
//! accept loop waits, so further clients queue in the kernel backlog
//! instead of being refused.

use anyhow::Context;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::info;

/// Pause after a failed accept (e.g. file descriptor exhaustion).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct Listener {
    inner: TcpListener,
    connection_limit: Arc<Semaphore>,
}

impl Listener {
    pub async fn bind(addr: &str, max_connections: usize) -> anyhow::Result<Self> {
        let inner = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!(
            address = %inner.local_addr()?,
            max_connections,
            "Listening"
        );

        Ok(Self {
            inner,
            connection_limit: Arc::new(Semaphore::new(max_connections.max(1))),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accepts connections forever, running `handler` on its own task for
    /// each one. The task owns the stream; it is closed when the task ends.
    ///
    /// Accept errors are logged and never end the loop.
    pub async fn serve<F, Fut>(self, handler: F) -> anyhow::Result<()>
    where
        F: Fn(TcpStream, SocketAddr) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        loop {
            let permit = self
                .connection_limit
                .clone()
                .acquire_owned()
                .await
                .context("Connection limit semaphore closed")?;

            match self.inner.accept().await {
                Ok((socket, peer)) => {
                    info!("Accepted connection from {}", peer);
                    let task = handler(socket, peer);
                    tokio::spawn(async move {
                        task.await;
                        drop(permit);
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}
