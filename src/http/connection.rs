use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::http::reader::read_request;
use crate::http::request::Request;
use crate::http::router::{route, AppState};
use crate::http::writer::ResponseWriter;

pub struct Connection<S> {
    stream: S,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            state: ConnectionState::Reading,
        }
    }

    /// Serves exactly one request, then closes.
    ///
    /// A malformed request closes the connection without a response and is
    /// returned as the error.
    pub async fn run(&mut self, app: &AppState) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    let req = read_request(&mut self.stream).await?;
                    tracing::info!(method = %req.method, path = %req.path, "Request received");
                    self.state = ConnectionState::Processing(req);
                }

                ConnectionState::Processing(req) => {
                    let response = route(&req, app).await;
                    tracing::debug!(
                        status = response.status.as_u16(),
                        method = %req.method,
                        path = %req.path,
                        "Response ready"
                    );
                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Writing(writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    tracing::debug!(bytes = writer.len(), "Response sent");
                }

                ConnectionState::Closed => break,
            }
        }

        let _ = self.stream.shutdown().await;
        Ok(())
    }
}
