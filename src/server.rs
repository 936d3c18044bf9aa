//! Line-delimited JSON-RPC server.
//!
//! Reads one request envelope per line, handles each on its own task and
//! writes one response envelope per line. Responses may be written out of
//! request order; callers match them by id.

use crate::dispatch::Dispatcher;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Serves a [`Dispatcher`] over a pair of byte streams.
#[derive(Debug)]
pub struct LineServer {
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
}

impl LineServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops [`LineServer::serve`] when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Run until EOF on `reader` or cancellation. In-flight requests are
    /// finished and their responses flushed before returning.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let writer_task = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<_, io::Error>(())
        });

        let mut buf = Vec::new();
        let mut in_flight = JoinSet::new();
        tracing::info!("line server started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("line server shutting down");
                    break;
                }
                read = reader.read_until(b'\n', &mut buf) => {
                    if read? == 0 {
                        break;
                    }
                    // Decoded per request, so a non-UTF-8 line gets an error response.
                    let line = std::mem::take(&mut buf);
                    if line.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    let dispatcher = self.dispatcher.clone();
                    let tx = tx.clone();
                    in_flight.spawn(async move {
                        let response = dispatcher.handle_bytes(&line).await;
                        match serde_json::to_string(&response) {
                            Ok(encoded) => {
                                if tx.send(encoded).is_err() {
                                    tracing::warn!("response dropped: writer closed");
                                }
                            }
                            Err(e) => tracing::error!(error = %e, "response_encoding_failed"),
                        }
                    });
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "request task failed");
            }
        }
        drop(tx);
        writer_task.await.map_err(io::Error::other)?
    }
}
