//! Stream relay: one background task per streaming call, feeding a bounded
//! data channel and a one-shot error channel.
//!
//! The producer writes through a [`ChunkSink`]; the caller reads from a
//! [`StreamSession`]. Guarantees:
//!
//! - the data channel closes exactly once, when the producer finishes;
//! - the error channel carries at most one error and is only written after
//!   the data channel has closed, so "drain chunks, then check the error"
//!   observes the complete outcome;
//! - every send and every wait on the provider races the caller's
//!   [`CancellationToken`] and the consumer going away, so the producer never
//!   blocks forever on a reader that stopped reading.

use futures_util::FutureExt;
use sl_domain::error::{Error, Result};
use sl_domain::stream::BoxStream;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Default capacity of the data channel.
pub const DEFAULT_STREAM_BUFFER: usize = 16;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Consumer side
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The caller's end of one streaming call.
///
/// Read chunks with [`next_chunk`](Self::next_chunk) until it returns
/// `None`, then call [`finish`](Self::finish) once for the outcome.
/// Dropping the session stops the producer.
#[derive(Debug)]
pub struct StreamSession {
    chunks: mpsc::Receiver<String>,
    error: oneshot::Receiver<Error>,
}

impl StreamSession {
    /// The next text chunk, or `None` once the data channel has closed.
    pub async fn next_chunk(&mut self) -> Option<String> {
        self.chunks.recv().await
    }

    /// Wait for the producer to finish and return its outcome.
    ///
    /// Chunks not yet read are drained and discarded.
    pub async fn finish(mut self) -> Result<()> {
        while self.chunks.recv().await.is_some() {}
        match self.error.await {
            Ok(err) => Err(err),
            // Sender dropped without a value: the stream completed cleanly.
            Err(_) => Ok(()),
        }
    }

    /// Concatenate every chunk, then return the outcome.
    pub async fn collect(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(chunk) = self.chunks.recv().await {
            text.push_str(&chunk);
        }
        self.finish().await.map(|()| text)
    }

    /// Split into the raw data and error channels.
    pub fn into_parts(self) -> (mpsc::Receiver<String>, oneshot::Receiver<Error>) {
        (self.chunks, self.error)
    }

    /// A single tagged stream: `Ok(chunk)` items, then at most one `Err`.
    pub fn into_stream(self) -> BoxStream<'static, Result<String>> {
        let (mut chunks, error) = self.into_parts();
        let stream = async_stream::stream! {
            while let Some(chunk) = chunks.recv().await {
                yield Ok(chunk);
            }
            if let Ok(err) = error.await {
                yield Err(err);
            }
        };
        Box::pin(stream)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Producer side
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The producer's end of one streaming call.
pub struct ChunkSink {
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
    sent: usize,
}

impl ChunkSink {
    /// Deliver one chunk, waiting for channel capacity.
    ///
    /// Returns [`Error::Cancelled`] if the token fires or the consumer has
    /// dropped its end before the chunk is accepted.
    pub async fn push(&mut self, chunk: String) -> Result<()> {
        let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            res = self.tx.send(chunk) => res.is_ok(),
        };
        if !sent {
            return Err(Error::Cancelled);
        }
        self.sent += 1;
        Ok(())
    }

    /// Await `fut` unless the call is cancelled or the consumer goes away
    /// first.
    pub async fn race<F: Future>(&self, fut: F) -> Result<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = self.tx.closed() => Err(Error::Cancelled),
            out = fut => Ok(out),
        }
    }

    /// True once the token fired or the consumer dropped the session.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    /// Number of chunks delivered so far.
    pub fn sent(&self) -> usize {
        self.sent
    }
}

/// Spawn the producer task and return the consumer's session.
///
/// `produce` receives the sink and returns the future that drives the
/// provider. Its `Err` (if any) is published on the error channel after the
/// sink, and with it the data channel, has been dropped. A panic in the
/// producer is reported as [`Error::Generation`] rather than as success.
///
/// Must be called from within a tokio runtime.
pub fn spawn<F, Fut>(cancel: CancellationToken, capacity: usize, produce: F) -> StreamSession
where
    F: FnOnce(ChunkSink) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let (tx, chunks) = mpsc::channel(capacity.max(1));
    let (err_tx, error) = oneshot::channel();

    let fut = produce(ChunkSink {
        tx,
        cancel,
        sent: 0,
    });

    tokio::spawn(async move {
        let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(res) => res,
            Err(_) => Err(Error::Generation {
                message: "stream producer panicked".into(),
                source: None,
            }),
        };
        if let Err(e) = outcome {
            // The consumer may already be gone; nothing left to notify.
            let _ = err_tx.send(e);
        }
    });

    StreamSession { chunks, error }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
