use async_trait::async_trait;
use bytes::Bytes;
use tonic::Status;
use tracing::debug;

use crate::{error::BenchError, message::DataResponse, payload::Payload};

/// How the payload is cut into messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPolicy {
    /// Chunks of at most `n` bytes, `n > 0`.
    Fixed(usize),
    /// The whole payload as a single message.
    Whole,
}

impl ChunkPolicy {
    pub fn fixed(chunk_size: usize) -> Result<Self, BenchError> {
        if chunk_size == 0 {
            return Err(BenchError::InvalidConfig(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        Ok(Self::Fixed(chunk_size))
    }

    fn step(&self, payload_len: usize) -> usize {
        match self {
            Self::Fixed(n) => *n,
            Self::Whole => payload_len.max(1),
        }
    }
}

/// Returned by a sink whose consumer has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

/// Ordered, write-only destination of the chunks of one stream.
#[async_trait]
pub trait ChunkSink: Send + Sync {
    /// Deliver one chunk, waiting while the sink is full.
    async fn send_chunk(&self, chunk: Bytes) -> Result<(), SinkClosed>;
}

/// Sink backed by the bounded channel that feeds a tonic response stream.
pub struct ResponseSink {
    tx: flume::Sender<Result<DataResponse, Status>>,
}

impl ResponseSink {
    pub fn new(tx: flume::Sender<Result<DataResponse, Status>>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ChunkSink for ResponseSink {
    async fn send_chunk(&self, chunk: Bytes) -> Result<(), SinkClosed> {
        self.tx
            .send_async(Ok(DataResponse { data: chunk }))
            .await
            .map_err(|_| SinkClosed)
    }
}

/// How a single stream ended. Both variants are successful outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Every chunk was delivered.
    Completed { chunks: usize, bytes: usize },
    /// The consumer went away before the payload was exhausted.
    Disconnected { chunks: usize, bytes: usize },
}

/// Walks a payload with a private cursor and pushes its chunks into a sink.
#[derive(Debug, Clone, Copy)]
pub struct ChunkStreamer {
    policy: ChunkPolicy,
    verbose: bool,
}

impl ChunkStreamer {
    pub fn new(policy: ChunkPolicy, verbose: bool) -> Self {
        Self { policy, verbose }
    }

    pub async fn stream<S>(&self, payload: &Payload, sink: &S) -> StreamOutcome
    where
        S: ChunkSink + ?Sized,
    {
        let len = payload.len();
        let step = self.policy.step(len);
        let mut cursor = 0usize;
        let mut chunks = 0usize;
        let mut bytes = 0usize;

        while cursor < len {
            let boundary = cursor.saturating_add(step).min(len);
            let chunk = payload.slice(cursor, boundary);
            let chunk_len = chunk.len();
            if self.verbose {
                debug!("Sending {} bytes...", chunk_len);
            }
            if sink.send_chunk(chunk).await.is_err() {
                debug!("Consumer disconnected after {} chunks", chunks);
                return StreamOutcome::Disconnected { chunks, bytes };
            }
            chunks += 1;
            bytes += chunk_len;
            // Advance by the configured step; the last chunk is bounded by `min` above.
            cursor = cursor.saturating_add(step);
        }

        StreamOutcome::Completed { chunks, bytes }
    }
}
