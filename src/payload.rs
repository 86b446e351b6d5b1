use bytes::Bytes;
use tracing::info;

use crate::error::BenchError;

/// Byte every payload position is filled with.
pub const FILL_BYTE: u8 = b'a';

/// The dataset served by one server process.
///
/// Cloning is cheap and shares the same buffer; the content is never mutated
/// after generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    data: Bytes,
}

impl Payload {
    /// Generate a payload of exactly `size` bytes filled with [`FILL_BYTE`].
    ///
    /// Fails when the buffer cannot be allocated.
    pub fn generate(size: u64) -> Result<Self, BenchError> {
        info!("Generating payload of {} bytes", size);
        let len = usize::try_from(size).map_err(|_| BenchError::PayloadAllocation { size })?;

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|_| BenchError::PayloadAllocation { size })?;
        buffer.resize(len, FILL_BYTE);

        info!("Done generating payload");
        Ok(Self {
            data: Bytes::from(buffer),
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Zero-copy view of `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Bytes {
        self.data.slice(start..end)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Bytes> for Payload {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}
