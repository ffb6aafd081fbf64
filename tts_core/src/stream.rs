//! Chunked delivery helpers.
//!
//! The provider hands back one complete audio buffer. To deliver it
//! incrementally we slice it into fixed-size windows: every chunk is
//! `chunk_size` bytes except the last, which carries the remainder.
//! Chunks are `Bytes` views into the original buffer, so iterating
//! never copies audio data.
//!
//! Pacing is deliberately not part of this module. Callers that want
//! to spread chunks over time do so around the iterator.

use std::iter::FusedIterator;

use bytes::Bytes;

/// Default stride used by the relay when streaming audio to clients.
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// Number of chunks a buffer of `len` bytes is split into.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    assert!(chunk_size > 0, "chunk size must be non-zero");
    len.div_ceil(chunk_size)
}

/// Iterator over sequential, non-overlapping chunks of an audio buffer.
#[derive(Debug, Clone)]
pub struct AudioChunks {
    audio: Bytes,
    chunk_size: usize,
    offset: usize,
}

impl AudioChunks {
    /// Panics if `chunk_size` is zero, like `slice::chunks`.
    pub fn new(audio: Bytes, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be non-zero");
        Self {
            audio,
            chunk_size,
            offset: 0,
        }
    }
}

impl Iterator for AudioChunks {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        if self.offset >= self.audio.len() {
            return None;
        }
        let end = (self.offset + self.chunk_size).min(self.audio.len());
        let chunk = self.audio.slice(self.offset..end);
        self.offset = end;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = chunk_count(self.audio.len() - self.offset, self.chunk_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AudioChunks {}

impl FusedIterator for AudioChunks {}
