//! Command-stream cursors.
//!
//! The encoder owns a chain of heap chunks that later becomes the scatter
//! list handed to the renderer; the decoder walks a borrowed reply buffer.
//! Both carry a sticky error: once a cursor goes bad, every further access
//! is a cheap no-op and the failure is surfaced once, at command
//! granularity, via `check()`. This mirrors device-lost semantics -- a
//! corrupt stream is fatal to the connection, never retried.

use crate::error::StreamError;

/// Default minimum chunk size for encoder output.
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 4096;

/// Growable write cursor for command emission.
///
/// Writes never straddle a chunk boundary: when the tail chunk cannot hold
/// a reservation, it is sealed and a larger chunk is started. Callers that
/// know a command's wire size up front can `reserve()` it to guarantee a
/// single contiguous chunk.
pub struct Encoder {
    min_chunk_size: usize,
    /// Sealed chunks plus the tail chunk currently being written.
    chunks: Vec<Vec<u8>>,
    error: Option<StreamError>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_min_chunk_size(DEFAULT_MIN_CHUNK_SIZE)
    }

    pub fn with_min_chunk_size(min_chunk_size: usize) -> Self {
        assert!(min_chunk_size > 0);
        Self {
            min_chunk_size,
            chunks: Vec::new(),
            error: None,
        }
    }

    pub fn set_error(&mut self, err: StreamError) {
        // first error wins
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Surface the sticky error, typically once per encoded command.
    pub fn check(&self) -> Result<(), StreamError> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Total bytes emitted across all chunks.
    pub fn total_len(&self) -> usize {
        self.chunks.iter().map(|c| c.len()).sum()
    }

    /// Iterate the chunks for scatter submission.
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        self.chunks.iter().map(|c| c.as_slice())
    }

    /// Copy out a contiguous byte image of the stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_len());
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Reset for reuse, keeping the last chunk's allocation. The sticky
    /// error is not cleared.
    pub fn reset(&mut self) {
        if let Some(mut last) = self.chunks.pop() {
            last.clear();
            self.chunks.clear();
            self.chunks.push(last);
        }
    }

    fn tail_remaining(&self) -> usize {
        self.chunks
            .last()
            .map(|c| c.capacity() - c.len())
            .unwrap_or(0)
    }

    /// Ensure the tail chunk can hold `size` contiguous bytes.
    pub fn reserve(&mut self, size: usize) {
        if !self.chunks.is_empty() && size <= self.tail_remaining() {
            return;
        }

        // double from the previous chunk size until the reservation fits
        let prev = self.chunks.last().map(|c| c.capacity()).unwrap_or(0);
        let mut chunk_size = prev.max(self.min_chunk_size);
        while chunk_size < size {
            chunk_size = match chunk_size.checked_mul(2) {
                Some(next) => next,
                None => {
                    self.set_error(StreamError::OutOfSpace);
                    return;
                }
            };
        }

        self.chunks.push(Vec::with_capacity(chunk_size));
    }

    /// Advance the stream by `size` bytes, copying `val` and zero-padding
    /// the remainder.
    pub fn write(&mut self, size: usize, val: &[u8]) {
        debug_assert!(val.len() <= size);

        self.reserve(size);
        if self.has_error() {
            return;
        }

        let Some(tail) = self.chunks.last_mut() else {
            return;
        };
        tail.extend_from_slice(val);
        tail.resize(tail.len() + (size - val.len()), 0);
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounds-checked read cursor over a reply buffer.
///
/// A short read zero-fills the destination and trips the sticky error
/// instead of panicking; the advance of a read may exceed the number of
/// bytes copied (trailing wire padding).
pub struct Decoder<'a> {
    data: &'a [u8],
    cur: usize,
    error: Option<StreamError>,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            cur: 0,
            error: None,
        }
    }

    pub fn set_error(&mut self, err: StreamError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn check(&self) -> Result<(), StreamError> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.cur
    }

    /// Advance by `size`, copying the first `val.len()` bytes of the span.
    pub fn read(&mut self, size: usize, val: &mut [u8]) {
        debug_assert!(val.len() <= size);

        if self.has_error() || size > self.remaining() {
            self.set_error(StreamError::OutOfBounds);
            val.fill(0);
            return;
        }

        val.copy_from_slice(&self.data[self.cur..self.cur + val.len()]);
        self.cur += size;
    }

    /// Copy without advancing.
    pub fn peek(&mut self, val: &mut [u8]) {
        if self.has_error() || val.len() > self.remaining() {
            self.set_error(StreamError::OutOfBounds);
            val.fill(0);
            return;
        }

        val.copy_from_slice(&self.data[self.cur..self.cur + val.len()]);
    }

    /// Borrow `len` raw bytes and advance by the 4-byte padded span.
    pub fn read_blob(&mut self, len: usize) -> &'a [u8] {
        let padded = (len + 3) & !3;
        if self.has_error() || padded > self.remaining() {
            self.set_error(StreamError::OutOfBounds);
            return &[];
        }

        let out = &self.data[self.cur..self.cur + len];
        self.cur += padded;
        out
    }
}
