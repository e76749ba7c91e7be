//! Shared-memory command ring model.
//!
//! One producer submits encoded command streams, one consumer drains them.
//! Head and tail are monotonically increasing counters; the buffer index is
//! the counter masked by the power-of-two capacity, so the ring never needs
//! a separate empty/full disambiguation bit.

use parking_lot::{Condvar, Mutex};

use crate::error::TransportError;

/// Ring status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RingStatus {
    /// Consumer is actively polling.
    Active = 0,
    /// Consumer parked; the producer must notify after writing.
    Idle = 1,
}

struct RingState {
    buf: Vec<u8>,
    head: u64,
    tail: u64,
    status: RingStatus,
}

pub struct Ring {
    state: Mutex<RingState>,
    readable: Condvar,
    writable: Condvar,
    capacity: usize,
}

impl Ring {
    /// Capacity must be a power of two.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity.is_power_of_two());
        Self {
            state: Mutex::new(RingState {
                buf: vec![0; capacity],
                head: 0,
                tail: 0,
                status: RingStatus::Active,
            }),
            readable: Condvar::new(),
            writable: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes queued but not yet consumed.
    pub fn used(&self) -> usize {
        let state = self.state.lock();
        (state.tail - state.head) as usize
    }

    pub fn status(&self) -> RingStatus {
        self.state.lock().status
    }

    pub fn set_status(&self, status: RingStatus) {
        self.state.lock().status = status;
    }

    /// Append `bytes`, wrapping at the capacity boundary. Blocks while the
    /// ring lacks space; a write that can never fit is an error.
    pub fn write(&self, bytes: &[u8]) -> Result<(), TransportError> {
        if bytes.len() > self.capacity {
            return Err(TransportError::RingOverflow {
                requested: bytes.len(),
                capacity: self.capacity,
            });
        }

        let mut state = self.state.lock();
        while (state.tail - state.head) as usize + bytes.len() > self.capacity {
            self.writable.wait(&mut state);
        }

        let mask = self.capacity - 1;
        for (i, byte) in bytes.iter().enumerate() {
            let idx = (state.tail as usize + i) & mask;
            state.buf[idx] = *byte;
        }
        state.tail += bytes.len() as u64;
        drop(state);

        self.readable.notify_one();
        Ok(())
    }

    /// Fill `out` from the ring, blocking until enough bytes arrive.
    pub fn read_exact(&self, out: &mut [u8]) {
        let mut state = self.state.lock();
        while ((state.tail - state.head) as usize) < out.len() {
            self.readable.wait(&mut state);
        }

        let mask = self.capacity - 1;
        for (i, slot) in out.iter_mut().enumerate() {
            let idx = (state.head as usize + i) & mask;
            *slot = state.buf[idx];
        }
        state.head += out.len() as u64;
        drop(state);

        self.writable.notify_one();
    }

    /// Total bytes ever written, for seqno accounting.
    pub fn tail(&self) -> u64 {
        self.state.lock().tail
    }

    /// Total bytes ever consumed.
    pub fn head(&self) -> u64 {
        self.state.lock().head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn write_then_read_preserves_bytes_across_the_wrap() {
        let ring = Ring::new(16);
        // park the head mid-buffer so the next write wraps
        ring.write(&[0; 10]).unwrap();
        let mut sink = [0u8; 10];
        ring.read_exact(&mut sink);

        let payload: Vec<u8> = (0..12).collect();
        ring.write(&payload).unwrap();
        assert_eq!(ring.used(), 12);

        let mut out = [0u8; 12];
        ring.read_exact(&mut out);
        assert_eq!(out.as_slice(), payload.as_slice());
        assert_eq!(ring.used(), 0);
    }

    #[test]
    fn oversized_write_errors_instead_of_deadlocking() {
        let ring = Ring::new(8);
        assert!(matches!(
            ring.write(&[0; 9]),
            Err(TransportError::RingOverflow {
                requested: 9,
                capacity: 8
            })
        ));
    }

    #[test]
    fn full_ring_blocks_the_producer_until_the_consumer_drains() {
        let ring = Arc::new(Ring::new(8));
        ring.write(&[1; 8]).unwrap();

        let producer = {
            let ring = ring.clone();
            std::thread::spawn(move || ring.write(&[2; 4]))
        };

        // unblock by draining
        let mut out = [0u8; 8];
        ring.read_exact(&mut out);
        producer.join().unwrap().unwrap();

        let mut tail = [0u8; 4];
        ring.read_exact(&mut tail);
        assert_eq!(tail, [2; 4]);
    }

    #[test]
    fn counters_track_lifetime_totals() {
        let ring = Ring::new(16);
        ring.write(&[0; 16]).unwrap();
        let mut out = [0u8; 16];
        ring.read_exact(&mut out);
        ring.write(&[0; 4]).unwrap();

        assert_eq!(ring.tail(), 20);
        assert_eq!(ring.head(), 16);
    }
}
