#![allow(unsafe_code)]
//! Typed single-producer/single-consumer ring buffer with a two-phase,
//! decoupled read protocol.
//!
//! The buffer holds a fixed, power-of-two number of slots addressed by two
//! masked cursors: `write` (next slot the producer fills) and `read` (last
//! slot the consumer has released). One slot is permanently kept empty so
//! that full and empty are distinguishable from the two cursors alone.
//!
//! The consumer drains in two phases so that its bulk copy never competes
//! with the producer for exclusion:
//!
//! 1. [`RingBuffer::begin_read`] takes the cursor lock for O(1) time and
//!    captures a checkpoint of both cursors into a [`ReadBatch`].
//! 2. [`ReadBatch::peek`] copies records out lock-free; the producer can
//!    keep pushing into the slots beyond the checkpoint the whole time.
//! 3. [`ReadBatch::commit`] retakes the lock for O(1) time and releases the
//!    consumed slots back to the producer.
//!
//! # Thread Safety
//!
//! - **Pushes**: cursor update and slot store happen under the cursor lock,
//!   held for O(1) time. The producer never blocks on the consumer; a full
//!   buffer is reported as [`Full`] and the caller decides what to drop.
//! - **Reads**: slot loads in the unlocked phase are safe because the
//!   producer can only fill slots at `write`, which never re-enters the
//!   captured `[read_cpy, write_cpy)` window before `commit` has moved
//!   `read` past it.
//! - Strict single producer / single consumer; neither side's cursor is ever
//!   mutated by the other.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;

use parking_lot::Mutex;
use thiserror::Error;

/// Push failed because the buffer already holds `capacity - 1` records.
///
/// The buffer state is unchanged; the rejected record is the caller's to
/// drop or retry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("ring buffer full")]
pub struct Full;

/// The two cursors shared between producer and consumer. Always masked into
/// `[0, capacity)`.
struct Cursors {
    read: usize,
    write: usize,
}

/// Fixed-capacity SPSC ring buffer of `Copy` records.
pub struct RingBuffer<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    cursors: Mutex<Cursors>,
}

// SAFETY: slot contents are only written by the producer while holding the
// cursor lock, and only read by the consumer through a `ReadBatch` whose
// window the producer cannot touch until commit. With `T: Send` the buffer
// can therefore be shared and moved across threads.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T: Copy> RingBuffer<T> {
    /// Create a buffer with `capacity` slots, of which `capacity - 1` are
    /// usable.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not a power of two of at least 2. Callers
    /// constructing from external input should validate first (the
    /// configuration layer does).
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two() && capacity >= 2,
            "ring capacity must be a power of two >= 2"
        );
        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            mask: capacity - 1,
            cursors: Mutex::new(Cursors { read: 0, write: 0 }),
        }
    }

    /// Total slot count, including the one slot kept empty.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Producer-only: append one record.
    ///
    /// Returns [`Full`] without mutating anything when no free slot remains.
    /// The slot store and the `write` publication happen under the same lock
    /// the consumer uses to capture its checkpoint, so a checkpoint always
    /// observes a fully stored record or none of it.
    pub fn push(&self, item: T) -> Result<(), Full> {
        let mut cur = self.cursors.lock();
        let next = (cur.write + 1) & self.mask;
        if next == cur.read {
            return Err(Full);
        }
        // SAFETY: `write` is outside every captured read window. A window
        // ends at the `write` value seen at begin_read, and `read` (hence
        // the full check above) prevents `write` from lapping back into a
        // window that has not been committed yet.
        unsafe {
            (*self.slots[cur.write].get()).write(item);
        }
        cur.write = next;
        Ok(())
    }

    /// Consumer-only: capture a checkpoint of both cursors, bounding the
    /// batch that may be drained lock-free afterwards.
    ///
    /// This is the only point where the consumer synchronizes with the
    /// producer. Records pushed after the checkpoint become visible to the
    /// next `begin_read`.
    pub fn begin_read(&self) -> ReadBatch<'_, T> {
        let cur = self.cursors.lock();
        ReadBatch {
            ring: self,
            read_cpy: cur.read,
            write_cpy: cur.write,
        }
    }

    /// Number of unconsumed records at this instant.
    pub fn len(&self) -> usize {
        let cur = self.cursors.lock();
        cur.write.wrapping_sub(cur.read) & self.mask
    }

    /// True when no unconsumed record exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> std::fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cur = self.cursors.lock();
        f.debug_struct("RingBuffer")
            .field("capacity", &self.slots.len())
            .field("read", &cur.read)
            .field("write", &cur.write)
            .finish()
    }
}

/// A bounded read session: the cursor checkpoint captured by
/// [`RingBuffer::begin_read`].
///
/// Dropping the batch without [`commit`](ReadBatch::commit) releases
/// nothing; the same records stay available for the next session.
pub struct ReadBatch<'a, T> {
    ring: &'a RingBuffer<T>,
    read_cpy: usize,
    write_cpy: usize,
}

impl<T: Copy> ReadBatch<'_, T> {
    /// Number of records this session may read.
    pub fn len(&self) -> usize {
        self.write_cpy.wrapping_sub(self.read_cpy) & self.ring.mask
    }

    /// True when the checkpoint captured an empty buffer.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out the record at offset `i` within the session, lock-free.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn peek(&self, i: usize) -> T {
        assert!(i < self.len(), "peek past end of read batch");
        let idx = (self.read_cpy + i) & self.ring.mask;
        // SAFETY: every slot below `write_cpy` was fully stored under the
        // cursor lock before `write` was published, and the producer cannot
        // reuse slots in `[read_cpy, write_cpy)` until `read` is advanced at
        // commit time. `T: Copy`, so reading the value does not invalidate
        // the slot.
        unsafe { (*self.ring.slots[idx].get()).assume_init_read() }
    }

    /// Release the first `consumed` records of the session back to the
    /// producer. Values larger than the session length are clamped.
    pub fn commit(self, consumed: usize) {
        let consumed = consumed.min(self.len());
        let mut cur = self.ring.cursors.lock();
        cur.read = (self.read_cpy + consumed) & self.ring.mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let ring = RingBuffer::with_capacity(16);
        for v in 0..10u64 {
            ring.push(v).unwrap();
        }
        let batch = ring.begin_read();
        assert_eq!(batch.len(), 10);
        for i in 0..10 {
            assert_eq!(batch.peek(i), i as u64);
        }
        batch.commit(10);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_full_rejects_without_mutation() {
        let ring = RingBuffer::with_capacity(8);
        for v in 0..7u64 {
            ring.push(v).unwrap();
        }
        assert_eq!(ring.len(), 7);
        assert_eq!(ring.push(99), Err(Full));
        assert_eq!(ring.len(), 7);

        // Oldest records survive the rejected push.
        let batch = ring.begin_read();
        assert_eq!(batch.peek(0), 0);
        assert_eq!(batch.peek(6), 6);
    }

    #[test]
    fn test_partial_commit_releases_only_consumed() {
        let ring = RingBuffer::with_capacity(8);
        for v in 1..=5u64 {
            ring.push(v).unwrap();
        }
        let batch = ring.begin_read();
        assert_eq!(batch.len(), 5);
        batch.commit(3);
        assert_eq!(ring.len(), 2);

        let batch = ring.begin_read();
        assert_eq!(batch.peek(0), 4);
        assert_eq!(batch.peek(1), 5);
        batch.commit(2);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_uncommitted_batch_releases_nothing() {
        let ring = RingBuffer::with_capacity(8);
        ring.push(1u64).unwrap();
        {
            let batch = ring.begin_read();
            assert_eq!(batch.len(), 1);
            // Dropped without commit.
        }
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_checkpoint_bounds_concurrent_pushes() {
        let ring = RingBuffer::with_capacity(8);
        ring.push(1u64).unwrap();
        ring.push(2u64).unwrap();

        let batch = ring.begin_read();
        // Pushes after the checkpoint do not grow this session.
        ring.push(3u64).unwrap();
        assert_eq!(batch.len(), 2);
        batch.commit(2);

        let batch = ring.begin_read();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.peek(0), 3);
        batch.commit(1);
    }

    #[test]
    fn test_fifo_across_wraparound() {
        let ring = RingBuffer::with_capacity(4);
        let mut expected = 0u64;
        for round in 0..20u64 {
            // Push up to 3 (capacity - 1), drain everything, repeat.
            let n = (round % 3) + 1;
            for v in 0..n {
                ring.push(round * 10 + v).unwrap();
            }
            let batch = ring.begin_read();
            assert_eq!(batch.len() as u64, n);
            for i in 0..n as usize {
                assert_eq!(batch.peek(i), round * 10 + i as u64);
            }
            batch.commit(n as usize);
            expected += n;
        }
        assert!(expected > 0);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_concurrent_producer_consumer_preserves_sequence() {
        const TOTAL: u64 = 50_000;
        let ring = Arc::new(RingBuffer::with_capacity(64));

        let producer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut v = 0u64;
                while v < TOTAL {
                    match ring.push(v) {
                        Ok(()) => v += 1,
                        Err(Full) => thread::yield_now(),
                    }
                }
            })
        };

        let mut seen = 0u64;
        while seen < TOTAL {
            let batch = ring.begin_read();
            let n = batch.len();
            for i in 0..n {
                assert_eq!(batch.peek(i), seen + i as u64);
            }
            batch.commit(n);
            seen += n as u64;
            if n == 0 {
                thread::yield_now();
            }
        }

        producer.join().unwrap();
        assert!(ring.is_empty());
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_non_power_of_two_capacity_panics() {
        let _ = RingBuffer::<u64>::with_capacity(100);
    }
}
