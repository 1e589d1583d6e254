use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// Bounded FIFO of the most recent items.
///
/// Pushing into a full buffer evicts the oldest item, so the buffer always
/// holds exactly the last `capacity` pushes (or fewer, before it fills).
/// Iteration order is insertion order.
///
/// Not synchronized; share it across threads through [`SharedRingBuffer`].
#[derive(Debug)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
    total_pushed: u64,
}

/// Point-in-time copy of a ring buffer's contents.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferSnapshot<T> {
    /// Items in temporal order, oldest first.
    pub items: Vec<T>,
    /// Push counter at the moment of the snapshot; pass to
    /// [`RingBuffer::discard_through`] to drop exactly these items.
    pub end: u64,
}

impl<T> BufferSnapshot<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            total_pushed: 0,
        }
    }

    /// Chunks needed to hold `retention_seconds` of audio:
    /// `ceil(retention_seconds * sample_rate / chunk_size)`, at least 1.
    pub fn capacity_for(retention_seconds: f64, sample_rate: u32, chunk_size: usize) -> usize {
        if chunk_size == 0 || retention_seconds <= 0.0 {
            return 1;
        }
        let chunks = (retention_seconds * sample_rate as f64 / chunk_size as f64).ceil();
        (chunks as usize).max(1)
    }

    /// Append an item, evicting the oldest one when full.
    ///
    /// Returns the evicted item, if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        self.total_pushed += 1;
        evicted
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Remove the items that were present in a snapshot taken at `end`.
    ///
    /// Items pushed after that snapshot are kept. Returns how many were removed.
    pub fn discard_through(&mut self, end: u64) -> usize {
        let oldest_index = self.total_pushed - self.items.len() as u64;
        let to_remove = end.saturating_sub(oldest_index).min(self.items.len() as u64) as usize;
        self.items.drain(..to_remove);
        to_remove
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of pushes since construction (not reset by `clear`).
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copy the current contents in temporal order.
    pub fn snapshot(&self) -> BufferSnapshot<T> {
        BufferSnapshot {
            items: self.items.iter().cloned().collect(),
            end: self.total_pushed,
        }
    }
}

/// A [`RingBuffer`] behind one `parking_lot::Mutex`, shared between a capture
/// thread and the session.
///
/// Each operation takes the lock only for the push or the copy itself.
#[derive(Debug)]
pub struct SharedRingBuffer<T> {
    inner: Arc<Mutex<RingBuffer<T>>>,
}

impl<T> Clone for SharedRingBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedRingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RingBuffer::new(capacity))),
        }
    }

    pub fn push(&self, item: T) -> Option<T> {
        self.inner.lock().push(item)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn discard_through(&self, end: u64) -> usize {
        self.inner.lock().discard_through(end)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn total_pushed(&self) -> u64 {
        self.inner.lock().total_pushed()
    }

    /// Hold this buffer's lock until the guard drops.
    #[cfg(test)]
    pub(crate) fn hold(&self) -> parking_lot::MutexGuard<'_, RingBuffer<T>> {
        self.inner.lock()
    }
}

impl<T: Clone> SharedRingBuffer<T> {
    pub fn snapshot(&self) -> BufferSnapshot<T> {
        self.inner.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn push_and_snapshot_in_order() {
        let mut buf = RingBuffer::new(10);
        buf.push(1);
        buf.push(2);
        buf.push(3);

        let snap = buf.snapshot();
        assert_eq!(snap.items, vec![1, 2, 3]);
        assert_eq!(snap.end, 3);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut buf = RingBuffer::new(4);
        for i in 1..=4 {
            assert_eq!(buf.push(i), None);
        }
        assert_eq!(buf.push(5), Some(1));
        assert_eq!(buf.push(6), Some(2));

        assert_eq!(buf.len(), 4);
        assert_eq!(buf.snapshot().items, vec![3, 4, 5, 6]);
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut buf = RingBuffer::new(7);
        for i in 0..100u32 {
            buf.push(i);
            assert!(buf.len() <= buf.capacity());

            let expected: Vec<u32> = (i.saturating_sub(6)..=i).collect();
            assert_eq!(buf.snapshot().items, expected);
        }
    }

    #[test]
    fn clear_does_not_affect_prior_snapshot() {
        let mut buf = RingBuffer::new(4);
        buf.push("a".to_string());
        buf.push("b".to_string());

        let snap = buf.snapshot();
        buf.clear();
        buf.push("c".to_string());

        assert_eq!(snap.items, vec!["a", "b"]);
        assert_eq!(buf.snapshot().items, vec!["c"]);
    }

    #[test]
    fn discard_through_keeps_later_pushes() {
        let mut buf = RingBuffer::new(10);
        buf.push(1);
        buf.push(2);
        let snap = buf.snapshot();

        buf.push(3);
        buf.push(4);

        assert_eq!(buf.discard_through(snap.end), 2);
        assert_eq!(buf.snapshot().items, vec![3, 4]);
    }

    #[test]
    fn discard_through_after_eviction() {
        let mut buf = RingBuffer::new(3);
        buf.push(1);
        buf.push(2);
        buf.push(3);
        let snap = buf.snapshot(); // [1, 2, 3], end = 3

        buf.push(4); // evicts 1
        buf.push(5); // evicts 2

        // Only 3 is still held from the snapshot.
        assert_eq!(buf.discard_through(snap.end), 1);
        assert_eq!(buf.snapshot().items, vec![4, 5]);
    }

    #[test]
    fn discard_through_after_clear_is_noop() {
        let mut buf = RingBuffer::new(3);
        buf.push(1);
        let snap = buf.snapshot();
        buf.clear();
        buf.push(2);

        assert_eq!(buf.discard_through(snap.end), 0);
        assert_eq!(buf.snapshot().items, vec![2]);
    }

    #[test]
    fn capacity_formula_rounds_up() {
        assert_eq!(RingBuffer::<()>::capacity_for(60.0, 44100, 512), 5168);
        assert_eq!(RingBuffer::<()>::capacity_for(1.0, 1000, 100), 10);
        assert_eq!(RingBuffer::<()>::capacity_for(1.0, 1000, 300), 4);
        assert_eq!(RingBuffer::<()>::capacity_for(0.0, 1000, 300), 1);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut buf = RingBuffer::new(0);
        buf.push(1);
        buf.push(2);
        assert_eq!(buf.snapshot().items, vec![2]);
    }

    #[test]
    fn concurrent_snapshot_sees_a_prefix_in_order() {
        let shared = SharedRingBuffer::new(10_000);
        let writer = shared.clone();

        let handle = thread::spawn(move || {
            for i in 0..5_000u64 {
                writer.push(i);
            }
        });

        for _ in 0..50 {
            let snap = shared.snapshot();
            // Everything pushed before the snapshot, nothing after.
            assert_eq!(snap.items.len() as u64, snap.end);
            assert!(snap.items.iter().enumerate().all(|(i, v)| *v == i as u64));
        }

        handle.join().unwrap();
        assert_eq!(shared.len(), 5_000);
        assert_eq!(shared.total_pushed(), 5_000);
    }
}
