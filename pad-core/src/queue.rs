//! Outbound message queue for livepad.
//!
//! This module provides a queue for outgoing messages with:
//! - FIFO ordering for delivery
//! - A capacity bound to prevent unbounded memory growth while offline
//!
//! The queue is used by livepad-client: local activity enqueues messages at
//! any time, and a fixed-interval drain sends them while the transport is
//! open. A message leaves the queue only after it has been sent, so a failed
//! send keeps it at the head for the next drain.
//!
//! When full, the queue drops its *oldest* message to make room.

use std::collections::VecDeque;

/// Default maximum number of queued messages.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Bounded FIFO of pending outbound messages.
#[derive(Debug)]
pub struct OutboundQueue<T> {
    /// Maximum number of queued messages.
    capacity: usize,
    /// Messages waiting to be sent.
    queue: VecDeque<T>,
    /// Messages dropped because the queue was full.
    dropped: u64,
}

impl<T> OutboundQueue<T> {
    /// Create a new queue with the given capacity (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            queue: VecDeque::new(),
            dropped: 0,
        }
    }

    /// Add a message to the tail.
    ///
    /// Returns the evicted head when the queue was already full.
    pub fn enqueue(&mut self, msg: T) -> Option<T> {
        let evicted = if self.queue.len() >= self.capacity {
            self.dropped += 1;
            self.queue.pop_front()
        } else {
            None
        };
        self.queue.push_back(msg);
        evicted
    }

    /// The next message to send, without removing it.
    pub fn front(&self) -> Option<&T> {
        self.queue.front()
    }

    /// Remove the head after it has been sent.
    pub fn pop_front(&mut self) -> Option<T> {
        self.queue.pop_front()
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Maximum number of queued messages.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of messages dropped on overflow.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Iterate over queued messages in send order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.queue.iter()
    }

    /// Discard all queued messages.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl<T> Default for OutboundQueue<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_keeps_fifo_order() {
        let mut queue = OutboundQueue::new(10);
        queue.enqueue("a");
        queue.enqueue("b");
        queue.enqueue("c");

        assert_eq!(queue.pop_front(), Some("a"));
        assert_eq!(queue.pop_front(), Some("b"));
        assert_eq!(queue.pop_front(), Some("c"));
        assert_eq!(queue.pop_front(), None);
    }

    #[test]
    fn front_does_not_remove() {
        let mut queue = OutboundQueue::new(10);
        queue.enqueue(1);

        assert_eq!(queue.front(), Some(&1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut queue = OutboundQueue::new(2);

        assert_eq!(queue.enqueue(1), None);
        assert_eq!(queue.enqueue(2), None);
        assert_eq!(queue.enqueue(3), Some(1));

        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(queue.dropped_count(), 1);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut queue = OutboundQueue::new(0);
        assert_eq!(queue.capacity(), 1);

        queue.enqueue("x");
        assert_eq!(queue.enqueue("y"), Some("x"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn clear_empties_queue() {
        let mut queue: OutboundQueue<u8> = OutboundQueue::default();
        queue.enqueue(1);
        queue.enqueue(2);
        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), DEFAULT_QUEUE_CAPACITY);
    }
}
