//! Tick-based deferred events

use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct Entry<E> {
    due: u64,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    // Reversed so the max-heap pops the earliest entry first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Events waiting for a tick. Events due on the same tick fire in schedule order.
pub struct DeferredQueue<E> {
    heap: BinaryHeap<Entry<E>>,
    next_seq: u64,
}

impl<E> DeferredQueue<E> {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Fire `event` once the clock reaches `due`
    pub fn schedule(&mut self, due: u64, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { due, seq, event });
    }

    /// Remove and return the next event due at or before `now`
    pub fn pop_due(&mut self, now: u64) -> Option<E> {
        if self.heap.peek()?.due > now {
            return None;
        }
        self.heap.pop().map(|e| e.event)
    }

    /// Remove every event due at or before `now`, in firing order
    pub fn drain_due(&mut self, now: u64) -> Vec<E> {
        let mut due = Vec::new();
        while let Some(event) = self.pop_due(now) {
            due.push(event);
        }
        due
    }

    /// Tick of the earliest pending event
    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|e| e.due)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every pending event
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl<E> Default for DeferredQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
