use crate::error::Error;
use ordered_float::NotNan;
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

struct Entry<T> {
    score: NotNan<f32>,
    // Earlier insertions compare greater, so equal scores dequeue first-in first-out.
    sequence: Reverse<u64>,
    item: T,
}

impl<T> Eq for Entry<T> {}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A binary max-heap ordered by `score_fn`.
///
/// Elements with equal scores come out in the order they went in.
pub struct MaxPriorityQueue<T, F> {
    heap: BinaryHeap<Entry<T>>,
    score_fn: F,
    next_sequence: u64,
}

impl<T, F> MaxPriorityQueue<T, F>
where
    F: Fn(&T) -> f32,
{
    pub fn new(score_fn: F) -> Self {
        Self::with_capacity(0, score_fn)
    }

    pub fn with_capacity(capacity: usize, score_fn: F) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            score_fn,
            next_sequence: 0,
        }
    }

    /// Insert `item`, failing if its score is NaN.
    pub fn enqueue(&mut self, item: T) -> Result<(), Error> {
        let score = (self.score_fn)(&item);
        let score = NotNan::new(score).map_err(|e| Error::ConstructNotNan(e, score))?;
        self.heap.push(Entry {
            score,
            sequence: Reverse(self.next_sequence),
            item,
        });
        self.next_sequence += 1;
        Ok(())
    }

    pub fn dequeue(&mut self) -> Option<T> {
        self.heap.pop().map(|entry| entry.item)
    }

    pub fn peek(&self) -> Option<&T> {
        self.heap.peek().map(|entry| &entry.item)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
