//! The `Heapitem` priority queue used by the watershed and diffusion
//! flooder (spec §4.6).
//!
//! A local, owned [`MinHeap`] replaces the source's process-wide pointer to
//! a global queue (spec §9): its lifetime is exactly one filter invocation.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One entry in the priority queue.
///
/// `index` is the raveled voxel being settled; `source` is the raveled
/// voxel of the seed (watershed) or originating push (diffusion) that
/// produced this push.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Heapitem {
    /// Priority value (image intensity, optionally plus a compactness
    /// penalty).
    pub value: f64,
    /// Monotonically increasing push counter; older pushes win ties.
    pub age: i64,
    /// Raveled voxel this item would settle.
    pub index: usize,
    /// Raveled voxel of the seed/origin this item traces back to.
    pub source: usize,
}

impl Heapitem {
    /// Construct a new item.
    #[must_use]
    pub const fn new(value: f64, age: i64, index: usize, source: usize) -> Self {
        Self {
            value,
            age,
            index,
            source,
        }
    }

    /// Ordering key: `(age, value)`, both ascending — older items win ties,
    /// and among equal ages the smaller value wins (spec §3).
    fn key(&self) -> (i64, OrderedF64) {
        (self.age, OrderedF64(self.value))
    }
}

/// `f64` wrapper with a total order, for use as a heap ordering key.
///
/// Priority values here are always finite (image intensities, optionally
/// plus a non-negative compactness penalty); `NaN` never legitimately
/// appears, so falling back to `Equal` on an unexpected `NaN` is a safe,
/// panic-free degenerate case rather than silent corruption.
#[derive(Clone, Copy, Debug, PartialEq)]
struct OrderedF64(f64);

impl Eq for OrderedF64 {}

impl PartialOrd for OrderedF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

impl Eq for Heapitem {}

impl PartialOrd for Heapitem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Heapitem {
    fn cmp(&self, other: &Self) -> Ordering {
        // `BinaryHeap` is a max-heap; reverse so the smallest `(age, value)`
        // key pops first.
        other.key().cmp(&self.key())
    }
}

/// A local min-heap of [`Heapitem`]s, ordered `(age asc, value asc)`.
#[derive(Debug, Default)]
pub struct MinHeap {
    inner: BinaryHeap<Heapitem>,
}

impl MinHeap {
    /// Construct an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: BinaryHeap::new(),
        }
    }

    /// Push an item.
    pub fn push(&mut self, item: Heapitem) {
        self.inner.push(item);
    }

    /// Pop the minimum item, if any.
    pub fn pop(&mut self) -> Option<Heapitem> {
        self.inner.pop()
    }

    /// Current number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// `true` iff the heap holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Release the heap's backing storage. Equivalent to dropping it; named
    /// to make the spec §4.6 `done` contract visible at call sites.
    pub fn done(self) {
        drop(self);
    }
}
