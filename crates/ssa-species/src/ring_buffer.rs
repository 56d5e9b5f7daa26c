//! `RingBuffer<T>` — a circular buffer that doubles when full.
//!
//! Indexing is relative to the logical front and O(1).  Growth copies the
//! logical contents to start at physical slot 0; capacity never shrinks, not
//! even on [`clear`](RingBuffer::clear).

use std::ops::{Index, IndexMut};

use thiserror::Error;

/// Returned by [`RingBuffer::pop_top`] on an empty buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("pop from an empty ring buffer")]
pub struct BufferUnderflow;

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    head:  usize,
    len:   usize,
}

impl<T: Default> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T: Default> RingBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, T::default);
        Self { slots, head: 0, len: 0 }
    }

    /// Append a slot at the tail and return it for the caller to fill.
    ///
    /// The slot is reset to `T::default()`.
    pub fn push_tail(&mut self) -> &mut T {
        if self.len == self.slots.len() {
            self.grow();
        }
        let pos = self.physical(self.len);
        self.len += 1;
        let slot = &mut self.slots[pos];
        *slot = T::default();
        slot
    }

    /// Remove and return the oldest element.
    pub fn pop_top(&mut self) -> Result<T, BufferUnderflow> {
        if self.len == 0 {
            return Err(BufferUnderflow);
        }
        let value = std::mem::take(&mut self.slots[self.head]);
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        Ok(value)
    }

    /// Oldest element, if any.
    pub fn front(&self) -> Option<&T> {
        (self.len > 0).then(|| &self.slots[self.head])
    }

    /// Drop every element; capacity is kept.
    pub fn clear(&mut self) {
        while self.pop_top().is_ok() {}
        self.head = 0;
    }

    /// Rotate the storage so the logical contents start at physical slot 0,
    /// and return them as one slice.
    pub fn make_contiguous(&mut self) -> &mut [T] {
        if self.head != 0 {
            self.slots.rotate_left(self.head);
            self.head = 0;
        }
        &mut self.slots[..self.len]
    }

    fn grow(&mut self) {
        let old_cap = self.slots.len();
        let new_cap = (old_cap * 2).max(1);
        let mut slots = Vec::with_capacity(new_cap);
        for i in 0..self.len {
            let pos = (self.head + i) % old_cap;
            slots.push(std::mem::take(&mut self.slots[pos]));
        }
        slots.resize_with(new_cap, T::default);
        self.slots = slots;
        self.head = 0;
    }
}

impl<T> RingBuffer<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        (index < self.len).then(|| &self.slots[self.physical(index)])
    }

    /// Iterate from the logical front to the tail.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).map(move |i| &self.slots[self.physical(i)])
    }

    #[inline]
    fn physical(&self, index: usize) -> usize {
        (self.head + index) % self.slots.len()
    }
}

impl<T> Index<usize> for RingBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        assert!(index < self.len, "ring buffer index {index} out of range (len {})", self.len);
        &self.slots[self.physical(index)]
    }
}

impl<T> IndexMut<usize> for RingBuffer<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        assert!(index < self.len, "ring buffer index {index} out of range (len {})", self.len);
        let pos = self.physical(index);
        &mut self.slots[pos]
    }
}
