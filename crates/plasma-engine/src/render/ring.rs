use bytemuck::Pod;

/// Growable element array split into one slot per frame in flight.
///
/// Slot `f` occupies `data[capacity * f .. capacity * (f + 1)]`; the host
/// writes the current slot while the GPU may still read the others.
#[derive(Debug, Clone)]
pub struct FrameRing<T: Pod> {
    data: Vec<T>,
    capacity: usize,
    count: usize,
    frame: usize,
    frames: usize,
    generation: u64,
}

impl<T: Pod> FrameRing<T> {
    pub fn new(capacity: usize, frames: usize) -> Self {
        let capacity = capacity.max(1);
        let frames = frames.max(1);
        Self {
            data: vec![T::zeroed(); capacity * frames],
            capacity,
            count: 0,
            frame: 0,
            frames,
            generation: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Elements written into the current slot.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn frame(&self) -> usize {
        self.frame
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Bumped on every reallocation.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn slot_base(&self) -> usize {
        self.capacity * self.frame
    }

    #[inline]
    pub fn write_offset(&self) -> usize {
        self.slot_base() + self.count
    }

    /// Makes room for `additional` more elements in the current slot.
    ///
    /// Growth doubles (or jumps straight to the required size) and copies
    /// every slot into the new layout.
    pub fn reserve(&mut self, additional: usize) {
        let required = self.count + additional;
        if required <= self.capacity {
            return;
        }

        let new_capacity = (self.capacity * 2).max(required);
        let mut data = vec![T::zeroed(); new_capacity * self.frames];
        for slot in 0..self.frames {
            let old = slot * self.capacity;
            let new = slot * new_capacity;
            data[new..new + self.capacity].copy_from_slice(&self.data[old..old + self.capacity]);
        }

        log::debug!(
            "frame ring grew {} -> {} elements per slot",
            self.capacity,
            new_capacity
        );
        self.data = data;
        self.capacity = new_capacity;
        self.generation += 1;
    }

    /// Appends to the current slot and returns the slot-relative index of the first element.
    pub fn push(&mut self, items: &[T]) -> usize {
        self.reserve(items.len());
        let first = self.count;
        let at = self.write_offset();
        self.data[at..at + items.len()].copy_from_slice(items);
        self.count += items.len();
        first
    }

    #[inline]
    pub fn push_one(&mut self, item: T) -> usize {
        self.push(std::slice::from_ref(&item))
    }

    /// Rotates to the next slot and resets the logical count.
    pub fn advance_frame(&mut self) {
        self.frame = (self.frame + 1) % self.frames;
        self.count = 0;
    }

    /// Elements written so far in the current slot.
    #[inline]
    pub fn frame_slice(&self) -> &[T] {
        let base = self.slot_base();
        &self.data[base..base + self.count]
    }

    /// The whole backing store, every slot included.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}
