// GPU-facing attribute storage with an explicit dirty flag.
// The grid mutates data and calls `mark_dirty()`; the presenter calls
// `take_dirty()` and re-uploads (redraws) only when something changed.
// Mutable access never sets the flag on its own — upload policy stays
// with whoever made the change.

pub struct AttributeBuffer<T> {
    data: Vec<T>,
    dirty: bool,
}

impl<T> AttributeBuffer<T> {
    /// Wrap freshly-populated data. Starts clean; callers that just filled it
    /// mark it dirty themselves (exactly once, after full population).
    pub fn new(data: Vec<T>) -> Self {
        Self { data, dirty: false }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read-and-clear, for the backend's upload pass.
    pub fn take_dirty(&mut self) -> bool {
        let was = self.dirty;
        self.dirty = false;
        was
    }
}
