use std::collections::VecDeque;

use parking_lot::Mutex;

/// Non-blocking FIFO queue.
///
/// Any thread may push. The consumer is expected to call [`try_pop`] in a
/// loop until it returns `None`.
///
/// [`try_pop`]: Queue::try_pop
pub struct Queue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, item: T) {
        self.items.lock().push_back(item);
    }

    /// Pops the oldest item, or `None` when the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}
