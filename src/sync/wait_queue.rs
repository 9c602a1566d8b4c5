use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

/// Blocking FIFO queue with a single consumer.
///
/// `push` signals one waiter; only one thread may ever call the `wait_pop`
/// variants.
pub struct WaitQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> WaitQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    pub fn push(&self, item: T) {
        let mut items = self.items.lock();
        items.push_back(item);
        self.available.notify_one();
    }

    /// Blocks until an item is available and returns it.
    pub fn wait_pop(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            self.available.wait(&mut items);
        }
    }

    /// Like [`wait_pop`](Self::wait_pop) but gives up after `timeout`.
    pub fn wait_pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }
            if self.available.wait_until(&mut items, deadline).timed_out() {
                return items.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for WaitQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn wait_pop_returns_queued_items_in_order() {
        let q = WaitQueue::new();
        q.push("a");
        q.push("b");
        assert_eq!(q.wait_pop(), "a");
        assert_eq!(q.wait_pop(), "b");
        assert!(q.is_empty());
    }

    #[test]
    fn wait_pop_blocks_until_push() {
        let q = Arc::new(WaitQueue::new());
        let consumer = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.wait_pop())
        };

        thread::sleep(Duration::from_millis(20));
        q.push(42u32);
        assert_eq!(consumer.join().unwrap(), 42);
    }

    #[test]
    fn timed_wait_reports_timeout() {
        let q: WaitQueue<u32> = WaitQueue::new();
        let started = Instant::now();
        assert_eq!(q.wait_pop_timeout(Duration::from_millis(30)), None);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn timed_wait_wakes_on_push() {
        let q = Arc::new(WaitQueue::new());
        let producer = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                q.push(7u32);
            })
        };
        assert_eq!(q.wait_pop_timeout(Duration::from_secs(5)), Some(7));
        producer.join().unwrap();
    }

    #[test]
    fn many_producers_one_consumer() {
        let q = Arc::new(WaitQueue::new());
        let producers: Vec<_> = (0..4)
            .map(|_| {
                let q = Arc::clone(&q);
                thread::spawn(move || {
                    for i in 0..500u32 {
                        q.push(i);
                    }
                })
            })
            .collect();

        let mut total = 0;
        for _ in 0..2_000 {
            q.wait_pop();
            total += 1;
        }
        for handle in producers {
            handle.join().unwrap();
        }
        assert_eq!(total, 2_000);
        assert!(q.is_empty());
    }
}
