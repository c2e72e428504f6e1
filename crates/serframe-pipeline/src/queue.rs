use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// FIFO shared between the reader and processor threads.
///
/// Every operation holds the internal lock only for the queue mutation
/// itself. [`pop_blocking`](Self::pop_blocking) and
/// [`pop_timeout`](Self::pop_timeout) park on a condition variable and are
/// woken by [`push`](Self::push); they never spin.
///
/// The queue is unbounded: a processor that falls behind lets it grow.
#[derive(Debug)]
pub struct MessageQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> MessageQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Append an item and wake one blocked consumer.
    pub fn push(&self, item: T) {
        self.lock().push_back(item);
        self.available.notify_one();
    }

    /// Remove the head item, or return `None` immediately when empty.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Remove the head item, parking the caller until one is available.
    pub fn pop_blocking(&self) -> T {
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            items = self
                .available
                .wait(items)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Remove the head item, parking the caller for at most `timeout`.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            items = self
                .available
                .wait_timeout(items, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Number of queued items at the time of the call.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue was empty at the time of the call.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic elsewhere must not block the shutdown drain.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn fifo_order_single_thread() {
        let queue = MessageQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
        assert_eq!(queue.try_pop(), Some(3));
        assert_eq!(queue.try_pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_timeout_returns_none_when_empty() {
        let queue: MessageQueue<u32> = MessageQueue::new();
        let started = Instant::now();
        assert_eq!(queue.pop_timeout(Duration::from_millis(20)), None);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn pop_blocking_wakes_on_push() {
        let queue = Arc::new(MessageQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_blocking())
        };

        thread::sleep(Duration::from_millis(20));
        queue.push("hello");

        assert_eq!(consumer.join().unwrap(), "hello");
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_timeout_wakes_before_deadline() {
        let queue = Arc::new(MessageQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let started = Instant::now();
                let item = queue.pop_timeout(Duration::from_secs(10));
                (item, started.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(20));
        queue.push(42u32);

        let (item, waited) = consumer.join().unwrap();
        assert_eq!(item, Some(42));
        assert!(waited < Duration::from_secs(10));
    }

    #[test]
    fn concurrent_push_pop_preserves_order() {
        const COUNT: u32 = 10_000;
        let queue = Arc::new(MessageQueue::new());

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..COUNT {
                    queue.push(i);
                }
            })
        };

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut received = Vec::with_capacity(COUNT as usize);
                while received.len() < COUNT as usize {
                    match queue.try_pop() {
                        Some(item) => received.push(item),
                        None => thread::yield_now(),
                    }
                }
                received
            })
        };

        producer.join().unwrap();
        let received = consumer.join().unwrap();

        assert_eq!(received, (0..COUNT).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn many_producers_lose_nothing() {
        const PRODUCERS: u32 = 4;
        const PER_PRODUCER: u32 = 1_000;
        let queue = Arc::new(MessageQueue::new());

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.push((p, i));
                    }
                })
            })
            .collect();

        let mut received = Vec::new();
        while received.len() < (PRODUCERS * PER_PRODUCER) as usize {
            received.push(queue.pop_blocking());
        }
        for producer in producers {
            producer.join().unwrap();
        }

        for p in 0..PRODUCERS {
            let from_p: Vec<u32> = received
                .iter()
                .filter(|(src, _)| *src == p)
                .map(|(_, i)| *i)
                .collect();
            assert_eq!(from_p, (0..PER_PRODUCER).collect::<Vec<_>>());
        }
    }

    #[test]
    fn survives_poisoned_lock() {
        let queue = Arc::new(MessageQueue::new());
        queue.push(7u8);

        let poisoner = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let _guard = queue.items.lock().unwrap();
                panic!("poison the queue lock");
            })
        };
        assert!(poisoner.join().is_err());

        assert_eq!(queue.try_pop(), Some(7));
    }
}
