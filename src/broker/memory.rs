//! In-memory broker — scripted fetches for tests and offline runs.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use super::error::{BrokerResult, PollError};
use super::{BrokerClient, Fetches, Record, TopicMetadata};

#[derive(Debug, Default)]
struct Inner {
    queue: VecDeque<Fetches>,
    subscribed: Vec<String>,
    closed: bool,
    close_when_drained: bool,
}

/// A broker that hands out whatever was queued with `push_*`.
#[derive(Debug, Default)]
pub struct MemoryBroker {
    topics: Vec<TopicMetadata>,
    inner: Mutex<Inner>,
    ready: Condvar,
}

impl MemoryBroker {
    pub fn new(topics: Vec<TopicMetadata>) -> Self {
        Self {
            topics,
            ..Default::default()
        }
    }

    /// Queue a batch of records.
    pub fn push_records(&self, records: Vec<Record>) {
        self.push(Fetches {
            records,
            ..Default::default()
        });
    }

    /// Queue a batch carrying only a recoverable fetch error.
    pub fn push_fetch_error(&self, error: impl Into<String>) {
        self.push(Fetches {
            errors: vec![error.into()],
            ..Default::default()
        });
    }

    /// Queue records cut short by a fatal client error.
    pub fn push_fatal(&self, records: Vec<Record>, error: impl Into<String>) {
        self.push(Fetches {
            records,
            fatal: Some(error.into()),
            ..Default::default()
        });
    }

    /// Close automatically once every queued batch has been polled.
    pub fn close_after_drain(&self) {
        self.lock().close_when_drained = true;
        self.ready.notify_all();
    }

    /// Topics passed to the last `subscribe`.
    pub fn subscribed(&self) -> Vec<String> {
        self.lock().subscribed.clone()
    }

    /// Batches not yet polled.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    fn push(&self, fetches: Fetches) {
        self.lock().queue.push_back(fetches);
        self.ready.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BrokerClient for MemoryBroker {
    fn fetch_topics(&self) -> BrokerResult<Vec<TopicMetadata>> {
        Ok(self.topics.clone())
    }

    fn subscribe(&self, topics: &[String]) -> BrokerResult<()> {
        self.lock().subscribed = topics.to_vec();
        Ok(())
    }

    fn poll_batch(&self, timeout: Duration) -> Result<Fetches, PollError> {
        let guard = self.lock();
        let (mut inner, _) = self
            .ready
            .wait_timeout_while(guard, timeout, |i| {
                !i.closed && !i.close_when_drained && i.queue.is_empty()
            })
            .unwrap_or_else(|e| e.into_inner());

        if inner.queue.is_empty() && inner.close_when_drained {
            inner.closed = true;
        }
        if inner.closed {
            return Err(PollError::Closed);
        }
        Ok(inner.queue.pop_front().unwrap_or_default())
    }

    fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn record(offset: i64) -> Record {
        Record {
            topic: "orders".into(),
            partition: 0,
            offset,
            key: None,
            payload: vec![1, 2, 3],
        }
    }

    #[test]
    fn poll_returns_queued_batches_in_order() {
        let broker = MemoryBroker::new(vec![TopicMetadata::new("orders", 1)]);
        broker.push_records(vec![record(0)]);
        broker.push_fetch_error("leader not available");

        let first = broker.poll_batch(Duration::from_millis(10)).unwrap();
        assert_eq!(first.records, vec![record(0)]);
        let second = broker.poll_batch(Duration::from_millis(10)).unwrap();
        assert_eq!(second.errors, vec!["leader not available".to_string()]);
        let third = broker.poll_batch(Duration::from_millis(10)).unwrap();
        assert!(third.is_empty());
    }

    #[test]
    fn close_wakes_blocked_poll() {
        let broker = Arc::new(MemoryBroker::new(vec![]));
        let poller = Arc::clone(&broker);
        let handle = thread::spawn(move || poller.poll_batch(Duration::from_secs(30)));

        thread::sleep(Duration::from_millis(20));
        broker.close();
        assert_eq!(handle.join().unwrap(), Err(PollError::Closed));
        assert!(broker.is_closed());
    }

    #[test]
    fn close_after_drain_serves_queue_first() {
        let broker = MemoryBroker::new(vec![]);
        broker.push_records(vec![record(0)]);
        broker.close_after_drain();

        assert_eq!(broker.pending(), 1);
        assert!(broker.poll_batch(Duration::from_millis(10)).is_ok());
        assert_eq!(broker.poll_batch(Duration::from_millis(10)), Err(PollError::Closed));
    }

    #[test]
    fn subscribe_is_recorded() {
        let broker = MemoryBroker::new(vec![]);
        broker.subscribe(&["a".into(), "b".into()]).unwrap();
        assert_eq!(broker.subscribed(), vec!["a", "b"]);
    }
}
