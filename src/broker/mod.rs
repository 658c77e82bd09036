//! Broker client seam — topic discovery and record polling.
//!
//! The ingestion worker and session only see the `BrokerClient` trait.
//! `KafkaBroker` talks to a real cluster through librdkafka; `MemoryBroker`
//! serves scripted batches from memory.

pub mod error;
pub mod kafka;
pub mod memory;

use std::time::Duration;

pub use error::{BrokerError, BrokerResult, PollError};
pub use kafka::KafkaBroker;
pub use memory::MemoryBroker;

/// Topic metadata as reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMetadata {
    pub name: String,
    pub partitions: usize,
}

impl TopicMetadata {
    pub fn new(name: impl Into<String>, partitions: usize) -> Self {
        Self {
            name: name.into(),
            partitions,
        }
    }
}

/// A record fetched from a topic partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

/// Result of one poll: records plus any per-partition errors met while
/// fetching them. `errors` are recoverable; `fatal` means the client is
/// unusable, but the records gathered before it are still valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fetches {
    pub records: Vec<Record>,
    pub errors: Vec<String>,
    pub fatal: Option<String>,
}

impl Fetches {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.errors.is_empty() && self.fatal.is_none()
    }
}

/// A consumer-only connection to a broker.
///
/// Implementations never commit offsets.
pub trait BrokerClient: Send + Sync {
    /// Every topic the broker knows about, internal ones included.
    fn fetch_topics(&self) -> BrokerResult<Vec<TopicMetadata>>;

    /// Start consuming the given topics from their earliest offsets.
    fn subscribe(&self, topics: &[String]) -> BrokerResult<()>;

    /// Block up to `timeout` for the next batch of records.
    ///
    /// Returns `PollError::Closed` once `close` has been called. A fatal
    /// client error ends the batch early and is reported in `Fetches::fatal`.
    fn poll_batch(&self, timeout: Duration) -> Result<Fetches, PollError>;

    /// Tear down the connection. Idempotent.
    fn close(&self);

    /// Whether `close` has been called.
    fn is_closed(&self) -> bool;
}

/// Drop the broker's own bookkeeping topics.
pub fn user_topics(topics: Vec<TopicMetadata>, internal: &[String]) -> Vec<TopicMetadata> {
    topics
        .into_iter()
        .filter(|t| !internal.iter().any(|name| name == &t.name))
        .collect()
}
