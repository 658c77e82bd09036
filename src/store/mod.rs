//! Ephemeral store — every ingested message, held in memory only.
//!
//! Topics are registered once at startup and never removed. The ingestion
//! worker appends; the TUI takes snapshots. One `RwLock` guards the whole
//! map, so an insert (append + count bump) is observed as a single step.
//! Nothing here survives the process.

pub mod error;

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use error::{StoreError, StoreResult};

/// Initial capacity of each topic's message log.
const INITIAL_TOPIC_CAPACITY: usize = 128;

/// Metadata for a discovered topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    pub partitions: usize,
    pub message_count: usize,
}

impl Topic {
    /// A freshly discovered topic with no ingested messages.
    pub fn new(name: impl Into<String>, partitions: usize) -> Self {
        Self {
            name: name.into(),
            partitions,
            message_count: 0,
        }
    }
}

/// A single consumed record. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

/// Read/write access to ingested topics and messages.
///
/// Implementations must be safe to share between the ingestion worker and
/// the foreground loop.
pub trait MessageStore: Send + Sync {
    /// Snapshot of every registered topic, ordered by name.
    fn list_topics(&self) -> BTreeMap<String, Topic>;

    /// Append a message to a registered topic.
    fn insert(&self, topic: &str, message: Message) -> StoreResult<()>;

    /// Snapshot of a topic's messages in arrival order. Empty for unknown topics.
    fn list_messages(&self, topic: &str) -> Vec<Message>;

    /// First message (in arrival order) carrying `offset`, on any partition.
    fn get_message(&self, offset: i64, topic: &str) -> StoreResult<Message>;

    /// The message at exactly `partition`/`offset`.
    fn get_message_at(&self, topic: &str, partition: i32, offset: i64) -> StoreResult<Message>;
}

/// One topic's metadata, log and lookup index.
#[derive(Debug)]
struct TopicLog {
    metadata: Topic,
    messages: Vec<Message>,
    /// (partition, offset) → index into `messages`
    index: HashMap<(i32, i64), usize>,
}

impl TopicLog {
    fn new(metadata: Topic) -> Self {
        Self {
            metadata: Topic {
                message_count: 0,
                ..metadata
            },
            messages: Vec::with_capacity(INITIAL_TOPIC_CAPACITY),
            index: HashMap::new(),
        }
    }

    fn push(&mut self, message: Message) {
        let key = (message.partition, message.offset);
        let idx = self.messages.len();
        self.messages.push(message);
        // A redelivered (partition, offset) keeps pointing at its first copy.
        self.index.entry(key).or_insert(idx);
        self.metadata.message_count = self.messages.len();
    }
}

/// The in-memory store shared by ingestion and presentation.
#[derive(Debug, Default)]
pub struct EphemeralStore {
    topics: RwLock<HashMap<String, TopicLog>>,
}

impl EphemeralStore {
    /// Build a store with every topic pre-registered (message counts start at 0).
    pub fn new(topics: impl IntoIterator<Item = Topic>) -> Self {
        let topics = topics
            .into_iter()
            .map(|t| (t.name.clone(), TopicLog::new(t)))
            .collect();
        Self {
            topics: RwLock::new(topics),
        }
    }

    /// Metadata for a single topic.
    pub fn topic(&self, name: &str) -> Option<Topic> {
        self.read().get(name).map(|log| log.metadata.clone())
    }

    // Every critical section leaves the map consistent before it can panic,
    // so a poisoned lock still guards valid data.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, TopicLog>> {
        self.topics.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, TopicLog>> {
        self.topics.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl MessageStore for EphemeralStore {
    fn list_topics(&self) -> BTreeMap<String, Topic> {
        self.read()
            .iter()
            .map(|(name, log)| (name.clone(), log.metadata.clone()))
            .collect()
    }

    fn insert(&self, topic: &str, message: Message) -> StoreResult<()> {
        let mut topics = self.write();
        let log = topics
            .get_mut(topic)
            .ok_or_else(|| StoreError::UnknownTopic(topic.to_string()))?;
        log.push(message);
        Ok(())
    }

    fn list_messages(&self, topic: &str) -> Vec<Message> {
        self.read()
            .get(topic)
            .map(|log| log.messages.clone())
            .unwrap_or_default()
    }

    fn get_message(&self, offset: i64, topic: &str) -> StoreResult<Message> {
        let topics = self.read();
        let log = topics
            .get(topic)
            .ok_or_else(|| StoreError::UnknownTopic(topic.to_string()))?;
        log.messages
            .iter()
            .find(|m| m.offset == offset)
            .cloned()
            .ok_or_else(|| StoreError::MessageNotFound {
                topic: topic.to_string(),
                offset,
            })
    }

    fn get_message_at(&self, topic: &str, partition: i32, offset: i64) -> StoreResult<Message> {
        let topics = self.read();
        let log = topics
            .get(topic)
            .ok_or_else(|| StoreError::UnknownTopic(topic.to_string()))?;
        log.index
            .get(&(partition, offset))
            .and_then(|&idx| log.messages.get(idx))
            .cloned()
            .ok_or_else(|| StoreError::MessageNotFound {
                topic: topic.to_string(),
                offset,
            })
    }
}
