//! librdkafka-backed broker client.
//!
//! Consumes as a throwaway group (`harness-<uuid>`) with auto-commit and
//! offset storage disabled, so no real consumer group is ever touched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rdkafka::config::{ClientConfig, RDKafkaLogLevel};
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message as _;
use rdkafka::types::RDKafkaErrorCode;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{BrokerError, BrokerResult, PollError};
use super::{BrokerClient, Fetches, Record, TopicMetadata};

/// Connection settings for `KafkaBroker`.
#[derive(Debug, Clone)]
pub struct KafkaSettings {
    pub brokers: Vec<String>,
    pub metadata_timeout: Duration,
    /// Upper bound on records returned by one `poll_batch`.
    pub max_batch: usize,
}

/// Kafka consumer that never commits.
pub struct KafkaBroker {
    consumer: BaseConsumer,
    settings: KafkaSettings,
    closed: AtomicBool,
}

impl KafkaBroker {
    /// Create the consumer. No network traffic happens until metadata is fetched.
    pub fn connect(settings: KafkaSettings) -> BrokerResult<Self> {
        let brokers = settings.brokers.join(",");
        let group_id = format!("harness-{}", Uuid::new_v4());

        let consumer: BaseConsumer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("group.id", &group_id)
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "earliest")
            .set("enable.partition.eof", "false")
            .set_log_level(RDKafkaLogLevel::Error)
            .create()
            .map_err(|e| BrokerError::Connect {
                brokers: brokers.clone(),
                reason: e.to_string(),
            })?;

        info!(%brokers, %group_id, "kafka consumer created");

        Ok(Self {
            consumer,
            settings,
            closed: AtomicBool::new(false),
        })
    }
}

fn is_fatal(err: &KafkaError) -> bool {
    err.rdkafka_error_code() == Some(RDKafkaErrorCode::Fatal)
}

impl BrokerClient for KafkaBroker {
    fn fetch_topics(&self) -> BrokerResult<Vec<TopicMetadata>> {
        if self.is_closed() {
            return Err(BrokerError::Closed);
        }
        let metadata = self
            .consumer
            .fetch_metadata(None, self.settings.metadata_timeout)
            .map_err(|e| BrokerError::Metadata(e.to_string()))?;

        Ok(metadata
            .topics()
            .iter()
            .filter(|t| t.error().is_none())
            .map(|t| TopicMetadata::new(t.name(), t.partitions().len()))
            .collect())
    }

    fn subscribe(&self, topics: &[String]) -> BrokerResult<()> {
        let names: Vec<&str> = topics.iter().map(String::as_str).collect();
        self.consumer
            .subscribe(&names)
            .map_err(|e| BrokerError::Subscribe {
                topics: topics.to_vec(),
                reason: e.to_string(),
            })
    }

    fn poll_batch(&self, timeout: Duration) -> Result<Fetches, PollError> {
        let mut fetches = Fetches::default();
        let mut wait = timeout;

        while fetches.records.len() < self.settings.max_batch {
            if self.is_closed() {
                return Err(PollError::Closed);
            }
            // Block for the first record only, then drain what is already buffered.
            let Some(result) = self.consumer.poll(wait) else {
                break;
            };
            wait = Duration::ZERO;

            match result {
                Ok(m) => fetches.records.push(Record {
                    topic: m.topic().to_string(),
                    partition: m.partition(),
                    offset: m.offset(),
                    key: m.key().map(<[u8]>::to_vec),
                    payload: m.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                }),
                Err(e) if is_fatal(&e) => {
                    // Records already taken from the consumer still go out with this batch
                    fetches.fatal = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    fetches.errors.push(e.to_string());
                    break;
                }
            }
        }

        Ok(fetches)
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.consumer.unsubscribe();
        debug!("kafka consumer unsubscribed");
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
