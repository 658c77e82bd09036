//! Ingestion worker — drains the broker into the ephemeral store.
//!
//! Runs on a blocking tokio worker for the whole session. Fetch errors and
//! records for unregistered topics are logged and skipped; only a closed or
//! fatally failed client ends the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Span};

use crate::broker::{BrokerClient, PollError, Record};
use crate::store::{EphemeralStore, Message, MessageStore};

/// Counters reported when the worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub batches: u64,
    pub records: u64,
    /// Records for topics the store does not know about.
    pub dropped: u64,
    pub errors: u64,
}

/// Why the worker stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Closed,
    Fatal(String),
}

impl From<Record> for Message {
    fn from(r: Record) -> Self {
        Self {
            partition: r.partition,
            offset: r.offset,
            key: r.key,
            payload: r.payload,
        }
    }
}

/// The background poll loop.
pub struct Ingestor {
    broker: Arc<dyn BrokerClient>,
    store: Arc<EphemeralStore>,
    poll_timeout: Duration,
    span: Span,
}

impl Ingestor {
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        store: Arc<EphemeralStore>,
        poll_timeout: Duration,
        span: Span,
    ) -> Self {
        Self {
            broker,
            store,
            poll_timeout,
            span,
        }
    }

    /// Poll until the client is closed or fails fatally.
    pub fn run(self) -> (IngestStats, StopReason) {
        let _entered = self.span.clone().entered();
        let mut stats = IngestStats::default();
        info!("ingestion started");

        let reason = loop {
            let fetches = match self.broker.poll_batch(self.poll_timeout) {
                Ok(f) => f,
                Err(PollError::Closed) => break StopReason::Closed,
            };

            for error in &fetches.errors {
                stats.errors += 1;
                warn!(%error, "fetch error, continuing");
            }

            if !fetches.records.is_empty() {
                stats.batches += 1;
            }
            for record in fetches.records {
                let topic = record.topic.clone();
                match self.store.insert(&topic, Message::from(record)) {
                    Ok(()) => stats.records += 1,
                    Err(e) => {
                        stats.dropped += 1;
                        debug!(error = %e, "record dropped");
                    }
                }
            }

            if let Some(e) = fetches.fatal {
                break StopReason::Fatal(e);
            }
        };

        match &reason {
            StopReason::Closed => info!(?stats, "ingestion stopped: client closed"),
            StopReason::Fatal(e) => error!(?stats, error = %e, "ingestion stopped: fatal broker error"),
        }
        (stats, reason)
    }

    /// Run on a blocking worker thread.
    pub fn spawn(self) -> JoinHandle<(IngestStats, StopReason)> {
        tokio::task::spawn_blocking(move || self.run())
    }
}
