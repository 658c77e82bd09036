//! Session — startup discovery, ingestion lifecycle, shutdown.
//!
//! Opening a session lists broker metadata, drops internal topics,
//! subscribes to the rest and pre-registers them in a fresh store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument, Span};

use crate::broker::{user_topics, BrokerClient};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::ingest::{IngestStats, Ingestor, StopReason};
use crate::store::{EphemeralStore, Topic};

pub struct Session {
    broker: Arc<dyn BrokerClient>,
    store: Arc<EphemeralStore>,
    brokers: Vec<String>,
    poll_timeout: Duration,
    span: Span,
    worker: Option<JoinHandle<(IngestStats, StopReason)>>,
}

impl Session {
    /// Discover topics and subscribe. Fails when no user topics exist.
    pub fn open(
        broker: Arc<dyn BrokerClient>,
        config: &HarnessConfig,
        span: Span,
    ) -> HarnessResult<Self> {
        let _entered = span.clone().entered();

        let discovered = broker.fetch_topics()?;
        let topics = user_topics(discovered, &config.internal_topics);
        if topics.is_empty() {
            return Err(HarnessError::NoTopics(config.brokers.join(",")));
        }

        let names: Vec<String> = topics.iter().map(|t| t.name.clone()).collect();
        broker.subscribe(&names)?;
        info!(count = names.len(), "subscribed to topics");

        let store = EphemeralStore::new(
            topics
                .into_iter()
                .map(|t| Topic::new(t.name, t.partitions)),
        );

        Ok(Self {
            broker,
            store: Arc::new(store),
            brokers: config.brokers.clone(),
            poll_timeout: config.poll_timeout(),
            span,
            worker: None,
        })
    }

    /// Spawn the ingestion worker. Must be called inside a tokio runtime.
    pub fn start(&mut self) -> HarnessResult<()> {
        if self.worker.is_some() {
            return Err(HarnessError::AlreadyStarted);
        }
        let ingestor = Ingestor::new(
            Arc::clone(&self.broker),
            Arc::clone(&self.store),
            self.poll_timeout,
            self.span.clone(),
        );
        self.worker = Some(ingestor.spawn());
        Ok(())
    }

    pub fn store(&self) -> Arc<EphemeralStore> {
        Arc::clone(&self.store)
    }

    pub fn brokers(&self) -> &[String] {
        &self.brokers
    }

    /// Close the broker and wait up to `grace` for the worker to exit.
    ///
    /// Returns the worker's stats when it exited in time.
    pub async fn shutdown(mut self, grace: Duration) -> Option<IngestStats> {
        let span = self.span.clone();
        self.broker.close();

        let worker = self.worker.take()?;
        async move {
            match tokio::time::timeout(grace, worker).await {
                Ok(Ok((stats, _))) => {
                    info!(?stats, "session closed");
                    Some(stats)
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "ingestion worker panicked");
                    None
                }
                Err(_) => {
                    warn!(?grace, "ingestion worker did not stop in time, abandoning it");
                    None
                }
            }
        }
        .instrument(span)
        .await
    }
}
