//! Broker client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("creating consumer for {brokers}: {reason}")]
    Connect { brokers: String, reason: String },

    #[error("fetching metadata: {0}")]
    Metadata(String),

    #[error("subscribing to {topics:?}: {reason}")]
    Subscribe { topics: Vec<String>, reason: String },

    #[error("broker client closed")]
    Closed,
}

/// Why a poll returned no batch at all. Fetch failures, fatal ones
/// included, travel inside `Fetches` with the records they interrupted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("broker client closed")]
    Closed,
}

pub type BrokerResult<T> = Result<T, BrokerError>;
