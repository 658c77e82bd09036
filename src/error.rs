//! Session-level errors. Any of these before the TUI starts is fatal.

use thiserror::Error;

use crate::broker::BrokerError;
use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("no topics found on {0}")]
    NoTopics(String),

    #[error("ingestion already started")]
    AlreadyStarted,
}

pub type HarnessResult<T> = Result<T, HarnessError>;
