//! Harness — a read-only terminal inspector for Kafka.
//!
//! A background worker consumes every user topic into an ephemeral
//! in-memory store; the TUI browses that store. Offsets are never
//! committed, so production consumer groups are left alone.

pub mod broker;
pub mod config;
pub mod error;
pub mod ingest;
pub mod session;
pub mod shutdown;
pub mod store;
pub mod tui;
