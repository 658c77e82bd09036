//! Terminal presentation layer (ratatui).
//!
//! Two screens: the topic list (refreshed on a timer) and a point-in-time
//! message list for one topic. Read-only: the TUI only takes snapshots from
//! the store and never talks to the broker.
//!
//! ## Architecture (TEA)
//!
//! Model (`HarnessApp`) + Update (`update` returning effects) + View
//! (`layout::draw`). The runner owns every side effect: terminal, timer,
//! clipboard.

pub mod app;
pub mod clipboard;
pub mod dashboard;
pub mod event;
pub mod input;
pub mod layout;
pub mod runner;
