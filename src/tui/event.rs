//! TUI messages and effects.
//!
//! The runner multiplexes keyboard input (forwarded from a reader thread
//! over an mpsc channel), the one-shot refresh deadline, interrupt signals
//! and a redraw tick. Each becomes a `TuiMessage` fed to `HarnessApp::update`,
//! which answers with `Effect`s for the runner to carry out.

use crossterm::event::KeyEvent;

/// Messages that drive the TUI update loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiMessage {
    /// Keyboard input.
    Input(KeyEvent),
    /// Refresh deadline fired: re-read topic metadata.
    Refresh,
    /// Outcome of a clipboard write (bytes written, or the error text).
    CopyFinished(Result<usize, String>),
    /// External interrupt.
    Quit,
}

/// Side effects requested by the app, executed by the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Arm the one-shot refresh timer.
    ArmRefresh,
    /// Write this payload to the OS clipboard.
    CopyToClipboard(Vec<u8>),
    /// Leave the TUI.
    Quit,
}
