//! Interrupt handling — first signal asks for a graceful stop, a repeat
//! exits the process immediately.
//!
//! The terminal runs in raw mode, so an interactive ctrl+c arrives as a key
//! event. This covers SIGINT/SIGTERM sent from outside, and stays armed
//! while the session is closing the broker connection. The runtime itself is
//! torn down with a deadline, so a worker stuck in a broker call never holds
//! the process open.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Exit code used when a repeated signal forces termination.
pub const FORCED_EXIT_CODE: i32 = 130;

/// What to do about a received signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Graceful,
    Force,
}

/// Counts shutdown requests.
#[derive(Debug, Default)]
pub struct SignalCounter {
    seen: AtomicUsize,
}

impl SignalCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one signal. The first is graceful, later ones force.
    pub fn record(&self) -> SignalAction {
        if self.seen.fetch_add(1, Ordering::SeqCst) == 0 {
            SignalAction::Graceful
        } else {
            SignalAction::Force
        }
    }

    /// Note a shutdown started some other way (quit key), so the next signal forces.
    pub fn begin_shutdown(&self) {
        let _ = self
            .seen
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst);
    }
}

/// Resolves on SIGINT or SIGTERM.
async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res,
            _ = term.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// React to one received signal: flip `interrupted` the first time, call
/// `exit` with `FORCED_EXIT_CODE` on any repeat.
pub fn on_signal(
    counter: &SignalCounter,
    interrupted: &watch::Sender<bool>,
    exit: &(dyn Fn(i32) + Send + Sync),
) -> SignalAction {
    let action = counter.record();
    match action {
        SignalAction::Graceful => {
            info!("interrupt received, shutting down");
            interrupted.send_replace(true);
        }
        SignalAction::Force => {
            warn!("second interrupt, exiting immediately");
            exit(FORCED_EXIT_CODE);
        }
    }
    action
}

/// Spawn the signal listener. The returned receiver flips to `true` on the
/// first signal; the second signal exits the process.
pub fn listen(counter: Arc<SignalCounter>) -> (watch::Receiver<bool>, JoinHandle<()>) {
    listen_with(counter, |code| std::process::exit(code))
}

/// `listen` with a caller-supplied exit hook.
pub fn listen_with<F>(counter: Arc<SignalCounter>, exit: F) -> (watch::Receiver<bool>, JoinHandle<()>)
where
    F: Fn(i32) + Send + Sync + 'static,
{
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        loop {
            if let Err(e) = wait_for_signal().await {
                warn!(error = %e, "signal handler unavailable");
                return;
            }
            on_signal(&counter, &tx, &exit);
        }
    });
    (rx, handle)
}

/// Drive `main` on `runtime`, then shut the runtime down.
///
/// Blocking work still running `teardown` after `main` returns, such as an
/// ingestion worker stuck in a broker call, is abandoned rather than joined.
pub fn run_then_teardown<F: Future>(runtime: Runtime, teardown: Duration, main: F) -> F::Output {
    let output = runtime.block_on(main);
    runtime.shutdown_timeout(teardown);
    output
}
