//! TUI runner — main loop that wires everything together.
//!
//! Sets up the terminal, forwards key events from a reader thread, owns the
//! one-shot refresh deadline and executes the app's effects.

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::store::MessageStore;

use super::app::HarnessApp;
use super::clipboard::Clipboard;
use super::event::{Effect, TuiMessage};
use super::layout;

/// How often the screen is redrawn when nothing happens (alert expiry).
const IDLE_REDRAW: Duration = Duration::from_millis(250);

/// How long the reader thread waits for a key before checking for shutdown.
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Runner state that is not part of the app model.
struct Runner<'a> {
    store: Arc<dyn MessageStore>,
    clipboard: &'a mut dyn Clipboard,
    refresh_interval: Duration,
    refresh_at: Option<Instant>,
}

impl Runner<'_> {
    /// Feed one message to the app and execute the resulting effects.
    fn dispatch(&mut self, app: &mut HarnessApp, msg: TuiMessage) {
        let now = Instant::now();
        let effects = app.update(msg, self.store.as_ref(), now.into_std());
        self.execute(app, effects);
    }

    fn execute(&mut self, app: &mut HarnessApp, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ArmRefresh => {
                    self.refresh_at = Some(Instant::now() + self.refresh_interval);
                }
                Effect::CopyToClipboard(payload) => {
                    let text = String::from_utf8_lossy(&payload);
                    let result = match self.clipboard.set_text(&text) {
                        Ok(()) => Ok(payload.len()),
                        Err(e) => {
                            warn!(error = %e, "clipboard write failed");
                            Err(e.to_string())
                        }
                    };
                    self.dispatch(app, TuiMessage::CopyFinished(result));
                }
                Effect::Quit => {
                    debug!("quit requested");
                }
            }
        }
    }
}

/// Forward crossterm key events until the receiver goes away.
fn spawn_input_reader(tx: mpsc::UnboundedSender<TuiMessage>) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        if tx.is_closed() {
            return;
        }
        match event::poll(INPUT_POLL) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => {
                    if tx.send(TuiMessage::Input(key)).is_err() {
                        return;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "reading terminal input");
                    return;
                }
            },
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "polling terminal input");
                return;
            }
        }
    })
}

/// Wait for the refresh deadline, or forever when none is armed.
async fn refresh_due(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Drive the app until it asks to quit. Terminal-agnostic.
pub async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut HarnessApp,
    runner_store: Arc<dyn MessageStore>,
    clipboard: &mut dyn Clipboard,
    refresh_interval: Duration,
    mut input_rx: mpsc::UnboundedReceiver<TuiMessage>,
    mut interrupted: watch::Receiver<bool>,
) -> anyhow::Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let mut runner = Runner {
        store: runner_store,
        clipboard,
        refresh_interval,
        refresh_at: None,
    };
    let init = app.init();
    runner.execute(app, init);

    let mut redraw = interval(IDLE_REDRAW);
    redraw.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut interrupts_open = true;

    loop {
        terminal.draw(|f| layout::draw(f, app, std::time::Instant::now()))?;

        tokio::select! {
            _ = redraw.tick() => {}
            _ = refresh_due(runner.refresh_at) => {
                runner.refresh_at = None;
                runner.dispatch(app, TuiMessage::Refresh);
            }
            msg = input_rx.recv() => match msg {
                Some(msg) => runner.dispatch(app, msg),
                None => runner.dispatch(app, TuiMessage::Quit),
            },
            changed = interrupted.changed(), if interrupts_open => {
                match changed {
                    Ok(()) if *interrupted.borrow() => runner.dispatch(app, TuiMessage::Quit),
                    Ok(()) => {}
                    // Signal listener gone; keep running on keyboard input alone
                    Err(_) => interrupts_open = false,
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Run the TUI on the real terminal. Blocks until quit.
pub async fn run_tui(
    mut app: HarnessApp,
    store: Arc<dyn MessageStore>,
    clipboard: &mut dyn Clipboard,
    refresh_interval: Duration,
    interrupted: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let reader = spawn_input_reader(input_tx);

    let result = event_loop(
        &mut terminal,
        &mut app,
        store,
        clipboard,
        refresh_interval,
        input_rx,
        interrupted,
    )
    .await;

    // Restore terminal even when the loop failed
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if reader.join().is_err() {
        warn!("input reader thread panicked");
    }
    result
}
