use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, info_span, Instrument};

use harness::broker::KafkaBroker;
use harness::config::HarnessConfig;
use harness::session::Session;
use harness::shutdown::{self, SignalCounter};
use harness::tui::app::HarnessApp;
use harness::tui::clipboard::SystemClipboard;
use harness::tui::runner::run_tui;

#[derive(Parser)]
#[command(name = "harness", about = "Browse Kafka topics and messages without committing offsets.")]
struct Cli {
    /// Broker address, comma separated for several (default localhost:9092)
    brokers: Option<String>,

    /// Config file (defaults to ~/.harness/config.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file (the terminal is taken by the TUI)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Topic list refresh interval in milliseconds
    #[arg(long)]
    refresh_ms: Option<u64>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("harness=info".parse()?),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// How long runtime teardown waits for blocking work (a worker stuck in a
/// broker call) once the session has given up on it.
const RUNTIME_TEARDOWN: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = HarnessConfig::load(cli.config.as_deref())?;
    if let Some(brokers) = cli.brokers.as_deref() {
        config = config.with_brokers_arg(brokers);
    }
    if let Some(path) = cli.log_file {
        config.log_file = Some(path);
    }
    if let Some(ms) = cli.refresh_ms {
        config.refresh_interval_ms = ms;
    }
    config.validate()?;

    init_logging(&config.log_path())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    shutdown::run_then_teardown(runtime, RUNTIME_TEARDOWN, run(config))
}

async fn run(config: HarnessConfig) -> Result<()> {
    let span = info_span!("harness", brokers = %config.brokers.join(","));
    info!(parent: &span, "harness starting");

    let broker = KafkaBroker::connect(config.kafka_settings())?;
    let mut session = Session::open(Arc::new(broker), &config, span.clone())?;
    session.start()?;

    // Listener stays up until runtime teardown, so a repeated signal can
    // still cut a stuck shutdown short
    let counter = Arc::new(SignalCounter::new());
    let (interrupted, _signals) = shutdown::listen(Arc::clone(&counter));

    let store = session.store();
    let app = HarnessApp::new(session.brokers().to_vec(), store.as_ref(), config.alert_ttl());
    let mut clipboard = SystemClipboard::new();

    let result = run_tui(app, store, &mut clipboard, config.refresh_interval(), interrupted)
        .instrument(span.clone())
        .await;

    // From here a further interrupt skips the graceful path
    counter.begin_shutdown();
    if let Err(e) = &result {
        error!(parent: &span, error = %e, "running TUI");
    }

    session.shutdown(config.shutdown_timeout()).await;
    info!(parent: &span, "harness stopped");

    result
}
