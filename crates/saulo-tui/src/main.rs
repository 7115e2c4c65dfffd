mod app;
mod handler;
mod html;
mod tui;
mod ui;

use anyhow::Result;
use saulo_core::{Config, ConnectionMonitor, Connectivity};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::app::App;
use crate::handler::handle_event;
use crate::tui::EventHandler;

const LOG_ENV: &str = "SAULO_LOG";
const LOG_FILE: &str = "saulo.log";

/// Log to a file in the config directory so output never draws over the UI.
/// Returns `None` (logging disabled) when the directory is unavailable.
fn init_logging() -> Option<WorkerGuard> {
    let dir = Config::config_dir().ok()?;
    std::fs::create_dir_all(&dir).ok()?;

    let file = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| "saulo_core=info,saulo=info".into()),
        )
        .with_writer(writer)
        .with_ansi(false)
        .compact()
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_logging();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "could not load config, using defaults");
            Config::new()
        }
    };
    info!(base_url = %config.base_url, user_id = %config.user_id, "starting");

    let connectivity = Connectivity::new();
    let monitor = ConnectionMonitor::new(&config.base_url, connectivity.clone())
        .with_timeout(config.probe_timeout());
    let probe_task = match config.probe_interval() {
        Some(interval) => monitor.spawn_periodic(interval),
        None => tokio::spawn(async move {
            monitor.probe().await;
        }),
    };

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut app = App::new(&config, connectivity);
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    probe_task.abort();
    if let Some(task) = app.send_task.take() {
        task.abort();
    }

    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
