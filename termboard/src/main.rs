//! `TermBoard` — terminal kanban board with optimistic drag relocation.
//!
//! Launches the TUI and optionally syncs with a task server. Moving a
//! card updates the board immediately; if the server refuses the
//! change, the card snaps back and an alert explains why.
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/termboard/config.toml`).
//!
//! ```bash
//! # Offline mode with sample tasks
//! cargo run --bin termboard
//!
//! # Sync with a task server
//! cargo run --bin termboard -- --server-url http://127.0.0.1:8350
//!
//! # Or via environment variables
//! TERMBOARD_SERVER=http://127.0.0.1:8350 cargo run --bin termboard
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use termboard::app::App;
use termboard::config::{CliArgs, ClientConfig};
use termboard::net::{self, SyncCommand, SyncEvent};
use termboard::sync::credentials::CookieJar;
use termboard::sync::gateway::HttpGateway;
use termboard::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("termboard starting");

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app.
    let result = run_app(&mut terminal, &config).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("termboard exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the
/// terminal). Returns a [`WorkerGuard`] that must be held until
/// shutdown to ensure all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("termboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop with optional server sync.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &ClientConfig,
) -> io::Result<()> {
    let mut app = App::new(config.date_format.clone());

    // Attempt to set up the gateway if a server is configured. The
    // cookie jar doubles as the credential provider: the session
    // bootstrap fills it, mutating calls read the token back out.
    let (cmd_tx, mut evt_rx) = match config.gateway_base() {
        Some(base) => {
            let jar = Arc::new(CookieJar::new());
            match HttpGateway::with_jar(base, Arc::clone(&jar), jar) {
                Ok(gateway) => {
                    let (tx, rx) = net::spawn_sync(Arc::new(gateway), config.channel_capacity);
                    // Bootstrap: fetch credentials, then the board.
                    let _ = tx.try_send(SyncCommand::OpenSession);
                    let _ = tx.try_send(SyncCommand::RefreshBoard);
                    (Some(tx), Some(rx))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "gateway setup failed, running offline");
                    app.notice = Some(format!("Offline: {e}"));
                    app.load_sample_board();
                    (None, None)
                }
            }
        }
        None => {
            app.notice = Some("Offline mode (no server configured)".to_string());
            app.load_sample_board();
            (None, None)
        }
    };

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain all pending sync events (non-blocking).
        if let Some(ref mut rx) = evt_rx {
            drain_sync_events(&mut app, rx);
        }

        // Step 3: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            // handle_key_event returns Some(SyncCommand) when the
            // action requires server dispatch (dropping a card,
            // confirming a delete, creating a task, refreshing).
            if let Some(cmd) = app.handle_key_event(key) {
                match cmd_tx {
                    Some(ref tx) => match tx.try_send(cmd) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(cmd)) => {
                            tracing::warn!("sync channel full, command not sent");
                            app.fail_undispatched(cmd);
                        }
                        Err(mpsc::error::TrySendError::Closed(cmd)) => {
                            tracing::warn!("sync worker gone, command not sent");
                            app.connected = false;
                            app.fail_undispatched(cmd);
                        }
                    },
                    // No server: resolve the command locally.
                    None => app.resolve_offline(cmd),
                }
            }
        }

        if app.should_quit {
            // Send shutdown command to the sync task.
            if let Some(ref tx) = cmd_tx {
                let _ = tx.try_send(SyncCommand::Shutdown);
            }
            return Ok(());
        }
    }
}

/// Drain all pending `SyncEvent`s from the receiver and apply them to
/// the app.
fn drain_sync_events(app: &mut App, rx: &mut mpsc::Receiver<SyncEvent>) {
    while let Ok(event) = rx.try_recv() {
        app.apply_sync_event(event);
    }
}
