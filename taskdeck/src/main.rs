//! `TaskDeck` — terminal-native team Kanban board.
//!
//! Launches the TUI and optionally connects to a hub server for a
//! shared board. Configuration via CLI flags, environment variables, or
//! config file (`~/.config/taskdeck/config.toml`).
//!
//! ```bash
//! # Offline demo board
//! cargo run --bin taskdeck
//!
//! # Connect to a hub
//! cargo run --bin taskdeck -- --hub-url ws://127.0.0.1:9100/ws --user alice
//!
//! # Or via environment variables
//! TASKDECK_HUB=ws://127.0.0.1:9100/ws TASKDECK_USER=alice cargo run
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskdeck::app::App;
use taskdeck::config::{CliArgs, ClientConfig, StoreMode};
use taskdeck::store::{MemoryStore, RemoteStore};
use taskdeck::sync::{self, SyncCommand, SyncEvent};
use taskdeck::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("taskdeck starting");

    // Pick the store before the terminal goes raw so connection
    // problems surface through normal logging.
    let (cmd_tx, evt_rx, startup_note) = start_sync(&config).await;

    // Set up terminal. Mouse capture is required for drag gestures.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app.
    let result = run_app(&mut terminal, cmd_tx, evt_rx, &config, startup_note).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    tracing::info!("taskdeck exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the
/// terminal). Returns a [`WorkerGuard`] that must be held until shutdown
/// to ensure all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskdeck.log");
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

/// Spawn the sync layer against the configured store.
///
/// A hub connection failure falls back to the local board and returns a
/// note for the user instead of aborting.
async fn start_sync(
    config: &ClientConfig,
) -> (
    mpsc::Sender<SyncCommand>,
    mpsc::Receiver<SyncEvent>,
    Option<String>,
) {
    match config.store_mode() {
        StoreMode::Hub { url, user } => match RemoteStore::connect(&url, &user).await {
            Ok(store) => {
                let (tx, rx) = sync::spawn_sync(Arc::new(store)).await;
                (tx, rx, None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "hub connection failed, falling back to local board");
                let (tx, rx) = sync::spawn_sync(Arc::new(memory_store(config))).await;
                (tx, rx, Some(format!("Could not reach hub — local board ({e})")))
            }
        },
        StoreMode::Memory { .. } => {
            let (tx, rx) = sync::spawn_sync(Arc::new(memory_store(config))).await;
            (tx, rx, None)
        }
    }
}

/// Build the offline store: seeded from a file when configured, the
/// demo board otherwise.
fn memory_store(config: &ClientConfig) -> MemoryStore {
    if let Some(path) = &config.seed_file {
        match MemoryStore::from_seed_file(path) {
            Ok(store) => return store,
            Err(e) => {
                tracing::warn!(error = %e, "seed file rejected, using demo board");
            }
        }
    }
    MemoryStore::demo()
}

/// Main application loop.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cmd_tx: mpsc::Sender<SyncCommand>,
    mut evt_rx: mpsc::Receiver<SyncEvent>,
    config: &ClientConfig,
    startup_note: Option<String>,
) -> io::Result<()> {
    let mut app = App::new()
        .with_filter(config.columns.clone())
        .with_toast_ttl(config.toast_ttl)
        .with_due_format(config.due_format.clone());
    if let Some(note) = startup_note {
        app.push_toast(note, true);
    }

    loop {
        // Step 1: Draw the UI frame (this also rebuilds the hit map).
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        // Step 2: Drain all pending sync events (non-blocking).
        while let Ok(sync_event) = evt_rx.try_recv() {
            app.handle_sync_event(sync_event);
        }

        // Step 3: Expire old toasts.
        app.tick();

        // Step 4: Poll for terminal input events.
        if event::poll(config.poll_timeout)? {
            let command = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key_event(key),
                Event::Mouse(mouse) => app.handle_mouse_event(mouse),
                _ => None,
            };
            if let Some(command) = command {
                dispatch(&mut app, &cmd_tx, command);
            }
        }

        if app.should_quit {
            // Send shutdown command to the sync tasks.
            let _ = cmd_tx.try_send(SyncCommand::Shutdown);
            return Ok(());
        }
    }
}

/// Hand a store command to the sync layer.
///
/// If the channel refuses it, a persist command is settled as failed on
/// the spot so the engine reverts instead of waiting forever.
fn dispatch(app: &mut App, tx: &mpsc::Sender<SyncCommand>, command: SyncCommand) {
    if let Err(err) = tx.try_send(command) {
        let (reason, command) = match err {
            mpsc::error::TrySendError::Full(c) => ("sync channel full", c),
            mpsc::error::TrySendError::Closed(c) => ("sync channel closed", c),
        };
        tracing::warn!(reason, "store command dropped");
        if let SyncCommand::Persist(cmd) = command
            && let Some(notice) = app
                .engine
                .store_settled(cmd.request_id(), Err(reason.to_string()))
        {
            app.push_toast(notice.message(), notice.is_failure());
        }
    }
}
