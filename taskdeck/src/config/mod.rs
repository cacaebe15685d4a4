//! Configuration system for the `TaskDeck` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdeck/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use taskdeck_proto::task::TaskStatus;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A lane filter entry did not name a known board column.
    #[error(
        "unknown board column '{0}' (expected backlog, in_progress, waiting_review, \
         sent_client, feedback, approved, or done)"
    )]
    UnknownColumn(String),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    hub: HubFileConfig,
    board: BoardFileConfig,
    ui: UiFileConfig,
}

/// `[hub]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct HubFileConfig {
    url: Option<String>,
    user: Option<String>,
}

/// `[board]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    columns: Option<Vec<String>>,
    seed_file: Option<PathBuf>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    toast_ttl_ms: Option<u64>,
    due_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Where the client should keep its board state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreMode {
    /// Connect to a hub server over WebSocket.
    Hub {
        /// Hub WebSocket URL.
        url: String,
        /// User name to present in the handshake.
        user: String,
    },
    /// Run against an in-memory store, optionally seeded from a file.
    Memory {
        /// JSON seed file to load tasks from, if any.
        seed_file: Option<PathBuf>,
    },
}

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- Hub --
    /// Hub server WebSocket URL.
    pub hub_url: Option<String>,
    /// User name to present to the hub.
    pub user: Option<String>,

    // -- Board --
    /// Lanes to show, in board order. `None` shows all lanes.
    pub columns: Option<Vec<TaskStatus>>,
    /// JSON seed file for offline mode.
    pub seed_file: Option<PathBuf>,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// How long a toast stays on screen.
    pub toast_ttl: Duration,
    /// Due date display format string (chrono).
    pub due_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hub_url: None,
            user: None,
            columns: None,
            seed_file: None,
            poll_timeout: Duration::from_millis(50),
            toast_ttl: Duration::from_secs(3),
            due_format: "%b %d".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// CLI args and env vars are parsed via `clap`. If `--config` is given
    /// and the file does not exist, returns an error. If no `--config` is
    /// given, the default path (`~/.config/taskdeck/config.toml`) is tried
    /// and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if a lane filter entry does not name a known column.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. This is separated from `load()` to
    /// enable unit testing without CLI parsing.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let columns = if let Some(list) = &cli.columns {
            parse_columns(list.split(',').map(str::to_string))?
        } else if let Some(list) = &file.board.columns {
            parse_columns(list.iter().cloned())?
        } else {
            None
        };

        Ok(Self {
            hub_url: cli.hub_url.clone().or_else(|| file.hub.url.clone()),
            user: cli.user.clone().or_else(|| file.hub.user.clone()),
            columns,
            seed_file: cli
                .seed_file
                .clone()
                .or_else(|| file.board.seed_file.clone()),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            toast_ttl: file
                .ui
                .toast_ttl_ms
                .map_or(defaults.toast_ttl, Duration::from_millis),
            due_format: file.ui.due_format.clone().unwrap_or(defaults.due_format),
        })
    }

    /// Decide where board state lives based on this configuration.
    ///
    /// Returns [`StoreMode::Hub`] only when both `hub_url` and `user` are
    /// present and non-empty; otherwise falls back to the in-memory store
    /// (offline mode), carrying the seed file if one was configured.
    #[must_use]
    pub fn store_mode(&self) -> StoreMode {
        if let (Some(url), Some(user)) = (&self.hub_url, &self.user)
            && !url.is_empty()
            && !user.is_empty()
        {
            return StoreMode::Hub {
                url: url.clone(),
                user: user.clone(),
            };
        }
        StoreMode::Memory {
            seed_file: self.seed_file.clone(),
        }
    }
}

/// CLI arguments parsed by clap.
///
/// Environment variables are supported via `env` attributes so the client
/// can be pointed at a hub without flags.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal-native team Kanban board")]
pub struct CliArgs {
    /// WebSocket URL of the hub server.
    #[arg(long, env = "TASKDECK_HUB")]
    pub hub_url: Option<String>,

    /// User name to present to the hub.
    #[arg(long, env = "TASKDECK_USER")]
    pub user: Option<String>,

    /// Comma-separated lanes to show (e.g. `backlog,in_progress,done`).
    #[arg(long)]
    pub columns: Option<String>,

    /// JSON seed file for offline mode.
    #[arg(long, value_name = "FILE")]
    pub seed_file: Option<PathBuf>,

    /// Path to config file (default: `~/.config/taskdeck/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDECK_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskdeck.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Parse lane names into statuses, preserving order.
///
/// Blank entries are skipped so a trailing comma is harmless. An all-blank
/// list resolves to `None` (no filter).
fn parse_columns(
    names: impl Iterator<Item = String>,
) -> Result<Option<Vec<TaskStatus>>, ConfigError> {
    let mut columns = Vec::new();
    for name in names {
        if name.trim().is_empty() {
            continue;
        }
        let status = name
            .trim()
            .parse::<TaskStatus>()
            .map_err(|_| ConfigError::UnknownColumn(name))?;
        columns.push(status);
    }
    Ok(if columns.is_empty() {
        None
    } else {
        Some(columns)
    })
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            // No config dir available — use defaults.
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskdeck").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
