//! Relay settings and where they come from.
//!
//! Each setting is taken from the first source that provides it:
//! command line, then environment (`RELAY_ADDR`, `RELAY_LOG`), then the
//! `[server]` table of `~/.config/signalpost-relay/config.toml`, then the
//! built-in default.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::server::DEFAULT_MAX_BODY_SIZE;
use crate::store::DEFAULT_QUEUE_WARN_THRESHOLD;

/// Address the relay listens on when nothing else is configured.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";

/// Errors raised while reading the settings file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists (or was named explicitly) but could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// File that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML, or a value has the wrong type or range.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

/// Contents of the settings file. Absent keys leave the default in place.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SettingsFile {
    server: ServerTable,
}

/// `[server]` table.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerTable {
    bind_addr: Option<String>,
    max_body_size: Option<usize>,
    // 0 is rejected at parse time: a zero cap would leave empty queues behind.
    max_queue_size: Option<NonZeroUsize>,
    queue_warn_threshold: Option<usize>,
}

/// Command-line flags of `signalpost-relay`.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Signalpost signaling relay")]
pub struct RelayCliArgs {
    /// Listen address, e.g. `127.0.0.1:9000`.
    #[arg(short, long, env = "RELAY_ADDR")]
    pub bind: Option<String>,

    /// Settings file to use instead of the per-user one. Must exist.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Largest POST body accepted, in bytes.
    #[arg(long)]
    pub max_body_size: Option<usize>,

    /// Keep at most this many envelopes per peer, dropping the oldest.
    /// Must be at least 1; queues are unbounded when omitted.
    #[arg(long)]
    pub max_queue_size: Option<NonZeroUsize>,

    /// Queue length at which a peer's backlog is reported in the log.
    #[arg(long)]
    pub queue_warn_threshold: Option<usize>,

    /// `tracing` filter directive (`info`, `signalpost_relay=debug`, ...).
    #[arg(long, default_value = "info", env = "RELAY_LOG")]
    pub log_level: String,
}

/// Settings the relay runs with after all sources are merged.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Listen address.
    pub bind_addr: String,
    /// Largest POST body accepted, in bytes.
    pub max_body_size: usize,
    /// Per-peer queue cap; `None` keeps every envelope until polled.
    pub max_queue_size: Option<NonZeroUsize>,
    /// Queue length that triggers a backlog warning.
    pub queue_warn_threshold: usize,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_queue_size: None,
            queue_warn_threshold: DEFAULT_QUEUE_WARN_THRESHOLD,
            log_level: "info".to_string(),
        }
    }
}

impl RelayConfig {
    /// Reads the settings file and merges it under the command line.
    ///
    /// A file named with `--config` must exist. The per-user file is
    /// optional and silently skipped when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(cli: &RelayCliArgs) -> Result<Self, ConfigError> {
        let file = read_settings(cli.config.as_deref())?;
        Ok(Self::merge(cli, file.server))
    }

    fn merge(cli: &RelayCliArgs, server: ServerTable) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: cli
                .bind
                .clone()
                .or(server.bind_addr)
                .unwrap_or(defaults.bind_addr),
            max_body_size: cli
                .max_body_size
                .or(server.max_body_size)
                .unwrap_or(defaults.max_body_size),
            max_queue_size: cli.max_queue_size.or(server.max_queue_size),
            queue_warn_threshold: cli
                .queue_warn_threshold
                .or(server.queue_warn_threshold)
                .unwrap_or(defaults.queue_warn_threshold),
            log_level: cli.log_level.clone(),
        }
    }
}

fn read_settings(explicit: Option<&Path>) -> Result<SettingsFile, ConfigError> {
    let (path, required) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => match dirs::config_dir() {
            Some(dir) => (dir.join("signalpost-relay").join("config.toml"), false),
            None => return Ok(SettingsFile::default()),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            Ok(SettingsFile::default())
        }
        Err(source) => Err(ConfigError::ReadFile { path, source }),
    }
}
