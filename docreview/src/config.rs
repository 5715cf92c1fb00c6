//! Startup configuration: TOML config file and command-line flags.
//!
//! The config file lives at `$XDG_CONFIG_HOME/docreview/config.toml` (falling
//! back to `~/.config/docreview/config.toml`). Every key is optional. A
//! missing file yields defaults; a malformed one is reported and ignored.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5050";
const SERVER_URL_ENV: &str = "DOCREVIEW_SERVER_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{0}")]
    Cli(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the review server.
    pub server_url: String,
    /// Directory for the settings database, log file and exports.
    pub data_dir: PathBuf,
    pub poll_interval_ms: u64,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_owned(),
            data_dir: PathBuf::from(".docreview"),
            poll_interval_ms: 1000,
            debug: false,
        }
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    /// Loads the config file at `path`. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// `ConfigError::Read` for I/O failures other than not-found,
    /// `ConfigError::Parse` for invalid TOML or wrongly typed keys.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read { path: path.to_owned(), source });
            }
        };
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_owned(), source })
    }

    /// Applies environment overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.trim().is_empty() {
                self.server_url = url.trim().to_owned();
            }
        }
        self
    }
}

/// Returns the path to the config file.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("docreview").join("config.toml")
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Cli {
    /// Server-side job to poll.
    pub job: Option<String>,
    /// Saved result payload to load instead of polling.
    pub results: Option<PathBuf>,
    pub debug: bool,
    pub help: bool,
}

impl Cli {
    /// # Errors
    ///
    /// `ConfigError::Cli` for unknown flags or a flag missing its value.
    pub fn parse<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cli = Cli::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--job" => {
                    cli.job = Some(required_value(&arg, args.next())?);
                }
                "--results" => {
                    cli.results = Some(PathBuf::from(required_value(&arg, args.next())?));
                }
                "--debug" => cli.debug = true,
                "--help" | "-h" => cli.help = true,
                other => {
                    return Err(ConfigError::Cli(format!(
                        "Unexpected argument '{other}'. Run with --help for valid flags."
                    )));
                }
            }
        }

        if cli.job.is_some() && cli.results.is_some() {
            return Err(ConfigError::Cli("--job and --results are mutually exclusive".to_owned()));
        }
        Ok(cli)
    }
}

fn required_value(flag: &str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.starts_with("--") && !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Cli(format!("Missing value after {flag}.")))
}

pub const USAGE: &str = "\
Usage: docreview [--job <id>] [--results <file.json>] [--debug]

  --job <id>             Poll a running analysis job on the review server
  --results <file.json>  Load a saved review result
  --debug                Start with debug logging enabled
  --help                 Show this help message";
