//! Layered settings: defaults, then `docqa.ron`, then environment, then flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use docqa_engine::{ClientSettings, DEFAULT_ORIGIN};
use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

use super::logging::LogDestination;

const DEFAULT_SETTINGS_FILE: &str = "docqa.ron";
const ENV_ORIGIN: &str = "DOCQA_API_URL";
const ENV_LOG_LEVEL: &str = "DOCQA_LOG_LEVEL";

#[derive(Parser, Debug, Default)]
#[command(version, about = "Upload a document and ask questions about it", long_about = None)]
pub struct Args {
    /// Backend origin, e.g. http://localhost:8000. Overrides DOCQA_API_URL.
    #[arg(long)]
    pub origin: Option<String>,

    /// Per-request timeout. Unset means the transport default.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Timeout for establishing the connection only.
    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,

    /// Where log output goes.
    #[arg(long, value_enum)]
    pub log: Option<LogDestination>,

    /// Log level (error, warn, info, debug, trace). Overrides DOCQA_LOG_LEVEL.
    #[arg(long)]
    pub log_level: Option<String>,

    /// RON settings file. Defaults to ./docqa.ron when present.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read settings file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse settings file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("unknown log level {0:?}")]
    InvalidLogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub origin: String,
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub log_destination: LogDestination,
    pub log_level: LevelFilter,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            request_timeout: None,
            connect_timeout: None,
            log_destination: LogDestination::default(),
            log_level: LevelFilter::Info,
        }
    }
}

impl Settings {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            origin: self.origin.clone(),
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
        }
    }
}

/// Shape of `docqa.ron`; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    origin: Option<String>,
    timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    log: Option<LogDestination>,
    log_level: Option<String>,
}

pub fn load_settings(args: &Args) -> Result<Settings, ConfigError> {
    resolve_settings(args, |key| std::env::var(key).ok())
}

/// Same as [`load_settings`] with an injectable environment lookup.
pub fn resolve_settings(
    args: &Args,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();
    let mut log_level: Option<String> = None;

    let file = match &args.config {
        Some(path) => Some(read_settings_file(path)?),
        None => {
            let default_path = Path::new(DEFAULT_SETTINGS_FILE);
            if default_path.exists() {
                Some(read_settings_file(default_path)?)
            } else {
                None
            }
        }
    };
    if let Some(file) = file {
        if let Some(origin) = file.origin {
            settings.origin = origin;
        }
        if let Some(secs) = file.timeout_secs {
            settings.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = file.connect_timeout_secs {
            settings.connect_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(destination) = file.log {
            settings.log_destination = destination;
        }
        log_level = file.log_level.or(log_level);
    }

    if let Some(origin) = env(ENV_ORIGIN).filter(|v| !v.trim().is_empty()) {
        settings.origin = origin;
    }
    log_level = env(ENV_LOG_LEVEL).or(log_level);

    if let Some(origin) = &args.origin {
        settings.origin = origin.clone();
    }
    if let Some(secs) = args.timeout_secs {
        settings.request_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(secs) = args.connect_timeout_secs {
        settings.connect_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(destination) = args.log {
        settings.log_destination = destination;
    }
    log_level = args.log_level.clone().or(log_level);

    if let Some(name) = log_level {
        settings.log_level =
            docqa_logging::parse_level(&name).ok_or(ConfigError::InvalidLogLevel(name))?;
    }

    Ok(settings)
}

fn read_settings_file(path: &Path) -> Result<FileSettings, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
