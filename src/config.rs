//! Runtime settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::server::api::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_CATALOG_PATH: &str = "data/catalogs/necron.catalog.json";

pub const BIND_ENV: &str = "ARMOURY_BIND";
pub const CATALOG_ENV: &str = "ARMOURY_CATALOG";
pub const WORKERS_ENV: &str = "ARMOURY_WORKERS";
pub const LOG_ENV: &str = "ARMOURY_LOG";
pub const MAX_SESSIONS_ENV: &str = "ARMOURY_MAX_SESSIONS";
pub const SESSION_IDLE_ENV: &str = "ARMOURY_SESSION_IDLE_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub catalog_path: PathBuf,
    /// Rayon threads for catalog validation; 0 uses every core.
    pub workers: usize,
    pub max_sessions: usize,
    pub session_idle: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            workers: 0,
            max_sessions: DEFAULT_MAX_SESSIONS,
            session_idle: DEFAULT_SESSION_IDLE,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let workers = match non_empty(WORKERS_ENV) {
            Some(raw) => raw.trim().parse::<usize>().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid {WORKERS_ENV}, using all cores");
                defaults.workers
            }),
            None => defaults.workers,
        };

        let max_sessions = match non_empty(MAX_SESSIONS_ENV) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => {
                    tracing::warn!(value = %raw, "invalid {MAX_SESSIONS_ENV}, using default");
                    defaults.max_sessions
                }
            },
            None => defaults.max_sessions,
        };

        let session_idle = match non_empty(SESSION_IDLE_ENV) {
            Some(raw) => raw.trim().parse::<u64>().map(Duration::from_secs).unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid {SESSION_IDLE_ENV}, using default");
                defaults.session_idle
            }),
            None => defaults.session_idle,
        };

        Self {
            bind_addr: non_empty(BIND_ENV).unwrap_or(defaults.bind_addr),
            catalog_path: non_empty(CATALOG_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_path),
            workers,
            max_sessions,
            session_idle,
        }
    }
}
