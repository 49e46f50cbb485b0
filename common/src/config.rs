//! Runtime configuration loaded from `.env` / environment variables.
//!
//! `Config` is a lazily initialized, process-wide singleton. The first call
//! to [`Config::get`] loads `.env` (if present) and reads the environment;
//! later calls return the cached instance.

use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    /// SQLite file path or a full DSN (`sqlite:`, `postgres://`, ...).
    pub database_path: String,
    /// Retry budget for version-conflicted submissions.
    pub submit_max_retries: usize,
    /// Backoff schedule in milliseconds, indexed by retry number.
    pub submit_backoff_ms: Vec<u64>,
}

static CONFIG: OnceCell<Config> = OnceCell::new();

impl Config {
    fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let project_name = env::var("PROJECT_NAME").unwrap_or_else(|_| "submission-core".into());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/submission-core.log".into());
        let log_to_stdout = env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "true".into()) == "true";
        let database_path = env::var("DATABASE_PATH").expect("DATABASE_PATH must be set");
        let submit_max_retries = env::var("SUBMIT_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let submit_backoff_ms = env::var("SUBMIT_BACKOFF_MS")
            .unwrap_or_else(|_| "50,100,200".into())
            .split(',')
            .filter_map(|ms| ms.trim().parse().ok())
            .collect();

        Config {
            project_name,
            log_level,
            log_file,
            log_to_stdout,
            database_path,
            submit_max_retries,
            submit_backoff_ms,
        }
    }

    pub fn get() -> &'static Self {
        CONFIG.get_or_init(Self::from_env)
    }
}

pub fn database_path() -> String {
    Config::get().database_path.clone()
}

pub fn log_level() -> String {
    Config::get().log_level.clone()
}

pub fn log_file() -> String {
    Config::get().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    Config::get().log_to_stdout
}
