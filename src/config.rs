use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};

const DEFAULT_DB_PATH: &str = "data/revalix.sqlite";
const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_ATTOM_URL: &str =
    "https://api.gateway.attomdata.com/propertyapi/v1.0.0/property/address";

/// Process configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub bind_addr: String,
    pub api_url: String,
    pub attom_api_key: Option<String>,
    pub attom_url: String,
    pub timeout: Duration,
    pub mapping_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        let timeout_secs = non_empty("REVALIX_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Config {
            db_path: non_empty("REVALIX_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            bind_addr: non_empty("REVALIX_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            api_url: non_empty("REVALIX_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            attom_api_key: non_empty("ATTOM_API_KEY"),
            attom_url: non_empty("ATTOM_API_URL").unwrap_or_else(|| DEFAULT_ATTOM_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            mapping_file: non_empty("REVALIX_MAPPING_FILE").map(PathBuf::from),
        }
    }

    pub fn attom_api_key(&self) -> Result<&str> {
        self.attom_api_key
            .as_deref()
            .ok_or_else(|| anyhow!("ATTOM_API_KEY environment variable must be set"))
    }
}

// ── Tests ──
