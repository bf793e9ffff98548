use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub backend: BackendConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base address every queued request path is resolved against.
    pub base_url: String,
    pub request_timeout: u64,
    /// Endpoint probed to confirm actual internet reachability, not just
    /// a present radio link.
    pub probe_url: String,
    pub probe_timeout: u64,
    pub probe_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Drain the request queue automatically on reconnect and on a timer.
    pub auto_drain: bool,
    pub drain_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub snapshot_interval: u64,
    /// Snapshots older than this are discarded wholesale at restore time.
    pub max_snapshot_age_hours: u64,
    /// Per-query staleness window, independent of the snapshot age bound.
    pub stale_time: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: format!("sqlite:{}", default_database_path().display()),
                max_connections: 5,
                connection_timeout: 30,
            },
            backend: BackendConfig {
                base_url: "https://api.wayfare.app".to_string(),
                request_timeout: 30,
                probe_url: "https://api.wayfare.app/health".to_string(),
                probe_timeout: 5,
                probe_interval: 15,
            },
            sync: SyncConfig {
                auto_drain: true,
                drain_interval: 300, // 5 minutes
            },
            cache: CacheConfig {
                snapshot_interval: 300,
                max_snapshot_age_hours: 24,
                stale_time: 300,
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("WAYFARE_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("WAYFARE_BACKEND_URL") {
            if !v.trim().is_empty() {
                cfg.backend.base_url = v;
            }
        }
        if let Ok(v) = std::env::var("WAYFARE_PROBE_URL") {
            if !v.trim().is_empty() {
                cfg.backend.probe_url = v;
            }
        }
        if let Ok(v) = std::env::var("WAYFARE_PROBE_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.backend.probe_interval = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("WAYFARE_AUTO_DRAIN") {
            cfg.sync.auto_drain = parse_bool(&v, cfg.sync.auto_drain);
        }
        if let Ok(v) = std::env::var("WAYFARE_DRAIN_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.drain_interval = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("WAYFARE_SNAPSHOT_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.snapshot_interval = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("WAYFARE_SNAPSHOT_MAX_AGE_HOURS") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.max_snapshot_age_hours = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("WAYFARE_STALE_TIME") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.stale_time = value.max(1);
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.backend.base_url.trim().is_empty() {
            return Err("Backend base_url must not be empty".to_string());
        }
        if url::Url::parse(&self.backend.base_url).is_err() {
            return Err(format!(
                "Backend base_url is not a valid URL: {}",
                self.backend.base_url
            ));
        }
        if url::Url::parse(&self.backend.probe_url).is_err() {
            return Err(format!(
                "Backend probe_url is not a valid URL: {}",
                self.backend.probe_url
            ));
        }
        if self.cache.max_snapshot_age_hours == 0 {
            return Err("Cache max_snapshot_age_hours must be greater than 0".to_string());
        }
        if self.cache.stale_time == 0 {
            return Err("Cache stale_time must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("./data"))
        .join("wayfare")
        .join("wayfare.db")
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
