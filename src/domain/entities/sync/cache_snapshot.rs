use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One cached server response. The `data` blob is opaque to the sync core;
/// only its timestamps are interpreted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedQueryEntry {
    pub data: Value,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub stale: bool,
}

impl CachedQueryEntry {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            fetched_at: Utc::now(),
            stale: false,
        }
    }

    pub fn is_fresh(&self, stale_time: Duration, now: DateTime<Utc>) -> bool {
        !self.stale && now - self.fetched_at <= stale_time
    }
}

/// The whole query cache as persisted to durable storage, one blob under a
/// single key. Age policy applies to the snapshot as a whole at restore time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSnapshot {
    pub persisted_at: DateTime<Utc>,
    pub entries: HashMap<String, CachedQueryEntry>,
}

impl CacheSnapshot {
    pub fn new(entries: HashMap<String, CachedQueryEntry>) -> Self {
        Self {
            persisted_at: Utc::now(),
            entries,
        }
    }

    pub fn is_expired(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now - self.persisted_at > max_age
    }
}
