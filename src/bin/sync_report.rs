use anyhow::{Context, Result};
use chrono::Utc;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tokio::runtime::Runtime;

use wayfare_lib::AppConfig;
use wayfare_lib::ConnectionPool;
use wayfare_lib::application::ports::KeyValueStore;
use wayfare_lib::application::services::cache_service::CACHE_SNAPSHOT_KEY;
use wayfare_lib::application::services::queue_service::REQUEST_QUEUE_KEY;
use wayfare_lib::domain::entities::sync::{CacheSnapshot, QueuedRequest};
use wayfare_lib::infrastructure::storage::SqliteKvStore;

#[derive(Debug, Clone)]
struct CliOptions {
    output: Option<PathBuf>,
    pretty: bool,
    database_url: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct SyncReport {
    generated_at_ms: i64,
    database_url: String,
    queue: QueueReport,
    cache: CacheReport,
}

#[derive(Debug, serde::Serialize)]
struct QueueReport {
    pending: usize,
    oldest_created_at: Option<i64>,
    entries: Vec<QueueEntrySummary>,
}

#[derive(Debug, serde::Serialize)]
struct QueueEntrySummary {
    id: String,
    method: String,
    path: String,
    created_at: i64,
    last_error: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct CacheReport {
    present: bool,
    persisted_at: Option<i64>,
    age_hours: Option<i64>,
    entry_count: usize,
}

fn usage() -> &'static str {
    "Usage: sync_report [--output <path>] [--pretty] [--database-url <url>]"
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(args.into_iter())?;

    let database_url = resolve_database_url(&options);
    let rt = Runtime::new().context("Failed to create Tokio runtime")?;
    let report = rt.block_on(async {
        collect_report(&database_url)
            .await
            .with_context(|| format!("Failed to collect sync report from {database_url}"))
    })?;

    let payload = to_json(&report, options.pretty)?;
    emit_payload(options.output.as_deref(), &payload)
}

async fn collect_report(database_url: &str) -> Result<SyncReport> {
    let pool = ConnectionPool::new(database_url, 1).await?;
    pool.initialize_schema().await?;
    let store = SqliteKvStore::new(pool.get_pool().clone());

    let queue = match store.get(REQUEST_QUEUE_KEY).await? {
        Some(raw) => {
            let entries: Vec<QueuedRequest> =
                serde_json::from_str(&raw).context("Queue blob is not valid JSON")?;
            QueueReport {
                pending: entries.len(),
                oldest_created_at: entries.first().map(|req| req.created_at.timestamp()),
                entries: entries
                    .iter()
                    .map(|req| QueueEntrySummary {
                        id: req.id.to_string(),
                        method: req.method.as_str().to_string(),
                        path: req.path.to_string(),
                        created_at: req.created_at.timestamp(),
                        last_error: req.last_error.clone(),
                    })
                    .collect(),
            }
        }
        None => QueueReport {
            pending: 0,
            oldest_created_at: None,
            entries: Vec::new(),
        },
    };

    let cache = match store.get(CACHE_SNAPSHOT_KEY).await? {
        Some(raw) => match serde_json::from_str::<CacheSnapshot>(&raw) {
            Ok(snapshot) => CacheReport {
                present: true,
                persisted_at: Some(snapshot.persisted_at.timestamp()),
                age_hours: Some((Utc::now() - snapshot.persisted_at).num_hours()),
                entry_count: snapshot.entries.len(),
            },
            Err(_) => CacheReport {
                present: true,
                persisted_at: None,
                age_hours: None,
                entry_count: 0,
            },
        },
        None => CacheReport {
            present: false,
            persisted_at: None,
            age_hours: None,
            entry_count: 0,
        },
    };

    pool.close().await;

    Ok(SyncReport {
        generated_at_ms: Utc::now().timestamp_millis(),
        database_url: database_url.to_string(),
        queue,
        cache,
    })
}

fn resolve_database_url(options: &CliOptions) -> String {
    if let Some(url) = &options.database_url {
        return url.clone();
    }
    if let Ok(url) = env::var("WAYFARE_DATABASE_URL") {
        if !url.trim().is_empty() {
            return url;
        }
    }
    AppConfig::default().database.url
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

fn write_output(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

fn emit_payload(target: Option<&Path>, payload: &str) -> Result<()> {
    if let Some(path) = target {
        write_output(path, payload)?;
        println!("Report written to {}", path.display());
    } else {
        println!("{payload}");
    }
    Ok(())
}

fn parse_args<I>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = String>,
{
    let mut output: Option<PathBuf> = None;
    let mut pretty = false;
    let mut database_url: Option<String> = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--output requires a path\n{}", usage()))?;
                output = Some(PathBuf::from(path));
            }
            "--pretty" => {
                pretty = true;
            }
            "--database-url" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--database-url requires a value\n{}", usage()))?;
                database_url = Some(value);
            }
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => {
                anyhow::bail!("Unknown argument: {other}\n{}", usage());
            }
        }
    }

    Ok(CliOptions {
        output,
        pretty,
        database_url,
    })
}
