//! fanline-cli: demo of the fan-out dispatcher
//!
//!   fanline-cli                               # built-in sample events
//!   fanline-cli --events rows.json            # JSON array of row events
//!   fanline-cli --config fanline.json --json-logs
//!
//! Two plugins are registered: `audit` takes every row, `search-index` only
//! products and fails on deletes. A reindex runs as a sync on
//! `search-index` while the backlog is draining.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use fanline_core::domain::BoxError;
use fanline_core::impls::InMemoryTaskStore;
use fanline_core::{
    DispatcherBuilder, DispatcherConfig, Plugin, ProcessError, Task, TaskStatus,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fanline-cli")]
#[command(about = "Fan row events out to independently draining plugins")]
struct Args {
    /// Dispatcher config (JSON); defaults are used when omitted
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Row events to enqueue (JSON array)
    #[arg(long, value_name = "PATH")]
    events: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Op {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RowEvent {
    table: String,
    op: Op,
    key: String,
}

struct AuditPlugin;

#[async_trait]
impl Plugin<RowEvent> for AuditPlugin {
    fn name(&self) -> &str {
        "audit"
    }

    fn classify(&self, _row: &RowEvent) -> TaskStatus {
        TaskStatus::Pending
    }

    async fn process(&self, task: &Task<RowEvent>) -> Result<(), ProcessError> {
        let row = task.payload();
        info!(task_id = %task.id(), table = %row.table, key = %row.key, op = ?row.op, "audit");
        Ok(())
    }
}

#[derive(Default)]
struct SearchIndexPlugin {
    indexed: AtomicUsize,
}

#[async_trait]
impl Plugin<RowEvent> for SearchIndexPlugin {
    fn name(&self) -> &str {
        "search-index"
    }

    fn classify(&self, row: &RowEvent) -> TaskStatus {
        if row.table == "products" {
            TaskStatus::Pending
        } else {
            TaskStatus::Skipped
        }
    }

    async fn process(&self, task: &Task<RowEvent>) -> Result<(), ProcessError> {
        let row = task.payload();
        if matches!(row.op, Op::Delete) {
            return Err(ProcessError::Failed(format!(
                "no index entry for key={}",
                row.key
            )));
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        self.indexed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn sample_events() -> Vec<RowEvent> {
    let row = |table: &str, op, key: &str| RowEvent {
        table: table.to_string(),
        op,
        key: key.to_string(),
    };
    vec![
        row("products", Op::Insert, "p-1"),
        row("orders", Op::Insert, "o-1"),
        row("products", Op::Update, "p-1"),
        row("products", Op::Insert, "p-2"),
        row("customers", Op::Update, "c-7"),
        row("products", Op::Delete, "p-2"),
    ]
}

fn load_events(path: Option<&PathBuf>) -> Result<Vec<RowEvent>> {
    let Some(path) = path else {
        return Ok(sample_events());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read events from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid events in {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let config = match &args.config {
        Some(path) => DispatcherConfig::from_json_file(path)?,
        None => DispatcherConfig::default_v1(),
    };
    let events = load_events(args.events.as_ref())?;

    // (A) store と plugin を組み立てる
    let store = Arc::new(InMemoryTaskStore::<RowEvent>::new());
    let search = Arc::new(SearchIndexPlugin::default());
    let dispatcher = DispatcherBuilder::new(store.clone())
        .config(config)
        .register(AuditPlugin)
        .register_shared(search.clone())
        .expect_plugins(&["audit", "search-index"])
        .build()
        .await?;

    // (B) event を投入（各 plugin は kick されて勝手に drain する）
    for event in events {
        dispatcher.enqueue(event).await?;
    }

    // (C) drain の途中で search-index を止めて reindex（sync）を走らせる
    let before = search.indexed.load(Ordering::Relaxed);
    let indexed = dispatcher
        .sync("search-index", || async move {
            info!(indexed = before, "reindex while search-index is paused");
            Ok::<_, BoxError>(before)
        })
        .await?;
    info!(indexed, "sync finished");

    // (D) 全 plugin が Idle になるまで待って ledger を表示
    dispatcher.wait_idle().await;
    for task in store.all().await {
        println!("{} {}", task.id(), serde_json::to_string(task.statuses())?);
    }

    let pruned = dispatcher.prune().await?;
    println!("pruned={pruned} remaining={}", store.len().await);
    Ok(())
}
