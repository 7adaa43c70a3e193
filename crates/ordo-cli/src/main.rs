//! CLI binary for ordo.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use ordo_core::app::{Completion, EngineBuilder, EngineConfig, LinkedTask, TaskLifecycle};
use ordo_core::domain::{
    Cycle, Effort, Importance, NewTask, RecurrenceRule, SortDirection, SortField, Task, TaskState,
    UserId, ViewConfig,
};
use ordo_core::impls::InMemoryTaskStore;
use ordo_core::ports::{Clock, SystemClock};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ulid::Ulid;

/// Horizon of the demo urgency curve, in days.
const URGENCY_HORIZON_DAYS: i64 = 14;

#[derive(Parser, Debug)]
#[command(name = "ordo", version, about = "Task prioritization and recurrence engine")]
struct Cli {
    /// Path to TOML engine configuration.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted scenario against the in-memory store and print JSON
    Demo,

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ordo=info,ordo_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(ref path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Demo => run_demo(config).await,
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: EngineConfig =
        toml::from_str(&raw).with_context(|| format!("invalid config in {}", path.display()))?;
    info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Linear urgency: 0 beyond the horizon, growing by one per day closer,
/// and still growing once overdue.
fn urgency(due: DateTime<Utc>) -> i64 {
    (URGENCY_HORIZON_DAYS - (due - Utc::now()).num_days()).max(0)
}

#[derive(Serialize)]
struct DemoReport {
    active: Vec<Task>,
    by_due: Vec<Task>,
    trash: Vec<Task>,
    after_groceries: Vec<LinkedTask>,
    completion: Completion,
}

async fn run_demo(config: EngineConfig) -> Result<()> {
    let engine: TaskLifecycle = EngineBuilder::new()
        .store(Arc::new(InMemoryTaskStore::new()))
        .clock(Arc::new(SystemClock))
        .urgency(urgency)
        .config(config)
        .build()?;

    let owner = UserId::from_ulid(Ulid::new());
    let now = SystemClock.now();
    let draft = |title: &str, importance, effort, due_in_days| NewTask {
        owner,
        title: title.to_string(),
        importance,
        effort,
        due: now + Duration::days(due_in_days),
        project: None,
    };

    let groceries = engine
        .create(draft("Buy groceries", Importance::Medium, Effort::Hour, 1))
        .await?;
    let cook = engine
        .create(draft("Cook dinner", Importance::High, Effort::Hour, 1))
        .await?;
    let report = engine
        .create(draft("Quarterly report", Importance::Critical, Effort::Days, 10))
        .await?;
    let plants = engine
        .create(draft("Water plants", Importance::Low, Effort::Minutes, 0))
        .await?;
    let junk = engine
        .create(draft("Old idea", Importance::None, Effort::Day, 30))
        .await?;

    engine.link(cook.id, groceries.id).await?;
    engine
        .set_recurrence(plants.id, RecurrenceRule::new(plants.id, Cycle::Daily, 1))
        .await?;
    engine.set_state(report.id, TaskState::InProgress).await?;
    engine.soft_delete(junk.id).await?;

    let completion = engine.complete(plants.id).await?;

    let by_due = ViewConfig::sorted_by(SortField::Due, SortDirection::Asc)
        .with_states(&[TaskState::ToDo, TaskState::InProgress, TaskState::Stalled]);

    let out = DemoReport {
        active: engine.list_active(owner, None).await?,
        by_due: engine.list_active(owner, Some(&by_due)).await?,
        trash: engine.list_trash(owner).await?,
        after_groceries: engine.successors(groceries.id).await?,
        completion,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
