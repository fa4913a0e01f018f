use std::sync::Arc;

use clap::Parser;

use corkboard::board::context::BoardContext;
use corkboard::board::engine::BoardEngine;
use corkboard::config::Config;
use corkboard::error::Result;
use corkboard::model::TaskDraft;
use corkboard::providers::memory::{LocalIdentity, MemoryStore};

#[derive(Parser, Debug)]
#[command(name = "corkboard")]
#[command(about = "Corkboard demo session against the in-memory backend")]
struct Cli {
    #[arg(long)]
    config: Option<String>,

    #[arg(long, env = "CORKBOARD_APP_ID")]
    app_id: Option<String>,

    #[arg(long, env = "CORKBOARD_USER_ID")]
    user_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    corkboard::logging::init_tracing("corkboard");

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::convention_defaults(),
    };
    let app_id = cli
        .app_id
        .unwrap_or_else(|| config.app_id().to_string());
    let user_id = cli.user_id.or(config.user_id);

    let identity = match user_id {
        Some(user) => LocalIdentity::with_user(user),
        None => LocalIdentity::new(),
    };
    let ctx = BoardContext::new(Arc::new(MemoryStore::new()), Arc::new(identity), app_id);

    let engine = Arc::new(BoardEngine::open(ctx).await?);
    engine.clone().spawn_sync().await?;

    let review = engine.columns().add("Review").await?;
    let avery = engine.personnel().add("Avery").await?;
    let task = engine
        .tasks()
        .add(TaskDraft {
            title: "Write spec".to_string(),
            description: "Draft the board spec".to_string(),
            assigned_to: Some(avery.name.clone()),
            ..TaskDraft::default()
        })
        .await?;

    engine.begin_drag(&task.id).await?;
    engine.drop_on(&review.id).await?;

    // Let the snapshot pushes land before rendering.
    tokio::task::yield_now().await;

    for view in engine.view().await {
        println!("[{}] {}", view.column.order, view.column.title);
        for task in &view.tasks {
            let assignee = task.assigned_to.as_deref().unwrap_or("unassigned");
            println!("  - {} ({assignee})", task.title);
        }
    }

    engine.close().await;
    Ok(())
}
