mod app;
mod commands;
mod config;
mod services;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::commands::{IngestArgs, RepairKind, SearchArgs, WorkerArgs};
use crate::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "devrank",
    version,
    about = "Developer reputation scoring from public code activity"
)]
struct Cli {
    /// Config file, without extension
    #[arg(long, default_value = "config/devrank")]
    config: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest and score developers, then drain the queue
    Ingest(IngestArgs),
    /// Print the candidate repos an ingestion would analyze
    Discover { username: String },
    Repair {
        #[arg(value_enum)]
        kind: RepairKind,
    },
    /// Rebuild a developer's search vectors
    Reindex { username: String },
    Search(SearchArgs),
    Profile { username: String },
    /// Process tasks until interrupted
    Worker(WorkerArgs),
}

fn init_logger() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_target(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    // 初始化日志记录器
    init_logger();

    let cli = Cli::parse();
    // 加载配置
    let config = AppConfig::load_config(&cli.config)?;
    let app = App::build(config).await?;

    match cli.cmd {
        Command::Ingest(args) => commands::ingest(&app, args).await,
        Command::Discover { username } => commands::discover(&app, &username).await,
        Command::Repair { kind } => commands::repair(&app, kind).await,
        Command::Reindex { username } => commands::reindex(&app, &username).await,
        Command::Search(args) => commands::search(&app, args).await,
        Command::Profile { username } => commands::profile(&app, &username).await,
        Command::Worker(args) => commands::worker(&app, args).await,
    }
}
