use std::time::Duration;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use database::storage::RecordStore;
use ingestion::discovery::{fetch_identity, select_candidates};
use ingestion::{ProfileLookup, ProfileView, RepairReport, Repairer, TaskQueue};
use model::{Developer, IngestionStatus, QualificationFilter, Task};
use search::SearchRequest;
use tracing::{info, warn};

use crate::app::App;

#[derive(Parser)]
pub struct IngestArgs {
    /// GitHub usernames to (re)ingest
    pub usernames: Vec<String>,
    /// Every developer currently `pending`
    #[arg(long, conflicts_with = "usernames")]
    pub all_pending: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RepairKind {
    StuckScored,
    StuckUnscored,
    EmptyComplete,
}

#[derive(Parser)]
pub struct SearchArgs {
    pub text: String,
    #[arg(long = "language")]
    pub languages: Vec<String>,
    #[arg(long = "domain")]
    pub domains: Vec<String>,
    #[arg(long)]
    pub min_quality: Option<f64>,
    #[arg(long)]
    pub min_review_quality: Option<f64>,
    #[arg(long)]
    pub ingested_within_days: Option<i64>,
    #[arg(long)]
    pub limit: Option<usize>,
    /// Print hits as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct WorkerArgs {
    /// Minutes between the stuck-run repair sweeps
    #[arg(long, default_value_t = 30)]
    pub repair_every_mins: u64,
}

async fn pending_usernames(app: &App) -> anyhow::Result<Vec<String>> {
    Ok(app
        .store
        .list_developers_by_status(IngestionStatus::Pending)
        .await?
        .into_iter()
        .filter(|d| !d.opted_out)
        .map(|d| d.username)
        .collect())
}

fn print_status(developer: &Developer) {
    match developer.status {
        IngestionStatus::Failed => println!(
            "{:<24} failed: {}",
            developer.username,
            developer.failure_reason.as_deref().unwrap_or("unknown")
        ),
        status => println!(
            "{:<24} {:<12} overall {:>5.1}",
            developer.username,
            status.as_str(),
            developer.overall_score
        ),
    }
}

pub async fn ingest(app: &App, args: IngestArgs) -> anyhow::Result<()> {
    let usernames = if args.all_pending {
        pending_usernames(app).await?
    } else {
        args.usernames
    };
    if usernames.is_empty() {
        anyhow::bail!("nothing to ingest: pass usernames or --all-pending");
    }
    for username in &usernames {
        app.queue
            .enqueue(Task::Ingest {
                username: username.clone(),
            })
            .await?;
    }
    info!("queued {} developers", usernames.len());
    app.worker().run_until_idle().await;

    for username in &usernames {
        match app.store.get_developer(&Developer::normalize_id(username)).await? {
            Some(developer) => print_status(&developer),
            None => println!("{:<24} unknown", username),
        }
    }
    Ok(())
}

pub async fn discover(app: &App, username: &str) -> anyhow::Result<()> {
    let (user, repos) = fetch_identity(app.host.as_ref(), &app.gate, &app.config.ingestion, username).await?;
    let listed = repos.len();
    let candidates = select_candidates(&app.config.ingestion, &user.login, repos, Utc::now());
    println!(
        "{} (id {}): {} of {} repos selected",
        user.login,
        user.id,
        candidates.len(),
        listed
    );
    for repo in candidates {
        let pushed = repo
            .pushed_at
            .map(|p| p.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "  {:<48} {:>7} stars  {:<12} {}",
            repo.full_name,
            repo.stargazers_count,
            repo.language.as_deref().unwrap_or("-"),
            pushed
        );
    }
    Ok(())
}

async fn run_repair(repairer: &Repairer, kind: RepairKind, app: &App) -> anyhow::Result<RepairReport> {
    let stale_after = app.config.ingestion.stale_after();
    match kind {
        RepairKind::StuckScored => repairer.repair_stuck_scored(stale_after).await,
        RepairKind::StuckUnscored => repairer.repair_stuck_unscored(stale_after).await,
        RepairKind::EmptyComplete => repairer.repair_empty_complete().await,
    }
}

pub async fn repair(app: &App, kind: RepairKind) -> anyhow::Result<()> {
    let report = run_repair(&app.repairer(), kind, app).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    // repairs may re-issue work; finish it before exiting
    app.worker().run_until_idle().await;
    Ok(())
}

pub async fn reindex(app: &App, username: &str) -> anyhow::Result<()> {
    let id = Developer::normalize_id(username);
    let Some(developer) = app.store.get_developer(&id).await? else {
        anyhow::bail!("{} is not known; ingest it first", username);
    };
    if !developer.has_scores() {
        anyhow::bail!("{} has no scores yet; ingest it first", username);
    }
    app.queue
        .enqueue(Task::BuildVectors {
            developer_id: id.clone(),
        })
        .await?;
    app.worker().run_until_idle().await;
    println!("{} reindexed ({} vectors in store)", id, app.index.entry_count());
    Ok(())
}

pub async fn search(app: &App, args: SearchArgs) -> anyhow::Result<()> {
    let request = SearchRequest {
        text: args.text,
        languages: args.languages,
        domains: args.domains,
        filter: QualificationFilter {
            min_quality: args.min_quality,
            min_review_quality: args.min_review_quality,
            ingested_within_days: args.ingested_within_days,
        },
        limit: args.limit,
    };
    let hits = app.search_engine().search(&request).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("no qualified developers matched");
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{:>2}. {:<24} score {:.3}  similarity {:.3}  overall {:>5.1}  [{}] [{}]",
            rank + 1,
            hit.username,
            hit.score,
            hit.similarity,
            hit.overall_score,
            hit.languages.join(", "),
            hit.domains.join(", ")
        );
    }
    Ok(())
}

fn print_profile(view: &ProfileView) {
    let d = &view.developer;
    println!("{} (grade {}, overall {:.1})", d.username, view.grade.as_str(), d.overall_score);
    println!(
        "  code quality {:.1} | reviews {:.1} | docs {:.1} | collaboration {:.1} | consistency {:.1} | impact {:.1}",
        d.scores.code_quality,
        d.scores.review_quality,
        d.scores.documentation,
        d.scores.collaboration,
        d.scores.consistency,
        d.scores.impact
    );
    if !d.languages.is_empty() {
        println!("  languages: {}", d.languages.join(", "));
    }
    println!("  domains:");
    for domain in &view.domain_scores {
        println!(
            "    {:<16} {:>5.1}  ({} contributions; {})",
            domain.domain,
            domain.score,
            domain.contribution_count,
            domain.evidence_repos.join(", ")
        );
    }
    println!("  repos:");
    for portfolio in &view.portfolios {
        println!("    {}", portfolio.summary);
    }
}

pub async fn profile(app: &App, username: &str) -> anyhow::Result<()> {
    let profiles = app.profiles();
    match profiles.lookup(username).await? {
        ProfileLookup::Ready(view) => print_profile(&view),
        ProfileLookup::OptedOut => println!("{} opted out", username),
        ProfileLookup::Pending { status } => {
            println!("{} is {}; ingesting now", username, status.as_str());
            app.worker().run_until_idle().await;
            match profiles.lookup(username).await? {
                ProfileLookup::Ready(view) => print_profile(&view),
                ProfileLookup::Pending { status } => println!("{} is still {}", username, status.as_str()),
                ProfileLookup::OptedOut => println!("{} opted out", username),
            }
        }
    }
    Ok(())
}

pub async fn worker(app: &App, args: WorkerArgs) -> anyhow::Result<()> {
    for username in pending_usernames(app).await? {
        app.queue.enqueue(Task::Ingest { username }).await?;
    }

    let worker = app.worker();
    let repairer = app.repairer();
    let mut ticker = tokio::time::interval(Duration::from_secs(args.repair_every_mins.max(1) * 60));
    let sweeps = async {
        loop {
            ticker.tick().await;
            for kind in [RepairKind::StuckScored, RepairKind::StuckUnscored] {
                match run_repair(&repairer, kind, app).await {
                    Ok(report) if report.repaired > 0 => info!("{:?}", report),
                    Ok(_) => {}
                    Err(e) => warn!("repair sweep failed: {:#}", e),
                }
            }
        }
    };

    tokio::select! {
        _ = worker.run() => warn!("task queue closed"),
        _ = sweeps => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("shutting down, {} tasks outstanding", app.queue.outstanding());
        }
    }
    Ok(())
}
