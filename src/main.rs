//! Civic Progress CLI
//!
//! Opens the local progress database, runs one request for a learner, and
//! prints the JSON response.
//!
//! ## Usage
//!
//! ```bash
//! # Show a learner's progress
//! civic-progress --user alice show
//!
//! # Award XP and complete levels
//! civic-progress --user alice award 5
//! civic-progress --user alice complete level-1
//!
//! # Journey path with lock status
//! civic-progress --user alice levels
//!
//! # Raw request, same contract the web front end uses
//! civic-progress --user alice request '{"action":"start_module","module_id":"level-2"}'
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use civic_progress::navigation;
use civic_progress::{
    Config, Curriculum, LearnerSession, ProgressRequest, ProgressStore, SledStore, UserId,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "civic-progress")]
#[command(about = "Learning progress tracker for civic-education lessons")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage directory
    #[arg(long, env = "CIVIC_PROGRESS_DIR")]
    storage_dir: Option<PathBuf>,

    /// Curriculum TOML file
    #[arg(long)]
    curriculum: Option<PathBuf>,

    /// Learner identity
    #[arg(short, long, env = "CIVIC_PROGRESS_USER")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the progress summary
    Show,
    /// Award XP
    Award {
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Complete an unlocked level
    Complete {
        level: String,
        /// XP for the completion (defaults to the configured reward)
        #[arg(long)]
        xp: Option<i64>,
    },
    /// Open an unlocked level
    Start { level: String },
    /// Record a fact-vs-myth answer
    MythFact {
        #[arg(long)]
        correct: bool,
    },
    /// Restart the course
    Reset,
    /// List levels with their status
    Levels,
    /// Show recent activity
    Activity {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Run a raw JSON request
    Request { json: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("civic_progress=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Load config
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    // Apply CLI overrides
    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(path) = args.curriculum {
        config.curriculum_path = Some(path);
    }

    std::fs::create_dir_all(&config.storage_dir)
        .with_context(|| format!("creating {}", config.storage_dir.display()))?;

    let config_path = config.config_path();
    if !config_path.exists() {
        config.save(&config_path)?;
        info!(path = %config_path.display(), "Created default config");
    }

    let curriculum = Arc::new(match &config.curriculum_path {
        Some(path) => Curriculum::load(path)?,
        None => Curriculum::civic_default(),
    });

    let store = Arc::new(SledStore::open(config.database_path())?);
    let user_id = UserId::new(args.user);

    let request = match args.command {
        Command::Show => ProgressRequest::Get,
        Command::Award { amount } => ProgressRequest::UpdateXp { xp_earned: amount },
        Command::Complete { level, xp } => ProgressRequest::CompleteModule {
            module_id: level,
            xp_earned: xp,
        },
        Command::Start { level } => ProgressRequest::StartModule { module_id: level },
        Command::MythFact { correct } => ProgressRequest::RecordMythFact { correct },
        Command::Reset => ProgressRequest::Reset,
        Command::Request { json } => {
            serde_json::from_str(&json).context("parsing request JSON")?
        }
        Command::Levels => {
            let session = LearnerSession::start(
                user_id,
                curriculum.clone(),
                store.clone(),
                config.write_back.clone(),
            )
            .await?;
            let levels: Vec<_> = navigation::journey(session.tracker())
                .into_iter()
                .map(|(id, status)| {
                    let title = curriculum.get(id.as_str()).map(|l| l.title.clone());
                    serde_json::json!({ "id": id, "title": title, "status": status })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&levels)?);
            session.end().await;
            return Ok(());
        }
        Command::Activity { limit } => {
            let entries = store.recent_activity(&user_id, limit).await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }
    };

    let mut session =
        LearnerSession::start(user_id, curriculum, store, config.write_back.clone()).await?;
    let response = civic_progress::api::handle(session.tracker_mut(), &config.rewards, request);
    let report = session.end().await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if report.write_back.failures > 0 {
        anyhow::bail!(
            "{} progress update(s) could not be persisted",
            report.write_back.failures
        );
    }
    Ok(())
}
