use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use homehub_upload::{
    BatchOutcome, CollectionId, HttpMediaService, NotificationCenter, UploadConfig, UploadFile,
    UploadOrchestrator,
};

/// Upload files into a HomeHub media library, one at a time.
#[derive(Parser, Debug)]
#[command(name = "homehub-upload", version)]
struct Args {
    /// Album to put the uploaded media into
    #[arg(long)]
    album: Option<i64>,

    /// Backend URL, overrides HOMEHUB_SERVER_URL
    #[arg(long)]
    server: Option<String>,

    /// Files to upload
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // load .env file if it exists
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = UploadConfig::from_env();
    if let Some(server) = args.server {
        config.server_url = server.trim_end_matches('/').to_string();
    }
    let service = HttpMediaService::new(&config).context("failed to set up HTTP client")?;
    let notifications = NotificationCenter::new(config.notification_ttl());
    let orchestrator = UploadOrchestrator::new(Arc::new(service), Arc::new(notifications));

    let (files, skipped) = resolve_files(&args.files);

    let outcome = orchestrator
        .start_upload(files, args.album.map(CollectionId))
        .await;

    report(&outcome);
    Ok(exit_code(&outcome, skipped))
}

/// Turn command-line paths into upload handles. Unusable paths are logged and
/// counted instead of aborting the batch.
fn resolve_files(paths: &[PathBuf]) -> (Vec<UploadFile>, usize) {
    let mut files = Vec::with_capacity(paths.len());
    let mut skipped = 0;
    for path in paths {
        match UploadFile::from_path(path) {
            Ok(file) => files.push(file),
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                skipped += 1;
            }
        }
    }
    (files, skipped)
}

fn report(outcome: &BatchOutcome) {
    match outcome {
        BatchOutcome::Completed(summary) => {
            println!("Uploaded {}/{} files", summary.finished, summary.total);
            for failed in &summary.failed {
                println!("  failed: {} ({})", failed.name, failed.error);
            }
        }
        BatchOutcome::Empty => println!("Nothing to upload"),
        BatchOutcome::Rejected => println!("Another upload is in progress"),
    }
}

/// True only when every requested file was found and uploaded.
fn all_uploaded(outcome: &BatchOutcome, skipped: usize) -> bool {
    match outcome {
        BatchOutcome::Completed(summary) => summary.failed.is_empty() && skipped == 0,
        BatchOutcome::Empty | BatchOutcome::Rejected => false,
    }
}

fn exit_code(outcome: &BatchOutcome, skipped: usize) -> ExitCode {
    if all_uploaded(outcome, skipped) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
